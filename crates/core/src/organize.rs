use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use filetime::FileTime;
use tracing::warn;

use crate::classify::ContentClassifier;
use crate::model::{FileDescriptor, MovedFile, OrganizationPlan, OrganizeOutcome, Strategy};
use crate::report::build_report;
use crate::scan::{scan_directory, ScanOptions};

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Default)]
pub struct OrganizeOptions {
    pub strategies: Vec<Strategy>,
    /// `true` copies with timestamp preservation; `false` moves.
    pub keep_originals: bool,
    /// Accepted for forward compatibility; not interpreted yet.
    pub custom_rules: Option<serde_json::Value>,
    pub excludes: Vec<String>,
    pub max_depth: Option<usize>,
    /// Checked between files; already-relocated files stay where they are.
    pub cancel_flag: Option<Arc<AtomicBool>>,
}

/// Scans `source`, applies each requested strategy independently under its
/// own folder below `target`, and compiles the aggregate report. Per-file
/// and per-strategy problems never fail the run; the only run-level failures
/// are an uncreatable target root and an empty scan.
pub fn organize_files(
    source: &Path,
    target: &Path,
    options: &OrganizeOptions,
    classifier: Option<&dyn ContentClassifier>,
) -> OrganizeOutcome {
    if let Err(err) = fs::create_dir_all(target) {
        return OrganizeOutcome::failure(
            format!("target root could not be created: {}: {err}", target.display()),
            Vec::new(),
        );
    }

    let scan = scan_directory(
        source,
        &ScanOptions {
            excludes: options.excludes.clone(),
            max_depth: options.max_depth,
            cancel_flag: options.cancel_flag.clone(),
        },
    );
    let mut warnings = scan.warnings;

    if scan.descriptors.is_empty() {
        return OrganizeOutcome::failure(
            format!("no files found under {}", source.display()),
            warnings,
        );
    }

    let mut plans = Vec::with_capacity(options.strategies.len());
    for strategy in &options.strategies {
        plans.push(apply_strategy(
            *strategy,
            &scan.descriptors,
            target,
            options,
            classifier,
            &mut warnings,
        ));
    }

    let applied = plans.iter().map(|plan| plan.method).collect::<Vec<_>>();
    let report = build_report(&scan.descriptors, &applied);

    OrganizeOutcome {
        success: true,
        message: None,
        plans,
        report: Some(report),
        warnings,
    }
}

fn apply_strategy(
    strategy: Strategy,
    descriptors: &[FileDescriptor],
    target: &Path,
    options: &OrganizeOptions,
    classifier: Option<&dyn ContentClassifier>,
    warnings: &mut Vec<String>,
) -> OrganizationPlan {
    if strategy == Strategy::ByContent && classifier.is_none() {
        return OrganizationPlan::disabled(strategy, "content classifier required");
    }

    let mut plan = OrganizationPlan::empty(strategy);
    let sub_root = target.join(strategy.name());
    let mut created: HashSet<PathBuf> = HashSet::new();

    for descriptor in descriptors {
        if is_cancelled(options) {
            push_warning(
                warnings,
                format!(
                    "organize canceled during {}; remaining files were not relocated",
                    strategy.name()
                ),
            );
            break;
        }

        let (bucket, tags) = bucket_for(strategy, descriptor, classifier);
        let directory = sub_root.join(&bucket);

        if !created.contains(&directory) {
            if let Err(err) = fs::create_dir_all(&directory) {
                push_warning(
                    warnings,
                    format!(
                        "could not create destination {}: {err}",
                        directory.display()
                    ),
                );
                plan.failed_files += 1;
                continue;
            }
            created.insert(directory.clone());
        }

        // Scan and relocation are separate passes; the source may be gone by
        // now (including when an earlier move strategy already took it).
        if !descriptor.path.exists() {
            push_warning(
                warnings,
                format!("source vanished before relocation: {}", descriptor.path.display()),
            );
            plan.failed_files += 1;
            continue;
        }

        let destination = resolve_destination(&directory, &descriptor.name);
        if let Err(err) = move_or_copy(&descriptor.path, &destination, options.keep_originals) {
            push_warning(
                warnings,
                format!(
                    "relocation failed {} -> {}: {err:#}",
                    descriptor.path.display(),
                    destination.display()
                ),
            );
            plan.failed_files += 1;
            continue;
        }

        let placed_name = destination
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| descriptor.name.clone());
        plan.directories
            .entry(directory.to_string_lossy().to_string())
            .or_default()
            .push(placed_name);
        plan.moved.push(MovedFile {
            original_path: descriptor.path.to_string_lossy().to_string(),
            new_path: destination.to_string_lossy().to_string(),
            group_key: bucket.clone(),
            tags,
        });
    }

    plan
}

fn bucket_for(
    strategy: Strategy,
    descriptor: &FileDescriptor,
    classifier: Option<&dyn ContentClassifier>,
) -> (String, Vec<String>) {
    match strategy {
        Strategy::ByType => (normalized_extension(&descriptor.extension), Vec::new()),
        Strategy::ByTime => (time_bucket(descriptor.modified.as_ref()), Vec::new()),
        Strategy::BySize => (size_bucket(descriptor.size_bytes).to_string(), Vec::new()),
        Strategy::ByChat => (chat_bucket(&descriptor.path), Vec::new()),
        Strategy::ByContent => match classifier {
            Some(classifier) => {
                let verdict = classifier.analyze(descriptor);
                if verdict.ok {
                    (verdict.category, verdict.tags)
                } else {
                    ("unknown".to_string(), verdict.tags)
                }
            }
            // Unreachable: the strategy is disabled up front without one.
            None => ("unknown".to_string(), Vec::new()),
        },
    }
}

/// Normalized lowercase extension bucket; variant spellings collapse to one
/// folder and extension-less files land in `no_ext`.
pub fn normalized_extension(extension: &str) -> String {
    let bare = extension.trim_start_matches('.');
    if bare.is_empty() {
        return "no_ext".to_string();
    }
    match bare {
        "jpeg" => "jpg",
        "tif" => "tiff",
        "htm" => "html",
        other => other,
    }
    .to_string()
}

pub fn time_bucket(modified: Option<&DateTime<Local>>) -> String {
    use chrono::Datelike;
    match modified {
        Some(time) => format!("{}_{:02}", time.year(), time.month()),
        None => "unknown_time".to_string(),
    }
}

pub fn size_bucket(size_bytes: u64) -> &'static str {
    if size_bytes < KIB {
        "tiny"
    } else if size_bytes < MIB {
        "small"
    } else if size_bytes < 10 * MIB {
        "medium"
    } else if size_bytes < 100 * MIB {
        "large"
    } else {
        "huge"
    }
}

/// First directory component starting with `msg` or `chat`, scanning from the
/// root of the path; anything else is `unknown`.
pub fn chat_bucket(path: &Path) -> String {
    let Some(parent) = path.parent() else {
        return "unknown".to_string();
    };
    for component in parent.components() {
        let segment = component.as_os_str().to_string_lossy();
        if segment.starts_with("msg") || segment.starts_with("chat") {
            return segment.to_string();
        }
    }
    "unknown".to_string()
}

/// Picks a collision-free destination path: the bare name if free, otherwise
/// `stem_1`, `stem_2`, ... before the extension.
fn resolve_destination(directory: &Path, name: &str) -> PathBuf {
    let candidate = directory.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, extension) = split_name(name);
    let mut counter = 1_u64;
    loop {
        let candidate = directory.join(format!("{stem}_{counter}{extension}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Splits `photo.png` into `("photo", ".png")`. Dotfiles with no further dot
/// keep the whole name as the stem.
fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(index) if index > 0 => name.split_at(index),
        _ => (name, ""),
    }
}

fn move_or_copy(source: &Path, destination: &Path, keep_originals: bool) -> Result<()> {
    if keep_originals {
        let metadata = fs::metadata(source)
            .with_context(|| format!("failed to stat {}", source.display()))?;
        fs::copy(source, destination)
            .with_context(|| format!("failed to copy to {}", destination.display()))?;
        let mtime = FileTime::from_last_modification_time(&metadata);
        if let Err(err) = filetime::set_file_mtime(destination, mtime) {
            warn!(
                "could not preserve mtime on {}: {err}",
                destination.display()
            );
        }
        return Ok(());
    }

    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        // Rename cannot cross volumes; fall back to copy + delete source.
        Err(_) => {
            fs::copy(source, destination)
                .with_context(|| format!("failed to copy to {}", destination.display()))?;
            fs::remove_file(source)
                .with_context(|| format!("failed to remove source {}", source.display()))?;
            Ok(())
        }
    }
}

fn push_warning(warnings: &mut Vec<String>, message: String) {
    warn!("{message}");
    warnings.push(message);
}

fn is_cancelled(options: &OrganizeOptions) -> bool {
    options
        .cancel_flag
        .as_ref()
        .is_some_and(|flag| flag.load(Ordering::Relaxed))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use chrono::{Local, TimeZone};

    use super::{
        chat_bucket, normalized_extension, resolve_destination, size_bucket, split_name,
        time_bucket,
    };

    #[test]
    fn extension_buckets_normalize_variant_spellings() {
        assert_eq!(normalized_extension(".jpeg"), "jpg");
        assert_eq!(normalized_extension(".jpg"), "jpg");
        assert_eq!(normalized_extension(".tif"), "tiff");
        assert_eq!(normalized_extension(".htm"), "html");
        assert_eq!(normalized_extension(".png"), "png");
        assert_eq!(normalized_extension(""), "no_ext");
    }

    #[test]
    fn time_buckets_use_year_and_zero_padded_month() {
        let march = Local.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        assert_eq!(time_bucket(Some(&march)), "2024_03");
        let december = Local.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap();
        assert_eq!(time_bucket(Some(&december)), "2023_12");
        assert_eq!(time_bucket(None), "unknown_time");
    }

    #[test]
    fn size_bands_are_left_inclusive_on_the_upper_threshold() {
        assert_eq!(size_bucket(0), "tiny");
        assert_eq!(size_bucket(500), "tiny");
        assert_eq!(size_bucket(1023), "tiny");
        assert_eq!(size_bucket(1024), "small");
        assert_eq!(size_bucket(1024 * 1024 - 1), "small");
        assert_eq!(size_bucket(1024 * 1024), "medium");
        assert_eq!(size_bucket(10 * 1024 * 1024), "large");
        assert_eq!(size_bucket(100 * 1024 * 1024), "huge");
        assert_eq!(size_bucket(150 * 1024 * 1024), "huge");
    }

    #[test]
    fn chat_bucket_takes_first_msg_or_chat_directory_segment() {
        assert_eq!(
            chat_bucket(Path::new("/data/WeChat/msg_2024/attach/photo.png")),
            "msg_2024"
        );
        assert_eq!(
            chat_bucket(Path::new("/cache/chat8841/files/doc.pdf")),
            "chat8841"
        );
        // The filename itself never counts as a chat segment.
        assert_eq!(
            chat_bucket(Path::new("/downloads/chatlog.txt")),
            "unknown"
        );
        assert_eq!(chat_bucket(Path::new("/plain/tree/file.bin")), "unknown");
    }

    #[test]
    fn split_name_keeps_last_extension_and_handles_dotfiles() {
        assert_eq!(split_name("photo.png"), ("photo", ".png"));
        assert_eq!(split_name("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_name("README"), ("README", ""));
        assert_eq!(split_name(".gitignore"), (".gitignore", ""));
    }

    #[test]
    fn destination_suffixes_increase_until_free() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(
            resolve_destination(dir.path(), "photo.png"),
            dir.path().join("photo.png")
        );

        fs::write(dir.path().join("photo.png"), b"a").expect("write");
        assert_eq!(
            resolve_destination(dir.path(), "photo.png"),
            dir.path().join("photo_1.png")
        );

        fs::write(dir.path().join("photo_1.png"), b"b").expect("write");
        assert_eq!(
            resolve_destination(dir.path(), "photo.png"),
            dir.path().join("photo_2.png")
        );
    }

    #[test]
    fn buckets_are_pure_over_descriptor_fields() {
        let modified = Local.with_ymd_and_hms(2024, 3, 15, 8, 30, 0).unwrap();
        let path = PathBuf::from("/cache/msgAlice/img/a.jpeg");
        for _ in 0..2 {
            assert_eq!(normalized_extension(".jpeg"), "jpg");
            assert_eq!(time_bucket(Some(&modified)), "2024_03");
            assert_eq!(size_bucket(2048), "small");
            assert_eq!(chat_bucket(&path), "msgAlice");
        }
    }
}
