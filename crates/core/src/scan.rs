use std::path::Path;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use chrono::{DateTime, Local};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::warn;
use walkdir::WalkDir;

use crate::model::{CoarseType, FileDescriptor};

#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Glob or plain-substring exclude patterns.
    pub excludes: Vec<String>,
    /// Maximum traversal depth (root is depth 0).
    pub max_depth: Option<usize>,
    /// Checked between files; a partial descriptor list is returned when set.
    pub cancel_flag: Option<Arc<AtomicBool>>,
}

#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    pub descriptors: Vec<FileDescriptor>,
    pub warnings: Vec<String>,
}

/// Walks `root` and produces one descriptor per regular file. A missing root
/// yields zero files plus a warning, never an error; unreadable entries are
/// skipped the same way.
pub fn scan_directory(root: &Path, options: &ScanOptions) -> ScanOutput {
    let mut output = ScanOutput::default();

    if !root.exists() {
        push_warning(
            &mut output.warnings,
            format!("scan root not found: {}", root.display()),
        );
        return output;
    }

    let excludes = ExcludeMatcher::new(&options.excludes, &mut output.warnings);

    let mut walker = WalkDir::new(root).follow_links(false);
    if let Some(depth) = options.max_depth {
        walker = walker.max_depth(depth);
    }
    let iter = walker.into_iter().filter_entry(|entry| {
        if entry.depth() == 0 {
            return true;
        }
        !excludes.is_excluded(entry.path())
    });

    for item in iter {
        if is_cancelled(options) {
            push_warning(
                &mut output.warnings,
                format!(
                    "scan canceled while walking {}; descriptor list is partial",
                    root.display()
                ),
            );
            break;
        }

        let entry = match item {
            Ok(entry) => entry,
            Err(err) => {
                push_warning(
                    &mut output.warnings,
                    format!("walk error under {}: {}", root.display(), err),
                );
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                push_warning(
                    &mut output.warnings,
                    format!("metadata read failed for {}: {}", entry.path().display(), err),
                );
                continue;
            }
        };

        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        let extension = extension_of(path);
        let mime_type = sniff_mime(path);
        let coarse_type = coarse_type_for(&extension, mime_type.as_deref());

        output.descriptors.push(FileDescriptor {
            name,
            path: path.to_path_buf(),
            size_bytes: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Local>::from),
            extension,
            coarse_type,
            mime_type,
        });
    }

    output
}

fn push_warning(warnings: &mut Vec<String>, message: String) {
    warn!("{message}");
    warnings.push(message);
}

/// Lowercase extension including the leading dot, or empty.
fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

/// Best-effort content sniff; a read failure leaves the MIME unknown and
/// classification falls back to the extension alone.
fn sniff_mime(path: &Path) -> Option<String> {
    match infer::get_from_path(path) {
        Ok(kind) => kind.map(|kind| kind.mime_type().to_string()),
        Err(_) => None,
    }
}

const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".heic", ".webp",
];
const VIDEO_EXTENSIONS: &[&str] = &[
    ".mp4", ".avi", ".mov", ".wmv", ".flv", ".mkv", ".webm", ".m4v",
];
const AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".wav", ".aac", ".m4a", ".flac", ".ogg", ".wma"];
const DOCUMENT_EXTENSIONS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".txt", ".rtf", ".ppt", ".pptx", ".xls", ".xlsx",
];
const ARCHIVE_EXTENSIONS: &[&str] = &[".zip", ".rar", ".7z", ".tar", ".gz", ".bz2"];

/// Precedence: exact extension match, then MIME prefix, then `Other`.
pub fn coarse_type_for(extension: &str, mime_type: Option<&str>) -> CoarseType {
    if IMAGE_EXTENSIONS.contains(&extension) {
        return CoarseType::Image;
    }
    if VIDEO_EXTENSIONS.contains(&extension) {
        return CoarseType::Video;
    }
    if AUDIO_EXTENSIONS.contains(&extension) {
        return CoarseType::Audio;
    }
    if DOCUMENT_EXTENSIONS.contains(&extension) {
        return CoarseType::Document;
    }
    if ARCHIVE_EXTENSIONS.contains(&extension) {
        return CoarseType::Archive;
    }

    if let Some(mime) = mime_type {
        if mime.starts_with("image/") {
            return CoarseType::Image;
        }
        if mime.starts_with("video/") {
            return CoarseType::Video;
        }
        if mime.starts_with("audio/") {
            return CoarseType::Audio;
        }
        if mime.starts_with("text/") || mime == "application/pdf" || mime == "application/msword" {
            return CoarseType::Document;
        }
        if mime.starts_with("application/zip") || mime.starts_with("application/x-rar") {
            return CoarseType::Archive;
        }
    }

    CoarseType::Other
}

fn is_cancelled(options: &ScanOptions) -> bool {
    options
        .cancel_flag
        .as_ref()
        .is_some_and(|flag| flag.load(Ordering::Relaxed))
}

pub(crate) struct ExcludeMatcher {
    globset: Option<GlobSet>,
    substrings: Vec<String>,
}

impl ExcludeMatcher {
    pub(crate) fn new(patterns: &[String], warnings: &mut Vec<String>) -> Self {
        if patterns.is_empty() {
            return Self {
                globset: None,
                substrings: Vec::new(),
            };
        }

        let mut builder = GlobSetBuilder::new();
        let mut substrings = Vec::new();
        for pattern in patterns {
            let pattern = pattern.trim();
            if pattern.is_empty() {
                continue;
            }

            if is_plain_substring_pattern(pattern) {
                substrings.push(pattern.to_lowercase());
                continue;
            }

            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(err) => {
                    warnings.push(format!(
                        "invalid exclude glob '{pattern}': {err}; using substring fallback."
                    ));
                    substrings.push(pattern.to_lowercase());
                }
            }
        }

        let globset = match builder.build() {
            Ok(set) => Some(set),
            Err(err) => {
                warnings.push(format!(
                    "failed to compile exclude glob set: {err}; glob excludes disabled."
                ));
                None
            }
        };

        Self {
            globset,
            substrings,
        }
    }

    pub(crate) fn is_excluded(&self, path: &Path) -> bool {
        if let Some(globset) = &self.globset {
            if globset.is_match(path) {
                return true;
            }
        }

        if self.substrings.is_empty() {
            return false;
        }

        let lowered = path.to_string_lossy().to_lowercase();
        self.substrings
            .iter()
            .any(|pattern| lowered.contains(pattern))
    }
}

fn is_plain_substring_pattern(pattern: &str) -> bool {
    !pattern
        .chars()
        .any(|ch| matches!(ch, '*' | '?' | '[' | ']' | '{' | '}'))
}
