use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use media_organizer_core::{
    format_size, load_config, organize_files, save_config, scan_directory, ContentClassifier,
    KeywordClassifier, OrganizeOptions, PathKind, ScanOptions, Strategy,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "media-organizer",
    version,
    about = "Scan a media cache and reorganize it by type, time, size, chat thread, or content category."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scan a directory and print (or dump) what was found.
    Scan(ScanArgs),
    /// Relocate files into a target hierarchy using one or more strategies.
    Organize(OrganizeArgs),
    /// List the available organization strategies.
    Methods,
    /// Inspect or update the persisted settings file.
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct ScanArgs {
    /// Directory to scan.
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Exclude glob or substring patterns (repeatable).
    #[arg(long = "exclude", value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Maximum traversal depth (root is depth 0).
    #[arg(long)]
    max_depth: Option<usize>,

    /// Optional JSON dump of the scanned descriptors.
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct OrganizeArgs {
    /// Source directory to organize.
    #[arg(value_name = "SOURCE")]
    source: PathBuf,

    /// Target root the organized hierarchy is built under.
    #[arg(value_name = "TARGET")]
    target: PathBuf,

    /// Strategy names to apply (repeatable); unrecognized names are skipped.
    #[arg(long = "method", value_name = "NAME", default_values_t = [String::from("by_type")])]
    methods: Vec<String>,

    /// Copy instead of move, leaving the source tree untouched.
    #[arg(long)]
    keep_originals: bool,

    /// Exclude glob or substring patterns (repeatable).
    #[arg(long = "exclude", value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Maximum traversal depth (root is depth 0).
    #[arg(long)]
    max_depth: Option<usize>,

    /// Classifier backing the by_content strategy.
    #[arg(long, value_enum, default_value_t = ClassifierKind::Keyword)]
    classifier: ClassifierKind,

    /// Optional JSON file for the full outcome (plans + report).
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum ClassifierKind {
    /// Built-in keyword-heuristic classifier.
    Keyword,
    /// No classifier; by_content reports an error if requested.
    None,
}

#[derive(Debug, Args)]
struct ConfigArgs {
    /// Settings file location.
    #[arg(long, value_name = "FILE", default_value = "media-organizer.json")]
    file: PathBuf,

    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective settings.
    Show,
    /// Remember the last-used source or target path.
    SetPath {
        #[arg(value_enum)]
        kind: CliPathKind,
        path: String,
    },
    /// Store an API key for an AI provider.
    SetKey { provider: String, key: String },
    /// Enable or disable AI-backed classification.
    SetEnabled {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum CliPathKind {
    Source,
    Target,
}

impl From<CliPathKind> for PathKind {
    fn from(value: CliPathKind) -> Self {
        match value {
            CliPathKind::Source => PathKind::Source,
            CliPathKind::Target => PathKind::Target,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(args) => run_scan_command(args),
        Commands::Organize(args) => run_organize_command(args),
        Commands::Methods => {
            run_methods_command();
            Ok(())
        }
        Commands::Config(args) => run_config_command(args),
    }
}

fn run_scan_command(args: ScanArgs) -> Result<()> {
    let output = scan_directory(
        &args.path,
        &ScanOptions {
            excludes: args.exclude,
            max_depth: args.max_depth,
            cancel_flag: None,
        },
    );

    let total_bytes = output
        .descriptors
        .iter()
        .map(|descriptor| descriptor.size_bytes)
        .sum::<u64>();
    println!(
        "Scanned {}: {} file(s), {}, {} warning(s).",
        args.path.display(),
        output.descriptors.len(),
        format_size(total_bytes),
        output.warnings.len()
    );

    let mut per_type: std::collections::BTreeMap<&str, (u64, u64)> = Default::default();
    for descriptor in &output.descriptors {
        let entry = per_type.entry(descriptor.coarse_type.label()).or_default();
        entry.0 += 1;
        entry.1 += descriptor.size_bytes;
    }
    for (label, (count, bytes)) in per_type {
        println!("- {label}: {count} file(s), {}", format_size(bytes));
    }

    if let Some(path) = args.output {
        let payload = serde_json::to_string_pretty(&output.descriptors)
            .context("failed to serialize descriptors")?;
        fs::write(&path, payload)
            .with_context(|| format!("failed to write scan output to {}", path.display()))?;
        println!("Descriptor list written to {}", path.display());
    }

    Ok(())
}

fn run_organize_command(args: OrganizeArgs) -> Result<()> {
    let mut strategies = Vec::new();
    for name in &args.methods {
        match Strategy::from_name(name) {
            Some(strategy) => {
                if !strategies.contains(&strategy) {
                    strategies.push(strategy);
                }
            }
            None => warn!("unrecognized strategy '{name}' skipped"),
        }
    }

    let keyword = KeywordClassifier;
    let classifier: Option<&dyn ContentClassifier> = match args.classifier {
        ClassifierKind::Keyword => Some(&keyword),
        ClassifierKind::None => None,
    };

    let outcome = organize_files(
        &args.source,
        &args.target,
        &OrganizeOptions {
            strategies,
            keep_originals: args.keep_originals,
            custom_rules: None,
            excludes: args.exclude.clone(),
            max_depth: args.max_depth,
            cancel_flag: None,
        },
        classifier,
    );

    if outcome.success {
        println!(
            "Organized {} into {} ({} mode).",
            args.source.display(),
            args.target.display(),
            if args.keep_originals { "copy" } else { "move" }
        );
    } else {
        println!(
            "Organize failed: {}",
            outcome.message.as_deref().unwrap_or("unknown error")
        );
    }

    for plan in &outcome.plans {
        match &plan.error {
            Some(error) => println!("- {}: disabled ({error})", plan.method.name()),
            None => println!(
                "- {}: {} file(s) into {} folder(s), {} failure(s)",
                plan.method.name(),
                plan.moved.len(),
                plan.directories.len(),
                plan.failed_files
            ),
        }
    }

    if let Some(report) = &outcome.report {
        println!(
            "Report: {} file(s), {} total.",
            report.total_files,
            format_size(report.total_size_bytes)
        );
    }
    if !outcome.warnings.is_empty() {
        println!("{} warning(s); re-run with RUST_LOG=warn for details.", outcome.warnings.len());
    }

    if let Some(path) = args.report {
        let payload =
            serde_json::to_string_pretty(&outcome).context("failed to serialize outcome")?;
        fs::write(&path, payload)
            .with_context(|| format!("failed to write outcome to {}", path.display()))?;
        println!("Outcome written to {}", path.display());
    }

    Ok(())
}

fn run_methods_command() {
    for strategy in Strategy::ALL {
        println!("{:<12} {}", strategy.name(), strategy.describe());
    }
}

fn run_config_command(args: ConfigArgs) -> Result<()> {
    let mut config = load_config(&args.file);

    match args.action {
        ConfigAction::Show => {
            let payload =
                serde_json::to_string_pretty(&config).context("failed to serialize config")?;
            println!("{payload}");
            return Ok(());
        }
        ConfigAction::SetPath { kind, path } => {
            config.set_last_path(kind.into(), path);
        }
        ConfigAction::SetKey { provider, key } => {
            config.set_api_key(provider, key);
        }
        ConfigAction::SetEnabled { enabled } => {
            config.enabled = enabled;
        }
    }

    save_config(&config, &args.file)?;
    println!("Settings saved to {}", args.file.display());
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
