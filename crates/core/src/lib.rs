pub mod classify;
pub mod config;
pub mod model;
pub mod organize;
pub mod report;
pub mod scan;

pub use classify::{ClassifierVerdict, ContentCategory, ContentClassifier, KeywordClassifier};
pub use config::{load_config, save_config, AppConfig, LastPaths, PathKind};
pub use model::{
    format_size, CoarseType, FileDescriptor, MovedFile, OrganizationPlan, OrganizeOutcome, Report,
    Strategy, TypeStats, REPORT_VERSION,
};
pub use organize::{organize_files, OrganizeOptions};
pub use report::build_report;
pub use scan::{scan_directory, ScanOptions, ScanOutput};
