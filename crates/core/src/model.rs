use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

pub const REPORT_VERSION: &str = "1.0.0";

/// Coarse file type derived once at scan time from the extension table,
/// with MIME sniffing as the fallback signal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum CoarseType {
    Image,
    Video,
    Audio,
    Document,
    Archive,
    Other,
}

impl CoarseType {
    pub fn label(&self) -> &'static str {
        match self {
            CoarseType::Image => "image",
            CoarseType::Video => "video",
            CoarseType::Audio => "audio",
            CoarseType::Document => "document",
            CoarseType::Archive => "archive",
            CoarseType::Other => "other",
        }
    }
}

/// Immutable snapshot of one filesystem entry taken during the scan phase.
/// The organizer re-checks existence before acting; scan and act are not
/// atomic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileDescriptor {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Local>>,
    /// Lowercase suffix including the leading dot, or empty.
    pub extension: String,
    pub coarse_type: CoarseType,
    pub mime_type: Option<String>,
}

/// The five built-in organization strategies. A closed enum so adding one is
/// a compile-time-checked extension rather than a runtime table edit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    ByType,
    ByTime,
    BySize,
    ByContent,
    ByChat,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::ByType,
        Strategy::ByTime,
        Strategy::BySize,
        Strategy::ByContent,
        Strategy::ByChat,
    ];

    /// Canonical name; doubles as the per-strategy folder under the target
    /// root.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::ByType => "by_type",
            Strategy::ByTime => "by_time",
            Strategy::BySize => "by_size",
            Strategy::ByContent => "by_content",
            Strategy::ByChat => "by_chat",
        }
    }

    pub fn from_name(name: &str) -> Option<Strategy> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.name() == name)
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Strategy::ByType => "group by normalized file extension (jpg, pdf, ...)",
            Strategy::ByTime => "group by modification month (year_month)",
            Strategy::BySize => "group by size band (tiny, small, medium, large, huge)",
            Strategy::ByContent => "group by content category from a classifier",
            Strategy::ByChat => "group by chat-thread identifier inferred from the path",
        }
    }
}

/// One relocation that succeeded, with the strategy-specific bucket label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovedFile {
    pub original_path: String,
    pub new_path: String,
    pub group_key: String,
    /// Informational classifier tags; empty for non-content strategies.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Per-strategy outcome of one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrganizationPlan {
    pub method: Strategy,
    /// Destination directory -> filenames placed there, in placement order.
    pub directories: BTreeMap<String, Vec<String>>,
    pub moved: Vec<MovedFile>,
    /// Set when the strategy could not run at all (unmet precondition).
    #[serde(default)]
    pub error: Option<String>,
    /// Files skipped because of per-file relocation failures.
    #[serde(default)]
    pub failed_files: u64,
}

impl OrganizationPlan {
    pub fn empty(method: Strategy) -> Self {
        Self {
            method,
            directories: BTreeMap::new(),
            moved: Vec::new(),
            error: None,
            failed_files: 0,
        }
    }

    pub fn disabled(method: Strategy, reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::empty(method)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TypeStats {
    pub count: u64,
    pub size_bytes: u64,
}

/// Aggregate over the scanned descriptor list. Statistics describe what was
/// scanned, not what was successfully relocated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub report_version: String,
    pub generated_at: String,
    pub total_files: u64,
    pub total_size_bytes: u64,
    pub type_statistics: BTreeMap<String, TypeStats>,
    pub methods: Vec<Strategy>,
}

/// Single result surface of the organizer. No error propagates past the
/// public entry point; run-level failures arrive here with `success = false`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrganizeOutcome {
    pub success: bool,
    pub message: Option<String>,
    pub plans: Vec<OrganizationPlan>,
    pub report: Option<Report>,
    pub warnings: Vec<String>,
}

impl OrganizeOutcome {
    pub fn failure(message: impl Into<String>, warnings: Vec<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            plans: Vec::new(),
            report: None,
            warnings,
        }
    }
}

/// Human byte formatting shared by the CLI surfaces.
pub fn format_size(value: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if value == 0 {
        return "0 B".to_string();
    }
    let mut size = value as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.1} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::{format_size, Strategy};

    #[test]
    fn strategy_names_round_trip() {
        for strategy in Strategy::ALL {
            assert_eq!(Strategy::from_name(strategy.name()), Some(strategy));
        }
        assert_eq!(Strategy::from_name("by_color"), None);
    }

    #[test]
    fn strategy_serializes_as_snake_case() {
        let json = serde_json::to_string(&Strategy::ByContent).expect("serializes");
        assert_eq!(json, "\"by_content\"");
    }

    #[test]
    fn format_size_picks_sensible_units() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512.0 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(150 * 1024 * 1024), "150.0 MB");
    }
}
