use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};

use crate::model::{FileDescriptor, Report, Strategy, TypeStats, REPORT_VERSION};

/// Pure aggregation over the scanned descriptor list. Computed once after
/// all strategies complete; totals reflect the input set regardless of how
/// many relocations succeeded.
pub fn build_report(descriptors: &[FileDescriptor], methods: &[Strategy]) -> Report {
    let mut type_statistics: BTreeMap<String, TypeStats> = BTreeMap::new();
    let mut total_size_bytes = 0_u64;

    for descriptor in descriptors {
        total_size_bytes = total_size_bytes.saturating_add(descriptor.size_bytes);
        let stats = type_statistics
            .entry(descriptor.coarse_type.label().to_string())
            .or_default();
        stats.count += 1;
        stats.size_bytes = stats.size_bytes.saturating_add(descriptor.size_bytes);
    }

    Report {
        report_version: REPORT_VERSION.to_string(),
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        total_files: descriptors.len() as u64,
        total_size_bytes,
        type_statistics,
        methods: methods.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::build_report;
    use crate::model::{CoarseType, FileDescriptor, Strategy};

    fn descriptor(name: &str, size_bytes: u64, coarse_type: CoarseType) -> FileDescriptor {
        FileDescriptor {
            name: name.to_string(),
            path: PathBuf::from(format!("/src/{name}")),
            size_bytes,
            modified: None,
            extension: String::new(),
            coarse_type,
            mime_type: None,
        }
    }

    #[test]
    fn totals_and_per_type_stats_cover_every_descriptor() {
        let descriptors = vec![
            descriptor("a.jpg", 2048, CoarseType::Image),
            descriptor("b.jpg", 1024, CoarseType::Image),
            descriptor("c.pdf", 4096, CoarseType::Document),
        ];
        let report = build_report(&descriptors, &[Strategy::ByType, Strategy::BySize]);

        assert_eq!(report.total_files, 3);
        assert_eq!(report.total_size_bytes, 7168);
        assert_eq!(report.methods, vec![Strategy::ByType, Strategy::BySize]);

        let image = report.type_statistics.get("image").expect("image stats");
        assert_eq!(image.count, 2);
        assert_eq!(image.size_bytes, 3072);
        let document = report
            .type_statistics
            .get("document")
            .expect("document stats");
        assert_eq!(document.count, 1);
        assert_eq!(document.size_bytes, 4096);
    }

    #[test]
    fn empty_input_produces_zeroed_report() {
        let report = build_report(&[], &[]);
        assert_eq!(report.total_files, 0);
        assert_eq!(report.total_size_bytes, 0);
        assert!(report.type_statistics.is_empty());
    }
}
