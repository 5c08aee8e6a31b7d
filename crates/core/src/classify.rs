use serde::{Deserialize, Serialize};

use crate::model::{CoarseType, FileDescriptor};

/// Closed set of semantic content categories used by the `by_content`
/// strategy and the keyword fallback classifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContentCategory {
    ReportsResearch,
    PlansStrategies,
    WorkProjects,
    AudioRecordings,
    ImagesPhotos,
    Videos,
    Documents,
    DataSpreadsheets,
    ContractsAgreements,
    PersonalDocuments,
    FinancialDocuments,
    LearningMaterials,
    MarketingMaterials,
    PeriodicReports,
    MarketInsights,
    TechnologyAi,
    HealthFitness,
    TravelAccommodation,
    ShoppingOrders,
    SocialChat,
    EntertainmentGames,
    DailyLife,
    Archives,
    OtherFiles,
}

impl ContentCategory {
    pub const ALL: [ContentCategory; 24] = [
        ContentCategory::ReportsResearch,
        ContentCategory::PlansStrategies,
        ContentCategory::WorkProjects,
        ContentCategory::AudioRecordings,
        ContentCategory::ImagesPhotos,
        ContentCategory::Videos,
        ContentCategory::Documents,
        ContentCategory::DataSpreadsheets,
        ContentCategory::ContractsAgreements,
        ContentCategory::PersonalDocuments,
        ContentCategory::FinancialDocuments,
        ContentCategory::LearningMaterials,
        ContentCategory::MarketingMaterials,
        ContentCategory::PeriodicReports,
        ContentCategory::MarketInsights,
        ContentCategory::TechnologyAi,
        ContentCategory::HealthFitness,
        ContentCategory::TravelAccommodation,
        ContentCategory::ShoppingOrders,
        ContentCategory::SocialChat,
        ContentCategory::EntertainmentGames,
        ContentCategory::DailyLife,
        ContentCategory::Archives,
        ContentCategory::OtherFiles,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ContentCategory::ReportsResearch => "reports_research",
            ContentCategory::PlansStrategies => "plans_strategies",
            ContentCategory::WorkProjects => "work_projects",
            ContentCategory::AudioRecordings => "audio_recordings",
            ContentCategory::ImagesPhotos => "images_photos",
            ContentCategory::Videos => "videos",
            ContentCategory::Documents => "documents",
            ContentCategory::DataSpreadsheets => "data_spreadsheets",
            ContentCategory::ContractsAgreements => "contracts_agreements",
            ContentCategory::PersonalDocuments => "personal_documents",
            ContentCategory::FinancialDocuments => "financial_documents",
            ContentCategory::LearningMaterials => "learning_materials",
            ContentCategory::MarketingMaterials => "marketing_materials",
            ContentCategory::PeriodicReports => "periodic_reports",
            ContentCategory::MarketInsights => "market_insights",
            ContentCategory::TechnologyAi => "technology_ai",
            ContentCategory::HealthFitness => "health_fitness",
            ContentCategory::TravelAccommodation => "travel_accommodation",
            ContentCategory::ShoppingOrders => "shopping_orders",
            ContentCategory::SocialChat => "social_chat",
            ContentCategory::EntertainmentGames => "entertainment_games",
            ContentCategory::DailyLife => "daily_life",
            ContentCategory::Archives => "archives",
            ContentCategory::OtherFiles => "other_files",
        }
    }
}

/// Result of one classifier call. `ok = false` means the file could not be
/// analyzed; the organizer buckets it as `unknown` and keeps going.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifierVerdict {
    pub category: String,
    pub tags: Vec<String>,
    pub ok: bool,
}

/// Polymorphic classification capability. The core ships the keyword
/// fallback; remote AI-backed implementations plug in at the same seam.
pub trait ContentClassifier {
    fn analyze(&self, descriptor: &FileDescriptor) -> ClassifierVerdict;
}

/// Ordered keyword rule table, first match wins. Keyword groups and their
/// priority order are compatibility-sensitive; do not reorder.
const KEYWORD_RULES: &[(ContentCategory, &[&str])] = &[
    (
        ContentCategory::ReportsResearch,
        &["报告", "report", "分析", "analysis", "研究", "research"],
    ),
    (
        ContentCategory::PlansStrategies,
        &["计划", "plan", "规划", "strategy", "方案", "proposal"],
    ),
    (
        ContentCategory::WorkProjects,
        &["工作", "work", "项目", "project", "okr", "pmo"],
    ),
    (
        ContentCategory::AudioRecordings,
        &["录音", "audio", "voice", "语音"],
    ),
    (
        ContentCategory::ImagesPhotos,
        &["图片", "image", "photo", "截图", "screenshot"],
    ),
    (ContentCategory::Videos, &["视频", "video", "录像"]),
    (
        ContentCategory::Documents,
        &["文档", "document", "doc", "pdf"],
    ),
    (
        ContentCategory::DataSpreadsheets,
        &["数据", "data", "表格", "excel", "xlsx"],
    ),
    (
        ContentCategory::ContractsAgreements,
        &["合同", "contract", "协议", "agreement"],
    ),
    (
        ContentCategory::PersonalDocuments,
        &["简历", "resume", "cv", "个人资料"],
    ),
    (
        ContentCategory::FinancialDocuments,
        &["财务", "finance", "账单", "bill", "发票", "invoice"],
    ),
    (
        ContentCategory::LearningMaterials,
        &["学习", "study", "培训", "training", "教育", "education"],
    ),
    (
        ContentCategory::MarketingMaterials,
        &["营销", "marketing", "广告", "advertisement", "宣传"],
    ),
    (
        ContentCategory::PeriodicReports,
        &["年报", "annual", "季度", "quarterly", "月度", "monthly"],
    ),
    (
        ContentCategory::MarketInsights,
        &["市场", "market", "行业", "industry", "洞察", "insight"],
    ),
    (
        ContentCategory::TechnologyAi,
        &["技术", "tech", "ai", "人工智能", "数字化"],
    ),
    (
        ContentCategory::HealthFitness,
        &["健康", "health", "医疗", "medical", "健身", "fitness"],
    ),
    (
        ContentCategory::TravelAccommodation,
        &["旅游", "travel", "酒店", "hotel", "机票", "flight"],
    ),
    (
        ContentCategory::ShoppingOrders,
        &["购物", "shopping", "订单", "order", "商品", "product"],
    ),
    (
        ContentCategory::SocialChat,
        &["社交", "social", "聊天", "chat", "微信", "wechat"],
    ),
    (
        ContentCategory::EntertainmentGames,
        &["娱乐", "entertainment", "游戏", "game", "音乐", "music"],
    ),
    (
        ContentCategory::DailyLife,
        &["生活", "life", "日常", "daily", "家庭", "family"],
    ),
];

/// Keyword-heuristic fallback classifier: ordered filename keyword groups,
/// then coarse-type defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn categorize(&self, descriptor: &FileDescriptor) -> ContentCategory {
        let name = descriptor.name.to_lowercase();
        for (category, keywords) in KEYWORD_RULES {
            if keywords.iter().any(|keyword| name.contains(keyword)) {
                return *category;
            }
        }

        match descriptor.coarse_type {
            CoarseType::Image => ContentCategory::ImagesPhotos,
            CoarseType::Video => ContentCategory::Videos,
            CoarseType::Audio => ContentCategory::AudioRecordings,
            CoarseType::Document => match descriptor.extension.as_str() {
                ".xls" | ".xlsx" | ".csv" => ContentCategory::DataSpreadsheets,
                _ => ContentCategory::Documents,
            },
            CoarseType::Archive => ContentCategory::Archives,
            CoarseType::Other => ContentCategory::OtherFiles,
        }
    }

    fn tags(&self, descriptor: &FileDescriptor) -> Vec<String> {
        let mut tags = vec![descriptor.coarse_type.label().to_string()];
        if !descriptor.extension.is_empty() {
            tags.push(descriptor.extension.clone());
        }
        if descriptor.size_bytes > 100 * 1024 * 1024 {
            tags.push("large_file".to_string());
        } else if descriptor.size_bytes < 1024 {
            tags.push("small_file".to_string());
        }
        tags
    }
}

impl ContentClassifier for KeywordClassifier {
    fn analyze(&self, descriptor: &FileDescriptor) -> ClassifierVerdict {
        ClassifierVerdict {
            category: self.categorize(descriptor).label().to_string(),
            tags: self.tags(descriptor),
            ok: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{ContentCategory, ContentClassifier, KeywordClassifier};
    use crate::model::{CoarseType, FileDescriptor};

    fn descriptor(name: &str, extension: &str, coarse_type: CoarseType) -> FileDescriptor {
        FileDescriptor {
            name: name.to_string(),
            path: PathBuf::from(format!("/tmp/{name}")),
            size_bytes: 2048,
            modified: None,
            extension: extension.to_string(),
            coarse_type,
            mime_type: None,
        }
    }

    #[test]
    fn first_matching_keyword_group_wins() {
        // "report" (group 1) outranks "project" (group 3).
        let classifier = KeywordClassifier;
        let file = descriptor("project_report.pdf", ".pdf", CoarseType::Document);
        assert_eq!(classifier.categorize(&file), ContentCategory::ReportsResearch);
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let classifier = KeywordClassifier;
        let file = descriptor("Q3-INVOICE-final.pdf", ".pdf", CoarseType::Document);
        assert_eq!(
            classifier.categorize(&file),
            ContentCategory::FinancialDocuments
        );
    }

    #[test]
    fn coarse_type_defaults_apply_without_keyword_hits() {
        let classifier = KeywordClassifier;
        assert_eq!(
            classifier.categorize(&descriptor("IMG_0001.heic", ".heic", CoarseType::Image)),
            ContentCategory::ImagesPhotos
        );
        assert_eq!(
            classifier.categorize(&descriptor("a1b2c3.xlsx", ".xlsx", CoarseType::Document)),
            ContentCategory::DataSpreadsheets
        );
        assert_eq!(
            classifier.categorize(&descriptor("notes_v2.rtf", ".rtf", CoarseType::Document)),
            ContentCategory::Documents
        );
        assert_eq!(
            classifier.categorize(&descriptor("bundle.7z", ".7z", CoarseType::Archive)),
            ContentCategory::Archives
        );
        assert_eq!(
            classifier.categorize(&descriptor("blob.bin", ".bin", CoarseType::Other)),
            ContentCategory::OtherFiles
        );
    }

    #[test]
    fn verdict_carries_type_extension_and_size_tags() {
        let classifier = KeywordClassifier;
        let mut file = descriptor("voice_memo.m4a", ".m4a", CoarseType::Audio);
        file.size_bytes = 500;
        let verdict = classifier.analyze(&file);

        assert!(verdict.ok);
        assert_eq!(verdict.category, "audio_recordings");
        assert_eq!(
            verdict.tags,
            vec![
                "audio".to_string(),
                ".m4a".to_string(),
                "small_file".to_string()
            ]
        );
    }

    #[test]
    fn category_labels_are_unique() {
        let mut labels = ContentCategory::ALL
            .iter()
            .map(|category| category.label())
            .collect::<Vec<_>>();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), ContentCategory::ALL.len());
    }
}
