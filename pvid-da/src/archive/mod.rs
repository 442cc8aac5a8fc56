//! Archive classification datasets produced by the person archiving job
//!
//! Each work task writes up to six JSON files under
//! `<dataset_root>/<task_id>/Archive/`, one per discard category. They are
//! loaded into an [`ArchiveClassificationSet`] and probed in a fixed order to
//! explain why a body capture never reached an archive.

pub mod cache;
pub mod datasets;
pub mod store;

pub use cache::TaskDatasetCache;
pub use datasets::{ArchiveRecord, BigArchive, LinkedArchive, SingleArchiveEntry, SplitArchive};
pub use store::{
    ArchiveClassificationSet, ArchiveMatch, DatasetError, TaskDatasets, CLASSIFICATION_ORDER,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a capture was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiscardCategory {
    SingleArchive,
    BigArchive,
    NoLinkArchive,
    UnLinkArchive,
    SplitArchive,
    RawArchiveToAnalyze,
    SmallSize,
    DeviceNotArchived,
    NotFound,
}

impl DiscardCategory {
    /// Report label
    pub fn label(self) -> &'static str {
        match self {
            DiscardCategory::SingleArchive => "单档案",
            DiscardCategory::BigArchive => "大档案",
            DiscardCategory::NoLinkArchive => "无关联档案",
            DiscardCategory::UnLinkArchive => "关联人脸未入档",
            DiscardCategory::SplitArchive => "分裂档案",
            DiscardCategory::RawArchiveToAnalyze => "初始档案待分析",
            DiscardCategory::SmallSize => "宽高不满足要求",
            DiscardCategory::DeviceNotArchived => "设备未聚档",
            DiscardCategory::NotFound => "未找到",
        }
    }

    /// Dataset file backing this category, if it comes from the archiving job
    pub fn dataset_file(self) -> Option<&'static str> {
        match self {
            DiscardCategory::SingleArchive => Some("Single-Archive"),
            DiscardCategory::BigArchive => Some("Big-Archive"),
            DiscardCategory::NoLinkArchive => Some("No-Linked-Archive"),
            DiscardCategory::UnLinkArchive => Some("Un-Linked-Archive"),
            DiscardCategory::SplitArchive => Some("Split-Archive"),
            DiscardCategory::RawArchiveToAnalyze => Some("Raw-Archive"),
            DiscardCategory::SmallSize
            | DiscardCategory::DeviceNotArchived
            | DiscardCategory::NotFound => None,
        }
    }
}

impl fmt::Display for DiscardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
