//! Per-task classification set: loading and ordered lookup

use super::datasets::{ArchiveRecord, BigArchive, LinkedArchive, SingleArchiveEntry, SplitArchive};
use super::DiscardCategory;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Dataset load failure. Never leaves this module: every variant collapses to
/// an empty dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Dataset not present: {0}")]
    Missing(PathBuf),

    #[error("Read dataset {path} failed: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse dataset {path} failed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A category claim on an id, with the record that made it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMatch {
    pub category: DiscardCategory,
    pub record: ArchiveRecord,
}

/// Probe order. Earlier categories are more specific and shadow later ones when
/// the job lists an id in several datasets.
pub const CLASSIFICATION_ORDER: [DiscardCategory; 6] = [
    DiscardCategory::SingleArchive,
    DiscardCategory::BigArchive,
    DiscardCategory::NoLinkArchive,
    DiscardCategory::UnLinkArchive,
    DiscardCategory::SplitArchive,
    DiscardCategory::RawArchiveToAnalyze,
];

/// Raw content of one task's six dataset files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDatasets {
    pub single: Vec<SingleArchiveEntry>,
    pub big: Vec<BigArchive>,
    pub no_link: Vec<LinkedArchive>,
    pub un_link: Vec<LinkedArchive>,
    pub split: Vec<SplitArchive>,
    pub raw: Vec<LinkedArchive>,
}

impl TaskDatasets {
    /// True if no dataset holds any record
    pub fn is_empty(&self) -> bool {
        self.single.is_empty()
            && self.big.is_empty()
            && self.no_link.is_empty()
            && self.un_link.is_empty()
            && self.split.is_empty()
            && self.raw.is_empty()
    }

    /// Member ids of each record of `category`, in file order
    fn members(&self, category: DiscardCategory) -> Vec<Vec<&str>> {
        match category {
            DiscardCategory::SingleArchive => {
                self.single.iter().map(|entry| vec![entry.person_id()]).collect()
            }
            DiscardCategory::BigArchive => self.big.iter().map(|big| as_strs(&big.tracks)).collect(),
            DiscardCategory::NoLinkArchive => linked_members(&self.no_link),
            DiscardCategory::UnLinkArchive => linked_members(&self.un_link),
            DiscardCategory::SplitArchive => {
                self.split.iter().map(|split| as_strs(&split.tracks)).collect()
            }
            DiscardCategory::RawArchiveToAnalyze => linked_members(&self.raw),
            DiscardCategory::SmallSize
            | DiscardCategory::DeviceNotArchived
            | DiscardCategory::NotFound => Vec::new(),
        }
    }

    /// Record `index` of the dataset backing `category`
    fn record(&self, category: DiscardCategory, index: usize) -> Option<ArchiveRecord> {
        match category {
            DiscardCategory::SingleArchive => self.single.get(index).cloned().map(ArchiveRecord::Single),
            DiscardCategory::BigArchive => self.big.get(index).cloned().map(ArchiveRecord::Big),
            DiscardCategory::NoLinkArchive => self.no_link.get(index).cloned().map(ArchiveRecord::Linked),
            DiscardCategory::UnLinkArchive => self.un_link.get(index).cloned().map(ArchiveRecord::Linked),
            DiscardCategory::SplitArchive => self.split.get(index).cloned().map(ArchiveRecord::Split),
            DiscardCategory::RawArchiveToAnalyze => self.raw.get(index).cloned().map(ArchiveRecord::Linked),
            DiscardCategory::SmallSize
            | DiscardCategory::DeviceNotArchived
            | DiscardCategory::NotFound => None,
        }
    }
}

fn as_strs(ids: &[String]) -> Vec<&str> {
    ids.iter().map(String::as_str).collect()
}

fn linked_members(archives: &[LinkedArchive]) -> Vec<Vec<&str>> {
    archives.iter().map(|archive| as_strs(&archive.person_ids)).collect()
}

/// The six datasets of one work task plus an id index. Read-only after load.
///
/// The index maps each member id to the first `(category, record)` claiming it
/// in probe order, so a lookup costs one hash probe regardless of dataset size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveClassificationSet {
    pub task_id: String,
    pub datasets: TaskDatasets,
    index: HashMap<String, (DiscardCategory, usize)>,
}

impl ArchiveClassificationSet {
    pub fn new(task_id: impl Into<String>, datasets: TaskDatasets) -> Self {
        let mut index = HashMap::new();
        for category in CLASSIFICATION_ORDER {
            for (position, members) in datasets.members(category).into_iter().enumerate() {
                for id in members {
                    index.entry(id.to_string()).or_insert((category, position));
                }
            }
        }
        Self {
            task_id: task_id.into(),
            datasets,
            index,
        }
    }

    /// Directory holding a task's dataset files
    pub fn task_dir(root: &Path, task_id: &str) -> PathBuf {
        root.join(task_id).join("Archive")
    }

    /// Load all datasets of `task_id`.
    ///
    /// Absent files are empty datasets. Unreadable or malformed files are
    /// logged and also treated as empty; the rest of the task still loads.
    pub fn load(root: &Path, task_id: &str) -> Self {
        let dir = Self::task_dir(root, task_id);
        let datasets = TaskDatasets {
            single: load_or_empty(&dir, DiscardCategory::SingleArchive),
            big: load_or_empty(&dir, DiscardCategory::BigArchive),
            no_link: load_or_empty(&dir, DiscardCategory::NoLinkArchive),
            un_link: load_or_empty(&dir, DiscardCategory::UnLinkArchive),
            split: load_or_empty(&dir, DiscardCategory::SplitArchive),
            raw: load_or_empty(&dir, DiscardCategory::RawArchiveToAnalyze),
        };
        let set = Self::new(task_id, datasets);
        debug!(
            task = task_id,
            single = set.datasets.single.len(),
            big = set.datasets.big.len(),
            no_link = set.datasets.no_link.len(),
            un_link = set.datasets.un_link.len(),
            split = set.datasets.split.len(),
            raw = set.datasets.raw.len(),
            indexed_ids = set.index.len(),
            "Loaded archive datasets"
        );
        set
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// First category, in probe order, whose dataset contains `id`
    pub fn find(&self, id: &str) -> Option<ArchiveMatch> {
        let &(category, position) = self.index.get(id)?;
        self.datasets
            .record(category, position)
            .map(|record| ArchiveMatch { category, record })
    }

    /// Category claiming `id` and the matching record, or `NotFound`
    pub fn classify(&self, id: &str) -> (DiscardCategory, Option<ArchiveRecord>) {
        match self.find(id) {
            Some(m) => (m.category, Some(m.record)),
            None => (DiscardCategory::NotFound, None),
        }
    }
}

/// Read one dataset file as a JSON array of `T`
pub fn read_dataset<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, DatasetError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DatasetError::Missing(path.to_path_buf()))
        }
        Err(e) => {
            return Err(DatasetError::Read {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    serde_json::from_slice(&bytes).map_err(|e| DatasetError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

fn load_or_empty<T: DeserializeOwned>(dir: &Path, category: DiscardCategory) -> Vec<T> {
    let Some(file) = category.dataset_file() else {
        return Vec::new();
    };
    match read_dataset(&dir.join(file)) {
        Ok(records) => records,
        Err(DatasetError::Missing(path)) => {
            debug!("No {} dataset at {}", file, path.display());
            Vec::new()
        }
        Err(e) => {
            warn!("Ignoring {} dataset: {}", file, e);
            Vec::new()
        }
    }
}
