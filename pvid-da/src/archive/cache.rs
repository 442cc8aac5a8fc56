//! Run-scoped cache of loaded classification sets

use super::store::{ArchiveClassificationSet, ArchiveMatch};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Classification sets keyed by work task id.
///
/// Each task's datasets are read from disk at most once per run, lazily on
/// first use. Loaded sets are immutable and handed out as `Arc` so they can be
/// shared read-only across batches.
#[derive(Debug)]
pub struct TaskDatasetCache {
    root: PathBuf,
    loaded: HashMap<String, Arc<ArchiveClassificationSet>>,
}

impl TaskDatasetCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            loaded: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of tasks loaded so far
    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    /// Classification set for `task_id`, loading it on first request
    pub fn get_or_load(&mut self, task_id: &str) -> Arc<ArchiveClassificationSet> {
        if let Some(set) = self.loaded.get(task_id) {
            return Arc::clone(set);
        }
        let set = Arc::new(ArchiveClassificationSet::load(&self.root, task_id));
        info!("Loaded archive datasets for task {}", task_id);
        self.loaded.insert(task_id.to_string(), Arc::clone(&set));
        set
    }

    /// Probe `id` against each task in order and stop at the first task that
    /// claims it. Later tasks are not consulted once one matches, even if they
    /// would match with a higher-priority category.
    pub fn first_match(&mut self, tasks: &[String], id: &str) -> Option<(String, ArchiveMatch)> {
        for task_id in tasks {
            let set = self.get_or_load(task_id);
            if let Some(found) = set.find(id) {
                return Some((task_id.clone(), found));
            }
        }
        None
    }
}
