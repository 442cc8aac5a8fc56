//! In-memory repositories and fixtures shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use pvid_common::db::{CaptureType, FaceInfo, PersonInfo, Track, TrashRecord};
use pvid_common::{Error, Result};
use pvid_da::archive::ArchiveClassificationSet;
use pvid_da::db::{SnapshotRepository, TaskRepository};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 48-char face id: 41 digits, marker "06", 5 digits
pub fn face_id(n: u32) -> String {
    format!("{:041}06{:05}", n, 0)
}

/// 48-char body id: 41 digits, marker "07", 5 digits
pub fn person_id(n: u32) -> String {
    format!("{:041}07{:05}", n, 0)
}

pub fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
}

pub fn track(snap: &str, people: &str, device: &str, capture_type: CaptureType) -> Track {
    Track {
        snap_id: snap.to_string(),
        people_id: people.to_string(),
        device_id: device.to_string(),
        capture_type,
    }
}

pub fn trash(snap: &str, reason: &str) -> TrashRecord {
    TrashRecord {
        snap_id: snap.to_string(),
        discard_reason: reason.to_string(),
    }
}

pub fn face_info(id: &str, device: &str) -> FaceInfo {
    FaceInfo {
        face_id: id.to_string(),
        device_id: device.to_string(),
        image_url: String::new(),
        pass_time: 0,
        image_reliability: 0,
        roll: 0.0,
        yaw: 0.0,
        pitch: 0.0,
    }
}

pub fn person_info(id: &str, device: &str, width: i32, height: i32) -> PersonInfo {
    PersonInfo {
        person_id: id.to_string(),
        device_id: device.to_string(),
        image_url: String::new(),
        link_face_id: String::new(),
        width,
        height,
    }
}

/// Write a dataset file for `task` under `root`
pub fn write_dataset(root: &Path, task: &str, file: &str, json: &str) {
    let dir = ArchiveClassificationSet::task_dir(root, task);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(file), json).unwrap();
}

#[derive(Default)]
pub struct FakeSnapshots {
    pub tracks: Vec<Track>,
    pub trash: Vec<TrashRecord>,
    pub faces: Vec<FaceInfo>,
    pub persons: Vec<PersonInfo>,
    /// Fail every query with a database-style error
    pub fail: bool,
    /// Fail every query with a non-store error
    pub corrupt: bool,
    pub trash_calls: Arc<AtomicUsize>,
}

impl FakeSnapshots {
    fn check(&self) -> Result<()> {
        if self.fail {
            Err(Error::Timeout("snapshot store unreachable".to_string()))
        } else if self.corrupt {
            Err(Error::Internal("undecodable row".to_string()))
        } else {
            Ok(())
        }
    }
}

fn wanted(ids: &[String], id: &str) -> bool {
    ids.iter().any(|candidate| candidate == id)
}

#[async_trait]
impl SnapshotRepository for FakeSnapshots {
    async fn query_tracks(&self, ids: &[String]) -> Result<Vec<Track>> {
        self.check()?;
        Ok(self.tracks.iter().filter(|t| wanted(ids, &t.snap_id)).cloned().collect())
    }

    async fn query_trash(&self, ids: &[String]) -> Result<Vec<TrashRecord>> {
        self.check()?;
        self.trash_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.trash.iter().filter(|t| wanted(ids, &t.snap_id)).cloned().collect())
    }

    async fn query_face_info(&self, ids: &[String]) -> Result<Vec<FaceInfo>> {
        self.check()?;
        Ok(self.faces.iter().filter(|f| wanted(ids, &f.face_id)).cloned().collect())
    }

    async fn query_person_info(&self, ids: &[String]) -> Result<Vec<PersonInfo>> {
        self.check()?;
        Ok(self.persons.iter().filter(|p| wanted(ids, &p.person_id)).cloned().collect())
    }
}

#[derive(Default)]
pub struct FakeTasks {
    /// `None` makes the work-task query fail
    pub tasks: Option<Vec<String>>,
    /// `None` makes the device query fail
    pub archived_devices: Option<Vec<String>>,
    pub work_task_calls: Arc<AtomicUsize>,
}

impl FakeTasks {
    pub fn with_tasks(tasks: &[&str]) -> Self {
        Self {
            tasks: Some(tasks.iter().map(|t| t.to_string()).collect()),
            archived_devices: Some(Vec::new()),
            work_task_calls: Arc::default(),
        }
    }
}

#[async_trait]
impl TaskRepository for FakeTasks {
    async fn query_work_tasks(&self, _date: NaiveDate) -> Result<Vec<String>> {
        self.work_task_calls.fetch_add(1, Ordering::SeqCst);
        self.tasks
            .clone()
            .ok_or_else(|| Error::Timeout("query work tasks exceeded 60s".to_string()))
    }

    async fn query_person_archive_devices(&self, device_ids: &[String]) -> Result<Vec<String>> {
        let archived = self
            .archived_devices
            .as_ref()
            .ok_or_else(|| Error::Internal("device store unreachable".to_string()))?;
        Ok(device_ids
            .iter()
            .filter(|d| archived.contains(d))
            .cloned()
            .collect())
    }
}
