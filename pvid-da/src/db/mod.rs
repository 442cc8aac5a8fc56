//! Data store access for pvid-da
//!
//! Two read-only stores are consulted:
//! - the snapshot store (captures, tracks, trash records)
//! - the metadata store (archiving work tasks, device configuration)
//!
//! The engine only sees the traits below; the SQL implementations live in
//! submodules and tests substitute in-memory fakes.

use async_trait::async_trait;
use chrono::NaiveDate;
use pvid_common::db::{FaceInfo, PersonInfo, Track, TrashRecord};
use pvid_common::Result;

mod query;
mod snapshots;
mod tasks;

pub use query::QUERY_CHUNK_SIZE;
pub use snapshots::SqlSnapshotRepository;
pub use tasks::SqlTaskRepository;

/// Capture, track and trash lookups.
///
/// Ids with no matching row simply produce no output row.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Track rows whose snap id is in `ids`
    async fn query_tracks(&self, ids: &[String]) -> Result<Vec<Track>>;

    /// Discard reasons recorded in the face trash table for `ids`
    async fn query_trash(&self, ids: &[String]) -> Result<Vec<TrashRecord>>;

    /// Face capture metadata for `ids`
    async fn query_face_info(&self, ids: &[String]) -> Result<Vec<FaceInfo>>;

    /// Body capture metadata (device, bounding box) for `ids`
    async fn query_person_info(&self, ids: &[String]) -> Result<Vec<PersonInfo>>;
}

/// Archiving job and device configuration lookups
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Work task ids created on `date`, oldest first
    async fn query_work_tasks(&self, date: NaiveDate) -> Result<Vec<String>>;

    /// Subset of `device_ids` configured for body-capture archiving
    async fn query_person_archive_devices(&self, device_ids: &[String]) -> Result<Vec<String>>;
}
