//! Snapshot store queries (tracks, trash, capture metadata)

use super::query::fetch_in_chunks;
use super::SnapshotRepository;
use async_trait::async_trait;
use pvid_common::db::{with_deadline, CaptureType, FaceInfo, PersonInfo, Track, TrashRecord};
use pvid_common::Result;
use sqlx::PgPool;
use std::time::Duration;
use tracing::debug;

const TRACK_QUERY: &str = "SELECT snap_id, people_id, CAST(type AS INTEGER), device_id \
     FROM viid_facestatic.people_track WHERE snap_id IN";

const TRASH_QUERY: &str = "SELECT record_id, discard_reason \
     FROM viid_facestatic.trash_archive WHERE record_id IN";

const FACE_QUERY: &str = "SELECT faceid, deviceid, imageurlpart, CAST(passtime AS BIGINT), \
     CAST(imagereliability AS INTEGER), CAST(roll AS DOUBLE PRECISION), \
     CAST(yaw AS DOUBLE PRECISION), CAST(pitch AS DOUBLE PRECISION) \
     FROM viid_facesnap.facesnapstructured_a050000 WHERE faceid IN";

const PERSON_QUERY: &str = "SELECT personid, deviceid, imageurlpart, linkfacepersonid, \
     CAST(rightbtmx - lefttopx AS INTEGER), CAST(rightbtmy - lefttopy AS INTEGER) \
     FROM viid_person.personstructured_a050300 WHERE personid IN";

type TrackRow = (String, Option<String>, i32, Option<String>);
type TrashRow = (String, Option<String>);
type FaceRow = (
    String,
    Option<String>,
    Option<String>,
    Option<i64>,
    Option<i32>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
);
type PersonRow = (
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<i32>,
    Option<i32>,
);

/// Snapshot repository over the columnar store
#[derive(Clone)]
pub struct SqlSnapshotRepository {
    pool: PgPool,
    deadline: Duration,
}

impl SqlSnapshotRepository {
    /// Every query is bounded by `deadline`
    pub fn new(pool: PgPool, deadline: Duration) -> Self {
        Self { pool, deadline }
    }
}

#[async_trait]
impl SnapshotRepository for SqlSnapshotRepository {
    async fn query_tracks(&self, ids: &[String]) -> Result<Vec<Track>> {
        let rows: Vec<TrackRow> = with_deadline(
            "query tracks",
            self.deadline,
            fetch_in_chunks(&self.pool, TRACK_QUERY, ids),
        )
        .await?;
        debug!("Track query: {} ids -> {} rows", ids.len(), rows.len());
        Ok(rows.into_iter().map(track_from_row).collect())
    }

    async fn query_trash(&self, ids: &[String]) -> Result<Vec<TrashRecord>> {
        let rows: Vec<TrashRow> = with_deadline(
            "query trash",
            self.deadline,
            fetch_in_chunks(&self.pool, TRASH_QUERY, ids),
        )
        .await?;
        debug!("Trash query: {} ids -> {} rows", ids.len(), rows.len());
        Ok(rows
            .into_iter()
            .map(|(snap_id, reason)| TrashRecord {
                snap_id,
                discard_reason: reason.unwrap_or_default(),
            })
            .collect())
    }

    async fn query_face_info(&self, ids: &[String]) -> Result<Vec<FaceInfo>> {
        let rows: Vec<FaceRow> = with_deadline(
            "query face info",
            self.deadline,
            fetch_in_chunks(&self.pool, FACE_QUERY, ids),
        )
        .await?;
        Ok(rows.into_iter().map(face_from_row).collect())
    }

    async fn query_person_info(&self, ids: &[String]) -> Result<Vec<PersonInfo>> {
        let rows: Vec<PersonRow> = with_deadline(
            "query person info",
            self.deadline,
            fetch_in_chunks(&self.pool, PERSON_QUERY, ids),
        )
        .await?;
        Ok(rows.into_iter().map(person_from_row).collect())
    }
}

fn track_from_row((snap_id, people_id, tag, device_id): TrackRow) -> Track {
    Track {
        snap_id,
        people_id: people_id.unwrap_or_default(),
        device_id: device_id.unwrap_or_default(),
        capture_type: CaptureType::from_tag(tag),
    }
}

fn face_from_row(row: FaceRow) -> FaceInfo {
    let (face_id, device_id, image_url, pass_time, reliability, roll, yaw, pitch) = row;
    FaceInfo {
        face_id,
        device_id: device_id.unwrap_or_default(),
        image_url: image_url.unwrap_or_default(),
        pass_time: pass_time.unwrap_or_default(),
        image_reliability: reliability.unwrap_or_default(),
        roll: roll.unwrap_or_default() as f32,
        yaw: yaw.unwrap_or_default() as f32,
        pitch: pitch.unwrap_or_default() as f32,
    }
}

/// Null box coordinates decode to zero size
fn person_from_row(row: PersonRow) -> PersonInfo {
    let (person_id, device_id, image_url, link_face_id, width, height) = row;
    PersonInfo {
        person_id,
        device_id: device_id.unwrap_or_default(),
        image_url: image_url.unwrap_or_default(),
        link_face_id: link_face_id.unwrap_or_default(),
        width: width.unwrap_or_default(),
        height: height.unwrap_or_default(),
    }
}
