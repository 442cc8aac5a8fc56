//! Database models

use serde::{Deserialize, Serialize};

/// Capture type tag stored on track rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaptureType {
    Face,
    Person,
}

impl CaptureType {
    /// Decode the `type` column: 0 is a face capture, anything else a body capture
    pub fn from_tag(tag: i32) -> Self {
        if tag == 0 {
            CaptureType::Face
        } else {
            CaptureType::Person
        }
    }

    pub fn tag(self) -> i32 {
        match self {
            CaptureType::Face => 0,
            CaptureType::Person => 1,
        }
    }
}

/// Link between a capture and a clustered identity ("people" archive)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub snap_id: String,
    pub people_id: String,
    pub device_id: String,
    pub capture_type: CaptureType,
}

/// Face capture recorded in the trash table with its discard reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashRecord {
    pub snap_id: String,
    pub discard_reason: String,
}

/// Face capture metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceInfo {
    pub face_id: String,
    pub device_id: String,
    pub image_url: String,
    pub pass_time: i64,
    pub image_reliability: i32,
    pub roll: f32,
    pub yaw: f32,
    pub pitch: f32,
}

/// Body capture metadata including bounding box size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonInfo {
    pub person_id: String,
    pub device_id: String,
    pub image_url: String,
    pub link_face_id: String,
    pub width: i32,
    pub height: i32,
}
