//! JSON record shapes of the archiving job's dataset files

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Archive rejected for spanning too many devices or tracks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BigArchive {
    #[serde(rename = "deviceNum")]
    pub device_num: i64,
    #[serde(rename = "archiveNum")]
    pub track_num: i64,
    pub devices: Vec<String>,
    #[serde(rename = "archive")]
    pub tracks: Vec<String>,
}

/// Single-Archive entry.
///
/// Older job versions write a bare id per entry, newer ones a record; both are
/// accepted, entry by entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SingleArchiveEntry {
    Id(String),
    Record {
        #[serde(rename = "personId", alias = "id")]
        person_id: String,
        #[serde(rename = "archiveId", default, skip_serializing_if = "Option::is_none")]
        archive_id: Option<String>,
    },
}

impl SingleArchiveEntry {
    pub fn person_id(&self) -> &str {
        match self {
            SingleArchiveEntry::Id(id) => id,
            SingleArchiveEntry::Record { person_id, .. } => person_id,
        }
    }
}

/// Archive plus its member body captures; shared by the No-Linked,
/// Un-Linked and Raw datasets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkedArchive {
    #[serde(rename = "archiveId")]
    pub archive_id: String,
    #[serde(rename = "personIds")]
    pub person_ids: Vec<String>,
}

/// Archive that the job split into several identities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitArchive {
    #[serde(rename = "peopleSize")]
    pub people_size: i64,
    #[serde(rename = "archiveNum")]
    pub track_num: i64,
    /// Track count per resulting identity
    pub people: BTreeMap<String, i64>,
    #[serde(rename = "archive")]
    pub tracks: Vec<String>,
}

/// The dataset record that claimed an id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ArchiveRecord {
    Single(SingleArchiveEntry),
    Big(BigArchive),
    Linked(LinkedArchive),
    Split(SplitArchive),
}

impl fmt::Display for ArchiveRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}
