//! Analysis report model and renderers
//!
//! A report is built once per batch by the engine, finalized with [`AnalyzeResult::clean`],
//! and then only read. Rendering is a pure transformation: text sections are emitted
//! in a fixed order (global stats, per-archive detail, face discards, person discards).

use crate::archive::{ArchiveRecord, DiscardCategory};
use pvid_common::collections::dedup_keep_order;
use serde::Serialize;
use std::io::{self, Write};

const SEPARATOR: &str = "-------------------------------------";

/// Snapshot counts and capture devices of the whole batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SnapInfo {
    pub face_snap_num: usize,
    pub person_snap_num: usize,
    pub face_devices: Vec<String>,
    pub person_devices: Vec<String>,
}

impl SnapInfo {
    /// Distinct devices across both capture types
    pub fn all_devices(&self) -> Vec<String> {
        dedup_keep_order(self.face_devices.iter().chain(self.person_devices.iter()).cloned())
    }
}

/// Summary of one clustered identity ("people" archive)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PeopleInfo {
    pub people_id: String,
    pub device_ids: Vec<String>,
    pub face_tracks: Vec<String>,
    pub face_devices: Vec<String>,
    pub person_tracks: Vec<String>,
    pub person_devices: Vec<String>,
}

/// Face captures discarded for the same recorded reason
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FaceDiscard {
    pub discard_reason: String,
    pub ids: Vec<String>,
}

/// Explanation for one discarded body capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonDiscard {
    pub id: String,
    pub discard_reason: DiscardCategory,
    /// Work task whose dataset claimed the id
    pub work_task: Option<String>,
    /// Dataset record that claimed the id
    pub archive_info: Option<ArchiveRecord>,
}

impl PersonDiscard {
    pub fn new(id: impl Into<String>, reason: DiscardCategory) -> Self {
        Self {
            id: id.into(),
            discard_reason: reason,
            work_task: None,
            archive_info: None,
        }
    }
}

/// Analysis report of one batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalyzeResult {
    pub name: String,
    pub snap_info: SnapInfo,
    /// Devices that contributed at least one archived track
    pub device_ids: Vec<String>,
    pub people_infos: Vec<PeopleInfo>,
    pub face_discards: Vec<FaceDiscard>,
    pub person_discards: Vec<PersonDiscard>,
}

impl AnalyzeResult {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Deduplicate every device list, keeping first-seen order
    pub fn clean(&mut self) {
        self.device_ids = dedup_keep_order(self.device_ids.drain(..));
        for people in &mut self.people_infos {
            people.device_ids = dedup_keep_order(people.device_ids.drain(..));
            people.face_devices = dedup_keep_order(people.face_devices.drain(..));
            people.person_devices = dedup_keep_order(people.person_devices.drain(..));
        }
        self.snap_info.face_devices = dedup_keep_order(self.snap_info.face_devices.drain(..));
        self.snap_info.person_devices = dedup_keep_order(self.snap_info.person_devices.drain(..));
    }

    /// Body capture ids covered by some archive
    pub fn person_track_ids(&self) -> impl Iterator<Item = &str> {
        self.people_infos
            .iter()
            .flat_map(|p| p.person_tracks.iter().map(String::as_str))
    }

    /// Face capture ids covered by some archive
    pub fn face_track_ids(&self) -> impl Iterator<Item = &str> {
        self.people_infos
            .iter()
            .flat_map(|p| p.face_tracks.iter().map(String::as_str))
    }

    /// Render the plain-text report
    pub fn write_text<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let snap = &self.snap_info;
        writeln!(w, "该走点人走点基本信息如下: ")?;
        writeln!(
            w,
            "-设备数: {}, 人脸设备: {}, 人体设备: {}",
            snap.all_devices().len(),
            snap.face_devices.len(),
            snap.person_devices.len()
        )?;
        writeln!(w, "-人脸抓拍数: {}", snap.face_snap_num)?;
        writeln!(w, "-人体抓拍数: {}", snap.person_snap_num)?;

        writeln!(w, "聚档信息如下: ")?;
        writeln!(w, "-召回设备数: {}", self.device_ids.len())?;
        writeln!(w, "-召回设备列表: {}", self.device_ids.join(","))?;
        writeln!(w, "-档案数: {}", self.people_infos.len())?;
        writeln!(w, "-档案详情: ")?;
        for people in &self.people_infos {
            writeln!(w, "{}", SEPARATOR)?;
            write_people(w, people)?;
        }

        writeln!(w, "{}", SEPARATOR)?;
        writeln!(w, "-人脸丢弃信息: ")?;
        for discard in &self.face_discards {
            writeln!(w, "|丢弃原因: {}, 数量: {}", discard.discard_reason, discard.ids.len())?;
            writeln!(w, "|丢弃抓拍: {}", discard.ids.join(","))?;
        }

        writeln!(w, "-人体丢弃信息: ")?;
        for discard in &self.person_discards {
            writeln!(w, "{}", SEPARATOR)?;
            writeln!(
                w,
                "|任务: {}, 丢弃原因: {}, 人体抓拍: {}",
                discard.work_task.as_deref().unwrap_or(""),
                discard.discard_reason,
                discard.id
            )?;
            match &discard.archive_info {
                Some(record) => writeln!(w, "|详情: {}", record)?,
                None => writeln!(w, "|详情: -")?,
            }
        }
        Ok(())
    }

    /// Render the plain-text report into a string
    pub fn to_text(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.write_text(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Render the report as pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn write_people<W: Write>(w: &mut W, p: &PeopleInfo) -> io::Result<()> {
    writeln!(w, "|档案ID: {}", p.people_id)?;
    writeln!(
        w,
        "|设备数: {}, 人脸设备数: {}, 人体设备数: {}",
        p.device_ids.len(),
        p.face_devices.len(),
        p.person_devices.len()
    )?;
    writeln!(w, "|人脸抓拍数: {}, 人体抓拍数: {}", p.face_tracks.len(), p.person_tracks.len())?;
    writeln!(w, "|设备列表: {}", p.device_ids.join(","))?;
    writeln!(w, "|人脸设备列表: {}", p.face_devices.join(","))?;
    writeln!(w, "|人体设备列表: {}", p.person_devices.join(","))
}
