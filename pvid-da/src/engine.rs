//! Reconciliation engine
//!
//! Turns one [`Batch`] into one [`AnalyzeResult`]:
//! 1. snapshot accounting (counts, capture devices)
//! 2. track resolution, grouped into per-archive summaries
//! 3. face discards, explained by the trash table
//! 4. body discards, explained by size, device configuration or the
//!    archiving job's datasets
//! 5. finalization (device list dedup)
//!
//! Steps run in order; each depends on the tracks resolved before it.
//! Any snapshot-store failure aborts the batch. Work-task and dataset
//! failures only mean "no classification found".

use crate::archive::{DiscardCategory, TaskDatasetCache};
use crate::db::{SnapshotRepository, TaskRepository};
use crate::identifier::Batch;
use crate::report::{AnalyzeResult, FaceDiscard, PeopleInfo, PersonDiscard};
use chrono::NaiveDate;
use pvid_common::collections::{dedup_keep_order, subtract};
use pvid_common::db::{CaptureType, PersonInfo, Track, TrashRecord};
use pvid_common::time::format_date;
use pvid_common::Result;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, warn};

/// Minimum body bounding box; anything smaller is discarded upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeThreshold {
    pub min_height: i32,
    pub min_width: i32,
}

impl Default for SizeThreshold {
    fn default() -> Self {
        Self {
            min_height: 150,
            min_width: 60,
        }
    }
}

impl SizeThreshold {
    pub fn is_too_small(&self, info: &PersonInfo) -> bool {
        info.height < self.min_height || info.width < self.min_width
    }
}

/// Engine settings fixed for a run
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Date whose archiving work tasks are consulted
    pub date: NaiveDate,
    pub size: SizeThreshold,
    /// Classify body captures from devices not configured for archiving
    pub check_device_archive: bool,
}

impl EngineOptions {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            date,
            size: SizeThreshold::default(),
            check_device_archive: false,
        }
    }
}

/// Batch analyzer. Owns the run-scoped dataset cache and work-task list, so
/// datasets are loaded once per run no matter how many batches are analyzed.
pub struct Reconciler<S, T> {
    snapshots: S,
    tasks: T,
    datasets: TaskDatasetCache,
    options: EngineOptions,
    work_tasks: Option<Vec<String>>,
}

impl<S: SnapshotRepository, T: TaskRepository> Reconciler<S, T> {
    pub fn new(snapshots: S, tasks: T, datasets: TaskDatasetCache, options: EngineOptions) -> Self {
        Self {
            snapshots,
            tasks,
            datasets,
            options,
            work_tasks: None,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn datasets(&self) -> &TaskDatasetCache {
        &self.datasets
    }

    /// Analyze one batch. On error no partial result is returned.
    pub async fn analyze(&mut self, batch: &Batch) -> Result<AnalyzeResult> {
        info!("Start to process: {}", batch.name);
        let mut result = AnalyzeResult::new(batch.name.clone());

        self.process_snap_info(batch, &mut result).await?;
        self.process_tracks(batch, &mut result).await?;
        self.process_face_trash(batch, &mut result).await?;
        self.process_person_trash(batch, &mut result).await?;
        result.clean();

        info!(
            batch = %batch.name,
            archives = result.people_infos.len(),
            face_discard_groups = result.face_discards.len(),
            person_discards = result.person_discards.len(),
            "Finished processing"
        );
        Ok(result)
    }

    async fn process_snap_info(&self, batch: &Batch, result: &mut AnalyzeResult) -> Result<()> {
        result.snap_info.face_snap_num = batch.face_ids.len();
        result.snap_info.person_snap_num = batch.person_ids.len();
        info!(
            "Process snap info, face snaps: {}, person snaps: {}",
            result.snap_info.face_snap_num, result.snap_info.person_snap_num
        );

        let face_ids = dedup_keep_order(batch.face_ids.iter().cloned());
        let faces = self.snapshots.query_face_info(&face_ids).await?;
        result.snap_info.face_devices = faces.into_iter().map(|f| f.device_id).collect();

        let person_ids = dedup_keep_order(batch.person_ids.iter().cloned());
        let persons = self.snapshots.query_person_info(&person_ids).await?;
        result.snap_info.person_devices = persons.into_iter().map(|p| p.device_id).collect();
        Ok(())
    }

    async fn process_tracks(&self, batch: &Batch, result: &mut AnalyzeResult) -> Result<()> {
        info!("Start to process tracks");
        let ids = dedup_keep_order(batch.face_ids.iter().chain(batch.person_ids.iter()).cloned());
        let tracks = self.snapshots.query_tracks(&ids).await?;
        debug!("Resolved {} track rows for {} ids", tracks.len(), ids.len());

        for (people_id, group) in group_tracks_by_people(tracks) {
            let people = build_people_info(people_id, &group);
            result.device_ids.extend(people.device_ids.iter().cloned());
            result.people_infos.push(people);
        }
        Ok(())
    }

    async fn process_face_trash(&self, batch: &Batch, result: &mut AnalyzeResult) -> Result<()> {
        info!("Start to process face trash");
        let face_ids = dedup_keep_order(batch.face_ids.iter().cloned());
        let uncovered: Vec<String> = {
            let covered = covered_ids(result);
            subtract(&face_ids, &covered).into_iter().cloned().collect()
        };
        if uncovered.is_empty() {
            return Ok(());
        }

        let trash = self.snapshots.query_trash(&uncovered).await?;
        result.face_discards = group_trash_by_reason(trash)
            .into_iter()
            .map(|(discard_reason, ids)| FaceDiscard { discard_reason, ids })
            .collect();
        Ok(())
    }

    async fn process_person_trash(&mut self, batch: &Batch, result: &mut AnalyzeResult) -> Result<()> {
        info!("Start to process person trash");
        let person_ids = dedup_keep_order(batch.person_ids.iter().cloned());
        let trash_ids: Vec<String> = {
            let covered = covered_ids(result);
            subtract(&person_ids, &covered).into_iter().cloned().collect()
        };
        if trash_ids.is_empty() {
            return Ok(());
        }

        let infos = self.snapshots.query_person_info(&trash_ids).await?;
        let geometry: HashMap<&str, &PersonInfo> =
            infos.iter().map(|info| (info.person_id.as_str(), info)).collect();
        let archived_devices = if self.options.check_device_archive {
            self.person_archive_devices(&infos).await
        } else {
            None
        };

        let mut discards = Vec::with_capacity(trash_ids.len());
        let mut pending = Vec::new();
        for id in &trash_ids {
            let info = geometry.get(id.as_str()).copied();
            if let Some(info) = info {
                if self.options.size.is_too_small(info) {
                    discards.push(PersonDiscard::new(id.clone(), DiscardCategory::SmallSize));
                    continue;
                }
            }
            if let (Some(archived), Some(info)) = (&archived_devices, info) {
                if !archived.contains(&info.device_id) {
                    discards.push(PersonDiscard::new(id.clone(), DiscardCategory::DeviceNotArchived));
                    continue;
                }
            }
            pending.push(discards.len());
            discards.push(PersonDiscard::new(id.clone(), DiscardCategory::NotFound));
        }

        if !pending.is_empty() {
            let tasks = self.work_tasks().await;
            for index in pending {
                let discard = &mut discards[index];
                if let Some((task_id, found)) = self.datasets.first_match(&tasks, &discard.id) {
                    discard.discard_reason = found.category;
                    discard.work_task = Some(task_id);
                    discard.archive_info = Some(found.record);
                }
            }
        }

        result.person_discards = discards;
        Ok(())
    }

    /// Work tasks for the run's date, queried once per run.
    ///
    /// A failed query yields no tasks for this batch and is retried on the next.
    async fn work_tasks(&mut self) -> Vec<String> {
        if let Some(tasks) = &self.work_tasks {
            return tasks.clone();
        }
        match self.tasks.query_work_tasks(self.options.date).await {
            Ok(tasks) => {
                if tasks.is_empty() {
                    warn!("No work tasks found for {}", format_date(self.options.date));
                }
                self.work_tasks = Some(tasks.clone());
                tasks
            }
            Err(e) => {
                warn!("Query person task info failed, skipping dataset lookup: {}", e);
                Vec::new()
            }
        }
    }

    /// Archived-device set for the devices in `infos`, or `None` if the lookup failed
    async fn person_archive_devices(&self, infos: &[PersonInfo]) -> Option<HashSet<String>> {
        let devices = dedup_keep_order(infos.iter().map(|info| info.device_id.clone()));
        match self.tasks.query_person_archive_devices(&devices).await {
            Ok(archived) => Some(archived.into_iter().collect()),
            Err(e) => {
                warn!("Query person archive devices failed, skipping device check: {}", e);
                None
            }
        }
    }
}

/// Snap ids that have at least one track row
fn covered_ids(result: &AnalyzeResult) -> HashSet<&str> {
    result.face_track_ids().chain(result.person_track_ids()).collect()
}

/// Group track rows by people id, ordered by people id
pub fn group_tracks_by_people(tracks: Vec<Track>) -> BTreeMap<String, Vec<Track>> {
    let mut groups: BTreeMap<String, Vec<Track>> = BTreeMap::new();
    for track in tracks {
        groups.entry(track.people_id.clone()).or_default().push(track);
    }
    groups
}

/// Summarize one people group; device lists are deduplicated later by `clean`
pub fn build_people_info(people_id: String, tracks: &[Track]) -> PeopleInfo {
    let mut people = PeopleInfo {
        people_id,
        ..Default::default()
    };
    for track in tracks {
        people.device_ids.push(track.device_id.clone());
        match track.capture_type {
            CaptureType::Face => {
                people.face_devices.push(track.device_id.clone());
                people.face_tracks.push(track.snap_id.clone());
            }
            CaptureType::Person => {
                people.person_devices.push(track.device_id.clone());
                people.person_tracks.push(track.snap_id.clone());
            }
        }
    }
    people
}

/// Group trash rows by discard reason, ordered by reason; ids keep row order
pub fn group_trash_by_reason(trash: Vec<TrashRecord>) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for record in trash {
        groups.entry(record.discard_reason).or_default().push(record.snap_id);
    }
    groups
}
