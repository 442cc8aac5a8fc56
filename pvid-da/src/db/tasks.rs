//! Metadata store queries (work tasks, device configuration)

use super::query::fetch_in_chunks;
use super::TaskRepository;
use async_trait::async_trait;
use chrono::NaiveDate;
use pvid_common::db::with_deadline;
use pvid_common::time::format_date;
use pvid_common::{Error, Result};
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;

const WORK_TASK_QUERY: &str = "SELECT work_task_id FROM pvid_person.person_archive_work_task \
     WHERE date(to_timestamp(create_time / 1000)) = $1 ORDER BY create_time";

const PERSON_ARCHIVE_DEVICE_QUERY: &str = "SELECT device_id FROM pvid_system.device_info \
     WHERE archive_type = 2 AND device_id IN";

/// Task repository over the relational metadata store
#[derive(Clone)]
pub struct SqlTaskRepository {
    pool: PgPool,
    deadline: Duration,
}

impl SqlTaskRepository {
    pub fn new(pool: PgPool, deadline: Duration) -> Self {
        Self { pool, deadline }
    }
}

#[async_trait]
impl TaskRepository for SqlTaskRepository {
    async fn query_work_tasks(&self, date: NaiveDate) -> Result<Vec<String>> {
        info!("Query person archive work tasks for {}", format_date(date));
        let tasks = with_deadline("query work tasks", self.deadline, async {
            let rows: Vec<(String,)> = sqlx::query_as(WORK_TASK_QUERY)
                .bind(date)
                .fetch_all(&self.pool)
                .await?;
            Ok::<_, Error>(rows.into_iter().map(|(id,)| id).collect::<Vec<_>>())
        })
        .await?;
        info!("Work tasks to consult: {:?}", tasks);
        Ok(tasks)
    }

    async fn query_person_archive_devices(&self, device_ids: &[String]) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = with_deadline(
            "query person archive devices",
            self.deadline,
            fetch_in_chunks(&self.pool, PERSON_ARCHIVE_DEVICE_QUERY, device_ids),
        )
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
