//! SQLite-backed maintenance task repository.
//!
//! Implements the core `TaskRepository` port. All database operations run in
//! `spawn_blocking` to avoid blocking the async runtime.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, SecondsFormat, Utc};
use gardenwise_core::TaskRepository;
use gardenwise_domain::{
    Amount, AmountUnit, EnvironmentalFactors, Frequency, GardenwiseError, MaintenanceTask,
    Result as DomainResult, TaskType,
};
use rusqlite::{params, OptionalExtension, Row};
use tokio::task;
use tracing::debug;
use uuid::Uuid;

use super::manager::{map_sql_error, DbManager, SqliteConnection};

const SELECT_COLUMNS: &str = "id, crop_id, task_type, frequency, amount_value, amount_unit, \
    preferred_time, ai_recommended, temperature_c, humidity_pct, light_level_lux, \
    next_scheduled_time, last_completed_time, completion_streak, completion_rate, active, \
    ai_notes, created_at, updated_at";

/// SQLite-backed task repository.
pub struct SqliteTaskRepository {
    db: Arc<DbManager>,
}

impl SqliteTaskRepository {
    /// Create a new repository with the given database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Active tasks for one crop, soonest due first.
    pub async fn list_active_for_crop(&self, crop_id: &str) -> DomainResult<Vec<MaintenanceTask>> {
        let db = Arc::clone(&self.db);
        let crop_id = crop_id.to_string();

        task::spawn_blocking(move || -> DomainResult<Vec<MaintenanceTask>> {
            let conn = db.get_connection()?;
            query_active_for_crop(&conn, &crop_id)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn get(&self, id: Uuid) -> DomainResult<Option<MaintenanceTask>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Option<MaintenanceTask>> {
            let conn = db.get_connection()?;
            query_task(&conn, id)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn create(&self, maintenance_task: &MaintenanceTask) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let record = TaskRecord::from_task(maintenance_task)?;

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            insert_task(&conn, &record)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn save(&self, maintenance_task: &MaintenanceTask) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let record = TaskRecord::from_task(maintenance_task)?;

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            update_task(&conn, &record)
        })
        .await
        .map_err(map_join_error)?
    }
}

// ============================================================================
// Row mapping
// ============================================================================

/// Owned column values for one `maintenance_tasks` row.
struct TaskRecord {
    id: String,
    crop_id: String,
    task_type: &'static str,
    frequency: String,
    amount_value: f64,
    amount_unit: &'static str,
    preferred_time: String,
    ai_recommended: bool,
    temperature_c: Option<f64>,
    humidity_pct: Option<f64>,
    light_level_lux: Option<f64>,
    next_scheduled_time: String,
    last_completed_time: Option<String>,
    completion_streak: u32,
    completion_rate: f64,
    active: bool,
    ai_notes: String,
    created_at: String,
    updated_at: String,
}

impl TaskRecord {
    fn from_task(task: &MaintenanceTask) -> DomainResult<Self> {
        let factors = task.environmental_factors.unwrap_or_default();
        let ai_notes = serde_json::to_string(&task.ai_notes)
            .map_err(|e| GardenwiseError::Internal(format!("failed to encode ai notes: {e}")))?;

        Ok(Self {
            id: task.id.to_string(),
            crop_id: task.crop_id.clone(),
            task_type: task.task_type.as_str(),
            frequency: task.frequency.to_string(),
            amount_value: task.amount.value,
            amount_unit: task.amount.unit.as_str(),
            preferred_time: task.preferred_time.format("%H:%M:%S").to_string(),
            ai_recommended: task.ai_recommended,
            temperature_c: factors.temperature_c,
            humidity_pct: factors.humidity_pct,
            light_level_lux: factors.light_level_lux,
            next_scheduled_time: encode_time(task.next_scheduled_time),
            last_completed_time: task.last_completed_time.map(encode_time),
            completion_streak: task.completion_streak,
            completion_rate: task.completion_rate,
            active: task.active,
            ai_notes,
            created_at: encode_time(task.created_at),
            updated_at: encode_time(task.updated_at),
        })
    }
}

fn encode_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn decode_time(column: &str, value: &str) -> DomainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|e| GardenwiseError::Database(format!("invalid {column} '{value}': {e}")))
}

/// Raw column values read before domain parsing.
struct RawRow {
    id: String,
    crop_id: String,
    task_type: String,
    frequency: String,
    amount_value: f64,
    amount_unit: String,
    preferred_time: String,
    ai_recommended: bool,
    temperature_c: Option<f64>,
    humidity_pct: Option<f64>,
    light_level_lux: Option<f64>,
    next_scheduled_time: String,
    last_completed_time: Option<String>,
    completion_streak: u32,
    completion_rate: f64,
    active: bool,
    ai_notes: String,
    created_at: String,
    updated_at: String,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        id: row.get(0)?,
        crop_id: row.get(1)?,
        task_type: row.get(2)?,
        frequency: row.get(3)?,
        amount_value: row.get(4)?,
        amount_unit: row.get(5)?,
        preferred_time: row.get(6)?,
        ai_recommended: row.get(7)?,
        temperature_c: row.get(8)?,
        humidity_pct: row.get(9)?,
        light_level_lux: row.get(10)?,
        next_scheduled_time: row.get(11)?,
        last_completed_time: row.get(12)?,
        completion_streak: row.get(13)?,
        completion_rate: row.get(14)?,
        active: row.get(15)?,
        ai_notes: row.get(16)?,
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
    })
}

impl TryFrom<RawRow> for MaintenanceTask {
    type Error = GardenwiseError;

    fn try_from(raw: RawRow) -> DomainResult<Self> {
        let id = Uuid::parse_str(&raw.id)
            .map_err(|e| GardenwiseError::Database(format!("invalid task id '{}': {e}", raw.id)))?;
        let preferred_time =
            NaiveTime::parse_from_str(&raw.preferred_time, "%H:%M:%S").map_err(|e| {
                GardenwiseError::Database(format!(
                    "invalid preferred_time '{}': {e}",
                    raw.preferred_time
                ))
            })?;
        let has_factors = raw.temperature_c.is_some()
            || raw.humidity_pct.is_some()
            || raw.light_level_lux.is_some();
        let ai_notes: Vec<String> = serde_json::from_str(&raw.ai_notes)
            .map_err(|e| GardenwiseError::Database(format!("invalid ai_notes: {e}")))?;

        Ok(MaintenanceTask {
            id,
            crop_id: raw.crop_id,
            task_type: TaskType::from_str(&raw.task_type).map_err(stored_value)?,
            frequency: Frequency::from_str(&raw.frequency).map_err(stored_value)?,
            amount: Amount {
                value: raw.amount_value,
                unit: AmountUnit::from_str(&raw.amount_unit).map_err(stored_value)?,
            },
            preferred_time,
            ai_recommended: raw.ai_recommended,
            environmental_factors: has_factors.then_some(EnvironmentalFactors {
                temperature_c: raw.temperature_c,
                humidity_pct: raw.humidity_pct,
                light_level_lux: raw.light_level_lux,
            }),
            next_scheduled_time: decode_time("next_scheduled_time", &raw.next_scheduled_time)?,
            last_completed_time: raw
                .last_completed_time
                .as_deref()
                .map(|value| decode_time("last_completed_time", value))
                .transpose()?,
            completion_streak: raw.completion_streak,
            completion_rate: raw.completion_rate,
            active: raw.active,
            ai_notes,
            created_at: decode_time("created_at", &raw.created_at)?,
            updated_at: decode_time("updated_at", &raw.updated_at)?,
        })
    }
}

/// A stored enum value that no longer parses is a storage problem, not a
/// caller mistake.
fn stored_value(err: GardenwiseError) -> GardenwiseError {
    GardenwiseError::Database(format!("corrupt stored value: {err}"))
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

fn query_task(conn: &SqliteConnection, id: Uuid) -> DomainResult<Option<MaintenanceTask>> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM maintenance_tasks WHERE id = ?1");
    let raw = conn
        .query_row(&sql, params![id.to_string()], read_row)
        .optional()
        .map_err(map_sql_error)?;
    raw.map(MaintenanceTask::try_from).transpose()
}

fn query_active_for_crop(
    conn: &SqliteConnection,
    crop_id: &str,
) -> DomainResult<Vec<MaintenanceTask>> {
    let sql = format!(
        "SELECT {SELECT_COLUMNS} FROM maintenance_tasks \
         WHERE crop_id = ?1 AND active = 1 ORDER BY next_scheduled_time"
    );
    let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
    let rows = stmt
        .query_map(params![crop_id], read_row)
        .map_err(map_sql_error)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(map_sql_error)?;
    rows.into_iter().map(MaintenanceTask::try_from).collect()
}

fn insert_task(conn: &SqliteConnection, record: &TaskRecord) -> DomainResult<()> {
    conn.execute(
        "INSERT INTO maintenance_tasks (
            id, crop_id, task_type, frequency, amount_value, amount_unit, preferred_time,
            ai_recommended, temperature_c, humidity_pct, light_level_lux, next_scheduled_time,
            last_completed_time, completion_streak, completion_rate, active, ai_notes,
            created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                   ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
        params![
            record.id,
            record.crop_id,
            record.task_type,
            record.frequency,
            record.amount_value,
            record.amount_unit,
            record.preferred_time,
            record.ai_recommended,
            record.temperature_c,
            record.humidity_pct,
            record.light_level_lux,
            record.next_scheduled_time,
            record.last_completed_time,
            record.completion_streak,
            record.completion_rate,
            record.active,
            record.ai_notes,
            record.created_at,
            record.updated_at,
        ],
    )
    .map_err(map_sql_error)?;
    debug!(task_id = %record.id, "Maintenance task inserted");
    Ok(())
}

fn update_task(conn: &SqliteConnection, record: &TaskRecord) -> DomainResult<()> {
    let updated = conn
        .execute(
            "UPDATE maintenance_tasks SET
                crop_id = ?2, task_type = ?3, frequency = ?4, amount_value = ?5,
                amount_unit = ?6, preferred_time = ?7, ai_recommended = ?8,
                temperature_c = ?9, humidity_pct = ?10, light_level_lux = ?11,
                next_scheduled_time = ?12, last_completed_time = ?13,
                completion_streak = ?14, completion_rate = ?15, active = ?16,
                ai_notes = ?17, updated_at = ?18
             WHERE id = ?1",
            params![
                record.id,
                record.crop_id,
                record.task_type,
                record.frequency,
                record.amount_value,
                record.amount_unit,
                record.preferred_time,
                record.ai_recommended,
                record.temperature_c,
                record.humidity_pct,
                record.light_level_lux,
                record.next_scheduled_time,
                record.last_completed_time,
                record.completion_streak,
                record.completion_rate,
                record.active,
                record.ai_notes,
                record.updated_at,
            ],
        )
        .map_err(map_sql_error)?;

    if updated == 0 {
        return Err(GardenwiseError::ScheduleNotFound(record.id.clone()));
    }
    Ok(())
}

fn map_join_error(err: task::JoinError) -> GardenwiseError {
    if err.is_cancelled() {
        GardenwiseError::Internal("blocking task cancelled".into())
    } else {
        GardenwiseError::Internal(format!("blocking task failed: {err}"))
    }
}
