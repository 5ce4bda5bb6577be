// Grievance store
//
// Durable system of record for grievances and their audit trails.
// SQLite with WAL mode; one transaction per operation. The only
// cross-row invariant (unique ticket id) is the UNIQUE constraint.

mod hotspot;
mod records;
mod stats;
mod ticket;

pub use hotspot::{normalize_area, HotspotThresholds};
pub use records::{
    AreaHotspot, Emergency, Escalation, Feedback, Grievance, GrievanceFilter, HotspotLevel,
    NewGrievance, Priority, Status, StatusCheck,
};
pub use stats::{AreaDetails, DashboardStats};
pub use ticket::{is_ticket_id, mint_ticket_id};

use anyhow::Context;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("ticket {0} not found")]
    NotFound(String),

    #[error("ticket {0} is already resolved")]
    AlreadyResolved(String),

    #[error("invalid field: {0}")]
    Invalid(String),

    #[error(transparent)]
    Db(#[from] rusqlite::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

const DEFAULT_LIST_LIMIT: u32 = 50;
const MAX_LIST_LIMIT: u32 = 500;

const GRIEVANCE_COLS: &str = "ticket_id, citizen_name, contact, description, location, area, \
     department, category, priority, status, call_id, escalated, escalation_reason, \
     assigned_to, remarks, created_at, updated_at, resolved_at, resolved_by, \
     resolution_notes, citizen_rating, resolution_time_hours";

pub struct GrievanceStore {
    db: Arc<Mutex<Connection>>,
    thresholds: HotspotThresholds,
}

impl GrievanceStore {
    /// Open (or create) the store at `db_path`
    pub fn open(db_path: &Path, thresholds: HotspotThresholds) -> anyhow::Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let schema = include_str!("schema.sql");
        conn.execute_batch(schema)?;

        tracing::info!("Grievance store initialized: {}", db_path.display());

        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
            thresholds,
        })
    }

    pub fn thresholds(&self) -> HotspotThresholds {
        self.thresholds
    }

    /// Create a grievance: mint a ticket id, insert with status OPEN, and
    /// update the area hotspot row, all in one transaction.
    pub async fn create_grievance(&self, new: NewGrievance) -> StoreResult<Grievance> {
        if new.description.trim().is_empty() {
            return Err(StoreError::Invalid("description must not be empty".into()));
        }

        let mut conn = self.db.lock().await;
        let tx = conn.transaction()?;
        let now = Utc::now();

        let area = new
            .location
            .as_deref()
            .map(normalize_area)
            .filter(|a| a != "unknown");

        // UNIQUE collision on the minted id is practically unreachable,
        // but regenerate a few times rather than surface it.
        let mut ticket_id = mint_ticket_id();
        for _ in 0..3 {
            let exists: Option<i64> = tx
                .query_row(
                    "SELECT 1 FROM grievances WHERE ticket_id = ?1",
                    params![ticket_id],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_none() {
                break;
            }
            ticket_id = mint_ticket_id();
        }

        tx.execute(
            "INSERT INTO grievances
             (ticket_id, citizen_name, contact, description, location, area,
              department, category, priority, status, call_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                ticket_id,
                new.citizen_name,
                new.contact,
                new.description,
                new.location,
                area,
                new.department,
                new.category,
                new.priority.as_str(),
                Status::Open.as_str(),
                new.call_id,
                now.to_rfc3339(),
            ],
        )?;

        if let (Some(area), Some(raw)) = (area.as_deref(), new.location.as_deref()) {
            self.bump_area_on_create(&tx, raw, area, new.priority, now)?;
        }

        let grievance = Self::fetch_grievance(&tx, &ticket_id)?
            .ok_or_else(|| StoreError::NotFound(ticket_id.clone()))?;

        tx.commit()?;

        tracing::info!(ticket_id = %grievance.ticket_id, priority = %grievance.priority,
            department = %grievance.department, "Grievance registered");

        Ok(grievance)
    }

    pub async fn get(&self, ticket_id: &str) -> StoreResult<Grievance> {
        let conn = self.db.lock().await;
        Self::fetch_grievance(&conn, ticket_id)?
            .ok_or_else(|| StoreError::NotFound(ticket_id.to_string()))
    }

    /// List grievances newest-first, with optional filters and pagination
    pub async fn list(&self, filter: &GrievanceFilter) -> StoreResult<Vec<Grievance>> {
        let conn = self.db.lock().await;

        let mut sql = format!("SELECT {GRIEVANCE_COLS} FROM grievances");
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(dept) = &filter.department {
            clauses.push("department = ?");
            values.push(dept.clone());
        }
        if let Some(priority) = filter.priority {
            clauses.push("priority = ?");
            values.push(priority.as_str().to_string());
        }
        if let Some(status) = filter.status {
            clauses.push("status = ?");
            values.push(status.as_str().to_string());
        }
        if let Some(area) = &filter.area {
            clauses.push("area = ?");
            values.push(normalize_area(area));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        let limit = filter.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);
        let offset = filter.offset.unwrap_or(0);
        sql.push_str(&format!(
            " ORDER BY created_at DESC LIMIT {limit} OFFSET {offset}"
        ));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(values.iter()), Self::map_grievance)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Resolve a grievance. Re-resolution is an error, not a no-op; the
    /// first resolution's fields are never overwritten.
    pub async fn resolve(
        &self,
        ticket_id: &str,
        resolved_by: &str,
        resolution_notes: &str,
        citizen_rating: Option<i64>,
    ) -> StoreResult<Grievance> {
        if let Some(rating) = citizen_rating {
            if !(1..=5).contains(&rating) {
                return Err(StoreError::Invalid(format!("rating {rating} out of range 1-5")));
            }
        }

        let mut conn = self.db.lock().await;
        let tx = conn.transaction()?;

        let existing = Self::fetch_grievance(&tx, ticket_id)?
            .ok_or_else(|| StoreError::NotFound(ticket_id.to_string()))?;
        if existing.status.is_terminal() {
            return Err(StoreError::AlreadyResolved(ticket_id.to_string()));
        }

        let now = Utc::now();
        let hours = (now - existing.created_at).num_seconds() as f64 / 3600.0;

        tx.execute(
            "UPDATE grievances
             SET status = ?1, resolved_at = ?2, resolved_by = ?3, resolution_notes = ?4,
                 citizen_rating = ?5, resolution_time_hours = ?6, updated_at = ?2
             WHERE ticket_id = ?7",
            params![
                Status::Resolved.as_str(),
                now.to_rfc3339(),
                resolved_by,
                resolution_notes,
                citizen_rating,
                hours,
                ticket_id,
            ],
        )?;

        if let Some(area) = existing.area.as_deref() {
            tx.execute(
                "UPDATE area_hotspots
                 SET open_complaints = MAX(open_complaints - 1, 0),
                     resolved_complaints = resolved_complaints + 1,
                     last_updated = ?1
                 WHERE normalized_name = ?2",
                params![now.to_rfc3339(), area],
            )?;
            self.reevaluate_hotspot(&tx, area, now)?;
        }

        let grievance = Self::fetch_grievance(&tx, ticket_id)?
            .ok_or_else(|| StoreError::NotFound(ticket_id.to_string()))?;
        tx.commit()?;

        tracing::info!(ticket_id, resolved_by, hours, "Grievance resolved");

        Ok(grievance)
    }

    /// Append an escalation: audit row, counter bump, latest reason, and
    /// status ESCALATED. Terminal tickets are not reopened.
    pub async fn escalate(
        &self,
        ticket_id: &str,
        reason: &str,
        escalated_by: Option<&str>,
        call_id: Option<&str>,
    ) -> StoreResult<Grievance> {
        if reason.trim().is_empty() {
            return Err(StoreError::Invalid("escalation reason must not be empty".into()));
        }

        let mut conn = self.db.lock().await;
        let tx = conn.transaction()?;

        let existing = Self::fetch_grievance(&tx, ticket_id)?
            .ok_or_else(|| StoreError::NotFound(ticket_id.to_string()))?;
        if existing.status.is_terminal() {
            return Err(StoreError::AlreadyResolved(ticket_id.to_string()));
        }

        let now = Utc::now();

        tx.execute(
            "INSERT INTO escalations (ticket_id, reason, escalated_by, escalated_at, call_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![ticket_id, reason, escalated_by, now.to_rfc3339(), call_id],
        )?;

        tx.execute(
            "UPDATE grievances
             SET status = ?1, escalated = escalated + 1, escalation_reason = ?2, updated_at = ?3
             WHERE ticket_id = ?4",
            params![Status::Escalated.as_str(), reason, now.to_rfc3339(), ticket_id],
        )?;

        let grievance = Self::fetch_grievance(&tx, ticket_id)?
            .ok_or_else(|| StoreError::NotFound(ticket_id.to_string()))?;
        tx.commit()?;

        tracing::info!(ticket_id, escalations = grievance.escalated, "Grievance escalated");

        Ok(grievance)
    }

    /// Log a status check. Written whether or not the ticket exists.
    pub async fn record_status_check(
        &self,
        ticket_id: &str,
        phone_number: Option<&str>,
        call_id: Option<&str>,
    ) -> StoreResult<()> {
        let conn = self.db.lock().await;
        conn.execute(
            "INSERT INTO status_checks (ticket_id, phone_number, checked_at, call_id)
             VALUES (?1, ?2, ?3, ?4)",
            params![ticket_id, phone_number, Utc::now().to_rfc3339(), call_id],
        )?;
        Ok(())
    }

    pub async fn record_feedback(
        &self,
        ticket_id: Option<&str>,
        rating: i64,
        feedback_text: &str,
        phone_number: Option<&str>,
        call_id: Option<&str>,
    ) -> StoreResult<i64> {
        if !(1..=5).contains(&rating) {
            return Err(StoreError::Invalid(format!("rating {rating} out of range 1-5")));
        }
        if feedback_text.trim().is_empty() {
            return Err(StoreError::Invalid("feedback text must not be empty".into()));
        }

        let conn = self.db.lock().await;
        conn.execute(
            "INSERT INTO feedback (ticket_id, rating, feedback_text, phone_number, submitted_at, call_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![ticket_id, rating, feedback_text, phone_number, Utc::now().to_rfc3339(), call_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub async fn record_emergency(
        &self,
        emergency_type: &str,
        location: &str,
        phone_number: &str,
        description: &str,
        call_id: Option<&str>,
    ) -> StoreResult<i64> {
        let conn = self.db.lock().await;
        conn.execute(
            "INSERT INTO emergencies (emergency_type, location, phone_number, description, status, created_at, call_id)
             VALUES (?1, ?2, ?3, ?4, 'PENDING', ?5, ?6)",
            params![emergency_type, location, phone_number, description, Utc::now().to_rfc3339(), call_id],
        )?;
        let id = conn.last_insert_rowid();
        tracing::warn!(emergency_type, location, "Emergency recorded");
        Ok(id)
    }

    /// Operator-only status override. Automated flows never call this.
    pub async fn update_status(&self, ticket_id: &str, status: Status) -> StoreResult<Grievance> {
        let conn = self.db.lock().await;
        let now = Utc::now();
        let changed = conn.execute(
            "UPDATE grievances SET status = ?1, updated_at = ?2 WHERE ticket_id = ?3",
            params![status.as_str(), now.to_rfc3339(), ticket_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(ticket_id.to_string()));
        }
        Self::fetch_grievance(&conn, ticket_id)?
            .ok_or_else(|| StoreError::NotFound(ticket_id.to_string()))
    }

    /// Operator assignment and remarks
    pub async fn assign(
        &self,
        ticket_id: &str,
        assigned_to: &str,
        remarks: Option<&str>,
    ) -> StoreResult<Grievance> {
        let conn = self.db.lock().await;
        let changed = conn.execute(
            "UPDATE grievances SET assigned_to = ?1, remarks = COALESCE(?2, remarks), updated_at = ?3
             WHERE ticket_id = ?4",
            params![assigned_to, remarks, Utc::now().to_rfc3339(), ticket_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(ticket_id.to_string()));
        }
        Self::fetch_grievance(&conn, ticket_id)?
            .ok_or_else(|| StoreError::NotFound(ticket_id.to_string()))
    }

    pub async fn list_escalations(&self, ticket_id: &str) -> StoreResult<Vec<Escalation>> {
        let conn = self.db.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, ticket_id, reason, escalated_by, escalated_at, call_id
             FROM escalations WHERE ticket_id = ?1 ORDER BY escalated_at ASC",
        )?;
        let rows = stmt
            .query_map(params![ticket_id], |row| {
                Ok(Escalation {
                    id: row.get(0)?,
                    ticket_id: row.get(1)?,
                    reason: row.get(2)?,
                    escalated_by: row.get(3)?,
                    escalated_at: parse_ts_required(row.get::<_, String>(4)?),
                    call_id: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub async fn list_feedback(&self, limit: u32) -> StoreResult<Vec<Feedback>> {
        let conn = self.db.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, ticket_id, rating, feedback_text, phone_number, submitted_at, call_id
             FROM feedback ORDER BY submitted_at DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit.min(MAX_LIST_LIMIT)], |row| {
                Ok(Feedback {
                    id: row.get(0)?,
                    ticket_id: row.get(1)?,
                    rating: row.get(2)?,
                    feedback_text: row.get(3)?,
                    phone_number: row.get(4)?,
                    submitted_at: parse_ts_required(row.get::<_, String>(5)?),
                    call_id: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub async fn list_emergencies(&self, limit: u32) -> StoreResult<Vec<Emergency>> {
        let conn = self.db.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, emergency_type, location, phone_number, description, status,
                    created_at, responded_at, call_id
             FROM emergencies ORDER BY created_at DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit.min(MAX_LIST_LIMIT)], |row| {
                Ok(Emergency {
                    id: row.get(0)?,
                    emergency_type: row.get(1)?,
                    location: row.get(2)?,
                    phone_number: row.get(3)?,
                    description: row.get(4)?,
                    status: row.get(5)?,
                    created_at: parse_ts_required(row.get::<_, String>(6)?),
                    responded_at: parse_ts_opt(row.get::<_, Option<String>>(7)?),
                    call_id: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub async fn list_status_checks(&self, ticket_id: &str) -> StoreResult<Vec<StatusCheck>> {
        let conn = self.db.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, ticket_id, phone_number, checked_at, call_id
             FROM status_checks WHERE ticket_id = ?1 ORDER BY checked_at ASC",
        )?;
        let rows = stmt
            .query_map(params![ticket_id], |row| {
                Ok(StatusCheck {
                    id: row.get(0)?,
                    ticket_id: row.get(1)?,
                    phone_number: row.get(2)?,
                    checked_at: parse_ts_required(row.get::<_, String>(3)?),
                    call_id: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    fn bump_area_on_create(
        &self,
        tx: &Transaction<'_>,
        raw_area: &str,
        normalized: &str,
        priority: Priority,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let priority_col = match priority {
            Priority::Critical => "critical_complaints",
            Priority::High => "high_complaints",
            Priority::Medium => "medium_complaints",
            Priority::Low => "low_complaints",
        };

        let exists: Option<i64> = tx
            .query_row(
                "SELECT id FROM area_hotspots WHERE normalized_name = ?1",
                params![normalized],
                |row| row.get(0),
            )
            .optional()?;

        if exists.is_none() {
            tx.execute(
                &format!(
                    "INSERT INTO area_hotspots
                     (area_name, normalized_name, total_complaints, open_complaints,
                      {priority_col}, first_complaint_at, last_complaint_at, last_updated)
                     VALUES (?1, ?2, 1, 1, 1, ?3, ?3, ?3)"
                ),
                params![raw_area, normalized, now.to_rfc3339()],
            )?;
        } else {
            tx.execute(
                &format!(
                    "UPDATE area_hotspots
                     SET total_complaints = total_complaints + 1,
                         open_complaints = open_complaints + 1,
                         {priority_col} = {priority_col} + 1,
                         last_complaint_at = ?1,
                         last_updated = ?1
                     WHERE normalized_name = ?2"
                ),
                params![now.to_rfc3339(), normalized],
            )?;
        }

        self.reevaluate_hotspot(tx, normalized, now)
    }

    /// Re-derive the hotspot flag from the current open count. Newly
    /// flagged areas reset alert_sent; dropping below thresholds clears
    /// the flag.
    fn reevaluate_hotspot(
        &self,
        tx: &Transaction<'_>,
        normalized: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let row: Option<(i64, bool)> = tx
            .query_row(
                "SELECT open_complaints, is_hotspot FROM area_hotspots WHERE normalized_name = ?1",
                params![normalized],
                |row| Ok((row.get(0)?, row.get::<_, i64>(1)? != 0)),
            )
            .optional()?;

        let Some((open, currently_flagged)) = row else {
            return Ok(());
        };

        match (self.thresholds.level_for(open), currently_flagged) {
            (Some(level), false) => {
                tx.execute(
                    "UPDATE area_hotspots
                     SET is_hotspot = 1, hotspot_level = ?1, flagged_at = ?2,
                         alert_sent = 0, last_updated = ?2
                     WHERE normalized_name = ?3",
                    params![level.as_str(), now.to_rfc3339(), normalized],
                )?;
                tracing::warn!(area = normalized, level = level.as_str(), open, "Area flagged as hotspot");
            }
            (Some(level), true) => {
                tx.execute(
                    "UPDATE area_hotspots SET hotspot_level = ?1, last_updated = ?2
                     WHERE normalized_name = ?3",
                    params![level.as_str(), now.to_rfc3339(), normalized],
                )?;
            }
            (None, true) => {
                tx.execute(
                    "UPDATE area_hotspots
                     SET is_hotspot = 0, hotspot_level = NULL, last_updated = ?1
                     WHERE normalized_name = ?2",
                    params![now.to_rfc3339(), normalized],
                )?;
                tracing::info!(area = normalized, "Hotspot cleared");
            }
            (None, false) => {}
        }

        Ok(())
    }

    fn fetch_grievance(
        conn: &Connection,
        ticket_id: &str,
    ) -> Result<Option<Grievance>, rusqlite::Error> {
        conn.query_row(
            &format!("SELECT {GRIEVANCE_COLS} FROM grievances WHERE ticket_id = ?1"),
            params![ticket_id],
            Self::map_grievance,
        )
        .optional()
    }

    fn map_grievance(row: &rusqlite::Row<'_>) -> Result<Grievance, rusqlite::Error> {
        let priority: String = row.get(8)?;
        let status: String = row.get(9)?;
        Ok(Grievance {
            ticket_id: row.get(0)?,
            citizen_name: row.get(1)?,
            contact: row.get(2)?,
            description: row.get(3)?,
            location: row.get(4)?,
            area: row.get(5)?,
            department: row.get(6)?,
            category: row.get(7)?,
            priority: Priority::parse(&priority).unwrap_or(Priority::Medium),
            status: Status::parse(&status).unwrap_or(Status::Open),
            call_id: row.get(10)?,
            escalated: row.get(11)?,
            escalation_reason: row.get(12)?,
            assigned_to: row.get(13)?,
            remarks: row.get(14)?,
            created_at: parse_ts_required(row.get::<_, String>(15)?),
            updated_at: parse_ts_opt(row.get::<_, Option<String>>(16)?),
            resolved_at: parse_ts_opt(row.get::<_, Option<String>>(17)?),
            resolved_by: row.get(18)?,
            resolution_notes: row.get(19)?,
            citizen_rating: row.get(20)?,
            resolution_time_hours: row.get(21)?,
        })
    }

}

fn parse_ts_required(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_ts_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
