// Read-side aggregation for the operator dashboard
//
// Everything here is derived from the base tables; there is no
// materialized state to keep consistent.

use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use std::collections::HashMap;

use super::records::{AreaHotspot, Grievance, HotspotLevel};
use super::{parse_ts_opt, GrievanceStore, StoreError, StoreResult};

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_open_complaints: i64,
    pub total_resolved_complaints: i64,
    pub by_priority: HashMap<String, i64>,
    pub top_departments: Vec<(String, i64)>,
    pub active_hotspots: i64,
    pub avg_resolution_hours: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AreaDetails {
    pub area: AreaHotspot,
    pub recent_complaints: Vec<Grievance>,
}

const HOTSPOT_COLS: &str = "area_name, normalized_name, total_complaints, open_complaints, \
     resolved_complaints, critical_complaints, high_complaints, medium_complaints, \
     low_complaints, is_hotspot, hotspot_level, flagged_at, first_complaint_at, \
     last_complaint_at, alert_sent";

impl GrievanceStore {
    pub async fn dashboard_stats(&self) -> StoreResult<DashboardStats> {
        let conn = self.db.lock().await;

        let total_open: i64 = conn.query_row(
            "SELECT COUNT(*) FROM grievances WHERE status NOT IN ('RESOLVED', 'CLOSED')",
            [],
            |row| row.get(0),
        )?;

        let total_resolved: i64 = conn.query_row(
            "SELECT COUNT(*) FROM grievances WHERE status IN ('RESOLVED', 'CLOSED')",
            [],
            |row| row.get(0),
        )?;

        let mut by_priority = HashMap::new();
        let mut stmt = conn.prepare(
            "SELECT priority, COUNT(*) FROM grievances
             WHERE status NOT IN ('RESOLVED', 'CLOSED') GROUP BY priority",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows {
            let (priority, count) = row?;
            by_priority.insert(priority, count);
        }

        let mut stmt = conn.prepare(
            "SELECT department, COUNT(*) FROM grievances
             GROUP BY department ORDER BY COUNT(*) DESC LIMIT 5",
        )?;
        let top_departments = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let active_hotspots: i64 = conn.query_row(
            "SELECT COUNT(*) FROM area_hotspots WHERE is_hotspot = 1",
            [],
            |row| row.get(0),
        )?;

        let avg_resolution_hours: f64 = conn
            .query_row(
                "SELECT AVG(resolution_time_hours) FROM grievances
                 WHERE resolution_time_hours IS NOT NULL",
                [],
                |row| row.get::<_, Option<f64>>(0),
            )?
            .unwrap_or(0.0);

        Ok(DashboardStats {
            total_open_complaints: total_open,
            total_resolved_complaints: total_resolved,
            by_priority,
            top_departments,
            active_hotspots,
            avg_resolution_hours,
        })
    }

    /// Areas ordered by open-complaint count, optionally only flagged ones
    pub async fn hotspots(
        &self,
        flagged_only: bool,
        min_complaints: i64,
    ) -> StoreResult<Vec<AreaHotspot>> {
        let conn = self.db.lock().await;

        let mut sql = format!(
            "SELECT {HOTSPOT_COLS} FROM area_hotspots WHERE total_complaints >= ?1"
        );
        if flagged_only {
            sql.push_str(" AND is_hotspot = 1");
        }
        sql.push_str(" ORDER BY open_complaints DESC, total_complaints DESC");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![min_complaints], map_hotspot)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// One area's stats plus its 20 most recent complaints
    pub async fn area_details(&self, area: &str) -> StoreResult<AreaDetails> {
        let normalized = super::normalize_area(area);
        let conn = self.db.lock().await;

        let hotspot = conn
            .query_row(
                &format!("SELECT {HOTSPOT_COLS} FROM area_hotspots WHERE normalized_name = ?1"),
                params![normalized],
                map_hotspot,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(area.to_string()))?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM grievances WHERE area = ?1 ORDER BY created_at DESC LIMIT 20",
            super::GRIEVANCE_COLS
        ))?;
        let recent = stmt
            .query_map(params![normalized], GrievanceStore::map_grievance)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AreaDetails {
            area: hotspot,
            recent_complaints: recent,
        })
    }
}

fn map_hotspot(row: &rusqlite::Row<'_>) -> Result<AreaHotspot, rusqlite::Error> {
    let level: Option<String> = row.get(10)?;
    Ok(AreaHotspot {
        area_name: row.get(0)?,
        normalized_name: row.get(1)?,
        total_complaints: row.get(2)?,
        open_complaints: row.get(3)?,
        resolved_complaints: row.get(4)?,
        critical_complaints: row.get(5)?,
        high_complaints: row.get(6)?,
        medium_complaints: row.get(7)?,
        low_complaints: row.get(8)?,
        is_hotspot: row.get::<_, i64>(9)? != 0,
        hotspot_level: level.as_deref().and_then(HotspotLevel::parse),
        flagged_at: parse_ts_opt(row.get::<_, Option<String>>(11)?),
        first_complaint_at: parse_ts_opt(row.get::<_, Option<String>>(12)?),
        last_complaint_at: parse_ts_opt(row.get::<_, Option<String>>(13)?),
        alert_sent: row.get::<_, i64>(14)? != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{GrievanceFilter, HotspotThresholds, NewGrievance, Priority};
    use tempfile::TempDir;

    fn complaint(location: &str, department: &str, priority: Priority) -> NewGrievance {
        NewGrievance {
            citizen_name: None,
            contact: Some("9876543210".to_string()),
            description: "test complaint".to_string(),
            location: Some(location.to_string()),
            department: department.to_string(),
            category: "Other".to_string(),
            priority,
            call_id: None,
        }
    }

    #[tokio::test]
    async fn test_dashboard_stats_counts() {
        let dir = TempDir::new().unwrap();
        let store = GrievanceStore::open(
            &dir.path().join("stats.db"),
            HotspotThresholds::default(),
        )
        .unwrap();

        for _ in 0..3 {
            store
                .create_grievance(complaint("Rohini", "Water (DJB)", Priority::High))
                .await
                .unwrap();
        }
        let g = store
            .create_grievance(complaint("Saket", "Roads (PWD)", Priority::Low))
            .await
            .unwrap();
        store.resolve(&g.ticket_id, "Officer", "done", None).await.unwrap();

        let stats = store.dashboard_stats().await.unwrap();
        assert_eq!(stats.total_open_complaints, 3);
        assert_eq!(stats.total_resolved_complaints, 1);
        assert_eq!(stats.by_priority.get("High"), Some(&3));
        assert!(stats.avg_resolution_hours >= 0.0);
        assert_eq!(stats.top_departments[0].0, "Water (DJB)");
    }

    #[tokio::test]
    async fn test_hotspot_flagging_at_threshold() {
        let dir = TempDir::new().unwrap();
        let thresholds = HotspotThresholds {
            low: 2,
            medium: 3,
            high: 4,
            critical: 5,
        };
        let store = GrievanceStore::open(&dir.path().join("hot.db"), thresholds).unwrap();

        store
            .create_grievance(complaint("Narela", "Water (DJB)", Priority::High))
            .await
            .unwrap();
        let spots = store.hotspots(true, 0).await.unwrap();
        assert!(spots.is_empty(), "one open complaint must not flag at low=2");

        store
            .create_grievance(complaint("narela", "Water (DJB)", Priority::Critical))
            .await
            .unwrap();
        let spots = store.hotspots(true, 0).await.unwrap();
        assert_eq!(spots.len(), 1);
        assert_eq!(spots[0].hotspot_level, Some(crate::store::HotspotLevel::Low));
        assert_eq!(spots[0].open_complaints, 2);
        assert_eq!(spots[0].critical_complaints, 1);

        for _ in 0..3 {
            store
                .create_grievance(complaint("Narela", "Water (DJB)", Priority::Medium))
                .await
                .unwrap();
        }
        let spots = store.hotspots(true, 0).await.unwrap();
        assert_eq!(spots[0].open_complaints, 5);
        assert_eq!(spots[0].hotspot_level, Some(crate::store::HotspotLevel::Critical));
    }

    #[tokio::test]
    async fn test_hotspot_cleared_when_resolved_below_threshold() {
        let dir = TempDir::new().unwrap();
        let thresholds = HotspotThresholds {
            low: 2,
            medium: 10,
            high: 20,
            critical: 30,
        };
        let store = GrievanceStore::open(&dir.path().join("clear.db"), thresholds).unwrap();

        let a = store
            .create_grievance(complaint("Mehrauli", "Water (DJB)", Priority::High))
            .await
            .unwrap();
        store
            .create_grievance(complaint("Mehrauli", "Water (DJB)", Priority::High))
            .await
            .unwrap();
        assert_eq!(store.hotspots(true, 0).await.unwrap().len(), 1);

        store.resolve(&a.ticket_id, "Officer", "fixed", None).await.unwrap();
        let spots = store.hotspots(true, 0).await.unwrap();
        assert!(spots.is_empty(), "resolving below threshold must clear the flag");

        let all = store.hotspots(false, 0).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].resolved_complaints, 1);
        assert_eq!(all[0].open_complaints, 1);
    }

    #[tokio::test]
    async fn test_area_details() {
        let dir = TempDir::new().unwrap();
        let store = GrievanceStore::open(
            &dir.path().join("area.db"),
            HotspotThresholds::default(),
        )
        .unwrap();

        store
            .create_grievance(complaint("Hauz Khas", "Water (DJB)", Priority::Medium))
            .await
            .unwrap();

        let details = store.area_details("hauz khas").await.unwrap();
        assert_eq!(details.area.total_complaints, 1);
        assert_eq!(details.recent_complaints.len(), 1);

        assert!(matches!(
            store.area_details("nowhere land").await,
            Err(StoreError::NotFound(_))
        ));

        // Listing by area filter uses the same normalization
        let listed = store
            .list(&GrievanceFilter {
                area: Some("Hauz-Khas".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
    }
}
