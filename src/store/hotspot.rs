// Area normalization and hotspot flagging rules

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::records::HotspotLevel;

/// Open-complaint thresholds at which an area is flagged, per level
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HotspotThresholds {
    pub low: i64,
    pub medium: i64,
    pub high: i64,
    pub critical: i64,
}

impl Default for HotspotThresholds {
    fn default() -> Self {
        Self {
            low: 5,
            medium: 10,
            high: 25,
            critical: 50,
        }
    }
}

impl HotspotThresholds {
    /// Level for an open-complaint count, or None below every threshold
    pub fn level_for(&self, open_complaints: i64) -> Option<HotspotLevel> {
        if open_complaints >= self.critical {
            Some(HotspotLevel::Critical)
        } else if open_complaints >= self.high {
            Some(HotspotLevel::High)
        } else if open_complaints >= self.medium {
            Some(HotspotLevel::Medium)
        } else if open_complaints >= self.low {
            Some(HotspotLevel::Low)
        } else {
            None
        }
    }
}

/// Normalize area names so spelling variants group together.
/// "Rohini Sector 7", "rohini sector-7", "Rohini Sec 7" all map to
/// "rohini sector 7".
pub fn normalize_area(area: &str) -> String {
    let trimmed = area.trim();
    if trimmed.is_empty() {
        return "unknown".to_string();
    }

    let mut normalized = trimmed.to_lowercase().replace('-', " ");
    // Strip everything but word characters and spaces
    let strip = Regex::new(r"[^\w\s]").unwrap();
    normalized = strip.replace_all(&normalized, "").to_string();
    let squeeze = Regex::new(r"\s+").unwrap();
    normalized = squeeze.replace_all(&normalized, " ").trim().to_string();

    // Expand common abbreviations
    for (abbr, full) in [
        (" sec ", " sector "),
        (" blk ", " block "),
        (" st ", " street "),
        (" rd ", " road "),
        (" mkt ", " market "),
    ] {
        normalized = format!(" {normalized} ").replace(abbr, full).trim().to_string();
    }

    if normalized.is_empty() {
        "unknown".to_string()
    } else {
        normalized
    }
}
