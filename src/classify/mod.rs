// Classification policy
//
// Deterministic keyword tables that back the model's heuristic
// classification: used to fill in department, category, and priority
// when the model omits them, and to keep severity decisions biased
// toward the safer (higher) bucket. This is policy data, not a fixed
// algorithm; deployments re-tune the tables, not the code.

use crate::store::Priority;

/// Departments the platform routes complaints to
pub const DEPARTMENTS: &[&str] = &[
    "Water (DJB)",
    "Police",
    "Pollution (DPCC)",
    "Roads (PWD)",
    "Electricity",
    "Health",
    "Education",
    "Transport",
    "General/PGC",
];

/// Complaint categories exposed in the register tool schema
pub const CATEGORIES: &[&str] = &[
    "Water Supply",
    "Sewage/Drainage",
    "Road Maintenance",
    "Street Lights",
    "Garbage Collection",
    "Traffic",
    "Law & Order",
    "Pollution",
    "Power Cut",
    "Health Services",
    "Education",
    "Corruption/Harassment",
    "Billing Issues",
    "Illegal Construction",
    "Encroachment",
    "Public Transport",
    "Other",
];

pub const DEFAULT_DEPARTMENT: &str = "General/PGC";
pub const DEFAULT_CATEGORY: &str = "Other";

/// (keywords, category, department) rows, first match wins
const TOPIC_RULES: &[(&[&str], &str, &str)] = &[
    (
        &["sewage", "sewer", "drain", "drainage", "overflow"],
        "Sewage/Drainage",
        "Water (DJB)",
    ),
    (
        &["water", "paani", "tanker", "pipeline", "tap"],
        "Water Supply",
        "Water (DJB)",
    ),
    (
        &["crime", "theft", "robbery", "harassment", "assault", "violence", "eve teasing"],
        "Law & Order",
        "Police",
    ),
    (
        &["pothole", "road", "footpath", "bridge", "flyover"],
        "Road Maintenance",
        "Roads (PWD)",
    ),
    (
        &["street light", "streetlight", "lamp post"],
        "Street Lights",
        "Roads (PWD)",
    ),
    (
        &["power cut", "electricity", "bijli", "outage", "transformer", "voltage"],
        "Power Cut",
        "Electricity",
    ),
    (
        &["garbage", "trash", "waste", "dump"],
        "Garbage Collection",
        "Pollution (DPCC)",
    ),
    (
        &["pollution", "smog", "air quality", "noise"],
        "Pollution",
        "Pollution (DPCC)",
    ),
    (
        &["traffic", "signal", "jam", "parking"],
        "Traffic",
        "Police",
    ),
    (
        &["hospital", "clinic", "dengue", "mosquito", "ambulance"],
        "Health Services",
        "Health",
    ),
    (
        &["school", "teacher", "admission"],
        "Education",
        "Education",
    ),
    (
        &["bus", "metro", "auto rickshaw"],
        "Public Transport",
        "Transport",
    ),
    (
        &["bribe", "corruption"],
        "Corruption/Harassment",
        "General/PGC",
    ),
    (
        &["illegal construction", "encroachment"],
        "Illegal Construction",
        "General/PGC",
    ),
    (
        &["bill", "billing", "meter"],
        "Billing Issues",
        "Electricity",
    ),
];

/// Severity cues, checked from most to least severe; ambiguous phrasing
/// lands in the higher bucket.
const CRITICAL_CUES: &[&str] = &[
    "life threatening",
    "life-threatening",
    "dying",
    "death",
    "fire",
    "electrocut",
    "collapse",
    "ongoing crime",
    "attack",
    "emergency",
];

const HIGH_CUES: &[&str] = &[
    "no water",
    "no electricity",
    "no power",
    "since yesterday",
    "24 hours",
    "two days",
    "3 days",
    "4 days",
    "5 days",
    "week",
    "houses affected",
    "whole colony",
    "entire area",
    "sewage overflow",
    "unsafe",
    "dangerous",
    "accident",
];

const MEDIUM_CUES: &[&str] = &[
    "dirty",
    "smell",
    "broken",
    "damaged",
    "delay",
    "slow",
    "irregular",
    "poor quality",
    "leak",
];

/// Classified (category, department) for a free-text issue description
pub fn classify_topic(issue: &str) -> (&'static str, &'static str) {
    let text = issue.to_lowercase();
    for (keywords, category, department) in TOPIC_RULES {
        if keywords.iter().any(|k| text.contains(k)) {
            return (category, department);
        }
    }
    (DEFAULT_CATEGORY, DEFAULT_DEPARTMENT)
}

/// Priority from severity cues, biased upward on ties
pub fn classify_priority(issue: &str) -> Priority {
    let text = issue.to_lowercase();
    if CRITICAL_CUES.iter().any(|k| text.contains(k)) {
        Priority::Critical
    } else if HIGH_CUES.iter().any(|k| text.contains(k)) {
        Priority::High
    } else if MEDIUM_CUES.iter().any(|k| text.contains(k)) {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// Validate a model-supplied department, falling back to classification
pub fn department_or_classify(supplied: &str, issue: &str) -> String {
    let trimmed = supplied.trim();
    if DEPARTMENTS.contains(&trimmed) {
        return trimmed.to_string();
    }
    classify_topic(issue).1.to_string()
}

/// Validate a model-supplied category, falling back to classification
pub fn category_or_classify(supplied: &str, issue: &str) -> String {
    let trimmed = supplied.trim();
    if CATEGORIES.contains(&trimmed) {
        return trimmed.to_string();
    }
    classify_topic(issue).0.to_string()
}

/// Validate a model-supplied priority. When the model and the keyword
/// policy disagree, the more severe of the two wins.
pub fn priority_or_classify(supplied: &str, issue: &str) -> Priority {
    let derived = classify_priority(issue);
    match Priority::parse(supplied.trim()) {
        Some(p) => p.max(derived),
        None => derived,
    }
}
