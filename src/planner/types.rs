//! Data model shared by the planner stages and the wire format.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// A life-context label a task belongs to (e.g. "Work", "Home").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role name, the aggregation key.
    #[serde(default)]
    pub name: String,
    /// Optional short display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
}

impl Role {
    /// Create a role without an emoji.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            emoji: None,
        }
    }

    /// Attach an emoji label.
    pub fn with_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = Some(emoji.into());
        self
    }
}

/// A completed task as sent by the client for monthly reporting.
///
/// Every field is optional on the wire; aggregation tolerates whatever
/// shape the client stored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Task {
    /// Free-text description (`task` on the wire).
    #[serde(default, rename = "task")]
    pub description: Option<String>,
    /// Duration in hours, as a number or numeric string.
    #[serde(default)]
    pub duration: Option<serde_json::Value>,
    /// Roles the task belongs to.
    #[serde(default)]
    pub roles: Option<Vec<Role>>,
    /// Single-role shape used by older clients.
    #[serde(default)]
    pub role: Option<Role>,
}

impl Task {
    /// Create a task with a description and numeric duration.
    pub fn new(description: impl Into<String>, duration_hours: f64) -> Self {
        Self {
            description: Some(description.into()),
            duration: Some(serde_json::json!(duration_hours)),
            ..Self::default()
        }
    }

    /// Set the role list.
    pub fn with_roles(mut self, roles: Vec<Role>) -> Self {
        self.roles = Some(roles);
        self
    }

    /// Roles to aggregate over: `roles` when present, else the legacy `role`.
    pub fn effective_roles(&self) -> &[Role] {
        match (&self.roles, &self.role) {
            (Some(roles), _) => roles,
            (None, Some(role)) => std::slice::from_ref(role),
            (None, None) => &[],
        }
    }

    /// Duration in hours; unusable values count as zero.
    pub fn duration_hours(&self) -> f64 {
        parse_duration(self.duration.as_ref())
    }

    /// Description text, empty when absent.
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }
}

/// Parse a wire duration into non-negative hours.
///
/// Numbers are taken as-is; strings use their leading numeric prefix
/// (`"2.5h"` is 2.5). Anything else, including negative or non-finite
/// values, is 0.
pub fn parse_duration(value: Option<&serde_json::Value>) -> f64 {
    let hours = match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => leading_number(s),
        _ => None,
    };
    match hours {
        Some(h) if h.is_finite() && h > 0.0 => h,
        _ => 0.0,
    }
}

/// Longest decimal prefix of `s` (after leading whitespace) as a float.
fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let mut digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return None;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

/// Aggregated count and hours for one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleStat {
    /// Number of (task, role) pairs carrying this role.
    pub count: u32,
    /// Sum of the durations of those tasks, in hours.
    #[serde(rename = "totalDuration")]
    pub total_duration: f64,
    /// Most recently seen emoji label for the role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
}

/// Role statistics keyed by role name.
pub type RoleStats = BTreeMap<String, RoleStat>;

/// A ranked keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    /// Lowercased token.
    pub word: String,
    /// Occurrences across all task descriptions.
    pub count: u32,
}

/// A candidate time for performing a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionSlot {
    /// Absolute start time, serialized as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
    #[serde(serialize_with = "serialize_iso_millis")]
    pub time: DateTime<Utc>,
    /// Short justification.
    pub reason: String,
    /// Fit score, 0–100.
    pub score: u8,
    /// Whether the slot suits the task's roles.
    pub role_match: bool,
}

/// Model-written narrative for a monthly report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportNarrative {
    /// How the user balanced their roles.
    pub summary: String,
    /// What the user focused on.
    pub insights: Vec<String>,
    /// One actionable suggestion for next month.
    pub recommendation: String,
}

/// Locally computed statistics merged with the model narrative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub role_stats: RoleStats,
    pub top_keywords: Vec<KeywordCount>,
    pub summary: String,
    pub insights: Vec<String>,
    pub recommendation: String,
    pub total_tasks: usize,
    pub total_hours: f64,
}

/// Format an instant as ISO-8601 UTC with millisecond precision.
pub fn iso_millis(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_iso_millis<S: Serializer>(
    time: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&iso_millis(time))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn parse_duration_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_duration(Some(&json!(2))), 2.0);
        assert_eq!(parse_duration(Some(&json!(1.5))), 1.5);
        assert_eq!(parse_duration(Some(&json!("3"))), 3.0);
        assert_eq!(parse_duration(Some(&json!("  2.5h"))), 2.5);
        assert_eq!(parse_duration(Some(&json!(".5"))), 0.5);
        assert_eq!(parse_duration(Some(&json!("1e1 hours"))), 10.0);
    }

    #[test]
    fn parse_duration_treats_garbage_as_zero() {
        assert_eq!(parse_duration(None), 0.0);
        assert_eq!(parse_duration(Some(&json!(null))), 0.0);
        assert_eq!(parse_duration(Some(&json!("abc"))), 0.0);
        assert_eq!(parse_duration(Some(&json!("."))), 0.0);
        assert_eq!(parse_duration(Some(&json!(true))), 0.0);
        assert_eq!(parse_duration(Some(&json!([1]))), 0.0);
        assert_eq!(parse_duration(Some(&json!(-4))), 0.0);
        assert_eq!(parse_duration(Some(&json!("1e999"))), 0.0);
    }

    #[test]
    fn effective_roles_prefers_role_list() {
        let task: Task = serde_json::from_value(json!({
            "task": "x",
            "roles": [{"name": "Work"}],
            "role": {"name": "Home"}
        }))
        .unwrap();
        assert_eq!(task.effective_roles(), &[Role::new("Work")]);
    }

    #[test]
    fn effective_roles_falls_back_to_single_role() {
        let task: Task =
            serde_json::from_value(json!({"task": "x", "role": {"name": "Home", "emoji": "🏠"}}))
                .unwrap();
        assert_eq!(task.effective_roles(), &[Role::new("Home").with_emoji("🏠")]);
    }

    #[test]
    fn unrecognized_fields_of_any_type_are_ignored() {
        let task: Task = serde_json::from_value(json!({
            "task": "Plan trip",
            "duration": 1,
            "priority": 2,
            "done": true,
            "roles": [{"name": "Work"}]
        }))
        .unwrap();
        assert_eq!(task.duration_hours(), 1.0);
        assert_eq!(task.effective_roles(), &[Role::new("Work")]);
    }

    #[test]
    fn effective_roles_empty_when_absent() {
        let task: Task = serde_json::from_value(json!({"task": "x"})).unwrap();
        assert!(task.effective_roles().is_empty());
        assert_eq!(task.description(), "x");
    }

    #[test]
    fn slot_serializes_with_millisecond_utc_format() {
        let slot = SuggestionSlot {
            time: Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap(),
            reason: "Morning".into(),
            score: 95,
            role_match: true,
        };
        let value = serde_json::to_value(&slot).unwrap();
        assert_eq!(value["time"], "2024-01-10T09:00:00.000Z");
        assert_eq!(value["roleMatch"], true);
        assert_eq!(value["score"], 95);
    }

    #[test]
    fn role_stat_wire_names() {
        let stat = RoleStat {
            count: 2,
            total_duration: 3.0,
            emoji: None,
        };
        let value = serde_json::to_value(&stat).unwrap();
        assert_eq!(value, json!({"count": 2, "totalDuration": 3.0}));
    }
}
