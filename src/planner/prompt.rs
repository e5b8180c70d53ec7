//! Prompt templates for the two model calls.

use chrono::{DateTime, Utc};

use super::types::{KeywordCount, Role, RoleStats, iso_millis};

/// Inputs for the task-analysis prompt.
#[derive(Debug, Clone)]
pub struct AnalysisPrompt<'a> {
    pub task: &'a str,
    pub duration_hours: f64,
    pub priority: &'a str,
    pub roles: &'a [Role],
    pub now: DateTime<Utc>,
    pub timezone: &'a str,
}

impl AnalysisPrompt<'_> {
    /// Render the prompt asking for three JSON slots.
    pub fn render(&self) -> String {
        let role_names = self
            .roles
            .iter()
            .map(|r| r.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            r#"You are a smart scheduling assistant for "Spark", an app that helps people schedule tasks based on their different life roles.

Task Details:
- Task: {task}
- Duration: {duration} hours
- Priority: {priority}
- Roles: {role_names}
- Current time: {now}
- Timezone: {timezone}

Please analyze this task and suggest 3 optimal time slots for completing it. Consider:
1. The nature of the task and which roles it relates to
2. Typical productivity patterns (morning energy, afternoon slumps, etc.)
3. The priority level
4. The duration needed

For each time slot, provide:
- Exact date and time (in ISO format)
- A brief reason why this time is good (max 15 words)
- A match score (0-100) based on how well it fits the task and roles

Return your response as a JSON array with this structure:
[
  {{
    "time": "2024-01-10T09:00:00Z",
    "reason": "Morning energy peak, ideal for focused work",
    "score": 95,
    "roleMatch": true
  }},
  ...
]

Important: Provide only the JSON array, no additional text."#,
            task = self.task,
            duration = self.duration_hours,
            priority = self.priority,
            now = iso_millis(&self.now),
            timezone = self.timezone,
        )
    }
}

/// Inputs for the monthly-report prompt.
#[derive(Debug, Clone)]
pub struct ReportPrompt<'a> {
    pub role_stats: &'a RoleStats,
    pub top_keywords: &'a [KeywordCount],
    pub total_tasks: usize,
    pub month: &'a str,
    pub year: &'a str,
}

impl ReportPrompt<'_> {
    /// Render the prompt asking for the summary/insights/recommendation object.
    pub fn render(&self) -> String {
        let role_stats = serde_json::to_string_pretty(self.role_stats).unwrap_or_default();
        let top_keywords = serde_json::to_string_pretty(self.top_keywords).unwrap_or_default();

        format!(
            r#"Analyze this monthly task data and provide insights:

Role Statistics:
{role_stats}

Top Keywords:
{top_keywords}

Total Tasks: {total_tasks}
Month: {month}/{year}

Please provide:
1. A brief summary of how the user balanced their different roles (2-3 sentences)
2. Insights about what they focused on most
3. One actionable recommendation for the next month

Format as JSON:
{{
  "summary": "...",
  "insights": ["...", "..."],
  "recommendation": "..."
}}"#,
            total_tasks = self.total_tasks,
            month = self.month,
            year = self.year,
        )
    }
}
