//! Orchestration for the task-analysis and monthly-report requests.
//!
//! [`RelayService`] owns no per-request state. Each call validates its
//! input, runs the local planner stages, makes exactly one model call, and
//! interprets the reply.
//!
//! The two requests treat model failures differently. Analysis always
//! yields suggestions (falling back locally); a report fails as a whole,
//! discarding the statistics it already computed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::config::SparkConfig;
use crate::error::{Result, SparkError};
use crate::llm::{CompletionProvider, LlmError};
use crate::planner::prompt::{AnalysisPrompt, ReportPrompt};
use crate::planner::types::parse_duration;
use crate::planner::{
    MonthlyReport, Role, SuggestionSlot, SuggestionSource, Task, aggregate_roles,
    extract_keywords, fallback_suggestions, interpret_suggestions, parse_report_narrative,
    top_keywords, total_hours,
};

/// Message returned when an analysis request lacks required input.
pub const MISSING_FIELDS: &str = "Missing required fields";

/// Message returned when a report request has no tasks.
pub const NO_TASKS: &str = "No tasks provided";

/// Body of `POST /api/analyze-task`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeTaskRequest {
    #[serde(default)]
    pub task: Option<String>,
    /// Hours, as a number or numeric string.
    #[serde(default)]
    pub duration: Option<serde_json::Value>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub roles: Option<Vec<Role>>,
    /// IANA zone name of the client.
    #[serde(default)]
    pub timezone: Option<String>,
}

/// Body of `POST /api/monthly-report`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonthlyReportRequest {
    #[serde(default)]
    pub tasks: Option<Vec<Task>>,
    #[serde(default)]
    pub month: Option<serde_json::Value>,
    #[serde(default)]
    pub year: Option<serde_json::Value>,
}

/// Tunables the service needs from [`SparkConfig`].
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Token budget for each model call.
    pub max_tokens: usize,
    /// Zone used when a request names none (or an unknown one).
    pub default_timezone: Tz,
    /// Keywords kept in a report.
    pub top_keywords: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            default_timezone: chrono_tz::UTC,
            top_keywords: crate::planner::keywords::DEFAULT_TOP_KEYWORDS,
        }
    }
}

impl ServiceSettings {
    /// Extract settings from a loaded config.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured default timezone is unknown.
    pub fn from_config(config: &SparkConfig) -> Result<Self> {
        Ok(Self {
            max_tokens: config.llm.max_tokens,
            default_timezone: config.planner.timezone()?,
            top_keywords: config.planner.top_keywords,
        })
    }
}

/// Result of a validated analysis request.
#[derive(Debug)]
pub struct AnalysisOutcome {
    /// Never empty.
    pub suggestions: Vec<SuggestionSlot>,
    pub source: SuggestionSource,
    /// Set when the model call itself failed.
    pub remote_error: Option<LlmError>,
}

/// Analysis input after validation.
struct ValidTask<'a> {
    task: &'a str,
    duration_hours: f64,
    roles: &'a [Role],
}

impl AnalyzeTaskRequest {
    fn validate(&self) -> Result<ValidTask<'_>> {
        let task = self.task.as_deref().map(str::trim).unwrap_or_default();
        let duration_hours = parse_duration(self.duration.as_ref());
        let roles = self.roles.as_deref().unwrap_or_default();

        if task.is_empty() || duration_hours <= 0.0 || roles.is_empty() {
            return Err(SparkError::Validation(MISSING_FIELDS.to_owned()));
        }
        Ok(ValidTask {
            task,
            duration_hours,
            roles,
        })
    }
}

/// Stateless request orchestrator shared by all HTTP handlers.
pub struct RelayService {
    provider: Arc<dyn CompletionProvider>,
    settings: ServiceSettings,
}

impl RelayService {
    /// Create a service around a completion provider.
    pub fn new(provider: Arc<dyn CompletionProvider>, settings: ServiceSettings) -> Self {
        Self { provider, settings }
    }

    /// Suggest time slots for a task, anchored at the current instant.
    ///
    /// # Errors
    ///
    /// Returns [`SparkError::Validation`] when `task`, `duration`, or
    /// `roles` is missing. Model failures are not errors; see
    /// [`AnalysisOutcome::remote_error`].
    pub async fn analyze_task(&self, request: &AnalyzeTaskRequest) -> Result<AnalysisOutcome> {
        self.analyze_task_at(request, Utc::now()).await
    }

    /// [`analyze_task`](Self::analyze_task) with an explicit "now".
    ///
    /// # Errors
    ///
    /// Same as [`analyze_task`](Self::analyze_task).
    pub async fn analyze_task_at(
        &self,
        request: &AnalyzeTaskRequest,
        now: DateTime<Utc>,
    ) -> Result<AnalysisOutcome> {
        let valid = request.validate()?;
        let zone = self.resolve_zone(request.timezone.as_deref());
        let timezone_label = match request.timezone.as_deref().map(str::trim) {
            Some(tz) if !tz.is_empty() => tz,
            _ => zone.name(),
        };

        let prompt = AnalysisPrompt {
            task: valid.task,
            duration_hours: valid.duration_hours,
            priority: request.priority.as_deref().unwrap_or("unspecified"),
            roles: valid.roles,
            now,
            timezone: timezone_label,
        }
        .render();

        let local_now = now.with_timezone(&zone);
        tracing::info!(
            provider = self.provider.name(),
            roles = valid.roles.len(),
            prompt_chars = prompt.len(),
            "requesting task analysis"
        );

        match self.provider.complete(&prompt, self.settings.max_tokens).await {
            Ok(text) => {
                let interpreted = interpret_suggestions(&text, &local_now, valid.duration_hours);
                tracing::info!(
                    source = interpreted.source.as_str(),
                    suggestions = interpreted.suggestions.len(),
                    "task analysis complete"
                );
                Ok(AnalysisOutcome {
                    suggestions: interpreted.suggestions,
                    source: interpreted.source,
                    remote_error: None,
                })
            }
            Err(e) => {
                tracing::error!(error = %e, code = e.code(), "task analysis model call failed");
                Ok(AnalysisOutcome {
                    suggestions: fallback_suggestions(&local_now, valid.duration_hours),
                    source: SuggestionSource::Fallback,
                    remote_error: Some(e),
                })
            }
        }
    }

    /// Build a monthly report: local statistics plus the model narrative.
    ///
    /// # Errors
    ///
    /// Returns [`SparkError::Validation`] for an empty task list,
    /// [`SparkError::Remote`] when the model call fails, and
    /// [`SparkError::Parse`] when the narrative cannot be parsed. No
    /// partial report is returned on error.
    pub async fn monthly_report(&self, request: &MonthlyReportRequest) -> Result<MonthlyReport> {
        let tasks = match request.tasks.as_deref() {
            Some(tasks) if !tasks.is_empty() => tasks,
            _ => return Err(SparkError::Validation(NO_TASKS.to_owned())),
        };

        let role_stats = aggregate_roles(tasks);
        let frequency = extract_keywords(tasks.iter().map(Task::description));
        let keywords = top_keywords(&frequency, self.settings.top_keywords);
        let month = display_field(request.month.as_ref());
        let year = display_field(request.year.as_ref());

        let prompt = ReportPrompt {
            role_stats: &role_stats,
            top_keywords: &keywords,
            total_tasks: tasks.len(),
            month: &month,
            year: &year,
        }
        .render();

        tracing::info!(
            provider = self.provider.name(),
            tasks = tasks.len(),
            roles = role_stats.len(),
            %month,
            %year,
            "requesting monthly report"
        );

        let text = self
            .provider
            .complete(&prompt, self.settings.max_tokens)
            .await?;
        let narrative = parse_report_narrative(&text)?;

        Ok(MonthlyReport {
            role_stats,
            top_keywords: keywords,
            summary: narrative.summary,
            insights: narrative.insights,
            recommendation: narrative.recommendation,
            total_tasks: tasks.len(),
            total_hours: total_hours(tasks),
        })
    }

    fn resolve_zone(&self, requested: Option<&str>) -> Tz {
        match requested.map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => name.parse().unwrap_or_else(|_| {
                tracing::debug!(timezone = name, "unknown request timezone, using default");
                self.settings.default_timezone
            }),
            None => self.settings.default_timezone,
        }
    }
}

/// Render a loosely typed month/year field for the prompt.
fn display_field(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => "unknown".to_owned(),
        Some(other) => other.to_string(),
    }
}
