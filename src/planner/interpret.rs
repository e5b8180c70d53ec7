//! Turning raw model text into structured results.
//!
//! The two paths fail differently: suggestion parsing never fails (it
//! substitutes [`fallback_suggestions`]), while report parsing returns the
//! error so the whole report request fails.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use super::fallback::fallback_suggestions;
use super::types::{ReportNarrative, SuggestionSlot};
use crate::error::{Result, SparkError};

/// Where a set of suggestions came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionSource {
    /// Parsed from model output.
    Model,
    /// Generated locally by [`fallback_suggestions`].
    Fallback,
}

impl SuggestionSource {
    /// Stable lowercase name, used in the `x-suggestion-source` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Fallback => "fallback",
        }
    }
}

/// Suggestions tagged with their source.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpreted {
    pub suggestions: Vec<SuggestionSlot>,
    pub source: SuggestionSource,
}

/// A slot as the model writes it; scores are clamped on conversion.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelSlot {
    time: DateTime<Utc>,
    reason: String,
    score: f64,
    #[serde(default)]
    role_match: bool,
}

impl From<ModelSlot> for SuggestionSlot {
    fn from(slot: ModelSlot) -> Self {
        Self {
            time: slot.time,
            reason: slot.reason,
            score: slot.score.clamp(0.0, 100.0).round() as u8,
            role_match: slot.role_match,
        }
    }
}

/// Parse model text as a non-empty JSON array of suggestion slots.
///
/// # Errors
///
/// Returns [`SparkError::Parse`] for malformed JSON, the wrong shape, or an
/// empty array.
pub fn parse_suggestions(raw: &str) -> Result<Vec<SuggestionSlot>> {
    let slots: Vec<ModelSlot> = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| SparkError::Parse(format!("suggestions: {e}")))?;
    if slots.is_empty() {
        return Err(SparkError::Parse("suggestions: empty array".to_owned()));
    }
    Ok(slots.into_iter().map(SuggestionSlot::from).collect())
}

/// Parse model suggestions, substituting fallback slots on any failure.
pub fn interpret_suggestions<Tz: TimeZone>(
    raw: &str,
    now: &DateTime<Tz>,
    duration_hours: f64,
) -> Interpreted {
    match parse_suggestions(raw) {
        Ok(suggestions) => Interpreted {
            suggestions,
            source: SuggestionSource::Model,
        },
        Err(e) => {
            tracing::warn!(error = %e, "unusable model suggestions, using fallback");
            Interpreted {
                suggestions: fallback_suggestions(now, duration_hours),
                source: SuggestionSource::Fallback,
            }
        }
    }
}

/// Parse model text as the monthly report narrative.
///
/// # Errors
///
/// Returns [`SparkError::Parse`] when the text is not a JSON object with
/// `summary`, `insights`, and `recommendation`.
pub fn parse_report_narrative(raw: &str) -> Result<ReportNarrative> {
    serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| SparkError::Parse(format!("report narrative: {e}")))
}

/// Remove a surrounding Markdown code fence (```` ```json ... ``` ````).
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`) on the opening line.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
