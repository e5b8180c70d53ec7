//! Deterministic suggestions used when the model gives nothing usable.
//!
//! Slots are computed on the calendar of `now`'s timezone and returned as
//! UTC instants:
//!
//! 1. tomorrow 09:00 (always)
//! 2. today 14:00 (only while it is still ahead of `now`)
//! 3. the day after tomorrow 10:00 (always)

use chrono::{
    DateTime, Days, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc,
};

use super::types::SuggestionSlot;

/// Upper bound on the number of fallback slots.
pub const MAX_FALLBACK_SLOTS: usize = 3;

/// How far past a DST gap we search for the first valid wall-clock time.
const GAP_SEARCH_MINUTES: i64 = 180;

/// Produce two or three fallback slots relative to `now`.
///
/// `duration_hours` is accepted for logging only; it does not change the
/// slots.
pub fn fallback_suggestions<Tz: TimeZone>(
    now: &DateTime<Tz>,
    duration_hours: f64,
) -> Vec<SuggestionSlot> {
    let tz = now.timezone();
    let today = now.date_naive();
    let now_utc = now.with_timezone(&Utc);

    tracing::debug!(duration_hours, now = %now_utc, "generating fallback suggestions");

    let mut slots = Vec::with_capacity(MAX_FALLBACK_SLOTS);

    slots.push(SuggestionSlot {
        time: wall_clock(&tz, add_days(today, 1), 9),
        reason: "Morning energy peak, ideal for focused work".to_owned(),
        score: 95,
        role_match: true,
    });

    let this_afternoon = wall_clock(&tz, today, 14);
    if this_afternoon > now_utc {
        slots.push(SuggestionSlot {
            time: this_afternoon,
            reason: "Available today, good productivity window".to_owned(),
            score: 85,
            role_match: true,
        });
    }

    slots.push(SuggestionSlot {
        time: wall_clock(&tz, add_days(today, 2), 10),
        reason: "Extra time to prepare, flexible schedule".to_owned(),
        score: 80,
        role_match: false,
    });

    slots.truncate(MAX_FALLBACK_SLOTS);
    slots
}

fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

/// `hour`:00 on `date` in `tz`, as UTC.
///
/// Ambiguous times (DST fall-back) take the earlier instant; nonexistent
/// times (DST spring-forward) move to the first valid minute after.
fn wall_clock<Tz: TimeZone>(tz: &Tz, date: NaiveDate, hour: i64) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN) + TimeDelta::hours(hour);
    (0..=GAP_SEARCH_MINUTES)
        .find_map(|minutes| resolve_local(tz, naive + TimeDelta::minutes(minutes)))
        .unwrap_or_else(|| tz.from_utc_datetime(&naive).with_timezone(&Utc))
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) => Some(t.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}
