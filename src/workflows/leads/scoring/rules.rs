use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};

use super::config::ScoringConfig;
use crate::workflows::leads::activity::ActivityKind;
use crate::workflows::leads::domain::ActivityEvent;

pub(crate) fn count_of(events: &[ActivityEvent], kind: ActivityKind) -> u32 {
    events.iter().filter(|event| event.kind == kind).count() as u32
}

/// Number of distinct calendar days (UTC) with at least one event.
pub(crate) fn distinct_active_days(events: &[ActivityEvent]) -> u32 {
    events
        .iter()
        .map(|event| event.occurred_at.date_naive())
        .collect::<BTreeSet<_>>()
        .len() as u32
}

/// Whole days between the first and last event. Expects sorted input.
pub(crate) fn activity_span_days(events: &[ActivityEvent]) -> i64 {
    match (events.first(), events.last()) {
        (Some(first), Some(last)) => (last.occurred_at - first.occurred_at).num_days(),
        _ => 0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SessionProfile {
    pub(crate) count: u32,
    pub(crate) average_minutes: f32,
}

/// Group sorted events into sessions: consecutive events no further apart
/// than the configured gap share a session. A single-event session has zero
/// length and still counts toward the average.
pub(crate) fn session_profile(events: &[ActivityEvent], gap_minutes: i64) -> SessionProfile {
    let Some(first) = events.first() else {
        return SessionProfile {
            count: 0,
            average_minutes: 0.0,
        };
    };

    let gap = Duration::minutes(gap_minutes);
    let mut count: u32 = 1;
    let mut total_minutes: f32 = 0.0;
    let mut session_start = first.occurred_at;
    let mut previous = first.occurred_at;

    for event in &events[1..] {
        if event.occurred_at - previous > gap {
            total_minutes += minutes_between(session_start, previous);
            session_start = event.occurred_at;
            count += 1;
        }
        previous = event.occurred_at;
    }
    total_minutes += minutes_between(session_start, previous);

    SessionProfile {
        count,
        average_minutes: total_minutes / count as f32,
    }
}

fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f32 {
    (end - start).num_seconds() as f32 / 60.0
}

/// Listed prices of properties the lead viewed or inquired about.
pub(crate) fn observed_prices(events: &[ActivityEvent]) -> Vec<u32> {
    events
        .iter()
        .filter(|event| matches!(event.kind, ActivityKind::View | ActivityKind::Inquiry))
        .filter_map(|event| event.context.listed_price)
        .collect()
}

/// Narrow price range reads as a settled budget: full award when
/// `max - min < narrow_price_ratio * avg`, half otherwise, zero with no data.
pub(crate) fn budget_component(prices: &[u32], config: &ScoringConfig) -> f32 {
    if prices.is_empty() {
        return 0.0;
    }

    let min = *prices.iter().min().unwrap_or(&0) as f32;
    let max = *prices.iter().max().unwrap_or(&0) as f32;
    let average = prices.iter().map(|price| *price as f32).sum::<f32>() / prices.len() as f32;

    if max - min < config.narrow_price_ratio * average {
        config.budget_match_weight
    } else {
        config.budget_match_weight / 2.0
    }
}

pub(crate) fn has_recent_activity(
    events: &[ActivityEvent],
    as_of: DateTime<Utc>,
    window_days: i64,
) -> bool {
    let window = Duration::days(window_days);
    events
        .iter()
        .any(|event| event.occurred_at + window >= as_of)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::leads::activity::ActivityContext;
    use crate::workflows::leads::domain::LeadId;
    use chrono::TimeZone;

    fn event_at(minute_offset: i64) -> ActivityEvent {
        let base = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        ActivityEvent::record(
            format!("evt-{minute_offset}"),
            LeadId("lead-1".to_string()),
            ActivityKind::View,
            base + Duration::minutes(minute_offset),
            ActivityContext::default(),
        )
    }

    #[test]
    fn sessions_split_on_the_gap_boundary() {
        // 0..20 one session, 20+31=51 starts the next, 51..60 continues it.
        let events = vec![event_at(0), event_at(20), event_at(51), event_at(60)];
        let profile = session_profile(&events, 30);
        assert_eq!(profile.count, 2);
        // Sessions last 20 and 9 minutes.
        assert!((profile.average_minutes - 14.5).abs() < f32::EPSILON);
    }

    #[test]
    fn single_event_yields_one_zero_length_session() {
        let events = vec![event_at(0)];
        let profile = session_profile(&events, 30);
        assert_eq!(profile.count, 1);
        assert_eq!(profile.average_minutes, 0.0);
    }

    #[test]
    fn budget_component_rewards_narrow_ranges() {
        let config = ScoringConfig::default();
        assert_eq!(budget_component(&[], &config), 0.0);
        // Range 20k on an average of 310k: narrow.
        assert_eq!(
            budget_component(&[300_000, 320_000], &config),
            config.budget_match_weight
        );
        // Range 400k on an average of 400k: wide.
        assert_eq!(
            budget_component(&[200_000, 600_000], &config),
            config.budget_match_weight / 2.0
        );
    }

    #[test]
    fn recency_window_is_inclusive_of_the_boundary() {
        let events = vec![event_at(0)];
        let as_of = events[0].occurred_at + Duration::days(7);
        assert!(has_recent_activity(&events, as_of, 7));
        assert!(!has_recent_activity(
            &events,
            as_of + Duration::seconds(1),
            7
        ));
    }
}
