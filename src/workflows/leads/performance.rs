//! Agent capacity and historical performance derivations. Load counters move
//! when assignments open and resolve; rate and close-time figures are derived
//! from the completed-deal history, sampled to the most recent window.

use chrono::{DateTime, Utc};

use super::domain::AgentProfile;

/// Completed deals considered for rate and close-time calculations.
pub const PERFORMANCE_SAMPLE: usize = 50;

/// One resolved assignment, as needed for performance math.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosedDeal {
    pub assigned_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl ClosedDeal {
    pub fn close_days(&self) -> f32 {
        (self.completed_at - self.assigned_at).num_seconds() as f32 / 86_400.0
    }
}

/// completedDeals / totalAssignments as a percentage; zero with no history.
pub fn success_rate(completed_deals: u32, total_assignments: u32) -> f32 {
    if total_assignments == 0 {
        return 0.0;
    }
    completed_deals as f32 / total_assignments as f32 * 100.0
}

/// Mean days-to-close across the most recently completed deals, capped at
/// [`PERFORMANCE_SAMPLE`]. `None` until something has closed.
pub fn average_close_days(closed: &[ClosedDeal]) -> Option<f32> {
    if closed.is_empty() {
        return None;
    }

    let mut sampled: Vec<&ClosedDeal> = closed.iter().collect();
    sampled.sort_by_key(|deal| deal.completed_at);
    let recent = &sampled[sampled.len().saturating_sub(PERFORMANCE_SAMPLE)..];

    let total: f32 = recent.iter().map(|deal| deal.close_days()).sum();
    Some(total / recent.len() as f32)
}

/// Counter updates when the distribution engine opens an assignment.
pub fn apply_assignment(agent: &mut AgentProfile, at: DateTime<Utc>) {
    agent.current_load += 1;
    agent.total_assignments += 1;
    agent.last_assignment_at = Some(at);
    agent.success_rate = success_rate(agent.completed_deals, agent.total_assignments);
}

/// Counter updates when the sales workflow completes an assignment. The full
/// closed-deal history is passed so the sampled derivations stay exact.
pub fn apply_completion(agent: &mut AgentProfile, closed: &[ClosedDeal]) {
    agent.current_load = agent.current_load.saturating_sub(1);
    agent.completed_deals += 1;
    agent.success_rate = success_rate(agent.completed_deals, agent.total_assignments);
    agent.average_close_days = average_close_days(closed);
}

/// Cancellations release capacity without touching the performance record.
pub fn apply_cancellation(agent: &mut AgentProfile) {
    agent.current_load = agent.current_load.saturating_sub(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::leads::domain::AgentId;
    use chrono::{Duration, TimeZone};

    fn deal(day: i64, close_days: i64) -> ClosedDeal {
        let assigned_at = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap() + Duration::days(day);
        ClosedDeal {
            assigned_at,
            completed_at: assigned_at + Duration::days(close_days),
        }
    }

    #[test]
    fn success_rate_is_zero_without_assignments() {
        assert_eq!(success_rate(0, 0), 0.0);
        assert_eq!(success_rate(1, 4), 25.0);
    }

    #[test]
    fn average_close_days_samples_most_recent_window() {
        // 60 deals closing in 10 days, then 50 closing in 2: only the recent
        // 50 should survive the sample.
        let mut closed: Vec<ClosedDeal> = (0..60).map(|day| deal(day, 10)).collect();
        closed.extend((60..110).map(|day| deal(day, 2)));

        let average = average_close_days(&closed).expect("history present");
        assert!((average - 2.0).abs() < 0.01);
    }

    #[test]
    fn average_close_days_requires_history() {
        assert_eq!(average_close_days(&[]), None);
    }

    #[test]
    fn assignment_and_completion_counters_round_trip() {
        let mut agent = AgentProfile::new(AgentId("agent-1".to_string()), "Dana Wells");
        let opened_at = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap();

        apply_assignment(&mut agent, opened_at);
        apply_assignment(&mut agent, opened_at + Duration::hours(1));
        assert_eq!(agent.current_load, 2);
        assert_eq!(agent.total_assignments, 2);
        assert_eq!(agent.success_rate, 0.0);

        let closed = [ClosedDeal {
            assigned_at: opened_at,
            completed_at: opened_at + Duration::days(4),
        }];
        apply_completion(&mut agent, &closed);
        assert_eq!(agent.current_load, 1);
        assert_eq!(agent.completed_deals, 1);
        assert_eq!(agent.success_rate, 50.0);
        assert!((agent.average_close_days.expect("derived") - 4.0).abs() < 0.01);

        apply_cancellation(&mut agent);
        assert_eq!(agent.current_load, 0);
        assert_eq!(agent.completed_deals, 1);
    }
}
