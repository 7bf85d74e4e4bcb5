use serde::{Deserialize, Serialize};

/// Tunable weights and caps for the derived score components. The per-event
/// point weights live on `ActivityKind`; everything here shapes the
/// aggregates computed over a lead's full history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Upper bound on the accumulated view component.
    pub view_cap: f32,
    /// Minutes of gap after which consecutive events start a new session.
    pub session_gap_minutes: i64,
    /// Points per average session minute.
    pub session_minute_weight: f32,
    /// Upper bound on the session-duration component.
    pub session_cap: f32,
    /// Flat award when the history holds a single session.
    pub single_session_default: f32,
    /// Points per day between first and last recorded event.
    pub day_span_weight: f32,
    /// Upper bound on the days-active component.
    pub day_span_cap: f32,
    /// Full award when the observed price range is narrow.
    pub budget_match_weight: f32,
    /// A price range narrower than this fraction of the average observed
    /// price reads as a settled budget and earns the full award.
    pub narrow_price_ratio: f32,
    /// Flat bonus when any event falls inside the recency window.
    pub recent_activity_bonus: f32,
    /// Recency window, in days.
    pub recent_window_days: i64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            view_cap: 50.0,
            session_gap_minutes: 30,
            session_minute_weight: 2.0,
            session_cap: 20.0,
            single_session_default: 5.0,
            day_span_weight: 1.0,
            day_span_cap: 30.0,
            budget_match_weight: 10.0,
            narrow_price_ratio: 0.5,
            recent_activity_bonus: 10.0,
            recent_window_days: 7,
        }
    }
}
