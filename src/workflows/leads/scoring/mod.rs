mod config;
mod rules;

pub use config::ScoringConfig;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::activity::ActivityKind;
use super::domain::{ActivityEvent, EngagementCounters, LeadGrade, LeadId};

/// Stateless engine turning a lead's full event history into a bounded score,
/// a grade, and an auditable per-component breakdown.
pub struct ScoringEngine {
    config: ScoringConfig,
}

/// The aggregates a score is assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreComponentKind {
    Views,
    Inquiries,
    ContactForms,
    Favorites,
    ReturnVisits,
    SessionDuration,
    DaysActive,
    BudgetMatch,
    RecentActivity,
}

/// Discrete contribution to a score, allowing transparent audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub component: ScoreComponentKind,
    pub points: f32,
    pub detail: String,
}

/// Score, grade, and breakdown for one lead at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub lead_id: LeadId,
    pub score: u8,
    pub grade: LeadGrade,
    pub breakdown: Vec<ScoreComponent>,
}

/// Everything `updateScore` persists back onto the profile.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadScoreUpdate {
    pub card: ScoreCard,
    pub counters: EngagementCounters,
    pub budget_estimate: Option<u32>,
    pub serious_buyer: bool,
    pub last_activity_at: Option<DateTime<Utc>>,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Compute the full score update for a lead. `as_of` anchors the
    /// recent-activity window so replays are deterministic. Event insertion
    /// order is irrelevant; the history is sorted before aggregation.
    pub fn evaluate(
        &self,
        lead_id: &LeadId,
        events: &[ActivityEvent],
        as_of: DateTime<Utc>,
    ) -> LeadScoreUpdate {
        let mut history: Vec<ActivityEvent> = events.to_vec();
        history.sort_by(|a, b| {
            a.occurred_at
                .cmp(&b.occurred_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let config = &self.config;
        let view_count = rules::count_of(&history, ActivityKind::View);
        let inquiry_count = rules::count_of(&history, ActivityKind::Inquiry);
        let contact_form_count = rules::count_of(&history, ActivityKind::ContactForm);
        let favorite_count = rules::count_of(&history, ActivityKind::Favorite);
        let distinct_days = rules::distinct_active_days(&history);
        let span_days = rules::activity_span_days(&history);
        let sessions = rules::session_profile(&history, config.session_gap_minutes);
        let prices = rules::observed_prices(&history);
        let recent = rules::has_recent_activity(&history, as_of, config.recent_window_days);

        let views = (view_count as f32 * ActivityKind::View.weight() as f32).min(config.view_cap);
        let inquiries = inquiry_count as f32 * ActivityKind::Inquiry.weight() as f32;
        let contact_forms = contact_form_count as f32 * ActivityKind::ContactForm.weight() as f32;
        let favorites = favorite_count as f32 * ActivityKind::Favorite.weight() as f32;
        let return_visit_count = distinct_days.saturating_sub(1);
        let return_visits = return_visit_count as f32 * ActivityKind::ReturnVisit.weight() as f32;

        let session_duration = match sessions.count {
            0 => 0.0,
            1 => config.single_session_default,
            _ => (sessions.average_minutes * config.session_minute_weight).min(config.session_cap),
        };

        let days_active = (span_days as f32 * config.day_span_weight).min(config.day_span_cap);
        let budget_match = rules::budget_component(&prices, config);
        let recent_activity = if recent {
            config.recent_activity_bonus
        } else {
            0.0
        };

        let breakdown = vec![
            ScoreComponent {
                component: ScoreComponentKind::Views,
                points: views,
                detail: format!("{view_count} property view(s)"),
            },
            ScoreComponent {
                component: ScoreComponentKind::Inquiries,
                points: inquiries,
                detail: format!("{inquiry_count} inquiry(ies)"),
            },
            ScoreComponent {
                component: ScoreComponentKind::ContactForms,
                points: contact_forms,
                detail: format!("{contact_form_count} contact form submission(s)"),
            },
            ScoreComponent {
                component: ScoreComponentKind::Favorites,
                points: favorites,
                detail: format!("{favorite_count} saved favorite(s)"),
            },
            ScoreComponent {
                component: ScoreComponentKind::ReturnVisits,
                points: return_visits,
                detail: format!("active on {distinct_days} distinct day(s)"),
            },
            ScoreComponent {
                component: ScoreComponentKind::SessionDuration,
                points: session_duration,
                detail: format!(
                    "{} session(s), {:.1} min average",
                    sessions.count, sessions.average_minutes
                ),
            },
            ScoreComponent {
                component: ScoreComponentKind::DaysActive,
                points: days_active,
                detail: format!("{span_days} day(s) between first and last touch"),
            },
            ScoreComponent {
                component: ScoreComponentKind::BudgetMatch,
                points: budget_match,
                detail: format!("{} priced property(ies) observed", prices.len()),
            },
            ScoreComponent {
                component: ScoreComponentKind::RecentActivity,
                points: recent_activity,
                detail: if recent {
                    format!("activity within the last {} days", config.recent_window_days)
                } else {
                    "no recent activity".to_string()
                },
            },
        ];

        let total: f32 = breakdown.iter().map(|component| component.points).sum();
        let score = total.round().clamp(0.0, 100.0) as u8;
        let grade = LeadGrade::from_score(score);

        let counters = EngagementCounters {
            property_views: view_count,
            inquiries_made: inquiry_count,
            contact_form_submissions: contact_form_count,
            favorites_saved: favorite_count,
            return_visits: return_visit_count,
            days_active: distinct_days,
        };

        let budget_estimate = if prices.is_empty() {
            None
        } else {
            Some(
                (prices.iter().map(|price| *price as f64).sum::<f64>() / prices.len() as f64)
                    .round() as u32,
            )
        };

        let serious_buyer =
            score >= LeadGrade::WARM_THRESHOLD && (inquiry_count > 0 || contact_form_count > 0);

        LeadScoreUpdate {
            card: ScoreCard {
                lead_id: lead_id.clone(),
                score,
                grade,
                breakdown,
            },
            counters,
            budget_estimate,
            serious_buyer,
            last_activity_at: history.last().map(|event| event.occurred_at),
        }
    }

    /// Score and grade only, for read paths that do not persist.
    pub fn score_card(
        &self,
        lead_id: &LeadId,
        events: &[ActivityEvent],
        as_of: DateTime<Utc>,
    ) -> ScoreCard {
        self.evaluate(lead_id, events, as_of).card
    }
}
