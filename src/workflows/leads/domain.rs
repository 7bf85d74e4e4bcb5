use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::activity::ActivityKind;

/// Identifier wrapper for tracked leads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LeadId(pub String);

/// Identifier wrapper for sales agents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub String);

/// Identifier wrapper for lead-to-agent assignments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentId(pub String);

impl std::fmt::Display for LeadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Categorical bucket derived deterministically from the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadGrade {
    Cold,
    Warm,
    Hot,
    Qualified,
}

impl LeadGrade {
    /// Inclusive lower bound for WARM (also the serious-buyer score floor).
    pub const WARM_THRESHOLD: u8 = 31;
    /// Inclusive lower bound for HOT.
    pub const HOT_THRESHOLD: u8 = 61;
    /// Inclusive lower bound for QUALIFIED.
    pub const QUALIFIED_THRESHOLD: u8 = 81;

    /// Pure function of the score; the only place the bucket boundaries live.
    pub const fn from_score(score: u8) -> Self {
        if score >= Self::QUALIFIED_THRESHOLD {
            LeadGrade::Qualified
        } else if score >= Self::HOT_THRESHOLD {
            LeadGrade::Hot
        } else if score >= Self::WARM_THRESHOLD {
            LeadGrade::Warm
        } else {
            LeadGrade::Cold
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            LeadGrade::Cold => "cold",
            LeadGrade::Warm => "warm",
            LeadGrade::Hot => "hot",
            LeadGrade::Qualified => "qualified",
        }
    }
}

/// Contact details captured on first touch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadContact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Denormalized engagement counters persisted alongside the score so
/// dashboards never replay the event log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementCounters {
    pub property_views: u32,
    pub inquiries_made: u32,
    pub contact_form_submissions: u32,
    pub favorites_saved: u32,
    pub return_visits: u32,
    pub days_active: u32,
}

/// A prospective customer tracked for sales follow-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadProfile {
    pub id: LeadId,
    pub contact: LeadContact,
    pub created_at: DateTime<Utc>,
    pub score: u8,
    pub grade: LeadGrade,
    pub serious_buyer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_estimate: Option<u32>,
    #[serde(default)]
    pub location_interests: Vec<String>,
    #[serde(default)]
    pub property_type_interests: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub engagement: EngagementCounters,
}

impl LeadProfile {
    /// Fresh profile as created on a lead's first recorded touch.
    pub fn new(id: LeadId, contact: LeadContact, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            contact,
            created_at,
            score: 0,
            grade: LeadGrade::Cold,
            serious_buyer: false,
            budget_estimate: None,
            location_interests: Vec::new(),
            property_type_interests: Vec::new(),
            last_activity_at: None,
            engagement: EngagementCounters::default(),
        }
    }

    /// Merge an observed interest into a list, case-insensitively deduplicated.
    pub fn note_interest(list: &mut Vec<String>, value: &str) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return;
        }
        if !list
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(trimmed))
        {
            list.push(trimmed.to_string());
        }
    }
}

/// Immutable behavioral event appended to a lead's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: String,
    pub lead_id: LeadId,
    pub kind: ActivityKind,
    pub occurred_at: DateTime<Utc>,
    /// Fixed points contributed by this event, from the weight table.
    pub points: u32,
    #[serde(default)]
    pub context: super::activity::ActivityContext,
}

/// Sales staff member eligible to receive lead assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: AgentId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub territory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_limit: Option<u32>,
    pub current_load: u32,
    pub total_assignments: u32,
    pub completed_deals: u32,
    /// Percentage in [0, 100], derived from the completed-deal history.
    pub success_rate: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_close_days: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_assignment_at: Option<DateTime<Utc>>,
}

impl AgentProfile {
    pub fn new(id: AgentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            territory: None,
            capacity_limit: None,
            current_load: 0,
            total_assignments: 0,
            completed_deals: 0,
            success_rate: 0.0,
            average_close_days: None,
            last_assignment_at: None,
        }
    }
}

/// Lifecycle of an assignment. Created ACTIVE by the distribution engine,
/// resolved to a terminal state by the external sales workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Active,
    Completed,
    Cancelled,
}

impl AssignmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AssignmentStatus::Active => "active",
            AssignmentStatus::Completed => "completed",
            AssignmentStatus::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            AssignmentStatus::Completed | AssignmentStatus::Cancelled
        )
    }
}

/// Lead score and agent stats frozen at decision time, kept for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentSnapshot {
    pub lead_score: u8,
    pub lead_grade: LeadGrade,
    pub agent_load: u32,
    pub agent_success_rate: f32,
}

/// An auditable lead-to-agent pairing with its justification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub lead_id: LeadId,
    pub agent_id: AgentId,
    pub assigned_at: DateTime<Utc>,
    pub status: AssignmentStatus,
    pub reason: String,
    pub snapshot: AssignmentSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}
