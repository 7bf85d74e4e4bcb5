use chrono::{DateTime, Utc};

use super::domain::{
    ActivityEvent, AgentId, AgentProfile, Assignment, AssignmentId, AssignmentStatus, LeadId,
    LeadProfile,
};
use super::performance::ClosedDeal;

/// Filter applied when resolving the unassigned-lead pool for a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnassignedLeadFilter {
    pub min_score: Option<u8>,
    pub serious_buyers_only: bool,
    pub limit: usize,
}

/// Storage abstraction for leads and their append-only event history, so the
/// engine can be exercised in isolation and ported across backends.
pub trait LeadRepository: Send + Sync {
    fn upsert(&self, profile: LeadProfile) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &LeadId) -> Result<Option<LeadProfile>, RepositoryError>;
    /// Known profiles for the given ids, in input order; unknown ids are
    /// silently dropped.
    fn find_by_ids(&self, ids: &[LeadId]) -> Result<Vec<LeadProfile>, RepositoryError>;
    /// Leads with no ACTIVE assignment, filtered, ordered by score then
    /// recency descending, capped at `filter.limit`.
    fn find_unassigned(
        &self,
        filter: &UnassignedLeadFilter,
    ) -> Result<Vec<LeadProfile>, RepositoryError>;
    fn append_activity(&self, event: ActivityEvent) -> Result<(), RepositoryError>;
    fn activity_for(&self, id: &LeadId) -> Result<Vec<ActivityEvent>, RepositoryError>;
}

/// Agent pool access with load and performance counters pre-joined.
pub trait AgentRepository: Send + Sync {
    /// Active agents in stable pool order, minus the excluded ids.
    fn find_active(&self, exclude: &[AgentId]) -> Result<Vec<AgentProfile>, RepositoryError>;
    fn fetch(&self, id: &AgentId) -> Result<Option<AgentProfile>, RepositoryError>;
    /// Tracker update when an assignment opens: load and totals advance.
    fn record_assignment(&self, id: &AgentId, at: DateTime<Utc>) -> Result<(), RepositoryError>;
    /// Tracker update when a deal closes: load drops, performance refreshes.
    fn record_completion(&self, id: &AgentId, deal: ClosedDeal) -> Result<(), RepositoryError>;
    /// Tracker update when an assignment is cancelled: load drops only.
    fn record_cancellation(&self, id: &AgentId) -> Result<(), RepositoryError>;
}

/// Assignment persistence. Implementations must reject a second ACTIVE
/// assignment for the same lead with [`RepositoryError::Conflict`].
pub trait AssignmentRepository: Send + Sync {
    fn create(&self, assignment: Assignment) -> Result<Assignment, RepositoryError>;
    fn fetch(&self, id: &AssignmentId) -> Result<Option<Assignment>, RepositoryError>;
    fn active_for_lead(&self, lead: &LeadId) -> Result<Option<Assignment>, RepositoryError>;
    fn active_count_for_agent(&self, agent: &AgentId) -> Result<usize, RepositoryError>;
    /// Move an ACTIVE assignment to a terminal status. Terminal states are
    /// final; resolving twice is a conflict.
    fn resolve(
        &self,
        id: &AssignmentId,
        status: AssignmentStatus,
        at: DateTime<Utc>,
    ) -> Result<Assignment, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
