//! Lead scoring and distribution engine: behavioral activity recording,
//! bounded lead scoring with grades, agent capacity/performance tracking,
//! and policy-driven batch assignment with auditable reasons.

pub mod activity;
pub mod distribution;
pub mod domain;
pub mod import;
pub mod memory;
pub mod performance;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use activity::{ActivityContext, ActivityKind};
pub use distribution::{
    AllocationStrategy, DistributionEngine, DistributionError, DistributionStats, PolicyConfig,
    PolicyKind, StrategyRegistry,
};
pub use domain::{
    ActivityEvent, AgentId, AgentProfile, Assignment, AssignmentId, AssignmentSnapshot,
    AssignmentStatus, EngagementCounters, LeadContact, LeadGrade, LeadId, LeadProfile,
};
pub use import::{ActivityCsvImporter, ActivityImportError, ActivityImportSummary};
pub use memory::InMemoryCrmStore;
pub use repository::{
    AgentRepository, AssignmentRepository, LeadRepository, RepositoryError, UnassignedLeadFilter,
};
pub use router::lead_router;
pub use scoring::{ScoreCard, ScoringConfig, ScoringEngine};
pub use service::{
    DistributionOutcome, DistributionRequest, LeadEngineService, LeadServiceError,
    RecordActivityRequest,
};
