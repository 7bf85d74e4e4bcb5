use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::workflows::leads::activity::{ActivityContext, ActivityKind};
use crate::workflows::leads::domain::{
    ActivityEvent, AgentId, AgentProfile, Assignment, AssignmentId, AssignmentStatus, LeadContact,
    LeadGrade, LeadId, LeadProfile,
};
use crate::workflows::leads::memory::InMemoryCrmStore;
use crate::workflows::leads::repository::{
    AgentRepository, AssignmentRepository, LeadRepository, RepositoryError,
};
use crate::workflows::leads::scoring::ScoringConfig;
use crate::workflows::leads::service::LeadEngineService;

pub(super) type MemoryService =
    LeadEngineService<InMemoryCrmStore, InMemoryCrmStore, InMemoryCrmStore>;

pub(super) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0)
        .single()
        .expect("valid base time")
}

pub(super) fn build_service() -> (Arc<InMemoryCrmStore>, MemoryService) {
    let store = Arc::new(InMemoryCrmStore::new());
    let service = LeadEngineService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        ScoringConfig::default(),
    );
    (store, service)
}

pub(super) fn event(
    id: &str,
    lead: &str,
    kind: ActivityKind,
    at: DateTime<Utc>,
    listed_price: Option<u32>,
) -> ActivityEvent {
    ActivityEvent::record(
        id.to_string(),
        LeadId(lead.to_string()),
        kind,
        at,
        ActivityContext {
            listed_price,
            ..ActivityContext::default()
        },
    )
}

pub(super) fn lead(id: &str, score: u8) -> LeadProfile {
    let mut profile = LeadProfile::new(
        LeadId(id.to_string()),
        LeadContact::default(),
        base_time() - Duration::days(10),
    );
    profile.score = score;
    profile.grade = LeadGrade::from_score(score);
    profile.last_activity_at = Some(base_time() - Duration::days(1));
    profile
}

pub(super) fn lead_with_locations(id: &str, score: u8, locations: &[&str]) -> LeadProfile {
    let mut profile = lead(id, score);
    profile.location_interests = locations.iter().map(|name| name.to_string()).collect();
    profile
}

pub(super) fn agent(id: &str, load: u32) -> AgentProfile {
    let mut profile = AgentProfile::new(AgentId(id.to_string()), id.to_string());
    profile.current_load = load;
    profile
}

pub(super) fn performer(id: &str, success_rate: f32, average_close_days: Option<f32>) -> AgentProfile {
    let mut profile = agent(id, 0);
    profile.success_rate = success_rate;
    profile.total_assignments = 10;
    profile.completed_deals = (success_rate / 10.0) as u32;
    profile.average_close_days = average_close_days;
    profile
}

/// Assignment store that refuses every write, for best-effort batch tests.
#[derive(Default)]
pub(super) struct UnavailableAssignments;

impl AssignmentRepository for UnavailableAssignments {
    fn create(&self, _assignment: Assignment) -> Result<Assignment, RepositoryError> {
        Err(RepositoryError::Unavailable("assignment store offline".to_string()))
    }

    fn fetch(&self, _id: &AssignmentId) -> Result<Option<Assignment>, RepositoryError> {
        Ok(None)
    }

    fn active_for_lead(&self, _lead: &LeadId) -> Result<Option<Assignment>, RepositoryError> {
        Ok(None)
    }

    fn active_count_for_agent(&self, _agent: &AgentId) -> Result<usize, RepositoryError> {
        Ok(0)
    }

    fn resolve(
        &self,
        _id: &AssignmentId,
        _status: AssignmentStatus,
        _at: DateTime<Utc>,
    ) -> Result<Assignment, RepositoryError> {
        Err(RepositoryError::Unavailable("assignment store offline".to_string()))
    }
}

/// Seed a scored lead directly, bypassing the activity path.
pub(super) fn seed_lead(store: &InMemoryCrmStore, profile: LeadProfile) {
    store.upsert(profile).expect("lead seeds");
}

pub(super) fn seed_agent(store: &InMemoryCrmStore, profile: AgentProfile) {
    store.seed_agent(profile).expect("agent seeds");
}

pub(super) fn active_assignments(store: &InMemoryCrmStore, agent: &str) -> usize {
    store
        .active_count_for_agent(&AgentId(agent.to_string()))
        .expect("store reachable")
}

pub(super) fn agent_profile(store: &InMemoryCrmStore, agent: &str) -> AgentProfile {
    AgentRepository::fetch(store, &AgentId(agent.to_string()))
        .expect("store reachable")
        .expect("agent present")
}

pub(super) fn lead_profile(store: &InMemoryCrmStore, lead: &str) -> LeadProfile {
    LeadRepository::fetch(store, &LeadId(lead.to_string()))
        .expect("store reachable")
        .expect("lead present")
}
