//! Reference in-memory backend implementing all three repositories behind a
//! single mutex. Backs the demo CLI, the default server wiring, and tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::distribution::order_pool;
use super::domain::{
    ActivityEvent, AgentId, AgentProfile, Assignment, AssignmentId, AssignmentStatus, LeadId,
    LeadProfile,
};
use super::performance::{self, ClosedDeal};
use super::repository::{
    AgentRepository, AssignmentRepository, LeadRepository, RepositoryError, UnassignedLeadFilter,
};

#[derive(Default)]
struct CrmState {
    leads: HashMap<LeadId, LeadProfile>,
    events: HashMap<LeadId, Vec<ActivityEvent>>,
    /// Insertion order is the pool order policies see.
    agents: Vec<AgentProfile>,
    assignments: Vec<Assignment>,
    closed_deals: HashMap<AgentId, Vec<ClosedDeal>>,
}

#[derive(Default, Clone)]
pub struct InMemoryCrmStore {
    inner: Arc<Mutex<CrmState>>,
}

impl InMemoryCrmStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, CrmState>, RepositoryError> {
        self.inner
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }

    /// Insert or replace an agent, keeping pool order stable on replace.
    pub fn seed_agent(&self, agent: AgentProfile) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        match state.agents.iter_mut().find(|slot| slot.id == agent.id) {
            Some(slot) => *slot = agent,
            None => state.agents.push(agent),
        }
        Ok(())
    }

    /// Every assignment ever created, for demo rendering and assertions.
    pub fn assignments(&self) -> Result<Vec<Assignment>, RepositoryError> {
        Ok(self.state()?.assignments.clone())
    }
}

impl LeadRepository for InMemoryCrmStore {
    fn upsert(&self, profile: LeadProfile) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        state.leads.insert(profile.id.clone(), profile);
        Ok(())
    }

    fn fetch(&self, id: &LeadId) -> Result<Option<LeadProfile>, RepositoryError> {
        Ok(self.state()?.leads.get(id).cloned())
    }

    fn find_by_ids(&self, ids: &[LeadId]) -> Result<Vec<LeadProfile>, RepositoryError> {
        let state = self.state()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.leads.get(id).cloned())
            .collect())
    }

    fn find_unassigned(
        &self,
        filter: &UnassignedLeadFilter,
    ) -> Result<Vec<LeadProfile>, RepositoryError> {
        let state = self.state()?;
        let mut pool: Vec<LeadProfile> = state
            .leads
            .values()
            .filter(|lead| {
                !state.assignments.iter().any(|assignment| {
                    assignment.lead_id == lead.id && assignment.status == AssignmentStatus::Active
                })
            })
            .filter(|lead| match filter.min_score {
                Some(min) => lead.score >= min,
                None => true,
            })
            .filter(|lead| !filter.serious_buyers_only || lead.serious_buyer)
            .cloned()
            .collect();

        order_pool(&mut pool);
        pool.truncate(filter.limit);
        Ok(pool)
    }

    fn append_activity(&self, event: ActivityEvent) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        state
            .events
            .entry(event.lead_id.clone())
            .or_default()
            .push(event);
        Ok(())
    }

    fn activity_for(&self, id: &LeadId) -> Result<Vec<ActivityEvent>, RepositoryError> {
        Ok(self.state()?.events.get(id).cloned().unwrap_or_default())
    }
}

impl AgentRepository for InMemoryCrmStore {
    fn find_active(&self, exclude: &[AgentId]) -> Result<Vec<AgentProfile>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .agents
            .iter()
            .filter(|agent| !exclude.contains(&agent.id))
            .cloned()
            .collect())
    }

    fn fetch(&self, id: &AgentId) -> Result<Option<AgentProfile>, RepositoryError> {
        let state = self.state()?;
        Ok(state.agents.iter().find(|agent| &agent.id == id).cloned())
    }

    fn record_assignment(&self, id: &AgentId, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let agent = state
            .agents
            .iter_mut()
            .find(|agent| &agent.id == id)
            .ok_or(RepositoryError::NotFound)?;
        performance::apply_assignment(agent, at);
        Ok(())
    }

    fn record_completion(&self, id: &AgentId, deal: ClosedDeal) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let closed = {
            let history = state.closed_deals.entry(id.clone()).or_default();
            history.push(deal);
            history.clone()
        };
        let agent = state
            .agents
            .iter_mut()
            .find(|agent| &agent.id == id)
            .ok_or(RepositoryError::NotFound)?;
        performance::apply_completion(agent, &closed);
        Ok(())
    }

    fn record_cancellation(&self, id: &AgentId) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let agent = state
            .agents
            .iter_mut()
            .find(|agent| &agent.id == id)
            .ok_or(RepositoryError::NotFound)?;
        performance::apply_cancellation(agent);
        Ok(())
    }
}

impl AssignmentRepository for InMemoryCrmStore {
    fn create(&self, assignment: Assignment) -> Result<Assignment, RepositoryError> {
        let mut state = self.state()?;
        let already_active = state.assignments.iter().any(|existing| {
            existing.lead_id == assignment.lead_id && existing.status == AssignmentStatus::Active
        });
        if already_active {
            return Err(RepositoryError::Conflict);
        }
        state.assignments.push(assignment.clone());
        Ok(assignment)
    }

    fn fetch(&self, id: &AssignmentId) -> Result<Option<Assignment>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .assignments
            .iter()
            .find(|assignment| &assignment.id == id)
            .cloned())
    }

    fn active_for_lead(&self, lead: &LeadId) -> Result<Option<Assignment>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .assignments
            .iter()
            .find(|assignment| {
                &assignment.lead_id == lead && assignment.status == AssignmentStatus::Active
            })
            .cloned())
    }

    fn active_count_for_agent(&self, agent: &AgentId) -> Result<usize, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .assignments
            .iter()
            .filter(|assignment| {
                &assignment.agent_id == agent && assignment.status == AssignmentStatus::Active
            })
            .count())
    }

    fn resolve(
        &self,
        id: &AssignmentId,
        status: AssignmentStatus,
        at: DateTime<Utc>,
    ) -> Result<Assignment, RepositoryError> {
        let mut state = self.state()?;
        let assignment = state
            .assignments
            .iter_mut()
            .find(|assignment| &assignment.id == id)
            .ok_or(RepositoryError::NotFound)?;

        if assignment.status.is_terminal() {
            return Err(RepositoryError::Conflict);
        }

        assignment.status = status;
        assignment.resolved_at = Some(at);
        Ok(assignment.clone())
    }
}
