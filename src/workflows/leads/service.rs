use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::activity::{ActivityContext, ActivityKind};
use super::distribution::{
    pool_limit, DistributionEngine, DistributionError, DistributionStats, PolicyConfig,
    DEFAULT_POOL_LIMIT,
};
use super::domain::{
    ActivityEvent, AgentId, AgentProfile, Assignment, AssignmentId, AssignmentSnapshot,
    AssignmentStatus, LeadContact, LeadId, LeadProfile,
};
use super::performance::ClosedDeal;
use super::repository::{
    AgentRepository, AssignmentRepository, LeadRepository, RepositoryError, UnassignedLeadFilter,
};
use super::scoring::{ScoreCard, ScoringConfig, ScoringEngine};

/// Facade composing the activity recorder, scoring engine, capacity tracker,
/// and distribution engine over the repository seams.
pub struct LeadEngineService<L, A, S> {
    leads: Arc<L>,
    agents: Arc<A>,
    assignments: Arc<S>,
    scoring: ScoringEngine,
    distribution: DistributionEngine,
    pool_cap: usize,
}

static EVENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static ASSIGNMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_event_id() -> String {
    let id = EVENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("evt-{id:06}")
}

fn next_assignment_id() -> AssignmentId {
    let id = ASSIGNMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    AssignmentId(format!("asg-{id:06}"))
}

/// Payload accepted by the activity recorder. Contact fields only apply when
/// the event creates the lead or fills a blank.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordActivityRequest {
    pub lead_id: LeadId,
    pub kind: ActivityKind,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub contact: Option<LeadContact>,
    #[serde(default)]
    pub context: ActivityContext,
}

/// Payload accepted by the distribute operation.
#[derive(Debug, Clone, Deserialize)]
pub struct DistributionRequest {
    pub policy: PolicyConfig,
    #[serde(default)]
    pub lead_ids: Option<Vec<LeadId>>,
    #[serde(default)]
    pub agent_ids: Option<Vec<AgentId>>,
}

/// Committed batch result. `persistence_failures` lists leads whose decided
/// assignment could not be written; the batch still commits the rest.
#[derive(Debug, Clone, Serialize)]
pub struct DistributionOutcome {
    pub assignments: Vec<Assignment>,
    pub stats: DistributionStats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub persistence_failures: Vec<LeadId>,
}

/// Error raised by the lead engine facade.
#[derive(Debug, thiserror::Error)]
pub enum LeadServiceError {
    #[error("unknown lead '{0}'")]
    UnknownLead(LeadId),
    #[error("unknown assignment '{0}'")]
    UnknownAssignment(AssignmentId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Distribution(#[from] DistributionError),
}

impl<L, A, S> LeadEngineService<L, A, S>
where
    L: LeadRepository + 'static,
    A: AgentRepository + 'static,
    S: AssignmentRepository + 'static,
{
    pub fn new(leads: Arc<L>, agents: Arc<A>, assignments: Arc<S>, config: ScoringConfig) -> Self {
        Self {
            leads,
            agents,
            assignments,
            scoring: ScoringEngine::new(config),
            distribution: DistributionEngine::standard(),
            pool_cap: DEFAULT_POOL_LIMIT,
        }
    }

    pub fn with_distribution(mut self, distribution: DistributionEngine) -> Self {
        self.distribution = distribution;
        self
    }

    /// Override the fallback pool cap applied when a policy sets no
    /// per-agent maximum.
    pub fn with_pool_cap(mut self, pool_cap: usize) -> Self {
        self.pool_cap = pool_cap;
        self
    }

    /// Append a behavioral event, creating the lead on first touch, then
    /// recompute and persist the score.
    pub fn record_activity(
        &self,
        request: RecordActivityRequest,
    ) -> Result<ScoreCard, LeadServiceError> {
        let occurred_at = request.occurred_at.unwrap_or_else(Utc::now);

        let mut profile = match self.leads.fetch(&request.lead_id)? {
            Some(profile) => profile,
            None => LeadProfile::new(
                request.lead_id.clone(),
                request.contact.clone().unwrap_or_default(),
                occurred_at,
            ),
        };

        if let Some(contact) = request.contact {
            merge_contact(&mut profile.contact, contact);
        }
        if let Some(location) = &request.context.location {
            LeadProfile::note_interest(&mut profile.location_interests, location);
        }
        if let Some(property_type) = &request.context.property_type {
            LeadProfile::note_interest(&mut profile.property_type_interests, property_type);
        }

        let event = ActivityEvent::record(
            next_event_id(),
            request.lead_id.clone(),
            request.kind,
            occurred_at,
            request.context,
        );
        self.leads.append_activity(event)?;

        self.rescore(&mut profile, Utc::now())
    }

    /// Recompute and persist one lead's score from its full history.
    pub fn update_score(&self, lead_id: &LeadId) -> Result<ScoreCard, LeadServiceError> {
        let mut profile = self
            .leads
            .fetch(lead_id)?
            .ok_or_else(|| LeadServiceError::UnknownLead(lead_id.clone()))?;
        self.rescore(&mut profile, Utc::now())
    }

    /// Score, grade, and breakdown without persisting anything.
    pub fn get_score(&self, lead_id: &LeadId) -> Result<ScoreCard, LeadServiceError> {
        if self.leads.fetch(lead_id)?.is_none() {
            return Err(LeadServiceError::UnknownLead(lead_id.clone()));
        }
        let history = self.leads.activity_for(lead_id)?;
        Ok(self.scoring.score_card(lead_id, &history, Utc::now()))
    }

    fn rescore(
        &self,
        profile: &mut LeadProfile,
        as_of: DateTime<Utc>,
    ) -> Result<ScoreCard, LeadServiceError> {
        let history = self.leads.activity_for(&profile.id)?;
        let update = self.scoring.evaluate(&profile.id, &history, as_of);

        profile.score = update.card.score;
        profile.grade = update.card.grade;
        profile.serious_buyer = update.serious_buyer;
        profile.budget_estimate = update.budget_estimate;
        profile.engagement = update.counters;
        profile.last_activity_at = update.last_activity_at;

        self.leads.upsert(profile.clone())?;
        Ok(update.card)
    }

    /// Run one distribution batch: resolve pools, plan placements, persist
    /// assignments best-effort, and advance the capacity tracker.
    pub fn distribute(
        &self,
        request: DistributionRequest,
    ) -> Result<DistributionOutcome, LeadServiceError> {
        request.policy.validate()?;

        let agents = {
            let pool = self.agents.find_active(&[])?;
            match &request.agent_ids {
                Some(ids) => pool
                    .into_iter()
                    .filter(|agent| ids.contains(&agent.id))
                    .collect(),
                None => pool,
            }
        };
        if agents.is_empty() {
            return Err(DistributionError::NoAgentsAvailable.into());
        }

        let leads = match &request.lead_ids {
            Some(ids) => {
                // Explicit pools still honor the one-active-assignment rule,
                // and a lead listed twice enters the batch once.
                let mut seen = std::collections::HashSet::new();
                let mut pool = Vec::new();
                for lead in self.leads.find_by_ids(ids)? {
                    if !seen.insert(lead.id.clone()) {
                        continue;
                    }
                    if self.assignments.active_for_lead(&lead.id)?.is_none() {
                        pool.push(lead);
                    }
                }
                pool
            }
            None => self.leads.find_unassigned(&UnassignedLeadFilter {
                min_score: request.policy.min_lead_score,
                serious_buyers_only: request.policy.prioritize_high_scorers,
                limit: pool_limit(&request.policy, agents.len(), self.pool_cap),
            })?,
        };

        let plan = self.distribution.plan(&request.policy, leads.clone(), agents.clone())?;

        let lead_index: HashMap<&LeadId, &LeadProfile> =
            leads.iter().map(|lead| (&lead.id, lead)).collect();
        let mut working_load: HashMap<&AgentId, u32> = agents
            .iter()
            .map(|agent| (&agent.id, agent.current_load))
            .collect();
        let agent_index: HashMap<&AgentId, &AgentProfile> =
            agents.iter().map(|agent| (&agent.id, agent)).collect();

        let assigned_at = Utc::now();
        let mut committed = Vec::new();
        let mut persistence_failures = Vec::new();

        for placement in &plan.placements {
            let (Some(lead), Some(agent)) = (
                lead_index.get(&placement.lead_id),
                agent_index.get(&placement.agent_id),
            ) else {
                continue;
            };

            let load_entry = working_load.entry(&agent.id).or_default();
            let snapshot = AssignmentSnapshot {
                lead_score: lead.score,
                lead_grade: lead.grade,
                agent_load: *load_entry,
                agent_success_rate: agent.success_rate,
            };
            *load_entry += 1;

            let assignment = Assignment {
                id: next_assignment_id(),
                lead_id: placement.lead_id.clone(),
                agent_id: placement.agent_id.clone(),
                assigned_at,
                status: AssignmentStatus::Active,
                reason: placement.reason.clone(),
                snapshot,
                resolved_at: None,
            };

            match self.assignments.create(assignment) {
                Ok(stored) => {
                    if let Err(err) = self.agents.record_assignment(&stored.agent_id, assigned_at)
                    {
                        warn!(
                            agent = %stored.agent_id.0,
                            error = %err,
                            "capacity tracker update failed after assignment write"
                        );
                    }
                    committed.push(stored);
                }
                Err(err) => {
                    warn!(
                        lead = %placement.lead_id.0,
                        agent = %placement.agent_id.0,
                        error = %err,
                        "assignment write failed, continuing batch"
                    );
                    persistence_failures.push(placement.lead_id.clone());
                }
            }
        }

        let stats = DistributionStats {
            total_leads: plan.total_leads,
            assigned_leads: committed.len(),
            failed_assignments: plan.total_leads.saturating_sub(committed.len()),
            policy_used: plan.policy_label.to_string(),
        };

        Ok(DistributionOutcome {
            assignments: committed,
            stats,
            persistence_failures,
        })
    }

    /// Tracker hook for the external sales workflow closing a deal.
    pub fn complete_assignment(
        &self,
        id: &AssignmentId,
        completed_at: DateTime<Utc>,
    ) -> Result<Assignment, LeadServiceError> {
        let assignment = self
            .assignments
            .resolve(id, AssignmentStatus::Completed, completed_at)
            .map_err(|err| match err {
                RepositoryError::NotFound => LeadServiceError::UnknownAssignment(id.clone()),
                other => LeadServiceError::Repository(other),
            })?;

        self.agents.record_completion(
            &assignment.agent_id,
            ClosedDeal {
                assigned_at: assignment.assigned_at,
                completed_at,
            },
        )?;
        Ok(assignment)
    }

    /// Tracker hook for an assignment abandoned without a sale.
    pub fn cancel_assignment(
        &self,
        id: &AssignmentId,
        cancelled_at: DateTime<Utc>,
    ) -> Result<Assignment, LeadServiceError> {
        let assignment = self
            .assignments
            .resolve(id, AssignmentStatus::Cancelled, cancelled_at)
            .map_err(|err| match err {
                RepositoryError::NotFound => LeadServiceError::UnknownAssignment(id.clone()),
                other => LeadServiceError::Repository(other),
            })?;

        self.agents.record_cancellation(&assignment.agent_id)?;
        Ok(assignment)
    }
}

fn merge_contact(existing: &mut LeadContact, incoming: LeadContact) {
    if existing.name.is_none() {
        existing.name = incoming.name;
    }
    if existing.email.is_none() {
        existing.email = incoming.email;
    }
    if existing.phone.is_none() {
        existing.phone = incoming.phone;
    }
}
