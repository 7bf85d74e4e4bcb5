//! Batch allocation of unassigned leads to agents. A batch is a single-pass,
//! deterministic computation over pools fetched up front; the engine performs
//! no I/O and callers must serialize batches, since agent load is advanced in
//! working memory across the pass.

mod load_balanced;
mod policy;
mod roster;
mod round_robin;
mod score_based;
mod territory;

pub use policy::{
    AllocationRound, AllocationStrategy, Placement, PolicyConfig, PolicyKind, StrategyRegistry,
};
pub use roster::{AgentRoster, AgentSlot};

use serde::{Deserialize, Serialize};

use super::domain::{AgentProfile, LeadProfile};

/// Lead pool cap when the policy sets no per-agent maximum.
pub const DEFAULT_POOL_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DistributionError {
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),
    #[error("no active agents available for distribution")]
    NoAgentsAvailable,
    #[error("no leads available for distribution")]
    NoLeadsAvailable,
}

/// Batch bookkeeping returned with every distribution outcome. A shortfall
/// (`failed_assignments > 0`) is expected output, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionStats {
    pub total_leads: usize,
    pub assigned_leads: usize,
    pub failed_assignments: usize,
    pub policy_used: String,
}

/// The pure result of one batch: decided placements plus the roster carrying
/// final working loads. Persistence happens above this layer.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionPlan {
    pub placements: Vec<Placement>,
    pub roster: AgentRoster,
    pub total_leads: usize,
    pub policy_label: &'static str,
}

/// Dispatches a policy over fetched pools through the strategy registry.
pub struct DistributionEngine {
    registry: StrategyRegistry,
}

impl DistributionEngine {
    pub fn standard() -> Self {
        Self {
            registry: StrategyRegistry::standard(),
        }
    }

    pub fn with_registry(registry: StrategyRegistry) -> Self {
        Self { registry }
    }

    /// Validate the policy, order the lead pool, and run the strategy.
    pub fn plan(
        &self,
        policy: &PolicyConfig,
        mut leads: Vec<LeadProfile>,
        agents: Vec<AgentProfile>,
    ) -> Result<DistributionPlan, DistributionError> {
        policy.validate()?;

        if agents.is_empty() {
            return Err(DistributionError::NoAgentsAvailable);
        }
        if leads.is_empty() {
            return Err(DistributionError::NoLeadsAvailable);
        }

        order_pool(&mut leads);

        let strategy = self.registry.resolve(policy)?;
        let roster = AgentRoster::new(agents, policy.max_leads_per_agent);
        let total_leads = leads.len();
        let round = strategy.allocate(&leads, roster);

        Ok(DistributionPlan {
            placements: round.placements,
            roster: round.roster,
            total_leads,
            policy_label: strategy.label(),
        })
    }
}

impl Default for DistributionEngine {
    fn default() -> Self {
        Self::standard()
    }
}

/// Batch order: score descending, then most recent activity first, with the
/// lead id as a deterministic final tiebreak.
pub fn order_pool(leads: &mut [LeadProfile]) {
    leads.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.last_activity_at.cmp(&a.last_activity_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Lead pool cap for a batch: `max_leads_per_agent × agents` when the policy
/// sets a per-agent maximum, otherwise the configured fallback.
pub fn pool_limit(policy: &PolicyConfig, agent_count: usize, fallback: usize) -> usize {
    policy
        .max_leads_per_agent
        .map(|per_agent| per_agent as usize * agent_count)
        .unwrap_or(fallback)
}
