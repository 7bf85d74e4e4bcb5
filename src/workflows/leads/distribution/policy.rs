use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::load_balanced::LoadBalancedStrategy;
use super::round_robin::RoundRobinStrategy;
use super::roster::AgentRoster;
use super::score_based::ScoreBasedStrategy;
use super::territory::TerritoryStrategy;
use super::DistributionError;
use crate::workflows::leads::domain::{AgentId, LeadId, LeadProfile};

/// The built-in allocation policies.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    RoundRobin,
    LoadBalanced,
    ScoreBased,
    TerritoryBased,
}

impl PolicyKind {
    pub const fn label(self) -> &'static str {
        match self {
            PolicyKind::RoundRobin => "round_robin",
            PolicyKind::LoadBalanced => "load_balanced",
            PolicyKind::ScoreBased => "score_based",
            PolicyKind::TerritoryBased => "territory_based",
        }
    }
}

/// Wire-level policy configuration accepted by the distribute operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub kind: PolicyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_leads_per_agent: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_lead_score: Option<u8>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub territory_mapping: BTreeMap<String, Vec<AgentId>>,
    #[serde(default)]
    pub prioritize_high_scorers: bool,
}

impl PolicyConfig {
    pub fn new(kind: PolicyKind) -> Self {
        Self {
            kind,
            max_leads_per_agent: None,
            min_lead_score: None,
            territory_mapping: BTreeMap::new(),
            prioritize_high_scorers: false,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), DistributionError> {
        if self.max_leads_per_agent == Some(0) {
            return Err(DistributionError::InvalidPolicy(
                "max_leads_per_agent must be at least 1 when set".to_string(),
            ));
        }
        if matches!(self.min_lead_score, Some(score) if score > 100) {
            return Err(DistributionError::InvalidPolicy(
                "min_lead_score cannot exceed 100".to_string(),
            ));
        }
        if self.kind == PolicyKind::TerritoryBased && self.territory_mapping.is_empty() {
            return Err(DistributionError::InvalidPolicy(
                "territory_based requires a territory mapping".to_string(),
            ));
        }
        Ok(())
    }
}

/// One decided placement, justification included.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub lead_id: LeadId,
    pub agent_id: AgentId,
    pub reason: String,
}

/// A strategy's output: the placements plus the roster it threaded through,
/// carrying the final working loads.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationRound {
    pub placements: Vec<Placement>,
    pub roster: AgentRoster,
}

/// Pluggable allocation algorithm. Implementations never perform I/O; they
/// see an ordered lead list and an owned roster and decide placements.
pub trait AllocationStrategy: Send + Sync {
    fn label(&self) -> &'static str;
    fn allocate(&self, leads: &[LeadProfile], roster: AgentRoster) -> AllocationRound;
}

type StrategyBuilder = fn(&PolicyConfig) -> Box<dyn AllocationStrategy>;

/// Maps policy kinds to strategy constructors so new policies plug in
/// without touching the dispatcher.
pub struct StrategyRegistry {
    builders: BTreeMap<PolicyKind, StrategyBuilder>,
}

impl StrategyRegistry {
    pub fn empty() -> Self {
        Self {
            builders: BTreeMap::new(),
        }
    }

    /// Registry with the four built-in policies.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(PolicyKind::RoundRobin, |_| {
            Box::new(RoundRobinStrategy::new())
        });
        registry.register(PolicyKind::LoadBalanced, |_| {
            Box::new(LoadBalancedStrategy::new())
        });
        registry.register(PolicyKind::ScoreBased, |_| {
            Box::new(ScoreBasedStrategy::new())
        });
        registry.register(PolicyKind::TerritoryBased, |config| {
            Box::new(TerritoryStrategy::new(config.territory_mapping.clone()))
        });
        registry
    }

    pub fn register(&mut self, kind: PolicyKind, builder: StrategyBuilder) {
        self.builders.insert(kind, builder);
    }

    pub fn resolve(
        &self,
        config: &PolicyConfig,
    ) -> Result<Box<dyn AllocationStrategy>, DistributionError> {
        match self.builders.get(&config.kind) {
            Some(builder) => Ok(builder(config)),
            None => Err(DistributionError::InvalidPolicy(format!(
                "no strategy registered for policy '{}'",
                config.kind.label()
            ))),
        }
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
