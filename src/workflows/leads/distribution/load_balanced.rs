use super::policy::{AllocationRound, AllocationStrategy, Placement};
use super::roster::AgentRoster;
use crate::workflows::leads::domain::LeadProfile;

/// Always hands the next lead to the eligible agent carrying the lowest
/// working load at that instant; ties keep pool order.
pub struct LoadBalancedStrategy;

impl LoadBalancedStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LoadBalancedStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationStrategy for LoadBalancedStrategy {
    fn label(&self) -> &'static str {
        "load_balanced"
    }

    fn allocate(&self, leads: &[LeadProfile], mut roster: AgentRoster) -> AllocationRound {
        let mut placements = Vec::new();

        for lead in leads {
            let Some(index) = roster.least_loaded() else {
                break;
            };

            let load = roster.assign(index);
            placements.push(Placement {
                lead_id: lead.id.clone(),
                agent_id: roster.slot(index).agent.id.clone(),
                reason: format!("Load balanced assignment (current load: {load})"),
            });
        }

        AllocationRound { placements, roster }
    }
}
