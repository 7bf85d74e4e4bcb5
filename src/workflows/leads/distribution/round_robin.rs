use super::policy::{AllocationRound, AllocationStrategy, Placement};
use super::roster::AgentRoster;
use crate::workflows::leads::domain::LeadProfile;

/// Cycles through the agent pool in order, one lead per agent per pass,
/// skipping agents without remaining capacity.
pub struct RoundRobinStrategy;

impl RoundRobinStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RoundRobinStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationStrategy for RoundRobinStrategy {
    fn label(&self) -> &'static str {
        "round_robin"
    }

    fn allocate(&self, leads: &[LeadProfile], mut roster: AgentRoster) -> AllocationRound {
        let mut placements = Vec::new();
        let mut cursor = 0usize;

        for lead in leads {
            if !roster.any_capacity() {
                break;
            }

            // The capacity check above guarantees this scan terminates.
            let index = loop {
                let candidate = cursor % roster.len();
                cursor += 1;
                if roster.has_capacity(candidate) {
                    break candidate;
                }
            };

            roster.assign(index);
            placements.push(Placement {
                lead_id: lead.id.clone(),
                agent_id: roster.slot(index).agent.id.clone(),
                reason: format!(
                    "Round robin rotation (slot {} of {})",
                    index + 1,
                    roster.len()
                ),
            });
        }

        AllocationRound { placements, roster }
    }
}
