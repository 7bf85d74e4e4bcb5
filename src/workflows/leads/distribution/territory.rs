use std::collections::BTreeMap;

use super::policy::{AllocationRound, AllocationStrategy, Placement};
use super::roster::AgentRoster;
use crate::workflows::leads::domain::{AgentId, LeadProfile};

/// Routes leads to territory specialists by matching location interests
/// against the configured territory map, falling back to load balancing
/// across the whole pool when no specialist can take the lead.
pub struct TerritoryStrategy {
    mapping: BTreeMap<String, Vec<AgentId>>,
}

impl TerritoryStrategy {
    pub fn new(mapping: BTreeMap<String, Vec<AgentId>>) -> Self {
        Self { mapping }
    }

    /// First territory whose name appears, case-insensitively, inside one of
    /// the lead's location interests. Interests are scanned in the order the
    /// lead expressed them.
    fn matching_territory(&self, lead: &LeadProfile) -> Option<(&str, &[AgentId])> {
        for interest in &lead.location_interests {
            let interest = interest.to_lowercase();
            for (territory, agents) in &self.mapping {
                if interest.contains(&territory.to_lowercase()) {
                    return Some((territory.as_str(), agents.as_slice()));
                }
            }
        }
        None
    }
}

impl AllocationStrategy for TerritoryStrategy {
    fn label(&self) -> &'static str {
        "territory_based"
    }

    fn allocate(&self, leads: &[LeadProfile], mut roster: AgentRoster) -> AllocationRound {
        let mut placements = Vec::new();

        for lead in leads {
            if !roster.any_capacity() {
                break;
            }

            let specialist = self.matching_territory(lead).and_then(|(territory, ids)| {
                ids.iter()
                    .filter_map(|id| roster.position(id))
                    .filter(|index| roster.has_capacity(*index))
                    .min_by_key(|index| roster.slot(*index).load)
                    .map(|index| (territory.to_string(), index))
            });

            let (index, reason) = match specialist {
                Some((territory, index)) => {
                    let load = roster.slot(index).load;
                    (
                        index,
                        format!("Territory match '{territory}' (current load: {load})"),
                    )
                }
                None => {
                    let Some(index) = roster.least_loaded() else {
                        break;
                    };
                    let load = roster.slot(index).load;
                    (
                        index,
                        format!(
                            "No territory specialist available, load balanced fallback \
                             (current load: {load})"
                        ),
                    )
                }
            };

            roster.assign(index);
            placements.push(Placement {
                lead_id: lead.id.clone(),
                agent_id: roster.slot(index).agent.id.clone(),
                reason,
            });
        }

        AllocationRound { placements, roster }
    }
}
