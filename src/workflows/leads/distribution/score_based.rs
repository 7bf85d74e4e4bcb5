use super::policy::{AllocationRound, AllocationStrategy, Placement};
use super::roster::AgentRoster;
use crate::workflows::leads::domain::LeadProfile;

/// Score floor above which a lead is routed to proven closers.
const HIGH_SCORE_CUTOFF: u8 = 70;
/// Score floor for the load-balanced middle band.
const MID_SCORE_CUTOFF: u8 = 40;
/// Success rate a closer must clear to receive high-value leads outright.
const PROVEN_CLOSER_RATE: f32 = 20.0;

/// Routes each band of lead quality differently: high scorers to the
/// best-performing agents, the middle band by load, the rest round-robin.
pub struct ScoreBasedStrategy;

impl ScoreBasedStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ScoreBasedStrategy {
    fn default() -> Self {
        Self::new()
    }
}

/// Agent indices ranked by success rate descending, then average close time
/// ascending with unknown close times last. Computed once per batch.
fn performance_ranking(roster: &AgentRoster) -> Vec<usize> {
    let mut ranking: Vec<usize> = (0..roster.len()).collect();
    ranking.sort_by(|a, b| {
        let left = &roster.slot(*a).agent;
        let right = &roster.slot(*b).agent;
        right
            .success_rate
            .total_cmp(&left.success_rate)
            .then_with(|| {
                let left_close = left.average_close_days.unwrap_or(f32::INFINITY);
                let right_close = right.average_close_days.unwrap_or(f32::INFINITY);
                left_close.total_cmp(&right_close)
            })
    });
    ranking
}

impl AllocationStrategy for ScoreBasedStrategy {
    fn label(&self) -> &'static str {
        "score_based"
    }

    fn allocate(&self, leads: &[LeadProfile], mut roster: AgentRoster) -> AllocationRound {
        let ranking = performance_ranking(&roster);
        let mut placements = Vec::new();
        let mut rotation = 0usize;

        for lead in leads {
            if !roster.any_capacity() {
                break;
            }

            let (index, reason) = if lead.score >= HIGH_SCORE_CUTOFF {
                let proven = ranking.iter().copied().find(|candidate| {
                    roster.has_capacity(*candidate)
                        && roster.slot(*candidate).agent.success_rate > PROVEN_CLOSER_RATE
                });
                let index = match proven {
                    Some(index) => index,
                    // No proven closer free: best-ranked agent with room.
                    None => match ranking
                        .iter()
                        .copied()
                        .find(|candidate| roster.has_capacity(*candidate))
                    {
                        Some(index) => index,
                        None => break,
                    },
                };
                let rate = roster.slot(index).agent.success_rate;
                (
                    index,
                    format!("High-value lead routed by performance (success rate: {rate:.1}%)"),
                )
            } else if lead.score >= MID_SCORE_CUTOFF {
                let Some(index) = roster.least_loaded() else {
                    break;
                };
                let load = roster.slot(index).load;
                (
                    index,
                    format!("Mid-score lead balanced by load (current load: {load})"),
                )
            } else {
                // Low scorers rotate on their own cyclic index.
                let index = loop {
                    let candidate = rotation % roster.len();
                    rotation += 1;
                    if roster.has_capacity(candidate) {
                        break candidate;
                    }
                };
                (
                    index,
                    format!("Low-score lead rotated round-robin (slot {})", index + 1),
                )
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
