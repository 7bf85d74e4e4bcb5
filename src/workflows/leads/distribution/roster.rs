use crate::workflows::leads::domain::{AgentId, AgentProfile};

/// One agent's working state inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSlot {
    pub agent: AgentProfile,
    /// Load as the batch currently sees it, seeded from `current_load` and
    /// incremented as placements are made.
    pub load: u32,
}

/// Owned working copy of the agent pool threaded through a strategy.
/// Strategies receive the roster by value and hand it back with updated
/// counters, so no decision ever observes stale load through an alias.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentRoster {
    slots: Vec<AgentSlot>,
    batch_cap: Option<u32>,
}

impl AgentRoster {
    /// Build the working copy in pool order. `batch_cap` is the policy's
    /// `max_leads_per_agent`; each agent's own `capacity_limit` also binds.
    pub fn new(agents: Vec<AgentProfile>, batch_cap: Option<u32>) -> Self {
        let slots = agents
            .into_iter()
            .map(|agent| AgentSlot {
                load: agent.current_load,
                agent,
            })
            .collect();
        Self { slots, batch_cap }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[AgentSlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> &AgentSlot {
        &self.slots[index]
    }

    pub fn position(&self, id: &AgentId) -> Option<usize> {
        self.slots.iter().position(|slot| &slot.agent.id == id)
    }

    fn effective_cap(&self, index: usize) -> Option<u32> {
        let personal = self.slots[index].agent.capacity_limit;
        match (self.batch_cap, personal) {
            (Some(batch), Some(own)) => Some(batch.min(own)),
            (Some(batch), None) => Some(batch),
            (None, own) => own,
        }
    }

    pub fn has_capacity(&self, index: usize) -> bool {
        match self.effective_cap(index) {
            Some(cap) => self.slots[index].load < cap,
            None => true,
        }
    }

    pub fn any_capacity(&self) -> bool {
        (0..self.slots.len()).any(|index| self.has_capacity(index))
    }

    /// Index of the least-loaded agent with capacity; ties keep pool order.
    pub fn least_loaded(&self) -> Option<usize> {
        (0..self.slots.len())
            .filter(|index| self.has_capacity(*index))
            .min_by_key(|index| self.slots[*index].load)
    }

    /// Record a placement. Returns the load the decision was made against.
    pub fn assign(&mut self, index: usize) -> u32 {
        let before = self.slots[index].load;
        self.slots[index].load = before + 1;
        before
    }

    /// Final per-agent loads after the strategy ran, for tracker updates.
    pub fn into_slots(self) -> Vec<AgentSlot> {
        self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::leads::domain::AgentId;

    fn agent(id: &str, load: u32, capacity: Option<u32>) -> AgentProfile {
        let mut profile = AgentProfile::new(AgentId(id.to_string()), id.to_string());
        profile.current_load = load;
        profile.capacity_limit = capacity;
        profile
    }

    #[test]
    fn least_loaded_breaks_ties_by_pool_order() {
        let roster = AgentRoster::new(
            vec![agent("a", 2, None), agent("b", 1, None), agent("c", 1, None)],
            None,
        );
        assert_eq!(roster.least_loaded(), Some(1));
    }

    #[test]
    fn tighter_of_batch_and_personal_cap_binds() {
        let mut roster = AgentRoster::new(vec![agent("a", 1, Some(2))], Some(5));
        assert!(roster.has_capacity(0));
        roster.assign(0);
        assert!(!roster.has_capacity(0));

        let roster = AgentRoster::new(vec![agent("b", 3, Some(10))], Some(3));
        assert!(!roster.has_capacity(0));
    }

    #[test]
    fn assign_reports_load_before_increment() {
        let mut roster = AgentRoster::new(vec![agent("a", 4, None)], None);
        assert_eq!(roster.assign(0), 4);
        assert_eq!(roster.slot(0).load, 5);
    }
}
