use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ActivityEvent, LeadId};

/// Behavioral event types the recorder accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    View,
    Inquiry,
    ContactForm,
    Favorite,
    Search,
    ReturnVisit,
    PhoneCall,
    EmailOpen,
    BrochureDownload,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 9] = [
        ActivityKind::View,
        ActivityKind::Inquiry,
        ActivityKind::ContactForm,
        ActivityKind::Favorite,
        ActivityKind::Search,
        ActivityKind::ReturnVisit,
        ActivityKind::PhoneCall,
        ActivityKind::EmailOpen,
        ActivityKind::BrochureDownload,
    ];

    /// Fixed point weight per event type.
    pub const fn weight(self) -> u32 {
        match self {
            ActivityKind::View => 2,
            ActivityKind::Inquiry => 15,
            ActivityKind::ContactForm => 20,
            ActivityKind::Favorite => 5,
            ActivityKind::Search => 1,
            ActivityKind::ReturnVisit => 8,
            ActivityKind::PhoneCall => 25,
            ActivityKind::EmailOpen => 3,
            ActivityKind::BrochureDownload => 10,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            ActivityKind::View => "view",
            ActivityKind::Inquiry => "inquiry",
            ActivityKind::ContactForm => "contact_form",
            ActivityKind::Favorite => "favorite",
            ActivityKind::Search => "search",
            ActivityKind::ReturnVisit => "return_visit",
            ActivityKind::PhoneCall => "phone_call",
            ActivityKind::EmailOpen => "email_open",
            ActivityKind::BrochureDownload => "brochure_download",
        }
    }

    /// Case-insensitive lookup used by the CSV importer.
    pub fn parse_label(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.label() == normalized)
    }
}

/// Optional context recorded with an event. Property price and location feed
/// the budget-match component and the territory policy respectively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listed_price: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ActivityEvent {
    /// Build an event with its points taken from the weight table. Events are
    /// immutable once constructed; corrections are new events.
    pub fn record(
        id: String,
        lead_id: LeadId,
        kind: ActivityKind,
        occurred_at: DateTime<Utc>,
        context: ActivityContext,
    ) -> Self {
        Self {
            id,
            lead_id,
            kind,
            occurred_at,
            points: kind.weight(),
            context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_table_matches_recorded_points() {
        for kind in ActivityKind::ALL {
            let event = ActivityEvent::record(
                "evt-000001".to_string(),
                LeadId("lead-1".to_string()),
                kind,
                chrono::Utc::now(),
                ActivityContext::default(),
            );
            assert_eq!(event.points, kind.weight());
        }
    }

    #[test]
    fn parse_label_round_trips_and_ignores_case() {
        for kind in ActivityKind::ALL {
            assert_eq!(ActivityKind::parse_label(kind.label()), Some(kind));
        }
        assert_eq!(
            ActivityKind::parse_label(" PHONE_CALL "),
            Some(ActivityKind::PhoneCall)
        );
        assert_eq!(ActivityKind::parse_label("walk_in"), None);
    }
}
