use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use std::io::Read;

use crate::workflows::leads::activity::{ActivityContext, ActivityKind};
use crate::workflows::leads::domain::LeadContact;

pub(crate) fn parse_records<R: Read>(reader: R) -> Result<Vec<ActivityRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader.deserialize::<ActivityRow>().collect()
}

/// One row of the analytics export, before validation.
#[derive(Debug, Deserialize)]
pub(crate) struct ActivityRow {
    #[serde(rename = "Lead ID", default, deserialize_with = "empty_string_as_none")]
    lead_id: Option<String>,
    #[serde(rename = "Name", default, deserialize_with = "empty_string_as_none")]
    name: Option<String>,
    #[serde(rename = "Email", default, deserialize_with = "empty_string_as_none")]
    email: Option<String>,
    #[serde(rename = "Phone", default, deserialize_with = "empty_string_as_none")]
    phone: Option<String>,
    #[serde(rename = "Event", default, deserialize_with = "empty_string_as_none")]
    event: Option<String>,
    #[serde(rename = "Occurred At", default, deserialize_with = "empty_string_as_none")]
    occurred_at: Option<String>,
    #[serde(rename = "Property ID", default, deserialize_with = "empty_string_as_none")]
    property_id: Option<String>,
    #[serde(rename = "Listed Price", default, deserialize_with = "empty_string_as_none")]
    listed_price: Option<String>,
    #[serde(rename = "Location", default, deserialize_with = "empty_string_as_none")]
    location: Option<String>,
    #[serde(rename = "Property Type", default, deserialize_with = "empty_string_as_none")]
    property_type: Option<String>,
}

impl ActivityRow {
    pub(crate) fn lead_id(&self) -> Option<&str> {
        self.lead_id.as_deref()
    }

    pub(crate) fn kind(&self) -> Option<ActivityKind> {
        self.event.as_deref().and_then(ActivityKind::parse_label)
    }

    pub(crate) fn occurred_at(&self) -> Option<DateTime<Utc>> {
        self.occurred_at.as_deref().and_then(parse_datetime)
    }

    pub(crate) fn contact(&self) -> Option<LeadContact> {
        if self.name.is_none() && self.email.is_none() && self.phone.is_none() {
            return None;
        }
        Some(LeadContact {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        })
    }

    pub(crate) fn context(&self) -> ActivityContext {
        ActivityContext {
            property_id: self.property_id.clone(),
            listed_price: self
                .listed_price
                .as_deref()
                .and_then(|raw| raw.replace(',', "").parse::<u32>().ok()),
            location: self.location.clone(),
            property_type: self.property_type.clone(),
            note: None,
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    None
}

#[cfg(test)]
pub(crate) fn parse_datetime_for_tests(value: &str) -> Option<DateTime<Utc>> {
    parse_datetime(value)
}
