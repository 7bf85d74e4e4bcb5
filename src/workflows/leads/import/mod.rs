//! Bulk activity import from a website-analytics CSV export. Malformed rows
//! are skipped and logged; they never abort the file.

mod parser;

use std::io::Read;
use std::path::Path;

use tracing::warn;

use super::domain::LeadId;
use super::repository::{AgentRepository, AssignmentRepository, LeadRepository};
use super::service::{LeadEngineService, LeadServiceError, RecordActivityRequest};

#[derive(Debug)]
pub enum ActivityImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Service(LeadServiceError),
}

impl std::fmt::Display for ActivityImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityImportError::Io(err) => {
                write!(f, "failed to read activity export: {}", err)
            }
            ActivityImportError::Csv(err) => write!(f, "invalid activity CSV data: {}", err),
            ActivityImportError::Service(err) => {
                write!(f, "could not record imported activity: {}", err)
            }
        }
    }
}

impl std::error::Error for ActivityImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ActivityImportError::Io(err) => Some(err),
            ActivityImportError::Csv(err) => Some(err),
            ActivityImportError::Service(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ActivityImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ActivityImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<LeadServiceError> for ActivityImportError {
    fn from(err: LeadServiceError) -> Self {
        Self::Service(err)
    }
}

/// Rows recorded vs. rows skipped as malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityImportSummary {
    pub recorded: usize,
    pub skipped: usize,
}

pub struct ActivityCsvImporter;

impl ActivityCsvImporter {
    pub fn from_path<P, L, A, S>(
        path: P,
        service: &LeadEngineService<L, A, S>,
    ) -> Result<ActivityImportSummary, ActivityImportError>
    where
        P: AsRef<Path>,
        L: LeadRepository + 'static,
        A: AgentRepository + 'static,
        S: AssignmentRepository + 'static,
    {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, service)
    }

    pub fn from_reader<R, L, A, S>(
        reader: R,
        service: &LeadEngineService<L, A, S>,
    ) -> Result<ActivityImportSummary, ActivityImportError>
    where
        R: Read,
        L: LeadRepository + 'static,
        A: AgentRepository + 'static,
        S: AssignmentRepository + 'static,
    {
        let mut recorded = 0usize;
        let mut skipped = 0usize;

        for (row_number, row) in parser::parse_records(reader)?.into_iter().enumerate() {
            let line = row_number + 2; // one header row, one-based
            let Some(lead_id) = row.lead_id() else {
                warn!(line, "skipping activity row without a lead id");
                skipped += 1;
                continue;
            };
            let Some(kind) = row.kind() else {
                warn!(line, "skipping activity row with unknown event type");
                skipped += 1;
                continue;
            };
            let Some(occurred_at) = row.occurred_at() else {
                warn!(line, "skipping activity row with unparseable timestamp");
                skipped += 1;
                continue;
            };

            service.record_activity(RecordActivityRequest {
                lead_id: LeadId(lead_id.to_string()),
                kind,
                occurred_at: Some(occurred_at),
                contact: row.contact(),
                context: row.context(),
            })?;
            recorded += 1;
        }

        Ok(ActivityImportSummary { recorded, skipped })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::leads::memory::InMemoryCrmStore;
    use crate::workflows::leads::scoring::ScoringConfig;
    use chrono::{TimeZone, Utc};
    use std::io::Cursor;
    use std::sync::Arc;

    fn service() -> LeadEngineService<InMemoryCrmStore, InMemoryCrmStore, InMemoryCrmStore> {
        let store = Arc::new(InMemoryCrmStore::new());
        LeadEngineService::new(
            store.clone(),
            store.clone(),
            store,
            ScoringConfig::default(),
        )
    }

    #[test]
    fn parse_datetime_supports_rfc3339_and_date_strings() {
        let rfc = parser::parse_datetime_for_tests("2026-07-14T10:00:00Z").expect("parse rfc");
        assert_eq!(rfc, Utc.with_ymd_and_hms(2026, 7, 14, 10, 0, 0).unwrap());

        let date = parser::parse_datetime_for_tests("2026-07-30").expect("parse date");
        assert_eq!(date, Utc.with_ymd_and_hms(2026, 7, 30, 0, 0, 0).unwrap());

        assert!(parser::parse_datetime_for_tests("  ").is_none());
        assert!(parser::parse_datetime_for_tests("not-a-date").is_none());
    }

    #[test]
    fn importer_records_valid_rows_and_skips_malformed_ones() {
        let csv = "Lead ID,Name,Email,Phone,Event,Occurred At,Property ID,Listed Price,Location,Property Type\n\
lead-901,Ana Ruiz,ana@example.com,,view,2026-07-14T10:00:00Z,prop-7,325000,Riverside,condo\n\
lead-901,,,,inquiry,2026-07-14T10:10:00Z,prop-7,325000,Riverside,condo\n\
lead-901,,,,walk_in,2026-07-14T10:20:00Z,,,,\n\
,,,,view,2026-07-14T10:30:00Z,,,,\n\
lead-902,,,,view,never,,,,\n";
        let service = service();

        let summary =
            ActivityCsvImporter::from_reader(Cursor::new(csv), &service).expect("import succeeds");

        assert_eq!(summary.recorded, 2);
        assert_eq!(summary.skipped, 3);

        let card = service
            .get_score(&LeadId("lead-901".to_string()))
            .expect("imported lead is scored");
        assert!(card.score > 0);
    }

    #[test]
    fn importer_merges_contact_and_interests_onto_the_profile() {
        use crate::workflows::leads::repository::LeadRepository;

        let csv = "Lead ID,Name,Email,Phone,Event,Occurred At,Property ID,Listed Price,Location,Property Type\n\
lead-903,Joe Fox,joe@example.com,555-0100,view,2026-07-14T09:00:00Z,prop-1,\"410,000\",North Hills,house\n";
        let store = Arc::new(InMemoryCrmStore::new());
        let service = LeadEngineService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            ScoringConfig::default(),
        );

        ActivityCsvImporter::from_reader(Cursor::new(csv), &service).expect("import succeeds");

        let profile = LeadRepository::fetch(store.as_ref(), &LeadId("lead-903".to_string()))
            .expect("store reachable")
            .expect("profile created on first touch");
        assert_eq!(profile.contact.email.as_deref(), Some("joe@example.com"));
        assert_eq!(profile.location_interests, vec!["North Hills".to_string()]);
        assert_eq!(profile.property_type_interests, vec!["house".to_string()]);
        assert_eq!(profile.budget_estimate, Some(410_000));
    }

    #[test]
    fn importer_from_path_propagates_io_errors() {
        let service = service();
        let error = ActivityCsvImporter::from_path("./does-not-exist.csv", &service)
            .expect_err("expected io error");

        match error {
            ActivityImportError::Io(_) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
