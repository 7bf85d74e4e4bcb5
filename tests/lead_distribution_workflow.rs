//! Integration coverage for the lead scoring and distribution engine.
//!
//! Scenarios run end-to-end through the public service facade and HTTP router
//! so scoring, allocation, and tracker behavior are validated without
//! reaching into private modules.

mod common {
    use std::sync::Arc;

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use lead_engine::workflows::leads::{
        ActivityContext, ActivityKind, AgentId, AgentProfile, InMemoryCrmStore, LeadContact,
        LeadEngineService, LeadGrade, LeadId, LeadProfile, LeadRepository, RecordActivityRequest,
        ScoringConfig,
    };

    pub(super) type CrmService =
        LeadEngineService<InMemoryCrmStore, InMemoryCrmStore, InMemoryCrmStore>;

    pub(super) fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 10, 0, 0)
            .single()
            .expect("valid base time")
    }

    pub(super) fn build_service() -> (Arc<InMemoryCrmStore>, Arc<CrmService>) {
        let store = Arc::new(InMemoryCrmStore::new());
        let service = Arc::new(LeadEngineService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            ScoringConfig::default(),
        ));
        (store, service)
    }

    pub(super) fn agent(id: &str, territory: Option<&str>, success_rate: f32) -> AgentProfile {
        let mut profile = AgentProfile::new(AgentId(id.to_string()), id.to_string());
        profile.territory = territory.map(|name| name.to_string());
        profile.success_rate = success_rate;
        profile.total_assignments = 20;
        profile.completed_deals = (success_rate / 5.0) as u32;
        profile
    }

    pub(super) fn scored_lead(id: &str, score: u8, location: Option<&str>) -> LeadProfile {
        let mut profile = LeadProfile::new(
            LeadId(id.to_string()),
            LeadContact::default(),
            base_time() - Duration::days(14),
        );
        profile.score = score;
        profile.grade = LeadGrade::from_score(score);
        profile.last_activity_at = Some(base_time() - Duration::days(2));
        if let Some(location) = location {
            profile.location_interests.push(location.to_string());
        }
        profile
    }

    pub(super) fn seed_lead(store: &InMemoryCrmStore, profile: LeadProfile) {
        store.upsert(profile).expect("lead seeds");
    }

    pub(super) fn seed_agent(store: &InMemoryCrmStore, profile: AgentProfile) {
        store.seed_agent(profile).expect("agent seeds");
    }

    pub(super) fn touch(
        service: &CrmService,
        lead: &str,
        kind: ActivityKind,
        minutes_after_base: i64,
        price: Option<u32>,
    ) {
        service
            .record_activity(RecordActivityRequest {
                lead_id: LeadId(lead.to_string()),
                kind,
                occurred_at: Some(base_time() + Duration::minutes(minutes_after_base)),
                contact: None,
                context: ActivityContext {
                    listed_price: price,
                    ..ActivityContext::default()
                },
            })
            .expect("activity records");
    }
}

mod scoring {
    use super::common::*;
    use lead_engine::workflows::leads::{
        ActivityKind, LeadGrade, LeadId, LeadRepository, LeadServiceError,
    };

    #[test]
    fn engagement_accumulates_into_score_grade_and_flag() {
        let (store, service) = build_service();

        touch(&service, "lead-1", ActivityKind::View, 0, Some(300_000));
        touch(&service, "lead-1", ActivityKind::View, 15, Some(312_000));
        touch(&service, "lead-1", ActivityKind::Favorite, 25, Some(312_000));
        touch(&service, "lead-1", ActivityKind::Inquiry, 24 * 60, Some(305_000));
        touch(&service, "lead-1", ActivityKind::PhoneCall, 2 * 24 * 60, None);

        let card = service
            .get_score(&LeadId("lead-1".to_string()))
            .expect("lead scored");

        assert!(card.score >= LeadGrade::WARM_THRESHOLD);
        assert_eq!(card.grade, LeadGrade::from_score(card.score));
        assert_eq!(card.breakdown.len(), 9);

        let profile = store
            .fetch(&LeadId("lead-1".to_string()))
            .expect("store reachable")
            .expect("profile persisted");
        assert!(profile.serious_buyer);
        assert_eq!(profile.engagement.property_views, 2);
        assert_eq!(profile.engagement.inquiries_made, 1);
        // Average of the viewed/inquired prices: 300k, 312k, 305k.
        assert_eq!(profile.budget_estimate, Some(305_667));
    }

    #[test]
    fn unknown_leads_are_rejected() {
        let (_store, service) = build_service();
        let error = service
            .get_score(&LeadId("lead-unknown".to_string()))
            .expect_err("no such lead");
        assert!(matches!(error, LeadServiceError::UnknownLead(_)));
    }
}

mod distribution {
    use std::collections::BTreeMap;
    use std::collections::HashMap;

    use super::common::*;
    use lead_engine::workflows::leads::{
        AgentId, AgentRepository, DistributionError, DistributionRequest, LeadServiceError,
        PolicyConfig, PolicyKind,
    };

    #[test]
    fn round_robin_batch_commits_and_balances() {
        let (store, service) = build_service();
        seed_agent(&store, agent("agent-1", None, 30.0));
        seed_agent(&store, agent("agent-2", None, 20.0));
        for index in 0..6 {
            seed_lead(&store, scored_lead(&format!("lead-{index:02}"), 55, None));
        }

        let outcome = service
            .distribute(DistributionRequest {
                policy: PolicyConfig::new(PolicyKind::RoundRobin),
                lead_ids: None,
                agent_ids: None,
            })
            .expect("batch commits");

        assert_eq!(outcome.stats.total_leads, 6);
        assert_eq!(outcome.stats.assigned_leads, 6);
        assert_eq!(outcome.stats.failed_assignments, 0);

        let mut counts: HashMap<String, usize> = HashMap::new();
        for assignment in &outcome.assignments {
            *counts.entry(assignment.agent_id.0.clone()).or_default() += 1;
            assert!(!assignment.reason.is_empty());
        }
        assert_eq!(counts["agent-1"], 3);
        assert_eq!(counts["agent-2"], 3);

        let refreshed = store
            .find_active(&[])
            .expect("store reachable");
        assert!(refreshed.iter().all(|agent| agent.current_load == 3));
    }

    #[test]
    fn territory_leads_reach_their_specialists() {
        let (store, service) = build_service();
        seed_agent(&store, agent("agent-river", Some("Riverside"), 25.0));
        seed_agent(&store, agent("agent-any", None, 25.0));
        seed_lead(
            &store,
            scored_lead("lead-river", 70, Some("Riverside waterfront")),
        );
        seed_lead(&store, scored_lead("lead-elsewhere", 50, Some("Hill Country")));

        let mut policy = PolicyConfig::new(PolicyKind::TerritoryBased);
        policy.territory_mapping = BTreeMap::from([(
            "Riverside".to_string(),
            vec![AgentId("agent-river".to_string())],
        )]);

        let outcome = service
            .distribute(DistributionRequest {
                policy,
                lead_ids: None,
                agent_ids: None,
            })
            .expect("batch commits");

        let by_lead: HashMap<&str, (&str, &str)> = outcome
            .assignments
            .iter()
            .map(|assignment| {
                (
                    assignment.lead_id.0.as_str(),
                    (assignment.agent_id.0.as_str(), assignment.reason.as_str()),
                )
            })
            .collect();

        let (river_agent, river_reason) = by_lead["lead-river"];
        assert_eq!(river_agent, "agent-river");
        assert!(river_reason.contains("Territory match"));

        let (_, elsewhere_reason) = by_lead["lead-elsewhere"];
        assert!(elsewhere_reason.contains("fallback"));
    }

    #[test]
    fn empty_agent_pool_aborts_with_no_writes() {
        let (store, service) = build_service();
        seed_lead(&store, scored_lead("lead-1", 80, None));

        let error = service
            .distribute(DistributionRequest {
                policy: PolicyConfig::new(PolicyKind::ScoreBased),
                lead_ids: None,
                agent_ids: None,
            })
            .expect_err("no agents active");

        assert!(matches!(
            error,
            LeadServiceError::Distribution(DistributionError::NoAgentsAvailable)
        ));
        assert!(store.assignments().expect("store reachable").is_empty());
    }
}

mod lifecycle {
    use chrono::Duration;

    use super::common::*;
    use lead_engine::workflows::leads::{
        AgentId, AgentRepository, AssignmentStatus, DistributionError, DistributionRequest,
        LeadServiceError, PolicyConfig, PolicyKind,
    };

    #[test]
    fn completed_assignments_feed_agent_performance_and_free_the_lead_pool() {
        let (store, service) = build_service();
        seed_agent(&store, agent("agent-1", None, 0.0));
        seed_lead(&store, scored_lead("lead-1", 75, None));

        let outcome = service
            .distribute(DistributionRequest {
                policy: PolicyConfig::new(PolicyKind::LoadBalanced),
                lead_ids: None,
                agent_ids: None,
            })
            .expect("batch commits");
        let assignment = outcome.assignments[0].clone();
        assert_eq!(assignment.status, AssignmentStatus::Active);

        // While the assignment is ACTIVE the lead is out of the pool.
        let error = service
            .distribute(DistributionRequest {
                policy: PolicyConfig::new(PolicyKind::LoadBalanced),
                lead_ids: None,
                agent_ids: None,
            })
            .expect_err("pool is drained");
        assert!(matches!(
            error,
            LeadServiceError::Distribution(DistributionError::NoLeadsAvailable)
        ));

        service
            .complete_assignment(&assignment.id, assignment.assigned_at + Duration::days(6))
            .expect("completion records");

        let agent = AgentRepository::fetch(store.as_ref(), &AgentId("agent-1".to_string()))
            .expect("store reachable")
            .expect("agent present");
        assert_eq!(agent.current_load, 0);
        assert_eq!(agent.completed_deals, 1);
        assert!((agent.average_close_days.expect("derived") - 6.0).abs() < 0.01);

        // Resolution is terminal: the lead re-enters the unassigned pool.
        let second = service
            .distribute(DistributionRequest {
                policy: PolicyConfig::new(PolicyKind::LoadBalanced),
                lead_ids: None,
                agent_ids: None,
            })
            .expect("lead is assignable again");
        assert_eq!(second.stats.assigned_leads, 1);
    }
}

mod routing {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::common::*;
    use lead_engine::workflows::leads::lead_router;

    #[tokio::test]
    async fn activity_score_distribute_round_trip_over_http() {
        let (store, service) = build_service();
        seed_agent(&store, agent("agent-1", None, 30.0));
        let router = lead_router(service);

        let recorded = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/leads/activity")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::to_vec(&json!({
                            "lead_id": "lead-http",
                            "kind": "inquiry",
                            "context": { "listed_price": 340000 }
                        }))
                        .expect("serialize payload"),
                    ))
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(recorded.status(), StatusCode::ACCEPTED);

        let score = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/v1/leads/lead-http/score")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(score.status(), StatusCode::OK);

        let distributed = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/leads/distribute")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::to_vec(&json!({
                            "policy": { "kind": "load_balanced" }
                        }))
                        .expect("serialize payload"),
                    ))
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(distributed.status(), StatusCode::OK);

        let body = to_bytes(distributed.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let payload: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(
            payload
                .get("stats")
                .and_then(|stats| stats.get("assigned_leads")),
            Some(&json!(1))
        );
    }
}
