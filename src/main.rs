use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use chrono::{Duration, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use lead_engine::config::AppConfig;
use lead_engine::error::AppError;
use lead_engine::telemetry;
use lead_engine::workflows::leads::{
    lead_router, ActivityContext, ActivityCsvImporter, ActivityKind, AgentId, AgentProfile,
    DistributionOutcome, DistributionRequest, InMemoryCrmStore, LeadEngineService, LeadId,
    LeadServiceError, PolicyConfig, PolicyKind, RecordActivityRequest, ScoringConfig,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

type CrmService = LeadEngineService<InMemoryCrmStore, InMemoryCrmStore, InMemoryCrmStore>;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Lead Engine",
    about = "Score and distribute real-estate sales leads from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run a demo distribution batch against seeded in-memory data
    Distribute(DistributeArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct DistributeArgs {
    /// Allocation policy for the batch
    #[arg(long, value_enum, default_value_t = PolicyArg::LoadBalanced)]
    policy: PolicyArg,
    /// Cap on new leads per agent within the batch
    #[arg(long)]
    max_leads_per_agent: Option<u32>,
    /// Only pull unassigned leads at or above this score
    #[arg(long)]
    min_lead_score: Option<u8>,
    /// Restrict the pool to serious buyers
    #[arg(long)]
    serious_only: bool,
    /// Optional activity CSV export to hydrate the lead pool
    #[arg(long)]
    activity_csv: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum PolicyArg {
    RoundRobin,
    LoadBalanced,
    ScoreBased,
    TerritoryBased,
}

impl PolicyArg {
    fn kind(self) -> PolicyKind {
        match self {
            PolicyArg::RoundRobin => PolicyKind::RoundRobin,
            PolicyArg::LoadBalanced => PolicyKind::LoadBalanced,
            PolicyArg::ScoreBased => PolicyKind::ScoreBased,
            PolicyArg::TerritoryBased => PolicyKind::TerritoryBased,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Distribute(args) => run_distribute_demo(args),
    }
}

fn build_service(pool_cap: Option<usize>) -> (Arc<InMemoryCrmStore>, Arc<CrmService>) {
    let store = Arc::new(InMemoryCrmStore::new());
    let mut service = LeadEngineService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        ScoringConfig::default(),
    );
    if let Some(cap) = pool_cap {
        service = service.with_pool_cap(cap);
    }
    (store, Arc::new(service))
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let (_store, service) = build_service(Some(config.engine.pool_limit));

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(lead_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "lead engine ready");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

fn run_distribute_demo(args: DistributeArgs) -> Result<(), AppError> {
    let DistributeArgs {
        policy,
        max_leads_per_agent,
        min_lead_score,
        serious_only,
        activity_csv,
    } = args;

    let (store, service) = build_service(None);
    let agents = demo_agents();
    for agent in &agents {
        store
            .seed_agent(agent.clone())
            .map_err(LeadServiceError::from)?;
    }

    println!("Lead distribution demo");
    match activity_csv {
        Some(path) => {
            let summary = ActivityCsvImporter::from_path(path, service.as_ref())?;
            println!(
                "Lead pool: imported activity CSV ({} recorded, {} skipped)",
                summary.recorded, summary.skipped
            );
        }
        None => {
            seed_demo_activity(service.as_ref())?;
            println!("Lead pool: seeded demo activity (no CSV provided)");
        }
    }

    let config = demo_policy(policy, max_leads_per_agent, min_lead_score, serious_only, &agents);
    let outcome = service.distribute(DistributionRequest {
        policy: config,
        lead_ids: None,
        agent_ids: None,
    })?;

    render_outcome(&outcome);
    Ok(())
}

fn demo_agents() -> Vec<AgentProfile> {
    let mut ortiz = AgentProfile::new(AgentId("agent-ortiz".to_string()), "Marisol Ortiz");
    ortiz.territory = Some("Riverside".to_string());
    ortiz.total_assignments = 48;
    ortiz.completed_deals = 18;
    ortiz.success_rate = 37.5;
    ortiz.average_close_days = Some(11.0);

    let mut bennett = AgentProfile::new(AgentId("agent-bennett".to_string()), "Cal Bennett");
    bennett.territory = Some("Lakeshore".to_string());
    bennett.total_assignments = 30;
    bennett.completed_deals = 7;
    bennett.success_rate = 23.3;
    bennett.average_close_days = Some(16.5);

    let mut kim = AgentProfile::new(AgentId("agent-kim".to_string()), "Hana Kim");
    kim.total_assignments = 6;
    kim.completed_deals = 1;
    kim.success_rate = 16.7;

    vec![ortiz, bennett, kim]
}

fn demo_policy(
    policy: PolicyArg,
    max_leads_per_agent: Option<u32>,
    min_lead_score: Option<u8>,
    serious_only: bool,
    agents: &[AgentProfile],
) -> PolicyConfig {
    let mut config = PolicyConfig::new(policy.kind());
    config.max_leads_per_agent = max_leads_per_agent;
    config.min_lead_score = min_lead_score;
    config.prioritize_high_scorers = serious_only;

    if policy == PolicyArg::TerritoryBased {
        let mut mapping: BTreeMap<String, Vec<AgentId>> = BTreeMap::new();
        for agent in agents {
            if let Some(territory) = &agent.territory {
                mapping
                    .entry(territory.clone())
                    .or_default()
                    .push(agent.id.clone());
            }
        }
        config.territory_mapping = mapping;
    }

    config
}

fn seed_demo_activity(service: &CrmService) -> Result<(), AppError> {
    let now = Utc::now();
    let scripted: &[(&str, ActivityKind, i64, Option<u32>, Option<&str>)] = &[
        ("lead-101", ActivityKind::View, 9 * 24 * 60, Some(315_000), Some("Riverside")),
        ("lead-101", ActivityKind::View, 8 * 24 * 60, Some(329_000), Some("Riverside")),
        ("lead-101", ActivityKind::Inquiry, 2 * 24 * 60, Some(325_000), Some("Riverside")),
        ("lead-101", ActivityKind::PhoneCall, 24 * 60, None, None),
        ("lead-102", ActivityKind::Search, 6 * 24 * 60, None, None),
        ("lead-102", ActivityKind::View, 5 * 24 * 60, Some(410_000), Some("Lakeshore")),
        ("lead-102", ActivityKind::Favorite, 5 * 24 * 60 - 10, Some(410_000), Some("Lakeshore")),
        ("lead-102", ActivityKind::ContactForm, 3 * 24 * 60, None, None),
        ("lead-103", ActivityKind::View, 4 * 24 * 60, Some(270_000), Some("North Hills")),
        ("lead-103", ActivityKind::EmailOpen, 2 * 24 * 60, None, None),
        ("lead-104", ActivityKind::View, 20 * 24 * 60, Some(520_000), None),
        ("lead-105", ActivityKind::BrochureDownload, 60, Some(298_000), Some("Riverside")),
        ("lead-105", ActivityKind::View, 45, Some(298_000), Some("Riverside")),
    ];

    for (lead, kind, minutes_ago, price, location) in scripted {
        service.record_activity(RecordActivityRequest {
            lead_id: LeadId(lead.to_string()),
            kind: *kind,
            occurred_at: Some(now - Duration::minutes(*minutes_ago)),
            contact: None,
            context: ActivityContext {
                listed_price: *price,
                location: location.map(|name| name.to_string()),
                ..ActivityContext::default()
            },
        })?;
    }

    Ok(())
}

fn render_outcome(outcome: &DistributionOutcome) {
    println!("\nPolicy: {}", outcome.stats.policy_used);
    println!(
        "Batch: {} lead(s), {} assigned, {} unplaced",
        outcome.stats.total_leads, outcome.stats.assigned_leads, outcome.stats.failed_assignments
    );

    if outcome.assignments.is_empty() {
        println!("\nAssignments: none");
    } else {
        println!("\nAssignments");
        for assignment in &outcome.assignments {
            println!(
                "- {} -> {} | score {} ({}) | {}",
                assignment.lead_id.0,
                assignment.agent_id.0,
                assignment.snapshot.lead_score,
                assignment.snapshot.lead_grade.label(),
                assignment.reason
            );
        }
    }

    if !outcome.persistence_failures.is_empty() {
        println!("\nFailed to persist");
        for lead in &outcome.persistence_failures {
            println!("- {}", lead.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_policy_builds_territory_mapping_from_agents() {
        let agents = demo_agents();
        let config = demo_policy(PolicyArg::TerritoryBased, Some(3), None, false, &agents);

        assert_eq!(config.kind, PolicyKind::TerritoryBased);
        assert_eq!(
            config.territory_mapping.get("Riverside"),
            Some(&vec![AgentId("agent-ortiz".to_string())])
        );
        assert_eq!(
            config.territory_mapping.get("Lakeshore"),
            Some(&vec![AgentId("agent-bennett".to_string())])
        );
        assert!(!config.territory_mapping.contains_key(""));
    }

    #[test]
    fn demo_batch_assigns_every_seeded_lead() {
        let (store, service) = build_service(None);
        for agent in demo_agents() {
            store.seed_agent(agent).expect("agent seeds");
        }
        seed_demo_activity(service.as_ref()).expect("activity seeds");

        let config = demo_policy(PolicyArg::ScoreBased, None, None, false, &demo_agents());
        let outcome = service
            .distribute(DistributionRequest {
                policy: config,
                lead_ids: None,
                agent_ids: None,
            })
            .expect("batch commits");

        assert_eq!(outcome.stats.total_leads, 5);
        assert_eq!(outcome.stats.assigned_leads, 5);
        assert!(outcome
            .assignments
            .iter()
            .all(|assignment| !assignment.reason.is_empty()));
    }
}
