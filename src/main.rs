use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use taskmatch::config::AppConfig;
use taskmatch::error::AppError;
use taskmatch::marketplace::{
    marketplace_router, rank_applications, roster::seed_store, ApplicantRosterImporter,
    InMemoryStore, RankedApplicant, ScoringPolicy, SelectionService, Task, TaskId, TaskStatus,
};
use taskmatch::telemetry;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Task Marketplace Matcher",
    about = "Rank and select applicants for community marketplace tasks",
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
    /// Rank an applicant roster CSV without starting the service
    Rank(RankArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
    /// Seed the in-memory store from an applicant roster CSV
    #[arg(long)]
    roster: Option<PathBuf>,
    /// Target budget for the seeded task
    #[arg(long)]
    budget: Option<f64>,
}

#[derive(Args, Debug)]
struct RankArgs {
    /// Applicant roster CSV export
    #[arg(long)]
    roster: PathBuf,
    /// Target budget the bids are measured against
    #[arg(long)]
    budget: Option<f64>,
    /// Print the per-factor score breakdown for each applicant
    #[arg(long)]
    breakdown: bool,
}

const SEED_TASK_ID: &str = "roster-task";

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
        Command::Rank(args) => run_rank(args),
    }
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

    let store = Arc::new(InMemoryStore::default());
    if let Some(path) = args.roster.take() {
        let task = seed_task(args.budget);
        let entries = ApplicantRosterImporter::from_path(path, &task.id)?;
        info!(task = SEED_TASK_ID, applications = entries.len(), "seeded store from roster");
        seed_store(store.as_ref(), task, entries);
    }

    let service = Arc::new(SelectionService::new(store, ScoringPolicy::default()));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(marketplace_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "task marketplace matcher ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_rank(args: RankArgs) -> Result<(), AppError> {
    let RankArgs {
        roster,
        budget,
        breakdown,
    } = args;

    let task = seed_task(budget);
    let entries = ApplicantRosterImporter::from_path(roster, &task.id)?;
    let entries = entries
        .into_iter()
        .map(|entry| (entry.application, entry.profile))
        .collect();

    let ranked = rank_applications(&task, entries, &ScoringPolicy::default());
    render_ranking(&task, &ranked, breakdown);
    Ok(())
}

fn seed_task(budget: Option<f64>) -> Task {
    Task {
        id: TaskId(SEED_TASK_ID.to_string()),
        title: "Imported applicant roster".to_string(),
        cost: budget,
        status: TaskStatus::Todo,
        assigned_to: None,
    }
}

fn render_ranking(task: &Task, ranked: &[RankedApplicant], breakdown: bool) {
    match task.cost {
        Some(cost) => println!(
            "Applicant ranking ({} application(s), budget {:.2})",
            ranked.len(),
            cost
        ),
        None => println!(
            "Applicant ranking ({} application(s), no budget set)",
            ranked.len()
        ),
    }

    for (position, entry) in ranked.iter().enumerate() {
        let bid = match entry.application.bid_amount {
            Some(bid) => format!("bid {bid:.2}"),
            None => "no bid".to_string(),
        };
        let rating = match entry.profile.as_ref().and_then(|p| p.average_rating()) {
            Some(average) => format!(
                "rating {:.2} ({})",
                average,
                entry.profile.as_ref().map(|p| p.rating_count).unwrap_or(0)
            ),
            None => "no rating history".to_string(),
        };

        println!(
            "{:>2}. {} | applicant {} | score {:.1} | {} | {}",
            position + 1,
            entry.application.id.0,
            entry.application.applicant_id.0,
            entry.score.total,
            bid,
            rating
        );

        if breakdown {
            for component in &entry.score.components {
                println!("      {:+.1}  {}", component.delta, component.notes);
            }
        }
    }
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
