use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json};
use axum_prometheus::PrometheusMetricLayer;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::info;

use eleitoral::config::AppConfig;
use eleitoral::error::AppError;
use eleitoral::infra::{
    AppState, InMemoryComplaintRepository, InMemoryContestRepository, InMemoryDocumentStore,
    LoggingNotificationPublisher,
};
use eleitoral::telemetry;
use eleitoral::workflows::disputes::{
    dispute_router, DeadlineRules, DeadlineWindow, DisputeService, SystemClock,
};

#[derive(Parser, Debug)]
#[command(
    name = "Electoral Dispute Service",
    about = "Run the electoral dispute workflow service from the command line",
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
    /// Print the statutory deadline schedule for a case filed at a given date
    Deadlines(DeadlineArgs),
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
struct DeadlineArgs {
    /// Filing date (YYYY-MM-DD); defaults to today
    #[arg(long, value_parser = parse_date)]
    filed: Option<NaiveDate>,
    /// Show the result-contest windows instead of the complaint ones
    #[arg(long)]
    contest: bool,
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
        Command::Deadlines(args) => run_deadline_preview(args),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
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
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let service = Arc::new(DisputeService::new(
        Arc::new(InMemoryComplaintRepository::default()),
        Arc::new(InMemoryContestRepository::default()),
        Arc::new(LoggingNotificationPublisher),
        Arc::new(InMemoryDocumentStore::default()),
        Arc::new(SystemClock),
        config.deadlines.rules(),
    ));

    let app = dispute_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "electoral dispute service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_deadline_preview(args: DeadlineArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let rules = config.deadlines.rules();

    let filed = args
        .filed
        .unwrap_or_else(|| Utc::now().date_naive())
        .and_time(chrono::NaiveTime::MIN)
        .and_utc();

    let process = if args.contest {
        "result contest"
    } else {
        "complaint"
    };
    println!("Deadline schedule for a {process} filed {}", filed.date());

    for (window, due) in deadline_schedule(&rules, filed, args.contest) {
        println!(
            "- {}: {} days, due {}",
            window.label(),
            rules.days_for(window),
            due.date()
        );
    }

    Ok(())
}

/// Window sequence with due dates chained the way the process actually runs:
/// each window counts from the end of the previous one.
fn deadline_schedule(
    rules: &DeadlineRules,
    filed: DateTime<Utc>,
    contest: bool,
) -> Vec<(DeadlineWindow, DateTime<Utc>)> {
    let windows: &[DeadlineWindow] = if contest {
        &[
            DeadlineWindow::Allegations,
            DeadlineWindow::Recourse,
            DeadlineWindow::CounterAllegations,
        ]
    } else {
        &[
            DeadlineWindow::Defense,
            DeadlineWindow::Evidence,
            DeadlineWindow::FinalAllegations,
            DeadlineWindow::Appeal,
        ]
    };

    let mut reference = filed;
    windows
        .iter()
        .map(|&window| {
            let due = rules.due_date(window, reference);
            reference = due;
            (window, due)
        })
        .collect()
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
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

async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complaint_schedule_chains_windows() {
        let rules = DeadlineRules::statutory();
        let filed = NaiveDate::from_ymd_opt(2026, 3, 2)
            .expect("valid date")
            .and_time(chrono::NaiveTime::MIN)
            .and_utc();

        let schedule = deadline_schedule(&rules, filed, false);

        assert_eq!(schedule.len(), 4);
        assert_eq!(schedule[0].0, DeadlineWindow::Defense);
        assert_eq!(
            schedule[0].1,
            rules.due_date(DeadlineWindow::Defense, filed)
        );
        // Each subsequent window counts from the previous due date.
        assert_eq!(
            schedule[1].1,
            rules.due_date(DeadlineWindow::Evidence, schedule[0].1)
        );
    }

    #[test]
    fn contest_schedule_uses_contest_windows() {
        let rules = DeadlineRules::statutory();
        let filed = NaiveDate::from_ymd_opt(2026, 3, 2)
            .expect("valid date")
            .and_time(chrono::NaiveTime::MIN)
            .and_utc();

        let schedule = deadline_schedule(&rules, filed, true);

        assert_eq!(schedule.len(), 3);
        assert_eq!(schedule[0].0, DeadlineWindow::Allegations);
    }
}
