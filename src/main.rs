use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use scholarflow::config::AppConfig;
use scholarflow::error::AppError;
use scholarflow::telemetry;
use scholarflow::workflows::scholarships::applications::{
    application_router, composite_score, evaluate, ApplicantProfile, ApplicationLifecycleService,
    EligibilityCriteria, Scholarship,
};
use scholarflow::workflows::scholarships::documents::{
    document_router, DocumentVerificationService,
};
use scholarflow::workflows::scholarships::identity::UserId;
use scholarflow::workflows::scholarships::memory::{
    InMemoryApplicationStore, InMemoryDirectory, InMemoryDocumentStore, LogNotificationSink,
};
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "scholarflow",
    about = "Run the scholarship portal service or screen a profile from the command line",
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
    /// Evaluate eligibility and the projected ranking score offline
    Screen(ScreenArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
    /// JSON file of scholarships and applicant profiles to load at startup
    #[arg(long)]
    seed: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ScreenArgs {
    /// JSON file containing an applicant profile and scholarship criteria
    #[arg(long)]
    input: PathBuf,
}

/// Startup data for the in-memory directory.
#[derive(Debug, Default, Deserialize)]
struct SeedFile {
    #[serde(default)]
    scholarships: Vec<Scholarship>,
    #[serde(default)]
    students: Vec<SeedStudent>,
}

#[derive(Debug, Deserialize)]
struct SeedStudent {
    id: UserId,
    profile: ApplicantProfile,
}

/// Input for the offline screening command.
#[derive(Debug, Deserialize)]
struct ScreenInput {
    profile: ApplicantProfile,
    criteria: EligibilityCriteria,
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
        Command::Screen(args) => run_screen(args),
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

    let store = Arc::new(InMemoryApplicationStore::default());
    let directory = Arc::new(InMemoryDirectory::default());
    let documents = Arc::new(InMemoryDocumentStore::default());
    let sink = Arc::new(LogNotificationSink);

    if let Some(path) = args.seed.take().or_else(|| config.seed_file.take()) {
        let seed: SeedFile = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        info!(
            scholarships = seed.scholarships.len(),
            students = seed.students.len(),
            "seeding portal directory"
        );
        for scholarship in seed.scholarships {
            directory
                .upsert_scholarship(scholarship)
                .map_err(|err| AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, err)))?;
        }
        for student in seed.students {
            directory
                .upsert_profile(student.id, student.profile)
                .map_err(|err| AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, err)))?;
        }
    }

    let lifecycle = Arc::new(ApplicationLifecycleService::new(
        store,
        directory,
        sink.clone(),
    ));
    let verification = Arc::new(DocumentVerificationService::new(documents, sink));

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
        .merge(application_router(lifecycle))
        .merge(document_router(verification))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "scholarship portal ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_screen(args: ScreenArgs) -> Result<(), AppError> {
    let input: ScreenInput = serde_json::from_str(&std::fs::read_to_string(args.input)?)?;

    let report = evaluate(&input.profile, &input.criteria);
    let score = composite_score(&input.profile, &input.criteria);

    println!("Eligibility screening");
    if report.is_eligible {
        println!("Verdict: eligible");
    } else {
        println!("Verdict: not eligible");
        for reason in &report.reasons {
            println!("- {reason}");
        }
    }
    println!("Projected ranking score: {score}/100");

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_files_parse_with_partial_sections() {
        let raw = r#"{
            "scholarships": [{
                "id": "sch-stem",
                "title": "STEM Excellence Scholarship",
                "provider": "prov-1",
                "criteria": { "min_gpa": 3.5, "max_income": 80000 },
                "required_documents": ["Transcript", "Income Certificate"]
            }]
        }"#;

        let seed: SeedFile = serde_json::from_str(raw).expect("seed parses");
        assert_eq!(seed.scholarships.len(), 1);
        assert!(seed.students.is_empty());
        assert_eq!(seed.scholarships[0].criteria.min_gpa, 3.5);
        assert_eq!(seed.scholarships[0].required_documents.len(), 2);
    }

    #[test]
    fn screen_inputs_parse_with_defaults() {
        let raw = r#"{
            "profile": {
                "academic": { "gpa": 3.8, "course": "Computer Science" },
                "financial": { "annual_income": 45000 }
            },
            "criteria": { "min_gpa": 3.5, "max_income": 80000 }
        }"#;

        let input: ScreenInput = serde_json::from_str(raw).expect("input parses");
        let report = evaluate(&input.profile, &input.criteria);
        assert!(report.is_eligible);
        assert_eq!(composite_score(&input.profile, &input.criteria), 75);
    }
}
