// Four Pillars Engine - Web Server
// REST API with Axum

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use four_pillars::{
    analyze, categorize_marriage, match_rules, AnalysisReport, Chart, ChartDigest, EngineConfig,
    Gender, KnowledgeBase, KnowledgeRule, MarriageCategories, PillarOrder,
};

/// Shared application state; both halves are read-only after startup
#[derive(Clone)]
struct AppState {
    config: Arc<EngineConfig>,
    knowledge: Arc<KnowledgeBase>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl ToString) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.to_string()),
        }
    }
}

/// Chart input: either split stems/branches or pillar text
#[derive(Deserialize)]
struct ChartRequest {
    stems: Option<String>,
    branches: Option<String>,
    pillars: Option<String>,
    gender: String,
    order: Option<PillarOrder>,
    interim: Option<String>,
    annual: Option<String>,
}

impl ChartRequest {
    fn build(&self, config: &EngineConfig) -> Result<Chart, String> {
        let gender = Gender::parse(&self.gender).map_err(|e| e.to_string())?;
        let order = self.order.unwrap_or(config.input_order);

        match (&self.stems, &self.branches, &self.pillars) {
            (Some(stems), Some(branches), None) => {
                Chart::parse_split(stems, branches, order, gender).map_err(|e| e.to_string())
            }
            (None, None, Some(pillars)) => {
                Chart::parse_pillars(pillars, order, gender).map_err(|e| e.to_string())
            }
            _ => Err("provide either stems and branches, or pillars".to_string()),
        }
    }
}

#[derive(Serialize)]
struct MatchResponse {
    matched: Vec<KnowledgeRule>,
    total_rules: usize,
    marriage: MarriageCategories,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok(four_pillars::VERSION))
}

/// POST /api/analyze - Full analysis report
async fn analyze_chart(
    State(state): State<AppState>,
    Json(request): Json<ChartRequest>,
) -> impl IntoResponse {
    match request.build(&state.config) {
        Ok(chart) => {
            let report = analyze(
                &chart,
                &state.config,
                request.interim.as_deref(),
                request.annual.as_deref(),
            );
            (StatusCode::OK, Json(ApiResponse::ok(report))).into_response()
        }
        Err(e) => {
            warn!("Rejected chart: {}", e);
            (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<AnalysisReport>::err(e)),
            )
                .into_response()
        }
    }
}

/// GET /api/rules/search/:keyword - Rules containing a keyword
async fn search_rules(
    State(state): State<AppState>,
    Path(keyword): Path<String>,
) -> impl IntoResponse {
    // Decode URL-encoded keyword (stems and branches arrive percent-encoded)
    let decoded = urlencoding::decode(&keyword)
        .unwrap_or_else(|_| keyword.clone().into())
        .into_owned();

    let found: Vec<KnowledgeRule> = state.knowledge.search(&decoded).into_iter().cloned().collect();
    Json(ApiResponse::ok(found))
}

/// POST /api/rules/match - Knowledge rules matching a chart
async fn match_chart_rules(
    State(state): State<AppState>,
    Json(request): Json<ChartRequest>,
) -> impl IntoResponse {
    let chart = match request.build(&state.config) {
        Ok(chart) => chart,
        Err(e) => {
            warn!("Rejected chart: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<MatchResponse>::err(e)),
            )
                .into_response();
        }
    };

    let report = analyze(&chart, &state.config, None, None);
    let digest = ChartDigest::from_summary(&report.chart, &report.summary);
    let matched_ids = match_rules(&digest, state.knowledge.rules(), &state.config);

    let hits: Vec<&KnowledgeRule> = state
        .knowledge
        .rules()
        .iter()
        .filter(|r| matched_ids.get(&r.id).copied().unwrap_or(false))
        .collect();

    let response = MatchResponse {
        marriage: categorize_marriage(&hits),
        matched: hits.into_iter().cloned().collect(),
        total_rules: state.knowledge.rule_count(),
    };
    (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
}

// ============================================================================
// Main Server
// ============================================================================

fn load_state() -> Result<AppState> {
    let config = match std::env::var("PILLARS_CONFIG") {
        Ok(path) => EngineConfig::from_file(&path)?,
        Err(_) => EngineConfig::default(),
    };

    // A missing knowledge base only disables rule matching
    let knowledge = match std::env::var("PILLARS_RULES") {
        Ok(path) => match KnowledgeBase::from_file(&path) {
            Ok(kb) => kb,
            Err(e) => {
                error!("Failed to load knowledge base {}: {:#}", path, e);
                KnowledgeBase::new()
            }
        },
        Err(_) => KnowledgeBase::new(),
    };

    Ok(AppState {
        config: Arc::new(config),
        knowledge: Arc::new(knowledge),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let state = load_state()?;
    info!(
        rules = state.knowledge.rule_count(),
        "knowledge base ready"
    );

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/analyze", post(analyze_chart))
        .route("/rules/search/:keyword", get(search_rules))
        .route("/rules/match", post(match_chart_rules))
        .with_state(state);

    // Build main router
    let app = Router::new()
        .nest("/api", api_routes)
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()));

    let addr = std::env::var("PILLARS_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address: {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("   API: http://{}/api/analyze", addr);

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
