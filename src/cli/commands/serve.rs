//! HTTP API server.
//!
//! Exposes the generation endpoint and the collection browser over REST.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::SmakError;
use crate::orchestrator::{CollectionResults, Orchestrator};
use crate::vector_store::QueryResult;
use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    let state = Arc::new(AppState { orchestrator });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/generate", post(generate))
        .route("/api/query-chroma", get(list_collections).post(query_collection))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Smak API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Generate", "POST /api/generate");
    Output::kv("Collections", "GET  /api/query-chroma");
    Output::kv("Query", "POST /api/query-chroma");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    /// YouTube URL or video id
    youtube_link: String,
    /// The prompt to answer from the transcript
    prompt: String,
}

#[derive(Serialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct QueryRequest {
    collection: Option<String>,
    query: Option<String>,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    5
}

#[derive(Serialize)]
struct CollectionsResponse {
    collections: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    collection_name: String,
    document_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_results: Option<Vec<StoredItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample_documents: Option<Vec<StoredItem>>,
}

#[derive(Serialize)]
struct StoredItem {
    content: String,
    metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f32>,
}

impl From<QueryResult> for StoredItem {
    fn from(result: QueryResult) -> Self {
        Self {
            content: result.content,
            metadata: result.metadata,
            score: result.score,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

/// Map a pipeline error onto an HTTP response.
fn error_response(error: SmakError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, hint) = match &error {
        SmakError::InvalidInput(_) => (StatusCode::BAD_REQUEST, None),
        SmakError::ContentUnavailable(_) => (
            StatusCode::BAD_REQUEST,
            Some(
                "This video may have captions disabled or be unavailable. Try a different video."
                    .to_string(),
            ),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Some("Ensure the vector store and inference server are running.".to_string()),
        ),
    };

    if status.is_server_error() {
        error!("Request failed: {}", error);
    }

    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            hint,
        }),
    )
}

fn bad_request(message: String) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message,
            hint: None,
        }),
    )
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn generate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            return bad_request(format!("Invalid request body: {}", rejection)).into_response()
        }
    };

    match state.orchestrator.answer(&req.youtube_link, &req.prompt).await {
        Ok(answer) => Json(GenerateResponse {
            response: answer.response,
        })
        .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn list_collections(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.orchestrator.list_collections().await {
        Ok(collections) => Json(CollectionsResponse { collections }).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn query_collection(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            return bad_request(format!("Invalid request body: {}", rejection)).into_response()
        }
    };

    let collection = match req.collection {
        Some(name) if !name.trim().is_empty() => name,
        _ => return bad_request("Collection name is required.".to_string()).into_response(),
    };

    match state
        .orchestrator
        .inspect_collection(&collection, req.query.as_deref(), req.limit)
        .await
    {
        Ok(report) => {
            let (query_results, sample_documents) = match report.results {
                CollectionResults::Search(results) => {
                    (Some(results.into_iter().map(StoredItem::from).collect()), None)
                }
                CollectionResults::Sample(results) => {
                    (None, Some(results.into_iter().map(StoredItem::from).collect()))
                }
            };

            Json(QueryResponse {
                collection_name: report.name,
                document_count: report.document_count,
                query_results,
                sample_documents,
            })
            .into_response()
        }
        Err(e) => error_response(e).into_response(),
    }
}
