use anyhow::{Context, Result};
use axum::{extract::{Query, State}, http::StatusCode, routing::{get, post}, Json, Router};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use wikiseek_core::expand::{GloveEmbeddings, QueryExpander};
use wikiseek_core::lookups::{self, Lookups};
use wikiseek_core::persist::{load_field, IndexPaths};
use wikiseek_core::tokenizer::{StopwordPolicy, Tokenizer};
use wikiseek_core::{DocId, Field, FieldIndex};

/// Results returned by `/search` and `/search_body`.
pub const TOP_K: usize = 100;

/// Everything the router needs to start. Optional side tables default to empty.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub index_root: PathBuf,
    pub titles: Option<PathBuf>,
    pub pagerank: Option<PathBuf>,
    pub pageviews: Option<PathBuf>,
    pub embeddings: Option<PathBuf>,
    /// Expand `/search` queries with embedding neighbours.
    pub expand_search: bool,
}

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
}

pub type SearchResults = Vec<(DocId, String)>;
type ApiError = (StatusCode, Json<serde_json::Value>);

#[derive(Clone)]
pub struct AppState {
    pub tokenizer: Arc<Tokenizer>,
    pub body: Arc<FieldIndex>,
    pub title: Arc<FieldIndex>,
    pub anchor: Arc<FieldIndex>,
    pub lookups: Arc<Lookups>,
    pub expander: Option<QueryExpander>,
}

impl AppState {
    pub fn load(config: &ServerConfig) -> Result<Self> {
        let paths = IndexPaths::new(&config.index_root);
        let body = load_field(&paths, Field::Body)?;
        let title = load_field(&paths, Field::Title)?;
        let anchor = load_field(&paths, Field::Anchor)?;

        let mut side = Lookups::default();
        if let Some(p) = &config.titles {
            side.titles = lookups::load_titles(p)?;
        }
        if let Some(p) = &config.pagerank {
            side.pagerank = lookups::load_pagerank(p)?;
        }
        if let Some(p) = &config.pageviews {
            side.pageviews = lookups::load_pageviews(p)?;
        }

        let expander = match (&config.embeddings, config.expand_search) {
            (Some(p), true) => Some(QueryExpander::new(Arc::new(GloveEmbeddings::load(p)?))),
            (None, true) => anyhow::bail!("query expansion needs an embeddings file"),
            _ => None,
        };

        Ok(Self {
            tokenizer: Arc::new(Tokenizer::new()),
            body: Arc::new(body),
            title: Arc::new(title),
            anchor: Arc::new(anchor),
            lookups: Arc::new(side),
            expander,
        })
    }

    fn with_titles<S>(&self, ranked: impl IntoIterator<Item = (DocId, S)>, limit: usize) -> SearchResults {
        ranked
            .into_iter()
            .take(limit)
            .map(|(doc_id, _)| (doc_id, self.lookups.title(doc_id).to_string()))
            .collect()
    }
}

pub fn build_app(config: ServerConfig) -> Result<Router> {
    let app_state = AppState::load(&config).context("loading search state")?;
    Ok(router(app_state))
}

pub fn router(app_state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/search_body", get(search_body_handler))
        .route("/search_title", get(search_title_handler))
        .route("/search_anchor", get(search_anchor_handler))
        .route("/get_pagerank", post(pagerank_handler))
        .route("/get_pageview", post(pageview_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn engine_error(endpoint: &str, err: wikiseek_core::Error) -> ApiError {
    tracing::error!(endpoint, error = %err, "ranking failed");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": err.to_string() })))
}

/// Title-field overlap ranking over strictly filtered, optionally expanded tokens.
pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResults>, ApiError> {
    let mut tokens = state.tokenizer.tokenize(&params.query, StopwordPolicy::Strict);
    if tokens.is_empty() {
        return Ok(Json(vec![]));
    }
    if let Some(expander) = &state.expander {
        tokens = expander.expand(&tokens);
    }
    let ranked = state.title.binary_ranking(&tokens).map_err(|e| engine_error("search", e))?;
    Ok(Json(state.with_titles(ranked, TOP_K)))
}

pub async fn search_body_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResults>, ApiError> {
    let tokens = state.tokenizer.tokenize(&params.query, StopwordPolicy::Base);
    if tokens.is_empty() {
        return Ok(Json(vec![]));
    }
    let ranked = state.body.cosine_ranking(&tokens).map_err(|e| engine_error("search_body", e))?;
    Ok(Json(state.with_titles(ranked, TOP_K)))
}

pub async fn search_title_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResults>, ApiError> {
    field_overlap(&state, &state.title, &params.query, "search_title")
}

pub async fn search_anchor_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResults>, ApiError> {
    field_overlap(&state, &state.anchor, &params.query, "search_anchor")
}

/// Every matching document, most distinct query words first.
fn field_overlap(state: &AppState, index: &FieldIndex, query: &str, endpoint: &str) -> Result<Json<SearchResults>, ApiError> {
    let tokens = state.tokenizer.tokenize(query, StopwordPolicy::Base);
    if tokens.is_empty() {
        return Ok(Json(vec![]));
    }
    let ranked = index.binary_ranking(&tokens).map_err(|e| engine_error(endpoint, e))?;
    Ok(Json(state.with_titles(ranked, usize::MAX)))
}

pub async fn pagerank_handler(State(state): State<AppState>, Json(ids): Json<Vec<DocId>>) -> Json<Vec<f64>> {
    Json(ids.into_iter().map(|id| state.lookups.pagerank(id)).collect())
}

pub async fn pageview_handler(State(state): State<AppState>, Json(ids): Json<Vec<DocId>>) -> Json<Vec<u64>> {
    Json(ids.into_iter().map(|id| state.lookups.pageviews(id)).collect())
}
