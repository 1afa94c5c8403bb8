//! Blog server
//!
//! Serves pre-rendered pages from the public dir. Pages that were never
//! generated are generated on demand; stale pages are served as they are and
//! regenerated in the background. `/api/posts` backs the "load more" button.

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cache::Freshness;
use crate::generator::{post_output, Generator, PostOutcome, INDEX_ROUTE};
use crate::helpers::{is_valid_uid, post_path};
use crate::listing::{LoadMore, PaginatedListing};
use crate::pages::NotFoundCause;
use crate::source::{PageToken, SourceError};

/// Server state
struct ServerState {
    generator: Generator,
    public_dir: PathBuf,
    /// Routes currently being generated
    generating: Mutex<HashSet<String>>,
}

/// Marks a route as being generated until dropped
struct Claim {
    state: Arc<ServerState>,
    route: String,
}

impl Drop for Claim {
    fn drop(&mut self) {
        self.state.generating().remove(&self.route);
    }
}

impl ServerState {
    fn generating(&self) -> MutexGuard<'_, HashSet<String>> {
        self.generating
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim a route for generation; `None` if someone else holds it
    fn claim(self: &Arc<Self>, route: &str) -> Option<Claim> {
        if !self.generating().insert(route.to_string()) {
            return None;
        }
        Some(Claim {
            state: self.clone(),
            route: route.to_string(),
        })
    }

    fn save_manifest(&self) {
        if let Err(e) = self.generator.save_manifest() {
            tracing::warn!("Failed to save manifest: {}", e);
        }
    }
}

/// Build the application router
pub fn router(generator: Generator) -> Router {
    let state = Arc::new(ServerState {
        public_dir: generator.site().public_dir.clone(),
        generator,
        generating: Mutex::new(HashSet::new()),
    });

    Router::new()
        .route("/api/posts", get(api_posts))
        .route("/", get(index_handler))
        .route("/post/:uid", get(post_handler))
        .route("/post/:uid/", get(post_handler))
        .fallback(fallback_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the server
pub async fn start(generator: Generator, ip: &str, port: u16) -> Result<()> {
    let app = router(generator);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<String>,
}

/// Load the page behind a cursor and return it as a listing fragment
async fn api_posts(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<PageQuery>,
) -> Response {
    let Some(token) = query.page.filter(|p| !p.is_empty()) else {
        return api_error(StatusCode::BAD_REQUEST, "missing page token");
    };

    let source = match state.generator.spec().connect() {
        Ok(source) => source,
        Err(e) => {
            tracing::warn!("Content source unavailable: {}", e);
            return api_error(StatusCode::BAD_GATEWAY, "content source unavailable");
        }
    };

    let config = &state.generator.site().config;
    let controller = LoadMore::new(
        source,
        PaginatedListing::resume(PageToken::new(token)),
        state.generator.helpers().clone(),
        config.cursor_policy(),
    );

    match controller.load_more().await {
        Ok(outcome) => {
            tracing::debug!("load more: {:?}", outcome);
            Json(controller.listing()).into_response()
        }
        Err(SourceError::InvalidToken(_)) => {
            api_error(StatusCode::BAD_REQUEST, "invalid page token")
        }
        Err(_) => api_error(StatusCode::BAD_GATEWAY, "content source failed"),
    }
}

fn api_error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

async fn index_handler(State(state): State<Arc<ServerState>>) -> Response {
    let path = state.public_dir.join("index.html");

    if let Some(response) = serve_existing(&state, INDEX_ROUTE, &path).await {
        return response;
    }

    let Some(_claim) = state.claim(INDEX_ROUTE) else {
        return loading_page(&state);
    };
    let result = state.generator.generate_index().await;
    state.save_manifest();
    match result {
        Ok(html) => Html(html).into_response(),
        Err(e) => server_error(e),
    }
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(uid): Path<String>,
) -> Response {
    if !is_valid_uid(&uid) {
        return not_found_page(&state, NotFoundCause::Missing);
    }

    let route = post_path(&uid);
    let path = state.public_dir.join(post_output(&uid));

    if let Some(response) = serve_existing(&state, &route, &path).await {
        return response;
    }

    // First request for this post does the lookup, others see the loading page
    let Some(_claim) = state.claim(&route) else {
        tracing::debug!("{} is being generated, serving loading page", route);
        return loading_page(&state);
    };

    tracing::info!("Generating {} on demand", route);
    let result = state.generator.generate_post(&uid).await;
    state.save_manifest();

    match result {
        Ok(PostOutcome::Written(html)) => Html(html).into_response(),
        Ok(PostOutcome::NotFound(NotFoundCause::Unavailable)) if path.exists() => {
            serve_file(&path).await
        }
        Ok(PostOutcome::NotFound(cause)) => not_found_page(&state, cause),
        Err(e) => server_error(e),
    }
}

/// Serve an already generated page, scheduling regeneration when stale.
/// `None` when the page must be generated first.
async fn serve_existing(
    state: &Arc<ServerState>,
    route: &str,
    path: &std::path::Path,
) -> Option<Response> {
    if !path.exists() {
        return None;
    }

    match state.generator.freshness(route) {
        Freshness::Fresh => {}
        Freshness::Stale => regenerate_in_background(state, route),
        Freshness::Missing => return None,
    }

    Some(serve_file(path).await)
}

fn regenerate_in_background(state: &Arc<ServerState>, route: &str) {
    let Some(claim) = state.claim(route) else {
        return;
    };
    let state = state.clone();
    let route = route.to_string();

    tokio::spawn(async move {
        tracing::info!("Regenerating stale page {}", route);
        let result = if route == INDEX_ROUTE {
            state.generator.generate_index().await.map(|_| ())
        } else {
            let uid = route
                .trim_start_matches("/post/")
                .trim_end_matches('/')
                .to_string();
            state.generator.generate_post(&uid).await.map(|_| ())
        };
        if let Err(e) = result {
            tracing::warn!("Failed to regenerate {}: {}", route, e);
        }
        state.save_manifest();
        drop(claim);
    });
}

async fn serve_file(path: &std::path::Path) -> Response {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Html(content).into_response(),
        Err(e) => {
            tracing::warn!("Failed to read {:?}: {}", path, e);
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
    }
}

fn loading_page(state: &ServerState) -> Response {
    match state.generator.render_loading() {
        Ok(html) => (StatusCode::ACCEPTED, Html(html)).into_response(),
        Err(e) => server_error(e),
    }
}

fn not_found_page(state: &ServerState, cause: NotFoundCause) -> Response {
    let (status, unavailable) = match cause {
        NotFoundCause::Missing => (StatusCode::NOT_FOUND, false),
        NotFoundCause::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, true),
    };
    match state.generator.render_not_found(unavailable) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => server_error(e),
    }
}

fn server_error(e: anyhow::Error) -> Response {
    tracing::error!("Rendering failed: {:#}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
}

/// Serve remaining static files from the public dir
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let mut service = ServeDir::new(&state.public_dir).append_index_html_on_directories(true);
    match service.try_call(request).await {
        Ok(response) if response.status() == StatusCode::NOT_FOUND => {
            not_found_page(&state, NotFoundCause::Missing)
        }
        Ok(response) => response.into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}
