//! PrismicSource against an in-process mock CMS

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use tower::ServiceExt;

use spacetraveling::config::SiteConfig;
use spacetraveling::generator::Generator;
use spacetraveling::helpers::Helpers;
use spacetraveling::listing::{LoadMore, LoadOutcome};
use spacetraveling::pages::index_props;
use spacetraveling::server::router;
use spacetraveling::source::{ContentSource, PageToken, PrismicSource, SourceError, SourceSpec};
use spacetraveling::Site;

const POSTS: [&str; 3] = ["first-post", "second-post", "third-post"];
const MASTER_REF: &str = "REF1";
const SECRET: &str = "SECRET123";

async fn spawn_cms() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new()
        .route("/api/v2", get(api))
        .route("/api/v2/documents/search", get(search))
        .route("/private/api/v2", get(private_api))
        .route("/private/api/v2/documents/search", get(private_search))
        .route(
            "/broken/api/v2",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        )
        .with_state(addr);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn api() -> Json<Value> {
    Json(json!({
        "refs": [
            { "id": "preview", "ref": "PREVIEW", "isMasterRef": false },
            { "id": "master", "ref": MASTER_REF, "isMasterRef": true }
        ]
    }))
}

fn doc(uid: &str) -> Value {
    json!({
        "id": uid,
        "uid": uid,
        "type": "posts",
        "first_publication_date": "2021-03-15T19:25:28+0000",
        "data": {
            "title": [{ "type": "heading1", "text": format!("Title {}", uid), "spans": [] }],
            "subtitle": "Sub",
            "author": "Joseph",
            "banner": { "url": "https://images.prismic.io/banner.png", "alt": null },
            "content": [{
                "heading": "Intro",
                "body": [{ "type": "paragraph", "text": "one two three", "spans": [] }]
            }]
        }
    })
}

fn authorized(params: &HashMap<String, String>) -> Result<(), StatusCode> {
    match params.get("access_token") {
        Some(token) if token == SECRET => Ok(()),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

async fn private_api(
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    authorized(&params)?;
    Ok(api().await)
}

async fn private_search(
    State(addr): State<SocketAddr>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    authorized(&params)?;
    respond(addr, "/private/api/v2", &params)
}

async fn search(
    State(addr): State<SocketAddr>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    respond(addr, "/api/v2", &params)
}

/// Search results; `next_page` echoes the caller's access token like Prismic does
fn respond(
    addr: SocketAddr,
    base: &str,
    params: &HashMap<String, String>,
) -> Result<Json<Value>, StatusCode> {
    if params.get("ref").map(String::as_str) != Some(MASTER_REF) {
        return Err(StatusCode::BAD_REQUEST);
    }
    let q = params.get("q").cloned().unwrap_or_default();
    let size: usize = params
        .get("pageSize")
        .and_then(|s| s.parse().ok())
        .unwrap_or(20);
    let page: usize = params.get("page").and_then(|s| s.parse().ok()).unwrap_or(1);

    if q == r#"[[at(document.type,"posts")]]"# {
        let start = (page - 1) * size;
        let results: Vec<Value> = POSTS.iter().skip(start).take(size).map(|u| doc(u)).collect();
        let next_page = if start + size < POSTS.len() {
            let next = (page + 1).to_string();
            let size = size.to_string();
            let mut url = url::Url::parse_with_params(
                &format!("http://{}{}/documents/search", addr, base),
                &[
                    ("ref", MASTER_REF),
                    ("q", q.as_str()),
                    ("page", next.as_str()),
                    ("pageSize", size.as_str()),
                ],
            )
            .unwrap();
            if let Some(token) = params.get("access_token") {
                url.query_pairs_mut().append_pair("access_token", token);
            }
            Value::String(url.to_string())
        } else {
            Value::Null
        };
        return Ok(Json(json!({
            "page": page,
            "results_per_page": size,
            "total_results_size": POSTS.len(),
            "next_page": next_page,
            "results": results
        })));
    }

    if let Some(uid) = q
        .strip_prefix(r#"[[at(my.posts.uid,""#)
        .and_then(|rest| rest.strip_suffix(r#"")]]"#))
    {
        let results: Vec<Value> = POSTS.iter().filter(|p| **p == uid).map(|p| doc(p)).collect();
        return Ok(Json(json!({ "next_page": null, "results": results })));
    }

    Err(StatusCode::BAD_REQUEST)
}

fn endpoint(addr: SocketAddr) -> String {
    format!("http://{}/api/v2", addr)
}

#[tokio::test]
async fn test_list_follows_next_page() {
    let addr = spawn_cms().await;
    let source = PrismicSource::new(&endpoint(addr), None).unwrap();

    let first = source.list_by_type("posts", 1).await.unwrap();
    assert_eq!(first.results.len(), 1);
    assert_eq!(first.results[0].uid.as_deref(), Some("first-post"));

    let token = first.next_page.expect("first page has a cursor");
    let second = source.fetch_page(&token).await.unwrap();
    assert_eq!(second.results[0].uid.as_deref(), Some("second-post"));

    let third = source.fetch_page(&second.next_page.unwrap()).await.unwrap();
    assert_eq!(third.results[0].uid.as_deref(), Some("third-post"));
    assert!(third.next_page.is_none());
}

#[tokio::test]
async fn test_list_all_uids() {
    let addr = spawn_cms().await;
    let source = PrismicSource::new(&endpoint(addr), None).unwrap();
    let uids = source.list_all_uids("posts").await.unwrap();
    assert_eq!(uids, POSTS.iter().map(|s| s.to_string()).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_get_by_uid() {
    let addr = spawn_cms().await;
    let source = PrismicSource::new(&endpoint(addr), None).unwrap();

    let doc = source.get_by_uid("posts", "second-post").await.unwrap();
    assert_eq!(doc.data.title.as_string(), "Title second-post");

    let missing = source.get_by_uid("posts", "nope").await.unwrap_err();
    assert!(missing.is_not_found());
}

#[tokio::test]
async fn test_server_error_is_status() {
    let addr = spawn_cms().await;
    let source = PrismicSource::new(&format!("http://{}/broken/api/v2", addr), None).unwrap();
    match source.list_by_type("posts", 1).await {
        Err(SourceError::Status { status, .. }) => assert_eq!(status, 500),
        other => panic!("expected status error, got {:?}", other.map(|p| p.results.len())),
    }
}

#[tokio::test]
async fn test_unreachable_endpoint() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source = PrismicSource::new(&endpoint(addr), None).unwrap();
    let err = source.list_by_type("posts", 1).await.unwrap_err();
    assert!(matches!(err, SourceError::Unreachable(_)));
}

#[tokio::test]
async fn test_foreign_token_is_rejected() {
    let addr = spawn_cms().await;
    let source = PrismicSource::new(&endpoint(addr), None).unwrap();
    let err = source
        .fetch_page(&PageToken::new("https://elsewhere.example/api/v2/documents/search"))
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::InvalidToken(_)));
}

#[tokio::test]
async fn test_listing_with_one_load_more() {
    let addr = spawn_cms().await;
    let config = SiteConfig {
        api_endpoint: endpoint(addr),
        ..Default::default()
    };
    let spec = SourceSpec::from_config(&config, None);

    let props = index_props(&spec, &config).await;
    let listing = props.props.posts_pagination;
    assert_eq!(listing.results.len(), 1);
    assert_eq!(listing.results[0].title, "Title first-post");
    assert_eq!(
        listing.results[0].first_publication_date.as_deref(),
        Some("15 de mar. de 2021")
    );
    assert!(listing.has_more());

    let controller = LoadMore::new(
        spec.connect().unwrap(),
        listing,
        Helpers::new(&config),
        config.cursor_policy(),
    );
    assert_eq!(
        controller.load_more().await.unwrap(),
        LoadOutcome::Loaded { added: 1 }
    );
    let listing = controller.listing();
    assert_eq!(listing.results.len(), 2);
    assert!(listing.next_page.is_none());
    assert!(!controller.can_load_more());
    assert_eq!(controller.load_more().await.unwrap(), LoadOutcome::Exhausted);
}

#[tokio::test]
async fn test_access_token_never_reaches_pages() {
    let addr = spawn_cms().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = SiteConfig {
        api_endpoint: format!("http://{}/private/api/v2", addr),
        access_token: Some(SECRET.to_string()),
        ..Default::default()
    };
    config.pagination.follow_cursor = true;
    let spec = SourceSpec::from_config(&config, None);

    // The cursor is clean but still loads, the token is added back on fetch
    let listing = index_props(&spec, &config).await.props.posts_pagination;
    let token = listing.next_page.clone().expect("first page has a cursor");
    assert!(!token.as_str().contains(SECRET));
    let source = spec.connect().unwrap();
    let second = source.fetch_page(&token).await.unwrap();
    assert_eq!(second.results[0].uid.as_deref(), Some("second-post"));

    let site = Site::with_config(dir.path().to_path_buf(), config);
    let generator = Generator::new(&site, spec).unwrap();
    let html = generator.generate_index().await.unwrap();
    assert!(html.contains("Title first-post"));
    assert!(html.contains("load-more"));
    assert!(!html.contains(SECRET));

    let app = router(generator);
    let page: String = url::form_urlencoded::byte_serialize(token.as_str().as_bytes()).collect();
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/posts?page={}", page))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = String::from_utf8_lossy(&body);
    assert!(body.contains("Title second-post"));
    assert!(body.contains("next_page"));
    assert!(!body.contains(SECRET));
}
