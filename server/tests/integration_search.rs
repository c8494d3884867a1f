use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;
use wikiseek_core::lookups::{save_pageviews, save_titles};
use wikiseek_core::persist::{write_field_index, IndexPaths};
use wikiseek_core::{DocId, Field};

fn lists(entries: Vec<(&str, Vec<(DocId, u32)>)>) -> BTreeMap<String, Vec<(DocId, u32)>> {
    entries.into_iter().map(|(t, l)| (t.to_string(), l)).collect()
}

fn build_tiny_index(dir: &Path) -> server::ServerConfig {
    let paths = IndexPaths::new(dir);
    let dl: HashMap<DocId, u32> = [(1, 10), (2, 5), (3, 8)].into_iter().collect();

    let body = lists(vec![("dog", vec![(1, 3), (2, 1)]), ("cat", vec![(3, 2)])]);
    write_field_index(&paths, Field::Body, &body, &dl, 3, 1 << 20).unwrap();

    let title = lists(vec![("dog", vec![(1, 1), (3, 1)]), ("park", vec![(3, 1)]), ("what", vec![(2, 1)])]);
    write_field_index(&paths, Field::Title, &title, &dl, 3, 8).unwrap();

    let anchor = lists(vec![("dog", vec![(2, 4)])]);
    write_field_index(&paths, Field::Anchor, &anchor, &dl, 3, 1 << 20).unwrap();

    let titles: HashMap<DocId, String> =
        [(1, "Dog".to_string()), (2, "What Dogs Eat".to_string()), (3, "Dog Park".to_string())].into_iter().collect();
    save_titles(&dir.join("titles.bin"), &titles).unwrap();
    let views: HashMap<DocId, u64> = [(1, 100), (3, 7)].into_iter().collect();
    save_pageviews(&dir.join("views.bin"), &views).unwrap();

    server::ServerConfig {
        index_root: dir.to_path_buf(),
        titles: Some(dir.join("titles.bin")),
        pageviews: Some(dir.join("views.bin")),
        ..Default::default()
    }
}

fn app() -> (TempDir, Router) {
    let dir = tempdir().unwrap();
    let config = build_tiny_index(dir.path());
    let app = server::build_app(config).unwrap();
    (dir, app)
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    call(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post(app: Router, uri: &str, json: &str) -> (StatusCode, Value) {
    let req = Request::post(uri).header("content-type", "application/json").body(Body::from(json.to_string())).unwrap();
    call(app, req).await
}

#[tokio::test]
async fn search_ranks_titles_by_overlap() {
    let (_dir, app) = app();
    let (status, json) = get(app, "/search?query=dog+park").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!([[3, "Dog Park"], [1, "Dog"]]));
}

#[tokio::test]
async fn search_drops_question_words_but_search_title_keeps_them() {
    let (_dir, app) = app();
    let (_, strict) = get(app.clone(), "/search?query=what+dog").await;
    let (_, base) = get(app, "/search_title?query=what+dog").await;
    assert_eq!(strict, serde_json::json!([[1, "Dog"], [3, "Dog Park"]]));
    assert_eq!(base, serde_json::json!([[1, "Dog"], [2, "What Dogs Eat"], [3, "Dog Park"]]));
}

#[tokio::test]
async fn search_body_uses_tfidf() {
    let (_dir, app) = app();
    let (status, json) = get(app, "/search_body?query=dog").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!([[2, "What Dogs Eat"], [1, "Dog"]]));
}

#[tokio::test]
async fn search_anchor_reads_anchor_field() {
    let (_dir, app) = app();
    let (_, json) = get(app, "/search_anchor?query=dog").await;
    assert_eq!(json, serde_json::json!([[2, "What Dogs Eat"]]));
}

#[tokio::test]
async fn empty_and_unknown_queries_return_nothing() {
    let (_dir, app) = app();
    for uri in ["/search", "/search?query=", "/search_body?query=the", "/search_title?query=zebra"] {
        let (status, json) = get(app.clone(), uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(json, serde_json::json!([]), "{uri}");
    }
}

#[tokio::test]
async fn lookups_default_missing_ids() {
    let (_dir, app) = app();
    let (_, views) = post(app.clone(), "/get_pageview", "[1, 2, 3]").await;
    assert_eq!(views, serde_json::json!([100, 0, 7]));
    let (_, ranks) = post(app, "/get_pagerank", "[1]").await;
    assert_eq!(ranks, serde_json::json!([0.0]));
}

#[tokio::test]
async fn missing_shard_is_a_server_error() {
    let (dir, app) = app();
    for entry in std::fs::read_dir(dir.path().join("body")).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().map_or(false, |e| e == "bin") && !path.to_string_lossy().contains("catalog") {
            std::fs::remove_file(path).unwrap();
        }
    }
    let (status, json) = get(app.clone(), "/search_body?query=dog").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("shard"));
    let (status, _) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[test]
fn expansion_without_embeddings_fails_to_start() {
    let dir = tempdir().unwrap();
    let mut config = build_tiny_index(dir.path());
    config.expand_search = true;
    assert!(server::build_app(config).is_err());
}

#[tokio::test]
async fn search_expands_with_embeddings() {
    let dir = tempdir().unwrap();
    let mut config = build_tiny_index(dir.path());
    std::fs::write(dir.path().join("glove.txt"), "hound 1.0 0.1\ndog 1.0 0.0\npark 0.0 1.0\n").unwrap();
    config.embeddings = Some(dir.path().join("glove.txt"));
    config.expand_search = true;
    let app = server::build_app(config).unwrap();
    let (_, json) = get(app, "/search?query=hound").await;
    assert_eq!(json, serde_json::json!([[3, "Dog Park"], [1, "Dog"]]));
}
