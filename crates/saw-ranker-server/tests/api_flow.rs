use std::path::PathBuf;

use saw_ranker_dataset::DatasetSource;
use saw_ranker_server::{HttpRequest, RankerServer, ServerConfig};
use serde_json::Value;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("data")
        .join("fixtures")
        .join("packages.csv")
}

fn server() -> RankerServer {
    let source = DatasetSource::open(fixture()).expect("open fixture");
    RankerServer::with_source(ServerConfig::default(), source)
}

fn call(server: &RankerServer, method: &str, target: &str, body: &str) -> (u16, Value) {
    let response = server.dispatch(&HttpRequest::new(method, target).with_body(body));
    let json = response.body_json().unwrap_or(Value::Null);
    (response.status, json)
}

fn names(rows: &Value) -> Vec<String> {
    rows.as_array()
        .map(|rows| {
            rows.iter()
                .map(|r| r["name"].as_str().unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn health_and_criteria() {
    let server = server();
    let (status, body) = call(&server, "GET", "/health", "");
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");

    let (status, body) = call(&server, "GET", "/api/criteria", "");
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["criteria"].as_array().map(Vec::len), Some(8));
}

#[test]
fn packages_paginate_by_name() {
    let server = server();
    let (status, body) = call(&server, "GET", "/api/packages?page=2&limit=3", "");
    assert_eq!(status, 200);
    assert_eq!(names(&body["data"]), vec!["commander", "express", "fastify"]);
    assert_eq!(body["pagination"]["total"], 8);
    assert_eq!(body["pagination"]["totalPages"], 3);
    assert_eq!(body["pagination"]["hasNext"], true);
    assert_eq!(body["pagination"]["hasPrev"], true);
}

#[test]
fn packages_fall_back_on_bad_paging_values() {
    let server = server();
    let (status, body) = call(&server, "GET", "/api/packages?page=abc&limit=0", "");
    assert_eq!(status, 200);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 50);
    assert_eq!(body["pagination"]["totalPages"], 1);
}

#[test]
fn packages_filter_by_category_and_search() {
    let server = server();
    let (_, body) = call(
        &server,
        "GET",
        "/api/packages?category=web-framework&search=fast",
        "",
    );
    assert_eq!(names(&body["data"]), vec!["express", "fastify"]);
}

#[test]
fn package_lookup() {
    let server = server();
    let (status, body) = call(&server, "GET", "/api/packages/express", "");
    assert_eq!(status, 200);
    assert_eq!(body["data"]["name"], "express");
    assert_eq!(body["data"]["license"], "MIT");

    let (status, body) = call(&server, "GET", "/api/packages/left%2Dpad", "");
    assert_eq!(status, 200);
    assert_eq!(body["data"]["name"], "left-pad");

    let (status, body) = call(&server, "GET", "/api/packages/missing", "");
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);

    let (status, _) = call(&server, "GET", "/api/packages/%20", "");
    assert_eq!(status, 400);
}

#[test]
fn categories_and_statistics() {
    let server = server();
    let (_, body) = call(&server, "GET", "/api/categories", "");
    assert_eq!(
        body["categories"],
        serde_json::json!(["cli", "http", "terminal", "utility", "web-framework"])
    );

    let (status, body) = call(&server, "GET", "/api/statistics", "");
    assert_eq!(status, 200);
    assert_eq!(body["statistics"]["totalPackages"], 8);
    assert_eq!(body["statistics"]["quality"]["withTests"], 7);
}

#[test]
fn calculate_with_default_weights() {
    let server = server();
    let (status, body) = call(&server, "POST", "/api/calculate", "");
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["total"], 7);

    let results = body["results"].as_array().cloned().unwrap_or_default();
    assert_eq!(results.len(), 7);
    let scores = results
        .iter()
        .map(|r| r["score"].as_f64().unwrap_or(f64::NAN))
        .collect::<Vec<_>>();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    let ranks = results
        .iter()
        .map(|r| r["rank"].as_u64().unwrap_or(0))
        .collect::<Vec<_>>();
    assert_eq!(ranks, (1..=7).collect::<Vec<u64>>());
    assert!(results.iter().all(|r| r.get("breakdown").is_none()));
}

#[test]
fn calculate_within_category() {
    let server = server();
    let (status, body) = call(
        &server,
        "POST",
        "/api/calculate",
        r#"{"weights":null,"category":"utility"}"#,
    );
    assert_eq!(status, 200);
    assert_eq!(names(&body["results"]), vec!["lodash", "left-pad"]);
    assert_eq!(body["results"][0]["has_tests"], true);
}

#[test]
fn calculate_with_single_criterion() {
    let server = server();
    let (status, body) = call(
        &server,
        "POST",
        "/api/calculate",
        r#"{"weights":{"github_stars":1.0},"category":"cli"}"#,
    );
    assert_eq!(status, 200);
    let results = body["results"].as_array().cloned().unwrap_or_default();
    assert!(!results.is_empty());
    assert_eq!(results[0]["score"], 1.0);
}

#[test]
fn calculate_rejects_bad_weights_and_bodies() {
    let server = server();
    let (status, body) = call(
        &server,
        "POST",
        "/api/calculate",
        r#"{"weights":{"github_stars":0.5}}"#,
    );
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap_or_default().contains("0.5"));

    let (status, body) = call(
        &server,
        "POST",
        "/api/calculate",
        r#"{"weights":{"github_stars":1.1,"has_ci":-0.1}}"#,
    );
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap_or_default().contains("has_ci"));

    let (status, body) = call(&server, "POST", "/api/calculate", "{not json");
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
}

#[test]
fn unknown_routes_and_wrong_methods() {
    let server = server();
    assert_eq!(call(&server, "GET", "/api/nope", "").0, 404);
    assert_eq!(call(&server, "GET", "/api/calculate", "").0, 405);
    assert_eq!(call(&server, "POST", "/api/packages", "").0, 405);
}

#[test]
fn metrics_reflect_traffic() {
    let server = server();
    call(&server, "POST", "/api/calculate", r#"{"category":"cli"}"#);
    call(
        &server,
        "POST",
        "/api/calculate",
        r#"{"weights":{"github_stars":2.0}}"#,
    );
    call(&server, "GET", "/api/nope", "");

    let response = server.dispatch(&HttpRequest::new("GET", "/metrics"));
    assert_eq!(response.status, 200);
    assert!(response.content_type.starts_with("text/plain"));
    let text = String::from_utf8(response.body).expect("utf8 metrics");
    assert!(text.contains("saw_ranker_rank_runs_total 1"));
    assert!(text.contains("saw_ranker_rank_rejected_total 1"));
    assert!(text.contains("saw_ranker_rank_category_requests_total{category=\"cli\"} 1"));
    assert!(text.contains("saw_ranker_http_requests_total{route=\"calculate\",status=\"error\"} 1"));
    assert!(text.contains("saw_ranker_http_requests_total{route=\"not_found\",status=\"error\"} 1"));
    assert!(text.contains("saw_ranker_dataset_loads_total 1"));
    assert!(text.contains("saw_ranker_dataset_packages 8"));
}

#[test]
fn missing_dataset_fails_data_routes_only() {
    let config = ServerConfig {
        dataset_path: std::env::temp_dir().join(format!(
            "saw-ranker-missing-{}.csv",
            std::process::id()
        )),
        ..ServerConfig::default()
    };
    let server = RankerServer::new(config);
    assert!(server.preload().is_err());
    assert_eq!(call(&server, "GET", "/health", "").0, 200);
    assert_eq!(call(&server, "GET", "/api/criteria", "").0, 200);

    let (status, body) = call(&server, "GET", "/api/packages", "");
    assert_eq!(status, 500);
    assert_eq!(body["success"], false);
    assert_eq!(call(&server, "POST", "/api/calculate", "").0, 500);
}
