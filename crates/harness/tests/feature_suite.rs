//! The shipped feature files, run end to end against the in-memory site
//! and a local stub of the Book Store API.

use axum::routing::get;
use axum::{Json, Router};
use demoqa_harness::api::BooksPayload;
use demoqa_harness::mock::widgets::{catalogue, SiteOptions};
use demoqa_harness::{
    load_features, Book, Driver, FnSessionFactory, HarnessConfig, MockDriver, Orchestrator,
    Runner, ScenarioFilter, ScenarioStatus, StepRegistry,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

fn features_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../features")
}

/// Serve `books` at `/BookStore/v1/Books` and return the API root
async fn serve_books(books: Vec<Book>) -> String {
    let app = Router::new().route(
        "/BookStore/v1/Books",
        get(move || {
            let books = books.clone();
            async move { Json(BooksPayload { books }) }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/BookStore/v1")
}

fn orchestrator(config: HarnessConfig, options: SiteOptions) -> Orchestrator {
    let factory = FnSessionFactory::new(move || {
        Ok(Arc::new(MockDriver::demoqa_with(&options)) as Arc<dyn Driver>)
    });
    Orchestrator::new(Arc::new(config), Arc::new(factory))
}

fn site() -> SiteOptions {
    SiteOptions::default().with_dynamic_delay(Duration::from_millis(150))
}

#[test]
fn every_step_in_the_feature_files_is_defined() {
    let features = load_features(&[features_dir()]).unwrap();
    assert_eq!(features.len(), 5);

    let runner = Runner::new(StepRegistry::standard().unwrap());
    let undefined: Vec<String> = runner
        .undefined_steps(&features)
        .iter()
        .map(|u| format!("{}: {}", u.scenario.name, u.step))
        .collect();
    assert!(undefined.is_empty(), "undefined steps: {undefined:#?}");
}

#[tokio::test]
async fn feature_files_pass_against_the_mock_site() {
    let tmp = tempfile::tempdir().unwrap();
    let api = serve_books(catalogue()).await;
    let config = HarnessConfig::fast()
        .with_output_root(tmp.path())
        .with_api_base_url(api);
    let mut hooks = orchestrator(config, site());

    let features = load_features(&[features_dir()]).unwrap();
    let runner = Runner::new(StepRegistry::standard().unwrap());
    let mut outcomes = Vec::new();
    let summary = runner
        .run(&mut hooks, &features, |scenario, status| {
            outcomes.push((scenario.tc_id().to_string(), status));
        })
        .await
        .unwrap();

    let unsuccessful: Vec<_> = summary
        .failed_scenarios
        .iter()
        .chain(&summary.error_scenarios)
        .map(|r| format!("{}: {}", r.id, r.message.as_deref().unwrap_or_default()))
        .collect();
    assert!(unsuccessful.is_empty(), "unsuccessful scenarios: {unsuccessful:#?}");
    assert!(outcomes.iter().all(|(_, s)| *s == ScenarioStatus::Passed));
    assert_eq!(summary.total, outcomes.len());

    let summary_file = hooks.summary_path().unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(summary_file).unwrap()).unwrap();
    assert_eq!(json["total"], summary.total);
}

#[tokio::test]
async fn ui_and_api_disagreement_fails_the_comparison() {
    let tmp = tempfile::tempdir().unwrap();
    // API knows one book fewer than the page shows
    let mut api_books = catalogue();
    api_books.pop();
    let api = serve_books(api_books).await;
    let config = HarnessConfig::fast()
        .with_output_root(tmp.path())
        .with_api_base_url(api);
    let mut hooks = orchestrator(config, site());

    let features = load_features(&[features_dir().join("bookstore.feature")]).unwrap();
    let runner = Runner::new(StepRegistry::standard().unwrap())
        .with_filter(ScenarioFilter::new().with_tags(&["api"]));
    let summary = runner.run(&mut hooks, &features, |_, _| {}).await.unwrap();

    assert_eq!(summary.total, 1);
    let failed = &summary.failed_scenarios[0];
    assert_eq!(failed.id, "TC_BS_01");
    assert!(failed.message.as_deref().unwrap().contains("Book count mismatch"));
}

#[tokio::test]
async fn unreachable_api_fails_the_scenario() {
    let tmp = tempfile::tempdir().unwrap();
    let config = HarnessConfig::fast()
        .with_output_root(tmp.path())
        .with_api_base_url("http://127.0.0.1:9/BookStore/v1");
    let mut hooks = orchestrator(config, site());

    let features = load_features(&[features_dir().join("bookstore.feature")]).unwrap();
    let runner = Runner::new(StepRegistry::standard().unwrap())
        .with_filter(ScenarioFilter::new().with_name("TC_BS_01"));
    let summary = runner.run(&mut hooks, &features, |_, _| {}).await.unwrap();

    assert_eq!(summary.failed_scenarios.len(), 1);
    assert!(summary.error_scenarios.is_empty());
}
