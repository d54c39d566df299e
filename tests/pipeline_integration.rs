//! Integration tests for the full harvest pipeline.
//!
//! Agency hostnames are pinned to a local mock server (or to a closed port
//! for unreachable agencies), so the real probe URLs are exercised without
//! touching the network.

use std::net::SocketAddr;
use std::time::Duration;

use harvester_core::probe::load_references;
use harvester_core::{
    HttpClient, MergeOutcome, Pipeline, PipelineConfig, PipelineError, SourceStatus,
};
use serde_json::Value;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DIRECTORY: &str = "Domain Name,Domain Type,Agency,City,State\n\
    agency-a.gov,Federal Agency,Agency A,Washington,DC\n\
    cityville.gov,City,Cityville,Cityville,OH\n\
    agency-b.gov,Federal Agency,Agency B,Washington,DC\n";

const AGENCY_A_INVENTORY: &str = r#"{"dataset":[{"identifier":"1","publisher":{"name":"A"},"title":"T1","description":"D1","accessLevel":"public"}]}"#;

/// Port 1 on loopback is closed, so pinned hosts there fail to connect.
fn unreachable() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 1))
}

fn pinned_client(server: &MockServer) -> HttpClient {
    HttpClient::builder()
        .request_timeout(Duration::from_secs(5))
        .pin_host("agency-a.gov", *server.address())
        .pin_host("agency-b.gov", unreachable())
        .pin_host("www.agency-b.gov", unreachable())
        .pin_host("cityville.gov", *server.address())
        .build()
        .expect("client builds")
}

fn config_for(server: &MockServer, data_dir: &TempDir, refresh: bool) -> PipelineConfig {
    PipelineConfig {
        data_dir: data_dir.path().to_path_buf(),
        source_url: format!("{}/dotgov.csv", server.uri()),
        refresh,
        ..PipelineConfig::default()
    }
}

async fn mount_directory(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/dotgov.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DIRECTORY))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_agency_a(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/data.json"))
        .and(header("host", "agency-a.gov"))
        .respond_with(ResponseTemplate::new(200).set_body_string(AGENCY_A_INVENTORY))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_end_to_end_two_agencies_one_unreachable() {
    let server = MockServer::start().await;
    mount_directory(&server, 1).await;
    mount_agency_a(&server, 1).await;
    let data_dir = TempDir::new().expect("failed to create temp dir");

    let pipeline = Pipeline::with_client(
        config_for(&server, &data_dir, false),
        pinned_client(&server),
    )
    .expect("pipeline builds");
    let summary = pipeline.run().await.expect("pipeline succeeds");

    assert!(matches!(summary.source, SourceStatus::Downloaded { .. }));
    assert_eq!(summary.probe.probed, 2, "only federal rows are probed");
    assert_eq!(summary.probe.found(), 1);
    // Probe already cached the payload, so nothing is re-downloaded
    assert_eq!(summary.downloads.cached, 1);
    assert_eq!(summary.downloads.downloaded, 0);

    let layout = pipeline.layout();
    let references = load_references(&layout.inventory_list()).expect("list persisted");
    assert_eq!(references.len(), 1);
    assert_eq!(references[0].candidate.domain_name, "agency-a.gov");
    assert_eq!(references[0].data_url, "http://agency-a.gov/data.json");

    let merged: Value = serde_json::from_slice(
        &std::fs::read(layout.merged_json()).expect("merged json written"),
    )
    .expect("merged json parses");
    let records = merged.as_array().expect("array");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["agency"], "Agency A");
    assert_eq!(records[0]["identifier"], "1");

    let csv = std::fs::read_to_string(layout.merged_csv()).expect("merged csv written");
    assert_eq!(
        csv,
        "agency,publisher,title,description,access\nAgency A,A,T1,D1,public\n"
    );
}

#[tokio::test]
async fn test_second_run_without_refresh_issues_no_requests() {
    let server = MockServer::start().await;
    // Totals across both runs
    mount_directory(&server, 1).await;
    mount_agency_a(&server, 1).await;
    let data_dir = TempDir::new().expect("failed to create temp dir");

    let first = Pipeline::with_client(
        config_for(&server, &data_dir, false),
        pinned_client(&server),
    )
    .expect("pipeline builds");
    first.run().await.expect("first run succeeds");
    let json_before = std::fs::read(first.layout().merged_json()).expect("json");
    let csv_before = std::fs::read(first.layout().merged_csv()).expect("csv");

    let second = Pipeline::with_client(
        config_for(&server, &data_dir, false),
        pinned_client(&server),
    )
    .expect("pipeline builds");
    let summary = second.run().await.expect("second run succeeds");

    assert_eq!(summary.source, SourceStatus::Cached);
    assert!(summary.probe.reused_list);
    assert_eq!(summary.downloads.cached, 1);
    assert_eq!(summary.merge, MergeOutcome::AlreadyMerged);
    assert_eq!(
        std::fs::read(second.layout().merged_json()).expect("json"),
        json_before
    );
    assert_eq!(
        std::fs::read(second.layout().merged_csv()).expect("csv"),
        csv_before
    );
}

#[tokio::test]
async fn test_refresh_reruns_every_stage() {
    let server = MockServer::start().await;
    // Run 1: directory + probe. Run 2 (refresh): directory + probe + download.
    mount_directory(&server, 2).await;
    mount_agency_a(&server, 3).await;
    let data_dir = TempDir::new().expect("failed to create temp dir");

    Pipeline::with_client(
        config_for(&server, &data_dir, false),
        pinned_client(&server),
    )
    .expect("pipeline builds")
    .run()
    .await
    .expect("first run succeeds");

    let summary = Pipeline::with_client(
        config_for(&server, &data_dir, true),
        pinned_client(&server),
    )
    .expect("pipeline builds")
    .run()
    .await
    .expect("refresh run succeeds");

    assert!(matches!(summary.source, SourceStatus::Downloaded { .. }));
    assert!(!summary.probe.reused_list);
    assert_eq!(summary.downloads.downloaded, 1);
    assert!(matches!(summary.merge, MergeOutcome::Merged(_)));
}

#[tokio::test]
async fn test_directory_failure_halts_pipeline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dotgov.csv"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    mount_agency_a(&server, 0).await;
    let data_dir = TempDir::new().expect("failed to create temp dir");

    let pipeline = Pipeline::with_client(
        config_for(&server, &data_dir, false),
        pinned_client(&server),
    )
    .expect("pipeline builds");
    let result = pipeline.run().await;

    assert!(matches!(result, Err(PipelineError::SourceList { .. })));
    assert!(!pipeline.layout().inventory_list().exists());
    assert!(!pipeline.layout().merged_json().exists());
}
