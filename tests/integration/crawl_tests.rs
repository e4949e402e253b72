//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a miniature copy of the site and run
//! the full fetch, extract, classify and aggregate cycle end-to-end.

use living_wage_crawler::config::{CacheConfig, Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use living_wage_crawler::crawler::{build_http_client, CrawlEngine, FetchError, HttpFetcher, PageFetcher};
use living_wage_crawler::output::{aggregate, read_records, write_records};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration; `cache_path` of None disables the cache
fn create_test_config(seeds: Vec<String>, cache_path: Option<String>) -> Config {
    Config {
        seeds,
        crawler: CrawlerConfig {
            minimum_delay: 0,
            max_concurrent_fetches: 2,
            request_timeout: 5,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
        },
        cache: CacheConfig {
            enabled: cache_path.is_some(),
            path: cache_path.unwrap_or_default(),
        },
        output: OutputConfig::default(),
    }
}

fn engine_for(config: &Config) -> CrawlEngine {
    let fetcher = HttpFetcher::from_config(config).expect("Failed to build fetcher");
    CrawlEngine::new(Arc::new(fetcher), config.crawler.clone())
}

fn seed(server: &MockServer, page: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), page)).expect("Failed to parse seed URL")
}

fn links_page(hrefs: &[&str]) -> String {
    let anchors: String = hrefs
        .iter()
        .map(|h| format!(r#"<li><a href="{}">{}</a></li>"#, h, h))
        .collect();
    format!(
        "<html><body><div><div>Header</div><div><h1>Locations</h1><ul>{}</ul></div></div></body></html>",
        anchors
    )
}

fn location_page(name: &str, living: &str) -> String {
    format!(
        r#"<html><body>
        <div>
          <div class="nav"><a href="/">Home</a></div>
          <div>
            <h1>Living Wage Calculation for {}</h1>
            <table class="results_table wages_table">
              <thead><tr><th>1 Adult</th><th>1 Adult 1 Child</th></tr></thead>
              <tbody>
                <tr><td>{}</td><td>&nbsp;$21.30 </td></tr>
                <tr><td>$5.00</td><td>$6.77</td></tr>
                <tr><td>$7.25</td><td>$7.25</td></tr>
              </tbody>
            </table>
            <a href="/states/48/locations">Texas</a>
          </div>
        </div>
        </body></html>"#,
        name, living
    )
}

async fn mount_page(server: &MockServer, page: &str, body: String, hits: u64) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .expect(hits)
        .mount(server)
        .await;
}

/// A state page linking to two counties, a metro and an unrelated page
async fn mount_texas(server: &MockServer) {
    mount_page(
        server,
        "/states/48/locations",
        links_page(&["/counties/48001", "/counties/48003", "/metros/10180", "/resources"]),
        1,
    )
    .await;
    mount_page(server, "/counties/48001", location_page("Anderson County, Texas", "$10.66"), 1).await;
    mount_page(server, "/counties/48003", location_page("Andrews County, Texas", "$11.02"), 1).await;
    mount_page(server, "/metros/10180", location_page("Abilene, TX", "$10.90"), 1).await;
    mount_page(server, "/resources", links_page(&[]), 0).await;
}

#[tokio::test]
async fn test_state_page_fully_crawled() {
    let server = MockServer::start().await;
    mount_texas(&server).await;

    let config = create_test_config(vec![], None);
    let outcome = engine_for(&config)
        .run(vec![seed(&server, "/states/48/locations")], CancellationToken::new())
        .await;

    assert_eq!(outcome.records.len(), 3);
    assert_eq!(outcome.stats.pages_fetched, 4);
    assert_eq!(outcome.stats.pages_failed, 0);
    assert_eq!(outcome.stats.cache_hits, 0);

    let anderson = outcome
        .records
        .iter()
        .find(|r| r.source_url.ends_with("/counties/48001"))
        .expect("Anderson County record missing");
    assert_eq!(anderson.title, "Living Wage Calculation for Anderson County, Texas");
    assert_eq!(anderson.header_labels, vec!["1 Adult", "1 Adult 1 Child"]);
    assert_eq!(anderson.living_wage_row, vec!["$10.66", "$21.30"]);
    assert_eq!(anderson.poverty_wage_row, vec!["$5.00", "$6.77"]);
    assert_eq!(anderson.minimum_wage_row, vec!["$7.25", "$7.25"]);

    let result = aggregate(&outcome.records);
    assert_eq!(result.counties_by_state.len(), 1);
    assert_eq!(result.counties_by_state["48"], 2);
    assert_eq!(result.total_counties, 2);
    assert_eq!(result.total_metros, 1);
}

#[tokio::test]
async fn test_missing_county_dropped() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/states/48/locations",
        links_page(&["/counties/48999", "/counties/48001"]),
        1,
    )
    .await;
    mount_page(&server, "/counties/48001", location_page("Anderson County, Texas", "$10.66"), 1).await;
    Mock::given(method("GET"))
        .and(path("/counties/48999"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(vec![], None);
    let outcome = engine_for(&config)
        .run(vec![seed(&server, "/states/48/locations")], CancellationToken::new())
        .await;

    assert_eq!(outcome.records.len(), 1);
    assert!(outcome.records[0].source_url.ends_with("/counties/48001"));
    assert_eq!(outcome.stats.pages_failed, 1);
}

#[tokio::test]
async fn test_page_linked_twice_fetched_once() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        links_page(&["/states/48/locations", "/states/15/locations"]),
        1,
    )
    .await;
    // Border county listed under both states, with differing spellings
    mount_page(
        &server,
        "/states/48/locations",
        links_page(&["/counties/48001", "/counties/48001#top"]),
        1,
    )
    .await;
    mount_page(&server, "/states/15/locations", links_page(&["/counties/48001/"]), 1).await;
    mount_page(&server, "/counties/48001", location_page("Anderson County, Texas", "$10.66"), 1).await;

    let config = create_test_config(vec![], None);
    let outcome = engine_for(&config)
        .run(vec![seed(&server, "/")], CancellationToken::new())
        .await;

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.stats.pages_fetched, 4);
    assert!(outcome.stats.duplicate_links >= 2);
}

#[tokio::test]
async fn test_cancel_before_start_fetches_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(links_page(&[])))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let config = create_test_config(vec![], None);
    let outcome = engine_for(&config)
        .run(vec![seed(&server, "/states/48/locations")], cancel)
        .await;

    assert!(outcome.records.is_empty());
    assert!(outcome.stats.cancelled);
    assert_eq!(outcome.stats.pages_fetched, 0);
}

#[tokio::test]
async fn test_cache_hits_avoid_network() {
    let server = MockServer::start().await;
    // Each page may reach the network once across both runs
    mount_texas(&server).await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let cache_path = dir.path().join("httpcache.db").to_string_lossy().to_string();
    let config = create_test_config(vec![], Some(cache_path));
    let seeds = vec![seed(&server, "/states/48/locations")];

    let first = engine_for(&config)
        .run(seeds.clone(), CancellationToken::new())
        .await;
    assert_eq!(first.stats.cache_hits, 0);

    let second = engine_for(&config).run(seeds, CancellationToken::new()).await;
    assert_eq!(second.stats.pages_fetched, 4);
    assert_eq!(second.stats.cache_hits, 4);

    let mut first_urls: Vec<_> = first.records.iter().map(|r| r.source_url.clone()).collect();
    let mut second_urls: Vec<_> = second.records.iter().map(|r| r.source_url.clone()).collect();
    first_urls.sort();
    second_urls.sort();
    assert_eq!(first_urls, second_urls);
}

#[tokio::test]
async fn test_slow_page_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/counties/48001"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(location_page("Anderson County, Texas", "$10.66"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = create_test_config(vec![], None);
    let client = build_http_client(&config.user_agent, Duration::from_millis(300))
        .expect("Failed to build client");
    let fetcher = HttpFetcher::new(client, None);

    let result = fetcher.fetch(&seed(&server, "/counties/48001")).await;
    assert!(matches!(result, Err(FetchError::Timeout { .. })));

    // The engine treats the timeout like any other failed page
    let engine = CrawlEngine::new(Arc::new(fetcher), config.crawler.clone());
    let outcome = engine
        .run(vec![seed(&server, "/counties/48001")], CancellationToken::new())
        .await;
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.stats.pages_failed, 1);
}

#[tokio::test]
async fn test_user_agent_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/counties/48001"))
        .and(header("user-agent", "TestBot/1.0 (+https://example.com/about)"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(location_page("Anderson County, Texas", "$10.66")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/states/48/locations"))
        .respond_with(ResponseTemplate::new(200).set_body_string(links_page(&[])))
        .mount(&server)
        .await;

    let config = create_test_config(vec![], None);
    let outcome = engine_for(&config)
        .run(vec![seed(&server, "/counties/48001")], CancellationToken::new())
        .await;

    assert_eq!(outcome.records.len(), 1);
}

#[tokio::test]
async fn test_records_file_round_trip_through_aggregation() {
    let server = MockServer::start().await;
    mount_texas(&server).await;

    let config = create_test_config(vec![], None);
    let outcome = engine_for(&config)
        .run(vec![seed(&server, "/states/48/locations")], CancellationToken::new())
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let records_path = dir.path().join("wages.jsonl");
    write_records(&records_path, &outcome.records).expect("Failed to write records");

    let loaded = read_records(&records_path).expect("Failed to read records");
    assert_eq!(loaded, outcome.records);
    assert_eq!(aggregate(&loaded), aggregate(&outcome.records));
}
