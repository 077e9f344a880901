//! Integration tests for the crawler
//!
//! These tests use wiremock to create a mock listing site and test
//! the full crawl cycle end-to-end.

use listing_harvester::config::{parse_config, Config};
use listing_harvester::crawler::{
    crawl, FailureCause, FetchOutcome, HttpSession, PartitionOrchestrator, RetryingFetcher,
};
use listing_harvester::output::{BackupWriter, JsonBackup};
use listing_harvester::state::Termination;
use listing_harvester::storage::{Publisher, RunMetadata, RunStatus, SqlitePublisher};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, Respond, ResponseTemplate};

const SEARCH_PATH: &str = "/businesses-for-sale/in/NC/iredell-county/";

/// Matches requests without a query string (page 1 of the search results)
struct NoQuery;

impl Match for NoQuery {
    fn matches(&self, request: &Request) -> bool {
        request.url.query().is_none()
    }
}

/// Cancels the run when its request arrives, then answers too late to matter
struct CancelOnRequest {
    cancel: CancellationToken,
}

impl Respond for CancelOnRequest {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.cancel.cancel();
        html(detail_page("Late Listing", "$1")).set_delay(Duration::from_secs(5))
    }
}

/// Creates a test configuration pointed at the mock server with zero delays
fn create_test_config(base_url: &str, crawler_extra: &str, tail: &str) -> Config {
    let toml = format!(
        r#"
partitions = ["iredell"]

[site]
base-url = "{base_url}"
region = "NC"
warm-up = false

[crawler]
max-retries = 3
request-timeout-seconds = 5.0
min-delay-seconds = 0.0
max-delay-seconds = 0.0
inter-partition-delay = [0.0, 0.0]
backoff-base-seconds = 0.01
transport-retry-delay-seconds = 0.01
{crawler_extra}

[user-agent]
pool = ["Mozilla/5.0 (X11; Linux x86_64) TestBrowser/1.0"]

[output]
backup-path = "listings.json"
database-path = "listings.db"
summary-path = "summary.md"

{tail}
"#
    );
    parse_config(&toml).expect("Failed to parse test config")
}

fn search_page(links: &[&str], has_next: bool) -> String {
    let mut body = String::from("<html><head><title>Businesses for Sale</title></head><body>");
    for link in links {
        body.push_str(&format!(r#"<div class="result"><a href="{}">Listing</a></div>"#, link));
    }
    if has_next {
        body.push_str(r#"<ul class="pagination"><li><a href="?page=2">Next</a></li></ul>"#);
    }
    body.push_str("</body></html>");
    body
}

fn detail_page(name: &str, price: &str) -> String {
    format!(
        r#"<html><head><title>{name}</title></head><body>
        <h1>{name}</h1>
        <span class="price">{price}</span>
        <span class="location">Mooresville, NC</span>
        <dl>
            <dt>Gross Revenue:</dt><dd>$900,000</dd>
            <dt>Franchise:</dt><dd>No</dd>
        </dl>
        <div class="description">A well-run local business.</div>
        </body></html>"#
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

async fn mount_search_page(server: &MockServer, page: u32, body: String) {
    let mock = Mock::given(method("GET")).and(path(SEARCH_PATH));
    let mock = if page == 1 {
        mock.and(NoQuery)
    } else {
        mock.and(query_param("page", page.to_string()))
    };
    mock.respond_with(html(body)).mount(server).await;
}

async fn mount_detail_page(server: &MockServer, id: &str, name: &str, price: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/listing/{}/", id)))
        .respond_with(html(detail_page(name, price)))
        .mount(server)
        .await;
}

async fn run(config: &Config) -> listing_harvester::CrawlReport {
    let cancel = CancellationToken::new();
    crawl(config, &config.partitions, &cancel)
        .await
        .expect("Crawl failed to start")
}

#[tokio::test]
async fn test_full_crawl_single_partition() {
    let server = MockServer::start().await;

    mount_search_page(&server, 1, search_page(&["/listing/101/", "/listing/102/"], true)).await;
    // Page 2 only repeats a listing already seen
    mount_search_page(&server, 2, search_page(&["/listing/101/"], true)).await;
    mount_detail_page(&server, "101", "Coffee Shop", "$450,000").await;
    mount_detail_page(&server, "102", "Bakery", "$300,000").await;

    let config = create_test_config(&server.uri(), "", "");
    let report = run(&config).await;

    assert!(!report.cancelled);
    assert_eq!(report.total_records(), 2);
    assert_eq!(report.partitions.len(), 1);

    let partition = &report.partitions[0];
    assert_eq!(partition.partition, "Iredell");
    assert_eq!(partition.pages_fetched, 2);
    assert_eq!(partition.termination, Termination::NoListings);

    let first = &report.records[0];
    assert_eq!(first.listing_id, "101");
    assert_eq!(first.partition, "Iredell");
    assert_eq!(first.business_name, "Coffee Shop");
    assert_eq!(first.price, "$450,000");
    assert_eq!(first.revenue, "$900,000");
    assert_eq!(first.franchise, "No");
    assert_eq!(first.location, "Mooresville, NC");
    assert!(first.url.ends_with("/listing/101/"));
    assert!(first.scrape_timestamp.ends_with('Z'));

    assert_eq!(report.records[1].business_name, "Bakery");
}

#[tokio::test]
async fn test_empty_second_page_ends_partition() {
    let server = MockServer::start().await;

    mount_search_page(&server, 1, search_page(&["/listing/101/", "/listing/102/"], true)).await;
    mount_search_page(&server, 2, search_page(&[], false)).await;
    mount_detail_page(&server, "101", "Coffee Shop", "$450,000").await;
    mount_detail_page(&server, "102", "Bakery", "$300,000").await;

    let config = create_test_config(&server.uri(), "", "");
    let report = run(&config).await;

    assert_eq!(report.total_records(), 2);
    assert!(report.records.iter().all(|r| r.partition == "Iredell"));

    let partition = &report.partitions[0];
    assert_eq!(partition.pages_fetched, 2);
    assert_eq!(partition.termination, Termination::NoListings);
}

#[tokio::test]
async fn test_stops_without_next_page() {
    let server = MockServer::start().await;

    mount_search_page(&server, 1, search_page(&["/listing/101/"], false)).await;
    mount_detail_page(&server, "101", "Coffee Shop", "$450,000").await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("page", "2"))
        .respond_with(html(search_page(&[], false)))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), "", "");
    let report = run(&config).await;

    assert_eq!(report.total_records(), 1);
    assert_eq!(report.partitions[0].termination, Termination::NoNextPage);
}

#[tokio::test]
async fn test_links_deduplicated_across_pages() {
    let server = MockServer::start().await;

    mount_search_page(
        &server,
        1,
        search_page(&["/listing/101/", "/listing/101/#photos", "/listing/102/"], true),
    )
    .await;
    mount_search_page(
        &server,
        2,
        search_page(&["/listing/102/?utm_source=grid", "/listing/103/"], false),
    )
    .await;
    mount_detail_page(&server, "101", "Coffee Shop", "$450,000").await;
    mount_detail_page(&server, "103", "Print Shop", "$120,000").await;

    Mock::given(method("GET"))
        .and(path("/listing/102/"))
        .respond_with(html(detail_page("Bakery", "$300,000")))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), "", "");
    let report = run(&config).await;

    let ids: Vec<_> = report.records.iter().map(|r| r.listing_id.as_str()).collect();
    assert_eq!(ids, vec!["101", "102", "103"]);
    assert_eq!(report.partitions[0].termination, Termination::NoNextPage);
}

#[tokio::test]
async fn test_blocked_search_page_yields_empty_partition() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(403))
        .expect(3)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), "", "");
    let report = run(&config).await;

    assert_eq!(report.total_records(), 0);
    assert_eq!(report.partitions[0].pages_fetched, 0);
    assert_eq!(
        report.partitions[0].termination,
        Termination::FirstPageUnavailable
    );
}

#[tokio::test]
async fn test_fetcher_blocked_after_retries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/listing/1/"))
        .respond_with(ResponseTemplate::new(403))
        .expect(3)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), "", "");
    let session = HttpSession::new(&config.crawler, &config.user_agent).unwrap();
    let fetcher = RetryingFetcher::from_config(&config.crawler);
    let url = url::Url::parse(&format!("{}/listing/1/", server.uri())).unwrap();

    let outcome = fetcher
        .fetch(&session, &url, &CancellationToken::new())
        .await;
    assert_eq!(
        outcome,
        FetchOutcome::Blocked {
            status: 403,
            attempts: 3
        }
    );
}

#[tokio::test]
async fn test_fetcher_fails_fast_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/listing/1/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), "", "");
    let session = HttpSession::new(&config.crawler, &config.user_agent).unwrap();
    let fetcher = RetryingFetcher::from_config(&config.crawler);
    let url = url::Url::parse(&format!("{}/listing/1/", server.uri())).unwrap();

    let outcome = fetcher
        .fetch(&session, &url, &CancellationToken::new())
        .await;
    assert_eq!(
        outcome,
        FetchOutcome::Failed {
            cause: FailureCause::Status(500),
            attempts: 1
        }
    );
}

#[tokio::test]
async fn test_fetcher_recovers_after_block() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/listing/1/"))
        .respond_with(ResponseTemplate::new(403))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_detail_page(&server, "1", "Coffee Shop", "$450,000").await;

    let config = create_test_config(&server.uri(), "", "");
    let session = HttpSession::new(&config.crawler, &config.user_agent).unwrap();
    let fetcher = RetryingFetcher::from_config(&config.crawler);
    let url = url::Url::parse(&format!("{}/listing/1/", server.uri())).unwrap();

    let outcome = fetcher
        .fetch(&session, &url, &CancellationToken::new())
        .await;
    assert!(outcome.is_success());
    assert_eq!(outcome.attempts(), 2);
}

#[tokio::test]
async fn test_fetcher_transport_failure_after_retries() {
    let config = create_test_config("http://127.0.0.1:1", "", "");
    let session = HttpSession::new(&config.crawler, &config.user_agent).unwrap();
    let fetcher = RetryingFetcher::from_config(&config.crawler);
    // Nothing listens on port 1
    let url = url::Url::parse("http://127.0.0.1:1/listing/1/").unwrap();

    let outcome = fetcher
        .fetch(&session, &url, &CancellationToken::new())
        .await;
    assert!(
        matches!(
            outcome,
            FetchOutcome::Failed {
                cause: FailureCause::Transport(_),
                attempts: 3
            }
        ),
        "{:?}",
        outcome
    );
}

#[tokio::test]
async fn test_fetcher_exhausted_after_block_and_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/listing/1/"))
        .respond_with(ResponseTemplate::new(403))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/listing/1/"))
        .respond_with(html(detail_page("Slow", "$1")).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri(), "", "");
    config.crawler.request_timeout_seconds = 0.2;
    let session = HttpSession::new(&config.crawler, &config.user_agent).unwrap();
    let fetcher = RetryingFetcher::from_config(&config.crawler);
    let url = url::Url::parse(&format!("{}/listing/1/", server.uri())).unwrap();

    let outcome = fetcher
        .fetch(&session, &url, &CancellationToken::new())
        .await;
    assert_eq!(outcome, FetchOutcome::Exhausted { attempts: 3 });
}

#[tokio::test]
async fn test_detail_failure_is_skipped() {
    let server = MockServer::start().await;

    mount_search_page(&server, 1, search_page(&["/listing/101/", "/listing/404/"], false)).await;
    mount_detail_page(&server, "101", "Coffee Shop", "$450,000").await;

    let config = create_test_config(&server.uri(), "", "");
    let report = run(&config).await;

    assert_eq!(report.total_records(), 1);
    assert_eq!(report.partitions[0].detail_failures, 1);
    assert_eq!(report.partitions[0].termination, Termination::NoNextPage);
}

#[tokio::test]
async fn test_max_listings_per_page() {
    let server = MockServer::start().await;

    mount_search_page(
        &server,
        1,
        search_page(&["/listing/101/", "/listing/102/", "/listing/103/"], false),
    )
    .await;
    mount_detail_page(&server, "101", "Coffee Shop", "$450,000").await;
    mount_detail_page(&server, "102", "Bakery", "$300,000").await;
    mount_detail_page(&server, "103", "Print Shop", "$120,000").await;

    let config = create_test_config(&server.uri(), "max-listings-per-page = 2", "");
    let report = run(&config).await;

    let ids: Vec<_> = report.records.iter().map(|r| r.listing_id.as_str()).collect();
    assert_eq!(ids, vec!["101", "102"]);
}

#[tokio::test]
async fn test_page_ceiling() {
    let server = MockServer::start().await;

    mount_search_page(&server, 1, search_page(&["/listing/101/"], true)).await;
    mount_detail_page(&server, "101", "Coffee Shop", "$450,000").await;

    let config = create_test_config(&server.uri(), "max-pages-per-partition = 1", "");
    let report = run(&config).await;

    assert_eq!(report.total_records(), 1);
    assert_eq!(report.partitions[0].pages_fetched, 1);
    assert_eq!(report.partitions[0].termination, Termination::PageCeiling);
}

#[tokio::test]
async fn test_later_page_failure_keeps_records() {
    let server = MockServer::start().await;

    mount_search_page(&server, 1, search_page(&["/listing/101/"], true)).await;
    mount_detail_page(&server, "101", "Coffee Shop", "$450,000").await;
    // Page 2 is not mounted and answers 404

    let config = create_test_config(&server.uri(), "", "");
    let report = run(&config).await;

    assert_eq!(report.total_records(), 1);
    assert_eq!(report.partitions[0].termination, Termination::PageUnavailable);
}

#[tokio::test]
async fn test_unreachable_partition_does_not_stop_run() {
    let server = MockServer::start().await;

    mount_search_page(&server, 1, search_page(&["/listing/101/"], false)).await;
    mount_detail_page(&server, "101", "Coffee Shop", "$450,000").await;

    let mut config = create_test_config(&server.uri(), "", "");
    config.partitions = vec!["cabarrus".to_string(), "iredell".to_string()];

    let report = run(&config).await;

    assert_eq!(report.partitions.len(), 2);
    assert_eq!(report.partitions[0].partition, "Cabarrus");
    assert_eq!(
        report.partitions[0].termination,
        Termination::FirstPageUnavailable
    );
    assert_eq!(report.partitions[1].partition, "Iredell");
    assert_eq!(report.total_records(), 1);

    let failed: Vec<_> = report.failed_partitions().collect();
    assert_eq!(failed.len(), 1);
}

#[tokio::test]
async fn test_filters_reject_records() {
    let server = MockServer::start().await;

    mount_search_page(&server, 1, search_page(&["/listing/101/", "/listing/102/"], false)).await;
    mount_detail_page(&server, "101", "Coffee Shop", "$450,000").await;
    mount_detail_page(&server, "102", "Vending Route", "$40,000").await;

    let config = create_test_config(&server.uri(), "", "[filters]\nmin-price = 100000\n");
    let report = run(&config).await;

    assert_eq!(report.total_records(), 1);
    assert_eq!(report.records[0].listing_id, "101");
    assert_eq!(report.partitions[0].filtered_out, 1);
}

#[tokio::test]
async fn test_warm_up_visits_site_root() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            html("<html><body>Home</body></html>".to_string())
                .insert_header("set-cookie", "session=abc; Path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;
    // The search page is only served to a request carrying the warm-up cookie
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(header("cookie", "session=abc"))
        .respond_with(html(search_page(&[], false)))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri(), "", "");
    config.site.warm_up = true;

    let report = run(&config).await;
    assert_eq!(report.partitions[0].termination, Termination::NoListings);
}

#[tokio::test]
async fn test_cancelled_run_reports_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), "", "");
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = PartitionOrchestrator::new(&config)
        .unwrap()
        .run(&config.partitions, &cancel)
        .await
        .unwrap();

    assert!(report.cancelled);
    assert!(report.partitions.is_empty());
    assert_eq!(report.total_records(), 0);
}

#[tokio::test]
async fn test_cancel_mid_partition_keeps_records() {
    let server = MockServer::start().await;
    let cancel = CancellationToken::new();

    mount_search_page(
        &server,
        1,
        search_page(&["/listing/101/", "/listing/102/", "/listing/103/"], true),
    )
    .await;
    mount_detail_page(&server, "101", "Coffee Shop", "$450,000").await;
    Mock::given(method("GET"))
        .and(path("/listing/102/"))
        .respond_with(CancelOnRequest {
            cancel: cancel.clone(),
        })
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/listing/103/"))
        .respond_with(html(detail_page("Print Shop", "$120,000")))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri(), "", "");
    config.partitions = vec!["iredell".to_string(), "cabarrus".to_string()];

    let report = PartitionOrchestrator::new(&config)
        .unwrap()
        .run(&config.partitions, &cancel)
        .await
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.partitions.len(), 1);
    assert_eq!(report.partitions[0].termination, Termination::Cancelled);
    assert_eq!(report.total_records(), 1);
    assert_eq!(report.records[0].listing_id, "101");
    assert_eq!(report.records[0].business_name, "Coffee Shop");
}

#[tokio::test]
async fn test_crawl_then_backup_and_publish() {
    let server = MockServer::start().await;

    mount_search_page(&server, 1, search_page(&["/listing/101/", "/listing/102/"], false)).await;
    mount_detail_page(&server, "101", "Coffee Shop", "$450,000").await;
    mount_detail_page(&server, "102", "Bakery", "$300,000").await;

    let config = create_test_config(&server.uri(), "", "");
    let report = run(&config).await;

    let dir = TempDir::new().unwrap();

    let backup = JsonBackup::new(dir.path().join("listings.json"));
    backup.write_backup(&report.records).unwrap();
    assert_eq!(backup.load().unwrap(), report.records);

    let mut publisher = SqlitePublisher::new(&dir.path().join("listings.db")).unwrap();
    let run_meta = RunMetadata::from_report(&report, "testhash");
    publisher.publish(&report.records, &run_meta).unwrap();

    assert_eq!(publisher.load_listings().unwrap(), report.records);
    let latest = publisher.latest_run().unwrap().unwrap();
    assert_eq!(latest.record_count, 2);
    assert_eq!(latest.status, RunStatus::Completed);
}
