//! Shared helpers for postsync integration tests.
//!
//! - `TestEnv`: in-memory store, wiremock server and a fixed clock wired
//!   into a `Reconciler`
//! - `RecordingReporter`: captures every `PassEvent` of a pass
//! - mock helpers for the `/posts/{id}` endpoint

#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use postsync::db::post_repo::{self, PostRow};
use postsync::{
    Database, FixedClock, HttpRemote, PassEvent, PassReporter, Reconciler, RetryPolicy,
    SqliteStore,
};

pub type TestReconciler = Reconciler<SqliteStore, HttpRemote, FixedClock>;

/// The instant every timestamp written during a test pass carries.
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

pub const TEST_NOW_RFC3339: &str = "2026-01-01T00:00:00+00:00";

pub struct TestEnv {
    pub server: MockServer,
    pub db: Database,
}

impl TestEnv {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
            db: Database::open_in_memory().expect("in-memory database"),
        }
    }

    /// Inserts pending posts with the given ids.
    pub fn seed(&self, ids: &[i64]) {
        for id in ids {
            post_repo::insert(&self.db, &PostRow::pending(*id)).expect("seed post");
        }
    }

    pub fn insert(&self, post: PostRow) {
        post_repo::insert(&self.db, &post).expect("insert post");
    }

    pub fn post(&self, id: i64) -> PostRow {
        post_repo::find_by_id(&self.db, id)
            .expect("query post")
            .expect("post exists")
    }

    /// A reconciler with the default retry budget (3) and no delay.
    pub fn reconciler(&self) -> TestReconciler {
        self.reconciler_with(RetryPolicy::new(3, Duration::ZERO))
    }

    pub fn reconciler_with(&self, policy: RetryPolicy<postsync::RemoteError>) -> TestReconciler {
        let remote = HttpRemote::with_client(reqwest::Client::new(), &self.server.uri());
        Reconciler::new(
            SqliteStore::new(self.db.clone()),
            remote,
            FixedClock::new(test_now()),
            policy,
        )
    }
}

/// Collects every event of a pass.
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<PassEvent>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<PassEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn retries_for(&self, id: i64) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, PassEvent::Retry { id: i, .. } if *i == id))
            .count()
    }
}

impl PassReporter for RecordingReporter {
    fn report(&self, event: PassEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn post_body(title: &str, body: &str, user_id: i64) -> serde_json::Value {
    json!({ "userId": user_id, "id": 0, "title": title, "body": body })
}

/// `GET /posts/{id}` answers 200 with the given post.
pub async fn mock_post(server: &MockServer, id: i64, title: &str, body: &str, user_id: i64) {
    Mock::given(method("GET"))
        .and(path(format!("/posts/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_body(title, body, user_id)))
        .mount(server)
        .await;
}

/// `GET /posts/{id}` always answers with `status`; expects exactly `calls` requests.
pub async fn mock_status(server: &MockServer, id: i64, status: u16, calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/posts/{}", id)))
        .respond_with(ResponseTemplate::new(status))
        .expect(calls)
        .mount(server)
        .await;
}

/// First `fail_count` requests answer 500, later ones answer 200 with the post.
pub async fn mock_flaky_post(
    server: &MockServer,
    id: i64,
    fail_count: u64,
    title: &str,
    body: &str,
    user_id: i64,
) {
    Mock::given(method("GET"))
        .and(path(format!("/posts/{}", id)))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(fail_count)
        .mount(server)
        .await;

    mock_post(server, id, title, body, user_id).await;
}
