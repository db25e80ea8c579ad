use async_trait::async_trait;
use leaderboard::{
    error::StoreError,
    models::{LeaderboardEntry, ScoreEntry, Submission},
    router,
    state::AppState,
    store::{ScoreStore, SqliteStore},
};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;

const INDEX_HTML: &str = "<h1>Leaderboard</h1>";

struct TestApp {
    base: String,
    client: Client,
    _dir: TempDir,
}

impl TestApp {
    async fn spawn() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("leaderboard.db"))
            .await
            .unwrap();
        Self::spawn_with(dir, AppState::new(store)).await
    }

    async fn spawn_with(dir: TempDir, state: AppState) -> Self {
        let static_dir = dir.path().join("static");
        std::fs::create_dir_all(&static_dir).unwrap();
        std::fs::write(static_dir.join("index.html"), INDEX_HTML).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let app = router(state, &static_dir);
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        Self {
            base: format!("http://{address}"),
            client: Client::new(),
            _dir: dir,
        }
    }

    async fn submit(&self, body: Value) -> (StatusCode, Value) {
        let response = self
            .client
            .post(format!("{}/api/leaderboard", self.base))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status();
        (status, response.json().await.unwrap())
    }

    async fn submit_raw(&self, body: &'static str) -> (StatusCode, Value) {
        let response = self
            .client
            .post(format!("{}/api/leaderboard", self.base))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .unwrap();
        let status = response.status();
        (status, response.json().await.unwrap())
    }

    async fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let response = self
            .client
            .get(format!("{}/api/leaderboard", self.base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        response.json().await.unwrap()
    }
}

/// Store whose every call fails, standing in for a broken database.
struct FailingStore;

#[async_trait]
impl ScoreStore for FailingStore {
    async fn insert(&self, _submission: &Submission) -> Result<ScoreEntry, StoreError> {
        Err(StoreError::Sql(sqlx::Error::PoolClosed))
    }

    async fn leaderboard(&self, _limit: u32) -> Result<Vec<LeaderboardEntry>, StoreError> {
        Err(StoreError::Sql(sqlx::Error::PoolClosed))
    }

    async fn rank(&self, _email: &str) -> Result<Option<i64>, StoreError> {
        Err(StoreError::Sql(sqlx::Error::PoolClosed))
    }
}

#[tokio::test]
async fn first_submission_ranks_first_and_shows_on_leaderboard() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .submit(json!({"name": "Ann", "email": "a@x.com", "score": 50}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "rank": 1}));
    assert_eq!(
        app.leaderboard().await,
        vec![LeaderboardEntry {
            name: "Ann".to_string(),
            email: "a@x.com".to_string(),
            score: 50,
        }]
    );
}

#[tokio::test]
async fn empty_leaderboard_is_an_empty_array() {
    let app = TestApp::spawn().await;

    assert!(app.leaderboard().await.is_empty());
}

#[tokio::test]
async fn malformed_bodies_are_invalid_json() {
    let app = TestApp::spawn().await;
    let expected = json!({"error": "Invalid JSON"});

    for body in ["not json", "", "{}", "null", "[1, 2]", "{\"name\": \"Ann\""] {
        let (status, response) = app.submit_raw(body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
        assert_eq!(response, expected, "body {body:?}");
    }
}

#[tokio::test]
async fn invalid_fields_are_rejected_without_storing() {
    let app = TestApp::spawn().await;
    let expected = json!({"error": "Missing or invalid fields"});

    for body in [
        json!({"name": "", "email": "a@x.com", "score": 10}),
        json!({"name": "A", "email": "  ", "score": 10}),
        json!({"score": -1, "name": "A", "email": "b@x.com"}),
        json!({"name": "A", "email": "b@x.com", "score": 3.5}),
        json!({"name": "A", "email": "b@x.com", "score": "10"}),
        json!({"name": "A", "email": "b@x.com", "score": true}),
        json!({"name": "A", "email": "b@x.com"}),
    ] {
        let (status, response) = app.submit(body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        assert_eq!(response, expected, "body {body}");
    }

    assert!(app.leaderboard().await.is_empty());
}

#[tokio::test]
async fn text_fields_are_trimmed_and_truncated() {
    let app = TestApp::spawn().await;
    let name = format!("  {}  ", "x".repeat(40));

    let (status, _) = app
        .submit(json!({"name": name, "email": " a@x.com ", "score": 5}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let board = app.leaderboard().await;
    assert_eq!(board[0].name, "x".repeat(30));
    assert_eq!(board[0].email, "a@x.com");
}

#[tokio::test]
async fn leaderboard_reports_best_score_and_caps_at_ten() {
    let app = TestApp::spawn().await;

    for i in 0..12 {
        let email = format!("player{i}@x.com");
        app.submit(json!({"name": "P", "email": email, "score": i}))
            .await;
    }
    app.submit(json!({"name": "P", "email": "player0@x.com", "score": 100}))
        .await;
    app.submit(json!({"name": "P", "email": "player0@x.com", "score": 1}))
        .await;

    let board = app.leaderboard().await;

    assert_eq!(board.len(), 10);
    assert_eq!(board[0].email, "player0@x.com");
    assert_eq!(board[0].score, 100);
    assert!(board.windows(2).all(|pair| pair[0].score >= pair[1].score));
}

#[tokio::test]
async fn ties_share_rank_over_http() {
    let app = TestApp::spawn().await;

    let (_, ann) = app
        .submit(json!({"name": "Ann", "email": "a@x.com", "score": 80}))
        .await;
    let (_, bob) = app
        .submit(json!({"name": "Bob", "email": "b@x.com", "score": 80}))
        .await;
    let (_, cid) = app
        .submit(json!({"name": "Cid", "email": "c@x.com", "score": 70}))
        .await;

    assert_eq!(ann["rank"], 1);
    assert_eq!(bob["rank"], 1);
    assert_eq!(cid["rank"], 3);
}

#[tokio::test]
async fn lower_score_keeps_rank_and_personal_best_improves_it() {
    let app = TestApp::spawn().await;
    app.submit(json!({"name": "Bob", "email": "b@x.com", "score": 60}))
        .await;

    let (_, first) = app
        .submit(json!({"name": "Ann", "email": "a@x.com", "score": 50}))
        .await;
    let (_, lower) = app
        .submit(json!({"name": "Ann", "email": "a@x.com", "score": 10}))
        .await;
    let (_, best) = app
        .submit(json!({"name": "Ann", "email": "a@x.com", "score": 90}))
        .await;

    assert_eq!(first["rank"], 2);
    assert_eq!(lower["rank"], 2);
    assert_eq!(best["rank"], 1);
}

#[tokio::test]
async fn storage_failure_is_a_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let app = TestApp::spawn_with(dir, AppState::new(FailingStore)).await;
    let expected = json!({"error": "Internal server error"});

    let response = app
        .client
        .get(format!("{}/api/leaderboard", app.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>().await.unwrap(), expected);

    let (status, body) = app
        .submit(json!({"name": "Ann", "email": "a@x.com", "score": 50}))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, expected);

    // Validation still answers before storage is reached.
    let (status, body) = app.submit_raw("not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid JSON"}));
}

#[tokio::test]
async fn front_page_is_served_from_static_dir() {
    let app = TestApp::spawn().await;

    let response = app.client.get(&app.base).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), INDEX_HTML);
}
