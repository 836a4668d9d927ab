use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Response};
use tracing::info;

use crate::core::error::Result;
use crate::core::observability::{
    ERRORS_TOTAL, INCREMENT_DURATION_MS, INCREMENTS_TOTAL, PAGE_RENDERS_TOTAL, elapsed_ms,
};
use crate::counter::signals::{CountPatch, Signals};
use crate::counter::{sse, view};
use crate::server::AppState;

/// `GET /count`
pub async fn show(State(state): State<AppState>) -> Result<Html<String>> {
    let page = async {
        let count = state.counter.current().await?;
        view::render(count, &state.view)
    }
    .await
    .inspect_err(|_| {
        state
            .metrics
            .incr_counter(ERRORS_TOTAL, 1, &[("route", "show")])
    })?;

    state.metrics.incr_counter(PAGE_RENDERS_TOTAL, 1, &[]);
    Ok(Html(page))
}

/// `PUT /count`
pub async fn increment(State(state): State<AppState>, body: Bytes) -> Result<Response> {
    let started = Instant::now();
    let mode = state.counter.mode().as_str();

    let count = async {
        let signals = Signals::from_body(&body)?;
        state.counter.increment(&signals).await
    }
    .await
    .inspect_err(|_| {
        state
            .metrics
            .incr_counter(ERRORS_TOTAL, 1, &[("route", "increment")])
    })?;

    let event = sse::merge_signals(&CountPatch { count })?;

    state
        .metrics
        .incr_counter(INCREMENTS_TOTAL, 1, &[("mode", mode)]);
    state
        .metrics
        .observe_duration_ms(INCREMENT_DURATION_MS, elapsed_ms(started), &[]);
    info!(count, mode, "Count incremented");

    Ok(sse::single_event(event).into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode, header};
    use tower::ServiceExt;

    use crate::core::observability::InMemoryMetrics;
    use crate::core::storage::{KeyValueStore, SharedStore, StorageConfig};
    use crate::counter::service::{COUNT_KEY, Counter, IncrementMode};
    use crate::counter::view::ViewConfig;
    use crate::server::{AppState, router};
    use crate::store::SqliteStore;

    use super::*;

    async fn test_app(mode: IncrementMode) -> (Router, SharedStore, Arc<InMemoryMetrics>) {
        let store: SharedStore = Arc::new(SqliteStore::in_memory().await.unwrap());
        app_on(store, mode)
    }

    fn app_on(
        store: SharedStore,
        mode: IncrementMode,
    ) -> (Router, SharedStore, Arc<InMemoryMetrics>) {
        let metrics = Arc::new(InMemoryMetrics::new());
        let state = AppState {
            counter: Arc::new(Counter::new(store.clone(), mode)),
            view: Arc::new(ViewConfig::default()),
            metrics: metrics.clone(),
        };
        (router(state, false), store, metrics)
    }

    fn put(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::PUT)
            .uri("/count/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn page_renders_zero_without_stored_value() {
        let (app, _, metrics) = test_app(IncrementMode::Atomic).await;

        let response = app.oneshot(get("/count/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );
        let html = body_text(response).await;
        assert!(html.contains(r#"data-signals="{ count: 0 }""#));
        assert_eq!(metrics.counter(PAGE_RENDERS_TOTAL, &[]), 1);
    }

    #[tokio::test]
    async fn page_renders_stored_value() {
        let (app, store, _) = test_app(IncrementMode::Atomic).await;
        store.set(COUNT_KEY, "5").await.unwrap();

        let html = body_text(app.oneshot(get("/count")).await.unwrap()).await;
        assert!(html.contains(r#"data-signals="{ count: 5 }""#));
    }

    #[tokio::test]
    async fn increment_streams_new_count() {
        let (app, store, metrics) = test_app(IncrementMode::Atomic).await;

        let response = app.oneshot(put(r#"{"count":0}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/event-stream"
        );
        let text = body_text(response).await;
        assert!(text.contains("event: datastar-merge-signals\n"));
        assert!(text.contains("data: signals {\"count\":1}\n"));
        assert_eq!(text.matches("event:").count(), 1);

        assert_eq!(store.get(COUNT_KEY).await.unwrap().as_deref(), Some("1"));
        assert_eq!(metrics.counter(INCREMENTS_TOTAL, &[("mode", "atomic")]), 1);
    }

    #[tokio::test]
    async fn sequential_increments_accumulate() {
        for mode in [IncrementMode::Atomic, IncrementMode::ClientEcho] {
            let (app, store, _) = test_app(mode).await;

            app.clone().oneshot(put(r#"{"count":0}"#)).await.unwrap();
            let text = body_text(app.clone().oneshot(put(r#"{"count":1}"#)).await.unwrap()).await;

            assert!(text.contains("signals {\"count\":2}"), "mode {:?}", mode);
            assert_eq!(store.get(COUNT_KEY).await.unwrap().as_deref(), Some("2"));

            let html = body_text(app.oneshot(get("/count/")).await.unwrap()).await;
            assert!(html.contains(r#"data-signals="{ count: 2 }""#));
        }
    }

    #[tokio::test]
    async fn both_paths_accept_put() {
        let (app, store, _) = test_app(IncrementMode::Atomic).await;

        let request = Request::builder()
            .method(Method::PUT)
            .uri("/count")
            .body(Body::from(r#"{"count":0}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(store.get(COUNT_KEY).await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_atomic_increments_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            path: dir.path().join("counter.db"),
            max_connections: 4,
            ..StorageConfig::default()
        };
        let store: SharedStore = Arc::new(SqliteStore::open(&config).await.unwrap());
        let (app, store, _) = app_on(store, IncrementMode::Atomic);

        // Every client believes the count is still zero.
        let tasks: Vec<_> = (0..8)
            .map(|_| tokio::spawn(app.clone().oneshot(put(r#"{"count":0}"#))))
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap().status(), StatusCode::OK);
        }

        assert_eq!(store.get(COUNT_KEY).await.unwrap().as_deref(), Some("8"));
        store.close().await;
    }

    #[tokio::test]
    async fn concurrent_client_echo_increments_lose_an_update() {
        let (app, store, _) = test_app(IncrementMode::ClientEcho).await;

        let (a, b) = tokio::join!(
            app.clone().oneshot(put(r#"{"count":0}"#)),
            app.clone().oneshot(put(r#"{"count":0}"#)),
        );
        assert!(body_text(a.unwrap()).await.contains("signals {\"count\":1}"));
        assert!(body_text(b.unwrap()).await.contains("signals {\"count\":1}"));

        assert_eq!(store.get(COUNT_KEY).await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let (app, store, metrics) = test_app(IncrementMode::Atomic).await;

        let response = app.oneshot(put("{count: 0")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.get(COUNT_KEY).await.unwrap(), None);
        assert_eq!(metrics.counter(ERRORS_TOTAL, &[("route", "increment")]), 1);
    }

    #[tokio::test]
    async fn client_echo_without_count_is_bad_request() {
        let (app, store, _) = test_app(IncrementMode::ClientEcho).await;

        let response = app.oneshot(put(r#"{"other":1}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.get(COUNT_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_stored_value_is_server_error() {
        let (app, store, _) = test_app(IncrementMode::Atomic).await;
        store.set(COUNT_KEY, "abc").await.unwrap();

        let response = app.clone().oneshot(get("/count/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = app.oneshot(put(r#"{"count":0}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn unknown_method_is_rejected() {
        let (app, _, _) = test_app(IncrementMode::Atomic).await;

        let request = Request::builder()
            .method(Method::DELETE)
            .uri("/count/")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
