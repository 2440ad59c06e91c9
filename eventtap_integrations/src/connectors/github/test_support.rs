#![cfg(test)]

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// Canned answer for one `owner/name`.
#[derive(Clone)]
pub(crate) struct FakeFeed {
    pub status: u16,
    pub body: String,
    pub rate_remaining: Option<String>,
}

impl FakeFeed {
    pub(crate) fn ok(body: serde_json::Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            rate_remaining: Some("4999".to_string()),
        }
    }

    pub(crate) fn status(status: u16) -> Self {
        Self {
            status,
            body: r#"{"message":"Not Found"}"#.to_string(),
            rate_remaining: None,
        }
    }

    pub(crate) fn raw(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            rate_remaining: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SeenRequest {
    pub repo: String,
    pub accept: Option<String>,
    pub authorization: Option<String>,
}

#[derive(Default)]
struct FakeState {
    feeds: HashMap<String, FakeFeed>,
    seen: Mutex<Vec<SeenRequest>>,
}

/// In-process stand-in for the GitHub REST host, bound to an ephemeral port.
pub(crate) struct FakeGithub {
    base_url: String,
    state: Arc<FakeState>,
    task: tokio::task::JoinHandle<()>,
}

impl FakeGithub {
    pub(crate) async fn start(feeds: Vec<(&str, FakeFeed)>) -> Self {
        let state = Arc::new(FakeState {
            feeds: feeds
                .into_iter()
                .map(|(repo, feed)| (repo.to_string(), feed))
                .collect(),
            seen: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/repos/{owner}/{repo}/events", get(serve_events))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            task,
        }
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn seen(&self) -> Vec<SeenRequest> {
        self.state.seen.lock().unwrap().clone()
    }

    pub(crate) fn seen_repos(&self) -> Vec<String> {
        self.seen().into_iter().map(|r| r.repo).collect()
    }
}

impl Drop for FakeGithub {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve_events(
    State(state): State<Arc<FakeState>>,
    Path((owner, repo)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let key = format!("{owner}/{repo}");
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    state.seen.lock().unwrap().push(SeenRequest {
        repo: key.clone(),
        accept: header("accept"),
        authorization: header("authorization"),
    });

    let Some(feed) = state.feeds.get(&key).cloned() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let mut out = HeaderMap::new();
    out.insert("content-type", HeaderValue::from_static("application/json"));
    if let Some(remaining) = &feed.rate_remaining {
        out.insert(
            "x-ratelimit-remaining",
            HeaderValue::from_str(remaining).unwrap(),
        );
    }
    let status = StatusCode::from_u16(feed.status).unwrap();
    (status, out, feed.body).into_response()
}
