use super::settings::EntityRef;
use super::transform::RawEvent;
use eventtap_core::{Error, Result, RunLogger};
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};

pub const EVENTS_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// Thin client over `GET /repos/{owner}/{repo}/events`.
///
/// No timeout is configured; a request waits as long as the transport allows.
#[derive(Clone)]
pub struct EventsClient {
    http: Client,
    api_base: String,
    token: Option<String>,
}

impl EventsClient {
    pub fn new(http: Client, api_base: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            token,
        }
    }

    pub fn events_url(&self, repo: &EntityRef) -> String {
        format!(
            "{}/repos/{}/{}/events",
            self.api_base, repo.owner, repo.name
        )
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut h = HeaderMap::new();
        h.insert(USER_AGENT, HeaderValue::from_static("eventtap"));
        h.insert(ACCEPT, HeaderValue::from_static(EVENTS_MEDIA_TYPE));
        if let Some(token) = &self.token {
            let auth = format!("token {token}");
            h.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth)
                    .map_err(|e| Error::backend("invalid github auth header", e))?,
            );
        }
        Ok(h)
    }

    /// Fetch the latest page of events for one repository.
    ///
    /// The remaining-quota header is logged before the status check; a non-success
    /// status is returned as `Error::Upstream`.
    #[tracing::instrument(level = "info", skip(self, repo, logger), fields(repo = %repo))]
    pub async fn list_repo_events(
        &self,
        repo: &EntityRef,
        logger: &dyn RunLogger,
    ) -> Result<Vec<RawEvent>> {
        let url = self.events_url(repo);
        let resp = self
            .http
            .get(&url)
            .headers(self.headers()?)
            .send()
            .await
            .map_err(Error::backend_reqwest)?;

        let remaining = resp
            .headers()
            .get(RATE_LIMIT_REMAINING)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("N/A")
            .to_string();
        logger.info(&format!("Remaining GitHub API calls: {remaining}"));

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Upstream {
                status: status.as_u16(),
                url,
            });
        }

        let body = resp.bytes().await.map_err(Error::backend_reqwest)?;
        serde_json::from_slice::<Vec<RawEvent>>(&body)
            .map_err(|e| Error::malformed(format!("decode events for {repo}"), e))
    }
}
