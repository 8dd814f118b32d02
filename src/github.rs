use crate::redact::redact_secrets;
use crate::types::{
    GitHubUser, NotificationReason, NotificationThread, NotificationsSnapshot, ThreadSummary,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use thiserror::Error;
use time::OffsetDateTime;

const API_BASE_URL: &str = "https://api.github.com";
const WEB_BASE_URL: &str = "https://github.com";
const API_VERSION: &str = "2022-11-28";
const NOTIFICATIONS_PER_PAGE: u8 = 25;

pub const NOTIFICATIONS_WEB_URL: &str = "https://github.com/notifications";

const TRACKED_REASONS: [NotificationReason; 3] = [
    NotificationReason::ReviewRequested,
    NotificationReason::StateChange,
    NotificationReason::Author,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHubErrorStatus {
    Unauthorized,
    RateLimited,
    Error,
}

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("network error")]
    Network(#[from] reqwest::Error),
    #[error("invalid header value")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
}

fn now_iso() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
    headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("OctoBlast/", env!("CARGO_PKG_VERSION"))),
    );
    headers
}

fn bearer(token: &str) -> Result<HeaderValue, GitHubError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))?;
    value.set_sensitive(true);
    Ok(value)
}

pub(crate) fn map_http_status(status_code: u16, rate_limit_remaining: Option<&str>) -> GitHubErrorStatus {
    match status_code {
        401 => GitHubErrorStatus::Unauthorized,
        429 => GitHubErrorStatus::RateLimited,
        403 if rate_limit_remaining.map(str::trim) == Some("0") => GitHubErrorStatus::RateLimited,
        403 => GitHubErrorStatus::Unauthorized,
        _ => GitHubErrorStatus::Error,
    }
}

fn map_response_status(res: &reqwest::Response) -> GitHubErrorStatus {
    let remaining = res
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok());
    map_http_status(res.status().as_u16(), remaining)
}

/// Keeps pull-request threads the user is reviewing, authored, or that changed state.
pub fn filter_pull_request_threads(threads: &[NotificationThread]) -> Vec<&NotificationThread> {
    threads
        .iter()
        .filter(|t| t.subject.kind == "PullRequest")
        .filter(|t| TRACKED_REASONS.contains(&t.reason))
        .collect()
}

/// Turns a REST subject URL into the page a browser should open.
pub(crate) fn subject_web_url(api_url: Option<&str>, repository_url: Option<&str>) -> String {
    let fallback = || {
        repository_url
            .map(str::to_string)
            .unwrap_or_else(|| NOTIFICATIONS_WEB_URL.to_string())
    };

    let Some(path) = api_url.and_then(|u| u.strip_prefix(API_BASE_URL)) else {
        return fallback();
    };
    let Some(path) = path.strip_prefix("/repos/") else {
        return fallback();
    };

    let path = match path.split_once("/pulls/") {
        Some((repo, number)) => format!("{repo}/pull/{number}"),
        None => path.to_string(),
    };
    format!("{WEB_BASE_URL}/{path}")
}

fn summarize(thread: &NotificationThread) -> ThreadSummary {
    ThreadSummary {
        id: thread.id.clone(),
        title: thread.subject.title.trim().to_string(),
        repository: thread.repository.full_name.clone(),
        reason: thread.reason.clone(),
        web_url: subject_web_url(
            thread.subject.url.as_deref(),
            thread.repository.html_url.as_deref(),
        ),
    }
}

pub(crate) fn snapshot_from_threads(
    threads: &[NotificationThread],
    last_updated_at: String,
) -> NotificationsSnapshot {
    let mut matching = filter_pull_request_threads(threads);
    // Newest activity first; threads without a timestamp go last.
    matching.sort_by_key(|t| {
        std::cmp::Reverse(
            t.updated_at
                .as_deref()
                .and_then(|at| chrono::DateTime::parse_from_rfc3339(at).ok()),
        )
    });
    let matching: Vec<ThreadSummary> = matching.into_iter().map(summarize).collect();
    NotificationsSnapshot::Ok {
        count: matching.len(),
        threads: matching,
        last_updated_at,
    }
}

pub(crate) fn snapshot_from_error(
    status: GitHubErrorStatus,
    message: String,
    last_updated_at: String,
) -> NotificationsSnapshot {
    let error_message = Some(message);
    match status {
        GitHubErrorStatus::Unauthorized => NotificationsSnapshot::Unauthorized {
            last_updated_at,
            error_message,
        },
        GitHubErrorStatus::RateLimited => NotificationsSnapshot::RateLimited {
            last_updated_at,
            error_message,
        },
        GitHubErrorStatus::Error => NotificationsSnapshot::Error {
            last_updated_at,
            error_message,
        },
    }
}

pub struct GitHubApiClient {
    http: reqwest::Client,
}

impl GitHubApiClient {
    pub fn new() -> Result<Self, GitHubError> {
        Ok(Self {
            http: reqwest::Client::builder()
                .default_headers(default_headers())
                .build()?,
        })
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub async fn fetch_viewer(&self, token: &str) -> Result<GitHubUser, GitHubErrorStatus> {
        let auth = bearer(token).map_err(|_| GitHubErrorStatus::Unauthorized)?;
        let res = self
            .http
            .get(format!("{API_BASE_URL}/user"))
            .header(AUTHORIZATION, auth)
            .send()
            .await
            .map_err(|e| {
                log::debug!("GET /user failed: {}", redact_secrets(&e.to_string()));
                GitHubErrorStatus::Error
            })?;

        if !res.status().is_success() {
            return Err(map_response_status(&res));
        }

        res.json::<GitHubUser>()
            .await
            .map_err(|_| GitHubErrorStatus::Error)
    }

    pub async fn list_notifications(
        &self,
        token: &str,
    ) -> Result<Vec<NotificationThread>, (GitHubErrorStatus, String)> {
        let auth = bearer(token).map_err(|_| {
            (
                GitHubErrorStatus::Unauthorized,
                "Access token contains invalid characters.".to_string(),
            )
        })?;
        let url = format!(
            "{API_BASE_URL}/notifications?all=false&participating=true&page=1&per_page={NOTIFICATIONS_PER_PAGE}"
        );

        let res = self
            .http
            .get(url)
            .header(AUTHORIZATION, auth)
            .send()
            .await
            .map_err(|e| {
                (
                    GitHubErrorStatus::Error,
                    redact_secrets(&e.to_string()).to_string(),
                )
            })?;

        if !res.status().is_success() {
            let status = map_response_status(&res);
            let message = match res.status() {
                StatusCode::UNAUTHORIZED => {
                    "Can't authenticate with this token. Create a new one.".to_string()
                }
                other => format!("GitHub API error ({})", other.as_u16()),
            };
            return Err((status, message));
        }

        let text = res.text().await.map_err(|e| {
            (
                GitHubErrorStatus::Error,
                redact_secrets(&e.to_string()).to_string(),
            )
        })?;

        serde_json::from_str::<Vec<NotificationThread>>(&text).map_err(|e| {
            (
                GitHubErrorStatus::Error,
                format!("Unexpected notifications payload: {e}"),
            )
        })
    }

    pub async fn fetch_notifications_snapshot(&self, token: &str) -> NotificationsSnapshot {
        let last_updated_at = now_iso();
        match self.list_notifications(token).await {
            Ok(threads) => {
                log::debug!("fetched {} notification threads", threads.len());
                snapshot_from_threads(&threads, last_updated_at)
            }
            Err((status, message)) => snapshot_from_error(status, message, last_updated_at),
        }
    }
}
