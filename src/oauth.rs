use crate::redact::redact_secrets;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const ACCESS_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const CALLBACK_PATH: &str = "/oauth/callback";
const SCOPES: [&str; 2] = ["read:user", "notifications"];

const ENV_CLIENT_ID: &str = "OCTOBLAST_GITHUB_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "OCTOBLAST_GITHUB_CLIENT_SECRET";

pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(5 * 60);

const CALLBACK_PAGE_OK: &str = "<!doctype html><html><body style=\"font-family:-apple-system,sans-serif;text-align:center;padding-top:4em\"><h2>OctoBlast is connected to GitHub.</h2><p>You can close this tab.</p></body></html>";
const CALLBACK_PAGE_FAILED: &str = "<!doctype html><html><body style=\"font-family:-apple-system,sans-serif;text-align:center;padding-top:4em\"><h2>GitHub login failed.</h2><p>Return to OctoBlast preferences and try again.</p></body></html>";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("GitHub OAuth app credentials are not configured")]
    CredentialsMissing,
    #[error("could not listen for the OAuth redirect: {0}")]
    Listener(#[from] std::io::Error),
    #[error("timed out waiting for GitHub to redirect back")]
    Timeout,
    #[error("GitHub denied the authorization: {0}")]
    Denied(String),
    #[error("token exchange failed: {0}")]
    Exchange(String),
}

#[derive(Clone)]
pub struct OAuthConfig {
    client_id: String,
    client_secret: String,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl OAuthConfig {
    /// Reads the OAuth app credentials from the environment, then from the values baked in at build time.
    pub fn from_env() -> Result<Self, OAuthError> {
        let client_id = non_empty(std::env::var(ENV_CLIENT_ID).ok())
            .or_else(|| non_empty(option_env!("OCTOBLAST_GITHUB_CLIENT_ID").map(str::to_string)));
        let client_secret = non_empty(std::env::var(ENV_CLIENT_SECRET).ok()).or_else(|| {
            non_empty(option_env!("OCTOBLAST_GITHUB_CLIENT_SECRET").map(str::to_string))
        });

        match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => Ok(Self {
                client_id,
                client_secret,
            }),
            _ => Err(OAuthError::CredentialsMissing),
        }
    }

    pub fn is_configured() -> bool {
        Self::from_env().is_ok()
    }

    pub(crate) fn authorize_url(&self, redirect_uri: &str, state: &str) -> String {
        format!(
            "{AUTHORIZE_URL}?client_id={}&redirect_uri={}&scope={}&state={}",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&SCOPES.join(" ")),
            urlencoding::encode(state),
        )
    }

    pub async fn exchange_code(
        &self,
        http: &reqwest::Client,
        code: &str,
        redirect_uri: &str,
    ) -> Result<String, OAuthError> {
        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: Option<String>,
            error: Option<String>,
            error_description: Option<String>,
        }

        let res = http
            .post(ACCESS_TOKEN_URL)
            .header(ACCEPT, "application/json")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await
            .map_err(|e| OAuthError::Exchange(redact_secrets(&e.to_string()).to_string()))?;

        if !res.status().is_success() {
            return Err(OAuthError::Exchange(format!(
                "GitHub responded with {}",
                res.status().as_u16()
            )));
        }

        let body: TokenResponse = res
            .json()
            .await
            .map_err(|e| OAuthError::Exchange(redact_secrets(&e.to_string()).to_string()))?;

        if let Some(error) = body.error {
            return Err(OAuthError::Exchange(
                body.error_description.unwrap_or(error),
            ));
        }

        body.access_token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| OAuthError::Exchange("response carried no access token".to_string()))
    }
}

fn random_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// A login that has opened its loopback listener and is waiting for GitHub's redirect.
pub struct PendingLogin {
    listener: TcpListener,
    state: String,
    pub redirect_uri: String,
    pub authorize_url: String,
}

pub async fn begin_login(config: &OAuthConfig) -> Result<PendingLogin, OAuthError> {
    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0))).await?;
    let port = listener.local_addr()?.port();
    let redirect_uri = format!("http://127.0.0.1:{port}{CALLBACK_PATH}");
    let state = random_state();
    let authorize_url = config.authorize_url(&redirect_uri, &state);

    log::debug!("waiting for OAuth redirect on {redirect_uri}");

    Ok(PendingLogin {
        listener,
        state,
        redirect_uri,
        authorize_url,
    })
}

/// Query string of GitHub's redirect to the callback route.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Decides what a redirect means for this login.
///
/// `None` means the redirect belongs to some other attempt (or is not a redirect at all)
/// and the listener keeps waiting.
pub(crate) fn classify_callback(
    query: &CallbackQuery,
    expected_state: &str,
) -> Option<Result<String, OAuthError>> {
    if query.state.as_deref() != Some(expected_state) {
        return None;
    }

    if let Some(error) = query.error.as_ref() {
        let reason = query
            .error_description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| error.clone());
        return Some(Err(OAuthError::Denied(reason)));
    }

    query
        .code
        .as_ref()
        .filter(|c| !c.trim().is_empty())
        .map(|code| Ok(code.clone()))
}

struct CallbackState {
    expected_state: String,
    outcome: Mutex<Option<oneshot::Sender<Result<String, OAuthError>>>>,
}

async fn handle_callback(
    State(shared): State<Arc<CallbackState>>,
    Query(query): Query<CallbackQuery>,
) -> (StatusCode, Html<&'static str>) {
    let Some(outcome) = classify_callback(&query, &shared.expected_state) else {
        log::debug!("ignoring OAuth redirect for another login attempt");
        return (StatusCode::BAD_REQUEST, Html(CALLBACK_PAGE_FAILED));
    };

    let page = if outcome.is_ok() {
        CALLBACK_PAGE_OK
    } else {
        CALLBACK_PAGE_FAILED
    };

    let sender = shared.outcome.lock().ok().and_then(|mut slot| slot.take());
    if let Some(sender) = sender {
        let _ = sender.send(outcome);
    }

    (StatusCode::OK, Html(page))
}

impl PendingLogin {
    /// Serves the callback route until a redirect for this login arrives, then returns the code.
    ///
    /// The server shuts down once this returns or the future is dropped.
    pub async fn wait_for_code(self, timeout: Duration) -> Result<String, OAuthError> {
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let shared = Arc::new(CallbackState {
            expected_state: self.state,
            outcome: Mutex::new(Some(outcome_tx)),
        });
        let app = Router::new()
            .route(CALLBACK_PATH, get(handle_callback))
            .with_state(shared);

        let listener = self.listener;
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        let received = tokio::time::timeout(timeout, outcome_rx).await;
        let _ = shutdown_tx.send(());

        match received {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => match server.await {
                Ok(Err(e)) => Err(OAuthError::Listener(e)),
                _ => Err(OAuthError::Listener(std::io::Error::other(
                    "OAuth callback server stopped",
                ))),
            },
            Err(_) => Err(OAuthError::Timeout),
        }
    }
}
