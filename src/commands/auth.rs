use crate::credential::{Credential, CredentialKind};
use crate::github::GitHubErrorStatus;
use crate::oauth::{self, OAuthConfig, OAuthError};
use crate::redact::redact_secrets;
use crate::state::AppState;
use crate::types::{AuthState, IpcError, IpcErrorCode, IpcResult};
use tauri::{AppHandle, Emitter, EventTarget, Runtime, State};
use tauri_plugin_opener::OpenerExt as _;

type CommandResult<T> = Result<T, IpcError>;

const AUTH_EVENT: &str = "auth:changed";

pub(super) async fn auth_state<R: Runtime>(state: &AppState<R>) -> AuthState {
    let credential = state.credential.load().await.ok().flatten();

    let mut login = state.viewer_login.lock().await.clone();
    if login.is_none() {
        if let Some(credential) = credential.as_ref() {
            if let Ok(user) = state.github.fetch_viewer(credential.token()).await {
                *state.viewer_login.lock().await = Some(user.login.clone());
                login = Some(user.login);
            }
        }
    }

    AuthState {
        kind: credential.as_ref().map(Credential::kind),
        login: credential.as_ref().and(login),
        oauth_available: OAuthConfig::is_configured(),
        oauth_pending: state.oauth_attempts.lock().await.is_pending(),
    }
}

fn viewer_error<T>(status: GitHubErrorStatus) -> IpcResult<T> {
    match status {
        GitHubErrorStatus::Unauthorized => IpcResult::err(
            IpcErrorCode::Unauthorized,
            "Can't authenticate with this token. Create a new one.",
        ),
        GitHubErrorStatus::RateLimited => {
            IpcResult::err(IpcErrorCode::RateLimited, "GitHub rate limit reached. Try again later.")
        }
        GitHubErrorStatus::Error => {
            IpcResult::err(IpcErrorCode::Network, "Could not reach GitHub to verify the token.")
        }
    }
}

/// Message shown when signing in as `wanted` while a credential of another kind is stored.
pub(crate) fn kind_switch_error(
    existing: Option<CredentialKind>,
    wanted: CredentialKind,
) -> Option<String> {
    match existing {
        Some(existing) if existing != wanted => Some(format!(
            "Signed in with {}. Log out before switching to {}.",
            existing.label(),
            wanted.label()
        )),
        _ => None,
    }
}

/// Rejects a sign-in of `wanted` while a credential of the other kind is stored.
async fn ensure_kind_allowed<R: Runtime, T>(
    state: &AppState<R>,
    wanted: CredentialKind,
) -> Result<(), IpcResult<T>> {
    let existing = match state.credential.load().await {
        Ok(existing) => existing.map(|c| c.kind()),
        Err(e) => return Err(IpcResult::err(IpcErrorCode::Keyring, e.to_string())),
    };
    match kind_switch_error(existing, wanted) {
        Some(message) => Err(IpcResult::err(IpcErrorCode::Validation, message)),
        None => Ok(()),
    }
}

/// Saves a verified credential and wakes the refresh loop, which may be paused on a missing token.
async fn store_credential<R: Runtime>(
    state: &AppState<R>,
    credential: Credential,
    login: String,
) -> IpcResult<AuthState> {
    // Something else may have been stored while GitHub was being asked.
    if let Err(rejected) = ensure_kind_allowed(state, credential.kind()).await {
        return rejected;
    }

    if let Err(e) = state.credential.save(&credential).await {
        log::warn!("{e}");
        return IpcResult::err(IpcErrorCode::Keyring, e.to_string());
    }

    *state.viewer_login.lock().await = Some(login.clone());
    *state.seen_thread_ids.lock().await = None;
    log::info!("signed in to GitHub as {login}");

    state.refresh.trigger();
    IpcResult::ok(auth_state(state).await)
}

#[tauri::command]
pub async fn auth_save_personal_token<R: Runtime>(
    _app: AppHandle<R>,
    state: State<'_, AppState<R>>,
    token: String,
) -> CommandResult<IpcResult<AuthState>> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(IpcResult::err(
            IpcErrorCode::Validation,
            "Enter a personal access token.",
        ));
    }

    if let Err(rejected) =
        ensure_kind_allowed(state.inner(), CredentialKind::PersonalAccessToken).await
    {
        return Ok(rejected);
    }

    let user = match state.github.fetch_viewer(token).await {
        Ok(user) => user,
        Err(status) => {
            log::warn!("personal access token rejected ({status:?})");
            return Ok(viewer_error(status));
        }
    };

    Ok(store_credential(
        state.inner(),
        Credential::PersonalAccessToken(token.to_string()),
        user.login,
    )
    .await)
}

async fn complete_oauth<R: Runtime>(
    state: &AppState<R>,
    config: &OAuthConfig,
    pending: oauth::PendingLogin,
) -> IpcResult<AuthState> {
    let redirect_uri = pending.redirect_uri.clone();
    let code = match pending.wait_for_code(oauth::LOGIN_TIMEOUT).await {
        Ok(code) => code,
        Err(e) => return oauth_error(e),
    };

    let token = match config
        .exchange_code(state.github.http(), &code, &redirect_uri)
        .await
    {
        Ok(token) => token,
        Err(e) => return oauth_error(e),
    };

    let user = match state.github.fetch_viewer(&token).await {
        Ok(user) => user,
        Err(status) => return viewer_error(status),
    };

    store_credential(state, Credential::OAuth(token), user.login).await
}

fn oauth_error<T>(e: OAuthError) -> IpcResult<T> {
    let message = redact_secrets(&e.to_string()).to_string();
    log::warn!("OAuth sign-in failed: {message}");
    IpcResult::err(IpcErrorCode::OAuth, message)
}

/// Opens GitHub's authorize page and finishes the sign-in in the background.
///
/// A second call replaces a sign-in that is still waiting. The outcome arrives as an
/// `auth:changed` event carrying an `IpcResult<AuthState>`.
#[tauri::command]
pub async fn auth_start_oauth<R: Runtime>(
    app: AppHandle<R>,
    state: State<'_, AppState<R>>,
) -> CommandResult<IpcResult<()>> {
    let config = match OAuthConfig::from_env() {
        Ok(config) => config,
        Err(e) => return Ok(oauth_error(e)),
    };

    if let Err(rejected) = ensure_kind_allowed(state.inner(), CredentialKind::OAuth).await {
        return Ok(rejected);
    }

    let mut attempts = state.oauth_attempts.lock().await;
    let id = attempts.replace();

    let pending = match oauth::begin_login(&config).await {
        Ok(pending) => pending,
        Err(e) => return Ok(oauth_error(e)),
    };

    if let Err(e) = app.opener().open_url(&pending.authorize_url, None::<&str>) {
        return Ok(IpcResult::err(
            IpcErrorCode::OAuth,
            format!("Could not open the browser: {e}"),
        ));
    }

    log::info!("waiting for GitHub OAuth authorization (attempt {id})");

    let task_state = state.inner().clone();
    let task = tauri::async_runtime::spawn(async move {
        let outcome = complete_oauth(&task_state, &config, pending).await;
        if !task_state.oauth_attempts.lock().await.finish(id) {
            return;
        }
        // Re-read so the event no longer reports this attempt as pending.
        let outcome = if outcome.is_ok() {
            IpcResult::ok(auth_state(&task_state).await)
        } else {
            outcome
        };
        let _ = app.emit_to(EventTarget::any(), AUTH_EVENT, outcome);
    });
    attempts.track(id, task);

    Ok(IpcResult::ok(()))
}

#[tauri::command]
pub async fn auth_logout<R: Runtime>(
    app: AppHandle<R>,
    state: State<'_, AppState<R>>,
) -> CommandResult<IpcResult<AuthState>> {
    state.oauth_attempts.lock().await.cancel();
    state.clear_account().await;
    log::info!("signed out of GitHub");

    state
        .update_snapshot(&app, Some(crate::refresh::missing_token_snapshot()))
        .await;

    let auth = auth_state(state.inner()).await;
    let _ = app.emit_to(
        EventTarget::any(),
        AUTH_EVENT,
        IpcResult::ok(auth.clone()),
    );
    Ok(IpcResult::ok(auth))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_switch_error_requires_logout_before_switching() {
        let message = kind_switch_error(
            Some(CredentialKind::PersonalAccessToken),
            CredentialKind::OAuth,
        )
        .unwrap();
        assert!(message.starts_with("Signed in with"));
        assert!(message.contains("Log out before switching"));

        assert!(kind_switch_error(
            Some(CredentialKind::OAuth),
            CredentialKind::PersonalAccessToken
        )
        .is_some());
    }

    #[test]
    fn kind_switch_error_allows_same_kind_or_empty_store() {
        assert_eq!(kind_switch_error(None, CredentialKind::OAuth), None);
        assert_eq!(
            kind_switch_error(None, CredentialKind::PersonalAccessToken),
            None
        );
        assert_eq!(
            kind_switch_error(
                Some(CredentialKind::PersonalAccessToken),
                CredentialKind::PersonalAccessToken
            ),
            None
        );
    }

    #[test]
    fn viewer_error_maps_statuses_to_codes() {
        let json = serde_json::to_value(viewer_error::<()>(GitHubErrorStatus::Unauthorized)).unwrap();
        assert_eq!(json["error"]["code"], "UNAUTHORIZED");
        let json = serde_json::to_value(viewer_error::<()>(GitHubErrorStatus::RateLimited)).unwrap();
        assert_eq!(json["error"]["code"], "RATE_LIMITED");
    }
}
