use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationsStatus {
    Ok,
    Unauthorized,
    RateLimited,
    Error,
    MissingToken,
}

/// Why GitHub delivered a thread to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationReason {
    ApprovalRequested,
    Assign,
    Author,
    CiActivity,
    Comment,
    Invitation,
    Manual,
    MemberFeatureRequested,
    Mention,
    ReviewRequested,
    SecurityAdvisoryCredit,
    SecurityAlert,
    StateChange,
    Subscribed,
    TeamMention,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSubject {
    pub title: String,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRepository {
    pub full_name: String,
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationThread {
    pub id: String,
    pub reason: NotificationReason,
    pub updated_at: Option<String>,
    pub subject: NotificationSubject,
    pub repository: NotificationRepository,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSummary {
    pub id: String,
    pub title: String,
    pub repository: String,
    pub reason: NotificationReason,
    pub web_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotificationsSnapshot {
    Ok {
        count: usize,
        threads: Vec<ThreadSummary>,
        #[serde(rename = "lastUpdatedAt")]
        last_updated_at: String,
    },
    Unauthorized {
        #[serde(rename = "lastUpdatedAt")]
        last_updated_at: String,
        #[serde(rename = "errorMessage")]
        error_message: Option<String>,
    },
    RateLimited {
        #[serde(rename = "lastUpdatedAt")]
        last_updated_at: String,
        #[serde(rename = "errorMessage")]
        error_message: Option<String>,
    },
    Error {
        #[serde(rename = "lastUpdatedAt")]
        last_updated_at: String,
        #[serde(rename = "errorMessage")]
        error_message: Option<String>,
    },
    MissingToken {
        #[serde(rename = "lastUpdatedAt")]
        last_updated_at: String,
        #[serde(rename = "errorMessage")]
        error_message: Option<String>,
    },
}

impl NotificationsSnapshot {
    pub fn status(&self) -> NotificationsStatus {
        match self {
            Self::Ok { .. } => NotificationsStatus::Ok,
            Self::Unauthorized { .. } => NotificationsStatus::Unauthorized,
            Self::RateLimited { .. } => NotificationsStatus::RateLimited,
            Self::Error { .. } => NotificationsStatus::Error,
            Self::MissingToken { .. } => NotificationsStatus::MissingToken,
        }
    }

    /// Matching thread count; zero for every non-ok state.
    pub fn count(&self) -> usize {
        match self {
            Self::Ok { count, .. } => *count,
            _ => 0,
        }
    }

    pub fn threads(&self) -> &[ThreadSummary] {
        match self {
            Self::Ok { threads, .. } => threads,
            _ => &[],
        }
    }

    pub fn last_updated_at(&self) -> &str {
        match self {
            Self::Ok {
                last_updated_at, ..
            }
            | Self::Unauthorized {
                last_updated_at, ..
            }
            | Self::RateLimited {
                last_updated_at, ..
            }
            | Self::Error {
                last_updated_at, ..
            }
            | Self::MissingToken {
                last_updated_at, ..
            } => last_updated_at,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Ok { .. } => None,
            Self::Unauthorized { error_message, .. }
            | Self::RateLimited { error_message, .. }
            | Self::Error { error_message, .. }
            | Self::MissingToken { error_message, .. } => error_message.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubUser {
    pub login: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IpcErrorCode {
    Unauthorized,
    RateLimited,
    Network,
    Keyring,
    Validation,
    OAuth,
    Updater,
    Unknown,
}

impl IpcErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::RateLimited => "RATE_LIMITED",
            Self::Network => "NETWORK",
            Self::Keyring => "KEYRING",
            Self::Validation => "VALIDATION",
            Self::OAuth => "OAUTH",
            Self::Updater => "UPDATER",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl From<IpcErrorCode> for String {
    fn from(code: IpcErrorCode) -> Self {
        code.as_str().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IpcResult<T> {
    Ok { ok: bool, value: T },
    Err { ok: bool, error: IpcError },
}

impl<T> IpcResult<T> {
    pub fn ok(value: T) -> Self {
        Self::Ok { ok: true, value }
    }

    pub fn err(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Err {
            ok: false,
            error: IpcError {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub kind: Option<crate::credential::CredentialKind>,
    pub login: Option<String>,
    pub oauth_available: bool,
    pub oauth_pending: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsState {
    pub auth: AuthState,
    pub refresh_interval_seconds: u32,
    pub icon_tint: String,
    pub show_notification_count: bool,
    pub notify_on_new_threads: bool,
    pub autostart_enabled: bool,
    pub check_updates_on_startup: bool,
    pub latest_snapshot: Option<NotificationsSnapshot>,
    pub keyring_available: bool,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSettingsPayload {
    pub refresh_interval_seconds: u32,
    pub icon_tint: String,
    pub show_notification_count: bool,
    pub notify_on_new_threads: bool,
    pub autostart_enabled: bool,
    pub check_updates_on_startup: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_reason_deserializes_as_other() {
        let reason: NotificationReason = serde_json::from_str("\"brand_new_reason\"").unwrap();
        assert_eq!(reason, NotificationReason::Other);
        let reason: NotificationReason = serde_json::from_str("\"review_requested\"").unwrap();
        assert_eq!(reason, NotificationReason::ReviewRequested);
    }

    #[test]
    fn snapshot_serializes_with_status_tag() {
        let snapshot = NotificationsSnapshot::MissingToken {
            last_updated_at: "2026-01-01T00:00:00Z".to_string(),
            error_message: None,
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["status"], "missing_token");
        assert_eq!(json["lastUpdatedAt"], "2026-01-01T00:00:00Z");
        assert_eq!(snapshot.count(), 0);
    }

    #[test]
    fn ipc_result_err_uses_error_code_string() {
        let result: IpcResult<()> = IpcResult::err(IpcErrorCode::RateLimited, "slow down");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"]["code"], "RATE_LIMITED");
    }
}
