use serde::{Deserialize, Serialize};

const SEPARATOR: char = '|';
const KIND_PAT: &str = "pat";
const KIND_OAUTH: &str = "oauth";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CredentialKind {
    #[serde(rename = "pat")]
    PersonalAccessToken,
    #[serde(rename = "oauth")]
    OAuth,
}

impl CredentialKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::PersonalAccessToken => "Personal Access Token",
            Self::OAuth => "OAuth",
        }
    }
}

/// A GitHub access credential as persisted in the OS secret store.
///
/// Stored as a single `"<kind>|<token>"` string. Values written before the kind
/// prefix existed carry no separator and are read back as personal access tokens.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    PersonalAccessToken(String),
    OAuth(String),
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Credential")
            .field(&self.kind())
            .field(&"REDACTED")
            .finish()
    }
}

impl Credential {
    pub fn kind(&self) -> CredentialKind {
        match self {
            Self::PersonalAccessToken(_) => CredentialKind::PersonalAccessToken,
            Self::OAuth(_) => CredentialKind::OAuth,
        }
    }

    pub fn token(&self) -> &str {
        match self {
            Self::PersonalAccessToken(token) | Self::OAuth(token) => token,
        }
    }

    pub fn encode(&self) -> String {
        let head = match self.kind() {
            CredentialKind::PersonalAccessToken => KIND_PAT,
            CredentialKind::OAuth => KIND_OAUTH,
        };
        format!("{head}{SEPARATOR}{}", self.token())
    }

    pub fn decode(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let Some((head, body)) = raw.split_once(SEPARATOR) else {
            return Some(Self::PersonalAccessToken(raw.to_string()));
        };

        let body = body.trim();
        if body.is_empty() {
            return None;
        }

        match head.trim() {
            KIND_OAUTH => Some(Self::OAuth(body.to_string())),
            _ => Some(Self::PersonalAccessToken(body.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_prefixes_kind() {
        assert_eq!(
            Credential::PersonalAccessToken("ghp_abc".into()).encode(),
            "pat|ghp_abc"
        );
        assert_eq!(Credential::OAuth("gho_xyz".into()).encode(), "oauth|gho_xyz");
    }

    #[test]
    fn decode_reads_both_kinds() {
        assert_eq!(
            Credential::decode("pat|ghp_abc"),
            Some(Credential::PersonalAccessToken("ghp_abc".into()))
        );
        assert_eq!(
            Credential::decode("oauth|gho_xyz"),
            Some(Credential::OAuth("gho_xyz".into()))
        );
    }

    #[test]
    fn decode_treats_unprefixed_value_as_personal_access_token() {
        assert_eq!(
            Credential::decode("  ghp_legacy  "),
            Some(Credential::PersonalAccessToken("ghp_legacy".into()))
        );
    }

    #[test]
    fn decode_rejects_empty_values() {
        assert_eq!(Credential::decode(""), None);
        assert_eq!(Credential::decode("   "), None);
        assert_eq!(Credential::decode("oauth|"), None);
        assert_eq!(Credential::decode("pat|  "), None);
    }

    #[test]
    fn decode_unknown_kind_falls_back_to_personal_access_token() {
        assert_eq!(
            Credential::decode("unknown|tok"),
            Some(Credential::PersonalAccessToken("tok".into()))
        );
    }

    #[test]
    fn debug_output_hides_token() {
        let out = format!("{:?}", Credential::OAuth("gho_secret".into()));
        assert!(!out.contains("gho_secret"));
        assert!(out.contains("OAuth"));
    }
}
