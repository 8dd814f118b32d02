use std::borrow::Cow;

const TOKEN_PREFIXES: [&str; 6] = ["github_pat_", "ghp_", "gho_", "ghu_", "ghs_", "ghr_"];

fn is_token_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Redacts GitHub token values (`ghp_…`, `gho_…`, `github_pat_…`), keeping the prefix.
pub fn redact_github_token(input: &str) -> Cow<'_, str> {
    let mut redacted = input.to_string();

    for prefix in TOKEN_PREFIXES {
        if !redacted.contains(prefix) {
            continue;
        }
        let mut out = String::with_capacity(redacted.len());
        let mut rest = redacted.as_str();
        while let Some(idx) = rest.find(prefix) {
            out.push_str(&rest[..idx]);
            rest = &rest[idx + prefix.len()..];

            let consumed: usize = rest
                .chars()
                .take_while(|ch| is_token_char(*ch))
                .map(char::len_utf8)
                .sum();
            if consumed == 0 {
                out.push_str(prefix);
                continue;
            }
            out.push_str(prefix);
            out.push_str("REDACTED");
            rest = &rest[consumed..];
        }
        out.push_str(rest);
        redacted = out;
    }

    if redacted == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(redacted)
    }
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let nee = needle.as_bytes();
    if nee.is_empty() {
        return Some(0);
    }
    if nee.len() > hay.len() {
        return None;
    }

    (0..=hay.len() - nee.len()).find(|&i| hay[i..i + nee.len()].eq_ignore_ascii_case(nee))
}

/// Whether the marker at `idx` starts a parameter rather than sitting inside a longer name.
fn at_param_boundary(text: &str, idx: usize) -> bool {
    match text[..idx].chars().next_back() {
        None => true,
        Some(ch) => ch == '?' || ch == '&' || ch.is_whitespace(),
    }
}

fn redact_until(
    text: String,
    marker: &str,
    param_boundary: bool,
    stop: impl Fn(char) -> bool,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text.as_str();
    let mut consumed_before = 0;
    loop {
        let Some(idx) = find_ascii_case_insensitive(rest, marker) else {
            out.push_str(rest);
            break;
        };
        // Keep the marker exactly as it appeared in the input.
        out.push_str(&rest[..idx + marker.len()]);
        let boundary_ok = !param_boundary || at_param_boundary(&text, consumed_before + idx);
        consumed_before += idx + marker.len();
        rest = &rest[idx + marker.len()..];
        if !boundary_ok {
            continue;
        }

        if let Some(' ') = rest.chars().next() {
            out.push(' ');
            consumed_before += 1;
            rest = &rest[1..];
        }

        let consumed: usize = rest
            .chars()
            .take_while(|ch| !stop(*ch))
            .map(char::len_utf8)
            .sum();
        out.push_str("REDACTED");
        consumed_before += consumed;
        rest = &rest[consumed..];
    }
    out
}

/// Redacts tokens, `Authorization:` header lines and OAuth query parameters.
pub fn redact_secrets(input: &str) -> Cow<'_, str> {
    let mut value = redact_github_token(input).into_owned();

    value = redact_until(value, "Authorization:", false, |ch| ch == '\n' || ch == '\r');
    for param in ["access_token=", "client_secret=", "code="] {
        value = redact_until(value, param, true, |ch| {
            ch == '&' || ch == '"' || ch.is_whitespace()
        });
    }

    if value == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_github_token_keeps_prefix() {
        let out = redact_github_token("bad credentials for ghp_abcDEF123 today");
        assert_eq!(out, "bad credentials for ghp_REDACTED today");
    }

    #[test]
    fn redact_github_token_handles_fine_grained_tokens() {
        let out = redact_github_token("token=github_pat_11AA_bbb");
        assert_eq!(out, "token=github_pat_REDACTED");
    }

    #[test]
    fn redact_github_token_borrows_when_clean() {
        assert!(matches!(
            redact_github_token("nothing to see"),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn redact_secrets_redacts_authorization_header_line() {
        let input = "authorization: Bearer sk-live-xyz\nOther: ok\n";
        let out = redact_secrets(input).to_string();
        assert_eq!(out, "authorization: REDACTED\nOther: ok\n");
    }

    #[test]
    fn redact_secrets_redacts_oauth_query_values() {
        let input = "GET /oauth/callback?code=abc123&state=xyz";
        let out = redact_secrets(input).to_string();
        assert_eq!(out, "GET /oauth/callback?code=REDACTED&state=xyz");
    }

    #[test]
    fn redact_secrets_leaves_longer_parameter_names_alone() {
        let input = "error=bad&error_code=bad_verification_code&statuscode=401";
        assert_eq!(redact_secrets(input), input);

        let out = redact_secrets("error_code=x&code=secret").to_string();
        assert_eq!(out, "error_code=x&code=REDACTED");
    }

    #[test]
    fn redact_secrets_redacts_param_at_start_of_text() {
        let out = redact_secrets("code=abc&state=1").to_string();
        assert_eq!(out, "code=REDACTED&state=1");
    }
}
