// Best-effort inspection of the bearer token. The signature is NOT
// verified; this only exists to warn the operator early about a token
// that will be rejected for missing scopes or expiry.

use base64::Engine as _;
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// Scopes the management token needs for the full workflow.
pub const REQUIRED_SCOPES: &[&str] = &[
    "read:users",
    "read:organizations",
    "read:roles",
    "create:organization_members",
    "create:organization_member_roles",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub scopes: Vec<String>,
    /// `exp` claim, seconds since the Unix epoch.
    pub expires_at: Option<i64>,
}

impl TokenInfo {
    pub fn missing_scopes(&self) -> Vec<&'static str> {
        REQUIRED_SCOPES
            .iter()
            .copied()
            .filter(|required| !self.scopes.iter().any(|s| s == required))
            .collect()
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

/// Decode the payload of a JWT. Returns `None` for opaque tokens or
/// anything that does not decode as a JSON object.
pub fn inspect(token: &str) -> Option<TokenInfo> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }
    let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .ok()?;
    let claims: Value = serde_json::from_slice(&payload).ok()?;
    if !claims.is_object() {
        return None;
    }

    let scopes = claims
        .get("scope")
        .and_then(Value::as_str)
        .map(|s| s.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    let expires_at = claims.get("exp").and_then(Value::as_i64);

    Some(TokenInfo { scopes, expires_at })
}

/// Log warnings about missing scopes or an expired token.
pub fn warn_on_problems(token: &str) {
    let Some(info) = inspect(token) else {
        tracing::debug!("bearer token is not a JWT, skipping scope check");
        return;
    };

    let missing = info.missing_scopes();
    if !missing.is_empty() {
        tracing::warn!(
            missing = %missing.join(" "),
            "management token lacks scopes needed for user lookup and organization assignment"
        );
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default();
    if info.is_expired_at(now) {
        tracing::warn!(expires_at = ?info.expires_at, "management token has expired, requests will be rejected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn make_jwt(payload: &str) -> String {
        let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        format!(
            "{}.{}.{}",
            engine.encode(r#"{"alg":"RS256"}"#),
            engine.encode(payload),
            engine.encode("sig")
        )
    }

    #[test]
    fn reads_scope_and_exp() {
        let jwt = make_jwt(r#"{"scope":"read:users read:roles","exp":1700000000}"#);
        let info = inspect(&jwt).unwrap();
        assert_eq!(info.scopes, vec!["read:users".to_string(), "read:roles".to_string()]);
        assert_eq!(info.expires_at, Some(1_700_000_000));
        assert_eq!(
            info.missing_scopes(),
            vec![
                "read:organizations",
                "create:organization_members",
                "create:organization_member_roles"
            ]
        );
    }

    #[test]
    fn full_scope_set_has_nothing_missing() {
        let jwt = make_jwt(&format!(r#"{{"scope":"{}"}}"#, REQUIRED_SCOPES.join(" ")));
        assert!(inspect(&jwt).unwrap().missing_scopes().is_empty());
    }

    #[test]
    fn expiry_check() {
        let info = TokenInfo {
            scopes: vec![],
            expires_at: Some(100),
        };
        assert!(info.is_expired_at(100));
        assert!(!info.is_expired_at(99));
        assert!(!TokenInfo { scopes: vec![], expires_at: None }.is_expired_at(i64::MAX));
    }

    #[test]
    fn opaque_tokens_are_skipped() {
        assert_eq!(inspect("opaque-token"), None);
        assert_eq!(inspect("a.!!!.c"), None);
        assert_eq!(inspect(&make_jwt("[1,2]")), None);
    }
}
