//! Token response parsing.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{CredentialError, Result};

/// The wire shape of a successful token response. Unknown fields are
/// ignored; `expires_on` in particular varies by source and is not trusted.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
    refresh_in: Option<u64>,
}

/// An acquired access token with its computed expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// The bearer token value.
    pub token: String,
    /// Absolute expiry, computed from `expires_in` against the local clock
    /// at the time the response was received.
    pub expires_on: DateTime<Utc>,
    /// Optional proactive-refresh hint from the service. Never shortens or
    /// extends `expires_on`.
    pub refresh_in: Option<Duration>,
}

impl AccessToken {
    /// Whether the token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_on
    }

    /// Time remaining until expiry, or zero if already expired.
    pub fn time_to_expiry(&self) -> Duration {
        (self.expires_on - Utc::now()).to_std().unwrap_or(Duration::ZERO)
    }
}

// The token value never appears in debug output.
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"***")
            .field("expires_on", &self.expires_on)
            .field("refresh_in", &self.refresh_in)
            .finish()
    }
}

/// Parses a token response body received at `received_at`.
///
/// Expiry is always `received_at + expires_in`; any absolute expiry claimed
/// by the body is ignored.
pub(crate) fn parse_token_response(
    body: &str,
    received_at: DateTime<Utc>,
) -> Result<AccessToken> {
    let response: TokenResponse =
        serde_json::from_str(body).map_err(|e| CredentialError::Parse(e.to_string()))?;
    if response.access_token.is_empty() {
        return Err(CredentialError::Parse(
            "token response contains an empty access_token".to_owned(),
        ));
    }
    let expires_on = i64::try_from(response.expires_in)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .and_then(|lifetime| received_at.checked_add_signed(lifetime))
        .ok_or_else(|| {
            CredentialError::Parse(format!(
                "token response expires_in {} is out of range",
                response.expires_in
            ))
        })?;
    Ok(AccessToken {
        token: response.access_token,
        expires_on,
        refresh_in: response.refresh_in.map(Duration::from_secs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_response() {
        let received_at = Utc::now();
        let token = parse_token_response(
            r#"{"access_token":"ACCESSTOKEN1","expires_in":3600}"#,
            received_at,
        )
        .unwrap();
        assert_eq!(token.token, "ACCESSTOKEN1");
        assert_eq!(token.expires_on, received_at + chrono::Duration::seconds(3600));
        assert_eq!(token.refresh_in, None);
    }

    #[test]
    fn expiry_is_relative_even_when_expires_on_is_present() {
        let received_at = Utc::now();
        let token = parse_token_response(
            r#"{"access_token":"T","expires_in":7200,"expires_on":"1700000000"}"#,
            received_at,
        )
        .unwrap();
        // expires_in is honored as-is; no halving, no absolute override.
        assert_eq!(token.expires_on, received_at + chrono::Duration::seconds(7200));
    }

    #[test]
    fn refresh_in_is_a_hint_only() {
        let received_at = Utc::now();
        let token = parse_token_response(
            r#"{"access_token":"T","expires_in":3600,"refresh_in":1800}"#,
            received_at,
        )
        .unwrap();
        assert_eq!(token.refresh_in, Some(Duration::from_secs(1800)));
        assert_eq!(token.expires_on, received_at + chrono::Duration::seconds(3600));
    }

    #[test]
    fn malformed_bodies_fail_to_parse() {
        let received_at = Utc::now();
        for body in [
            "",
            "not json",
            r#"{"expires_in":3600}"#,
            r#"{"access_token":"T"}"#,
            r#"{"access_token":"T","expires_in":"soon"}"#,
        ] {
            assert!(matches!(
                parse_token_response(body, received_at),
                Err(CredentialError::Parse(_))
            ));
        }
    }

    #[test]
    fn out_of_range_expires_in_is_a_parse_error() {
        let received_at = Utc::now();
        for body in [
            // Exceeds what a date can absorb.
            r#"{"access_token":"T","expires_in":10000000000000000}"#,
            // Exceeds i64.
            r#"{"access_token":"T","expires_in":18446744073709551615}"#,
        ] {
            assert!(matches!(
                parse_token_response(body, received_at),
                Err(CredentialError::Parse(_))
            ));
        }
    }

    #[test]
    fn empty_access_token_is_rejected() {
        assert!(matches!(
            parse_token_response(r#"{"access_token":"","expires_in":3600}"#, Utc::now()),
            Err(CredentialError::Parse(_))
        ));
    }

    #[test]
    fn debug_output_redacts_the_token() {
        let token = AccessToken {
            token: "SECRET".to_owned(),
            expires_on: Utc::now(),
            refresh_in: None,
        };
        let debug = format!("{token:?}");
        assert!(!debug.contains("SECRET"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn expiry_helpers() {
        let live = AccessToken {
            token: "T".to_owned(),
            expires_on: Utc::now() + chrono::Duration::seconds(3600),
            refresh_in: None,
        };
        assert!(!live.is_expired());
        assert!(live.time_to_expiry() > Duration::from_secs(3500));

        let stale = AccessToken {
            token: "T".to_owned(),
            expires_on: Utc::now() - chrono::Duration::seconds(1),
            refresh_in: None,
        };
        assert!(stale.is_expired());
        assert_eq!(stale.time_to_expiry(), Duration::ZERO);
    }
}
