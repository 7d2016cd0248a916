//! Bearer-token claim decoding.
//!
//! The access token is an opaque three-segment token whose middle segment
//! carries a JSON claim set with a numeric `exp` (epoch seconds). Nothing
//! here verifies a signature: the decoded expiry is a client-side
//! scheduling hint, never a trust boundary.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Claim fields the scheduler cares about.
#[derive(Debug, Deserialize)]
struct Claims {
    exp: i64,
}

/// Extracts the expiry claim from a bearer token.
///
/// Returns `None` for anything that is not a well-formed token: wrong
/// segment count, undecodable payload, or a claim set without a numeric
/// `exp`. Malformed input is a normal "no expiry known" outcome, not an
/// error.
#[must_use]
pub fn decode_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_)) if segments.next().is_none() => payload,
        _ => return None,
    };

    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claims.exp, 0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn token_with_payload(payload: &str) -> String {
        format!("header.{}.signature", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn test_decodes_numeric_exp() {
        let token = token_with_payload(r#"{"sub":"42","exp":1700000000}"#);
        let expiry = decode_expiry(&token).unwrap();
        assert_eq!(expiry.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_wrong_segment_count_is_none() {
        assert_eq!(decode_expiry("only-one-segment"), None);
        assert_eq!(decode_expiry("two.segments"), None);
        assert_eq!(decode_expiry("a.b.c.d"), None);
    }

    #[test]
    fn test_undecodable_payload_is_none() {
        assert_eq!(decode_expiry("header.!!not-base64!!.sig"), None);

        let not_json = format!("header.{}.sig", URL_SAFE_NO_PAD.encode("plain text"));
        assert_eq!(decode_expiry(&not_json), None);
    }

    #[test]
    fn test_missing_exp_claim_is_none() {
        let token = token_with_payload(r#"{"sub":"42"}"#);
        assert_eq!(decode_expiry(&token), None);
    }

    #[test]
    fn test_non_numeric_exp_is_none() {
        let token = token_with_payload(r#"{"exp":"tomorrow"}"#);
        assert_eq!(decode_expiry(&token), None);
    }
}
