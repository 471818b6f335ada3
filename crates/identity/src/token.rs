//! Signed, time-bounded session tokens.
//!
//! Tokens are compact HS256 JWTs. They are stateless once issued: nothing is
//! recorded server-side, so a token stays valid until its `exp` passes or the
//! signing secret changes.

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::{AuthError, Result};

const RESERVED_CLAIMS: [&str; 3] = ["sub", "iat", "exp"];

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (account email)
    pub sub: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
    /// Non-sensitive display attributes
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionClaims {
    pub fn new(sub: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            iat: 0,
            exp: 0,
            extra: Map::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }
}

/// Issues and verifies session tokens with one process-wide secret.
#[derive(Clone)]
pub struct SessionAuthority {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SessionAuthority {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();

        // expiry is checked against our own clock in `verify_at`
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn issue(&self, claims: SessionClaims, ttl: Duration) -> Result<String> {
        self.issue_at(claims, ttl, now())
    }

    /// Sign `claims` as if the current time were `now` (unix seconds).
    ///
    /// `iat` and `exp` are always set here; values supplied by the caller,
    /// including reserved keys slipped into the display map, are discarded.
    pub fn issue_at(&self, mut claims: SessionClaims, ttl: Duration, now: i64) -> Result<String> {
        if claims.sub.trim().is_empty() {
            crate::bail!("session token requires a subject");
        }

        if !ttl.is_positive() {
            crate::bail!("session token ttl must be positive, got {ttl}");
        }

        for key in RESERVED_CLAIMS {
            claims.extra.remove(key);
        }

        let Some(exp) = now.checked_add(ttl.whole_seconds()) else {
            crate::bail!("session token expiry overflows, ttl {ttl} is too large");
        };

        claims.iat = now;
        claims.exp = exp;

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Unknown(e.into()))
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        self.verify_at(token, now())
    }

    /// Verify `token` as if the current time were `now` (unix seconds).
    ///
    /// The signature is checked before any claim is decoded.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<SessionClaims> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| {
                debug!(error = %e, "session token rejected");

                match e.kind() {
                    ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                    ErrorKind::ExpiredSignature => AuthError::Expired,
                    _ => AuthError::Malformed,
                }
            },
        )?;

        let claims = data.claims;

        if claims.sub.trim().is_empty() {
            return Err(AuthError::Malformed);
        }

        if claims.exp <= now {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }
}

/// Strip the `Bearer ` scheme a cookie value carries, tolerating quotes.
pub fn strip_bearer(value: &str) -> &str {
    let value = value.trim().trim_matches('"');
    value.strip_prefix("Bearer ").unwrap_or(value).trim()
}

pub(crate) fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

#[cfg(test)]
mod tests {
    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

    use super::*;

    const SECRET: &str = "test_secret_key_minimum_32_characters_long";
    const NOW: i64 = 1_750_000_000;

    fn authority() -> SessionAuthority {
        SessionAuthority::new(SECRET)
    }

    fn doctor_claims() -> SessionClaims {
        SessionClaims::new("doc@example.com")
            .with("role", "medecin")
            .with("first_name", "Awa")
            .with("last_name", "Ndong")
    }

    #[test]
    fn test_round_trip_returns_claims() {
        let authority = authority();
        let token = authority
            .issue_at(doctor_claims(), Duration::minutes(1440), NOW)
            .unwrap();

        let claims = authority.verify_at(&token, NOW).unwrap();
        assert_eq!(claims.sub, "doc@example.com");
        assert_eq!(claims.get_str("role"), Some("medecin"));
        assert_eq!(claims.get_str("first_name"), Some("Awa"));
        assert_eq!(claims.iat, NOW);
        assert_eq!(claims.exp - claims.iat, 1440 * 60);
    }

    #[test]
    fn test_verify_with_wall_clock() {
        let authority = authority();
        let token = authority
            .issue(doctor_claims(), Duration::minutes(1440))
            .unwrap();

        let claims = authority.verify(&token).unwrap();
        assert!(now() < claims.exp);
        assert_eq!(claims.exp - claims.iat, 1440 * 60);
    }

    #[test]
    fn test_token_has_three_segments() {
        let token = authority()
            .issue_at(doctor_claims(), Duration::hours(1), NOW)
            .unwrap();

        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn test_expired_after_ttl() {
        let authority = authority();
        let token = authority
            .issue_at(doctor_claims(), Duration::seconds(60), NOW)
            .unwrap();

        assert!(authority.verify_at(&token, NOW + 59).is_ok());
        assert!(matches!(
            authority.verify_at(&token, NOW + 60),
            Err(AuthError::Expired)
        ));
        assert!(matches!(
            authority.verify_at(&token, NOW + 3600),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn test_altered_signature_is_rejected() {
        let authority = authority();
        let token = authority
            .issue_at(doctor_claims(), Duration::hours(1), NOW)
            .unwrap();

        let (head, signature) = token.rsplit_once('.').unwrap();
        let mut bytes = URL_SAFE_NO_PAD.decode(signature).unwrap();
        bytes[0] ^= 0x01;
        let tampered = format!("{head}.{}", URL_SAFE_NO_PAD.encode(bytes));

        assert!(matches!(
            authority.verify_at(&tampered, NOW),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_altered_claims_are_rejected() {
        let authority = authority();
        let token = authority
            .issue_at(doctor_claims(), Duration::hours(1), NOW)
            .unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let forged = serde_json::json!({
            "sub": "admin@example.com",
            "iat": NOW,
            "exp": NOW + 3600,
            "role": "medecin",
        });
        let payload = URL_SAFE_NO_PAD.encode(forged.to_string());
        let tampered = format!("{}.{}.{}", parts[0], payload, parts[2]);

        assert!(matches!(
            authority.verify_at(&tampered, NOW),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let token = SessionAuthority::new("another_secret_key_that_is_long_enough")
            .issue_at(doctor_claims(), Duration::hours(1), NOW)
            .unwrap();

        assert!(matches!(
            authority().verify_at(&token, NOW),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_other_algorithm_is_malformed() {
        let mut claims = doctor_claims();
        claims.iat = NOW;
        claims.exp = NOW + 3600;

        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            authority().verify_at(&token, NOW),
            Err(AuthError::Malformed)
        ));
    }

    #[test]
    fn test_unsigned_token_is_malformed() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(
            r#"{{"sub":"doc@example.com","iat":{NOW},"exp":{}}}"#,
            NOW + 3600
        ));
        let token = format!("{header}.{payload}.");

        assert!(matches!(
            authority().verify_at(&token, NOW),
            Err(AuthError::Malformed)
        ));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let authority = authority();

        for token in ["", "abc", "a.b", "a.b.c.d", "not.a.token", "....."] {
            assert!(
                matches!(authority.verify_at(token, NOW), Err(AuthError::Malformed)),
                "{token:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_reserved_display_claims_cannot_override() {
        let authority = authority();
        let claims = doctor_claims()
            .with("sub", "someone@else.com")
            .with("exp", NOW + 999_999)
            .with("iat", 0);

        let token = authority
            .issue_at(claims, Duration::seconds(60), NOW)
            .unwrap();
        let claims = authority.verify_at(&token, NOW).unwrap();

        assert_eq!(claims.sub, "doc@example.com");
        assert_eq!(claims.iat, NOW);
        assert_eq!(claims.exp, NOW + 60);
        assert!(claims.get("sub").is_none());
    }

    #[test]
    fn test_issue_requires_subject_and_positive_ttl() {
        let authority = authority();

        assert!(
            authority
                .issue_at(SessionClaims::new("  "), Duration::hours(1), NOW)
                .is_err()
        );
        assert!(
            authority
                .issue_at(doctor_claims(), Duration::ZERO, NOW)
                .is_err()
        );
        assert!(
            authority
                .issue_at(doctor_claims(), Duration::seconds(-5), NOW)
                .is_err()
        );
    }

    #[test]
    fn test_issue_rejects_overflowing_ttl() {
        let authority = authority();

        assert!(matches!(
            authority.issue_at(doctor_claims(), Duration::MAX, NOW),
            Err(AuthError::Server(_))
        ));
        assert!(
            authority
                .issue_at(doctor_claims(), Duration::seconds(i64::MAX - NOW + 1), NOW)
                .is_err()
        );

        let token = authority
            .issue_at(doctor_claims(), Duration::seconds(i64::MAX - NOW), NOW)
            .unwrap();
        assert_eq!(authority.verify_at(&token, NOW).unwrap().exp, i64::MAX);
    }

    #[test]
    fn test_strip_bearer() {
        assert_eq!(strip_bearer("Bearer abc.def.ghi"), "abc.def.ghi");
        assert_eq!(strip_bearer("\"Bearer abc.def.ghi\""), "abc.def.ghi");
        assert_eq!(strip_bearer("abc.def.ghi"), "abc.def.ghi");
    }
}
