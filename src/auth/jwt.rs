use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::session::SessionScope;

/// Claims embedded in a session bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user ID as a UUID string.
    pub sub: String,
    /// Session ID; the `sessions` row is the authority on validity.
    pub jti: String,
    /// `"user"` or `"admin"`.
    pub scope: SessionScope,
    /// Expiration time (Unix timestamp), mirrors `sessions.expires_at`.
    pub exp: i64,
    /// Issued-at time (Unix timestamp).
    pub iat: i64,
}

impl Claims {
    /// Parse the session id out of `jti`.
    ///
    /// # Errors
    ///
    /// Returns an error if `jti` is not a UUID.
    pub fn session_id(&self) -> anyhow::Result<Uuid> {
        self.jti
            .parse()
            .map_err(|_| anyhow::anyhow!("Token jti is not a session id"))
    }
}

/// Sign a bearer token for an existing session row.
///
/// # Errors
///
/// Returns an error if JWT encoding fails.
pub fn issue_session_token(
    user_id: Uuid,
    session_id: Uuid,
    scope: SessionScope,
    expires_at: DateTime<Utc>,
    secret: &str,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        jti: session_id.to_string(),
        scope,
        exp: expires_at.timestamp(),
        iat: Utc::now().timestamp(),
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key)
        .map_err(|e| anyhow::anyhow!("Failed to encode session token: {e}"))
}

/// Verify the signature of a session token and return its claims.
///
/// Expiry is not checked here: the session row decides, so that an expired token can
/// still be traced back to its row and the row removed.
///
/// # Errors
///
/// Returns an error if the token is malformed or its signature is invalid.
pub fn decode_session_token(token: &str, secret: &str) -> anyhow::Result<Claims> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = false;

    let token_data = decode::<Claims>(token, &key, &validation)
        .map_err(|e| anyhow::anyhow!("Invalid session token: {e}"))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret-unit-test-secret-0123";

    #[test]
    fn token_carries_session_and_scope() {
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();
        let expires = Utc::now() + chrono::Duration::hours(1);
        let token =
            issue_session_token(user_id, session_id, SessionScope::Admin, expires, SECRET)
                .unwrap_or_default();

        let claims = decode_session_token(&token, SECRET);
        assert!(claims.is_ok());
        if let Ok(claims) = claims {
            assert_eq!(claims.sub, user_id.to_string());
            assert_eq!(claims.session_id().ok(), Some(session_id));
            assert_eq!(claims.scope, SessionScope::Admin);
            assert_eq!(claims.exp, expires.timestamp());
        }
    }

    #[test]
    fn expired_token_still_decodes() {
        let expires = Utc::now() - chrono::Duration::days(2);
        let token = issue_session_token(
            Uuid::new_v4(),
            Uuid::new_v4(),
            SessionScope::User,
            expires,
            SECRET,
        )
        .unwrap_or_default();
        assert!(decode_session_token(&token, SECRET).is_ok());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_session_token(
            Uuid::new_v4(),
            Uuid::new_v4(),
            SessionScope::User,
            Utc::now() + chrono::Duration::hours(1),
            SECRET,
        )
        .unwrap_or_default();
        assert!(decode_session_token(&token, "another-secret-another-secret-0000").is_err());
        assert!(decode_session_token("not-a-jwt", SECRET).is_err());
    }
}
