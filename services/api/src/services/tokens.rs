//! services/api/src/services/tokens.rs
//!
//! JWT session tokens (HS256).

use bookshelf_core::ports::{PortError, PortResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Issuer stamped into, and required from, every token.
pub const TOKEN_ISSUER: &str = "bookshelf";

/// Session lifetime: 24 hours.
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    pub iss: String,
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
}

/// Signs and verifies session tokens with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenIssuer {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issues a token for `user_id`, valid from now for `TOKEN_TTL_SECS`.
    pub fn issue(&self, user_id: i64, username: &str) -> PortResult<String> {
        let now = Utc::now();
        let claims = Claims {
            user_id,
            username: username.to_string(),
            iss: TOKEN_ISSUER.to_string(),
            sub: user_id.to_string(),
            exp: (now + Duration::seconds(TOKEN_TTL_SECS)).timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| PortError::Unexpected(format!("jwt encode: {e}")))
    }

    /// Verifies signature, algorithm, issuer, expiry and not-before.
    pub fn verify(&self, token: &str) -> PortResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| PortError::Unauthorized(format!("invalid token: {e}")))
    }
}
