//! Authenticated-user claims

use serde::{Deserialize, Serialize};

/// JWT claims carried by a bearer token.
///
/// Tokens are issued by an external identity service; this server only
/// verifies them. No authorization policy beyond "caller is authenticated".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// Subject (username)
    pub sub: String,
    /// Expiration timestamp (seconds since epoch)
    pub exp: i64,
}

impl UserClaims {
    /// Parse and verify a JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}
