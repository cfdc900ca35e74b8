use crate::models::User;
use crate::types::{AppError, Claims, Identity, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

/// Why a bearer token was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        AppError::Auth(err.to_string())
    }
}

/// Authentication service for JWT issuance and verification.
///
/// Tokens are HS256-signed with a server-held secret and carry the user's
/// id as `sub` and their role.
pub struct AuthService {
    jwt_secret: String,
    expiry_seconds: i64,
}

impl AuthService {
    /// Creates a new AuthService.
    ///
    /// # Arguments
    /// * `jwt_secret` - Secret key for signing JWTs (should be at least 32 chars)
    /// * `expiry_seconds` - Token validity in seconds
    pub fn new(jwt_secret: String, expiry_seconds: i64) -> Self {
        Self {
            jwt_secret,
            expiry_seconds,
        }
    }

    /// Token validity in seconds.
    pub fn expiry_seconds(&self) -> i64 {
        self.expiry_seconds
    }

    /// Issues a signed access token for `user`.
    pub fn issue(&self, user: &User) -> Result<String> {
        let claims = Claims {
            sub: user.id.to_string(),
            role: user.role,
            exp: (Utc::now() + Duration::seconds(self.expiry_seconds)).timestamp() as usize,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Verifies a token and returns the identity it was issued for.
    pub fn verify(&self, token: &str) -> std::result::Result<Identity, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )?
        .claims;

        let user_id = claims.sub.parse().map_err(|_| TokenError::Invalid)?;

        Ok(Identity {
            user_id,
            role: claims.role,
        })
    }
}
