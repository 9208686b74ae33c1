//! Session token issuance and verification (HS256).
//!
//! Tokens are stateless: validity depends only on the signature, the time
//! window and the caller's clock. There is no server-side revocation, so a
//! leaked token stays usable until it expires.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use quill_core::UserId;

use crate::claims::{SessionClaims, TokenValidationError, validate_claims};
use crate::config::{AuthConfig, MAX_TOKEN_TTL_SECS};
use crate::error::AuthError;

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: chrono::Duration,
    validation: Validation,
}

impl core::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenService")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Build a token service from a signing secret and a token lifetime.
    ///
    /// Lifetimes are truncated to whole seconds (the claim resolution) and
    /// capped at [`MAX_TOKEN_TTL_SECS`].
    pub fn new(secret: &[u8], lifetime: std::time::Duration) -> Self {
        let secs = lifetime.as_secs().min(MAX_TOKEN_TTL_SECS) as i64;

        // Expiry is checked by `validate_claims` against the caller's clock,
        // so the library's own wall-clock check is off.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            lifetime: chrono::Duration::seconds(secs),
            validation,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.jwt_secret.as_bytes(), config.token_lifetime)
    }

    pub fn lifetime(&self) -> chrono::Duration {
        self.lifetime
    }

    /// Issue a token for `subject`, valid from `now` for the configured lifetime.
    pub fn issue(&self, subject: UserId, now: DateTime<Utc>) -> Result<String, AuthError> {
        let issued_at = DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now);
        let expires_at = issued_at
            .checked_add_signed(self.lifetime)
            .ok_or_else(|| AuthError::Signing("token expiry is out of range".to_string()))?;
        let claims = SessionClaims {
            sub: subject,
            issued_at,
            expires_at,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify a token and return the decoded claims.
    ///
    /// # Errors
    ///
    /// - `InvalidSignature` if the MAC does not match
    /// - `Expired` if `now >= exp`
    /// - `Malformed` for everything else (bad encoding, wrong algorithm,
    ///   missing claims, impossible time window)
    pub fn verify_claims(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, AuthError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Malformed,
            },
        )?;

        validate_claims(&data.claims, now).map_err(|e| match e {
            TokenValidationError::Expired => AuthError::Expired,
            TokenValidationError::NotYetValid | TokenValidationError::InvalidTimeWindow => {
                AuthError::Malformed
            }
        })?;

        Ok(data.claims)
    }

    /// Verify a token and return its subject.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, AuthError> {
        self.verify_claims(token, now).map(|claims| claims.sub)
    }
}
