//! Verification of session tokens issued by the identity provider.
//!
//! The provider hosts sign-in and redirects back with a signed JWT. We only
//! check the signature, expiry and (optionally) issuer, then read the email
//! and display name claims.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use vitrine_core::Email;

use crate::config::{AuthConfig, JwtKey};
use crate::models::AuthIdentity;

/// Errors from token verification.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The configured key could not be loaded.
    #[error("invalid verification key: {0}")]
    Key(jsonwebtoken::errors::Error),

    /// Signature, expiry or issuer check failed.
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    /// The token carries no usable email claim.
    #[error("token has no valid email claim")]
    MissingEmail,
}

#[derive(Debug, Deserialize)]
struct SessionClaims {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
}

impl SessionClaims {
    fn display_name(&self) -> Option<String> {
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return Some(name.to_string());
        }
        let joined = [self.given_name.as_deref(), self.family_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!joined.is_empty()).then_some(joined)
    }
}

/// Verifies provider tokens and turns them into an [`AuthIdentity`].
pub struct IdentityVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl IdentityVerifier {
    /// Build a verifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Key` if the RSA public key is not valid PEM.
    pub fn new(config: &AuthConfig) -> Result<Self, IdentityError> {
        let (decoding_key, algorithm) = match &config.jwt_key {
            JwtKey::RsaPublicPem(pem) => (
                DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(IdentityError::Key)?,
                Algorithm::RS256,
            ),
            JwtKey::Hmac(secret) => (
                DecodingKey::from_secret(secret.expose_secret().as_bytes()),
                Algorithm::HS256,
            ),
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.validate_aud = false;
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Verify a token and extract the identity it asserts.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidToken` on a bad signature, an expired
    /// token or an issuer mismatch, and `IdentityError::MissingEmail` when the
    /// email claim is absent or malformed.
    pub fn verify(&self, token: &str) -> Result<AuthIdentity, IdentityError> {
        let data = decode::<SessionClaims>(token.trim(), &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        let email = claims
            .email
            .as_deref()
            .and_then(|e| Email::parse_normalized(e).ok())
            .ok_or(IdentityError::MissingEmail)?;

        Ok(AuthIdentity {
            email,
            name: claims.display_name(),
        })
    }
}

impl std::fmt::Debug for IdentityVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityVerifier")
            .field("algorithms", &self.validation.algorithms)
            .field("issuer", &self.validation.iss)
            .finish_non_exhaustive()
    }
}
