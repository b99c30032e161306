pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;

pub use password::{hash_password, verify_absent_user, verify_password};

/// Which endpoint family a token is good for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Identity a token is issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub email: String,
    pub user_id: i32,
    pub is_staff: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user email)
    pub sub: String,
    pub user_id: i32,
    pub is_staff: bool,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn subject(&self) -> TokenSubject {
        TokenSubject {
            email: self.sub.clone(),
            user_id: self.user_id,
            is_staff: self.is_staff,
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT generation error: {0}")]
    Generation(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("Token lifetime out of range")]
    InvalidLifetime,
}

/// Signs and verifies access/refresh tokens with a shared HMAC secret.
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(
        secret: &str,
        algorithm: Algorithm,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::InvalidSecret);
        }
        if access_ttl <= Duration::zero() || refresh_ttl <= Duration::zero() {
            return Err(TokenError::InvalidLifetime);
        }

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, TokenError> {
        let access_ttl = Duration::try_minutes(security.access_token_expire_minutes)
            .ok_or(TokenError::InvalidLifetime)?;
        let refresh_ttl = Duration::try_days(security.refresh_token_expire_days)
            .ok_or(TokenError::InvalidLifetime)?;

        Self::new(&security.jwt_secret, security.jwt_algorithm, access_ttl, refresh_ttl)
    }

    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    /// Issue a token of the given kind with its configured lifetime.
    pub fn issue(&self, subject: &TokenSubject, kind: TokenKind) -> Result<String, TokenError> {
        self.issue_with_ttl(subject, kind, self.ttl(kind))
    }

    pub fn issue_with_ttl(
        &self,
        subject: &TokenSubject,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let expires = now.checked_add_signed(ttl).ok_or(TokenError::InvalidLifetime)?;
        let claims = Claims {
            sub: subject.email.clone(),
            user_id: subject.user_id,
            is_staff: subject.is_staff,
            kind,
            exp: expires.timestamp(),
            iat: now.timestamp(),
        };

        Ok(encode(&Header::new(self.algorithm), &claims, &self.encoding_key)?)
    }

    /// Decode and verify a token.
    ///
    /// Every failure (bad signature, malformed payload, expiry) collapses to
    /// `None` so callers cannot tell the cases apart.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!("Token rejected: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(secret: &str) -> TokenCodec {
        TokenCodec::new(secret, Algorithm::HS256, Duration::minutes(30), Duration::days(7)).unwrap()
    }

    fn alice() -> TokenSubject {
        TokenSubject {
            email: "alice@example.com".to_string(),
            user_id: 1,
            is_staff: true,
        }
    }

    #[test]
    fn access_token_round_trips_claims() {
        let codec = codec("test-secret-key-12345");
        let token = codec.issue(&alice(), TokenKind::Access).unwrap();

        let claims = codec.verify(&token).expect("valid token");
        assert_eq!(claims.subject(), alice());
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn refresh_token_uses_refresh_ttl() {
        let codec = codec("test-secret-key-12345");
        let token = codec.issue(&alice(), TokenKind::Refresh).unwrap();

        let claims = codec.verify(&token).expect("valid token");
        assert_eq!(claims.kind, TokenKind::Refresh);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn type_claim_is_serialized_lowercase() {
        let claims = Claims {
            sub: "alice@example.com".to_string(),
            user_id: 1,
            is_staff: true,
            kind: TokenKind::Refresh,
            exp: 0,
            iat: 0,
        };
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["type"], "refresh");
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = codec("test-secret-key-12345");
        let token = codec
            .issue_with_ttl(&alice(), TokenKind::Access, Duration::seconds(-5))
            .unwrap();

        assert!(codec.verify(&token).is_none());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let codec = codec("test-secret-key-12345");
        let token = codec.issue(&alice(), TokenKind::Access).unwrap();

        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let forged = codec
            .issue(
                &TokenSubject {
                    email: "mallory@example.com".to_string(),
                    user_id: 2,
                    is_staff: true,
                },
                TokenKind::Access,
            )
            .unwrap();
        // Swap in another payload while keeping the original signature
        parts[1] = forged.split('.').nth(1).unwrap().to_string();

        assert!(codec.verify(&parts.join(".")).is_none());
    }

    #[test]
    fn different_secrets_reject() {
        let token = codec("secret1").issue(&alice(), TokenKind::Access).unwrap();
        assert!(codec("secret2").verify(&token).is_none());
    }

    #[test]
    fn garbage_is_rejected() {
        let codec = codec("test-secret-key-12345");
        assert!(codec.verify("invalid.token.here").is_none());
        assert!(codec.verify("").is_none());
    }

    #[test]
    fn algorithm_mismatch_is_rejected() {
        let hs512 = TokenCodec::new(
            "test-secret-key-12345",
            Algorithm::HS512,
            Duration::minutes(30),
            Duration::days(7),
        )
        .unwrap();
        let token = hs512.issue(&alice(), TokenKind::Access).unwrap();

        assert!(codec("test-secret-key-12345").verify(&token).is_none());
    }

    #[test]
    fn empty_secret_is_refused() {
        let result = TokenCodec::new("", Algorithm::HS256, Duration::minutes(30), Duration::days(7));
        assert!(matches!(result, Err(TokenError::InvalidSecret)));
    }

    #[test]
    fn non_positive_lifetimes_are_refused() {
        let result = TokenCodec::new("secret", Algorithm::HS256, Duration::minutes(-5), Duration::days(7));
        assert!(matches!(result, Err(TokenError::InvalidLifetime)));

        let result = TokenCodec::new("secret", Algorithm::HS256, Duration::minutes(30), Duration::zero());
        assert!(matches!(result, Err(TokenError::InvalidLifetime)));
    }

    #[test]
    fn overflowing_expiry_is_an_error() {
        let codec = codec("test-secret-key-12345");
        let result = codec.issue_with_ttl(&alice(), TokenKind::Refresh, Duration::days(1_000_000_000));
        assert!(matches!(result, Err(TokenError::InvalidLifetime)));
    }

    #[test]
    fn unrepresentable_config_lifetime_is_refused() {
        let mut security = crate::config::AppConfig::for_tests().security;
        security.refresh_token_expire_days = i64::MAX;
        assert!(matches!(TokenCodec::from_config(&security), Err(TokenError::InvalidLifetime)));
    }
}
