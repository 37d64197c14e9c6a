//! Access and refresh tokens. Both are HS256 JWTs signed with separate
//! secrets and tagged with their type so one can never stand in for the other.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
    /// Makes two refresh tokens issued in the same second distinct.
    pub jti: String,
}

impl Claims {
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

#[derive(Clone)]
struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

#[derive(Clone)]
pub struct JwtService {
    access: KeyPair,
    refresh: KeyPair,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

/// A freshly issued token and when it stops being valid.
pub struct Issued {
    pub token: String,
    pub expires_at: chrono::DateTime<Utc>,
}

impl JwtService {
    pub fn new(config: &Config) -> Self {
        Self {
            access: KeyPair::new(&config.jwt_secret_key),
            refresh: KeyPair::new(&config.jwt_refresh_secret_key),
            validation: Validation::new(Algorithm::HS256),
            access_ttl: Duration::minutes(config.access_token_minutes),
            refresh_ttl: Duration::hours(config.refresh_token_hours),
        }
    }

    fn issue(&self, user_id: Uuid, token_type: TokenType) -> Result<Issued, jsonwebtoken::errors::Error> {
        let (keys, ttl) = match token_type {
            TokenType::Access => (&self.access, self.access_ttl),
            TokenType::Refresh => (&self.refresh, self.refresh_ttl),
        };
        let now = Utc::now();
        let expires_at = now + ttl;
        let claims = Claims {
            sub: user_id.to_string(),
            token_type,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)?;
        Ok(Issued { token, expires_at })
    }

    pub fn issue_access(&self, user_id: Uuid) -> Result<Issued, jsonwebtoken::errors::Error> {
        self.issue(user_id, TokenType::Access)
    }

    pub fn issue_refresh(&self, user_id: Uuid) -> Result<Issued, jsonwebtoken::errors::Error> {
        self.issue(user_id, TokenType::Refresh)
    }

    /// Returns the claims if `token` is a valid, unexpired token of `expected` type.
    pub fn verify(&self, token: &str, expected: TokenType) -> Option<Claims> {
        let keys = match expected {
            TokenType::Access => &self.access,
            TokenType::Refresh => &self.refresh,
        };
        decode::<Claims>(token, &keys.decoding, &self.validation)
            .ok()
            .map(|data| data.claims)
            .filter(|claims| claims.token_type == expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new(&Config::for_tests())
    }

    #[test]
    fn test_issue_and_verify_access() {
        let svc = service();
        let user = Uuid::new_v4();
        let issued = svc.issue_access(user).unwrap();
        let claims = svc.verify(&issued.token, TokenType::Access).unwrap();
        assert_eq!(claims.user_id(), Some(user));
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let svc = service();
        let refresh = svc.issue_refresh(Uuid::new_v4()).unwrap();
        assert!(svc.verify(&refresh.token, TokenType::Access).is_none());
        assert!(svc.verify(&refresh.token, TokenType::Refresh).is_some());
    }

    #[test]
    fn test_expired_token_rejected() {
        let mut config = Config::for_tests();
        config.access_token_minutes = -5;
        let svc = JwtService::new(&config);
        let issued = svc.issue_access(Uuid::new_v4()).unwrap();
        assert!(svc.verify(&issued.token, TokenType::Access).is_none());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(service().verify("not.a.jwt", TokenType::Access).is_none());
    }
}
