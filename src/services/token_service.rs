//! Signed, time-limited bearer tokens for user and buyer sessions.
//!
//! Tokens are HS256 JWTs. The only invalidation mechanism is expiry; there is no
//! revocation list, which is why the auth extractors re-load the identity on every
//! request.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::entity::users::Role;

/// Identity carried by a user session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserClaims {
    #[serde(rename = "userId")]
    pub user_id: i32,
    pub username: String,
    pub role: Role,
}

/// Identity carried by a buyer session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyerClaims {
    #[serde(rename = "buyerId")]
    pub buyer_id: i64,
    pub username: String,
}

/// Full JWT payload: the identity plus the registered time claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims<T> {
    #[serde(flatten)]
    pub identity: T,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token sudah expired")]
    Expired,
    #[error("Token tidak valid")]
    Invalid,
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    user_ttl: Duration,
    buyer_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, user_ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            user_ttl: Duration::hours(user_ttl_hours),
            buyer_ttl: Duration::days(7),
        }
    }

    pub fn user_ttl(&self) -> Duration {
        self.user_ttl
    }

    pub fn buyer_ttl(&self) -> Duration {
        self.buyer_ttl
    }

    pub fn issue<T: Serialize>(&self, identity: &T, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            identity,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    pub fn issue_user(&self, identity: &UserClaims) -> Result<String, TokenError> {
        self.issue(identity, self.user_ttl)
    }

    pub fn issue_buyer(&self, identity: &BuyerClaims) -> Result<String, TokenError> {
        self.issue(identity, self.buyer_ttl)
    }

    /// Checks signature, shape and expiry. Expiry uses zero leeway: a token is
    /// rejected as soon as `exp` is in the past.
    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<Claims<T>, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims<T>>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    fn user_claims() -> UserClaims {
        UserClaims {
            user_id: 7,
            username: "siti".into(),
            role: Role::Admin,
        }
    }

    #[test]
    fn user_token_round_trips_identity() {
        let tokens = TokenService::new(TEST_SECRET, 24);
        let token = tokens.issue_user(&user_claims()).unwrap();

        let claims = tokens.verify::<UserClaims>(&token).unwrap();
        assert_eq!(claims.identity, user_claims());
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn payload_uses_camel_case_identity_keys() {
        let tokens = TokenService::new(TEST_SECRET, 24);
        let token = tokens.issue_user(&user_claims()).unwrap();
        let raw = tokens.verify::<serde_json::Value>(&token).unwrap();
        assert_eq!(raw.identity["userId"], 7);
        assert_eq!(raw.identity["role"], "admin");
    }

    #[test]
    fn buyer_token_lives_seven_days() {
        let tokens = TokenService::new(TEST_SECRET, 24);
        let identity = BuyerClaims {
            buyer_id: 42,
            username: "budi".into(),
        };
        let token = tokens.issue_buyer(&identity).unwrap();

        let claims = tokens.verify::<BuyerClaims>(&token).unwrap();
        assert_eq!(claims.identity, identity);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
    }

    #[test]
    fn elapsed_ttl_is_reported_as_expired() {
        let tokens = TokenService::new(TEST_SECRET, 24);
        let token = tokens
            .issue(&user_claims(), Duration::seconds(-5))
            .unwrap();
        assert_eq!(
            tokens.verify::<UserClaims>(&token).unwrap_err(),
            TokenError::Expired
        );
    }

    #[test]
    fn garbage_and_foreign_signatures_are_invalid() {
        let tokens = TokenService::new(TEST_SECRET, 24);
        assert_eq!(
            tokens.verify::<UserClaims>("invalid.token.here").unwrap_err(),
            TokenError::Invalid
        );

        let other = TokenService::new("wrong-secret-key-for-testing-minimum-32-chars", 24);
        let token = other.issue_user(&user_claims()).unwrap();
        assert_eq!(
            tokens.verify::<UserClaims>(&token).unwrap_err(),
            TokenError::Invalid
        );
    }

    #[test]
    fn buyer_token_does_not_pass_as_user_token() {
        let tokens = TokenService::new(TEST_SECRET, 24);
        let token = tokens
            .issue_buyer(&BuyerClaims {
                buyer_id: 1,
                username: "budi".into(),
            })
            .unwrap();
        assert_eq!(
            tokens.verify::<UserClaims>(&token).unwrap_err(),
            TokenError::Invalid
        );
    }
}
