use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::DeploymentMode;

pub const TOKEN_COOKIE: &str = "token";
pub const TOKEN_TTL_HOURS: i64 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(email: impl Into<String>) -> Self {
        let now = Utc::now();
        Claims {
            email: email.into(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Sign(jsonwebtoken::errors::Error),
    #[error("invalid token: {0}")]
    Invalid(jsonwebtoken::errors::Error),
}

/// Signing material plus the cookie policy for the current deployment.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    mode: DeploymentMode,
}

impl TokenService {
    pub fn new(secret: &str, mode: DeploymentMode) -> Self {
        TokenService {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            mode,
        }
    }

    pub fn issue(&self, email: &str) -> Result<String, TokenError> {
        self.sign(&Claims::new(email))
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(TokenError::Sign)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        self.cookie(token)
            .max_age(CookieDuration::hours(TOKEN_TTL_HOURS))
            .finish()
    }

    /// Same name and flags as the session cookie, already expired.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = self.cookie(String::new()).finish();
        cookie.make_removal();
        cookie
    }

    fn cookie(&self, value: String) -> actix_web::cookie::CookieBuilder<'static> {
        let same_site = if self.mode.is_production() {
            SameSite::None
        } else {
            SameSite::Strict
        };
        Cookie::build(TOKEN_COOKIE, value)
            .path("/")
            .http_only(true)
            .secure(self.mode.is_production())
            .same_site(same_site)
    }
}
