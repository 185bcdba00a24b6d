use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    adapters::error::Flash,
    application::error::ApplicationError,
    domain::models::subject::Subject,
};

pub const LOGIN_PATH: &str = "/login";

/// Session token claims. `sub` carries the subject id.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// HS256 keys shared with whatever issues session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(
        &self,
        subject: &Subject,
        ttl: Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            sub: subject.id.to_string(),
            exp: (Utc::now() + ttl).timestamp().max(0) as usize,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    pub fn verify(&self, token: &str) -> Result<Subject, ApplicationError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map_err(|e| {
                warn!("Rejected session token: {}", e);
                ApplicationError::Unauthorized
            })?;

        let id = data.claims.sub.parse::<i64>().map_err(|_| {
            warn!("Session token subject is not an id: {}", data.claims.sub);
            ApplicationError::Unauthorized
        })?;

        Ok(Subject::new(id))
    }
}

/// The subject behind the request. Requests without a valid
/// `Authorization: Bearer` token are sent to the login page.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedSubject(pub Subject);

impl<S> FromRequestParts<S> for AuthenticatedSubject
where
    SessionKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Flash;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ApplicationError::Unauthorized);

        token
            .and_then(|t| keys.verify(t))
            .map(AuthenticatedSubject)
            .map_err(|e| Flash::error(LOGIN_PATH, &e))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    async fn extract(header_value: Option<&str>, keys: &SessionKeys) -> Result<Subject, Flash> {
        let mut builder = Request::builder().uri("/files");
        if let Some(value) = header_value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        AuthenticatedSubject::from_request_parts(&mut parts, keys)
            .await
            .map(|s| s.0)
    }

    #[tokio::test]
    async fn valid_token_yields_subject() {
        let keys = SessionKeys::new("dev_secret");
        let token = keys.issue(&Subject::new(7), Duration::minutes(5)).unwrap();

        let subject = extract(Some(&format!("Bearer {token}")), &keys).await.unwrap();
        assert_eq!(subject.id, 7);
    }

    #[tokio::test]
    async fn missing_or_foreign_tokens_redirect_to_login() {
        let keys = SessionKeys::new("dev_secret");
        let other = SessionKeys::new("another_secret")
            .issue(&Subject::new(7), Duration::minutes(5))
            .unwrap();
        let expired = keys.issue(&Subject::new(7), Duration::hours(-2)).unwrap();

        for header_value in [
            None,
            Some("Bearer "),
            Some("Basic dXNlcjpwYXNz"),
            Some(format!("Bearer {other}").as_str()),
            Some(format!("Bearer {expired}").as_str()),
        ] {
            let flash = extract(header_value, &keys).await.unwrap_err();
            assert_eq!(flash.location(), "/login?error=Unauthorized");
        }
    }
}
