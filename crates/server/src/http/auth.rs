use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use services::AuthService;

use super::error::ApiError;

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Present only when the request carries the valid admin token.
pub struct AdminAuth;

#[async_trait]
impl<S> FromRequestParts<S> for AdminAuth
where
    AuthService: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthService::from_ref(state);
        auth.authorize(bearer_token(&parts.headers)).await?;
        Ok(AdminAuth)
    }
}

/// Elevates the view when a valid token is sent; anything else is a visitor.
pub struct MaybeAdmin(pub bool);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAdmin
where
    AuthService: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            return Ok(MaybeAdmin(false));
        };
        let auth = AuthService::from_ref(state);
        Ok(MaybeAdmin(auth.verify(token).await?))
    }
}
