use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use super::{
    cookie::session_token,
    jwt::JwtKeys,
    repo_types::{Role, User},
};
use crate::{error::AppError, state::AppState};

const NOT_AUTHORIZED: &str = "Not Authorized, please Login.";

/// Caller identified by a valid session cookie; suspended users are rejected.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = session_token(&jar).ok_or_else(|| AppError::unauthorized(NOT_AUTHORIZED))?;

        let claims = JwtKeys::from_ref(state).verify(token).map_err(|e| {
            warn!(error = %e, "invalid or expired session token");
            AppError::unauthorized(NOT_AUTHORIZED)
        })?;

        let user = state
            .store
            .find_user_by_id(claims.sub)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "session for unknown user");
                AppError::unauthorized(NOT_AUTHORIZED)
            })?;

        if user.role == Role::Suspended {
            warn!(user_id = %user.id, "suspended user rejected");
            return Err(AppError::unauthorized(
                "User is suspended, please contact support.",
            ));
        }

        Ok(CurrentUser(user))
    }
}

/// Session user with the admin role.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.role.is_admin() {
            return Err(AppError::unauthorized("Not Authorized as an Admin"));
        }
        Ok(AdminUser(user))
    }
}

/// Session user with the author or admin role.
pub struct AuthorUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthorUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.role.can_author() {
            return Err(AppError::unauthorized("Not Authorized as an author"));
        }
        Ok(AuthorUser(user))
    }
}

/// Session user whose email address is verified.
pub struct VerifiedUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for VerifiedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_verified {
            return Err(AppError::unauthorized("Not Authorized, account not verified"));
        }
        Ok(VerifiedUser(user))
    }
}
