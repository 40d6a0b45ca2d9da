//! Email verification and password recovery.
//!
//! Both flows email a single-use link whose token is stored only as a
//! SHA-256 hash, one live token per user and purpose.

use axum::{
    extract::{Path, State},
    routing::{patch, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{ChangePasswordRequest, ForgotPasswordRequest, MessageResponse, ResetPasswordRequest},
        extractors::CurrentUser,
        handlers::normalize_email,
        password::{hash_password, is_long_enough, verify_password},
        repo_types::{Token, TokenPurpose, User},
        tokens,
    },
    error::{AppError, AppJson},
    mail::{EmailTemplate, OutgoingEmail},
    state::AppState,
};

const INVALID_TOKEN: &str = "Invalid or Expired Token";

pub fn recovery_routes() -> Router<AppState> {
    Router::new()
        .route("/sendVerificationEmail", post(send_verification_email))
        .route("/verifyUser/:verification_token", patch(verify_user))
        .route("/changePassword", patch(change_password))
        .route("/forgotPassword", post(forgot_password))
        .route("/resetPassword/:reset_token", patch(reset_password))
}

/// Replaces the user's token for `purpose` and emails the link to `{frontend}/{path}/{token}`.
async fn issue_and_send(
    state: &AppState,
    user: &User,
    purpose: TokenPurpose,
    path: &str,
    subject: &str,
    template: EmailTemplate,
) -> Result<(), AppError> {
    let (plain, record) = tokens::issue(user.id, purpose, OffsetDateTime::now_utc());
    state.store.replace_token(record).await?;

    let link = format!("{}/{}/{}", state.config.frontend_url, path, plain);
    state
        .mailer
        .send(OutgoingEmail {
            to: user.email.clone(),
            reply_to: None,
            subject: subject.to_string(),
            html_body: template.render(&user.name, &link),
        })
        .await
        .map_err(AppError::Mail)
}

/// Looks up a live token; an expired match is deleted and treated as absent.
async fn redeem(state: &AppState, plain: &str, purpose: TokenPurpose) -> Result<Token, AppError> {
    let hash = tokens::hash_token(plain.trim());
    let token = state
        .store
        .find_token(&hash, purpose)
        .await?
        .ok_or_else(|| AppError::not_found(INVALID_TOKEN))?;

    if token.is_expired(OffsetDateTime::now_utc()) {
        warn!(user_id = %token.user_id, ?purpose, "expired token presented");
        state.store.delete_token(token.id).await?;
        return Err(AppError::not_found(INVALID_TOKEN));
    }
    Ok(token)
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn send_verification_email(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MessageResponse>, AppError> {
    if user.is_verified {
        return Err(AppError::bad_request("User already verified"));
    }

    issue_and_send(
        &state,
        &user,
        TokenPurpose::Verification,
        "verify",
        "Verify Your Account",
        EmailTemplate::VerifyEmail,
    )
    .await?;

    info!("verification email sent");
    Ok(Json(MessageResponse::new("Verification Email Sent")))
}

#[instrument(skip_all)]
pub async fn verify_user(
    State(state): State<AppState>,
    Path(verification_token): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let token = redeem(&state, &verification_token, TokenPurpose::Verification).await?;

    let user = state
        .store
        .find_user_by_id(token.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if user.is_verified {
        return Err(AppError::bad_request("User is already verified"));
    }

    state.store.set_verified(user.id).await?;
    state.store.delete_token(token.id).await?;

    info!(user_id = %user.id, "account verified");
    Ok(Json(MessageResponse::new("Account Verification Successful")))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    WithRejection(Json(payload), _): AppJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if payload.old_password.is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("Please enter old and new password"));
    }
    if !is_long_enough(&payload.password) {
        return Err(AppError::bad_request("Password must be up to 6 characters."));
    }
    if !verify_password(&payload.old_password, &user.password_hash)? {
        warn!("change password with wrong old password");
        return Err(AppError::bad_request("Old password is incorrect"));
    }

    let hash = hash_password(&payload.password)?;
    state.store.set_password(user.id, &hash).await?;

    info!("password changed");
    Ok(Json(MessageResponse::new(
        "Password change successful, please re-login",
    )))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): AppJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = normalize_email(&payload.email);
    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::not_found("No user with this email"))?;

    issue_and_send(
        &state,
        &user,
        TokenPurpose::Reset,
        "resetPassword",
        "Password Reset Request",
        EmailTemplate::ForgotPassword,
    )
    .await?;

    info!(user_id = %user.id, "password reset email sent");
    Ok(Json(MessageResponse::new("Password Reset Email Sent")))
}

#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(reset_token): Path<String>,
    WithRejection(Json(payload), _): AppJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if !is_long_enough(&payload.password) {
        return Err(AppError::bad_request("Password must be up to 6 characters."));
    }

    let token = redeem(&state, &reset_token, TokenPurpose::Reset).await?;
    let hash = hash_password(&payload.password)?;
    state.store.set_password(token.user_id, &hash).await?;
    state.store.delete_token(token.id).await?;

    info!(user_id = %token.user_id, "password reset");
    Ok(Json(MessageResponse::new(
        "Password Reset Successful, please login",
    )))
}
