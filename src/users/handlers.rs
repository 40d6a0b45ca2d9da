use axum::{
    extract::{Path, State},
    routing::{delete, get, patch, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{AutomatedEmailRequest, UpdateUserRequest, UpgradeUserRequest};
use crate::{
    auth::{
        dto::{MessageResponse, PublicUser, UserSummary},
        extractors::{AdminUser, AuthorUser, CurrentUser, VerifiedUser},
        handlers::normalize_email,
        repo_types::{ProfileUpdate, Role},
    },
    error::{AppError, AppJson},
    mail::{EmailTemplate, OutgoingEmail},
    state::AppState,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/getuser", get(get_user))
        .route("/updateuser", patch(update_user))
        .route("/sendAutomatedEmail", post(send_automated_email))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/getUsers", get(get_users))
        .route("/upgradeUser", patch(upgrade_user))
        .route("/:id", delete(delete_user))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = state
        .store
        .find_user_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(Json(PublicUser::from(&user)))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    WithRejection(Json(payload), _): AppJson<UpdateUserRequest>,
) -> Result<Json<PublicUser>, AppError> {
    let update = ProfileUpdate {
        name: non_blank(payload.name),
        phone: non_blank(payload.phone),
        bio: non_blank(payload.bio),
        photo: non_blank(payload.photo),
    };
    let updated = state
        .store
        .update_profile(user.id, update)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    info!("profile updated");
    Ok(Json(PublicUser::from(&updated)))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = Uuid::parse_str(&id).map_err(|_| AppError::not_found("User not found"))?;
    if !state.store.delete_user(id).await? {
        warn!(user_id = %id, "delete of unknown user");
        return Err(AppError::not_found("User not found"));
    }

    info!(user_id = %id, "user deleted");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

#[instrument(skip(state, _caller))]
pub async fn get_users(
    State(state): State<AppState>,
    AuthorUser(_caller): AuthorUser,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    let users = state.store.list_users().await?;
    Ok(Json(users.iter().map(UserSummary::from).collect()))
}

#[instrument(skip(state, admin, payload), fields(admin_id = %admin.id))]
pub async fn upgrade_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    WithRejection(Json(payload), _): AppJson<UpgradeUserRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let role: Role = payload
        .role
        .parse()
        .map_err(|_| AppError::bad_request("Invalid role"))?;

    let user = state
        .store
        .set_role(payload.id, role)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    info!(user_id = %user.id, %role, "role changed");
    Ok(Json(MessageResponse::new(format!("User role updated to {role}"))))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn send_automated_email(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    WithRejection(Json(payload), _): AppJson<AutomatedEmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let AutomatedEmailRequest {
        subject,
        send_to,
        reply_to,
        template,
        url,
    } = payload;
    if [&subject, &send_to, &reply_to, &template, &url]
        .iter()
        .any(|f| f.trim().is_empty())
    {
        return Err(AppError::bad_request("Missing email parameter"));
    }

    let recipient = state
        .store
        .find_user_by_email(&normalize_email(&send_to))
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let template: EmailTemplate = template
        .parse()
        .map_err(|_| AppError::bad_request("Unknown email template"))?;

    let link = format!("{}{}", state.config.frontend_url, url.trim());
    state
        .mailer
        .send(OutgoingEmail {
            to: recipient.email.clone(),
            reply_to: Some(reply_to.trim().to_string()),
            subject: subject.trim().to_string(),
            html_body: template.render(&recipient.name, &link),
        })
        .await
        .map_err(AppError::Mail)?;

    info!(to = %recipient.email, ?template, "automated email sent");
    Ok(Json(MessageResponse::new("Email Sent")))
}
