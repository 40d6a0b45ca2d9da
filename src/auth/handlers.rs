use axum::{
    extract::{FromRef, State},
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::{cookie::CookieJar, WithRejection};
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        cookie::{expired_session_cookie, session_cookie, session_token, SESSION_COOKIE_TTL},
        dto::{AuthResponse, LoginRequest, MessageResponse, PublicUser, RegisterRequest},
        jwt::JwtKeys,
        password::{hash_password, is_long_enough, verify_password},
        repo_types::{NewUser, User},
    },
    error::{AppError, AppJson},
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/loginStatus", get(login_status))
}

/// Signs a session for `user` and attaches the cookie.
fn start_session(state: &AppState, jar: CookieJar, user: &User) -> Result<(CookieJar, AuthResponse), AppError> {
    let keys = JwtKeys::from_ref(state);
    let token = keys.sign(user.id)?;
    let expires = OffsetDateTime::now_utc() + SESSION_COOKIE_TTL;
    let jar = jar.add(session_cookie(token.clone(), expires));
    Ok((
        jar,
        AuthResponse {
            user: PublicUser::from(user),
            token,
        },
    ))
}

#[instrument(skip(state, jar, headers, payload))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    WithRejection(Json(payload), _): AppJson<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), AppError> {
    let name = payload.name.trim().to_string();
    let email = normalize_email(&payload.email);

    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("Please fill in all the required fields."));
    }

    if !is_long_enough(&payload.password) {
        warn!("password too short");
        return Err(AppError::bad_request("Password must be up to 6 characters."));
    }

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::bad_request("Please enter a valid email"));
    }

    if state.store.find_user_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::bad_request("Email already in use."));
    }

    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let password_hash = hash_password(&payload.password)?;
    let user = state
        .store
        .create_user(NewUser {
            name,
            email,
            password_hash,
            user_agent,
        })
        .await?;

    let (jar, body) = start_session(&state, jar, &user)?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, jar, Json(body)))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(payload), _): AppJson<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("Please fill Email and Password."));
    }

    let user = match state.store.find_user_by_email(&email).await? {
        Some(u) => u,
        None => {
            warn!(email = %email, "login unknown email");
            return Err(AppError::bad_request("User not found, Please register."));
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AppError::bad_request("Invalid email or password."));
    }

    let (jar, body) = start_session(&state, jar, &user)?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((jar, Json(body)))
}

#[instrument(skip(jar))]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.add(expired_session_cookie()),
        Json(MessageResponse::new("Logout successful")),
    )
}

/// `true` when the request carries a session cookie that verifies.
#[instrument(skip(state, jar))]
pub async fn login_status(State(state): State<AppState>, jar: CookieJar) -> Json<bool> {
    let valid = session_token(&jar)
        .map(|token| JwtKeys::from_ref(&state).verify(token).is_ok())
        .unwrap_or(false);
    Json(valid)
}
