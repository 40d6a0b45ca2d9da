use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::{Duration, OffsetDateTime};

pub const SESSION_COOKIE: &str = "token";

/// Lifetime of a freshly issued session cookie.
pub const SESSION_COOKIE_TTL: Duration = Duration::days(1);

/// HttpOnly, Secure, SameSite=None session cookie expiring at `expires`.
pub fn session_cookie(token: String, expires: OffsetDateTime) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::None)
        .secure(true)
        .expires(expires)
        .build()
}

/// Empty session cookie already expired at the Unix epoch.
pub fn expired_session_cookie() -> Cookie<'static> {
    session_cookie(String::new(), OffsetDateTime::UNIX_EPOCH)
}

pub fn session_token(jar: &CookieJar) -> Option<&str> {
    jar.get(SESSION_COOKIE)
        .map(|c| c.value())
        .filter(|v| !v.is_empty())
}
