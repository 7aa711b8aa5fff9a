//! Route handlers. Each one delegates to the auth service and maps its errors.

use super::dto::{
    CreateUserRequest, CreatedResponse, CredentialsRequest, EmailQuery, MessageResponse,
    RefreshRequest, SessionResponse,
};
use super::AppState;
use crate::auth::Session;
use crate::error::AuthError;
use crate::metrics;
use crate::model::UserInfo;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

/// Cookie carrying the access token.
pub const ACCESS_COOKIE: &str = "access_token";
/// Cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "refresh_token";

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AuthError> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| AuthError::Validation(e.body_text()))
}

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .build()
}

/// `GET /healthz`
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// `GET /metrics`
pub async fn render_metrics() -> Response {
    match metrics::render() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Metrics encoding failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `POST /user/register`
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), AuthError> {
    let req = body(payload)?;
    state.auth.register(&req.email, &req.password).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "user successfully registered".to_string(),
        }),
    ))
}

/// `POST /user/login`
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<SessionResponse>), AuthError> {
    let req = body(payload)?;
    let session = state
        .auth
        .login(&req.email, &req.password)
        .await
        .map_err(AuthError::conceal_credentials)?;

    Ok(with_cookies(jar, session))
}

/// `POST /user/refresh`
///
/// The token is taken from the body, falling back to the cookie set at
/// login.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Option<Json<RefreshRequest>>,
) -> Result<(CookieJar, Json<SessionResponse>), AuthError> {
    let token = payload
        .and_then(|Json(req)| req.refresh_token)
        .filter(|t| !t.is_empty())
        .or_else(|| jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()))
        .ok_or_else(|| AuthError::Validation("refresh_token is required".to_string()))?;

    let session = state.auth.refresh(&token).await?;
    Ok(with_cookies(jar, session))
}

fn with_cookies(jar: CookieJar, session: Session) -> (CookieJar, Json<SessionResponse>) {
    let response = SessionResponse::from(session);
    let jar = jar
        .add(session_cookie(ACCESS_COOKIE, response.access_token.clone()))
        .add(session_cookie(REFRESH_COOKIE, response.refresh_token.clone()));
    (jar, Json(response))
}

/// `GET /admin/user/:id`
pub async fn get_user_by_id(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<UserInfo>, AuthError> {
    let Path(id) = id.map_err(|_| AuthError::Validation("id is incorrect".to_string()))?;
    let user = state.auth.get_by_id(id).await?;
    Ok(Json(user.into()))
}

/// `GET /admin/user/all`
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserInfo>>, AuthError> {
    let users = state.auth.list().await?;
    Ok(Json(users.into_iter().map(UserInfo::from).collect()))
}

/// `GET /admin/user?email=`
pub async fn get_user_by_email(
    State(state): State<AppState>,
    query: Result<Query<EmailQuery>, QueryRejection>,
) -> Result<Json<UserInfo>, AuthError> {
    let Query(query) = query.map_err(|e| AuthError::Validation(e.body_text()))?;
    let user = state.auth.get_by_email(&query.email).await?;
    Ok(Json(user.into()))
}

/// `POST /admin/user`
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), AuthError> {
    let req = body(payload)?;
    let id = state.auth.create(req.into()).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}
