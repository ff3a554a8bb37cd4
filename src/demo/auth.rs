//! Stubbed authentication endpoints.
//!
//! Any well-formed email logs in; the password is not checked. Sessions are
//! random tokens held in the injected [`SessionStore`](crate::sessions::SessionStore).

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::demo::users::{NewUser, User};
use crate::demo::DemoState;
use crate::sessions::{create_token, SESSION_HEADER};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct OidcLoginRequest {
    #[serde(default = "default_provider")]
    pub provider: String,
}

fn default_provider() -> String {
    "google".to_string()
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// `{"detail": ...}` error body used by every demo endpoint.
pub(crate) fn detail(status: StatusCode, detail: &str) -> Response {
    (status, Json(serde_json::json!({ "detail": detail }))).into_response()
}

fn open_session(state: &DemoState, user: User) -> Json<LoginResponse> {
    let session_id = create_token();
    state.sessions.put(session_id.clone(), user.id);
    tracing::info!(user_id = %user.id, "Session created");
    Json(LoginResponse {
        user: user.into(),
        session_id,
    })
}

fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// The user behind the request's session, or `401 {"detail":"Unauthorized"}`.
///
/// A session whose user has vanished is dropped on the way.
pub(crate) fn require_user(state: &DemoState, headers: &HeaderMap) -> Result<User, Response> {
    let unauthorized = || detail(StatusCode::UNAUTHORIZED, "Unauthorized");
    let token = session_token(headers).ok_or_else(unauthorized)?;
    let user_id = state.sessions.get(token).ok_or_else(unauthorized)?;
    state.users.get(&user_id).ok_or_else(|| {
        state.sessions.delete(token);
        unauthorized()
    })
}

pub async fn login(State(state): State<DemoState>, Json(request): Json<LoginRequest>) -> Response {
    let Some((local, domain)) = request.email.split_once('@') else {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "Invalid email address");
    };
    if domain.is_empty() {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "Invalid email address");
    }

    let name = if local.is_empty() { "User" } else { local };
    let user = state.users.find_or_create(NewUser {
        email: request.email.clone(),
        name: name.to_string(),
        provider: "email".to_string(),
        provider_id: None,
    });

    open_session(&state, user).into_response()
}

pub async fn oidc_login(
    State(state): State<DemoState>,
    Json(request): Json<OidcLoginRequest>,
) -> Json<LoginResponse> {
    let user = state.users.find_or_create(NewUser {
        email: format!("demo@{}.com", request.provider),
        name: "Demo User".to_string(),
        provider: request.provider,
        provider_id: Some("mock-id".to_string()),
    });

    open_session(&state, user)
}

pub async fn logout(State(state): State<DemoState>, headers: HeaderMap) -> Json<serde_json::Value> {
    if let Some(token) = session_token(&headers) {
        if let Some(user_id) = state.sessions.delete(token) {
            tracing::info!(%user_id, "Session destroyed");
        }
    }
    Json(serde_json::json!({ "success": true }))
}

pub async fn session(State(state): State<DemoState>, headers: HeaderMap) -> Response {
    let Some(token) = session_token(&headers) else {
        return detail(StatusCode::UNAUTHORIZED, "No session");
    };
    let Some(user_id) = state.sessions.get(token) else {
        return detail(StatusCode::UNAUTHORIZED, "Invalid session");
    };
    match state.users.get(&user_id) {
        Some(user) => Json(UserResponse::from(user)).into_response(),
        None => {
            state.sessions.delete(token);
            detail(StatusCode::UNAUTHORIZED, "User not found")
        }
    }
}
