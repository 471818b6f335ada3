use axum::{
    Form, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use dokira_identity::{AuthError, LoginInput, Role, normalize_email};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{ApiUser, AuthUser, Portal, build_cookie, identify, removal_cookie};
use crate::server::AppState;

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Signed-in visitors go straight to their dashboard.
pub async fn page<P: Portal>(State(state): State<AppState>, jar: CookieJar) -> Response {
    if identify::<P>(&jar, &state).await.is_some() {
        return Redirect::to(P::DASHBOARD_PATH).into_response();
    }

    Json(json!({
        "authenticated": false,
        "role": P::ROLE,
        "action": P::LOGIN_PATH,
    }))
    .into_response()
}

pub async fn action<P: Portal>(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(input): Form<LoginForm>,
) -> Response {
    let email = normalize_email(&input.email);

    let result = state
        .auth
        .login(LoginInput {
            role: P::ROLE,
            email: email.to_owned(),
            password: input.password,
        })
        .await;

    match result {
        Ok(session) => {
            let cookie = build_cookie::<P>(
                &session.token,
                state.auth.ttl(),
                state.config.auth.secure_cookie,
            );

            (jar.add(cookie), Redirect::to(P::DASHBOARD_PATH)).into_response()
        }
        // a disabled account answers exactly like a wrong password
        Err(AuthError::InvalidCredentials | AuthError::InactiveAccount) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": AuthError::InvalidCredentials.to_string(),
                "email": email,
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(role = %P::ROLE, error = %e, "login failed");

            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "An error occurred. Please try again later."})),
            )
                .into_response()
        }
    }
}

pub async fn logout<P: Portal>(jar: CookieJar) -> impl IntoResponse {
    (jar.remove(removal_cookie::<P>()), Redirect::to(P::LOGIN_PATH))
}

pub async fn dashboard<P: Portal>(AuthUser(identity, ..): AuthUser<P>) -> String {
    let account = identity.account;

    match account.role {
        Role::Doctor => format!("Welcome, Dr. {}", account.full_name()),
        Role::Patient => format!("Welcome, {}", account.full_name()),
    }
}

pub async fn info<P: Portal>(ApiUser(identity, ..): ApiUser<P>) -> impl IntoResponse {
    let account = identity.account;

    Json(json!({
        "id": account.id,
        "email": account.email,
        "role": account.role,
        "first_name": account.first_name,
        "last_name": account.last_name,
        "full_name": account.full_name(),
        "speciality": account.speciality,
        "last_login": account.last_login,
        "expires_at": identity.claims.exp,
    }))
}
