use std::marker::PhantomData;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use dokira_identity::{Identity, Role};
use serde_json::json;

use crate::server::AppState;

/// One login area of the site: doctors under `/medecin`, patients under
/// `/patient`. Each has its own cookie so both can be signed in side by side.
pub trait Portal: Send + Sync + 'static {
    const ROLE: Role;
    const COOKIE: &'static str;
    const LOGIN_PATH: &'static str;
    const LOGOUT_PATH: &'static str;
    const DASHBOARD_PATH: &'static str;
    const INFO_PATH: &'static str;
}

pub struct DoctorPortal;

impl Portal for DoctorPortal {
    const ROLE: Role = Role::Doctor;
    const COOKIE: &'static str = "medecin_access_token";
    const LOGIN_PATH: &'static str = "/medecin/connexion";
    const LOGOUT_PATH: &'static str = "/medecin/deconnexion";
    const DASHBOARD_PATH: &'static str = "/medecin/dashboard";
    const INFO_PATH: &'static str = "/medecin/api/info";
}

pub struct PatientPortal;

impl Portal for PatientPortal {
    const ROLE: Role = Role::Patient;
    const COOKIE: &'static str = "patient_access_token";
    const LOGIN_PATH: &'static str = "/patient/connexion";
    const LOGOUT_PATH: &'static str = "/patient/deconnexion";
    const DASHBOARD_PATH: &'static str = "/patient/dashboard";
    const INFO_PATH: &'static str = "/patient/api/info";
}

pub fn build_cookie<P: Portal>(
    token: &str,
    ttl: time::Duration,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((P::COOKIE, format!("Bearer {token}")))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(ttl)
        .build()
}

pub fn removal_cookie<P: Portal>() -> Cookie<'static> {
    Cookie::build(P::COOKIE).path("/").build()
}

/// Resolve the identity carried by the portal cookie, if any.
pub async fn identify<P: Portal>(jar: &CookieJar, state: &AppState) -> Option<Identity> {
    let value = jar.get(P::COOKIE)?.value().to_owned();

    match state.auth.authenticate(P::ROLE, &value).await {
        Ok(identity) => Some(identity),
        Err(e) if e.is_unauthenticated() => {
            tracing::debug!(role = %P::ROLE, error = %e, "session cookie rejected");
            None
        }
        Err(e) => {
            tracing::error!(role = %P::ROLE, error = %e, "failed to authenticate session");
            None
        }
    }
}

/// Authenticated user for page routes; anonymous visitors are sent to the
/// portal's login page.
pub struct AuthUser<P>(pub Identity, pub PhantomData<P>);

impl<P: Portal> FromRequestParts<AppState> for AuthUser<P> {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        identify::<P>(&jar, state)
            .await
            .map(|identity| AuthUser(identity, PhantomData))
            .ok_or(Redirect::to(P::LOGIN_PATH))
    }
}

/// Authenticated user for JSON routes.
pub struct ApiUser<P>(pub Identity, pub PhantomData<P>);

pub struct NotAuthenticated;

impl IntoResponse for NotAuthenticated {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Not authenticated"})),
        )
            .into_response()
    }
}

impl<P: Portal> FromRequestParts<AppState> for ApiUser<P> {
    type Rejection = NotAuthenticated;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        identify::<P>(&jar, state)
            .await
            .map(|identity| ApiUser(identity, PhantomData))
            .ok_or(NotAuthenticated)
    }
}
