use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::auth::{DoctorPortal, PatientPortal, Portal};
use crate::server::AppState;

mod health;
mod session;

pub fn router(app_state: AppState) -> Router {
    Router::new()
        // Health check endpoints (no auth required)
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .merge(portal::<DoctorPortal>())
        .merge(portal::<PatientPortal>())
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}

fn portal<P: Portal>() -> Router<AppState> {
    Router::new()
        .route(
            P::LOGIN_PATH,
            get(session::page::<P>).post(session::action::<P>),
        )
        .route(P::LOGOUT_PATH, get(session::logout::<P>))
        .route(P::DASHBOARD_PATH, get(session::dashboard::<P>))
        .route(P::INFO_PATH, get(session::info::<P>))
}
