#![allow(dead_code)]

use std::path::{Path, PathBuf};

use axum::{
    Router,
    body::Body,
    http::{Request, header},
    response::Response,
};
use axum_extra::extract::cookie::Cookie;
use dokira::{
    AppState,
    config::{AuthConfig, Config, DatabaseConfig, ObservabilityConfig, ServerConfig},
};
use dokira_identity::{Account, CredentialHasher, NewAccount, Role};
use tower::ServiceExt;

pub const SECRET: &str = "test_secret_key_minimum_32_characters_long";
pub const PASSWORD: &str = "my_password";

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

pub fn config(path: &Path) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_owned(),
            port: 8000,
        },
        database: DatabaseConfig {
            url: format!("sqlite:{}", path.to_str().unwrap()),
            max_connections: 1,
        },
        auth: AuthConfig {
            secret: SECRET.to_owned(),
            token_ttl_minutes: 1440,
            secure_cookie: false,
        },
        observability: ObservabilityConfig::default(),
    }
}

pub async fn setup_test_app(path: PathBuf) -> anyhow::Result<TestApp> {
    let config = config(&path);
    let pool = dokira::create_pool(&config.database.url, config.database.max_connections).await?;
    dokira_db::migrate(&pool).await?;

    let mut state = AppState::new(config, pool);
    state.auth = state.auth.with_hasher(CredentialHasher::new(8192, 1, 1)?);

    let router = dokira::router(state.clone());

    Ok(TestApp { state, router })
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::get(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        self.send(request.body(Body::empty()).unwrap()).await
    }

    pub async fn login(&self, uri: &str, email: &str, password: &str) -> Response {
        let body = serde_urlencoded::to_string([("email", email), ("password", password)]).unwrap();
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();

        self.send(request).await
    }

    /// Log in and return the `name=value` pair to replay as a Cookie header.
    pub async fn session_cookie(&self, uri: &str, email: &str) -> String {
        let response = self.login(uri, email, PASSWORD).await;
        let set_cookie = set_cookie(&response).expect("login should set a cookie");

        set_cookie.split(';').next().unwrap().to_owned()
    }

    pub async fn create_doctor(&self, name: &str) -> anyhow::Result<Account> {
        Ok(self
            .state
            .auth
            .register(NewAccount {
                role: Role::Doctor,
                email: format!("{name}@dokira.localhost"),
                password: PASSWORD.to_owned(),
                first_name: "Awa".to_owned(),
                last_name: name.to_owned(),
                speciality: Some("Cardiologie".to_owned()),
            })
            .await?)
    }

    pub async fn create_patient(&self, name: &str) -> anyhow::Result<Account> {
        Ok(self
            .state
            .auth
            .register(NewAccount {
                role: Role::Patient,
                email: format!("{name}@dokira.localhost"),
                password: PASSWORD.to_owned(),
                first_name: "Jean".to_owned(),
                last_name: name.to_owned(),
                speciality: None,
            })
            .await?)
    }
}

pub fn set_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

pub fn parse_set_cookie(response: &Response) -> Option<Cookie<'static>> {
    Cookie::parse_encoded(set_cookie(response)?).ok()
}

pub fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

pub async fn json_body(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    serde_json::from_slice(&body).unwrap()
}

pub async fn text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    String::from_utf8(body.to_vec()).unwrap()
}
