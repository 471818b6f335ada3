use std::{path::PathBuf, str::FromStr};

use dokira_identity::{Account, Authenticator, NewAccount, Role, SessionAuthority};
use sqlx::{SqlitePool, sqlite::SqliteConnectOptions};
use time::Duration;

pub const SECRET: &str = "test_secret_key_minimum_32_characters_long";

pub struct TestState {
    pub pool: SqlitePool,
    pub auth: Authenticator,
}

pub async fn setup_test_state(path: PathBuf) -> anyhow::Result<TestState> {
    let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.to_str().unwrap()))?
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;
    dokira_db::migrate(&pool).await?;

    let auth = Authenticator::new(
        pool.clone(),
        SessionAuthority::new(SECRET),
        Duration::minutes(1440),
    );

    Ok(TestState { pool, auth })
}

#[allow(dead_code)]
pub async fn create_doctor(state: &TestState, name: &str) -> anyhow::Result<Account> {
    Ok(state
        .auth
        .register(NewAccount {
            role: Role::Doctor,
            email: format!("{name}@dokira.localhost"),
            password: "my_password".to_owned(),
            first_name: "Awa".to_owned(),
            last_name: name.to_owned(),
            speciality: Some("Cardiologie".to_owned()),
        })
        .await?)
}

#[allow(dead_code)]
pub async fn create_patient(state: &TestState, name: &str) -> anyhow::Result<Account> {
    Ok(state
        .auth
        .register(NewAccount {
            role: Role::Patient,
            email: format!("{name}@dokira.localhost"),
            password: "my_password".to_owned(),
            first_name: "Jean".to_owned(),
            last_name: name.to_owned(),
            speciality: None,
        })
        .await?)
}
