use clap::ValueEnum;
use dokira::Config;
use dokira_identity::{Authenticator, NewAccount, SessionAuthority};

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Role {
    Medecin,
    Patient,
}

impl From<Role> for dokira_identity::Role {
    fn from(role: Role) -> Self {
        match role {
            Role::Medecin => dokira_identity::Role::Doctor,
            Role::Patient => dokira_identity::Role::Patient,
        }
    }
}

pub struct CreateInput {
    pub role: Role,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub speciality: Option<String>,
}

async fn authenticator(config: &Config) -> anyhow::Result<Authenticator> {
    let pool = dokira::create_pool(&config.database.url, 1).await?;
    dokira_db::migrate(&pool).await?;

    // account administration never issues tokens
    let authority = SessionAuthority::new(config.auth.secret.as_bytes());

    Ok(Authenticator::new(pool, authority, config.auth.token_ttl()))
}

pub async fn create(config: Config, input: CreateInput) -> anyhow::Result<()> {
    let auth = authenticator(&config).await?;

    let account = auth
        .register(NewAccount {
            role: input.role.into(),
            email: input.email,
            password: input.password,
            first_name: input.first_name,
            last_name: input.last_name,
            speciality: input.speciality,
        })
        .await?;

    tracing::info!("{} account {} created ({})", account.role, account.email, account.id);

    Ok(())
}

pub async fn set_active(
    config: Config,
    role: Role,
    email: String,
    is_active: bool,
) -> anyhow::Result<()> {
    let auth = authenticator(&config).await?;
    auth.set_active(role.into(), &email, is_active).await?;

    if is_active {
        tracing::info!("{email} can sign in again");
    } else {
        tracing::info!("{email} is now disabled");
    }

    Ok(())
}

pub async fn set_password(
    config: Config,
    role: Role,
    email: String,
    password: String,
) -> anyhow::Result<()> {
    let auth = authenticator(&config).await?;
    auth.set_password(role.into(), &email, &password).await?;

    tracing::info!("password updated for {email}");

    Ok(())
}
