use std::fmt;

use dokira_db::table::Account as AccountTable;
use sea_query::{Expr, ExprTrait, Query, SqliteQueryBuilder};
use sea_query_sqlx::SqlxBinder;
use serde::{Deserialize, Serialize};
use sqlx::{SqlitePool, prelude::FromRow};
use strum::{AsRefStr, Display, EnumString};

use crate::{AuthError, Result};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
pub enum Role {
    #[strum(serialize = "medecin")]
    #[serde(rename = "medecin")]
    Doctor,
    #[strum(serialize = "patient")]
    #[serde(rename = "patient")]
    Patient,
}

/// A doctor or patient account as stored.
#[derive(Clone, PartialEq)]
pub struct Account {
    pub id: String,
    pub role: Role,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub speciality: Option<String>,
    pub is_active: bool,
    pub last_login: Option<i64>,
    pub created_at: i64,
}

impl Account {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("speciality", &self.speciality)
            .field("is_active", &self.is_active)
            .field("last_login", &self.last_login)
            .field("created_at", &self.created_at)
            .finish()
    }
}

#[derive(FromRow)]
struct AccountRow {
    id: String,
    role: sqlx::types::Text<Role>,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    speciality: Option<String>,
    is_active: bool,
    last_login: Option<i64>,
    created_at: i64,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            role: row.role.0,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            speciality: row.speciality,
            is_active: row.is_active,
            last_login: row.last_login,
            created_at: row.created_at,
        }
    }
}

pub enum FindType<'a> {
    Id(&'a str),
    Email(Role, &'a str),
}

/// Account persistence on the `account` table.
#[derive(Clone)]
pub struct AccountStore {
    pool: SqlitePool,
}

impl AccountStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn find(&self, find_type: FindType<'_>) -> Result<Option<Account>> {
        let mut statement = Query::select()
            .columns([
                AccountTable::Id,
                AccountTable::Role,
                AccountTable::Email,
                AccountTable::PasswordHash,
                AccountTable::FirstName,
                AccountTable::LastName,
                AccountTable::Speciality,
                AccountTable::IsActive,
                AccountTable::LastLogin,
                AccountTable::CreatedAt,
            ])
            .from(AccountTable::Table)
            .limit(1)
            .to_owned();

        match find_type {
            FindType::Id(id) => statement.and_where(Expr::col(AccountTable::Id).eq(id)),
            FindType::Email(role, email) => statement
                .and_where(Expr::col(AccountTable::Role).eq(role.to_string()))
                .and_where(Expr::col(AccountTable::Email).eq(email)),
        };

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);

        let row = sqlx::query_as_with::<_, AccountRow, _>(&sql, values)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Account::from))
    }

    pub async fn find_by_email(&self, role: Role, email: &str) -> Result<Option<Account>> {
        self.find(FindType::Email(role, email)).await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Account>> {
        self.find(FindType::Id(id)).await
    }

    pub async fn create(&self, account: &Account) -> Result<()> {
        let statement = Query::insert()
            .into_table(AccountTable::Table)
            .columns([
                AccountTable::Id,
                AccountTable::Role,
                AccountTable::Email,
                AccountTable::PasswordHash,
                AccountTable::FirstName,
                AccountTable::LastName,
                AccountTable::Speciality,
                AccountTable::IsActive,
                AccountTable::LastLogin,
                AccountTable::CreatedAt,
            ])
            .values_panic([
                account.id.to_owned().into(),
                account.role.to_string().into(),
                account.email.to_owned().into(),
                account.password_hash.to_owned().into(),
                account.first_name.to_owned().into(),
                account.last_name.to_owned().into(),
                account.speciality.to_owned().into(),
                account.is_active.into(),
                account.last_login.into(),
                account.created_at.into(),
            ])
            .to_owned();

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);

        match sqlx::query_with(&sql, values).execute(&self.pool).await {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AuthError::EmailAlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn update_last_login(&self, id: &str, at: i64) -> Result<()> {
        self.update(id, AccountTable::LastLogin, at.into()).await
    }

    pub async fn update_password_hash(&self, id: &str, password_hash: String) -> Result<()> {
        self.update(id, AccountTable::PasswordHash, password_hash.into())
            .await
    }

    pub async fn update_active(&self, id: &str, is_active: bool) -> Result<()> {
        self.update(id, AccountTable::IsActive, is_active.into())
            .await
    }

    async fn update(&self, id: &str, column: AccountTable, value: Expr) -> Result<()> {
        let statement = Query::update()
            .table(AccountTable::Table)
            .values([(column, value)])
            .and_where(Expr::col(AccountTable::Id).eq(id))
            .to_owned();

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        let result = sqlx::query_with(&sql, values).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound);
        }

        Ok(())
    }
}
