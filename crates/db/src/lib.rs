use sqlx::SqlitePool;
use sqlx_migrator::migrator::{Migrate, Plan};
use sqlx_migrator::{Info, Migrator};

mod m0_1;
pub mod table;

pub fn migrator() -> Result<Migrator<sqlx::Sqlite>, sqlx_migrator::Error> {
    let mut migrator = Migrator::<sqlx::Sqlite>::default();
    migrator.add_migrations(vec![Box::new(m0_1::Migration)])?;

    Ok(migrator)
}

/// Apply every pending migration on the given pool.
pub async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
    let mut conn = pool.acquire().await?;
    migrator()?.run(&mut conn, &Plan::apply_all()).await?;
    tracing::debug!("database migrations applied");

    Ok(())
}

/// Roll back every applied migration.
pub async fn revert(pool: &SqlitePool) -> anyhow::Result<()> {
    let mut conn = pool.acquire().await?;
    migrator()?.run(&mut conn, &Plan::revert_all()).await?;

    Ok(())
}
