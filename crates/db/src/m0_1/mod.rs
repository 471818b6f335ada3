mod account;

use sqlx_migrator::vec_box;

pub struct Migration;

sqlx_migrator::sqlite_migration!(
    Migration,
    "dokira",
    "m0_1",
    vec_box![],
    vec_box![account::CreateTable, account::CreateUk1]
);
