pub mod auth;
pub mod config;
pub mod db;
pub mod observability;
pub mod routes;
pub mod server;

pub use config::Config;
pub use db::create_pool;
pub use routes::router;
pub use server::AppState;
