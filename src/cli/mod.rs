pub mod account;
pub mod server;
