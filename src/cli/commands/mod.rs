pub mod label;
pub mod recipe;
pub mod server;
pub mod user;
