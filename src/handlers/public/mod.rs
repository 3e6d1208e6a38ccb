// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Account creation and token acquisition. Every input is validated here
// since there is no trusted caller yet.

pub mod user;

pub use user::{create_post, token_post};
