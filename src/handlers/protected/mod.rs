// handlers/protected/mod.rs - Protected handlers (token authentication required)
//
// Every handler here takes `Extension<Caller>` and passes it to the store,
// which scopes all owned-resource queries to that caller.

pub mod label;
pub mod recipe;
pub mod user;
