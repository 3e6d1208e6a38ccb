// handlers/mod.rs - Handler tiers
//
// Public (no auth) → Protected (token auth). The router in `app.rs` applies
// the token middleware to every protected route; protected handlers receive
// the resolved `Caller` as a request extension.

pub mod protected;
pub mod public;
