// handlers/mod.rs - three security tiers
//
// Public (no auth) → Protected (bearer token) → Elevated (bearer token + admin)
//
// The tier a handler lives in decides which middleware the router wraps it
// with; handlers themselves only read the `CurrentUser` extension.
pub mod public;
pub mod protected;
pub mod elevated;
