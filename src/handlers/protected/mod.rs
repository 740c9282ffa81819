// handlers/protected/mod.rs - bearer token required
//
// Every route here sits behind `require_user`, so `Extension<CurrentUser>`
// is always present.

pub mod auth;
pub mod charts;
