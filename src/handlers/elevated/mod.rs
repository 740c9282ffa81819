// handlers/elevated/mod.rs - bearer token and admin flag required
//
// Route prefix: /api/admin/*, plus the admin-only chart routes
// Middleware: require_user → require_admin

pub mod charts;
pub mod users;
