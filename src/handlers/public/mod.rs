// handlers/public/mod.rs - no authentication required
//
// Route prefixes: /api/auth/register, /api/auth/login, /api/files/*

pub mod auth;
pub mod files;
