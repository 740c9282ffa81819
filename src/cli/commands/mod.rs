pub mod db;
pub mod user;
