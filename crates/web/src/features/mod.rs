pub mod admin;
pub mod athletes;
pub mod auth;
pub mod uploads;
