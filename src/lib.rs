pub mod config;
pub mod drive;
pub mod pdf;
pub mod roster;
pub mod routes;
pub mod session;
pub mod state;
pub mod templates;
