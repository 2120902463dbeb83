pub mod api;
pub mod cache;
pub mod chat;
pub mod config;
pub mod error;
pub mod model;
pub mod template;
pub mod transcript;
pub mod turn;
pub mod util;
pub mod validate;
