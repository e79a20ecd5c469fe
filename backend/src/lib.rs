pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod models;
pub mod services;
pub mod state;
