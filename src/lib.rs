pub mod app;
pub mod config;
pub mod favorites;
pub mod models;
pub mod store;
pub mod tmdb;
