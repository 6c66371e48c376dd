pub mod app_error;
pub mod app_state;
pub mod auth;
pub mod bootstrap;
pub mod client;
pub mod config;
pub mod db;
pub mod domain;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod schema;
pub mod store;
pub mod swagger;
