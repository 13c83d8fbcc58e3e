pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod migrations;
pub mod models;
pub mod openapi;
pub mod providers;
pub mod retry;
pub mod routes;
pub mod services;
pub mod state;
