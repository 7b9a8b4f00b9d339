// Library half of the MiniTwit server. Both binaries and the integration
// tests build on it.
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod flash;
pub mod metrics;
pub mod models;
pub mod moderation;
pub mod pages;
pub mod repository;
pub mod templates;
pub mod web_server;
