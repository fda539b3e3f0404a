//! Read-only HTTP API over pre-computed card recommendation scores.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
