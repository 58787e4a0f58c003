//! Upstat Server Library
//!
//! Groups and services of an uptime monitor, their visibility rules and
//! display order, and the aggregation of raw checks into charts and uptime.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod models;
pub mod pagination;
pub mod routes;
pub mod services;
