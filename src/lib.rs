//! Lead Intake API Library
//!
//! Backend for the public lead-intake form: lead and lead-metrics storage,
//! an admin-only scored view of leads, and the rule-based scoring engine that
//! ranks them.
//!
//! # Modules
//!
//! - `auth`: Admin bearer-token gate.
//! - `config`: Configuration management.
//! - `db`: Database connection pool and schema bootstrap.
//! - `db_storage`: Lead and lead-metrics storage operations.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `models`: Database rows and request bodies.
//! - `scoring`: Lead scoring engine and ranking.

pub mod auth;
pub mod config;
pub mod db;
pub mod db_storage;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod scoring;
