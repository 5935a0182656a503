//! Credential-hiding CORS proxies for AWS Lambda.
//!
//! One generic [`handler::handle`] is bound to a per-service
//! [`config::UpstreamConfig`] by each Lambda binary.

pub mod config;
pub mod cors;
pub mod handler;
pub mod http;
pub mod models;
pub mod services;
