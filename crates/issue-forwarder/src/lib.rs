//! Web trigger that turns authenticated requests into Jira issues.
//!
//! This crate provides:
//! - Shared-secret authentication of inbound trigger requests
//! - Translation of a simplified JSON request into Jira's create-issue document
//! - A REST client for Jira's issue creation endpoint
//! - The request handler mapping every outcome to a structured response
//! - An HTTP server hosting the trigger (standalone service)

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Every stage returns a typed error

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod models;
pub mod server;

pub use client::{IssueCreator, JiraClient};
pub use config::Config;
pub use error::{ConfigError, ForwardError, JiraError, ParseError};
pub use handler::IssueForwarder;
pub use models::*;
