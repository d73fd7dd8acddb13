//! cion - deployment dashboard API
//!
//! Search-driven listings, permission trees and session auth behind an
//! HTTP API.

pub mod auth;
pub mod cli;
pub mod http_server;
pub mod listing;
pub mod observability;
pub mod permissions;
pub mod search;
