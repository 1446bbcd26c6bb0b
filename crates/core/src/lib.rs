//! Core business logic for grantdesk.

pub mod services;

pub use services::*;
