//! Common utilities and shared types for grantdesk.
//!
//! This crate provides foundational components used across all grantdesk crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based identifiers, invite codes and support
//!   correlation codes via [`IdGenerator`]
//! - **CPF**: Brazilian taxpayer number validation via [`Cpf`]
//!
//! # Example
//!
//! ```no_run
//! use grantdesk_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod cpf;
pub mod error;
pub mod id;

pub use config::Config;
pub use cpf::Cpf;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
