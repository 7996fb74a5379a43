//! Common utilities and shared types for the community message store.
//!
//! This crate provides the pieces every other crate leans on:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Logging**: Subscriber setup via [`logging::init`]
//!
//! # Example
//!
//! ```no_run
//! use community_common::{AppResult, Config};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     config.validate()?;
//!     community_common::logging::init(&config.logging)?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;

pub use config::Config;
pub use error::{AppError, AppResult};
