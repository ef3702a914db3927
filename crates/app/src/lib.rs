//! `tally-app`
//!
//! **Responsibility:** the surface a presentation layer calls into.
//!
//! - [`commands::LedgerService`]: the ledger operations over raw form input
//! - [`dto`]: request/response shapes
//! - [`errors`]: error → `{ "error", "message" }` mapping
//!
//! Formatting, search debouncing and file downloads stay with the caller.

pub mod commands;
pub mod dto;
pub mod errors;

pub use commands::LedgerService;
pub use errors::ServiceError;
