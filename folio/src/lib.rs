//! Expose folio's command implementations for use in integration tests and
//! the xtask crate. Library consumers should depend on `folio-markdown`
//! instead.
pub mod cli;
pub mod commands;
pub mod output;
