//! Core types and trait definitions for the consent service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::ConsentStore`]; the HTTP layer drives
//! [`service::ConsentResolver`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod admin;
pub mod caller;
pub mod catalog;
pub mod decision;
pub mod error;
pub mod person;
pub mod policy;
pub mod service;
pub mod store;

pub use error::{Error, Result};
