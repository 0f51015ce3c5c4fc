//! Async client core for the accounts API.
//!
//! # Overview
//! Builds `HttpRequest` descriptors for the accounts collection, executes
//! them over a pooled reqwest client, and returns `HttpResponse` descriptors
//! with the whole body already read.
//!
//! # Design
//! - `AccountsClient` knows create/fetch/delete and where the collection
//!   lives (`ClientConfig`); it holds no global state.
//! - `Transport` owns the connection pool and does the wire conversion.
//! - Every call takes a `Context` (deadline + cancellation token); the
//!   non-`_with` verbs use `Context::background()`.
//! - Status codes are never turned into errors. A 409 or 404 comes back as a
//!   normal `HttpResponse`.

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::AccountsClient;
pub use config::ClientConfig;
pub use context::Context;
pub use error::{ApiError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, TransportOptions};
pub use types::{Account, AccountAttributes, AccountData};
