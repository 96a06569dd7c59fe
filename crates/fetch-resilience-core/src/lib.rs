//! Core infrastructure for fetch-resilience.
//!
//! This crate provides the pieces shared by every component of the
//! acquisition layer:
//! - The [`FetchError`] taxonomy and its retryability classification
//! - The event system used by all components for observability
//! - Cache key namespacing helpers

pub mod error;
pub mod events;
pub mod keys;

pub use error::{ErrorKind, FetchError};
pub use events::{ComponentEvent, EventListener, EventListeners, FnListener};
