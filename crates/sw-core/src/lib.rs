//! Core types for the offline cache controller.
//!
//! This crate provides the fundamental types shared by every other crate:
//! - `FetchRequest` / `ResponseSnapshot` - Intercepted requests and buffered responses
//! - `WorkerConfig` - Immutable worker configuration (cache names, patterns, precache list)
//! - `WorkerState` - Worker lifecycle states

mod config;
mod lifecycle;
mod request;
mod response;

pub use config::*;
pub use lifecycle::*;
pub use request::*;
pub use response::*;

pub use http::{HeaderMap, Method, StatusCode};
pub use url::Url;
