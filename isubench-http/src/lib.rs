//! HTTP agent for isubench
//!
//! An [`Agent`] is one simulated browser session: its own cookie jar, its
//! own timeout, redirects left to the caller, and a cache of asset
//! validators so repeated crawls can be answered with `304 Not Modified`.

pub mod assets;
pub mod client;
pub mod config;
pub mod errors;
pub mod response;

// Re-export main types for convenience
pub use assets::AssetResource;
pub use client::Agent;
pub use config::AgentConfig;
pub use errors::{HttpError, HttpResult};
pub use response::Response;

pub use reqwest::{header, multipart};
pub use reqwest::{Method, Request, StatusCode};
