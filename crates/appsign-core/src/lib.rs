//! Core types and configuration for appsign request signing.
//!
//! This crate provides the building blocks shared by the signer, the verifier
//! and any caller-side glue: the identity [`Context`] a request is made on
//! behalf of, the [`Timestamp`] and [`TimeToLive`] values that drive freshness
//! checks, and the [`SigningConfig`] used by applications embedding the
//! verifier.

mod config;
mod context;
mod error;
mod time;

pub use config::SigningConfig;
pub use context::{AppId, Context, EnvironmentId, SpaceId, Subject, UserId};
pub use error::{CoreError, CoreResult};
pub use time::{TimeToLive, Timestamp};
