//! Configuration validation
//!
//! Checks build and batch configurations before anything touches the
//! filesystem, so a bad config fails at construction instead of halfway
//! through a build.

mod error;
mod validator;

#[cfg(test)]
mod proptests;

pub use error::ValidationError;
pub use validator::{validate_batch_settings, validate_build_spec};
