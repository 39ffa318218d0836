//! HTTP clients for external services
//!
//! The only remote dependency of the pipeline is the correlation token
//! issuer used to tag audit lines.

pub mod token;

pub use token::{
    CorrelationTokens, HttpTokenClient, LocalTokenSource, TokenError, TokenGrant, TokenSource,
};
