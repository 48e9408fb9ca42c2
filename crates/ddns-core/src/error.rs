//! Error types for the DDNS system
//!
//! This module defines all error types used throughout the crate.

use crate::traits::IpVersion;
use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// The echo resolver address could not be established at startup
    #[error("Bootstrap failed: {0}")]
    Bootstrap(String),

    /// A DNS answer was malformed or of an unexpected type
    #[error("DNS protocol violation: {0}")]
    Protocol(String),

    /// The echo query returned no usable address record
    #[error("No record: {0}")]
    NoRecord(String),

    /// A DNS query could not be sent or was not answered
    #[error("DNS transport error: {0}")]
    Transport(String),

    /// The IPv6 path to the echo resolver has no route
    #[error("No route to the IPv6 echo resolver ({0}). Does your connection support IPv6?")]
    NoIpv6Route(String),

    /// IPv6 was requested but no IPv6 echo resolver address is known
    #[error("IPv6 echo resolver address unavailable: {0}")]
    Ipv6Unavailable(String),

    /// Address discovery failed for one address family
    #[error("Error retrieving your public {family} address: {source}")]
    Discovery {
        /// Address family being discovered
        family: IpVersion,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a bootstrap error
    pub fn bootstrap(msg: impl Into<String>) -> Self {
        Self::Bootstrap(msg.into())
    }

    /// Create a protocol violation error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a "no record" error
    pub fn no_record(msg: impl Into<String>) -> Self {
        Self::NoRecord(msg.into())
    }

    /// Create a DNS transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a "no IPv6 route" error
    pub fn no_ipv6_route(msg: impl Into<String>) -> Self {
        Self::NoIpv6Route(msg.into())
    }

    /// Create an "IPv6 unavailable" error
    pub fn ipv6_unavailable(msg: impl Into<String>) -> Self {
        Self::Ipv6Unavailable(msg.into())
    }

    /// Wrap an error with the address family being discovered
    pub fn discovery(family: IpVersion, source: Error) -> Self {
        Self::Discovery {
            family,
            source: Box::new(source),
        }
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// The innermost error, looking through `Discovery` wrappers
    pub fn root(&self) -> &Error {
        match self {
            Error::Discovery { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether retrying can never succeed without operator intervention
    ///
    /// Fatal errors stop the update loop immediately; everything else is
    /// treated as transient and retried with backoff.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.root(),
            Error::Authentication(_) | Error::Config(_) | Error::NoIpv6Route(_)
        )
    }

    /// Whether this is the provider's "unauthorized" answer
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.root(), Error::Authentication(_))
    }
}
