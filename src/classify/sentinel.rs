//! Sentinel errors recognized by identity.
//!
//! Callers that already know the condition holds can return one of these
//! directly instead of relying on message text. The classifiers recognize a
//! sentinel by downcasting the root cause to [`Sentinel`] and matching the
//! variant; the message is never compared.

use std::error::Error as StdError;
use thiserror::Error;

/// Distinguished error values matched by identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum Sentinel {
    /// The target cluster's API is known to be unreachable.
    #[error("API not available")]
    ApiNotAvailable,
    /// Access to the target resource is known to be forbidden.
    #[error("status forbidden")]
    StatusForbidden,
}

/// Sentinel signalling that the API is not available.
pub const API_NOT_AVAILABLE: Sentinel = Sentinel::ApiNotAvailable;

/// Sentinel signalling a forbidden status.
pub const STATUS_FORBIDDEN: Sentinel = Sentinel::StatusForbidden;

impl Sentinel {
    /// Returns true if `err` itself (not its chain) is this sentinel.
    pub fn is(self, err: &(dyn StdError + 'static)) -> bool {
        err.downcast_ref::<Sentinel>() == Some(&self)
    }
}
