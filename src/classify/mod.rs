//! Error classification for calls against a cluster's API server.
//!
//! Two independent checks live here. [`is_api_not_available`] decides, from
//! the root cause's message, whether the control plane is simply not reachable
//! yet. [`is_status_forbidden`] decides, from a structured [`StatusError`],
//! whether access was denied. Both look only at the root cause of a wrapped
//! error, never fail, and keep no state between calls.

pub mod cause;
pub mod sentinel;
pub mod status;
pub mod unavailable;

// Re-export main types for convenient access
pub use cause::{root_cause, root_cause_within, MAX_CAUSE_DEPTH};
pub use sentinel::{Sentinel, API_NOT_AVAILABLE, STATUS_FORBIDDEN};
pub use status::{
    has_status_reason, is_status_forbidden, is_status_forbidden_opt, Status, StatusDetails,
    StatusError, StatusReason,
};
pub use unavailable::{
    is_api_not_available, is_api_not_available_opt, ApiAvailability, PatternDef,
    UnavailabilityPattern, Verdict, BUILTIN_PATTERNS,
};
