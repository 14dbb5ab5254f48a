//! apiready - classify API client errors during cluster bring-up
//!
//! Decides whether an error returned by a Kubernetes API client means the
//! target control plane is not reachable *yet* (DNS, ingress, TLS or the API
//! server still coming up) rather than a real failure. Callers use the answer
//! to pick between backing off and giving up.
//!
//! ```
//! use apiready::{is_api_not_available, is_status_forbidden, StatusError};
//!
//! let err = std::io::Error::new(
//!     std::io::ErrorKind::Other,
//!     "Get \"https://api.x.io/api/v1/nodes\": EOF",
//! );
//! assert!(is_api_not_available(&err));
//!
//! let denied = StatusError::forbidden("nodes", "", "RBAC denied");
//! assert!(is_status_forbidden(&denied));
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod logging;

pub use classify::{
    has_status_reason, is_api_not_available, is_api_not_available_opt, is_status_forbidden,
    is_status_forbidden_opt, root_cause, ApiAvailability, Sentinel, Status, StatusError,
    StatusReason, UnavailabilityPattern, Verdict, API_NOT_AVAILABLE, STATUS_FORBIDDEN,
};
pub use config::ClassifierConfig;
pub use error::ClassifierError;
