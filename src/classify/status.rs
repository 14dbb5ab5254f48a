//! Structured status errors and the checks built on their reason field.
//!
//! The API server answers failed requests with a `Status` object carrying a
//! machine-readable reason. Checks in this module look at that reason on the
//! root cause directly instead of parsing message text.

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;

use super::cause::root_cause;
use super::sentinel::Sentinel;

/// Machine-readable reason attached to a failed API response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusReason {
    Unauthorized,
    Forbidden,
    NotFound,
    AlreadyExists,
    Conflict,
    Gone,
    Invalid,
    ServerTimeout,
    Timeout,
    TooManyRequests,
    BadRequest,
    MethodNotAllowed,
    NotAcceptable,
    RequestEntityTooLarge,
    UnsupportedMediaType,
    InternalError,
    Expired,
    ServiceUnavailable,
    /// Any reason not listed above, including an empty one.
    #[default]
    #[serde(other, rename = "")]
    Unknown,
}

impl StatusReason {
    /// Returns the reason as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusReason::Unauthorized => "Unauthorized",
            StatusReason::Forbidden => "Forbidden",
            StatusReason::NotFound => "NotFound",
            StatusReason::AlreadyExists => "AlreadyExists",
            StatusReason::Conflict => "Conflict",
            StatusReason::Gone => "Gone",
            StatusReason::Invalid => "Invalid",
            StatusReason::ServerTimeout => "ServerTimeout",
            StatusReason::Timeout => "Timeout",
            StatusReason::TooManyRequests => "TooManyRequests",
            StatusReason::BadRequest => "BadRequest",
            StatusReason::MethodNotAllowed => "MethodNotAllowed",
            StatusReason::NotAcceptable => "NotAcceptable",
            StatusReason::RequestEntityTooLarge => "RequestEntityTooLarge",
            StatusReason::UnsupportedMediaType => "UnsupportedMediaType",
            StatusReason::InternalError => "InternalError",
            StatusReason::Expired => "Expired",
            StatusReason::ServiceUnavailable => "ServiceUnavailable",
            StatusReason::Unknown => "",
        }
    }
}

impl fmt::Display for StatusReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extra detail identifying the object a status refers to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDetails {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub kind: String,
}

/// A status object as returned by the API server.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    /// `"Success"` or `"Failure"`.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub reason: StatusReason,
    #[serde(default)]
    pub code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<StatusDetails>,
}

const STATUS_FAILURE: &str = "Failure";

/// An error carrying a structured [`Status`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusError {
    status: Status,
}

impl StatusError {
    /// Wraps a status.
    pub fn new(status: Status) -> Self {
        Self { status }
    }

    /// Parses a status object from a JSON response body.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body).map(Self::new)
    }

    /// Access to `name` of `resource` was denied; `detail` explains why.
    ///
    /// `resource` is the qualified resource, e.g. `deployments.apps`; an empty
    /// resource or name is left out of the message.
    pub fn forbidden(resource: &str, name: &str, detail: &str) -> Self {
        let message = match (resource.is_empty(), name.is_empty()) {
            (true, _) => format!("forbidden: {}", detail),
            (false, true) => format!("{} is forbidden: {}", resource, detail),
            (false, false) => format!("{} {:?} is forbidden: {}", resource, name, detail),
        };
        Self::failure(
            StatusReason::Forbidden,
            403,
            message,
            Some(details_for(resource, name)),
        )
    }

    /// The request was not authenticated.
    pub fn unauthorized(reason: &str) -> Self {
        let message = if reason.is_empty() {
            "not authorized".to_string()
        } else {
            reason.to_string()
        };
        Self::failure(StatusReason::Unauthorized, 401, message, None)
    }

    /// `name` of `resource` does not exist.
    pub fn not_found(resource: &str, name: &str) -> Self {
        Self::failure(
            StatusReason::NotFound,
            404,
            format!("{} {:?} not found", resource, name),
            Some(details_for(resource, name)),
        )
    }

    fn failure(
        reason: StatusReason,
        code: u16,
        message: String,
        details: Option<StatusDetails>,
    ) -> Self {
        Self::new(Status {
            status: STATUS_FAILURE.to_string(),
            message,
            reason,
            code,
            details,
        })
    }

    /// Returns the underlying status.
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Returns the status reason.
    pub fn reason(&self) -> StatusReason {
        self.status.reason
    }
}

fn details_for(resource: &str, name: &str) -> StatusDetails {
    // `deployments.apps` splits into kind `deployments`, group `apps`.
    let (kind, group) = resource.split_once('.').unwrap_or((resource, ""));
    StatusDetails {
        name: name.to_string(),
        group: group.to_string(),
        kind: kind.to_string(),
    }
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.status.message)
    }
}

impl StdError for StatusError {}

impl From<Status> for StatusError {
    fn from(status: Status) -> Self {
        Self::new(status)
    }
}

/// Returns true if the root cause of `err` is a [`StatusError`] with `reason`.
///
/// Only the structured field is compared; the message is ignored.
pub fn has_status_reason(err: &(dyn StdError + 'static), reason: StatusReason) -> bool {
    root_cause(err)
        .downcast_ref::<StatusError>()
        .is_some_and(|status| status.reason() == reason)
}

/// Returns true if `err` means access was forbidden.
///
/// Matches when the root cause is the
/// [`STATUS_FORBIDDEN`](super::STATUS_FORBIDDEN) sentinel or a [`StatusError`]
/// whose reason is [`StatusReason::Forbidden`].
pub fn is_status_forbidden(err: &(dyn StdError + 'static)) -> bool {
    let cause = root_cause(err);
    if Sentinel::StatusForbidden.is(cause) {
        return true;
    }

    match cause.downcast_ref::<StatusError>() {
        Some(status) => status.reason() == StatusReason::Forbidden,
        None => false,
    }
}

/// Same as [`is_status_forbidden`]; `None` is never a match.
pub fn is_status_forbidden_opt(err: Option<&(dyn StdError + 'static)>) -> bool {
    err.is_some_and(is_status_forbidden)
}
