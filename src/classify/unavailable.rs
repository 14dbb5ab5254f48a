//! Message-pattern classifier for an unreachable control plane.
//!
//! The classifier tests the root cause of an error against an ordered table of
//! regular expressions, each describing one error shape the API client
//! produces while the target cluster is still coming up: DNS not propagated,
//! ingress not routing, TLS not ready, connections dropped mid-request.
//!
//! Request-line patterns are anchored at the start of the message (optionally
//! after one opening quote), accept the URL quoted or bare, and accept any
//! query string on the URL. DNS failures match either bare or behind such a
//! request line, and only for `api.` hosts.

use regex::Regex;
use std::error::Error as StdError;
use std::sync::OnceLock;

use super::cause::{root_cause_within, MAX_CAUSE_DEPTH};
use super::sentinel::Sentinel;
use crate::error::ClassifierError;

/// One row of the built-in pattern table.
#[derive(Clone, Copy, Debug)]
pub struct PatternDef {
    /// Stable identifier, reported when the pattern fires.
    pub name: &'static str,
    /// Regular expression source.
    pub regex: &'static str,
    /// What failure this pattern recognizes.
    pub description: &'static str,
}

/// Built-in table, in match order. Append new signatures at the end.
pub const BUILTIN_PATTERNS: &[PatternDef] = &[
    PatternDef {
        name: "dns-resolver",
        regex: r#"^(?:"?(?:Get|Post|Put|Patch|Delete) "?https://api\.[^"\s]*"?: )?dial tcp: lookup api\.\S+ on \S+:53: (?:no such host|server misbehaving)"#,
        description: "DNS record not yet resolvable through the cluster resolver",
    },
    PatternDef {
        name: "nodes-eof",
        regex: r#"^"?Get "?https://api\.[^"\s]*/api/v1/nodes[^"\s]*"?:.* (?:unexpected )?EOF"#,
        description: "node listing cut off by the API server",
    },
    PatternDef {
        name: "namespaces-eof",
        regex: r#"^"?(?:Get|Post) "?https://api\.[^"\s]*/api/v1/namespaces/[^"\s]*"?:.* (?:unexpected )?EOF"#,
        description: "namespaced request cut off by the API server",
    },
    PatternDef {
        name: "nodes-transport-timeout",
        regex: r#"^"?(?:Get|Patch) "?https://api\.[^"\s]*/api/v1/nodes[^"\s]*"?: net/http: (?:TLS handshake timeout|request canceled(?: while waiting for connection)?(?: \(Client\.Timeout exceeded while awaiting headers\))?)"#,
        description: "node request timed out before the transport was ready",
    },
    PatternDef {
        name: "ingress-certificate",
        regex: r#"^"?(?:Get|Post) "?https://api\.[^"\s]*"?: x509: certificate is valid for ingress\.local, not api\."#,
        description: "ingress controller still serving its default certificate",
    },
    PatternDef {
        name: "discovery-eof",
        regex: r#"^"?(?:Get|Post|Put|Patch|Delete) "?https://api\.[^/"\s]*/api(?:\?[^"\s]*)?"?:.* (?:unexpected )?EOF"#,
        description: "API discovery request cut off by the API server",
    },
    PatternDef {
        name: "dns-host-lookup",
        regex: r#"^(?:"?(?:Get|Post|Put|Patch|Delete) "?https://api\.[^"\s]*"?: )?dial tcp: lookup api\.[^\s:]+: (?:no such host|server misbehaving)"#,
        description: "DNS record not yet resolvable, no resolver reported",
    },
    PatternDef {
        name: "tcp-io-timeout",
        regex: r#"^"?(?:Get|Post|Put|Patch|Delete) "?https://api\.[^"\s]*"?: dial tcp \S+: i/o timeout"#,
        description: "TCP connect to the API endpoint timed out",
    },
    PatternDef {
        name: "context-deadline",
        regex: r#"^"?(?:Get|Post|Put|Patch|Delete) "?https://api\.[^"\s]*"?: context deadline exceeded(?: \(Client\.Timeout exceeded while awaiting headers\))?"#,
        description: "request deadline passed before the API server answered",
    },
    PatternDef {
        name: "unknown-authority",
        regex: r#"^"?(?:Get|Post|Put|Patch|Delete) "?https://api\.[^"\s]*"?: x509: certificate signed by unknown authority"#,
        description: "API server certificate not yet issued by the cluster CA",
    },
    PatternDef {
        name: "certificate-expired",
        regex: r#"^"?(?:Get|Post|Put|Patch|Delete) "?https://api\.[^"\s]*"?: x509: certificate has expired or is not yet valid"#,
        description: "API server certificate outside its validity window",
    },
];

/// A compiled pattern describing one unavailability error shape.
#[derive(Clone, Debug)]
pub struct UnavailabilityPattern {
    name: String,
    regex: Regex,
    description: String,
}

impl UnavailabilityPattern {
    /// Compiles a new pattern.
    ///
    /// # Errors
    /// Returns [`ClassifierError::InvalidPattern`] if `pattern` is not a valid
    /// regular expression.
    pub fn new(
        name: impl Into<String>,
        pattern: &str,
        description: impl Into<String>,
    ) -> Result<Self, ClassifierError> {
        let name = name.into();
        let regex = Regex::new(pattern).map_err(|source| ClassifierError::InvalidPattern {
            name: name.clone(),
            source,
        })?;
        Ok(Self::with_regex(name, regex, description))
    }

    /// Creates a pattern from a pre-compiled regex.
    pub fn with_regex(
        name: impl Into<String>,
        regex: Regex,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            regex,
            description: description.into(),
        }
    }

    fn from_def(def: &PatternDef) -> Self {
        // Every built-in row is compiled by the tests below.
        let regex = Regex::new(def.regex).expect("built-in pattern must compile");
        Self::with_regex(def.name, regex, def.description)
    }

    /// Returns the pattern's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the compiled regex.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Returns the description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Checks if this pattern matches the given message.
    pub fn matches(&self, message: &str) -> bool {
        self.regex.is_match(message)
    }

    /// Returns the matched part of the message, if any.
    pub fn find<'a>(&self, message: &'a str) -> Option<&'a str> {
        self.regex.find(message).map(|m| m.as_str())
    }
}

/// Why an error was (or was not) classified as API-not-available.
#[derive(Clone, Copy, Debug)]
pub enum Verdict<'a> {
    /// The root cause is the [`Sentinel::ApiNotAvailable`] sentinel.
    Sentinel,
    /// The root cause's message matched this pattern.
    Pattern(&'a UnavailabilityPattern),
    /// Nothing matched.
    Unmatched,
}

impl Verdict<'_> {
    /// Returns true if the verdict means the API is not available.
    pub fn is_not_available(&self) -> bool {
        !matches!(self, Verdict::Unmatched)
    }

    /// Name of the rule that fired, `"sentinel"` for the sentinel.
    pub fn rule(&self) -> Option<&str> {
        match self {
            Verdict::Sentinel => Some("sentinel"),
            Verdict::Pattern(pattern) => Some(pattern.name()),
            Verdict::Unmatched => None,
        }
    }
}

/// Classifier deciding whether an error means the API is not yet reachable.
///
/// The table is fixed once the classifier is built; share it freely across
/// threads.
#[derive(Clone, Debug)]
pub struct ApiAvailability {
    patterns: Vec<UnavailabilityPattern>,
    max_cause_depth: usize,
}

impl Default for ApiAvailability {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiAvailability {
    /// Creates a classifier with the built-in pattern table.
    pub fn new() -> Self {
        Self::with_patterns(BUILTIN_PATTERNS.iter().map(UnavailabilityPattern::from_def).collect())
    }

    /// Creates a classifier with a custom pattern table.
    pub fn with_patterns(patterns: Vec<UnavailabilityPattern>) -> Self {
        Self {
            patterns,
            max_cause_depth: MAX_CAUSE_DEPTH,
        }
    }

    /// Returns the shared classifier holding the built-in table.
    pub fn builtin() -> &'static ApiAvailability {
        static BUILTIN: OnceLock<ApiAvailability> = OnceLock::new();
        BUILTIN.get_or_init(ApiAvailability::new)
    }

    /// Sets how many `source()` hops are followed to reach the root cause.
    pub fn with_max_cause_depth(mut self, depth: usize) -> Self {
        self.max_cause_depth = depth.max(1);
        self
    }

    /// Appends a pattern after the existing ones.
    pub fn add_pattern(&mut self, pattern: UnavailabilityPattern) {
        self.patterns.push(pattern);
    }

    /// Returns the configured patterns in match order.
    pub fn patterns(&self) -> &[UnavailabilityPattern] {
        &self.patterns
    }

    /// Returns the number of patterns configured.
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Returns the configured unwrap depth.
    pub fn max_cause_depth(&self) -> usize {
        self.max_cause_depth
    }

    /// Returns the first pattern matching `message`.
    pub fn matching_pattern(&self, message: &str) -> Option<&UnavailabilityPattern> {
        self.patterns.iter().find(|pattern| pattern.matches(message))
    }

    /// Returns true if `message` matches any pattern.
    pub fn matches_message(&self, message: &str) -> bool {
        self.matching_pattern(message).is_some()
    }

    /// Explains how `err` is classified.
    pub fn explain(&self, err: &(dyn StdError + 'static)) -> Verdict<'_> {
        let cause = root_cause_within(err, self.max_cause_depth);
        if Sentinel::ApiNotAvailable.is(cause) {
            return Verdict::Sentinel;
        }

        match self.matching_pattern(&cause.to_string()) {
            Some(pattern) => Verdict::Pattern(pattern),
            None => Verdict::Unmatched,
        }
    }

    /// Returns true if `err` means the API is not yet reachable.
    pub fn is_api_not_available(&self, err: &(dyn StdError + 'static)) -> bool {
        self.explain(err).is_not_available()
    }
}

/// Returns true if `err` means the target API is not yet reachable.
///
/// Only the root cause is inspected. It matches when it is the
/// [`API_NOT_AVAILABLE`](super::API_NOT_AVAILABLE) sentinel or when its
/// message matches one of [`BUILTIN_PATTERNS`].
pub fn is_api_not_available(err: &(dyn StdError + 'static)) -> bool {
    ApiAvailability::builtin().is_api_not_available(err)
}

/// Same as [`is_api_not_available`]; `None` is never a match.
pub fn is_api_not_available_opt(err: Option<&(dyn StdError + 'static)>) -> bool {
    err.is_some_and(is_api_not_available)
}
