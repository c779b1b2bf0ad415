//! Origin policy filter.
//!
//! The decision (allow-list membership) is a pure function so it can be
//! tested on its own; whether a Deny actually blocks the request is a
//! separate configuration choice. The reference deployment runs in log-only
//! mode: unlisted origins are warned about and permitted anyway, so browser
//! clients on ad-hoc hosts keep working during labs.

use axum::http::{header, HeaderValue, Method};
use regex::Regex;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Outcome of evaluating a request origin against the allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginDecision {
    Allow,
    Deny,
}

/// Allow-list of literal origins plus the deployment platform's subdomain
/// pattern.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    literals: Vec<String>,
    pattern: Regex,
}

impl OriginPolicy {
    pub fn new() -> Self {
        Self {
            literals: [
                "http://localhost:3000",
                "http://localhost:8080",
                // VS Code Live Server
                "http://localhost:5500",
                "http://127.0.0.1:5500",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            pattern: Regex::new(r"\.railway\.app$").expect("origin pattern is valid"),
        }
    }

    /// Decide whether `origin` is on the allow-list.
    ///
    /// Absent origins (same-origin requests, curl, mobile apps) never reach
    /// this check; the CORS layer only consults it when an Origin header is
    /// present.
    pub fn evaluate(&self, origin: &str) -> OriginDecision {
        let listed = self.literals.iter().any(|allowed| allowed == origin)
            || self.pattern.is_match(origin);
        if listed {
            OriginDecision::Allow
        } else {
            OriginDecision::Deny
        }
    }
}

impl Default for OriginPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Decide whether to reflect `origin` back, applying the enforce flag.
///
/// In log-only mode (`enforce == false`) a Deny is warned about but still
/// permitted, matching the reference behavior.
pub fn permit_origin(policy: &OriginPolicy, enforce: bool, origin: &str) -> bool {
    match policy.evaluate(origin) {
        OriginDecision::Allow => true,
        OriginDecision::Deny if enforce => {
            tracing::warn!("Blocked request from unlisted origin: {}", origin);
            false
        }
        OriginDecision::Deny => {
            tracing::warn!("Allowing request from unlisted origin: {}", origin);
            true
        }
    }
}

/// Build the CORS layer: reflected origins per the policy, the advertised
/// method/header set, and credentials allowed.
pub fn cors_layer(policy: OriginPolicy, enforce: bool) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            let origin = origin.to_str().unwrap_or_default();
            permit_origin(&policy, enforce, origin)
        }))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_origins_are_allowed() {
        let policy = OriginPolicy::new();
        assert_eq!(
            policy.evaluate("http://localhost:3000"),
            OriginDecision::Allow
        );
        assert_eq!(
            policy.evaluate("http://127.0.0.1:5500"),
            OriginDecision::Allow
        );
    }

    #[test]
    fn platform_subdomains_match_the_pattern() {
        let policy = OriginPolicy::new();
        assert_eq!(
            policy.evaluate("https://myapp.up.railway.app"),
            OriginDecision::Allow
        );
    }

    #[test]
    fn unlisted_origins_are_denied() {
        let policy = OriginPolicy::new();
        assert_eq!(
            policy.evaluate("http://evil.example"),
            OriginDecision::Deny
        );
        assert_eq!(
            policy.evaluate("http://railway.app.evil.example"),
            OriginDecision::Deny
        );
    }

    #[test]
    fn log_only_mode_permits_denied_origins() {
        let policy = OriginPolicy::new();
        assert!(permit_origin(&policy, false, "http://evil.example"));
    }

    #[test]
    fn enforce_mode_blocks_denied_origins() {
        let policy = OriginPolicy::new();
        assert!(!permit_origin(&policy, true, "http://evil.example"));
        assert!(permit_origin(&policy, true, "http://localhost:8080"));
    }
}
