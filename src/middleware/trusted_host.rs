use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::HOST, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Host header allow-list
///
/// Entries are exact host names, `*` for any host, or `*.example.com` for
/// any subdomain of `example.com`. Ports are ignored.
#[derive(Debug, Clone)]
pub struct TrustedHosts {
    patterns: Vec<String>,
    allow_any: bool,
}

impl TrustedHosts {
    pub fn new(patterns: Vec<String>) -> Self {
        let patterns: Vec<String> = patterns.into_iter().map(|p| p.to_ascii_lowercase()).collect();
        let allow_any = patterns.iter().any(|p| p == "*");
        Self {
            patterns,
            allow_any,
        }
    }

    pub fn is_allowed(&self, host: &str) -> bool {
        if self.allow_any {
            return true;
        }
        let host = strip_port(host).to_ascii_lowercase();
        self.patterns.iter().any(|pattern| match pattern.strip_prefix("*.") {
            Some(domain) => host.ends_with(&format!(".{}", domain)),
            None => *pattern == host,
        })
    }
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        // IPv6 literal, keep the brackets
        return host.split_once(']').map_or(host, |(addr, _)| &host[..addr.len() + 1]);
    }
    host.split_once(':').map_or(host, |(name, _)| name)
}

/// Rejects requests whose Host header is not allow-listed
pub async fn trusted_host_middleware(
    State(hosts): State<Arc<TrustedHosts>>,
    request: Request,
    next: Next,
) -> Response {
    let host = request
        .headers()
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| request.uri().authority().map(|a| a.to_string()));

    let allowed = match host.as_deref() {
        Some(host) => hosts.is_allowed(host),
        None => hosts.allow_any,
    };

    if !allowed {
        tracing::warn!(host = ?host, "Rejected request with untrusted host");
        return (StatusCode::BAD_REQUEST, "Invalid host header").into_response();
    }

    next.run(request).await
}
