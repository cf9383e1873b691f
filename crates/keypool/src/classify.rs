//! Upstream HTTP status classification
//!
//! Only a 429 drives pool state (the key that made the request is frozen).
//! Auth failures are surfaced distinctly so they stand out in logs; every
//! other failure is transient and the next cycle simply retries.

/// What an upstream error means for the key that made the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    /// Rate limited (429): freeze the key and skip the cycle
    RateLimited,
    /// Invalid or revoked key (401/403)
    Auth,
    /// Retryable next cycle (timeouts, 5xx, anything else)
    Transient,
}

/// Classify an upstream error by HTTP status.
///
/// 429 → RateLimited, 401/403 → Auth, 408/5xx and everything else →
/// Transient.
pub fn classify_status(status: u16) -> UpstreamErrorKind {
    match status {
        429 => UpstreamErrorKind::RateLimited,
        401 | 403 => UpstreamErrorKind::Auth,
        408 | 500 | 502 | 503 | 504 => UpstreamErrorKind::Transient,
        _ => UpstreamErrorKind::Transient,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_429_rate_limited() {
        assert_eq!(classify_status(429), UpstreamErrorKind::RateLimited);
    }

    #[test]
    fn classify_401_auth() {
        assert_eq!(classify_status(401), UpstreamErrorKind::Auth);
    }

    #[test]
    fn classify_403_auth() {
        assert_eq!(classify_status(403), UpstreamErrorKind::Auth);
    }

    #[test]
    fn classify_408_transient() {
        assert_eq!(classify_status(408), UpstreamErrorKind::Transient);
    }

    #[test]
    fn classify_500_transient() {
        assert_eq!(classify_status(500), UpstreamErrorKind::Transient);
    }

    #[test]
    fn classify_502_transient() {
        assert_eq!(classify_status(502), UpstreamErrorKind::Transient);
    }

    #[test]
    fn classify_503_transient() {
        assert_eq!(classify_status(503), UpstreamErrorKind::Transient);
    }

    #[test]
    fn classify_504_transient() {
        assert_eq!(classify_status(504), UpstreamErrorKind::Transient);
    }

    #[test]
    fn classify_unknown_is_transient() {
        assert_eq!(classify_status(418), UpstreamErrorKind::Transient);
    }
}
