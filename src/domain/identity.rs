//! Caller identity derivation for rate limiting.
//!
//! Every inbound request maps to exactly one identity key. Authenticated
//! callers are keyed by user id; anonymous callers by their best-known
//! address. Unidentifiable traffic shares a single `anonymous` bucket.

use std::fmt;

const ANONYMOUS: &str = "anonymous";

/// A rate-limit identity key: `user:<id>`, `ip:<address>`, or `anonymous`.
///
/// Derivation is deterministic for the same caller within one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallerIdentity(String);

impl CallerIdentity {
    /// Identity of an authenticated user.
    pub fn user(id: &str) -> Self {
        Self(format!("user:{id}"))
    }

    /// Identity of an unauthenticated caller known only by address.
    pub fn ip(addr: &str) -> Self {
        Self(format!("ip:{addr}"))
    }

    /// The shared identity for unidentifiable traffic.
    pub fn anonymous() -> Self {
        Self(ANONYMOUS.to_string())
    }

    /// Derive an identity from request context.
    ///
    /// Precedence: authenticated user id, then the first address of a
    /// forwarded-for chain, then a real-ip header value, then `anonymous`.
    pub fn derive(
        user_id: Option<&str>,
        forwarded_for: Option<&str>,
        real_ip: Option<&str>,
    ) -> Self {
        if let Some(id) = user_id.map(str::trim).filter(|id| !id.is_empty()) {
            return Self::user(id);
        }
        if let Some(chain) = forwarded_for {
            if let Some(first) = chain.split(',').next().map(str::trim).filter(|a| !a.is_empty())
            {
                return Self::ip(first);
            }
        }
        if let Some(addr) = real_ip.map(str::trim).filter(|a| !a.is_empty()) {
            return Self::ip(addr);
        }
        Self::anonymous()
    }

    /// The identity as a key fragment.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the shared anonymous identity.
    pub fn is_anonymous(&self) -> bool {
        self.0 == ANONYMOUS
    }
}

impl fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
