/// External credential validator consulted on every mutating and stats
/// path (spec.md §4.B). This models the collaborator only; the actual
/// credential store (LDAP, local users, a cluster-wide secret) is out of
/// scope for the core.
pub trait CredentialValidator: Send + Sync {
    /// Validates an opaque `Authorization` header value. Returns `true`
    /// if the request may proceed.
    fn validate(&self, auth_header: Option<&str>) -> bool;
}

/// Accepts every request. Useful for internal, already-authenticated
/// callers (the CLI bootstrap talking to its own in-process dispatcher).
pub struct AllowAll;

impl CredentialValidator for AllowAll {
    fn validate(&self, _auth_header: Option<&str>) -> bool {
        true
    }
}

/// Validates a single static `user:pass`-style bearer token, matching the
/// `auth (user:pass)` CLI flag in spec.md §6.
pub struct StaticToken(pub String);

impl CredentialValidator for StaticToken {
    fn validate(&self, auth_header: Option<&str>) -> bool {
        auth_header.is_some_and(|h| h == self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_token_requires_exact_match() {
        let validator = StaticToken("admin:secret".to_string());
        assert!(validator.validate(Some("admin:secret")));
        assert!(!validator.validate(Some("admin:wrong")));
        assert!(!validator.validate(None));
    }
}
