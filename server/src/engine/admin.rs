use std::collections::HashSet;

use super::error::{RelayError, Result};

/// Authorization gate for mutating and inspecting commands: a fixed
/// allowlist of privileged user ids configured at startup.
pub struct AdminGate {
    admins: HashSet<String>,
}

impl AdminGate {
    pub fn new<I>(admin_ids: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            admins: admin_ids.into_iter().collect(),
        }
    }

    /// Short-circuit with `AuthorizationDenied` unless the caller is
    /// privileged. Gated operations call this before touching any state.
    pub fn ensure(&self, user_id: &str) -> Result<()> {
        if self.admins.contains(user_id) {
            Ok(())
        } else {
            Err(RelayError::AuthorizationDenied)
        }
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admins.contains(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowlisted_user_passes() {
        let gate = AdminGate::new(["alice".to_string(), "bob".to_string()]);
        assert!(gate.ensure("alice").is_ok());
        assert!(gate.is_admin("bob"));
    }

    #[test]
    fn test_unknown_user_denied() {
        let gate = AdminGate::new(["alice".to_string()]);
        let err = gate.ensure("mallory").unwrap_err();
        assert!(matches!(err, RelayError::AuthorizationDenied));
    }

    #[test]
    fn test_empty_allowlist_denies_everyone() {
        let gate = AdminGate::new(Vec::new());
        assert!(gate.ensure("anyone").is_err());
    }
}
