use thiserror::Error;

/// Crate-wide result type for registry and relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Typed failures surfaced by the relay engine and the pool registry.
///
/// Validation failures abort the triggering command without mutating state.
/// Persistence failures may occur after an in-memory mutation has been
/// applied; the caller still sees the operation as failed.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("pool `{0}` does not exist")]
    PoolNotFound(String),

    #[error("{}", not_in_pool_message(.pool, .channel, .member_of))]
    ChannelNotInPool {
        pool: String,
        channel: String,
        /// Other pools that currently list the channel, to aid the caller.
        member_of: Vec<String>,
    },

    #[error("pool `{0}` requires a password")]
    PasswordRequired(String),

    #[error("invalid password for pool `{0}`")]
    PasswordMismatch(String),

    #[error("pool `{0}` does not have a password")]
    NoPasswordSet(String),

    #[error("this command is reserved for administrators")]
    AuthorizationDenied,

    #[error("registry persistence unavailable: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("stored registry document is corrupt: {0}")]
    PersistenceCorrupt(#[from] serde_json::Error),
}

impl RelayError {
    /// Whether this is a caller mistake rather than a service-side failure.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            RelayError::Persistence(_) | RelayError::PersistenceCorrupt(_)
        )
    }
}

fn not_in_pool_message(pool: &str, channel: &str, member_of: &[String]) -> String {
    if member_of.is_empty() {
        format!("channel {channel} is not in any pool")
    } else {
        format!(
            "channel {channel} is not in the `{pool}` pool (currently in: `{}`)",
            member_of.join("`, `")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_not_in_pool_reports_other_pools() {
        let err = RelayError::ChannelNotInPool {
            pool: "general".into(),
            channel: "123".into(),
            member_of: vec!["other".into(), "third".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("not in the `general` pool"));
        assert!(msg.contains("`other`, `third`"));
    }

    #[test]
    fn test_channel_not_in_any_pool() {
        let err = RelayError::ChannelNotInPool {
            pool: "general".into(),
            channel: "123".into(),
            member_of: vec![],
        };
        assert_eq!(err.to_string(), "channel 123 is not in any pool");
    }

    #[test]
    fn test_validation_classification() {
        assert!(RelayError::PoolNotFound("x".into()).is_validation());
        assert!(RelayError::AuthorizationDenied.is_validation());
        let corrupt: RelayError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(!corrupt.is_validation());
    }
}
