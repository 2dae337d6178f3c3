use thiserror::Error;

/// ACL server error types
#[derive(Error, Debug)]
pub enum AclError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid IP range: {0}")]
    InvalidIpRange(String),

    /// A port or port range outside [1, 65535]. Callers turn this into
    /// their own rejection instead of propagating it as a parse failure.
    #[error("Invalid port range: {0}")]
    InvalidPortRange(String),

    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Rule not found: {0}")]
    RuleNotFound(String),

    #[error("Illegal IP address or port: {0}")]
    IllegalQuery(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AclError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_range_error_is_matchable() {
        // Rule parsing relies on telling a bounds failure apart from other
        // errors without looking at the message.
        let err = AclError::InvalidPortRange("0".into());
        assert!(matches!(err, AclError::InvalidPortRange(_)));
    }

    #[test]
    fn test_error_display_includes_message() {
        let err = AclError::InvalidAddress("1.2.3".into());
        let display = format!("{}", err);
        assert!(display.contains("1.2.3"), "got: {}", display);
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use");
        let err: AclError = io.into();
        match &err {
            AclError::IoError(e) => assert_eq!(e.kind(), std::io::ErrorKind::AddrInUse),
            _ => panic!("expected IoError"),
        }
    }
}
