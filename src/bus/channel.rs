//! Channel name validation
//!
//! Channels live in a fixed namespace: `view:<scope>:<type>:<action>` with
//! optional further segments. Names outside the convention are rejected at
//! the call site, never coerced.

use crate::error::ChannelError;

/// Required first segment of every channel name
pub const CHANNEL_NAMESPACE: &str = "view";

/// Minimum number of colon-delimited segments
pub const MIN_SEGMENTS: usize = 4;

/// Validate a channel name
///
/// Valid iff splitting on `:` yields at least [`MIN_SEGMENTS`] non-empty
/// segments and the first equals [`CHANNEL_NAMESPACE`]. Used identically for
/// subscribe and publish.
pub fn validate_channel(name: &str) -> Result<(), ChannelError> {
    let segments: Vec<&str> = name.split(':').collect();

    if segments.len() < MIN_SEGMENTS || segments.iter().any(|s| s.is_empty()) {
        return Err(ChannelError::MalformedName(name.to_string()));
    }

    if segments[0] != CHANNEL_NAMESPACE {
        return Err(ChannelError::WrongNamespace(name.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_minimal_and_extended_channels() {
        assert!(validate_channel("view:chat:message:sent").is_ok());
        assert!(validate_channel("view:config:item:updated:extra").is_ok());
        assert!(validate_channel("view:a:b:c:d:e:f").is_ok());
    }

    #[test]
    fn test_rejects_wrong_namespace() {
        assert_eq!(
            validate_channel("model:chat:message:sent"),
            Err(ChannelError::WrongNamespace(
                "model:chat:message:sent".to_string()
            ))
        );
    }

    #[test]
    fn test_rejects_too_few_segments() {
        assert!(matches!(
            validate_channel("view:chat:message"),
            Err(ChannelError::MalformedName(_))
        ));
        assert!(matches!(
            validate_channel("view"),
            Err(ChannelError::MalformedName(_))
        ));
        assert!(matches!(
            validate_channel(""),
            Err(ChannelError::MalformedName(_))
        ));
    }

    #[test]
    fn test_rejects_empty_segments() {
        assert!(matches!(
            validate_channel("view::message:sent"),
            Err(ChannelError::MalformedName(_))
        ));
        assert!(matches!(
            validate_channel("view:chat:message:"),
            Err(ChannelError::MalformedName(_))
        ));
        assert!(matches!(
            validate_channel(":chat:message:sent"),
            Err(ChannelError::MalformedName(_))
        ));
    }
}
