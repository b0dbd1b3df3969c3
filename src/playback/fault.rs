//! Playback error classification
//!
//! Maps errors reported by the streaming client onto the fault taxonomy and
//! decides how a session reacts to them.
//!
//! | Class                  | Retryable      | Reaction                          |
//! |------------------------|----------------|-----------------------------------|
//! | StreamAbsent           | n/a            | `NoStream` state, not an error    |
//! | Network                | bounded        | linear backoff, then fatal        |
//! | MediaDecode            | unbounded      | in-place recovery, no backoff     |
//! | UnsupportedEnvironment | no             | fatal immediately                 |
//! | OtherFatal             | no             | fatal, decoder destroyed          |
//!
//! Only the classes that can leave a session in `Error` have a [`FaultClass`].

use std::time::Duration;

use super::config::PlaybackConfig;

/// Error category reported by the streaming client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Manifest or fragment fetch failed
    Network,
    /// Demux/decode failure
    Media,
    /// Anything else, including unsupported content
    Other,
}

/// Error event emitted by a decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderError {
    pub kind: ErrorKind,
    /// Fatal errors stop the pipeline; non-fatal ones self-heal
    pub fatal: bool,
    /// Collaborator-supplied detail, for logs
    pub details: String,
}

impl DecoderError {
    /// Create a fatal error
    pub fn fatal(kind: ErrorKind, details: impl Into<String>) -> Self {
        Self {
            kind,
            fatal: true,
            details: details.into(),
        }
    }

    /// Create a non-fatal error
    pub fn transient(kind: ErrorKind, details: impl Into<String>) -> Self {
        Self {
            kind,
            fatal: false,
            details: details.into(),
        }
    }

    pub fn network(details: impl Into<String>) -> Self {
        Self::fatal(ErrorKind::Network, details)
    }

    pub fn media(details: impl Into<String>) -> Self {
        Self::fatal(ErrorKind::Media, details)
    }

    pub fn other(details: impl Into<String>) -> Self {
        Self::fatal(ErrorKind::Other, details)
    }
}

impl std::fmt::Display for DecoderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = if self.fatal { "fatal" } else { "non-fatal" };
        write!(f, "{} {:?} error: {}", severity, self.kind, self.details)
    }
}

/// Failure that puts a session into `Error`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultClass {
    /// Network retries exhausted
    Network,
    UnsupportedEnvironment,
    OtherFatal,
}

impl FaultClass {
    /// Whether entering `Error` for this class discards the decoder
    pub fn destroys_decoder(&self) -> bool {
        matches!(
            self,
            FaultClass::UnsupportedEnvironment | FaultClass::OtherFatal
        )
    }

    /// Generic, human-readable message for the error overlay
    pub fn user_message(&self) -> &'static str {
        match self {
            FaultClass::Network => "Network error: unable to reach the camera stream",
            FaultClass::UnsupportedEnvironment => {
                "Live playback is not supported in this environment"
            }
            FaultClass::OtherFatal => "Playback failed",
        }
    }
}

impl std::fmt::Display for FaultClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.user_message())
    }
}

/// Reaction chosen for a decoder error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Non-fatal; log only
    Ignore,
    /// Schedule reconnection attempt `attempt` after `delay`
    Reconnect { attempt: u32, delay: Duration },
    /// Ask the decoder to recover in place
    RecoverMedia,
    /// Enter `Error`
    Fail(FaultClass),
}

/// Decide how to react to `error` given the retries already spent
pub fn classify(error: &DecoderError, retry_count: u32, config: &PlaybackConfig) -> Recovery {
    if !error.fatal {
        return Recovery::Ignore;
    }

    match error.kind {
        ErrorKind::Network if retry_count < config.max_retries => {
            let attempt = retry_count + 1;
            Recovery::Reconnect {
                attempt,
                delay: config.backoff_delay(attempt),
            }
        }
        ErrorKind::Network => Recovery::Fail(FaultClass::Network),
        ErrorKind::Media => Recovery::RecoverMedia,
        ErrorKind::Other => Recovery::Fail(FaultClass::OtherFatal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_fatal_ignored() {
        let config = PlaybackConfig::default();
        let error = DecoderError::transient(ErrorKind::Network, "fragment timeout");

        assert_eq!(classify(&error, 0, &config), Recovery::Ignore);
        assert_eq!(classify(&error, 3, &config), Recovery::Ignore);
    }

    #[test]
    fn test_network_backoff_sequence() {
        let config = PlaybackConfig::default();
        let error = DecoderError::network("manifest load error");

        let delays: Vec<Recovery> = (0..4).map(|n| classify(&error, n, &config)).collect();

        assert_eq!(
            delays,
            vec![
                Recovery::Reconnect {
                    attempt: 1,
                    delay: Duration::from_secs(2)
                },
                Recovery::Reconnect {
                    attempt: 2,
                    delay: Duration::from_secs(4)
                },
                Recovery::Reconnect {
                    attempt: 3,
                    delay: Duration::from_secs(6)
                },
                Recovery::Fail(FaultClass::Network),
            ]
        );
    }

    #[test]
    fn test_media_is_uncapped() {
        let config = PlaybackConfig::default();
        let error = DecoderError::media("buffer append error");

        assert_eq!(classify(&error, 0, &config), Recovery::RecoverMedia);
        assert_eq!(classify(&error, 99, &config), Recovery::RecoverMedia);
    }

    #[test]
    fn test_other_fails_immediately() {
        let config = PlaybackConfig::default();
        let error = DecoderError::other("codec not supported");

        assert_eq!(
            classify(&error, 0, &config),
            Recovery::Fail(FaultClass::OtherFatal)
        );
        assert!(FaultClass::OtherFatal.destroys_decoder());
        assert!(!FaultClass::Network.destroys_decoder());
    }

    #[test]
    fn test_only_exhaustion_fails_network() {
        let config = PlaybackConfig::default().max_retries(1);
        let error = DecoderError::network("connection reset");

        assert!(matches!(
            classify(&error, 0, &config),
            Recovery::Reconnect { attempt: 1, .. }
        ));
        assert_eq!(
            classify(&error, 1, &config),
            Recovery::Fail(FaultClass::Network)
        );
        assert_eq!(
            FaultClass::Network.to_string(),
            "Network error: unable to reach the camera stream"
        );
    }

    #[test]
    fn test_display() {
        let error = DecoderError::network("404 on index.m3u8");
        assert_eq!(error.to_string(), "fatal Network error: 404 on index.m3u8");
    }
}
