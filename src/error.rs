use thiserror::Error;

/// Why a negotiation was refused.
///
/// This is a closed set. Every variant has exactly one local error code and
/// at most one alert, see [`classify`][crate::classify].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum AbortReason {
    /// No version acceptable to both ends, or an unknown version on the wire.
    #[error("Unsupported protocol version")]
    UnsupportedVersion,

    /// The server random carries a downgrade sentinel the client could have avoided.
    #[error("Downgrade detected in server random")]
    DowngradeDetected,

    /// Renegotiation refused by the active protocol revision or connection state.
    #[error("Renegotiation not allowed")]
    RenegotiationNotAllowed,

    /// A version field does not hold the value its position requires.
    #[error("Malformed version field")]
    MalformedVersionField,

    /// The configured version range is not allowed.
    #[error("Incompatible configured version range")]
    IncompatibleConfiguredRanges,
}

impl AbortReason {
    /// Every reason, for exhaustive checks.
    pub const fn all() -> &'static [AbortReason; 5] {
        &[
            AbortReason::UnsupportedVersion,
            AbortReason::DowngradeDetected,
            AbortReason::RenegotiationNotAllowed,
            AbortReason::MalformedVersionField,
            AbortReason::IncompatibleConfiguredRanges,
        ]
    }

    /// Configuration errors happen before any network activity. The caller
    /// may reconfigure and retry.
    pub fn is_configuration(&self) -> bool {
        matches!(self, AbortReason::IncompatibleConfiguredRanges)
    }
}
