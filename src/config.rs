use crate::{AbortReason, ProtocolVersion, Variant, VersionRange};

/// Version negotiation configuration for one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    version_range: VersionRange,
    downgrade_check_version: Option<ProtocolVersion>,
    renegotiation: bool,
    rng_seed: Option<u64>,
}

impl Config {
    /// Create a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            variant: Variant::Stream,
            version_range: None,
            downgrade_check_version: None,
            renegotiation: true,
            rng_seed: None,
        }
    }

    /// Versions this endpoint accepts.
    #[inline(always)]
    pub fn version_range(&self) -> VersionRange {
        self.version_range
    }

    /// Stream (TLS) or datagram (DTLS).
    #[inline(always)]
    pub fn variant(&self) -> Variant {
        self.version_range.variant()
    }

    /// Explicit capability used by a client for the downgrade sentinel check.
    #[inline(always)]
    pub fn downgrade_check_version(&self) -> Option<ProtocolVersion> {
        self.downgrade_check_version
    }

    /// The version a client checks the server random against.
    ///
    /// Range max, or the downgrade check version when it is set.
    pub fn downgrade_capability(&self) -> ProtocolVersion {
        self.downgrade_check_version
            .unwrap_or(self.version_range.max())
            .max(self.version_range.max())
    }

    /// Whether renegotiation is allowed at all on versions that support it.
    #[inline(always)]
    pub fn renegotiation(&self) -> bool {
        self.renegotiation
    }

    /// Seed for the server random, `None` for the thread rng.
    #[inline(always)]
    pub fn rng_seed(&self) -> Option<u64> {
        self.rng_seed
    }

    /// Copy of this configuration with another version range.
    ///
    /// Goes through the same validation as [`ConfigBuilder::build`].
    pub fn with_version_range(&self, version_range: VersionRange) -> Result<Config, AbortReason> {
        ConfigBuilder {
            variant: version_range.variant(),
            version_range: Some((version_range.min(), version_range.max())),
            downgrade_check_version: self.downgrade_check_version,
            renegotiation: self.renegotiation,
            rng_seed: self.rng_seed,
        }
        .build()
    }
}

/// Builder for [`Config`].
pub struct ConfigBuilder {
    variant: Variant,
    version_range: Option<(ProtocolVersion, ProtocolVersion)>,
    downgrade_check_version: Option<ProtocolVersion>,
    renegotiation: bool,
    rng_seed: Option<u64>,
}

impl ConfigBuilder {
    /// Set stream (TLS) or datagram (DTLS).
    ///
    /// Defaults to [`Variant::Stream`].
    pub fn variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    /// Set the accepted version range.
    ///
    /// Defaults to [`VersionRange::default_for`] the variant.
    pub fn version_range(mut self, min: ProtocolVersion, max: ProtocolVersion) -> Self {
        self.version_range = Some((min, max));
        self
    }

    /// Set the version a client checks for downgrade, when higher than the
    /// range max.
    ///
    /// A client that already fell back to a lower range after a failed
    /// attempt sets this to the version it originally tried, so that a server
    /// that could have done better is still caught.
    /// Defaults to unset.
    pub fn downgrade_check_version(mut self, version: ProtocolVersion) -> Self {
        self.downgrade_check_version = Some(version);
        self
    }

    /// Set whether renegotiation is allowed on versions that support it.
    ///
    /// Defaults to true.
    pub fn renegotiation(mut self, enabled: bool) -> Self {
        self.renegotiation = enabled;
        self
    }

    /// Seed the server random generator for deterministic output.
    ///
    /// Defaults to unset.
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Build the configuration.
    ///
    /// Fails with [`AbortReason::IncompatibleConfiguredRanges`] if the range
    /// doesn't validate, or if the downgrade check version is unknown to the
    /// variant or below the range max.
    pub fn build(self) -> Result<Config, AbortReason> {
        let version_range = match self.version_range {
            Some((min, max)) => VersionRange::new(self.variant, min, max)?,
            None => VersionRange::default_for(self.variant),
        };

        if let Some(check) = self.downgrade_check_version {
            if !check.is_supported_by(self.variant) || check < version_range.max() {
                debug!(
                    "Downgrade check version {} not usable with {}",
                    check, version_range
                );
                return Err(AbortReason::IncompatibleConfiguredRanges);
            }
        }

        Ok(Config {
            version_range,
            downgrade_check_version: self.downgrade_check_version,
            renegotiation: self.renegotiation,
            rng_seed: self.rng_seed,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            version_range: VersionRange::default_for(Variant::Stream),
            downgrade_check_version: None,
            renegotiation: true,
            rng_seed: None,
        }
    }
}
