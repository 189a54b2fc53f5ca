use std::fmt;

use crate::{AbortReason, ProtocolVersion, Variant};

/// Inclusive range of acceptable protocol versions for one endpoint.
///
/// The only way to get one is through [`VersionRange::new`] (or the
/// constructors delegating to it), so every value is valid:
///
/// * `min <= max`
/// * both ends are versions the variant knows
/// * SSL 3.0 and TLS 1.3 are never both inside. TLS 1.3 forbids records with a
///   version below `{3, 1}`, so a range covering both can't be honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionRange {
    variant: Variant,
    min: ProtocolVersion,
    max: ProtocolVersion,
}

impl VersionRange {
    pub fn new(
        variant: Variant,
        min: ProtocolVersion,
        max: ProtocolVersion,
    ) -> Result<Self, AbortReason> {
        if !min.is_supported_by(variant) || !max.is_supported_by(variant) {
            debug!("Range {}-{} not valid for {:?}", min, max, variant);
            return Err(AbortReason::IncompatibleConfiguredRanges);
        }

        if min > max {
            debug!("Range min {} above max {}", min, max);
            return Err(AbortReason::IncompatibleConfiguredRanges);
        }

        if min <= ProtocolVersion::SSL3_0 && max >= ProtocolVersion::TLS1_3 {
            debug!("Range {}-{} mixes SSL 3.0 and TLS 1.3", min, max);
            return Err(AbortReason::IncompatibleConfiguredRanges);
        }

        Ok(VersionRange { variant, min, max })
    }

    /// A range of one version, forcing exact negotiation.
    pub fn exact(variant: Variant, version: ProtocolVersion) -> Result<Self, AbortReason> {
        Self::new(variant, version, version)
    }

    /// Default range for a variant.
    ///
    /// TLS 1.0 to TLS 1.3 for streams, DTLS 1.2 to DTLS 1.3 for datagrams.
    pub fn default_for(variant: Variant) -> Self {
        let (min, max) = match variant {
            Variant::Stream => (ProtocolVersion::TLS1_0, ProtocolVersion::TLS1_3),
            Variant::Datagram => (ProtocolVersion::DTLS1_2, ProtocolVersion::DTLS1_3),
        };
        VersionRange { variant, min, max }
    }

    #[inline(always)]
    pub fn variant(&self) -> Variant {
        self.variant
    }

    #[inline(always)]
    pub fn min(&self) -> ProtocolVersion {
        self.min
    }

    #[inline(always)]
    pub fn max(&self) -> ProtocolVersion {
        self.max
    }

    pub fn contains(&self, version: ProtocolVersion) -> bool {
        self.min <= version && version <= self.max
    }

    /// Overlap of two ranges, `None` when disjoint or of different variants.
    pub fn intersect(&self, other: &VersionRange) -> Option<VersionRange> {
        if self.variant != other.variant {
            return None;
        }
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        // Both inputs passed validation so the overlap does too.
        (min <= max).then_some(VersionRange {
            variant: self.variant,
            min,
            max,
        })
    }

    /// Versions inside the range, newest first.
    pub fn versions(&self) -> impl Iterator<Item = ProtocolVersion> + '_ {
        let all: &'static [ProtocolVersion] = match self.variant {
            Variant::Stream => ProtocolVersion::stream(),
            Variant::Datagram => ProtocolVersion::datagram(),
        };
        all.iter().rev().copied().filter(move |v| self.contains(*v))
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}]",
            self.min.name(self.variant),
            self.max.name(self.variant)
        )
    }
}
