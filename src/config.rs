//! Runtime-tunable configuration for the frame queuer.
//!
//! Mirrors `mac::CoreConfig`/`mac_802154::Config`: a plain struct with a
//! `Default` impl. The parameters that are compile-time constants in the
//! source (frame capacity, buffer pool size) are expressed here as const
//! generics on [`crate::queuer::Interface`] rather than struct fields.

use crate::compress::Compression;

/// Configuration for the frame queuer.
#[derive(Clone, PartialEq, Debug)]
pub struct Config {
    /// Which header compression scheme to apply.
    pub compression: Compression,

    /// Datagrams at or above this many bytes are compressed; below it,
    /// the uncompressed IPv6 dispatch is used regardless of `compression`.
    pub compression_threshold: usize,

    /// Whether oversized datagrams may be fragmented across multiple
    /// frames. If `false`, a datagram that doesn't fit in one frame fails
    /// with [`crate::error::QueueError::OversizeWithoutFragSupport`].
    pub fragmentation_enabled: bool,

    /// Value stored into the max-retransmissions packet attribute handed
    /// to the link layer with every queued datagram.
    pub max_mac_transmissions: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            compression: Compression::Hc06,
            compression_threshold: 0,
            fragmentation_enabled: true,
            max_mac_transmissions: 4,
        }
    }
}

/// Compile-time check that `MTU` can be carried by a pool of `POOL_SIZE`
/// frames of `CAP` bytes each, per §6's "MTU that exceeds capacity ×
/// buffer_pool_size is a build error" rule.
///
/// Call from a `const _: () = ...;` item at the crate root with concrete
/// values to turn a misconfiguration into a compile error rather than a
/// runtime surprise.
pub const fn assert_mtu_fits(mtu: usize, cap: usize, pool_size: usize) {
    assert!(mtu <= cap * pool_size, "MTU exceeds capacity * pool size");
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_config_compresses_with_hc06() {
        let cfg = Config::default();
        assert_eq!(cfg.compression, Compression::Hc06);
        assert!(cfg.fragmentation_enabled);
    }

    #[test]
    fn mtu_fits_check_passes_for_sane_values() {
        assert_mtu_fits(1280, 127, 16);
    }
}
