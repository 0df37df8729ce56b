//! RFC 6282 ("HC06") IPHC header compression.

use bitflags::bitflags;
#[cfg(feature = "defmt")]
use defmt::warn;
#[cfg(not(feature = "defmt"))]
use log::warn;

use crate::ipv6::{Ipv6View, IPV6_HDR_LEN};
use crate::link::LinkAddr;
use crate::scratch::DatagramScratch;

use super::Compressor;

/// The `011` dispatch prefix occupying the top 3 bits of the first IPHC byte.
pub const DISPATCH_PREFIX: u8 = 0b0110_0000;

bitflags! {
    /// First IPHC byte, per RFC 6282 §3.1.1 (TF / NH / HLIM bits).
    pub struct Iphc0: u8 {
        /// Traffic Class and Flow Label fully elided.
        const TF_ELIDED     = 0b0001_1000;
        /// Next header carried via LOWPAN_NHC (not implemented here).
        const NH_COMPRESSED = 0b0000_0100;
    }
}

bitflags! {
    /// Second IPHC byte, per RFC 6282 §3.1.1 (context/address-mode bits).
    pub struct Iphc1: u8 {
        /// Source address fully elided, derived from the link-layer source.
        const SAM_ELIDED = 0b0011_0000;
        /// Destination address fully elided, derived from the link-layer
        /// destination.
        const DAM_ELIDED = 0b0000_0011;
    }
}

/// HC06/IPHC compressor.
///
/// Elects full elision of the traffic class and flow label and of both
/// addresses (assumed derivable from the link-layer addresses, as with
/// [`super::hc1::Hc1`]); the hop limit is carried inline rather than
/// compressed to one of the three well-known values, and the next header
/// is not LOWPAN_NHC-compressed, so (as with HC1) the transport header
/// follows verbatim. This is a deliberately partial implementation of
/// RFC 6282 — see the module-level note in [`crate::compress`].
#[derive(Copy, Clone, Debug, Default)]
pub struct Hc06;

impl Compressor for Hc06 {
    fn compress<const CAP: usize>(
        &self,
        ipv6: &Ipv6View,
        _dest: LinkAddr,
        frame: &mut [u8; CAP],
        scratch: &mut DatagramScratch,
    ) {
        let base = scratch.frame_hdrlen;

        frame[base] = DISPATCH_PREFIX | Iphc0::TF_ELIDED.bits();
        frame[base + 1] = Iphc1::SAM_ELIDED.bits() | Iphc1::DAM_ELIDED.bits();
        frame[base + 2] = ipv6.hop_limit();

        scratch.frame_hdrlen += 3;
        scratch.uncomp_hdrlen += IPV6_HDR_LEN;

        match ipv6.transport_header_len(scratch.uncomp_hdrlen) {
            Some(protosize) => {
                let src = ipv6.bytes_at(scratch.uncomp_hdrlen, protosize);
                let dst_start = scratch.frame_hdrlen;
                frame[dst_start..dst_start + protosize].copy_from_slice(src);
                scratch.frame_hdrlen += protosize;
                scratch.uncomp_hdrlen += protosize;
            }
            None => warn!("unrecognized transport proto: {}", ipv6.proto()),
        }
    }
}
