//! Header compression selection (§4.1 step 8, §4.6).
//!
//! The frame queuer picks one of three dispatches up front: the
//! uncompressed IPv6 writer ([`crate::dispatch::write_uncompressed`]), or
//! one of the two compressors below, invoked through the uniform
//! [`Compressor`] contract. Both compressors are partial — see their own
//! doc comments — since full HC1/HC06 context-based address and
//! next-header compression is a receive-path/IPv6-stack concern the
//! PURPOSE & SCOPE note places outside this core.

pub mod hc06;
pub mod hc1;

use crate::ipv6::Ipv6View;
use crate::link::LinkAddr;
use crate::scratch::DatagramScratch;

/// Which header compression scheme the frame queuer applies.
///
/// Replaces the source's compile-time-exclusive `#ifdef` chain with a
/// tagged variant, dispatched once at the top of the queuer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Compression {
    /// Always use the uncompressed IPv6 dispatch, regardless of size.
    None,
    /// RFC 4944 HC1 compression for datagrams at or above the configured
    /// threshold.
    Hc1,
    /// RFC 6282 HC06/IPHC compression for datagrams at or above the
    /// configured threshold.
    Hc06,
}

/// Uniform contract implemented by both header-compression collaborators.
pub trait Compressor {
    /// Writes the compressed representation of `ipv6`'s header (and,
    /// where the next header isn't elided, the transport header) into
    /// `frame` starting at `scratch.frame_hdrlen`, advancing both
    /// `scratch.frame_hdrlen` and `scratch.uncomp_hdrlen`.
    fn compress<const CAP: usize>(
        &self,
        ipv6: &Ipv6View,
        dest: LinkAddr,
        frame: &mut [u8; CAP],
        scratch: &mut DatagramScratch,
    );
}
