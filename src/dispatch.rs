//! The uncompressed IPv6 dispatch writer (§4.2): no header compression,
//! just an IPv6 dispatch byte in front of the header and transport header
//! verbatim.

#[cfg(feature = "defmt")]
use defmt::warn;
#[cfg(not(feature = "defmt"))]
use log::warn;

use crate::ipv6::{Ipv6View, IPV6_HDR_LEN};
use crate::scratch::DatagramScratch;

/// Dispatch byte identifying an uncompressed IPv6 header.
pub const DISPATCH_IPV6: u8 = 0x41;

/// Writes the dispatch byte, the 40-byte IPv6 header, and (if the proto
/// is recognized) the transport header into `frame` starting at
/// `scratch.frame_hdrlen`, advancing both `scratch.frame_hdrlen` and
/// `scratch.uncomp_hdrlen`.
///
/// An unrecognized proto is logged and otherwise ignored: the transport
/// header is not copied, but `frame_hdrlen`/`uncomp_hdrlen` still reflect
/// the IPv6 header that was written, and the datagram proceeds.
pub fn write_uncompressed<const CAP: usize>(
    ipv6: &Ipv6View,
    frame: &mut [u8; CAP],
    scratch: &mut DatagramScratch,
) {
    frame[scratch.frame_hdrlen] = DISPATCH_IPV6;
    scratch.frame_hdrlen += 1;

    let hdr_start = scratch.frame_hdrlen;
    frame[hdr_start..hdr_start + IPV6_HDR_LEN].copy_from_slice(ipv6.header());
    scratch.frame_hdrlen += IPV6_HDR_LEN;
    scratch.uncomp_hdrlen += IPV6_HDR_LEN;

    match ipv6.transport_header_len(scratch.uncomp_hdrlen) {
        Some(protosize) => {
            let src = ipv6.bytes_at(scratch.uncomp_hdrlen, protosize);
            let dst_start = scratch.frame_hdrlen;
            frame[dst_start..dst_start + protosize].copy_from_slice(src);
            scratch.frame_hdrlen += protosize;
            scratch.uncomp_hdrlen += protosize;
        }
        None => {
            warn!("unrecognized transport proto: {}", ipv6.proto());
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn writes_dispatch_header_and_udp() {
        let mut datagram = [0u8; 48];
        datagram[6] = crate::ipv6::Proto::UDP;
        for (i, b) in datagram.iter_mut().enumerate() {
            *b = i as u8;
        }
        datagram[6] = crate::ipv6::Proto::UDP;

        let ipv6 = Ipv6View::new(&datagram);
        let mut frame = [0u8; 127];
        let mut scratch = DatagramScratch::new();
        scratch.frame_hdrlen = 11; // pretend a MAC header already reserved this much

        write_uncompressed(&ipv6, &mut frame, &mut scratch);

        assert_eq!(scratch.frame_hdrlen, 11 + 1 + 40 + 8);
        assert_eq!(scratch.uncomp_hdrlen, 48);
        assert_eq!(frame[11], DISPATCH_IPV6);
        assert_eq!(&frame[12..52], &datagram[0..40]);
        assert_eq!(&frame[52..60], &datagram[40..48]);
    }

    #[test]
    fn unknown_proto_skips_transport_copy() {
        let mut datagram = [0u8; 40];
        datagram[6] = 99;

        let ipv6 = Ipv6View::new(&datagram);
        let mut frame = [0u8; 127];
        let mut scratch = DatagramScratch::new();

        write_uncompressed(&ipv6, &mut frame, &mut scratch);

        assert_eq!(scratch.frame_hdrlen, 1 + 40);
        assert_eq!(scratch.uncomp_hdrlen, 40);
    }
}
