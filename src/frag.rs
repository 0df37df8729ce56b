//! The fragment planner (§4.3): decides whether a datagram needs more
//! than one frame and, if so, emits a FRAG1 header followed by however
//! many FRAGN headers are needed to carry the remaining payload.

use byteorder::{BigEndian, ByteOrder};
use ieee802154::mac::PanId;
#[cfg(feature = "defmt")]
use defmt::{trace, warn};
#[cfg(not(feature = "defmt"))]
use log::{trace, warn};

use crate::error::QueueError;
use crate::frame::{FrameBuf, FrameQueue};
use crate::link::{BufferPool, FrameEncoder};

/// Length, in bytes, of a FRAG1 dispatch header.
pub const FRAG1_HDR_LEN: usize = 4;
/// Length, in bytes, of a FRAGN dispatch header.
pub const FRAGN_HDR_LEN: usize = 5;

const FRAG1_DISPATCH: u16 = 0b11000;
const FRAGN_DISPATCH: u16 = 0b11100;

/// Rounds a byte count down to a multiple of 8, the fragment offset quantum.
const fn round_down_8(n: usize) -> usize {
    n & !0x7
}

fn write_frag1_header(frame: &mut [u8], at: usize, datagram_size: u16, tag: u16) {
    let word = (FRAG1_DISPATCH << 11) | (datagram_size & 0x07ff);
    BigEndian::write_u16(&mut frame[at..at + 2], word);
    BigEndian::write_u16(&mut frame[at + 2..at + 4], tag);
}

fn write_fragn_header(frame: &mut [u8], at: usize, datagram_size: u16, tag: u16, frag_offset: u8) {
    let word = (FRAGN_DISPATCH << 11) | (datagram_size & 0x07ff);
    BigEndian::write_u16(&mut frame[at..at + 2], word);
    BigEndian::write_u16(&mut frame[at + 2..at + 4], tag);
    frame[at + 4] = frag_offset;
}

/// Runs the fragment planner described in §4.3.
///
/// `first_frame` already carries the not-yet-written MAC header region
/// (its first `mac_hdrlen` bytes) followed by `compressed_len` bytes of
/// compressed (or uncompressed-dispatch) header, written by the header
/// compression step starting at `mac_hdrlen`. `payload` is the pure
/// application payload — no IPv6 or transport bytes — and `datagram_size`
/// is the uncompressed datagram size the peer will see after reassembly.
///
/// Every fragment's MAC header is written using `dest_panid`, including
/// FRAGN frames — a deliberate deviation from the source, which uses the
/// source PAN id there; see the design notes.
#[allow(clippy::too_many_arguments)]
pub fn plan_fragments<Enc, Pool, const CAP: usize, const N: usize>(
    encoder: &mut Enc,
    pool: &mut Pool,
    queue: &mut FrameQueue<CAP, N>,
    mut first_frame: FrameBuf<CAP>,
    mac_hdrlen: usize,
    compressed_len: usize,
    payload: &[u8],
    datagram_size: u16,
    tag: u16,
    dest_panid: PanId,
) -> Result<(), QueueError<Enc::Error>>
where
    Enc: FrameEncoder,
    Pool: BufferPool<CAP>,
{
    let written = encoder
        .framecreate(first_frame.as_array_mut(), dest_panid)
        .map_err(QueueError::MacHeaderWriteFailed)?;
    if written != mac_hdrlen {
        return Err(QueueError::MacHeaderMismatch {
            expected: mac_hdrlen,
            written,
        });
    }

    {
        let buf = first_frame.as_array_mut();
        buf.copy_within(
            mac_hdrlen..mac_hdrlen + compressed_len,
            mac_hdrlen + FRAG1_HDR_LEN,
        );
        write_frag1_header(buf, mac_hdrlen, datagram_size, tag);
    }

    let frame_hdrlen = mac_hdrlen + FRAG1_HDR_LEN + compressed_len;
    let paysize = round_down_8(CAP.saturating_sub(frame_hdrlen)).min(payload.len());

    {
        let buf = first_frame.as_array_mut();
        buf[frame_hdrlen..frame_hdrlen + paysize].copy_from_slice(&payload[..paysize]);
    }
    first_frame.set_len(frame_hdrlen + paysize);
    trace!("FRAG1: {} header bytes, {} payload bytes", frame_hdrlen, paysize);

    queue
        .push(first_frame)
        .map_err(|_| QueueError::TooManyFragments)?;

    let mut outlen = paysize;
    let fragn_hdrlen = mac_hdrlen + FRAGN_HDR_LEN + compressed_len;

    while outlen < payload.len() {
        let mut frame = match pool.allocate() {
            Some(frame) => frame,
            None => {
                warn!("buffer pool exhausted mid-fragmentation, dropping {} queued frame(s)", queue.len());
                queue.clear();
                return Err(QueueError::AllocationExhausted);
            }
        };

        let written = match encoder.framecreate(frame.as_array_mut(), dest_panid) {
            Ok(written) => written,
            Err(e) => {
                queue.clear();
                return Err(QueueError::MacHeaderWriteFailed(e));
            }
        };
        if written != mac_hdrlen {
            queue.clear();
            return Err(QueueError::MacHeaderMismatch {
                expected: mac_hdrlen,
                written,
            });
        }

        {
            let src_start = mac_hdrlen + FRAG1_HDR_LEN;
            let dst_start = mac_hdrlen + FRAGN_HDR_LEN;
            let src = queue.first().expect("FRAG1 already queued").as_slice();
            let buf = frame.as_array_mut();
            buf[dst_start..dst_start + compressed_len]
                .copy_from_slice(&src[src_start..src_start + compressed_len]);
            write_fragn_header(buf, mac_hdrlen, datagram_size, tag, (outlen >> 3) as u8);
        }

        let remaining = payload.len() - outlen;
        let paysize = round_down_8(CAP.saturating_sub(fragn_hdrlen)).min(remaining);
        if paysize == 0 {
            queue.clear();
            return Err(QueueError::TooManyFragments);
        }

        {
            let buf = frame.as_array_mut();
            buf[fragn_hdrlen..fragn_hdrlen + paysize]
                .copy_from_slice(&payload[outlen..outlen + paysize]);
        }
        frame.set_len(fragn_hdrlen + paysize);
        trace!("FRAGN: offset {}, {} payload bytes", outlen >> 3, paysize);

        queue.push(frame).map_err(|_| QueueError::TooManyFragments)?;
        outlen += paysize;
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::frame::FrameQueue;

    struct FixedHdrEncoder {
        hdrlen: usize,
    }

    impl FrameEncoder for FixedHdrEncoder {
        type Error = ();

        fn send_hdrlen(&self, _panid: PanId) -> Result<usize, Self::Error> {
            Ok(self.hdrlen)
        }

        fn framecreate(&mut self, frame: &mut [u8], _panid: PanId) -> Result<usize, Self::Error> {
            for b in frame[..self.hdrlen].iter_mut() {
                *b = 0xaa;
            }
            Ok(self.hdrlen)
        }
    }

    struct UnboundedPool;

    impl<const CAP: usize> BufferPool<CAP> for UnboundedPool {
        fn allocate(&mut self) -> Option<FrameBuf<CAP>> {
            Some(FrameBuf::new())
        }
    }

    fn panid() -> PanId {
        PanId(0xabcd)
    }

    #[test]
    fn splits_into_frag1_and_one_fragn() {
        const CAP: usize = 32;
        let mac_hdrlen = 4;
        let compressed_len = 3;
        let payload: [u8; 20] = core::array::from_fn(|i| i as u8);

        let mut first_frame = FrameBuf::<CAP>::new();
        first_frame.as_array_mut()[mac_hdrlen..mac_hdrlen + compressed_len]
            .copy_from_slice(&[0x41, 0x42, 0x43]);

        let mut encoder = FixedHdrEncoder { hdrlen: mac_hdrlen };
        let mut pool = UnboundedPool;
        let mut queue: FrameQueue<CAP, 4> = FrameQueue::new();

        plan_fragments(
            &mut encoder,
            &mut pool,
            &mut queue,
            first_frame,
            mac_hdrlen,
            compressed_len,
            &payload,
            (payload.len() + compressed_len) as u16,
            7,
            panid(),
        )
        .unwrap();

        assert_eq!(queue.len(), 2);

        let frag1 = queue.first().unwrap();
        // dispatch word: top 5 bits 0b11000, low 11 bits = datagram size.
        let size = (payload.len() + compressed_len) as u16;
        let want_word = ((FRAG1_DISPATCH << 11) | (size & 0x07ff)).to_be_bytes();
        assert_eq!(&frag1.as_slice()[mac_hdrlen..mac_hdrlen + 2], &want_word);
        assert_eq!(&frag1.as_slice()[mac_hdrlen + 2..mac_hdrlen + 4], &7u16.to_be_bytes());
        // compressed header shifted 4 bytes right of its pre-shift position.
        assert_eq!(
            &frag1.as_slice()[mac_hdrlen + 4..mac_hdrlen + 4 + compressed_len],
            &[0x41, 0x42, 0x43]
        );
        let frame_hdrlen = mac_hdrlen + FRAG1_HDR_LEN + compressed_len;
        let frag1_paysize = frag1.len() - frame_hdrlen;
        assert_eq!(frag1_paysize, 16); // (32 - 11) rounded down to 8
        assert_eq!(&frag1.as_slice()[frame_hdrlen..], &payload[..16]);

        let fragn = queue.iter().nth(1).unwrap();
        assert_eq!(fragn.as_slice()[mac_hdrlen + 4], 16 >> 3);
        let fragn_hdrlen = mac_hdrlen + FRAGN_HDR_LEN + compressed_len;
        assert_eq!(
            &fragn.as_slice()[mac_hdrlen + FRAGN_HDR_LEN..mac_hdrlen + FRAGN_HDR_LEN + compressed_len],
            &[0x41, 0x42, 0x43]
        );
        assert_eq!(&fragn.as_slice()[fragn_hdrlen..], &payload[16..]);
        assert_eq!(fragn.len() - fragn_hdrlen, 4); // final fragment, unaligned
    }

    #[test]
    fn mac_header_mismatch_is_reported() {
        struct WrongLenEncoder;
        impl FrameEncoder for WrongLenEncoder {
            type Error = ();
            fn send_hdrlen(&self, _panid: PanId) -> Result<usize, Self::Error> {
                Ok(4)
            }
            fn framecreate(&mut self, _frame: &mut [u8], _panid: PanId) -> Result<usize, Self::Error> {
                Ok(3)
            }
        }

        const CAP: usize = 32;
        let mut encoder = WrongLenEncoder;
        let mut pool = UnboundedPool;
        let mut queue: FrameQueue<CAP, 4> = FrameQueue::new();
        let payload = [0u8; 20];

        let err = plan_fragments(
            &mut encoder,
            &mut pool,
            &mut queue,
            FrameBuf::<CAP>::new(),
            4,
            3,
            &payload,
            23,
            1,
            panid(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            QueueError::MacHeaderMismatch {
                expected: 4,
                written: 3
            }
        );
    }

    #[test]
    fn allocation_exhaustion_mid_fragmentation_clears_queue() {
        struct OneShotPool {
            given: bool,
        }
        impl<const CAP: usize> BufferPool<CAP> for OneShotPool {
            fn allocate(&mut self) -> Option<FrameBuf<CAP>> {
                if self.given {
                    None
                } else {
                    self.given = true;
                    Some(FrameBuf::new())
                }
            }
        }

        const CAP: usize = 32;
        let mac_hdrlen = 4;
        let compressed_len = 3;
        let payload: [u8; 20] = core::array::from_fn(|i| i as u8);

        let mut encoder = FixedHdrEncoder { hdrlen: mac_hdrlen };
        let mut pool = OneShotPool { given: false };
        let mut queue: FrameQueue<CAP, 4> = FrameQueue::new();

        let err = plan_fragments(
            &mut encoder,
            &mut pool,
            &mut queue,
            FrameBuf::<CAP>::new(),
            mac_hdrlen,
            compressed_len,
            &payload,
            (payload.len() + compressed_len) as u16,
            7,
            panid(),
        )
        .unwrap_err();

        assert_eq!(err, QueueError::AllocationExhausted);
        assert!(queue.is_empty(), "FRAG1 must not be left in the queue on failure");
    }
}
