//! The frame queuer (§4.1): the single entry point that turns one outbound
//! IPv6 datagram into an ordered [`FrameQueue`] ready for a link driver.

use ieee802154::mac::PanId;
#[cfg(feature = "defmt")]
use defmt::{debug, trace, warn};
#[cfg(not(feature = "defmt"))]
use log::{debug, trace, warn};

use crate::compress::{hc06::Hc06, hc1::Hc1, Compression, Compressor};
use crate::config::Config;
use crate::dispatch;
use crate::error::QueueError;
use crate::frag;
use crate::frame::FrameQueue;
use crate::ipv6::{Ipv6View, Proto, TCP_ACK, TCP_CTL, TCP_FIN};
use crate::link::{BufferPool, FrameEncoder, LinkAddr};
use crate::scratch::{DatagramScratch, PacketAddr, PacketAttr, PacketType};

/// Per-interface state the frame queuer owns across calls: its own link
/// address and PAN id, the datagram tag counter, configuration, and the
/// frame-header encoder collaborator.
pub struct Interface<Enc> {
    pub config: Config,
    own_addr: LinkAddr,
    own_panid: PanId,
    tag: u16,
    encoder: Enc,
}

impl<Enc> Interface<Enc>
where
    Enc: FrameEncoder,
{
    pub fn new(config: Config, own_addr: LinkAddr, own_panid: PanId, encoder: Enc) -> Self {
        Self {
            config,
            own_addr,
            own_panid,
            tag: 0,
            encoder,
        }
    }

    /// Current datagram tag. Exposed for tests; incremented once per
    /// fragmented datagram by [`Self::queue_frames`].
    pub fn tag(&self) -> u16 {
        self.tag
    }

    /// Assembles `ipv6_and_transport` (40-byte IPv6 header immediately
    /// followed by the transport header) plus `payload` (pure application
    /// bytes, no header bytes) into one or more frames addressed to
    /// `dest`, or broadcast if `dest` is `None`.
    pub fn queue_frames<Pool, const CAP: usize, const N: usize>(
        &mut self,
        pool: &mut Pool,
        ipv6_and_transport: &[u8],
        payload: &[u8],
        dest: Option<LinkAddr>,
    ) -> Result<FrameQueue<CAP, N>, QueueError<Enc::Error>>
    where
        Pool: BufferPool<CAP>,
    {
        trace!("queuing frame(s) for {} byte payload, tag {}", payload.len(), self.tag);

        let mut scratch = DatagramScratch::new();
        scratch.set_attr(PacketAttr::MaxMacTransmissions, self.config.max_mac_transmissions);

        let ipv6 = Ipv6View::new(ipv6_and_transport);
        classify_tcp_stream(&ipv6, &mut scratch);

        let dest_link = LinkAddr::from(dest);
        scratch.set_addr(PacketAddr::Sender, self.own_addr);
        scratch.set_addr(PacketAddr::Receiver, dest_link);

        let mut first_frame = match pool.allocate() {
            Some(frame) => frame,
            None => {
                warn!("buffer pool exhausted allocating the first frame");
                return Err(QueueError::AllocationExhausted);
            }
        };

        // Assume the destination shares our PAN unless told otherwise; the
        // source makes the same assumption.
        let dest_panid = self.own_panid;

        let mac_hdrlen = self
            .encoder
            .send_hdrlen(dest_panid)
            .map_err(QueueError::MacHeaderQueryFailed)?;
        scratch.frame_hdrlen = mac_hdrlen;

        if self.config.compression != Compression::None && payload.len() >= self.config.compression_threshold {
            match self.config.compression {
                Compression::Hc1 => Hc1.compress(&ipv6, dest_link, first_frame.as_array_mut(), &mut scratch),
                Compression::Hc06 => Hc06.compress(&ipv6, dest_link, first_frame.as_array_mut(), &mut scratch),
                Compression::None => unreachable!(),
            }
        } else {
            dispatch::write_uncompressed(&ipv6, first_frame.as_array_mut(), &mut scratch);
        }

        let compressed_len = scratch.frame_hdrlen - mac_hdrlen;
        let available = CAP.saturating_sub(scratch.frame_hdrlen);

        let mut queue: FrameQueue<CAP, N> = FrameQueue::new();

        if payload.len() > available {
            if !self.config.fragmentation_enabled {
                return Err(QueueError::OversizeWithoutFragSupport {
                    buflen: payload.len(),
                    available,
                });
            }

            let datagram_size = (payload.len() + scratch.uncomp_hdrlen) as u16;
            debug!(
                "fragmenting {} byte datagram ({} of payload, tag {})",
                datagram_size,
                payload.len(),
                self.tag
            );

            frag::plan_fragments(
                &mut self.encoder,
                pool,
                &mut queue,
                first_frame,
                mac_hdrlen,
                compressed_len,
                payload,
                datagram_size,
                self.tag,
                dest_panid,
            )?;

            self.tag = self.tag.wrapping_add(1);
        } else {
            let written = self
                .encoder
                .framecreate(first_frame.as_array_mut(), dest_panid)
                .map_err(QueueError::MacHeaderWriteFailed)?;
            if written != mac_hdrlen {
                return Err(QueueError::MacHeaderMismatch {
                    expected: mac_hdrlen,
                    written,
                });
            }

            let frame_hdrlen = scratch.frame_hdrlen;
            first_frame.as_array_mut()[frame_hdrlen..frame_hdrlen + payload.len()]
                .copy_from_slice(payload);
            first_frame.set_len(frame_hdrlen + payload.len());

            trace!("single frame, {} bytes", first_frame.len());
            queue.push(first_frame).map_err(|_| QueueError::TooManyFragments)?;
        }

        Ok(queue)
    }
}

/// Sets the TCP stream packet-type hint (§4.1 step 2): FIN present means
/// the stream is ending; otherwise any segment whose masked control flags
/// are anything other than a pure ACK (plain data, SYN, RST, no flags at
/// all, ...) is an ordinary stream segment. A pure ACK carries no data and
/// is left at the default `PacketType::None`.
fn classify_tcp_stream(ipv6: &Ipv6View, scratch: &mut DatagramScratch) {
    if ipv6.proto() != Proto::Tcp {
        return;
    }
    let Some(flags) = ipv6.tcp_flags() else {
        return;
    };

    let packet_type = if flags & TCP_FIN != 0 {
        PacketType::StreamEnd
    } else if flags & TCP_CTL != TCP_ACK {
        PacketType::Stream
    } else {
        PacketType::None
    };

    scratch.set_attr(PacketAttr::PacketType, packet_type as u16);
}
