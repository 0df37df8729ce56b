//! Link-layer addressing and the two external collaborator contracts the
//! frame queuer depends on: the frame-header encoder and the buffer pool.

use ieee802154::mac::PanId;

use crate::frame::FrameBuf;

/// Width, in bytes, of a [`LinkAddr`].
pub const LINK_ADDR_LEN: usize = 8;

/// A fixed-width link-layer address.
///
/// Mirrors the source's `rimeaddr_s`: one fixed-size byte array used for
/// both short (2-byte) and extended (8-byte) 802.15.4 addresses. Short
/// addresses are carried zero-extended; this keeps every address in the
/// per-datagram scratch the same size, with no enum discriminant to
/// inspect when all the core does is copy bytes around.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct LinkAddr(pub [u8; LINK_ADDR_LEN]);

impl LinkAddr {
    /// The all-zero address substituted for a `None` (broadcast) destination.
    pub const BROADCAST: LinkAddr = LinkAddr([0u8; LINK_ADDR_LEN]);

    /// Build an address from a 16-bit short address, zero-extended.
    pub fn short(addr: u16) -> Self {
        let mut b = [0u8; LINK_ADDR_LEN];
        b[..2].copy_from_slice(&addr.to_be_bytes());
        LinkAddr(b)
    }

    /// Build an address from a 64-bit extended address.
    pub fn extended(addr: u64) -> Self {
        LinkAddr(addr.to_be_bytes())
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

impl From<Option<LinkAddr>> for LinkAddr {
    /// A `None` destination means broadcast; substitute the all-zero address.
    fn from(dest: Option<LinkAddr>) -> Self {
        dest.unwrap_or(LinkAddr::BROADCAST)
    }
}

/// External collaborator: writes the link-layer (MAC) header.
///
/// The core never interprets header contents; it only asks for a length
/// and later asks the encoder to write that many bytes at the start of a
/// frame buffer.
pub trait FrameEncoder {
    type Error;

    /// Size, in bytes, of the MAC header `framecreate` will write for
    /// `panid`. A pure query; must not mutate the encoder or any frame.
    fn send_hdrlen(&self, panid: PanId) -> Result<usize, Self::Error>;

    /// Write the MAC header into `frame[..]`, returning the number of
    /// bytes written. Must equal the value previously returned by
    /// `send_hdrlen` for the same `panid`.
    fn framecreate(&mut self, frame: &mut [u8], panid: PanId) -> Result<usize, Self::Error>;
}

/// External collaborator: supplies frame buffers from a (possibly bounded)
/// pool. Allocation may fail rather than block; the queuer surfaces that
/// as [`crate::error::QueueError::AllocationExhausted`].
pub trait BufferPool<const CAP: usize> {
    fn allocate(&mut self) -> Option<FrameBuf<CAP>>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn broadcast_is_all_zero() {
        assert_eq!(LinkAddr::BROADCAST.0, [0u8; LINK_ADDR_LEN]);
        assert!(LinkAddr::from(None).is_broadcast());
    }

    #[test]
    fn short_address_is_zero_extended() {
        let a = LinkAddr::short(0x0102);
        assert_eq!(a.0, [0x01, 0x02, 0, 0, 0, 0, 0, 0]);
    }
}
