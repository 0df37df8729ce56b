#![no_std]

#[cfg(test)]
extern crate std;

pub mod compress;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod frag;
pub mod frame;
pub mod ipv6;
pub mod link;
pub mod queuer;
pub mod scratch;

pub use compress::Compression;
pub use config::Config;
pub use error::QueueError;
pub use frame::{FrameBuf, FrameQueue};
pub use ipv6::Ipv6View;
pub use link::{BufferPool, FrameEncoder, LinkAddr};
pub use queuer::Interface;
