//! # secidx-wire: framed transport envelope and message codec
//!
//! Implements spec.md §4.A/§6: a length-prefixed frame
//! (`[u32 len][u8 flags][payload]`) whose flags byte carries a
//! major/minor version pair, plus a [`CodecRegistry`] that selects the
//! encoder/decoder for a frame's version and runs a registered
//! [`codec::Upgrader`] when the minor version is stale but still
//! wire-compatible.
//!
//! This crate specifies the envelope only to the extent the projector
//! core needs it to describe message contracts; it does not open
//! sockets (that is the admin RPC server shell, out of scope per
//! spec.md §1).

mod codec;
mod error;
mod frame;
pub mod message;

pub use codec::{CodecRegistry, Upgrader};
pub use error::{Error, Result};
pub use frame::{CodecFlags, Frame};
pub use message::{MessageName, VbRestartPoint};
