//! Binary serialization primitives for the Neo N3 wire format.
//!
//! The protocol uses little-endian fixed-width integers, variable-length
//! integers as length prefixes, and length-prefixed byte strings. This
//! crate provides a streaming [`MemoryReader`] and [`BinaryWriter`] with
//! those conventions and the [`Serializable`] trait implemented by every
//! on-chain type.

pub mod binary_writer;
pub mod error;
pub mod memory_reader;
pub mod serializable;

pub use binary_writer::BinaryWriter;
pub use error::{IoError, IoResult};
pub use memory_reader::MemoryReader;
pub use serializable::{var_size, var_size_bytes, var_size_list, Serializable};
