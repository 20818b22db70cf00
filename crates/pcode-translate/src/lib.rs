//! Translation of machine code to **p-code**, the processor independent intermediate
//! representation of [Ghidra](https://github.com/NationalSecurityAgency/ghidra) Sleigh.
//!
//! The decoding itself is performed by an engine implementing the [pcode_sys::api] traits. This
//! crate copies the engine output into an owned model scoped to a [Session]:
//!
//! * Address spaces are interned, so every reference to an engine address space within a session
//!   is the same [AddrSpace].
//! * Instructions with delay slots are returned with their delay slot instructions attached.
//! * Decode failures are classified into [SleighError] values.
//!
//! Operations can be rendered in a readable form using [PcodePrettyPrinter].

mod error;
mod format;
mod location;
mod opcodes;
mod pcode;
mod session;
mod space;
mod translation;

pub use error::*;
pub use format::*;
pub use location::*;
pub use opcodes::*;
pub use pcode::*;
pub use session::*;
pub use space::{AddrSpace, AddressSpaceType, Endianness};
pub use translation::*;

#[cfg(test)]
mod tests;
