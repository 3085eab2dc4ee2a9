//! Parsing of VGPU10 shader bytecode supplied by SVGA guests, and wrapping of that bytecode in
//! a `DXBC` container a host shader compiler will accept.
//!
//! Guest drivers hand the device a bare SM4/SM5 token stream. This crate:
//!
//! - Validates the token stream structurally ([`parse_shader`], [`validate_shader`]), collecting
//!   the input and output signatures from its declarations.
//! - Applies signature tables a guest appends after the bytecode
//!   ([`ShaderInfo::bind_guest_shader`]).
//! - Encodes `ISGN`, `OSGN` and `SHDR` blobs into a checksummed container ([`create_dxbc`]).
//! - Reads containers back ([`DxbcContainer`]) for inspection and tests.
//!
//! Bytecode is untrusted: every read is bounds-checked and malformed input surfaces as a
//! [`ShaderError`], never a panic.

#![forbid(unsafe_code)]

pub mod checksum;
pub mod container;
/// Human-readable names for enumerants, used in logs.
pub mod diag;
pub mod encoder;
mod error;
mod fourcc;
pub mod guest;
/// Instruction decoding and per-opcode trailing field layout.
pub mod instruction;
pub mod limits;
pub mod opcode;
pub mod operand;
pub mod program;
pub mod semantic;
pub mod signature;
pub mod token;
pub mod writer;

/// Helpers for building synthetic token streams and containers in tests.
///
/// Only available when compiling this crate's own tests, or with the `test-utils` feature.
/// Not part of the stable API.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use crate::checksum::dxbc_checksum;
pub use crate::container::{DxbcBlob, DxbcContainer, DxbcHeader};
pub use crate::encoder::{create_dxbc, dxbc_from_bytecode};
pub use crate::error::{BytecodeErrorKind, Result, ShaderError, SignatureErrorKind};
pub use crate::fourcc::FourCC;
pub use crate::guest::{GuestSignatureHeader, SIGNATURE_HEADER_VERSION_0};
pub use crate::opcode::Opcode;
pub use crate::program::{parse_shader, validate_shader, ShaderInfo, SignatureEntry};
pub use crate::signature::{parse_signature_blob, SignatureElement};
pub use crate::token::ProgramType;
