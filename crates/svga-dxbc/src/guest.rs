//! Guest-supplied signature tables appended after shader bytecode.
//!
//! Some guest drivers place an `SVGA3dDXSignatureHeader` and its entries directly after the
//! token stream in the shader's backing memory. When present they replace the signatures
//! collected from the declarations; when absent the parsed ones are kept.

use bytemuck::{Pod, Zeroable};
use tracing::{debug, warn};

use crate::error::{BytecodeErrorKind, Result, ShaderError};
use crate::limits::MAX_SIGNATURE_ENTRIES;
use crate::program::{parse_shader, ShaderInfo, SignatureEntry};

/// `SVGADX_SIGNATURE_HEADER_VERSION_0`.
pub const SIGNATURE_HEADER_VERSION_0: u32 = 0x08a9_2d12;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct GuestSignatureHeader {
    pub header_version: u32,
    pub num_input_signatures: u32,
    pub num_output_signatures: u32,
    pub num_patch_constant_signatures: u32,
}

const HEADER_LEN: usize = core::mem::size_of::<GuestSignatureHeader>();
const ENTRY_LEN: usize = core::mem::size_of::<SignatureEntry>();

const _: () = assert!(HEADER_LEN == 16 && ENTRY_LEN == 20);

fn guest_error(msg: String) -> ShaderError {
    warn!(%msg, "rejected guest shader");
    ShaderError::GuestSignatures(msg)
}

impl ShaderInfo {
    /// Parses the first `size_in_bytes` bytes of `region` as bytecode and applies any signature
    /// block that follows it.
    ///
    /// `region` is all guest memory backing the shader, starting at the bytecode.
    pub fn bind_guest_shader(region: &[u8], size_in_bytes: usize) -> Result<ShaderInfo> {
        if region.len() < size_in_bytes {
            return Err(guest_error(format!(
                "shader size {size_in_bytes} exceeds backing memory of {} bytes",
                region.len()
            )));
        }
        if size_in_bytes < 8 {
            return Err(ShaderError::bytecode(
                0,
                BytecodeErrorKind::TooShort { len: size_in_bytes },
            ));
        }

        let code = &region[..size_in_bytes];
        let mut info = parse_shader(code)?;

        // Parsing succeeded, so the declared token count equals the code length.
        let trailing = &region[size_in_bytes..];
        if trailing.len() <= HEADER_LEN {
            return Ok(info);
        }
        let header: GuestSignatureHeader = bytemuck::pod_read_unaligned(&trailing[..HEADER_LEN]);
        if header.header_version != SIGNATURE_HEADER_VERSION_0 {
            debug!(
                version = header.header_version,
                "no guest signature block, keeping parsed signatures"
            );
            return Ok(info);
        }

        let counts = [
            header.num_input_signatures,
            header.num_output_signatures,
            header.num_patch_constant_signatures,
        ];
        if counts.iter().any(|&n| n as usize > MAX_SIGNATURE_ENTRIES) {
            return Err(guest_error(format!(
                "signature counts {counts:?} exceed capacity {MAX_SIGNATURE_ENTRIES}"
            )));
        }
        let total: usize = counts.iter().map(|&n| n as usize).sum();
        let entries = &trailing[HEADER_LEN..];
        if entries.len() < total * ENTRY_LEN {
            return Err(guest_error(format!(
                "{total} signature entries need {} bytes, {} available",
                total * ENTRY_LEN,
                entries.len()
            )));
        }

        let mut rows = entries
            .chunks_exact(ENTRY_LEN)
            .map(bytemuck::pod_read_unaligned::<SignatureEntry>);
        info.input_signature = rows.by_ref().take(counts[0] as usize).collect();
        info.output_signature = rows.by_ref().take(counts[1] as usize).collect();
        info.patch_constant_signature = rows.take(counts[2] as usize).collect();

        debug!(
            inputs = counts[0],
            outputs = counts[1],
            patch_constants = counts[2],
            "applied guest signatures"
        );
        Ok(info)
    }
}
