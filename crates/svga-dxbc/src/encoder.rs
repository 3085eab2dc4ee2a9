//! DXBC container encoding: `ISGN`, `OSGN` and `SHDR` blobs behind a checksummed header.

use tracing::{debug, trace};

use crate::checksum::{dxbc_checksum, CHECKSUM_START};
use crate::error::{Result, ShaderError, SignatureErrorKind};
use crate::limits::{MAX_SIGNATURE_ENTRIES, SEMANTIC_NAME_COUNT};
use crate::program::{parse_shader, ShaderInfo, SignatureEntry};
use crate::semantic::{semantic_info, SemanticInfo};
use crate::token::ProgramType;
use crate::writer::ByteWriter;
use crate::FourCC;

/// Extra writer capacity beyond the shader size, enough for both signature blobs.
const INITIAL_SLACK: usize = 4096;

pub const CONTAINER_VERSION: u32 = 1;
pub const BLOB_COUNT: usize = 3;

pub(crate) const CHECKSUM_OFFSET: usize = 0x04;
pub(crate) const VERSION_OFFSET: usize = 0x14;
pub(crate) const TOTAL_SIZE_OFFSET: usize = 0x18;
pub(crate) const BLOB_COUNT_OFFSET: usize = 0x1c;
pub(crate) const BLOB_OFFSETS_OFFSET: usize = 0x20;
/// Header including the blob offset table.
pub const CONTAINER_HEADER_LEN: usize = BLOB_OFFSETS_OFFSET + 4 * BLOB_COUNT;

pub const BLOB_HEADER_LEN: usize = 8;
pub const SIGNATURE_HEADER_LEN: usize = 8;
pub const SIGNATURE_ELEMENT_LEN: usize = 24;

const _: () = assert!(CHECKSUM_START == VERSION_OFFSET && VERSION_OFFSET == CHECKSUM_OFFSET + 16);

fn align4(value: usize) -> usize {
    (value + 3) & !3
}

fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| ShaderError::Internal("container size exceeds u32"))
}

/// Wraps `code` and the signatures in `info` into a DXBC container.
///
/// Signature elements are emitted in ascending register order. `code` is copied verbatim into
/// the `SHDR` blob; it is not re-validated here.
pub fn create_dxbc(info: &ShaderInfo, code: &[u8]) -> Result<Vec<u8>> {
    let mut w = ByteWriter::with_capacity(INITIAL_SLACK.saturating_add(code.len()))?;

    w.can_write(CONTAINER_HEADER_LEN)?;
    let header = &mut w.uncommitted_mut()[..CONTAINER_HEADER_LEN];
    header.fill(0);
    header[..4].copy_from_slice(&FourCC::DXBC.0);
    put_u32(header, VERSION_OFFSET, CONTAINER_VERSION);
    put_u32(header, BLOB_COUNT_OFFSET, BLOB_COUNT as u32);
    w.commit(CONTAINER_HEADER_LEN);

    let mut offsets = [0u32; BLOB_COUNT];
    offsets[0] = to_u32(w.size())?;
    write_signature_blob(&mut w, info.program_type, FourCC::ISGN, &info.input_signature)?;
    offsets[1] = to_u32(w.size())?;
    write_signature_blob(&mut w, info.program_type, FourCC::OSGN, &info.output_signature)?;
    offsets[2] = to_u32(w.size())?;
    write_code_blob(&mut w, code)?;

    let total = to_u32(w.size())?;
    let bytes = w.committed_mut();
    put_u32(bytes, TOTAL_SIZE_OFFSET, total);
    for (i, offset) in offsets.iter().enumerate() {
        put_u32(bytes, BLOB_OFFSETS_OFFSET + 4 * i, *offset);
    }
    let digest = dxbc_checksum(&bytes[CHECKSUM_START..]);
    bytes[CHECKSUM_OFFSET..CHECKSUM_START].copy_from_slice(&digest);

    debug!(
        total,
        inputs = info.input_signature.len(),
        outputs = info.output_signature.len(),
        code_len = code.len(),
        "built DXBC container"
    );
    Ok(w.fetch())
}

/// Parses `code` and wraps it into a container in one step.
pub fn dxbc_from_bytecode(code: &[u8]) -> Result<Vec<u8>> {
    let info = parse_shader(code)?;
    create_dxbc(&info, code)
}

/// Writes one `ISGN`/`OSGN` blob: the 8-byte header, one 24-byte element per entry in
/// register order, then the NUL-terminated semantic names.
///
/// The name table starts directly after the element array, at `8 + 24 * n`. Encoders
/// that reserve a second `24 * n` bytes of zeroes before the names place them at
/// `8 + 48 * n` instead, so their blobs differ from these byte-for-byte even though
/// every name offset decodes to the same element.
fn write_signature_blob(
    w: &mut ByteWriter,
    program_type: ProgramType,
    blob: FourCC,
    entries: &[SignatureEntry],
) -> Result<()> {
    if entries.len() > MAX_SIGNATURE_ENTRIES {
        return Err(ShaderError::signature(
            blob,
            SignatureErrorKind::TooManyEntries {
                count: entries.len(),
                max: MAX_SIGNATURE_ENTRIES,
            },
        ));
    }

    // Register -> entry index.
    let mut by_register = [None::<usize>; MAX_SIGNATURE_ENTRIES];
    for (i, entry) in entries.iter().enumerate() {
        let register = entry.register_index;
        let slot = by_register.get_mut(register as usize).ok_or_else(|| {
            ShaderError::signature(
                blob,
                SignatureErrorKind::RegisterOutOfRange {
                    register,
                    max: MAX_SIGNATURE_ENTRIES,
                },
            )
        })?;
        if slot.is_some() {
            return Err(ShaderError::signature(
                blob,
                SignatureErrorKind::DuplicateRegister { register },
            ));
        }
        *slot = Some(i);
    }

    let mut elements: Vec<(&SignatureEntry, SemanticInfo)> = Vec::with_capacity(entries.len());
    for entry in by_register.iter().flatten().map(|&i| &entries[i]) {
        if entry.semantic_name >= SEMANTIC_NAME_COUNT {
            return Err(ShaderError::signature(
                blob,
                SignatureErrorKind::SemanticOutOfRange {
                    semantic: entry.semantic_name,
                },
            ));
        }
        elements.push((entry, semantic_info(program_type, entry.semantic_name, blob)));
    }

    let names_start = SIGNATURE_HEADER_LEN + SIGNATURE_ELEMENT_LEN * elements.len();
    let names_len: usize = elements.iter().map(|(_, info)| info.name.len() + 1).sum();
    let body_len = align4(names_start + names_len);

    w.can_write(BLOB_HEADER_LEN + body_len)?;
    let out = &mut w.uncommitted_mut()[..BLOB_HEADER_LEN + body_len];
    out.fill(0);
    out[..4].copy_from_slice(&blob.0);
    put_u32(out, 4, to_u32(body_len)?);

    let body = &mut out[BLOB_HEADER_LEN..];
    put_u32(body, 0, elements.len() as u32);
    put_u32(body, 4, SIGNATURE_HEADER_LEN as u32);

    let mut semantic_index = [0u32; SEMANTIC_NAME_COUNT as usize];
    let mut name_offset = names_start;
    for (i, (entry, info)) in elements.iter().enumerate() {
        let at = SIGNATURE_HEADER_LEN + i * SIGNATURE_ELEMENT_LEN;
        let element = &mut body[at..at + SIGNATURE_ELEMENT_LEN];

        let index = &mut semantic_index[entry.semantic_name as usize];
        let component_type = if entry.component_type != 0 {
            entry.component_type
        } else {
            info.component_type
        };
        let mask = entry.mask as u8;

        put_u32(element, 0, name_offset as u32);
        put_u32(element, 4, *index);
        put_u32(element, 8, entry.semantic_name);
        put_u32(element, 12, component_type);
        put_u32(element, 16, entry.register_index);
        element[20] = mask;
        element[21] = if blob == FourCC::OSGN { 0 } else { mask };

        trace!(
            %blob,
            name = info.name,
            semantic_index = *index,
            register = entry.register_index,
            mask,
            component_type,
            "signature element"
        );
        *index += 1;

        let name = info.name.as_bytes();
        body[name_offset..name_offset + name.len()].copy_from_slice(name);
        name_offset += name.len() + 1;
    }

    w.commit(BLOB_HEADER_LEN + body_len);
    Ok(())
}

fn write_code_blob(w: &mut ByteWriter, code: &[u8]) -> Result<()> {
    let body_len = align4(code.len());
    w.can_write(BLOB_HEADER_LEN + body_len)?;

    let out = &mut w.uncommitted_mut()[..BLOB_HEADER_LEN + body_len];
    out.fill(0);
    out[..4].copy_from_slice(&FourCC::SHDR.0);
    put_u32(out, 4, to_u32(body_len)?);
    out[BLOB_HEADER_LEN..BLOB_HEADER_LEN + code.len()].copy_from_slice(code);

    w.commit(BLOB_HEADER_LEN + body_len);
    Ok(())
}
