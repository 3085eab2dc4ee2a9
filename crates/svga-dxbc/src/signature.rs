//! Decoding of `ISGN`/`OSGN` blob bodies back into elements.

use crate::encoder::{SIGNATURE_ELEMENT_LEN, SIGNATURE_HEADER_LEN};
use crate::error::{Result, ShaderError};

/// One decoded signature element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureElement {
    pub semantic_name: String,
    pub semantic_index: u32,
    /// System-value enumerant.
    pub system_value: u32,
    pub component_type: u32,
    pub register: u32,
    pub mask: u8,
    /// Read/write mask; always 0 in output signatures built by this crate.
    pub read_write_mask: u8,
}

/// Parses a signature blob body (the data after the blob's FourCC and size).
///
/// Only the 24-byte element layout is understood.
pub fn parse_signature_blob(bytes: &[u8]) -> Result<Vec<SignatureElement>> {
    let count = read_u32_le(bytes, 0, "element count")?;
    let first = read_u32_le(bytes, 4, "element offset")? as usize;

    if count == 0 {
        return Ok(Vec::new());
    }
    if first < SIGNATURE_HEADER_LEN || first % 4 != 0 {
        return Err(ShaderError::container(format!(
            "element offset {first} is inside the signature header or unaligned"
        )));
    }
    let table_end = (count as usize)
        .checked_mul(SIGNATURE_ELEMENT_LEN)
        .and_then(|len| first.checked_add(len))
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| {
            ShaderError::container(format!(
                "{count} elements at offset {first} do not fit in {} bytes",
                bytes.len()
            ))
        })?;

    let mut elements = Vec::new();
    elements
        .try_reserve_exact(count as usize)
        .map_err(|_| ShaderError::container(format!("cannot allocate {count} elements")))?;

    for at in (first..table_end).step_by(SIGNATURE_ELEMENT_LEN) {
        let name_offset = read_u32_le(bytes, at, "name offset")? as usize;
        if name_offset < SIGNATURE_HEADER_LEN || (first..table_end).contains(&name_offset) {
            return Err(ShaderError::container(format!(
                "name offset {name_offset} points into the signature header or element table"
            )));
        }
        elements.push(SignatureElement {
            semantic_name: read_cstring(bytes, name_offset)?.to_owned(),
            semantic_index: read_u32_le(bytes, at + 4, "semantic index")?,
            system_value: read_u32_le(bytes, at + 8, "system value")?,
            component_type: read_u32_le(bytes, at + 12, "component type")?,
            register: read_u32_le(bytes, at + 16, "register")?,
            mask: bytes[at + 20],
            read_write_mask: bytes[at + 21],
        });
    }
    Ok(elements)
}

fn read_u32_le(bytes: &[u8], offset: usize, what: &str) -> Result<u32> {
    offset
        .checked_add(4)
        .and_then(|end| bytes.get(offset..end))
        .map(|s| u32::from_le_bytes([s[0], s[1], s[2], s[3]]))
        .ok_or_else(|| {
            ShaderError::container(format!(
                "need 4 bytes for {what} at {offset}, but signature length is {}",
                bytes.len()
            ))
        })
}

fn read_cstring(bytes: &[u8], offset: usize) -> Result<&str> {
    let tail = bytes.get(offset..).ok_or_else(|| {
        ShaderError::container(format!(
            "name offset {offset} is outside signature length {}",
            bytes.len()
        ))
    })?;
    let nul = tail
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| ShaderError::container(format!("name at {offset} is not terminated")))?;
    core::str::from_utf8(&tail[..nul])
        .map_err(|_| ShaderError::container(format!("name at {offset} is not valid UTF-8")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(name_offset: u32, semantic_index: u32, system_value: u32, register: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&name_offset.to_le_bytes());
        out.extend_from_slice(&semantic_index.to_le_bytes());
        out.extend_from_slice(&system_value.to_le_bytes());
        out.extend_from_slice(&3u32.to_le_bytes()); // float32
        out.extend_from_slice(&register.to_le_bytes());
        out.extend_from_slice(&[0xf, 0x3, 0, 0]);
        out
    }

    #[test]
    fn parses_elements_and_shared_names() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&8u32.to_le_bytes());
        bytes.extend(element(56, 0, 0, 0));
        bytes.extend(element(56, 1, 0, 1));
        bytes.extend_from_slice(b"TEXCOORD\0\0\0\0");

        let elements = parse_signature_blob(&bytes).unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(
            elements[1],
            SignatureElement {
                semantic_name: "TEXCOORD".into(),
                semantic_index: 1,
                system_value: 0,
                component_type: 3,
                register: 1,
                mask: 0xf,
                read_write_mask: 0x3,
            }
        );
    }

    #[test]
    fn rejects_out_of_bounds_tables_and_names() {
        // Header only.
        assert!(parse_signature_blob(&[1, 0, 0, 0]).is_err());

        // Element table extends past the end.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&8u32.to_le_bytes());
        bytes.extend(element(32, 0, 0, 0));
        assert!(parse_signature_blob(&bytes).is_err());

        // Name offset inside the element table.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&8u32.to_le_bytes());
        bytes.extend(element(8, 0, 0, 0));
        bytes.extend_from_slice(b"A\0\0\0");
        assert!(parse_signature_blob(&bytes).is_err());

        // Unterminated name.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&8u32.to_le_bytes());
        bytes.extend(element(32, 0, 0, 0));
        bytes.extend_from_slice(b"ABCD");
        assert!(parse_signature_blob(&bytes).is_err());
    }
}
