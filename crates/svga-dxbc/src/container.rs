//! Bounds-checked reader for DXBC containers.
//!
//! Used to inspect what [`crate::create_dxbc`] produced and to pull the token stream back out of
//! a container. Input is treated as untrusted: every offset and size is validated against the
//! declared total size, and nothing here panics on malformed data.

use core::fmt;

use crate::checksum::{dxbc_checksum, CHECKSUM_START};
use crate::encoder::{
    BLOB_COUNT_OFFSET, BLOB_HEADER_LEN, BLOB_OFFSETS_OFFSET, CHECKSUM_OFFSET, TOTAL_SIZE_OFFSET,
    VERSION_OFFSET,
};
use crate::error::{Result, ShaderError};
use crate::signature::{parse_signature_blob, SignatureElement};
use crate::FourCC;

/// Offset table cap; real containers hold a handful of blobs.
const MAX_BLOB_COUNT: u32 = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DxbcHeader {
    pub magic: FourCC,
    pub checksum: [u8; 16],
    pub version: u32,
    pub total_size: u32,
    pub blob_count: u32,
}

/// One blob, without its 8-byte header.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct DxbcBlob<'a> {
    pub fourcc: FourCC,
    pub data: &'a [u8],
}

impl fmt::Debug for DxbcBlob<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DxbcBlob")
            .field("fourcc", &self.fourcc)
            .field("data_len", &self.data.len())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct DxbcContainer<'a> {
    bytes: &'a [u8],
    header: DxbcHeader,
    blob_offsets: &'a [u8],
}

impl<'a> DxbcContainer<'a> {
    /// Validates the header, the offset table and every blob's extent.
    ///
    /// The checksum is not verified; see [`DxbcContainer::checksum_matches`].
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < BLOB_OFFSETS_OFFSET {
            return Err(ShaderError::container(format!(
                "need at least {BLOB_OFFSETS_OFFSET} bytes for the header, got {}",
                bytes.len()
            )));
        }

        let magic = FourCC(read_array(bytes, 0)?);
        if magic != FourCC::DXBC {
            return Err(ShaderError::container(format!(
                "bad magic {magic:?}, expected {:?}",
                FourCC::DXBC
            )));
        }
        let checksum = read_array(bytes, CHECKSUM_OFFSET)?;
        let version = read_u32_le(bytes, VERSION_OFFSET)?;
        let total_size = read_u32_le(bytes, TOTAL_SIZE_OFFSET)?;
        let blob_count = read_u32_le(bytes, BLOB_COUNT_OFFSET)?;

        if blob_count > MAX_BLOB_COUNT {
            return Err(ShaderError::container(format!(
                "blob count {blob_count} exceeds maximum {MAX_BLOB_COUNT}"
            )));
        }
        let total = total_size as usize;
        if total < BLOB_OFFSETS_OFFSET {
            return Err(ShaderError::container(format!(
                "total size {total_size} is smaller than the header"
            )));
        }
        if total > bytes.len() {
            return Err(ShaderError::container(format!(
                "total size {total_size} exceeds buffer length {}",
                bytes.len()
            )));
        }
        let bytes = &bytes[..total];

        let table_end = (blob_count as usize)
            .checked_mul(4)
            .and_then(|len| BLOB_OFFSETS_OFFSET.checked_add(len))
            .filter(|&end| end <= bytes.len())
            .ok_or_else(|| {
                ShaderError::container(format!(
                    "offset table for {blob_count} blobs does not fit in {total} bytes"
                ))
            })?;
        let blob_offsets = &bytes[BLOB_OFFSETS_OFFSET..table_end];

        for (i, raw) in blob_offsets.chunks_exact(4).enumerate() {
            let offset = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
            if offset < table_end {
                return Err(ShaderError::container(format!(
                    "blob {i} offset {offset} points into the header (ends at {table_end})"
                )));
            }
            let data_start = offset
                .checked_add(BLOB_HEADER_LEN)
                .filter(|&end| end <= bytes.len())
                .ok_or_else(|| {
                    ShaderError::container(format!(
                        "blob {i} header at {offset} is outside total size {total}"
                    ))
                })?;
            let size = read_u32_le(bytes, offset + 4)? as usize;
            let data_end = data_start.checked_add(size).ok_or_else(|| {
                ShaderError::container(format!("blob {i} size {size} overflows"))
            })?;
            if data_end > bytes.len() {
                return Err(ShaderError::container(format!(
                    "blob {i} data at {data_start}..{data_end} is outside total size {total}"
                )));
            }
        }

        Ok(DxbcContainer {
            bytes,
            header: DxbcHeader {
                magic,
                checksum,
                version,
                total_size,
                blob_count,
            },
            blob_offsets,
        })
    }

    pub fn header(&self) -> &DxbcHeader {
        &self.header
    }

    /// The bytes covered by the declared total size.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Blobs in offset-table order.
    pub fn blobs(&self) -> impl Iterator<Item = DxbcBlob<'a>> + '_ {
        DxbcBlobsIter {
            bytes: self.bytes,
            blob_offsets: self.blob_offsets,
            index: 0,
        }
    }

    /// First blob tagged `fourcc`.
    pub fn find_blob(&self, fourcc: FourCC) -> Option<DxbcBlob<'a>> {
        self.blobs().find(|blob| blob.fourcc == fourcc)
    }

    /// The `SHDR` token stream, cut to the token count declared in its second token.
    pub fn shader_code(&self) -> Result<&'a [u8]> {
        let blob = self
            .find_blob(FourCC::SHDR)
            .ok_or_else(|| ShaderError::container("no SHDR blob"))?;
        let tokens = read_u32_le(blob.data, 4)? as usize;
        let len = tokens
            .checked_mul(4)
            .filter(|&len| len <= blob.data.len())
            .ok_or_else(|| {
                ShaderError::container(format!(
                    "SHDR declares {tokens} tokens but holds {} bytes",
                    blob.data.len()
                ))
            })?;
        Ok(&blob.data[..len])
    }

    /// Decodes the `ISGN` blob, if present.
    pub fn input_signature(&self) -> Option<Result<Vec<SignatureElement>>> {
        self.find_blob(FourCC::ISGN)
            .map(|blob| parse_signature_blob(blob.data))
    }

    /// Decodes the `OSGN` blob, if present.
    pub fn output_signature(&self) -> Option<Result<Vec<SignatureElement>>> {
        self.find_blob(FourCC::OSGN)
            .map(|blob| parse_signature_blob(blob.data))
    }

    /// Recomputes the checksum over everything after the stored digest.
    pub fn computed_checksum(&self) -> [u8; 16] {
        dxbc_checksum(&self.bytes[CHECKSUM_START..])
    }

    pub fn checksum_matches(&self) -> bool {
        self.computed_checksum() == self.header.checksum
    }

    /// Human-readable summary of the header and blobs.
    pub fn debug_summary(&self) -> String {
        use core::fmt::Write as _;

        let mut out = String::new();
        let _ = write!(
            &mut out,
            "{} version={} total_size={} blob_count={}",
            self.header.magic, self.header.version, self.header.total_size, self.header.blob_count
        );
        for (idx, blob) in self.blobs().enumerate() {
            let _ = write!(
                &mut out,
                "\n  [{idx:02}] {} {} bytes",
                blob.fourcc,
                blob.data.len()
            );
        }
        out
    }
}

struct DxbcBlobsIter<'a> {
    bytes: &'a [u8],
    blob_offsets: &'a [u8],
    index: usize,
}

impl<'a> Iterator for DxbcBlobsIter<'a> {
    type Item = DxbcBlob<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.index.checked_mul(4)?;
        let raw = self.blob_offsets.get(start..start.checked_add(4)?)?;
        let offset = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;

        let header_end = offset.checked_add(BLOB_HEADER_LEN)?;
        let header = self.bytes.get(offset..header_end)?;
        let fourcc = FourCC([header[0], header[1], header[2], header[3]]);
        let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;
        let data = self.bytes.get(header_end..header_end.checked_add(size)?)?;

        self.index += 1;
        Some(DxbcBlob { fourcc, data })
    }
}

fn read_array<const N: usize>(bytes: &[u8], offset: usize) -> Result<[u8; N]> {
    offset
        .checked_add(N)
        .and_then(|end| bytes.get(offset..end))
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| {
            ShaderError::container(format!(
                "need {N} bytes at offset {offset}, but length is {}",
                bytes.len()
            ))
        })
}

fn read_u32_le(bytes: &[u8], offset: usize) -> Result<u32> {
    read_array(bytes, offset).map(u32::from_le_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::build_container;

    #[test]
    fn reads_blobs_in_table_order() {
        let bytes = build_container(&[
            (FourCC::ISGN, &[0, 0, 0, 0, 8, 0, 0, 0]),
            (FourCC(*b"STAT"), &[1, 2, 3, 4]),
        ]);
        let dxbc = DxbcContainer::parse(&bytes).unwrap();
        assert_eq!(dxbc.header().blob_count, 2);
        assert_eq!(dxbc.header().version, 1);
        assert_eq!(dxbc.header().total_size as usize, bytes.len());

        let blobs: Vec<_> = dxbc.blobs().map(|blob| blob.fourcc).collect();
        assert_eq!(blobs, vec![FourCC::ISGN, FourCC(*b"STAT")]);
        assert_eq!(dxbc.find_blob(FourCC(*b"STAT")).unwrap().data, &[1, 2, 3, 4]);
        assert!(dxbc.find_blob(FourCC::SHDR).is_none());
        assert!(dxbc.shader_code().is_err());
        assert_eq!(dxbc.input_signature(), Some(Ok(Vec::new())));
        assert_eq!(dxbc.output_signature(), None);
        assert_eq!(
            dxbc.debug_summary(),
            "DXBC version=1 total_size=68 blob_count=2\n  [00] ISGN 8 bytes\n  [01] STAT 4 bytes"
        );
    }

    #[test]
    fn shader_code_is_cut_to_declared_tokens() {
        let shdr: Vec<u8> = [0x0000_0050u32, 2, 0xdead_beef]
            .iter()
            .flat_map(|t| t.to_le_bytes())
            .collect();
        let bytes = build_container(&[(FourCC::SHDR, &shdr)]);
        let dxbc = DxbcContainer::parse(&bytes).unwrap();
        assert_eq!(dxbc.shader_code().unwrap(), &shdr[..8]);

        let lying: Vec<u8> = [0x0000_0050u32, 4].iter().flat_map(|t| t.to_le_bytes()).collect();
        let bytes = build_container(&[(FourCC::SHDR, &lying)]);
        let dxbc = DxbcContainer::parse(&bytes).unwrap();
        assert!(dxbc.shader_code().unwrap_err().is_invalid_parameter());
    }

    #[test]
    fn rejects_malformed_headers() {
        let good = build_container(&[(FourCC::SHDR, &[0; 8])]);

        assert!(DxbcContainer::parse(&good[..16]).is_err());

        let mut bad_magic = good.clone();
        bad_magic[0] = b'X';
        assert!(DxbcContainer::parse(&bad_magic).is_err());

        let mut too_big = good.clone();
        too_big[TOTAL_SIZE_OFFSET..TOTAL_SIZE_OFFSET + 4]
            .copy_from_slice(&(good.len() as u32 + 4).to_le_bytes());
        assert!(DxbcContainer::parse(&too_big).is_err());

        let mut too_many = good.clone();
        too_many[BLOB_COUNT_OFFSET..BLOB_COUNT_OFFSET + 4]
            .copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(DxbcContainer::parse(&too_many).is_err());

        let mut into_header = good.clone();
        into_header[BLOB_OFFSETS_OFFSET..BLOB_OFFSETS_OFFSET + 4]
            .copy_from_slice(&8u32.to_le_bytes());
        assert!(DxbcContainer::parse(&into_header).is_err());

        let mut oversized_blob = good.clone();
        let size_at = BLOB_OFFSETS_OFFSET + 4 + 4;
        oversized_blob[size_at..size_at + 4].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(DxbcContainer::parse(&oversized_blob).is_err());
    }

    #[test]
    fn trailing_bytes_past_total_size_are_ignored() {
        let mut bytes = build_container(&[(FourCC::SHDR, &[0; 8])]);
        let len = bytes.len();
        bytes.extend_from_slice(&[0xff; 12]);
        let dxbc = DxbcContainer::parse(&bytes).unwrap();
        assert_eq!(dxbc.bytes().len(), len);
    }
}
