use core::fmt;

/// A four-character code identifying a DXBC container or one of its blobs.
///
/// Stored in file byte order, so `FourCC(*b"SHDR")` matches the bytes `S H D R` on disk.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Container magic.
    pub const DXBC: FourCC = FourCC(*b"DXBC");
    /// Input signature blob.
    pub const ISGN: FourCC = FourCC(*b"ISGN");
    /// Output signature blob.
    pub const OSGN: FourCC = FourCC(*b"OSGN");
    /// Shader token stream blob.
    pub const SHDR: FourCC = FourCC(*b"SHDR");

    /// The code as the little-endian `u32` it occupies in a header.
    pub const fn to_u32_le(self) -> u32 {
        u32::from_le_bytes(self.0)
    }

    pub const fn from_u32_le(value: u32) -> Self {
        FourCC(value.to_le_bytes())
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC(\"{self}\")")
    }
}
