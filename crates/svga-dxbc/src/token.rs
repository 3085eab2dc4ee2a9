//! Token cursor and bitfield views over VGPU10 (SM4/SM5 tokenized program format) tokens.

use crate::error::{BytecodeErrorKind, Result, ShaderError};

// ---- Program token ----

pub const PROGRAM_MINOR_MASK: u32 = 0xf;
pub const PROGRAM_MAJOR_SHIFT: u32 = 4;
pub const PROGRAM_MAJOR_MASK: u32 = 0xf;
pub const PROGRAM_TYPE_SHIFT: u32 = 16;
pub const PROGRAM_TYPE_MASK: u32 = 0xffff;

// ---- Opcode token ----

/// Low 11 bits of an opcode token.
pub const OPCODE_TYPE_MASK: u32 = 0x7ff;
pub const OPCODE_INTERPOLATION_SHIFT: u32 = 11;
pub const OPCODE_INTERPOLATION_MASK: u32 = 0xf;
/// Instruction length in tokens, including the opcode token itself.
pub const OPCODE_LENGTH_SHIFT: u32 = 24;
pub const OPCODE_LENGTH_MASK: u32 = 0x7f;
/// Shares bits with the interpolation mode; only meaningful for `customdata`.
pub const OPCODE_CUSTOMDATA_CLASS_SHIFT: u32 = 11;
pub const OPCODE_CUSTOMDATA_CLASS_MASK: u32 = 0x1f_ffff;

/// Set on opcode and operand tokens that are followed by an extension token.
pub const EXTENDED_BIT: u32 = 0x8000_0000;

// ---- Operand token 0 ----

pub const OPERAND_NUM_COMPONENTS_MASK: u32 = 0x3;
pub const OPERAND_SELECTION_MODE_SHIFT: u32 = 2;
pub const OPERAND_SELECTION_MODE_MASK: u32 = 0x3;
pub const OPERAND_MASK_SHIFT: u32 = 4;
pub const OPERAND_MASK_MASK: u32 = 0xf;
pub const OPERAND_SWIZZLE_SHIFT: u32 = 4;
pub const OPERAND_TYPE_SHIFT: u32 = 12;
pub const OPERAND_TYPE_MASK: u32 = 0xff;
pub const OPERAND_INDEX_DIMENSION_SHIFT: u32 = 20;
pub const OPERAND_INDEX_DIMENSION_MASK: u32 = 0x3;
pub const OPERAND_INDEX0_REP_SHIFT: u32 = 22;
pub const OPERAND_INDEX1_REP_SHIFT: u32 = 25;
pub const OPERAND_INDEX2_REP_SHIFT: u32 = 28;
pub const OPERAND_INDEX_REP_MASK: u32 = 0x7;

// ---- Name token ----

pub const NAME_MASK: u32 = 0xffff;

/// Shader stage encoded in the program token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum ProgramType {
    #[default]
    Pixel = 0,
    Vertex = 1,
    Geometry = 2,
    Hull = 3,
    Domain = 4,
    Compute = 5,
}

impl ProgramType {
    pub fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => ProgramType::Pixel,
            1 => ProgramType::Vertex,
            2 => ProgramType::Geometry,
            3 => ProgramType::Hull,
            4 => ProgramType::Domain,
            5 => ProgramType::Compute,
            _ => return None,
        })
    }
}

/// First token of a program: version and stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramToken(pub u32);

impl ProgramToken {
    pub fn new(program_type: ProgramType, major: u32, minor: u32) -> Self {
        ProgramToken(
            ((program_type as u32) << PROGRAM_TYPE_SHIFT)
                | ((major & PROGRAM_MAJOR_MASK) << PROGRAM_MAJOR_SHIFT)
                | (minor & PROGRAM_MINOR_MASK),
        )
    }

    pub fn minor_version(self) -> u32 {
        self.0 & PROGRAM_MINOR_MASK
    }

    pub fn major_version(self) -> u32 {
        (self.0 >> PROGRAM_MAJOR_SHIFT) & PROGRAM_MAJOR_MASK
    }

    pub fn program_type(self) -> u32 {
        (self.0 >> PROGRAM_TYPE_SHIFT) & PROGRAM_TYPE_MASK
    }
}

/// First token of every instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeToken(pub u32);

impl OpcodeToken {
    pub fn opcode_type(self) -> u32 {
        self.0 & OPCODE_TYPE_MASK
    }

    pub fn interpolation_mode(self) -> u32 {
        (self.0 >> OPCODE_INTERPOLATION_SHIFT) & OPCODE_INTERPOLATION_MASK
    }

    pub fn instruction_length(self) -> u32 {
        (self.0 >> OPCODE_LENGTH_SHIFT) & OPCODE_LENGTH_MASK
    }

    pub fn custom_data_class(self) -> u32 {
        (self.0 >> OPCODE_CUSTOMDATA_CLASS_SHIFT) & OPCODE_CUSTOMDATA_CLASS_MASK
    }

    pub fn is_extended(self) -> bool {
        self.0 & EXTENDED_BIT != 0
    }
}

/// First token of every operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandToken(pub u32);

impl OperandToken {
    pub fn num_components(self) -> u32 {
        self.0 & OPERAND_NUM_COMPONENTS_MASK
    }

    pub fn selection_mode(self) -> u32 {
        (self.0 >> OPERAND_SELECTION_MODE_SHIFT) & OPERAND_SELECTION_MODE_MASK
    }

    /// Component mask, valid in mask selection mode.
    pub fn mask(self) -> u8 {
        ((self.0 >> OPERAND_MASK_SHIFT) & OPERAND_MASK_MASK) as u8
    }

    /// Source component for each destination lane, valid in swizzle mode.
    pub fn swizzle(self) -> [u8; 4] {
        let bits = self.0 >> OPERAND_SWIZZLE_SHIFT;
        [
            (bits & 0x3) as u8,
            ((bits >> 2) & 0x3) as u8,
            ((bits >> 4) & 0x3) as u8,
            ((bits >> 6) & 0x3) as u8,
        ]
    }

    /// The single selected component, valid in select-1 mode.
    pub fn select_1(self) -> u8 {
        ((self.0 >> OPERAND_SWIZZLE_SHIFT) & 0x3) as u8
    }

    pub fn operand_type(self) -> u32 {
        (self.0 >> OPERAND_TYPE_SHIFT) & OPERAND_TYPE_MASK
    }

    pub fn index_dimension(self) -> u32 {
        (self.0 >> OPERAND_INDEX_DIMENSION_SHIFT) & OPERAND_INDEX_DIMENSION_MASK
    }

    /// Index representation for dimension `dim` (0..=2).
    pub fn index_representation(self, dim: usize) -> u32 {
        let shift = match dim {
            0 => OPERAND_INDEX0_REP_SHIFT,
            1 => OPERAND_INDEX1_REP_SHIFT,
            _ => OPERAND_INDEX2_REP_SHIFT,
        };
        (self.0 >> shift) & OPERAND_INDEX_REP_MASK
    }

    pub fn is_extended(self) -> bool {
        self.0 & EXTENDED_BIT != 0
    }
}

/// Trailing token of the system-value declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameToken(pub u32);

impl NameToken {
    pub fn name(self) -> u32 {
        self.0 & NAME_MASK
    }
}

/// Bounds-checked cursor over a borrowed token slice.
///
/// `base` is the index of `tokens[0]` within the whole program, so error positions refer to the
/// caller's token numbering rather than the cursor's.
#[derive(Debug, Clone)]
pub struct TokenReader<'a> {
    tokens: &'a [u32],
    pos: usize,
    base: usize,
}

impl<'a> TokenReader<'a> {
    pub fn new(tokens: &'a [u32], base: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            base,
        }
    }

    pub fn remaining(&self) -> usize {
        self.tokens.len() - self.pos
    }

    /// Absolute index of the next token to be read.
    pub fn position(&self) -> usize {
        self.base + self.pos
    }

    /// Byte offset of the next token relative to `tokens[0]`.
    pub fn byte_offset(&self) -> usize {
        self.pos * 4
    }

    pub fn can_read(&self, count: usize) -> bool {
        count <= self.remaining()
    }

    /// Fails with [`BytecodeErrorKind::UnexpectedEof`] unless `count` more tokens are available.
    pub fn require(&self, count: usize) -> Result<()> {
        if self.can_read(count) {
            Ok(())
        } else {
            Err(self.eof(count))
        }
    }

    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.require(count)?;
        self.pos += count;
        Ok(())
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let value = self.tokens.get(self.pos).copied().ok_or_else(|| self.eof(1))?;
        self.pos += 1;
        Ok(value)
    }

    /// Reads two tokens, low word first.
    pub fn read_u64(&mut self) -> Result<u64> {
        self.require(2)?;
        let low = u64::from(self.read_u32()?);
        let high = u64::from(self.read_u32()?);
        Ok(low | (high << 32))
    }

    fn eof(&self, wanted: usize) -> ShaderError {
        ShaderError::bytecode(
            self.position(),
            BytecodeErrorKind::UnexpectedEof {
                wanted,
                remaining: self.remaining(),
            },
        )
    }
}

/// Reinterprets little-endian bytes as tokens. Trailing bytes that do not form a full token are
/// ignored.
pub fn tokens_from_bytes(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_tracks_position_and_bounds() {
        let toks = [1u32, 2, 3, 4];
        let mut r = TokenReader::new(&toks, 2);
        assert_eq!(r.remaining(), 4);
        assert!(r.can_read(4));
        assert!(!r.can_read(5));

        assert_eq!(r.read_u32().unwrap(), 1);
        assert_eq!(r.position(), 3);
        r.skip(2).unwrap();
        assert_eq!(r.remaining(), 1);
        assert_eq!(r.byte_offset(), 12);

        let err = r.skip(2).unwrap_err();
        assert_eq!(
            err.bytecode_kind(),
            Some(&BytecodeErrorKind::UnexpectedEof {
                wanted: 2,
                remaining: 1
            })
        );
        // A failed skip leaves the cursor untouched.
        assert_eq!(r.read_u32().unwrap(), 4);
        assert!(r.read_u32().is_err());
    }

    #[test]
    fn read_u64_combines_low_word_first() {
        let toks = [0xdead_beef, 0x0000_0001];
        let mut r = TokenReader::new(&toks, 0);
        assert_eq!(r.read_u64().unwrap(), 0x0000_0001_dead_beef);
        assert_eq!(r.remaining(), 0);

        let short = [7u32];
        let mut r = TokenReader::new(&short, 0);
        assert!(r.read_u64().is_err());
        assert_eq!(r.remaining(), 1);
    }

    #[test]
    fn decodes_operand_token_fields() {
        // v1.xy: 4 components, mask mode, INPUT, 1D immediate32 index.
        let tok = OperandToken(0x0010_1032);
        assert_eq!(tok.num_components(), 2);
        assert_eq!(tok.selection_mode(), 0);
        assert_eq!(tok.mask(), 0x3);
        assert_eq!(tok.operand_type(), 1);
        assert_eq!(tok.index_dimension(), 1);
        assert_eq!(tok.index_representation(0), 0);
        assert!(!tok.is_extended());

        // Swizzle .wzyx
        let swz = OperandToken((1 << 2) | (0b00_01_10_11 << 4));
        assert_eq!(swz.swizzle(), [3, 2, 1, 0]);
        assert_eq!(swz.select_1(), 3);
    }

    #[test]
    fn decodes_opcode_and_program_tokens() {
        let op = OpcodeToken(0x8300_0000 | (2 << 11) | 0x5f);
        assert_eq!(op.opcode_type(), 0x5f);
        assert_eq!(op.interpolation_mode(), 2);
        assert_eq!(op.instruction_length(), 3);
        assert!(op.is_extended());

        let prog = ProgramToken::new(ProgramType::Vertex, 5, 0);
        assert_eq!(prog.0, 0x0001_0050);
        assert_eq!(prog.major_version(), 5);
        assert_eq!(prog.minor_version(), 0);
        assert_eq!(ProgramType::from_raw(prog.program_type()), Some(ProgramType::Vertex));
        assert_eq!(ProgramType::from_raw(6), None);
    }

    #[test]
    fn tokens_from_bytes_is_little_endian() {
        assert_eq!(
            tokens_from_bytes(&[0x50, 0x00, 0x01, 0x00, 0x02, 0, 0, 0, 0xff]),
            vec![0x0001_0050, 2]
        );
    }
}
