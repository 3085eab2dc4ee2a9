//! Builders for token streams and containers used by unit, integration and fuzz tests.

use crate::opcode::Opcode;
use crate::operand::OperandType;
use crate::token::{
    ProgramToken, ProgramType, OPCODE_INTERPOLATION_SHIFT, OPCODE_LENGTH_SHIFT,
    OPERAND_INDEX_DIMENSION_SHIFT, OPERAND_MASK_SHIFT, OPERAND_TYPE_SHIFT,
};
use crate::FourCC;

/// `D3D10_SB_INTERPOLATION_LINEAR`.
const INTERPOLATION_LINEAR: u32 = 2;

/// An opcode token declaring `len` tokens including itself.
pub fn opcode_token(opcode: Opcode, len: u32) -> u32 {
    opcode.raw() | (len << OPCODE_LENGTH_SHIFT)
}

/// A 4-component, mask-selected, one-dimensional operand with an immediate index.
///
/// The caller appends the index token.
pub fn register_operand(ty: OperandType, mask: u8) -> u32 {
    2 | (u32::from(mask) << OPERAND_MASK_SHIFT)
        | ((ty as u32) << OPERAND_TYPE_SHIFT)
        | (1 << OPERAND_INDEX_DIMENSION_SHIFT)
}

pub fn tokens_to_bytes(tokens: &[u32]) -> Vec<u8> {
    tokens.iter().flat_map(|t| t.to_le_bytes()).collect()
}

/// Assembles a program token stream, filling in the length token on [`ProgramBuilder::build`].
#[derive(Debug, Clone)]
pub struct ProgramBuilder {
    version: u32,
    body: Vec<u32>,
}

impl ProgramBuilder {
    /// A shader model 5.0 program of the given stage.
    pub fn new(program_type: ProgramType) -> Self {
        Self::with_version(program_type, 5, 0)
    }

    pub fn with_version(program_type: ProgramType, major: u32, minor: u32) -> Self {
        ProgramBuilder {
            version: ProgramToken::new(program_type, major, minor).0,
            body: Vec::new(),
        }
    }

    /// Appends an instruction whose length is `1 + payload.len()`.
    pub fn instruction(&mut self, opcode: Opcode, payload: &[u32]) -> &mut Self {
        self.body.push(opcode_token(opcode, 1 + payload.len() as u32));
        self.body.extend_from_slice(payload);
        self
    }

    /// Appends tokens verbatim.
    pub fn raw(&mut self, tokens: &[u32]) -> &mut Self {
        self.body.extend_from_slice(tokens);
        self
    }

    pub fn dcl_input(&mut self, register: u32, mask: u8) -> &mut Self {
        self.instruction(
            Opcode::DclInput,
            &[register_operand(OperandType::Input, mask), register],
        )
    }

    pub fn dcl_input_ps(&mut self, register: u32, mask: u8) -> &mut Self {
        self.body.push(
            opcode_token(Opcode::DclInputPs, 3)
                | (INTERPOLATION_LINEAR << OPCODE_INTERPOLATION_SHIFT),
        );
        self.raw(&[register_operand(OperandType::Input, mask), register])
    }

    pub fn dcl_input_siv(&mut self, register: u32, mask: u8, name: u32) -> &mut Self {
        self.instruction(
            Opcode::DclInputSiv,
            &[register_operand(OperandType::Input, mask), register, name],
        )
    }

    pub fn dcl_output(&mut self, register: u32, mask: u8) -> &mut Self {
        self.instruction(
            Opcode::DclOutput,
            &[register_operand(OperandType::Output, mask), register],
        )
    }

    pub fn dcl_output_siv(&mut self, register: u32, mask: u8, name: u32) -> &mut Self {
        self.instruction(
            Opcode::DclOutputSiv,
            &[register_operand(OperandType::Output, mask), register, name],
        )
    }

    pub fn ret(&mut self) -> &mut Self {
        self.instruction(Opcode::Ret, &[])
    }

    /// The full token stream, program and length tokens included.
    pub fn tokens(&self) -> Vec<u32> {
        let mut tokens = Vec::with_capacity(2 + self.body.len());
        tokens.push(self.version);
        tokens.push(2 + self.body.len() as u32);
        tokens.extend_from_slice(&self.body);
        tokens
    }

    pub fn build(&self) -> Vec<u8> {
        tokens_to_bytes(&self.tokens())
    }
}

/// Builds a DXBC container holding the given blobs back to back.
///
/// The checksum field is left zeroed; [`crate::DxbcContainer::parse`] does not verify it.
pub fn build_container(blobs: &[(FourCC, &[u8])]) -> Vec<u8> {
    let header_len = 32 + 4 * blobs.len();
    let mut out = Vec::with_capacity(
        header_len + blobs.iter().map(|(_, data)| 8 + data.len()).sum::<usize>(),
    );

    out.extend_from_slice(&FourCC::DXBC.0);
    out.extend_from_slice(&[0u8; 16]);
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // total size, patched below
    out.extend_from_slice(&(blobs.len() as u32).to_le_bytes());
    out.resize(header_len, 0);

    for (i, (fourcc, data)) in blobs.iter().enumerate() {
        let offset = out.len() as u32;
        out[32 + 4 * i..36 + 4 * i].copy_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(&fourcc.0);
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
    }

    let total = out.len() as u32;
    out[24..28].copy_from_slice(&total.to_le_bytes());
    out
}
