//! Instruction decoding.

use tracing::trace;

use crate::diag;
use crate::error::{BytecodeErrorKind, Result, ShaderError};
use crate::limits::{MAX_INSTRUCTION_TOKENS, MAX_OPERANDS};
use crate::opcode::{Opcode, OperandCount};
use crate::operand::{decode_operand, Operand};
use crate::token::{NameToken, OpcodeToken, TokenReader};

/// Opcode-specific tokens that follow an instruction's operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailingFields {
    None,
    /// A [`NameToken`] carrying the declared system value.
    SystemValueName,
    /// Tokens that are consumed without interpretation.
    Skip { count: usize, what: &'static str },
}

/// Every opcode with post-operand tokens is listed here; all others have none.
pub fn trailing_fields(opcode: Opcode) -> TrailingFields {
    use Opcode::*;

    let skip = |count, what| TrailingFields::Skip { count, what };
    match opcode {
        DclInputSgv | DclInputSiv | DclInputPsSgv | DclInputPsSiv | DclOutputSgv
        | DclOutputSiv => TrailingFields::SystemValueName,
        DclResource => skip(1, "resource return type"),
        DclTemps => skip(1, "temp count"),
        DclIndexableTemp => skip(3, "register index, register count, component count"),
        DclIndexRange => skip(1, "register count"),
        DclMaxOutputVertexCount => skip(1, "max output vertex count"),
        DclGsInstanceCount => skip(1, "instance count"),
        DclHsMaxTessfactor => skip(1, "max tessfactor"),
        DclHsForkPhaseInstanceCount | DclHsJoinPhaseInstanceCount => {
            skip(1, "phase instance count")
        }
        DclThreadGroup => skip(3, "thread group dimensions"),
        DclUavTyped => skip(1, "resource return type"),
        DclUavStructured => skip(1, "byte stride"),
        DclTgsmRaw => skip(1, "element count"),
        DclTgsmStructured => skip(2, "byte stride, struct count"),
        DclResourceStructured => skip(1, "byte stride"),
        _ => TrailingFields::None,
    }
}

/// Tokens skipped between the opcode token(s) and the first operand.
pub fn leading_tokens(opcode: Opcode) -> usize {
    match opcode {
        // Function table index.
        Opcode::InterfaceCall => 1,
        _ => 0,
    }
}

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    /// Token index of the opcode token.
    pub at_token: usize,
    /// Declared length in tokens, including the opcode token.
    pub token_count: u32,
    /// Empty for `customdata`.
    pub operands: Vec<Operand>,
    /// System value from the trailing name token of `*_siv`/`*_sgv` declarations.
    pub semantic_name: Option<u32>,
}

/// Decodes the instruction at the reader's position.
///
/// The declared length is validated against the remaining tokens, but the cursor is advanced by
/// what the operands and trailing fields actually consume.
pub fn decode_instruction(r: &mut TokenReader<'_>) -> Result<Instruction> {
    let at = r.position();
    let token = OpcodeToken(r.read_u32()?);
    let raw = token.opcode_type();
    let opcode = Opcode::from_raw(raw).ok_or_else(|| {
        ShaderError::bytecode(at, BytecodeErrorKind::OpcodeOutOfRange { opcode: raw })
    })?;

    match opcode.operand_count() {
        OperandCount::Fixed(count) => decode_regular(r, at, token, opcode, count as usize),
        OperandCount::Special => decode_special(r, at, token, opcode),
    }
}

fn decode_regular(
    r: &mut TokenReader<'_>,
    at: usize,
    token: OpcodeToken,
    opcode: Opcode,
    operand_count: usize,
) -> Result<Instruction> {
    trace!(
        at,
        offset = r.byte_offset() - 4,
        opcode = %opcode,
        len = token.instruction_length(),
        interpolation = diag::interpolation_mode_name(token.interpolation_mode()),
        "instruction"
    );

    if operand_count >= MAX_OPERANDS {
        return Err(ShaderError::Internal("opcode table operand count exceeds capacity"));
    }

    let mut token_count = token.instruction_length();
    if token.is_extended() {
        r.require(1)?;
        if !opcode.has_extended_length() {
            return Err(ShaderError::bytecode(
                at,
                BytecodeErrorKind::UnsupportedExtendedOpcode {
                    opcode: opcode.mnemonic(),
                },
            ));
        }
        // The 7-bit length field cannot describe long declarations.
        token_count = r.read_u32()?;
    }

    if token_count == 0 || token_count >= MAX_INSTRUCTION_TOKENS {
        return Err(ShaderError::bytecode(
            at,
            BytecodeErrorKind::InstructionLength { len: token_count },
        ));
    }
    r.require(token_count as usize - 1)?;

    let leading = leading_tokens(opcode);
    if leading > 0 {
        r.skip(leading)?;
    }

    let mut operands = Vec::with_capacity(operand_count);
    for _ in 0..operand_count {
        operands.push(decode_operand(r)?);
    }

    let mut semantic_name = None;
    match trailing_fields(opcode) {
        TrailingFields::None => {}
        TrailingFields::SystemValueName => {
            let name = NameToken(r.read_u32()?).name();
            trace!(name = diag::system_name(name), raw = name, "system value");
            semantic_name = Some(name);
        }
        TrailingFields::Skip { count, what } => {
            r.skip(count)?;
            trace!(count, what, "skipped trailing tokens");
        }
    }

    Ok(Instruction {
        opcode,
        at_token: at,
        token_count,
        operands,
        semantic_name,
    })
}

fn decode_special(
    r: &mut TokenReader<'_>,
    at: usize,
    token: OpcodeToken,
    opcode: Opcode,
) -> Result<Instruction> {
    match opcode {
        Opcode::Customdata => {
            trace!(
                at,
                class = diag::custom_data_class_name(token.custom_data_class()),
                "customdata"
            );
            // The length word counts the opcode token and itself.
            let token_count = r.read_u32()?.max(2);
            r.skip(token_count as usize - 2)?;
            Ok(Instruction {
                opcode,
                at_token: at,
                token_count,
                operands: Vec::new(),
                semantic_name: None,
            })
        }
        _ => Err(ShaderError::bytecode(
            at,
            BytecodeErrorKind::UnsupportedOpcode {
                opcode: opcode.mnemonic(),
            },
        )),
    }
}
