//! Whole-program parsing: header validation, the instruction loop, and signature collection.

use bytemuck::{Pod, Zeroable};
use tracing::{debug, warn};

use crate::diag;
use crate::error::{BytecodeErrorKind, Result, ShaderError};
use crate::instruction::{decode_instruction, Instruction};
use crate::limits::{MAX_SHADER_MEMORY_BYTES, MAX_SIGNATURE_ENTRIES};
use crate::opcode::Opcode;
use crate::token::{tokens_from_bytes, ProgramToken, ProgramType, TokenReader};

/// Lowest accepted program major version.
const MIN_MAJOR_VERSION: u32 = 4;

/// One row of an input, output or patch-constant signature.
///
/// Laid out exactly like the guest's `SVGA3dDXSignatureEntry`, so guest-supplied signature
/// tables can be read directly (see [`ShaderInfo::bind_guest_shader`]).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct SignatureEntry {
    pub register_index: u32,
    /// System-value enumerant; 0 for generic attributes.
    pub semantic_name: u32,
    pub mask: u32,
    /// 0 means "use the semantic's intrinsic type" when encoding.
    pub component_type: u32,
    pub min_precision: u32,
}

/// Everything the container encoder needs to know about a program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderInfo {
    pub program_type: ProgramType,
    pub input_signature: Vec<SignatureEntry>,
    pub output_signature: Vec<SignatureEntry>,
    /// Never filled by bytecode parsing; only guest-supplied signatures populate it.
    pub patch_constant_signature: Vec<SignatureEntry>,
}

impl ShaderInfo {
    fn record(&mut self, inst: &Instruction) -> Result<()> {
        let (signature, which) = match inst.opcode {
            Opcode::DclInput | Opcode::DclInputPs | Opcode::DclInputSiv => {
                (&mut self.input_signature, "input")
            }
            Opcode::DclOutput | Opcode::DclOutputSiv => (&mut self.output_signature, "output"),
            _ => return Ok(()),
        };

        if signature.len() >= MAX_SIGNATURE_ENTRIES {
            return Err(ShaderError::bytecode(
                inst.at_token,
                BytecodeErrorKind::SignatureFull {
                    signature: which,
                    max: MAX_SIGNATURE_ENTRIES,
                },
            ));
        }
        let operand = inst
            .operands
            .first()
            .ok_or(ShaderError::Internal("declaration decoded without an operand"))?;

        signature.push(SignatureEntry {
            register_index: operand.register_index() as u32,
            semantic_name: inst.semantic_name.unwrap_or(0),
            mask: u32::from(operand.mask),
            component_type: 0,
            min_precision: 0,
        });
        Ok(())
    }

    fn log_signatures(&self) {
        for (which, signature) in [
            ("input", &self.input_signature),
            ("output", &self.output_signature),
            ("patch constant", &self.patch_constant_signature),
        ] {
            for (i, entry) in signature.iter().enumerate() {
                debug!(
                    signature = which,
                    index = i,
                    register = entry.register_index,
                    semantic = diag::system_name(entry.semantic_name),
                    mask = entry.mask,
                    "signature entry"
                );
            }
        }
    }
}

/// Parses VGPU10 bytecode and collects its input and output signatures.
pub fn parse_shader(bytes: &[u8]) -> Result<ShaderInfo> {
    let mut info = ShaderInfo::default();
    match parse_program(bytes, Some(&mut info)) {
        Ok(()) => Ok(info),
        Err(err) => {
            warn!(%err, len = bytes.len(), "rejected shader bytecode");
            Err(err)
        }
    }
}

/// Checks that `bytes` is structurally valid VGPU10 bytecode without collecting anything.
///
/// Signature capacity is not checked in this mode.
pub fn validate_shader(bytes: &[u8]) -> Result<()> {
    parse_program(bytes, None).map_err(|err| {
        warn!(%err, len = bytes.len(), "rejected shader bytecode");
        err
    })
}

fn parse_program(bytes: &[u8], mut info: Option<&mut ShaderInfo>) -> Result<()> {
    let len = bytes.len();
    if len > MAX_SHADER_MEMORY_BYTES {
        return Err(ShaderError::bytecode(
            0,
            BytecodeErrorKind::TooLarge {
                len,
                max: MAX_SHADER_MEMORY_BYTES,
            },
        ));
    }
    if len % 4 != 0 {
        return Err(ShaderError::bytecode(0, BytecodeErrorKind::Unaligned { len }));
    }
    let tokens = tokens_from_bytes(bytes);
    let [program, declared, body @ ..] = tokens.as_slice() else {
        return Err(ShaderError::bytecode(0, BytecodeErrorKind::TooShort { len }));
    };

    let program = ProgramToken(*program);
    let program_type = ProgramType::from_raw(program.program_type())
        .filter(|_| program.major_version() >= MIN_MAJOR_VERSION)
        .ok_or_else(|| {
            ShaderError::bytecode(
                0,
                BytecodeErrorKind::UnsupportedProgram {
                    token: program.0,
                    major: program.major_version(),
                    minor: program.minor_version(),
                    program_type: program.program_type(),
                },
            )
        })?;
    if let Some(info) = info.as_deref_mut() {
        info.program_type = program_type;
    }

    debug!(
        major = program.major_version(),
        minor = program.minor_version(),
        program_type = diag::program_type_name(program.program_type()),
        tokens = *declared,
        "shader program"
    );
    if *declared as usize != tokens.len() {
        return Err(ShaderError::bytecode(
            1,
            BytecodeErrorKind::LengthMismatch {
                declared: *declared,
                actual: tokens.len(),
            },
        ));
    }

    let mut r = TokenReader::new(body, 2);
    let mut instructions = 0usize;
    while r.can_read(1) {
        let inst = decode_instruction(&mut r)?;
        if let Some(info) = info.as_deref_mut() {
            info.record(&inst)?;
        }
        instructions += 1;
    }

    debug!(instructions, "decoded shader");
    if let Some(info) = info {
        info.log_signatures();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{opcode_token, register_operand, tokens_to_bytes, ProgramBuilder};
    use crate::operand::OperandType;

    fn kind(err: ShaderError) -> BytecodeErrorKind {
        err.bytecode_kind().cloned().expect("bytecode error")
    }

    fn program_token(program_type: ProgramType) -> u32 {
        ProgramToken::new(program_type, 5, 0).0
    }

    #[test]
    fn header_only_program_is_empty() {
        let bytes = tokens_to_bytes(&[program_token(ProgramType::Pixel), 2]);
        let info = parse_shader(&bytes).unwrap();
        assert_eq!(info.program_type, ProgramType::Pixel);
        assert!(info.input_signature.is_empty());
        assert!(info.output_signature.is_empty());
    }

    #[test]
    fn rejects_bad_lengths() {
        assert_eq!(
            kind(parse_shader(&[0; 4]).unwrap_err()),
            BytecodeErrorKind::TooShort { len: 4 }
        );
        assert_eq!(
            kind(parse_shader(&[0; 10]).unwrap_err()),
            BytecodeErrorKind::Unaligned { len: 10 }
        );
        let huge = vec![0u8; MAX_SHADER_MEMORY_BYTES + 4];
        assert!(matches!(
            kind(parse_shader(&huge).unwrap_err()),
            BytecodeErrorKind::TooLarge { .. }
        ));
        assert!(validate_shader(&[]).is_err());
    }

    #[test]
    fn declared_length_must_match_exactly() {
        let prog = program_token(ProgramType::Vertex);
        let nop = opcode_token(Opcode::Nop, 1);
        for declared in [2u32, 4] {
            let bytes = tokens_to_bytes(&[prog, declared, nop]);
            assert_eq!(
                kind(parse_shader(&bytes).unwrap_err()),
                BytecodeErrorKind::LengthMismatch {
                    declared,
                    actual: 3
                }
            );
        }
        assert!(parse_shader(&tokens_to_bytes(&[prog, 3, nop])).is_ok());
    }

    #[test]
    fn rejects_unsupported_program_tokens() {
        // Shader model 3.
        let sm3 = ProgramToken::new(ProgramType::Pixel, 3, 0).0;
        assert!(matches!(
            kind(parse_shader(&tokens_to_bytes(&[sm3, 2])).unwrap_err()),
            BytecodeErrorKind::UnsupportedProgram { major: 3, .. }
        ));
        // Program type 6.
        let bad_type = (6 << 16) | 0x50;
        assert!(matches!(
            kind(validate_shader(&tokens_to_bytes(&[bad_type, 2])).unwrap_err()),
            BytecodeErrorKind::UnsupportedProgram { program_type: 6, .. }
        ));
    }

    #[test]
    fn collects_signatures_in_declaration_order() {
        let bytes = ProgramBuilder::new(ProgramType::Pixel)
            .dcl_input_ps(3, 0x3)
            .dcl_input_siv(0, 0xf, 1)
            .dcl_output(0, 0xf)
            .dcl_output_siv(1, 0x1, 4)
            .ret()
            .build();
        let info = parse_shader(&bytes).unwrap();

        assert_eq!(
            info.input_signature,
            vec![
                SignatureEntry {
                    register_index: 3,
                    semantic_name: 0,
                    mask: 0x3,
                    ..Default::default()
                },
                SignatureEntry {
                    register_index: 0,
                    semantic_name: 1,
                    mask: 0xf,
                    ..Default::default()
                },
            ]
        );
        assert_eq!(info.output_signature.len(), 2);
        assert_eq!(info.output_signature[1].semantic_name, 4);
        assert!(info.patch_constant_signature.is_empty());
    }

    #[test]
    fn sgv_and_ps_siv_declarations_are_not_collected() {
        let bytes = ProgramBuilder::new(ProgramType::Pixel)
            .instruction(
                Opcode::DclInputPsSiv,
                &[register_operand(OperandType::Input, 0xf), 0, 1],
            )
            .instruction(
                Opcode::DclInputSgv,
                &[register_operand(OperandType::Input, 0x1), 1, 8],
            )
            .build();
        let info = parse_shader(&bytes).unwrap();
        assert!(info.input_signature.is_empty());
    }

    #[test]
    fn signature_capacity_is_enforced_only_when_collecting() {
        let mut builder = ProgramBuilder::new(ProgramType::Vertex);
        for register in 0..=MAX_SIGNATURE_ENTRIES as u32 {
            builder.dcl_input(register, 0xf);
        }
        let bytes = builder.build();

        assert_eq!(
            kind(parse_shader(&bytes).unwrap_err()),
            BytecodeErrorKind::SignatureFull {
                signature: "input",
                max: MAX_SIGNATURE_ENTRIES
            }
        );
        validate_shader(&bytes).unwrap();
    }

    #[test]
    fn first_bad_instruction_fails_the_program() {
        let prog = program_token(ProgramType::Compute);
        let bytes = tokens_to_bytes(&[prog, 4, opcode_token(Opcode::Nop, 1), 0x7ff]);
        let err = parse_shader(&bytes).unwrap_err();
        assert!(err.is_invalid_parameter());
        assert_eq!(
            err,
            ShaderError::bytecode(3, BytecodeErrorKind::OpcodeOutOfRange { opcode: 0x7ff })
        );
    }
}
