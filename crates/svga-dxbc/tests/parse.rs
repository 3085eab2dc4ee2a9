use proptest::prelude::*;
use svga_dxbc::operand::OperandType;
use svga_dxbc::test_utils::{opcode_token, register_operand, tokens_to_bytes, ProgramBuilder};
use svga_dxbc::token::EXTENDED_BIT;
use svga_dxbc::{parse_shader, validate_shader, BytecodeErrorKind, Opcode, ProgramType};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

fn kind(bytes: &[u8]) -> BytecodeErrorKind {
    parse_shader(bytes)
        .unwrap_err()
        .bytecode_kind()
        .cloned()
        .expect("bytecode error")
}

/// A vertex shader: two inputs, position and texcoord outputs, a temp and a couple of moves.
fn vertex_shader() -> Vec<u8> {
    let temp_dst = register_operand(OperandType::Temp, 0xf);
    // 4-component swizzle xyzw of input register.
    let input_src = 2 | (0b01 << 2) | (0xe4 << 4) | ((OperandType::Input as u32) << 12) | (1 << 20);
    let output_dst = register_operand(OperandType::Output, 0xf);
    let temp_src = 2 | (0b01 << 2) | (0xe4 << 4) | ((OperandType::Temp as u32) << 12) | (1 << 20);

    ProgramBuilder::new(ProgramType::Vertex)
        .instruction(Opcode::DclGlobalFlags, &[])
        .dcl_input(0, 0xf)
        .dcl_input(1, 0x3)
        .dcl_output_siv(0, 0xf, 1)
        .dcl_output(1, 0x3)
        .instruction(Opcode::DclTemps, &[1])
        .instruction(Opcode::Mov, &[temp_dst, 0, input_src, 0])
        .instruction(Opcode::Mov, &[output_dst, 0, temp_src, 0])
        .instruction(Opcode::Mov, &[output_dst, 1, input_src, 1])
        .ret()
        .build()
}

#[test]
fn parses_realistic_vertex_shader() {
    init_tracing();
    let info = parse_shader(&vertex_shader()).unwrap();

    assert_eq!(info.program_type, ProgramType::Vertex);
    let inputs: Vec<_> = info
        .input_signature
        .iter()
        .map(|e| (e.register_index, e.semantic_name, e.mask))
        .collect();
    assert_eq!(inputs, vec![(0, 0, 0xf), (1, 0, 0x3)]);
    let outputs: Vec<_> = info
        .output_signature
        .iter()
        .map(|e| (e.register_index, e.semantic_name, e.mask))
        .collect();
    assert_eq!(outputs, vec![(0, 1, 0xf), (1, 0, 0x3)]);
    assert!(info.patch_constant_signature.is_empty());
}

#[test]
fn customdata_blocks_are_skipped() {
    init_tracing();
    // Immediate constant buffer class (3) with 4 payload tokens.
    let customdata = Opcode::Customdata.raw() | (3 << 11);
    let bytes = ProgramBuilder::new(ProgramType::Pixel)
        .raw(&[customdata, 6, 1, 2, 3, 4])
        .dcl_output(0, 0xf)
        .ret()
        .build();
    let info = parse_shader(&bytes).unwrap();
    assert_eq!(info.output_signature.len(), 1);

    // Lengths below two still consume the opcode and length tokens.
    let bytes = ProgramBuilder::new(ProgramType::Pixel)
        .raw(&[customdata, 0])
        .ret()
        .build();
    parse_shader(&bytes).unwrap();

    // A block longer than the program runs off the end.
    let bytes = ProgramBuilder::new(ProgramType::Pixel)
        .raw(&[customdata, 10, 0])
        .build();
    assert!(matches!(kind(&bytes), BytecodeErrorKind::UnexpectedEof { .. }));
}

#[test]
fn extended_length_declarations() {
    init_tracing();
    // dcl_thread_group with its real length in the following token.
    let bytes = ProgramBuilder::new(ProgramType::Compute)
        .raw(&[Opcode::DclThreadGroup.raw() | EXTENDED_BIT, 5, 8, 8, 1])
        .ret()
        .build();
    parse_shader(&bytes).unwrap();

    // Other opcodes may not set the extended bit.
    let bytes = ProgramBuilder::new(ProgramType::Compute)
        .raw(&[opcode_token(Opcode::Nop, 1) | EXTENDED_BIT, 0])
        .build();
    assert!(matches!(
        kind(&bytes),
        BytecodeErrorKind::UnsupportedExtendedOpcode { .. }
    ));
}

#[test]
fn structural_errors_are_reported() {
    init_tracing();
    let program = ProgramBuilder::new(ProgramType::Pixel);

    // Opcode beyond the table.
    let bytes = program.clone().raw(&[0x7ff | (1 << 24)]).build();
    assert_eq!(kind(&bytes), BytecodeErrorKind::OpcodeOutOfRange { opcode: 0x7ff });

    // Zero-length instruction.
    let bytes = program.clone().raw(&[Opcode::Ret.raw()]).build();
    assert_eq!(kind(&bytes), BytecodeErrorKind::InstructionLength { len: 0 });

    // Declared longer than the program.
    let bytes = program.clone().raw(&[opcode_token(Opcode::Mov, 5), 0]).build();
    assert!(matches!(kind(&bytes), BytecodeErrorKind::UnexpectedEof { .. }));

    // Unsupported vendor opcode.
    let bytes = program.clone().instruction(Opcode::Vmware, &[]).build();
    assert!(matches!(kind(&bytes), BytecodeErrorKind::UnsupportedOpcode { .. }));

    // Operand type out of range.
    let bad_operand = 2 | (0xf << 4) | (0xff << 12) | (1 << 20);
    let bytes = program
        .clone()
        .instruction(Opcode::DclOutput, &[bad_operand, 0])
        .build();
    assert!(matches!(
        kind(&bytes),
        BytecodeErrorKind::OperandTypeOutOfRange { ty: 0xff }
    ));
}

#[test]
fn errors_carry_token_positions() {
    let bytes = ProgramBuilder::new(ProgramType::Pixel)
        .dcl_output(0, 0xf)
        .raw(&[Opcode::Ret.raw()])
        .build();
    let err = parse_shader(&bytes).unwrap_err();
    assert!(err.is_invalid_parameter());
    // Program token, length token, three-token declaration.
    assert!(err.to_string().contains("at token 5"), "{err}");
}

#[test]
fn validation_accepts_what_parsing_accepts() {
    let bytes = vertex_shader();
    validate_shader(&bytes).unwrap();
    assert!(validate_shader(&bytes[..bytes.len() - 4]).is_err());
    assert!(validate_shader(&tokens_to_bytes(&[0x0001_0050, 2])).is_ok());
}

proptest! {
    #[test]
    fn arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let parsed = parse_shader(&bytes);
        let validated = validate_shader(&bytes);
        // Validation skips signature capacity, so it accepts a superset.
        prop_assert!(parsed.is_err() || validated.is_ok());
    }

    #[test]
    fn arbitrary_bodies_never_panic(body in proptest::collection::vec(any::<u32>(), 0..64)) {
        let bytes = ProgramBuilder::new(ProgramType::Hull).raw(&body).build();
        if let Err(err) = parse_shader(&bytes) {
            prop_assert!(err.is_invalid_parameter());
        }
    }
}
