#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use svga_dxbc::{create_dxbc, parse_shader, validate_shader, DxbcContainer, ShaderInfo};

/// Max fuzz input size; larger inputs only repeat the instruction loop.
const MAX_INPUT_SIZE_BYTES: usize = 256 * 1024;

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    /// Program type and version nibble pair for the program token.
    program_type: u8,
    version: u8,
    body: Vec<u32>,
    /// Bytes appended after the bytecode, read as a guest signature block.
    trailing: &'a [u8],
    raw: &'a [u8],
}

fuzz_target!(|input: Input<'_>| {
    if input.body.len() * 4 + input.trailing.len() + input.raw.len() > MAX_INPUT_SIZE_BYTES {
        return;
    }

    // Unstructured bytes through every entry point.
    let _ = validate_shader(input.raw);
    // Declared registers and system values are not range-checked until encoding.
    if let Ok(dxbc) = parse_shader(input.raw).and_then(|info| create_dxbc(&info, input.raw)) {
        let container = DxbcContainer::parse(&dxbc).expect("encoded container must parse");
        assert!(container.checksum_matches());
        assert_eq!(container.shader_code().ok(), Some(input.raw));
    }
    let _ = DxbcContainer::parse(input.raw).map(|c| {
        let _ = c.input_signature();
        let _ = c.output_signature();
        let _ = c.shader_code();
        c.checksum_matches()
    });

    // A well-formed header over arbitrary instructions, plus a guest block.
    let program = (u32::from(input.program_type % 8) << 16) | u32::from(input.version);
    let mut region = Vec::with_capacity(8 + input.body.len() * 4 + input.trailing.len());
    region.extend_from_slice(&program.to_le_bytes());
    region.extend_from_slice(&(2 + input.body.len() as u32).to_le_bytes());
    for token in &input.body {
        region.extend_from_slice(&token.to_le_bytes());
    }
    let code_len = region.len();
    region.extend_from_slice(input.trailing);

    if let Ok(info) = ShaderInfo::bind_guest_shader(&region, code_len) {
        // Guest signatures are unchecked; encoding may reject them but must not panic.
        let _ = create_dxbc(&info, &region[..code_len]);
    }
});
