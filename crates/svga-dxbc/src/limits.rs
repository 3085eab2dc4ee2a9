//! Centralized limits for VGPU10 shader parsing and DXBC container encoding.
//!
//! Shader bytecode arrives from guest memory and is untrusted. These limits bound the work done
//! while decoding and the memory the container writer may allocate.

/// Maximum accepted shader bytecode length in bytes (`SVGA3D_MAX_SHADER_MEMORY_BYTES`).
pub const MAX_SHADER_MEMORY_BYTES: usize = 8 * 1024 * 1024; // 8 MiB

/// Hard ceiling on the size of the container writer's backing buffer.
///
/// A container holds the verbatim token stream plus two small signature blobs, so twice the
/// maximum bytecode size is never reached by well-formed input.
pub const MAX_OUTPUT_BYTES: usize = 2 * MAX_SHADER_MEMORY_BYTES;

/// Granularity of container writer growth.
pub const WRITER_GROW_ALIGN: usize = 4096;

/// Capacity of each signature table (input, output, patch constant).
///
/// Also the number of register slots in the encoder's register map, so any register index at
/// or above this value is rejected when a signature blob is built.
pub const MAX_SIGNATURE_ENTRIES: usize = 32;

/// Exclusive upper bound on an instruction's token count.
pub const MAX_INSTRUCTION_TOKENS: u32 = 256;

/// Maximum number of operands a single instruction may decode.
pub const MAX_OPERANDS: usize = 8;

/// Number of semantic-name enumerants (`SVGADX_SIGNATURE_SEMANTIC_NAME_MAX`).
pub const SEMANTIC_NAME_COUNT: u32 = 23;
