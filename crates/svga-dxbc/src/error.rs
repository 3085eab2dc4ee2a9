use thiserror::Error;

use crate::FourCC;

pub type Result<T, E = ShaderError> = core::result::Result<T, E>;

/// Errors produced while parsing VGPU10 bytecode or building/reading DXBC containers.
///
/// Everything except [`ShaderError::OutOfMemory`] and [`ShaderError::Internal`] is caused by
/// malformed guest input; see [`ShaderError::is_invalid_parameter`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShaderError {
    #[error("malformed shader bytecode at token {at_token}: {kind}")]
    Bytecode {
        at_token: usize,
        kind: BytecodeErrorKind,
    },

    #[error("invalid {blob} signature: {kind}")]
    Signature {
        blob: FourCC,
        kind: SignatureErrorKind,
    },

    #[error("malformed guest signature block: {0}")]
    GuestSignatures(String),

    #[error("malformed DXBC container: {0}")]
    Container(String),

    #[error("out of memory growing output buffer by {requested} bytes")]
    OutOfMemory { requested: usize },

    #[error("internal error: {0}")]
    Internal(&'static str),
}

impl ShaderError {
    pub(crate) fn bytecode(at_token: usize, kind: BytecodeErrorKind) -> Self {
        ShaderError::Bytecode { at_token, kind }
    }

    pub(crate) fn signature(blob: FourCC, kind: SignatureErrorKind) -> Self {
        ShaderError::Signature { blob, kind }
    }

    pub(crate) fn container(msg: impl Into<String>) -> Self {
        ShaderError::Container(msg.into())
    }

    /// Returns `true` for errors caused by malformed input rather than host resource limits.
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(
            self,
            ShaderError::Bytecode { .. }
                | ShaderError::Signature { .. }
                | ShaderError::GuestSignatures(_)
                | ShaderError::Container(_)
        )
    }

    /// Returns `true` if the output buffer could not be grown.
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, ShaderError::OutOfMemory { .. })
    }

    /// The structural rule violated by malformed bytecode, if this is a bytecode error.
    pub fn bytecode_kind(&self) -> Option<&BytecodeErrorKind> {
        match self {
            ShaderError::Bytecode { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BytecodeErrorKind {
    #[error("length {len} exceeds maximum {max} bytes")]
    TooLarge { len: usize, max: usize },

    #[error("length {len} is not a multiple of the token size")]
    Unaligned { len: usize },

    #[error("length {len} is too short for the program and length tokens")]
    TooShort { len: usize },

    #[error("unsupported program token {token:#010x} (version {major}.{minor}, type {program_type})")]
    UnsupportedProgram {
        token: u32,
        major: u32,
        minor: u32,
        program_type: u32,
    },

    #[error("declared token count {declared} does not match actual count {actual}")]
    LengthMismatch { declared: u32, actual: usize },

    #[error("unexpected end of token stream (wanted {wanted} tokens, {remaining} remaining)")]
    UnexpectedEof { wanted: usize, remaining: usize },

    #[error("opcode type {opcode} is out of range")]
    OpcodeOutOfRange { opcode: u32 },

    #[error("instruction length {len} is outside 1..256")]
    InstructionLength { len: u32 },

    #[error("extended opcode token is not supported for `{opcode}`")]
    UnsupportedExtendedOpcode { opcode: &'static str },

    #[error("opcode `{opcode}` is not supported")]
    UnsupportedOpcode { opcode: &'static str },

    #[error("operand component count {num} is out of range")]
    OperandComponents { num: u32 },

    #[error("operand selection mode {mode} is out of range")]
    SelectionMode { mode: u32 },

    #[error("operand index dimension {dim} is out of range")]
    IndexDimension { dim: u32 },

    #[error("operand type {ty} is out of range")]
    OperandTypeOutOfRange { ty: u32 },

    #[error("operand index representation {rep} is out of range")]
    IndexRepresentation { rep: u32 },

    #[error("{signature} signature already holds {max} entries")]
    SignatureFull { signature: &'static str, max: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureErrorKind {
    #[error("{count} entries exceed capacity {max}")]
    TooManyEntries { count: usize, max: usize },

    #[error("register {register} is outside the register map (capacity {max})")]
    RegisterOutOfRange { register: u32, max: usize },

    #[error("register {register} is declared more than once")]
    DuplicateRegister { register: u32 },

    #[error("semantic name {semantic} is out of range")]
    SemanticOutOfRange { semantic: u32 },
}
