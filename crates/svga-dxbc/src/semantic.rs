//! Signature element names and intrinsic component types, keyed by system-value enumerant.

use crate::token::ProgramType;
use crate::FourCC;

/// `D3D_REGISTER_COMPONENT_TYPE` values written into signature elements.
pub mod component_type {
    pub const UNKNOWN: u32 = 0;
    pub const UINT32: u32 = 1;
    pub const SINT32: u32 = 2;
    pub const FLOAT32: u32 = 3;
}

use self::component_type::{FLOAT32, UINT32, UNKNOWN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemanticInfo {
    /// Name written into the signature blob's string table.
    pub name: &'static str,
    pub component_type: u32,
}

const fn info(name: &'static str, component_type: u32) -> SemanticInfo {
    SemanticInfo {
        name,
        component_type,
    }
}

const TESS_FACTOR: SemanticInfo = info("SV_TessFactor", FLOAT32);

static SEMANTICS: [SemanticInfo; crate::limits::SEMANTIC_NAME_COUNT as usize] = [
    info("ATTRIB", UNKNOWN),
    info("SV_Position", FLOAT32),
    info("SV_ClipDistance", FLOAT32),
    info("SV_CullDistance", FLOAT32),
    info("SV_RenderTargetArrayIndex", UINT32),
    info("SV_ViewportArrayIndex", UINT32),
    info("SV_VertexID", UINT32),
    info("SV_PrimitiveID", UINT32),
    info("SV_InstanceID", UINT32),
    info("SV_IsFrontFace", UINT32),
    info("SV_SampleIndex", UINT32),
    // Quad edges and insides.
    TESS_FACTOR,
    TESS_FACTOR,
    TESS_FACTOR,
    TESS_FACTOR,
    TESS_FACTOR,
    TESS_FACTOR,
    // Triangle edges and inside.
    TESS_FACTOR,
    TESS_FACTOR,
    TESS_FACTOR,
    TESS_FACTOR,
    // Isoline detail and density.
    TESS_FACTOR,
    TESS_FACTOR,
];

/// Pixel shader outputs without a system value are render targets.
const PIXEL_TARGET: SemanticInfo = info("SV_TARGET", FLOAT32);

/// Looks up the name and intrinsic type for `semantic` in the signature blob `blob`.
///
/// Out-of-range enumerants fall back to the generic `ATTRIB` entry.
pub fn semantic_info(program_type: ProgramType, semantic: u32, blob: FourCC) -> SemanticInfo {
    match SEMANTICS.get(semantic as usize) {
        Some(_) if semantic == 0 && program_type == ProgramType::Pixel && blob == FourCC::OSGN => {
            PIXEL_TARGET
        }
        Some(info) => *info,
        None => SEMANTICS[0],
    }
}
