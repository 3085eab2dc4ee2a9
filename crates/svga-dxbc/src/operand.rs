//! Operand decoding.
//!
//! An operand is one `OperandToken`, an optional extension token, then either immediate data or
//! up to three index expressions. Only the first two index dimensions are populated; the third
//! is accepted in the encoding but never read.

use core::fmt;

use tracing::trace;

use crate::diag;
use crate::error::{BytecodeErrorKind, Result, ShaderError};
use crate::token::{OperandToken, TokenReader};

/// Number of defined operand types (`VGPU10_NUM_OPERANDS`).
pub const NUM_OPERANDS: usize = 41;

macro_rules! operand_types {
    ($($variant:ident = $name:literal;)*) => {
        /// Register file / storage class of an operand.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum OperandType {
            $($variant,)*
        }

        impl OperandType {
            pub const ALL: [OperandType; NUM_OPERANDS] = [$(OperandType::$variant,)*];

            pub fn name(self) -> &'static str {
                match self {
                    $(OperandType::$variant => $name,)*
                }
            }
        }
    };
}

operand_types! {
    Temp = "temp";
    Input = "input";
    Output = "output";
    IndexableTemp = "indexable_temp";
    Immediate32 = "immediate32";
    Immediate64 = "immediate64";
    Sampler = "sampler";
    Resource = "resource";
    ConstantBuffer = "constant_buffer";
    ImmediateConstantBuffer = "immediate_constant_buffer";
    Label = "label";
    InputPrimitiveId = "input_primitiveid";
    OutputDepth = "output_depth";
    Null = "null";
    Rasterizer = "rasterizer";
    OutputCoverageMask = "output_coverage_mask";
    Stream = "stream";
    FunctionBody = "function_body";
    FunctionTable = "function_table";
    Interface = "interface";
    FunctionInput = "function_input";
    FunctionOutput = "function_output";
    OutputControlPointId = "output_control_point_id";
    InputForkInstanceId = "input_fork_instance_id";
    InputJoinInstanceId = "input_join_instance_id";
    InputControlPoint = "input_control_point";
    OutputControlPoint = "output_control_point";
    InputPatchConstant = "input_patch_constant";
    InputDomainPoint = "input_domain_point";
    ThisPointer = "this_pointer";
    Uav = "uav";
    ThreadGroupSharedMemory = "thread_group_shared_memory";
    InputThreadId = "input_thread_id";
    InputThreadGroupId = "input_thread_group_id";
    InputThreadIdInGroup = "input_thread_id_in_group";
    InputCoverageMask = "input_coverage_mask";
    InputThreadIdInGroupFlattened = "input_thread_id_in_group_flattened";
    InputGsInstanceId = "input_gs_instance_id";
    OutputDepthGreaterEqual = "output_depth_greater_equal";
    OutputDepthLessEqual = "output_depth_less_equal";
    CycleCounter = "cycle_counter";
}

impl OperandType {
    pub fn from_raw(raw: u32) -> Option<OperandType> {
        OperandType::ALL.get(raw as usize).copied()
    }

    pub fn is_immediate(self) -> bool {
        matches!(self, OperandType::Immediate32 | OperandType::Immediate64)
    }
}

impl fmt::Display for OperandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComponentCount {
    #[default]
    Zero,
    One,
    Four,
}

impl ComponentCount {
    /// Decodes the token field; the "N component" encoding (3) is rejected.
    pub fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => ComponentCount::Zero,
            1 => ComponentCount::One,
            2 => ComponentCount::Four,
            _ => return None,
        })
    }

    pub fn count(self) -> usize {
        match self {
            ComponentCount::Zero => 0,
            ComponentCount::One => 1,
            ComponentCount::Four => 4,
        }
    }
}

/// How a 4-component operand selects its components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Mask,
    Swizzle,
    Select1,
}

impl SelectionMode {
    pub fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => SelectionMode::Mask,
            1 => SelectionMode::Swizzle,
            2 => SelectionMode::Select1,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexRepresentation {
    Immediate32,
    Immediate64,
    Relative,
    Immediate32PlusRelative,
    Immediate64PlusRelative,
}

impl IndexRepresentation {
    pub fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => IndexRepresentation::Immediate32,
            1 => IndexRepresentation::Immediate64,
            2 => IndexRepresentation::Relative,
            3 => IndexRepresentation::Immediate32PlusRelative,
            4 => IndexRepresentation::Immediate64PlusRelative,
            _ => return None,
        })
    }

    /// Tokens consumed by an index with this representation.
    pub fn token_count(self) -> usize {
        match self {
            IndexRepresentation::Immediate32 | IndexRepresentation::Relative => 1,
            IndexRepresentation::Immediate64 | IndexRepresentation::Immediate32PlusRelative => 2,
            IndexRepresentation::Immediate64PlusRelative => 3,
        }
    }
}

/// One decoded index expression.
///
/// `values[0]` is the immediate part (or the relative token for purely relative indices);
/// `values[1]` is the relative token of the "plus relative" forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandIndex {
    pub representation: IndexRepresentation,
    pub values: [u64; 2],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    pub operand_type: OperandType,
    pub num_components: ComponentCount,
    /// Present only for non-immediate 4-component operands.
    pub selection_mode: Option<SelectionMode>,
    pub mask: u8,
    /// Declared index dimension, 0..=3.
    pub index_dimension: u32,
    pub indices: [Option<OperandIndex>; 2],
    immediates: [u32; 4],
    immediate_count: usize,
}

impl Operand {
    /// Raw immediate components. Immediate64 components hold their low word only.
    pub fn immediates(&self) -> &[u32] {
        &self.immediates[..self.immediate_count]
    }

    /// First value of the first index, or 0 when the operand has no index.
    pub fn register_index(&self) -> u64 {
        self.indices[0].map_or(0, |index| index.values[0])
    }
}

pub fn decode_operand(r: &mut TokenReader<'_>) -> Result<Operand> {
    let at = r.position();
    let token = OperandToken(r.read_u32()?);

    let num_components = ComponentCount::from_raw(token.num_components()).ok_or_else(|| {
        ShaderError::bytecode(
            at,
            BytecodeErrorKind::OperandComponents {
                num: token.num_components(),
            },
        )
    })?;

    let raw_type = token.operand_type();
    let immediate = raw_type == OperandType::Immediate32 as u32
        || raw_type == OperandType::Immediate64 as u32;

    trace!(
        at,
        components = diag::num_components_name(token.num_components()),
        selection = diag::selection_mode_name(token.selection_mode()),
        ty = diag::operand_type_name(raw_type),
        dim = token.index_dimension(),
        "operand"
    );

    let mut selection_mode = None;
    if !immediate && num_components == ComponentCount::Four {
        let mode = SelectionMode::from_raw(token.selection_mode()).ok_or_else(|| {
            ShaderError::bytecode(
                at,
                BytecodeErrorKind::SelectionMode {
                    mode: token.selection_mode(),
                },
            )
        })?;
        match mode {
            SelectionMode::Mask => trace!(mask = token.mask(), "component mask"),
            SelectionMode::Swizzle => {
                let [x, y, z, w] = token.swizzle().map(diag::component_name);
                trace!(x, y, z, w, "swizzle");
            }
            SelectionMode::Select1 => {
                trace!(component = diag::component_name(token.select_1()), "select 1")
            }
        }
        selection_mode = Some(mode);
    }

    if token.is_extended() {
        // Operand modifiers / min precision; not interpreted.
        let _extension = r.read_u32()?;
    }

    let index_dimension = token.index_dimension();
    if index_dimension > 3 {
        return Err(ShaderError::bytecode(
            at,
            BytecodeErrorKind::IndexDimension {
                dim: index_dimension,
            },
        ));
    }
    let operand_type = OperandType::from_raw(raw_type).ok_or_else(|| {
        ShaderError::bytecode(at, BytecodeErrorKind::OperandTypeOutOfRange { ty: raw_type })
    })?;

    let mut immediates = [0u32; 4];
    let mut immediate_count = 0;
    if operand_type.is_immediate() {
        immediate_count = num_components.count();
        for slot in immediates.iter_mut().take(immediate_count) {
            *slot = match operand_type {
                // Only the low word is kept.
                OperandType::Immediate64 => r.read_u64()? as u32,
                _ => r.read_u32()?,
            };
        }
    }

    let mut indices = [None; 2];
    for (dim, slot) in indices
        .iter_mut()
        .enumerate()
        .take(index_dimension as usize)
    {
        *slot = Some(decode_index(r, token, dim)?);
    }

    Ok(Operand {
        operand_type,
        num_components,
        selection_mode,
        mask: token.mask(),
        index_dimension,
        indices,
        immediates,
        immediate_count,
    })
}

fn decode_index(r: &mut TokenReader<'_>, token: OperandToken, dim: usize) -> Result<OperandIndex> {
    let raw = token.index_representation(dim);
    let representation = IndexRepresentation::from_raw(raw).ok_or_else(|| {
        ShaderError::bytecode(
            r.position(),
            BytecodeErrorKind::IndexRepresentation { rep: raw },
        )
    })?;
    r.require(representation.token_count())?;

    let values = match representation {
        IndexRepresentation::Immediate32 | IndexRepresentation::Relative => {
            [u64::from(r.read_u32()?), 0]
        }
        IndexRepresentation::Immediate64 => [r.read_u64()?, 0],
        IndexRepresentation::Immediate32PlusRelative => {
            [u64::from(r.read_u32()?), u64::from(r.read_u32()?)]
        }
        IndexRepresentation::Immediate64PlusRelative => {
            [r.read_u64()?, u64::from(r.read_u32()?)]
        }
    };

    trace!(
        dim,
        representation = diag::index_representation_name(raw),
        value0 = values[0],
        value1 = values[1],
        "operand index"
    );
    Ok(OperandIndex {
        representation,
        values,
    })
}
