//! Names for raw token fields, used only when formatting log events.
//!
//! None of these lookups influence decoding. Out-of-range values map to `"?"`.

use crate::opcode::Opcode;
use crate::operand::OperandType;
use crate::token::ProgramType;

pub fn opcode_name(raw: u32) -> &'static str {
    Opcode::from_raw(raw).map_or("?", Opcode::mnemonic)
}

pub fn operand_type_name(raw: u32) -> &'static str {
    OperandType::from_raw(raw).map_or("?", OperandType::name)
}

pub fn program_type_name(raw: u32) -> &'static str {
    match ProgramType::from_raw(raw) {
        Some(ProgramType::Pixel) => "pixel",
        Some(ProgramType::Vertex) => "vertex",
        Some(ProgramType::Geometry) => "geometry",
        Some(ProgramType::Hull) => "hull",
        Some(ProgramType::Domain) => "domain",
        Some(ProgramType::Compute) => "compute",
        None => "?",
    }
}

pub fn custom_data_class_name(raw: u32) -> &'static str {
    match raw {
        0 => "comment",
        1 => "debuginfo",
        2 => "opaque",
        3 => "dcl_immediate_constant_buffer",
        _ => "?",
    }
}

const SYSTEM_NAMES: [&str; 23] = [
    "undefined",
    "position",
    "clip_distance",
    "cull_distance",
    "render_target_array_index",
    "viewport_array_index",
    "vertex_id",
    "primitive_id",
    "instance_id",
    "is_front_face",
    "sample_index",
    "final_quad_u_eq_0_edge_tessfactor",
    "final_quad_v_eq_0_edge_tessfactor",
    "final_quad_u_eq_1_edge_tessfactor",
    "final_quad_v_eq_1_edge_tessfactor",
    "final_quad_u_inside_tessfactor",
    "final_quad_v_inside_tessfactor",
    "final_tri_u_eq_0_edge_tessfactor",
    "final_tri_v_eq_0_edge_tessfactor",
    "final_tri_w_eq_0_edge_tessfactor",
    "final_tri_inside_tessfactor",
    "final_line_detail_tessfactor",
    "final_line_density_tessfactor",
];

pub fn system_name(raw: u32) -> &'static str {
    SYSTEM_NAMES.get(raw as usize).copied().unwrap_or("?")
}

pub fn num_components_name(raw: u32) -> &'static str {
    match raw {
        0 => "0_component",
        1 => "1_component",
        2 => "4_component",
        3 => "n_component",
        _ => "?",
    }
}

pub fn selection_mode_name(raw: u32) -> &'static str {
    match raw {
        0 => "mask",
        1 => "swizzle",
        2 => "select_1",
        _ => "?",
    }
}

pub fn component_name(raw: u8) -> &'static str {
    match raw {
        0 => "x",
        1 => "y",
        2 => "z",
        3 => "w",
        _ => "?",
    }
}

pub fn index_representation_name(raw: u32) -> &'static str {
    match raw {
        0 => "immediate32",
        1 => "immediate64",
        2 => "relative",
        3 => "immediate32_plus_relative",
        4 => "immediate64_plus_relative",
        _ => "?",
    }
}

pub fn interpolation_mode_name(raw: u32) -> &'static str {
    match raw {
        0 => "undefined",
        1 => "constant",
        2 => "linear",
        3 => "linear_centroid",
        4 => "linear_noperspective",
        5 => "linear_noperspective_centroid",
        6 => "linear_sample",
        7 => "linear_noperspective_sample",
        _ => "?",
    }
}
