//! The closed VGPU10 opcode enumeration and its operand-count table.

use core::fmt;

use self::OperandCount::{Fixed, Special};

/// Number of defined VGPU10 opcodes (`VGPU10_NUM_OPCODES`).
pub const NUM_OPCODES: usize = 218;

/// How many operands follow an opcode token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandCount {
    Fixed(u8),
    /// Length-prefixed payload instead of operands (`customdata`, vendor and reserved opcodes).
    Special,
}

#[derive(Debug, Clone, Copy)]
struct OpcodeInfo {
    operands: OperandCount,
    mnemonic: &'static str,
}

macro_rules! opcodes {
    ($($variant:ident = $operands:expr, $mnemonic:literal;)*) => {
        /// A VGPU10 opcode. The discriminant is the value of the opcode token's low 11 bits.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u16)]
        pub enum Opcode {
            $($variant,)*
        }

        impl Opcode {
            /// Every opcode, in encoding order.
            pub const ALL: [Opcode; NUM_OPCODES] = [$(Opcode::$variant,)*];
        }

        // Sized by `NUM_OPCODES`: adding a variant without a table row (or vice versa) fails to
        // compile.
        static OPCODE_INFO: [OpcodeInfo; NUM_OPCODES] = [
            $(OpcodeInfo { operands: $operands, mnemonic: $mnemonic },)*
        ];
    };
}

opcodes! {
    // Arithmetic, flow control and resource access.
    Add = Fixed(3), "add";
    And = Fixed(3), "and";
    Break = Fixed(0), "break";
    Breakc = Fixed(1), "breakc";
    Call = Fixed(1), "call";
    Callc = Fixed(2), "callc";
    Case = Fixed(1), "case";
    Continue = Fixed(0), "continue";
    Continuec = Fixed(1), "continuec";
    Cut = Fixed(0), "cut";
    Default = Fixed(0), "default";
    DerivRtx = Fixed(2), "deriv_rtx";
    DerivRty = Fixed(2), "deriv_rty";
    Discard = Fixed(1), "discard";
    Div = Fixed(3), "div";
    Dp2 = Fixed(3), "dp2";
    Dp3 = Fixed(3), "dp3";
    Dp4 = Fixed(3), "dp4";
    Else = Fixed(0), "else";
    Emit = Fixed(0), "emit";
    Emitthencut = Fixed(0), "emitthencut";
    Endif = Fixed(0), "endif";
    Endloop = Fixed(0), "endloop";
    Endswitch = Fixed(0), "endswitch";
    Eq = Fixed(3), "eq";
    Exp = Fixed(2), "exp";
    Frc = Fixed(2), "frc";
    Ftoi = Fixed(2), "ftoi";
    Ftou = Fixed(2), "ftou";
    Ge = Fixed(3), "ge";
    Iadd = Fixed(3), "iadd";
    If = Fixed(1), "if";
    Ieq = Fixed(3), "ieq";
    Ige = Fixed(3), "ige";
    Ilt = Fixed(3), "ilt";
    Imad = Fixed(4), "imad";
    Imax = Fixed(3), "imax";
    Imin = Fixed(3), "imin";
    Imul = Fixed(4), "imul";
    Ine = Fixed(3), "ine";
    Ineg = Fixed(2), "ineg";
    Ishl = Fixed(3), "ishl";
    Ishr = Fixed(3), "ishr";
    Itof = Fixed(2), "itof";
    Label = Fixed(1), "label";
    Ld = Fixed(3), "ld";
    LdMs = Fixed(4), "ld_ms";
    Log = Fixed(2), "log";
    Loop = Fixed(0), "loop";
    Lt = Fixed(3), "lt";
    Mad = Fixed(4), "mad";
    Min = Fixed(3), "min";
    Max = Fixed(3), "max";
    Customdata = Special, "customdata";
    Mov = Fixed(2), "mov";
    Movc = Fixed(4), "movc";
    Mul = Fixed(3), "mul";
    Ne = Fixed(3), "ne";
    Nop = Fixed(0), "nop";
    Not = Fixed(2), "not";
    Or = Fixed(3), "or";
    Resinfo = Fixed(3), "resinfo";
    Ret = Fixed(0), "ret";
    Retc = Fixed(1), "retc";
    RoundNe = Fixed(2), "round_ne";
    RoundNi = Fixed(2), "round_ni";
    RoundPi = Fixed(2), "round_pi";
    RoundZ = Fixed(2), "round_z";
    Rsq = Fixed(2), "rsq";
    Sample = Fixed(4), "sample";
    SampleC = Fixed(5), "sample_c";
    SampleCLz = Fixed(5), "sample_c_lz";
    SampleL = Fixed(5), "sample_l";
    SampleD = Fixed(6), "sample_d";
    SampleB = Fixed(5), "sample_b";
    Sqrt = Fixed(2), "sqrt";
    Switch = Fixed(1), "switch";
    Sincos = Fixed(3), "sincos";
    Udiv = Fixed(4), "udiv";
    Ult = Fixed(3), "ult";
    Uge = Fixed(3), "uge";
    Umul = Fixed(4), "umul";
    Umad = Fixed(4), "umad";
    Umax = Fixed(3), "umax";
    Umin = Fixed(3), "umin";
    Ushr = Fixed(3), "ushr";
    Utof = Fixed(2), "utof";
    Xor = Fixed(3), "xor";

    // D3D10 declarations.
    DclResource = Fixed(1), "dcl_resource";
    DclConstantBuffer = Fixed(1), "dcl_constant_buffer";
    DclSampler = Fixed(1), "dcl_sampler";
    DclIndexRange = Fixed(1), "dcl_index_range";
    DclGsOutputPrimitiveTopology = Fixed(0), "dcl_gs_output_primitive_topology";
    DclGsInputPrimitive = Fixed(0), "dcl_gs_input_primitive";
    DclMaxOutputVertexCount = Fixed(0), "dcl_max_output_vertex_count";
    DclInput = Fixed(1), "dcl_input";
    DclInputSgv = Fixed(1), "dcl_input_sgv";
    DclInputSiv = Fixed(1), "dcl_input_siv";
    DclInputPs = Fixed(1), "dcl_input_ps";
    DclInputPsSgv = Fixed(1), "dcl_input_ps_sgv";
    DclInputPsSiv = Fixed(1), "dcl_input_ps_siv";
    DclOutput = Fixed(1), "dcl_output";
    DclOutputSgv = Fixed(1), "dcl_output_sgv";
    DclOutputSiv = Fixed(1), "dcl_output_siv";
    DclTemps = Fixed(0), "dcl_temps";
    DclIndexableTemp = Fixed(0), "dcl_indexable_temp";
    DclGlobalFlags = Fixed(0), "dcl_global_flags";
    Vmware = Special, "vmware";

    // D3D10.1 / D3D11 additions.
    Lod = Fixed(4), "lod";
    Gather4 = Fixed(4), "gather4";
    SamplePos = Fixed(3), "sample_pos";
    SampleInfo = Fixed(2), "sample_info";
    Reserved1 = Special, "reserved1";
    HsDecls = Fixed(0), "hs_decls";
    HsControlPointPhase = Fixed(0), "hs_control_point_phase";
    HsForkPhase = Fixed(0), "hs_fork_phase";
    HsJoinPhase = Fixed(0), "hs_join_phase";
    EmitStream = Fixed(1), "emit_stream";
    CutStream = Fixed(1), "cut_stream";
    EmitthencutStream = Fixed(1), "emitthencut_stream";
    InterfaceCall = Fixed(1), "interface_call";
    Bufinfo = Fixed(2), "bufinfo";
    DerivRtxCoarse = Fixed(2), "deriv_rtx_coarse";
    DerivRtxFine = Fixed(2), "deriv_rtx_fine";
    DerivRtyCoarse = Fixed(2), "deriv_rty_coarse";
    DerivRtyFine = Fixed(2), "deriv_rty_fine";
    Gather4C = Fixed(5), "gather4_c";
    Gather4Po = Fixed(5), "gather4_po";
    Gather4PoC = Fixed(6), "gather4_po_c";
    Rcp = Fixed(2), "rcp";
    F32tof16 = Fixed(2), "f32tof16";
    F16tof32 = Fixed(2), "f16tof32";
    Uaddc = Fixed(4), "uaddc";
    Usubb = Fixed(4), "usubb";
    Countbits = Fixed(2), "countbits";
    FirstbitHi = Fixed(2), "firstbit_hi";
    FirstbitLo = Fixed(2), "firstbit_lo";
    FirstbitShi = Fixed(2), "firstbit_shi";
    Ubfe = Fixed(4), "ubfe";
    Ibfe = Fixed(4), "ibfe";
    Bfi = Fixed(5), "bfi";
    Bfrev = Fixed(2), "bfrev";
    Swapc = Fixed(5), "swapc";

    // D3D11 declarations.
    DclStream = Fixed(1), "dcl_stream";
    DclFunctionBody = Fixed(0), "dcl_function_body";
    DclFunctionTable = Fixed(0), "dcl_function_table";
    DclInterface = Fixed(0), "dcl_interface";
    DclInputControlPointCount = Fixed(0), "dcl_input_control_point_count";
    DclOutputControlPointCount = Fixed(0), "dcl_output_control_point_count";
    DclTessDomain = Fixed(0), "dcl_tess_domain";
    DclTessPartitioning = Fixed(0), "dcl_tess_partitioning";
    DclTessOutputPrimitive = Fixed(0), "dcl_tess_output_primitive";
    DclHsMaxTessfactor = Fixed(0), "dcl_hs_max_tessfactor";
    DclHsForkPhaseInstanceCount = Fixed(0), "dcl_hs_fork_phase_instance_count";
    DclHsJoinPhaseInstanceCount = Fixed(0), "dcl_hs_join_phase_instance_count";
    DclThreadGroup = Fixed(0), "dcl_thread_group";
    DclUavTyped = Fixed(1), "dcl_uav_typed";
    DclUavRaw = Fixed(1), "dcl_uav_raw";
    DclUavStructured = Fixed(1), "dcl_uav_structured";
    DclTgsmRaw = Fixed(1), "dcl_tgsm_raw";
    DclTgsmStructured = Fixed(1), "dcl_tgsm_structured";
    DclResourceRaw = Fixed(1), "dcl_resource_raw";
    DclResourceStructured = Fixed(1), "dcl_resource_structured";

    // UAV and thread-group shared memory access, atomics.
    LdUavTyped = Fixed(3), "ld_uav_typed";
    StoreUavTyped = Fixed(3), "store_uav_typed";
    LdRaw = Fixed(3), "ld_raw";
    StoreRaw = Fixed(3), "store_raw";
    LdStructured = Fixed(4), "ld_structured";
    StoreStructured = Fixed(4), "store_structured";
    AtomicAnd = Fixed(3), "atomic_and";
    AtomicOr = Fixed(3), "atomic_or";
    AtomicXor = Fixed(3), "atomic_xor";
    AtomicCmpStore = Fixed(4), "atomic_cmp_store";
    AtomicIadd = Fixed(3), "atomic_iadd";
    AtomicImax = Fixed(3), "atomic_imax";
    AtomicImin = Fixed(3), "atomic_imin";
    AtomicUmax = Fixed(3), "atomic_umax";
    AtomicUmin = Fixed(3), "atomic_umin";
    ImmAtomicAlloc = Fixed(2), "imm_atomic_alloc";
    ImmAtomicConsume = Fixed(2), "imm_atomic_consume";
    ImmAtomicIadd = Fixed(4), "imm_atomic_iadd";
    ImmAtomicAnd = Fixed(4), "imm_atomic_and";
    ImmAtomicOr = Fixed(4), "imm_atomic_or";
    ImmAtomicXor = Fixed(4), "imm_atomic_xor";
    ImmAtomicExch = Fixed(4), "imm_atomic_exch";
    ImmAtomicCmpExch = Fixed(5), "imm_atomic_cmp_exch";
    ImmAtomicImax = Fixed(4), "imm_atomic_imax";
    ImmAtomicImin = Fixed(4), "imm_atomic_imin";
    ImmAtomicUmax = Fixed(4), "imm_atomic_umax";
    ImmAtomicUmin = Fixed(4), "imm_atomic_umin";
    Sync = Fixed(0), "sync";

    // Double precision and the remaining SM5 additions.
    Dadd = Fixed(3), "dadd";
    Dmax = Fixed(3), "dmax";
    Dmin = Fixed(3), "dmin";
    Dmul = Fixed(3), "dmul";
    Deq = Fixed(3), "deq";
    Dge = Fixed(3), "dge";
    Dlt = Fixed(3), "dlt";
    Dne = Fixed(3), "dne";
    Dmov = Fixed(2), "dmov";
    Dmovc = Fixed(4), "dmovc";
    Dtof = Fixed(2), "dtof";
    Ftod = Fixed(2), "ftod";
    EvalSnapped = Fixed(3), "eval_snapped";
    EvalSampleIndex = Fixed(3), "eval_sample_index";
    EvalCentroid = Fixed(2), "eval_centroid";
    DclGsInstanceCount = Fixed(0), "dcl_gs_instance_count";
    Abort = Fixed(0), "abort";
    DebugBreak = Fixed(0), "debug_break";
    Reserved0 = Fixed(0), "reserved0";
    Ddiv = Fixed(3), "ddiv";
    Dfma = Fixed(4), "dfma";
    Drcp = Fixed(2), "drcp";
    Msad = Fixed(4), "msad";
    Dtoi = Fixed(2), "dtoi";
    Dtou = Fixed(2), "dtou";
    Itod = Fixed(2), "itod";
    Utod = Fixed(2), "utod";
}

impl Opcode {
    pub fn from_raw(raw: u32) -> Option<Opcode> {
        Opcode::ALL.get(raw as usize).copied()
    }

    pub fn raw(self) -> u32 {
        self as u32
    }

    pub fn operand_count(self) -> OperandCount {
        OPCODE_INFO[self as usize].operands
    }

    /// Lowercase assembly mnemonic, for diagnostics.
    pub fn mnemonic(self) -> &'static str {
        OPCODE_INFO[self as usize].mnemonic
    }

    /// Opcodes whose extended bit means "the next token holds the real instruction length".
    pub fn has_extended_length(self) -> bool {
        matches!(
            self,
            Opcode::DclFunctionBody
                | Opcode::DclFunctionTable
                | Opcode::DclInterface
                | Opcode::InterfaceCall
                | Opcode::DclThreadGroup
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_every_opcode_in_order() {
        assert_eq!(Opcode::ALL.len(), NUM_OPCODES);
        assert_eq!(OPCODE_INFO.len(), NUM_OPCODES);
        for (i, op) in Opcode::ALL.iter().enumerate() {
            assert_eq!(op.raw() as usize, i, "{op} is out of order");
            assert_eq!(Opcode::from_raw(i as u32), Some(*op));
        }
        assert_eq!(Opcode::from_raw(NUM_OPCODES as u32), None);
        assert_eq!(Opcode::from_raw(0x7ff), None);
    }

    #[test]
    fn exactly_three_special_opcodes() {
        let special: Vec<_> = Opcode::ALL
            .iter()
            .copied()
            .filter(|op| op.operand_count() == OperandCount::Special)
            .collect();
        assert_eq!(
            special,
            vec![Opcode::Customdata, Opcode::Vmware, Opcode::Reserved1]
        );
    }

    #[test]
    fn spot_check_encodings() {
        assert_eq!(Opcode::Customdata.raw(), 0x35);
        assert_eq!(Opcode::Mov.raw(), 0x36);
        assert_eq!(Opcode::Ret.raw(), 0x3e);
        assert_eq!(Opcode::DclResource.raw(), 0x58);
        assert_eq!(Opcode::DclInput.raw(), 0x5f);
        assert_eq!(Opcode::DclOutputSiv.raw(), 0x67);
        assert_eq!(Opcode::DclTemps.raw(), 0x68);
        assert_eq!(Opcode::InterfaceCall.raw(), 0x78);
        assert_eq!(Opcode::DclThreadGroup.raw(), 0x9b);
        assert_eq!(Opcode::Sync.raw(), 0xbe);
        assert_eq!(Opcode::Utod.raw(), 0xd9);

        assert_eq!(Opcode::SampleD.operand_count(), Fixed(6));
        assert_eq!(Opcode::ImmAtomicCmpExch.operand_count(), Fixed(5));
        assert_eq!(Opcode::DclInputPsSiv.operand_count(), Fixed(1));
        assert_eq!(Opcode::DclTemps.operand_count(), Fixed(0));
        assert_eq!(Opcode::DclGsInputPrimitive.mnemonic(), "dcl_gs_input_primitive");
        assert_eq!(Opcode::EmitthencutStream.to_string(), "emitthencut_stream");
    }

    #[test]
    fn no_fixed_count_reaches_operand_capacity() {
        for op in Opcode::ALL {
            if let Fixed(n) = op.operand_count() {
                assert!((n as usize) < crate::limits::MAX_OPERANDS, "{op}");
            }
        }
    }
}
