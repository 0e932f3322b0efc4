//! The linear opcode stream (spec §3 "Opcode stream", §4.D/§4.E).
//!
//! `Instr` is the flattened, ordered instruction the Linearizer (§4.D) and
//! Expression Lowering (§4.E) produce and the Assembler (§4.F) consumes.
//! Every variant corresponds to one entry in the SPEC_FULL §4 opcode
//! ledger; opcodes with no dedicated variant (the domain/FEN/board family,
//! plus the lower-level control-flow primitives a traced program can invoke
//! directly) fall through to `Opaque`, mirroring how the original
//! `linearize_tree`'s final `elif op in [...]: instructions.append((op,
//! *args))` branch handles everything not given bespoke treatment.

use crate::callnode::OpArg;

/// One instruction in the linear opcode stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    PushInt(u32),
    PushStr(String),
    Lookup(String),
    IndirectLookup,
    AssignPop(String),

    Eq,
    Neq,
    IsAny(Vec<String>),

    BooleanNot,
    BooleanAnd,
    BooleanOr,

    ToUnary,
    FromUnary,
    AddUnary,
    SubUnary,
    Mod2Unary,
    GreaterThan,
    LessThan,
    GreaterEqualThan,
    LessEqualThan,

    BinaryAdd,
    BinarySubtract,
    StringCat,

    Fen,

    Cond(String),
    Pause(String),
    Reactivate(String),

    /// Everything else: opaque domain opcodes and direct control-flow /
    /// list-utility calls, carried through verbatim with their build-time
    /// arguments (spec §4.D, last bullet).
    Opaque(String, Vec<OpArg>),
}

impl Instr {
    /// The opcode name as it appears in the Instruction Library (used for
    /// error messages and for dispatch in the Assembler).
    pub fn name(&self) -> String {
        match self {
            Instr::PushInt(_) => "push_int".to_string(),
            Instr::PushStr(_) => "push_str".to_string(),
            Instr::Lookup(_) => "lookup".to_string(),
            Instr::IndirectLookup => "indirect_lookup".to_string(),
            Instr::AssignPop(_) => "assign_pop".to_string(),
            Instr::Eq => "eq".to_string(),
            Instr::Neq => "neq".to_string(),
            Instr::IsAny(_) => "isany".to_string(),
            Instr::BooleanNot => "boolean_not".to_string(),
            Instr::BooleanAnd => "boolean_and".to_string(),
            Instr::BooleanOr => "boolean_or".to_string(),
            Instr::ToUnary => "to_unary".to_string(),
            Instr::FromUnary => "from_unary".to_string(),
            Instr::AddUnary => "add_unary".to_string(),
            Instr::SubUnary => "sub_unary".to_string(),
            Instr::Mod2Unary => "mod2_unary".to_string(),
            Instr::GreaterThan => "greater_than".to_string(),
            Instr::LessThan => "less_than".to_string(),
            Instr::GreaterEqualThan => "greater_equal_than".to_string(),
            Instr::LessEqualThan => "less_equal_than".to_string(),
            Instr::BinaryAdd => "binary_add".to_string(),
            Instr::BinarySubtract => "binary_subtract".to_string(),
            Instr::StringCat => "string_cat".to_string(),
            Instr::Fen => "fen".to_string(),
            Instr::Cond(_) => "cond".to_string(),
            Instr::Pause(_) => "pause".to_string(),
            Instr::Reactivate(_) => "reactivate".to_string(),
            Instr::Opaque(name, _) => name.clone(),
        }
    }
}
