pub mod assemble;
pub mod callnode;
pub mod demo;
pub mod driver;
pub mod error;
pub mod expr;
pub mod instructions;
pub mod kind;
pub mod linearize;
pub mod lower;
pub mod opcode;
pub mod rule;
pub mod serialize;
pub mod state;
pub mod tracer;

pub use callnode::{AssignSource, CallNode, CallTree, OpArg};
pub use driver::{compile, CompiledProgram, Phase, DEFAULT_MAX_ITERATIONS};
pub use error::{CompileError, CompileResult};
pub use expr::{BinOp, Expr, Traced};
pub use kind::{Kind, Literal};
pub use opcode::Instr;
pub use rule::{Rule, RuleList};
pub use state::{TextState, Thread, ThreadHeader};
pub use tracer::{trace, VarTracer};
