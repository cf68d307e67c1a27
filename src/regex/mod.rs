//! Pattern compilation: RPN parsing, Thompson NFA construction, and
//! subset-construction DFA. The DFA this module builds is used for
//! internal validation and by the analyzer to detect unreachable/ambiguous
//! lexical rules; the code-emission model forwards pattern *text* to the
//! external renderer rather than the compiled automaton.
pub mod dfa;
pub mod nfa;
pub mod rpn;

pub use dfa::DfaMachine;
pub use nfa::NfaMachine;
pub use rpn::Instr;
