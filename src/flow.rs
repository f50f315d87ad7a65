//! Structural control-flow facts reported per decoded instruction.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Absolute(u64),
    Indirect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowKind {
    Sequential,
    Branch { target: Target, conditional: bool },
    Call { target: Target },
    Return,
    /// Software trap: vectors through the interrupt table, resumes after
    /// the trapping instruction.
    Trap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowInfo {
    pub kind: FlowKind,
    pub falls_through: bool,
}

impl FlowInfo {
    pub fn sequential() -> Self {
        Self {
            kind: FlowKind::Sequential,
            falls_through: true,
        }
    }

    pub fn branch(target: Target, conditional: bool) -> Self {
        Self {
            kind: FlowKind::Branch {
                target,
                conditional,
            },
            falls_through: conditional,
        }
    }

    pub fn call(target: Target) -> Self {
        Self {
            kind: FlowKind::Call { target },
            falls_through: true,
        }
    }

    pub fn ret() -> Self {
        Self {
            kind: FlowKind::Return,
            falls_through: false,
        }
    }

    pub fn trap() -> Self {
        Self {
            kind: FlowKind::Trap,
            falls_through: true,
        }
    }

    pub fn is_branch(&self) -> bool {
        matches!(self.kind, FlowKind::Branch { .. })
    }

    pub fn is_call(&self) -> bool {
        matches!(self.kind, FlowKind::Call { .. })
    }

    pub fn is_return(&self) -> bool {
        matches!(self.kind, FlowKind::Return)
    }

    /// Statically known transfer target, if any.
    pub fn target(&self) -> Option<u64> {
        match self.kind {
            FlowKind::Branch {
                target: Target::Absolute(a),
                ..
            }
            | FlowKind::Call {
                target: Target::Absolute(a),
            } => Some(a),
            _ => None,
        }
    }
}
