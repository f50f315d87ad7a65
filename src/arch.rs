//! Outward-facing architecture entry points: instruction length and
//! control flow, text rendering, and the (stub) lifting hook.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::decoder::{self, Match};
use crate::flow::FlowInfo;
use crate::isa::c28;
use crate::render;
use crate::state::{AddressMode, DecodeState, ObjectMode};
use crate::tokens::Token;

/// Initial compatibility-mode configuration. The default matches the
/// hardware reset state: C27x object compatibility, AMODE0.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ArchConfig {
    pub object_mode: ObjectMode,
    pub address_mode: AddressMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// No encoding matches under the active object mode, or too few
    /// bytes remain for any pattern that would. The caller should mark
    /// the location unknown and advance by the minimal step.
    #[error("no instruction decodes at {addr:#06x}")]
    NoMatch { addr: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LiftError {
    /// Lifting is a reserved interface point; no encoding implements it.
    #[error("no lifter for `{mnemonic}`")]
    Unimplemented { mnemonic: &'static str },
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrInfo {
    pub size: usize,
    pub flow: FlowInfo,
}

/// One decoding context. Safe to share across analysis threads; all
/// mutable mode/repeat state lives in the embedded `DecodeState`.
#[derive(Debug, Default)]
pub struct C28x {
    state: DecodeState,
}

impl C28x {
    pub fn new(cfg: ArchConfig) -> Self {
        Self {
            state: DecodeState::new(cfg.object_mode, cfg.address_mode),
        }
    }

    pub fn state(&self) -> &DecodeState {
        &self.state
    }

    fn decode(&self, data: &[u8], addr: u64) -> Result<Match, DecodeError> {
        decoder::select(c28::CATALOG, data, self.state.object_mode()).ok_or_else(|| {
            trace!(addr, "no encoding matched");
            DecodeError::NoMatch { addr }
        })
    }

    /// Instruction byte length plus control-flow facts. Decoding a mode
    /// change or repeat prefix updates the tracked context here.
    pub fn instruction_info(&self, data: &[u8], addr: u64) -> Result<InstrInfo, DecodeError> {
        let m = self.decode(data, addr)?;
        let flow = m.enc.flow_info(m.word, addr, &self.state);
        Ok(InstrInfo {
            size: m.size(),
            flow,
        })
    }

    /// Instruction byte length plus rendered tokens. Reads the tracked
    /// address mode and repeat set but never mutates them.
    pub fn instruction_text(
        &self,
        data: &[u8],
        addr: u64,
    ) -> Result<(usize, Vec<Token>), DecodeError> {
        let m = self.decode(data, addr)?;
        let repeat = self.state.is_repeat(addr);
        let toks = render::tokens(&m, addr, self.state.address_mode(), repeat);
        Ok((m.size(), toks))
    }

    /// Reserved lifting hook. Decodes, then reports `Unimplemented` for
    /// every encoding; a decode failure here still means the bytes are
    /// not an instruction at all.
    pub fn instruction_il(&self, data: &[u8], addr: u64) -> Result<(), LiftError> {
        let m = self.decode(data, addr)?;
        Err(LiftError::Unimplemented {
            mnemonic: m.enc.mnemonic,
        })
    }
}
