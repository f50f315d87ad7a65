pub mod arch;
pub mod bits;
pub mod decoder;
pub mod flow;
pub mod render;
pub mod state;
pub mod tokens;

pub mod isa {
    pub mod c28; // TMS320C28x opcode catalog
}

pub use arch::{ArchConfig, C28x, DecodeError, InstrInfo, LiftError};
pub use state::{AddressMode, DecodeState, ObjectMode};
