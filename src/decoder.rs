//! Descriptor model and longest-match selection.
//!
//! Every legal encoding is one `Encoding` record in a static catalog:
//! an opcode bit pattern with its mask, the byte length, which object
//! mode it is legal in, and a closed set of render/control-flow
//! behaviors. Selection walks the catalog in registration order, all
//! 4-byte patterns before any 2-byte pattern: the leading 16 bits of a
//! 4-byte instruction frequently satisfy some unrelated 2-byte mask, so
//! a 2-byte match only stands when no 4-byte pattern claims the bytes.

use thiserror::Error;

use crate::bits::Field;
use crate::flow::{FlowInfo, Target};
use crate::state::{AddressMode, DecodeState, ObjectMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    Word,
    Dword,
}

impl Size {
    pub const fn bytes(self) -> usize {
        match self {
            Size::Word => 2,
            Size::Dword => 4,
        }
    }
}

/// Object-mode legality declared per encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Legal {
    C27Only,
    C28Only,
    Any,
}

impl Legal {
    pub fn permits(self, mode: ObjectMode) -> bool {
        match self {
            Legal::C27Only => mode == ObjectMode::C27,
            Legal::C28Only => mode == ObjectMode::C28,
            Legal::Any => true,
        }
    }

    fn overlaps(self, other: Legal) -> bool {
        self.permits(ObjectMode::C27) && other.permits(ObjectMode::C27)
            || self.permits(ObjectMode::C28) && other.permits(ObjectMode::C28)
    }
}

/// Operand layout entry. Rendering walks this list left to right.
#[derive(Debug, Clone, Copy)]
pub enum Operand {
    /// Fixed register name.
    Reg(&'static str),
    /// Fixed indirect register, `*xar7` style.
    Ind(&'static str),
    /// XARn selected by a 3-bit field.
    Xar(Field),
    /// Indirect XARn selected by a 3-bit field.
    IndXar(Field),
    /// Post-decrement loop counter, `*ar{n}--`.
    ArDec(Field),
    /// 16-bit data access through the addressing-mode byte.
    Loc16(Field),
    /// 32-bit data access through the addressing-mode byte.
    Loc32(Field),
    Imm { field: Field, signed: bool },
    /// `<< #n` attached to the preceding operand.
    ImmShift(Field),
    /// Shift counts stored off by one (`0` encodes `#1`).
    ImmPlusOne(Field),
    /// Hardwired `#0`.
    Imm0,
    /// Condition-code field.
    Cond(Field),
    /// PC-relative target, sign-extended from the field width.
    Rel(Field),
    /// Absolute target.
    Abs(Field),
    /// SETC/CLRC status-bit mask.
    Status(Field),
}

/// Closed set of control-flow behaviors; evaluated instead of virtual
/// dispatch since the encoding set is fixed at build time.
#[derive(Debug, Clone, Copy)]
pub enum Flow {
    Sequential,
    BranchRel(Field),
    BranchAbs(Field),
    BranchInd,
    /// Conditional relative branch. `cond: None` means always
    /// conditional (loop counters); otherwise the field value `unc`
    /// makes the branch unconditional.
    CondBranchRel { off: Field, cond: Option<Field> },
    CallAbs(Field),
    CallInd,
    Return,
    Trap,
    SetObjectMode(ObjectMode),
    SetAddressMode(AddressMode),
    /// RPT prefix: flags the following address as repeat-active.
    RepeatNext,
}

/// Condition-code names, indexed by the 4-bit cond field.
pub const COND_NAMES: [&str; 16] = [
    "neq", "eq", "gt", "geq", "lt", "leq", "hi", "his", "lo", "los", "nov", "ov", "ntc", "tc",
    "nbio", "unc",
];

pub const COND_UNC: u32 = 0xF;

#[derive(Debug)]
pub struct Encoding {
    pub mnemonic: &'static str,
    /// Fixed opcode bits, scoped to `size` bytes.
    pub bits: u32,
    /// Which bits of the word are opcode rather than operand.
    pub mask: u32,
    pub size: Size,
    pub legal: Legal,
    /// Whether the encoding may follow an RPT prefix.
    pub repeatable: bool,
    pub operands: &'static [Operand],
    pub flow: Flow,
}

impl Encoding {
    pub const fn word(mnemonic: &'static str, bits: u16, mask: u16) -> Self {
        Self {
            mnemonic,
            bits: bits as u32,
            mask: mask as u32,
            size: Size::Word,
            legal: Legal::Any,
            repeatable: false,
            operands: &[],
            flow: Flow::Sequential,
        }
    }

    pub const fn dword(mnemonic: &'static str, bits: u32, mask: u32) -> Self {
        Self {
            mnemonic,
            bits,
            mask,
            size: Size::Dword,
            legal: Legal::Any,
            repeatable: false,
            operands: &[],
            flow: Flow::Sequential,
        }
    }

    pub const fn ops(mut self, operands: &'static [Operand]) -> Self {
        self.operands = operands;
        self
    }

    pub const fn flow(mut self, flow: Flow) -> Self {
        self.flow = flow;
        self
    }

    pub const fn legal(mut self, legal: Legal) -> Self {
        self.legal = legal;
        self
    }

    pub const fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    pub fn matches(&self, word: u32) -> bool {
        word & self.mask == self.bits
    }

    /// Control-flow hook. The only core side effects live here: RPT
    /// marks the following address, and the mode-change encodings
    /// overwrite the tracked compatibility flags.
    pub fn flow_info(&self, word: u32, addr: u64, state: &DecodeState) -> FlowInfo {
        let end = addr.wrapping_add(self.size.bytes() as u64);
        match self.flow {
            Flow::Sequential => FlowInfo::sequential(),
            Flow::BranchRel(off) => {
                FlowInfo::branch(Target::Absolute(relative_target(end, off, word)), false)
            }
            Flow::BranchAbs(f) => {
                FlowInfo::branch(Target::Absolute(f.extract(word) as u64), false)
            }
            Flow::BranchInd => FlowInfo::branch(Target::Indirect, false),
            Flow::CondBranchRel { off, cond } => {
                let conditional = cond.map_or(true, |c| c.extract(word) != COND_UNC);
                FlowInfo::branch(
                    Target::Absolute(relative_target(end, off, word)),
                    conditional,
                )
            }
            Flow::CallAbs(f) => FlowInfo::call(Target::Absolute(f.extract(word) as u64)),
            Flow::CallInd => FlowInfo::call(Target::Indirect),
            Flow::Return => FlowInfo::ret(),
            Flow::Trap => FlowInfo::trap(),
            Flow::SetObjectMode(mode) => {
                state.set_object_mode(mode);
                FlowInfo::sequential()
            }
            Flow::SetAddressMode(mode) => {
                state.set_address_mode(mode);
                FlowInfo::sequential()
            }
            Flow::RepeatNext => {
                state.mark_repeat(end);
                FlowInfo::sequential()
            }
        }
    }
}

/// Relative targets are computed from the address past the instruction.
pub fn relative_target(end: u64, off: Field, word: u32) -> u64 {
    end.wrapping_add(off.extract_signed(word) as i64 as u64)
}

#[derive(Debug, Clone, Copy)]
pub struct Match {
    pub enc: &'static Encoding,
    pub word: u32,
}

impl Match {
    pub fn size(&self) -> usize {
        self.enc.size.bytes()
    }
}

/// Instruction words are stored big-endian.
pub fn read_word16(data: &[u8]) -> Option<u16> {
    Some(u16::from_be_bytes([*data.first()?, *data.get(1)?]))
}

pub fn read_word32(data: &[u8]) -> Option<u32> {
    Some(u32::from_be_bytes([
        *data.first()?,
        *data.get(1)?,
        *data.get(2)?,
        *data.get(3)?,
    ]))
}

/// Find the encoding governing `data` under the active object mode.
///
/// All 4-byte patterns are tried before any 2-byte pattern; within a
/// length class the first registered match wins. With fewer than 4
/// bytes available the 4-byte patterns fail closed rather than reading
/// past the buffer.
pub fn select(
    catalog: &'static [Encoding],
    data: &[u8],
    mode: ObjectMode,
) -> Option<Match> {
    let w16 = read_word16(data)? as u32;
    if let Some(w32) = read_word32(data) {
        for enc in catalog.iter().filter(|e| e.size == Size::Dword) {
            if enc.legal.permits(mode) && enc.matches(w32) {
                return Some(Match { enc, word: w32 });
            }
        }
    }
    catalog
        .iter()
        .filter(|e| e.size == Size::Word)
        .find(|e| e.legal.permits(mode) && e.matches(w16))
        .map(|enc| Match { enc, word: w16 })
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("`{mnemonic}` has fixed bits {bits:#010x} outside its mask {mask:#010x}")]
    StrayBits {
        mnemonic: &'static str,
        bits: u32,
        mask: u32,
    },
    #[error("`{a}` and `{b}` both match word {witness:#010x}")]
    Ambiguous {
        a: &'static str,
        b: &'static str,
        witness: u32,
    },
}

/// Catalog construction invariants: fixed bits lie inside the mask, and
/// no two same-length encodings with intersecting legal modes can match
/// the same word. Checked pairwise over the shared mask bits; brute
/// enumeration of the word space is never needed.
pub fn validate(catalog: &[Encoding]) -> Result<(), CatalogError> {
    for enc in catalog {
        if enc.bits & enc.mask != enc.bits {
            return Err(CatalogError::StrayBits {
                mnemonic: enc.mnemonic,
                bits: enc.bits,
                mask: enc.mask,
            });
        }
    }
    for (i, a) in catalog.iter().enumerate() {
        for b in &catalog[i + 1..] {
            if a.size != b.size || !a.legal.overlaps(b.legal) {
                continue;
            }
            let shared = a.mask & b.mask;
            if a.bits & shared == b.bits & shared {
                return Err(CatalogError::Ambiguous {
                    a: a.mnemonic,
                    b: b.mnemonic,
                    witness: a.bits | b.bits,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::field;

    #[test]
    fn words_read_big_endian() {
        assert_eq!(read_word16(&[0x76, 0x22]), Some(0x7622));
        assert_eq!(read_word32(&[0xFF, 0xE0, 0x00, 0x10]), Some(0xFFE0_0010));
        assert_eq!(read_word16(&[0x76]), None);
        assert_eq!(read_word32(&[0xFF, 0xE0, 0x00]), None);
    }

    #[test]
    fn validate_rejects_stray_fixed_bits() {
        let bad = [Encoding::word("bogus", 0x1234, 0x0F00)];
        assert_eq!(
            validate(&bad),
            Err(CatalogError::StrayBits {
                mnemonic: "bogus",
                bits: 0x1234,
                mask: 0x0F00,
            })
        );
    }

    #[test]
    fn validate_rejects_same_length_overlap() {
        let bad = [
            Encoding::word("a", 0x1200, 0xFF00),
            Encoding::word("b", 0x1230, 0xFFF0),
        ];
        assert!(matches!(
            validate(&bad),
            Err(CatalogError::Ambiguous { a: "a", b: "b", .. })
        ));
    }

    #[test]
    fn validate_allows_mode_disjoint_overlap() {
        let ok = [
            Encoding::word("a", 0x1200, 0xFF00).legal(Legal::C27Only),
            Encoding::word("b", 0x1200, 0xFF00).legal(Legal::C28Only),
        ];
        assert_eq!(validate(&ok), Ok(()));
    }

    #[test]
    fn validate_allows_cross_length_overlap() {
        let ok = [
            Encoding::word("short", 0x1200, 0xFF00),
            Encoding::dword("long", 0x1200_0000, 0xFF00_0000),
        ];
        assert_eq!(validate(&ok), Ok(()));
    }

    #[test]
    fn relative_target_sign_extends() {
        let off = field(0, 8);
        assert_eq!(relative_target(0x104, off, 0x6010), 0x114);
        assert_eq!(relative_target(0x104, off, 0x60F0), 0x104 - 16);
    }
}
