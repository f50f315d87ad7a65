//! TMS320C28x opcode catalog (representative production slice).
//!
//! One `Encoding` record per concrete bit pattern, in registration
//! order. The map is deliberately irregular, like the part: full-word
//! system opcodes sit inside the `0x76xx` block, the `loc16` ALU ops
//! claim whole upper bytes, and several 32-bit families share their
//! leading 16 bits with unrelated short encodings (`0xFFE0____` long
//! branches vs the `0xFFEx` shift group), which is exactly why the
//! selector must try 4-byte patterns first.
//!
//! Catalog invariants are checked by `decoder::validate`: fixed bits
//! inside the mask, and no same-length, mode-overlapping collisions.

use crate::bits::{field, Field};
use crate::decoder::{Encoding, Flow, Legal, Operand::*};
use crate::state::{AddressMode, ObjectMode};

const LOW8: Field = field(0, 8);
const IMM7: Field = field(0, 7);
const SH4: Field = field(0, 4);
const VEC5: Field = field(0, 5);
const REL8: Field = field(0, 8);
const COND_W: Field = field(8, 4);
const XARN_W: Field = field(8, 3);
const XARN_LO: Field = field(0, 3);

const IMM16: Field = field(0, 16);
const REL16: Field = field(0, 16);
const REL21: Field = field(0, 21);
const ABS22: Field = field(0, 22);
const LOC_D: Field = field(16, 8);
const SHFT_D: Field = field(16, 4);
const COND_D: Field = field(16, 4);
const ARN_D: Field = field(16, 3);
const XARN_D: Field = field(16, 3);

pub static CATALOG: &[Encoding] = &[
    // ----- 32-bit encodings -----
    // Long branch family: 11 fixed bits, 21-bit signed displacement.
    Encoding::dword("b", 0xFFE0_0000, 0xFFE0_0000)
        .ops(&[Rel(REL21)])
        .flow(Flow::BranchRel(REL21)),
    Encoding::dword("mov", 0xFF20_0000, 0xFFF0_0000).ops(&[
        Reg("acc"),
        Imm {
            field: IMM16,
            signed: false,
        },
        ImmShift(SHFT_D),
    ]),
    Encoding::dword("bf", 0x5600_0000, 0xFFF0_0000)
        .ops(&[Rel(REL16), Cond(COND_D)])
        .flow(Flow::CondBranchRel {
            off: REL16,
            cond: Some(COND_D),
        }),
    Encoding::dword("banz", 0x5800_0000, 0xFFF8_0000)
        .ops(&[Rel(REL16), ArDec(ARN_D)])
        .flow(Flow::CondBranchRel {
            off: REL16,
            cond: None,
        }),
    Encoding::dword("lcr", 0x7640_0000, 0xFFC0_0000)
        .ops(&[Abs(ABS22)])
        .flow(Flow::CallAbs(ABS22)),
    Encoding::dword("lb", 0x7680_0000, 0xFFC0_0000)
        .ops(&[Abs(ABS22)])
        .flow(Flow::BranchAbs(ABS22)),
    // C27x long call; re-mapped in the C28x object map.
    Encoding::dword("lc", 0x76C0_0000, 0xFFC0_0000)
        .legal(Legal::C27Only)
        .ops(&[Abs(ABS22)])
        .flow(Flow::CallAbs(ABS22)),
    Encoding::dword("movw", 0x761F_0000, 0xFFFF_0000).ops(&[
        Reg("dp"),
        Imm {
            field: IMM16,
            signed: false,
        },
    ]),
    Encoding::dword("movl", 0x8D00_0000, 0xFFF8_0000).ops(&[
        Xar(XARN_D),
        Imm {
            field: IMM16,
            signed: false,
        },
    ]),
    Encoding::dword("mov", 0x2800_0000, 0xFF00_0000)
        .ops(&[
            Loc16(LOC_D),
            Imm {
                field: IMM16,
                signed: false,
            },
        ])
        .repeatable(),
    Encoding::dword("and", 0x1800_0000, 0xFF00_0000).ops(&[
        Loc16(LOC_D),
        Imm {
            field: IMM16,
            signed: false,
        },
    ]),
    Encoding::dword("or", 0x1A00_0000, 0xFF00_0000).ops(&[
        Loc16(LOC_D),
        Imm {
            field: IMM16,
            signed: false,
        },
    ]),
    Encoding::dword("cmp", 0x1B00_0000, 0xFF00_0000).ops(&[
        Loc16(LOC_D),
        Imm {
            field: IMM16,
            signed: false,
        },
    ]),
    Encoding::dword("xor", 0x1C00_0000, 0xFF00_0000).ops(&[
        Loc16(LOC_D),
        Imm {
            field: IMM16,
            signed: false,
        },
    ]),
    // ----- 16-bit encodings -----
    // System block and returns.
    Encoding::word("lreti", 0x0001, 0xFFFF)
        .legal(Legal::C28Only)
        .flow(Flow::Return),
    Encoding::word("aborti", 0x0002, 0xFFFF),
    Encoding::word("trap", 0x0020, 0xFFE0)
        .ops(&[Imm {
            field: VEC5,
            signed: false,
        }])
        .flow(Flow::Trap),
    Encoding::word("iret", 0x7602, 0xFFFF).flow(Flow::Return),
    Encoding::word("lretr", 0x7604, 0xFFFF)
        .legal(Legal::C28Only)
        .flow(Flow::Return),
    Encoding::word("lret", 0x7605, 0xFFFF).flow(Flow::Return),
    Encoding::word("pop", 0x7611, 0xFFFF).ops(&[Reg("acc")]),
    Encoding::word("c28addr", 0x7616, 0xFFFF).flow(Flow::SetAddressMode(AddressMode::Amode0)),
    Encoding::word("edis", 0x761A, 0xFFFF),
    Encoding::word("push", 0x761D, 0xFFFF).ops(&[Reg("acc")]),
    Encoding::word("lpaddr", 0x761E, 0xFFFF).flow(Flow::SetAddressMode(AddressMode::Amode1)),
    Encoding::word("c27obj", 0x7621, 0xFFFF).flow(Flow::SetObjectMode(ObjectMode::C27)),
    Encoding::word("eallow", 0x7622, 0xFFFF),
    Encoding::word("c28obj", 0x7625, 0xFFFF).flow(Flow::SetObjectMode(ObjectMode::C28)),
    Encoding::word("lb", 0x7627, 0xFFFF)
        .ops(&[Ind("xar7")])
        .flow(Flow::BranchInd),
    Encoding::word("nop", 0x7700, 0xFFFF).repeatable(),
    // ACC unary and shift-by-immediate group.
    Encoding::word("neg", 0xFF54, 0xFFFF).ops(&[Reg("acc")]),
    Encoding::word("not", 0xFF55, 0xFFFF).ops(&[Reg("acc")]),
    Encoding::word("abs", 0xFF56, 0xFFFF).ops(&[Reg("acc")]),
    Encoding::word("lsr", 0xFFC0, 0xFFF0)
        .ops(&[Reg("acc"), ImmPlusOne(SH4)])
        .repeatable(),
    Encoding::word("lsl", 0xFFD0, 0xFFF0)
        .ops(&[Reg("acc"), ImmPlusOne(SH4)])
        .repeatable(),
    // Shares its leading byte with the 32-bit long-branch family.
    Encoding::word("sfr", 0xFFE0, 0xFFF0)
        .ops(&[Reg("acc"), ImmPlusOne(SH4)])
        .repeatable(),
    // Short conditional branch, whole top nibble.
    Encoding::word("sb", 0x6000, 0xF000)
        .ops(&[Rel(REL8), Cond(COND_W)])
        .flow(Flow::CondBranchRel {
            off: REL8,
            cond: Some(COND_W),
        }),
    // loc16/loc32 ALU block, one upper byte each.
    Encoding::word("subl", 0x0300, 0xFF00).ops(&[Reg("acc"), Loc32(LOW8)]),
    Encoding::word("movl", 0x0600, 0xFF00).ops(&[Reg("acc"), Loc32(LOW8)]),
    Encoding::word("addl", 0x0700, 0xFF00).ops(&[Reg("acc"), Loc32(LOW8)]),
    Encoding::word("inc", 0x0A00, 0xFF00).ops(&[Loc16(LOW8)]).repeatable(),
    Encoding::word("dec", 0x0B00, 0xFF00).ops(&[Loc16(LOW8)]).repeatable(),
    Encoding::word("movl", 0x1E00, 0xFF00)
        .ops(&[Loc32(LOW8), Reg("acc")])
        .repeatable(),
    // Same bits, different instruction per object map.
    Encoding::word("mov", 0x2400, 0xFF00)
        .legal(Legal::C27Only)
        .ops(&[Reg("t"), Loc16(LOW8)]),
    Encoding::word("clrc", 0x2900, 0xFF00).ops(&[Status(LOW8)]),
    Encoding::word("mov", 0x2B00, 0xFF00)
        .ops(&[Loc16(LOW8), Imm0])
        .repeatable(),
    Encoding::word("mov", 0x2D00, 0xFF00)
        .legal(Legal::C28Only)
        .ops(&[Reg("t"), Loc16(LOW8)]),
    Encoding::word("setc", 0x3B00, 0xFF00).ops(&[Status(LOW8)]),
    Encoding::word("lcr", 0x3E60, 0xFFF8)
        .ops(&[IndXar(XARN_LO)])
        .flow(Flow::CallInd),
    Encoding::word("cmpb", 0x5200, 0xFF00).ops(&[
        Reg("al"),
        Imm {
            field: LOW8,
            signed: false,
        },
    ]),
    Encoding::word("cmpb", 0x5300, 0xFF00).ops(&[
        Reg("ah"),
        Imm {
            field: LOW8,
            signed: false,
        },
    ]),
    Encoding::word("cmp", 0x5500, 0xFF00).ops(&[Reg("al"), Loc16(LOW8)]),
    Encoding::word("cmp", 0x5900, 0xFF00).ops(&[Reg("ah"), Loc16(LOW8)]),
    Encoding::word("add", 0x8100, 0xFF00).ops(&[Reg("al"), Loc16(LOW8)]),
    Encoding::word("add", 0x8200, 0xFF00).ops(&[Reg("ah"), Loc16(LOW8)]),
    Encoding::word("sub", 0x8500, 0xFF00).ops(&[Reg("al"), Loc16(LOW8)]),
    Encoding::word("sub", 0x8600, 0xFF00).ops(&[Reg("ah"), Loc16(LOW8)]),
    Encoding::word("and", 0x8900, 0xFF00).ops(&[Reg("al"), Loc16(LOW8)]),
    Encoding::word("and", 0x8A00, 0xFF00).ops(&[Reg("ah"), Loc16(LOW8)]),
    Encoding::word("movl", 0x8E00, 0xFF00).ops(&[Reg("xar4"), Loc32(LOW8)]),
    Encoding::word("movl", 0x8F00, 0xFF00).ops(&[Reg("xar5"), Loc32(LOW8)]),
    Encoding::word("mov", 0x9200, 0xFF00).ops(&[Reg("al"), Loc16(LOW8)]),
    Encoding::word("mov", 0x9300, 0xFF00).ops(&[Reg("ah"), Loc16(LOW8)]),
    Encoding::word("mov", 0x9600, 0xFF00)
        .ops(&[Loc16(LOW8), Reg("al")])
        .repeatable(),
    Encoding::word("mov", 0x9700, 0xFF00)
        .ops(&[Loc16(LOW8), Reg("ah")])
        .repeatable(),
    Encoding::word("addb", 0x9C00, 0xFF00).ops(&[
        Reg("al"),
        Imm {
            field: LOW8,
            signed: true,
        },
    ]),
    Encoding::word("addb", 0x9D00, 0xFF00).ops(&[
        Reg("ah"),
        Imm {
            field: LOW8,
            signed: true,
        },
    ]),
    Encoding::word("movb", 0x9E00, 0xFF00).ops(&[
        Reg("al"),
        Imm {
            field: LOW8,
            signed: false,
        },
    ]),
    Encoding::word("movb", 0x9F00, 0xFF00).ops(&[
        Reg("ah"),
        Imm {
            field: LOW8,
            signed: false,
        },
    ]),
    Encoding::word("or", 0xC900, 0xFF00).ops(&[Reg("al"), Loc16(LOW8)]),
    Encoding::word("or", 0xCA00, 0xFF00).ops(&[Reg("ah"), Loc16(LOW8)]),
    Encoding::word("xor", 0xEC00, 0xFF00).ops(&[Reg("al"), Loc16(LOW8)]),
    Encoding::word("xor", 0xED00, 0xFF00).ops(&[Reg("ah"), Loc16(LOW8)]),
    // Repeat prefixes.
    Encoding::word("rpt", 0xF600, 0xFF00)
        .ops(&[Imm {
            field: LOW8,
            signed: false,
        }])
        .flow(Flow::RepeatNext),
    Encoding::word("rpt", 0xF700, 0xFF00)
        .ops(&[Loc16(LOW8)])
        .flow(Flow::RepeatNext),
    // Pointer arithmetic.
    Encoding::word("addb", 0xD800, 0xF880).ops(&[
        Xar(XARN_W),
        Imm {
            field: IMM7,
            signed: false,
        },
    ]),
    Encoding::word("subb", 0xD880, 0xF880).ops(&[
        Xar(XARN_W),
        Imm {
            field: IMM7,
            signed: false,
        },
    ]),
    Encoding::word("addb", 0xFE00, 0xFF80).ops(&[
        Reg("sp"),
        Imm {
            field: IMM7,
            signed: false,
        },
    ]),
    Encoding::word("subb", 0xFE80, 0xFF80).ops(&[
        Reg("sp"),
        Imm {
            field: IMM7,
            signed: false,
        },
    ]),
];
