//! Token rendering for decoded instructions.
//!
//! The `loc16`/`loc32` addressing byte is the one operand whose reading
//! depends on AMODE: direct references resolve against a 6-bit DP page
//! under AMODE0 and a 7-bit page under AMODE1, and the stack-relative
//! form only exists in the AMODE0 map.

use crate::bits::Field;
use crate::decoder::{relative_target, Match, Operand, COND_NAMES};
use crate::state::{AddressMode, Status};
use crate::tokens::Token;

/// Render an instruction as an ordered token sequence. `repeat_active`
/// reflects whether the instruction's address carries an RPT marker;
/// repeatable encodings render with the `||` prefix there.
pub fn tokens(m: &Match, addr: u64, amode: AddressMode, repeat_active: bool) -> Vec<Token> {
    let enc = m.enc;
    let end = addr.wrapping_add(m.size() as u64);
    let mut out = Vec::new();
    if repeat_active && enc.repeatable {
        out.push(Token::text("|| "));
    }
    out.push(Token::mnemonic(enc.mnemonic));
    let mut seen_operand = false;
    for op in enc.operands {
        if matches!(op, Operand::ImmShift(_)) {
            // attaches to the preceding operand, no separator
        } else if seen_operand {
            out.push(Token::separator(", "));
        } else {
            out.push(Token::text(" "));
            seen_operand = true;
        }
        operand_tokens(&mut out, op, m.word, end, amode);
    }
    out
}

/// Flatten a token sequence to plain text.
pub fn fmt_tokens(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect()
}

fn operand_tokens(out: &mut Vec<Token>, op: &Operand, word: u32, end: u64, amode: AddressMode) {
    match *op {
        Operand::Reg(name) => out.push(Token::register(name)),
        Operand::Ind(name) => {
            out.push(Token::text("*"));
            out.push(Token::register(name));
        }
        Operand::Xar(f) => out.push(Token::register(format!("xar{}", f.extract(word)))),
        Operand::IndXar(f) => {
            out.push(Token::text("*"));
            out.push(Token::register(format!("xar{}", f.extract(word))));
        }
        Operand::ArDec(f) => {
            out.push(Token::text("*"));
            out.push(Token::register(format!("ar{}", f.extract(word))));
            out.push(Token::text("--"));
        }
        Operand::Loc16(f) | Operand::Loc32(f) => {
            loc_tokens(out, f.extract(word) as u8, amode);
        }
        Operand::Imm { field, signed } => out.push(Token::immediate(fmt_imm(field, word, signed))),
        Operand::ImmShift(f) => {
            out.push(Token::text(" << "));
            out.push(Token::immediate(format!("#{}", f.extract(word))));
        }
        Operand::ImmPlusOne(f) => {
            out.push(Token::immediate(format!("#{}", f.extract(word) + 1)));
        }
        Operand::Imm0 => out.push(Token::immediate("#0")),
        Operand::Cond(f) => out.push(Token::text(COND_NAMES[f.extract(word) as usize])),
        Operand::Rel(f) => {
            out.push(Token::address(format!("{:#x}", relative_target(end, f, word))));
        }
        Operand::Abs(f) => out.push(Token::address(format!("{:#x}", f.extract(word)))),
        Operand::Status(f) => status_tokens(out, f.extract(word) as u8),
    }
}

fn fmt_imm(field: Field, word: u32, signed: bool) -> String {
    if signed {
        let v = field.extract_signed(word);
        if v < 0 {
            return format!("#-{:#x}", -(v as i64));
        }
        return format!("#{:#x}", v);
    }
    format!("#{:#x}", field.extract(word))
}

fn loc_tokens(out: &mut Vec<Token>, loc: u8, amode: AddressMode) {
    match amode {
        AddressMode::Amode0 => match loc >> 6 {
            0b00 => {
                out.push(Token::text("@"));
                out.push(Token::immediate(format!("{:#x}", loc & 0x3F)));
            }
            0b01 => {
                out.push(Token::text("*-"));
                out.push(Token::register("sp"));
                out.push(Token::text("["));
                out.push(Token::immediate(format!("{:#x}", loc & 0x3F)));
                out.push(Token::text("]"));
            }
            0b10 => indirect_tokens(out, (loc >> 3) & 0x7, loc & 0x7),
            _ => indexed_tokens(out, (loc >> 3) & 0x7, loc & 0x7),
        },
        AddressMode::Amode1 => {
            if loc < 0x80 {
                out.push(Token::text("@@"));
                out.push(Token::immediate(format!("{:#x}", loc & 0x7F)));
            } else if loc < 0xC0 {
                indirect_tokens(out, (loc >> 3) & 0x7, loc & 0x7);
            } else {
                indexed_tokens(out, (loc >> 3) & 0x7, loc & 0x7);
            }
        }
    }
}

fn indirect_tokens(out: &mut Vec<Token>, submode: u8, n: u8) {
    let xar = format!("xar{n}");
    match submode {
        0 => {
            out.push(Token::text("*"));
            out.push(Token::register(xar));
        }
        1 => {
            out.push(Token::text("*"));
            out.push(Token::register(xar));
            out.push(Token::text("++"));
        }
        2 => {
            out.push(Token::text("*--"));
            out.push(Token::register(xar));
        }
        3 => {
            out.push(Token::text("*"));
            out.push(Token::register(xar));
            out.push(Token::text("--"));
        }
        4 => {
            out.push(Token::text("*++"));
            out.push(Token::register(xar));
        }
        _ => {
            let index = match submode {
                5 => "t",
                6 => "ar0",
                _ => "ar1",
            };
            out.push(Token::text("*+"));
            out.push(Token::register(xar));
            out.push(Token::text("["));
            out.push(Token::register(index));
            out.push(Token::text("]"));
        }
    }
}

/// SETC/CLRC operand: the set ST0 bits by name, `|`-joined in bit
/// order. An all-zero mask still has to render something.
fn status_tokens(out: &mut Vec<Token>, mask: u8) {
    let flags = Status::from_bits_truncate(mask);
    if flags.is_empty() {
        out.push(Token::immediate("#0x0"));
        return;
    }
    let mut first = true;
    for (name, _) in flags.iter_names() {
        if !first {
            out.push(Token::text("|"));
        }
        first = false;
        out.push(Token::register(name.to_ascii_lowercase()));
    }
}

fn indexed_tokens(out: &mut Vec<Token>, imm3: u8, n: u8) {
    out.push(Token::text("*+"));
    out.push(Token::register(format!("xar{n}")));
    out.push(Token::text("["));
    out.push(Token::immediate(format!("#{imm3}")));
    out.push(Token::text("]"));
}
