use anyhow::{anyhow, Result};
use clap::Parser;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use c28x_rs::bits::{field, Field};
use c28x_rs::decoder::COND_NAMES;

#[derive(Parser, Debug)]
#[command(author, version, about = "Tiny C28x assembler (subset)")]
struct Opts {
    /// Input assembly file (one instruction or directive per line)
    #[arg(short, long)]
    input: PathBuf,
    /// Output binary file (big-endian instruction words)
    #[arg(short, long)]
    output: PathBuf,
    /// Start address (used for label resolution and PC-relative encodings)
    #[arg(long, default_value_t = 0u64)]
    start: u64,
}

#[derive(Debug, Clone)]
enum Item {
    Label(String),
    Instr(Inst),
    Word(u16),
}

#[derive(Debug, Clone)]
enum Inst {
    /// Fixed 16-bit opcodes with no operand fields.
    Bare(u16),
    Sb { cond: u32, target: Target },
    B { target: Target },
    Lcr { ea: u64 },
    Lb { ea: u64 },
    MovbAl { imm8: u32 },
    MovbAh { imm8: u32 },
    RptImm { imm8: u32 },
    Trap { vec: u32 },
}

#[derive(Debug, Clone)]
enum Target {
    Abs(u64),
    Label(String),
}

const REL8: Field = field(0, 8);
const COND_W: Field = field(8, 4);
const REL21: Field = field(0, 21);
const ABS22: Field = field(0, 22);
const LOW8: Field = field(0, 8);
const VEC5: Field = field(0, 5);

const BARE: &[(&str, u16)] = &[
    ("eallow", 0x7622),
    ("edis", 0x761A),
    ("nop", 0x7700),
    ("lret", 0x7605),
    ("lretr", 0x7604),
    ("lreti", 0x0001),
    ("iret", 0x7602),
    ("aborti", 0x0002),
    ("c27obj", 0x7621),
    ("c28obj", 0x7625),
    ("c28addr", 0x7616),
    ("lpaddr", 0x761E),
];

fn parse_num(s: &str) -> Result<u64> {
    let s = s.trim().trim_start_matches('#');
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Ok(u64::from_str_radix(hex, 16)?)
    } else {
        Ok(s.parse::<u64>()?)
    }
}

fn parse_target(s: &str) -> Result<Target> {
    let s = s.trim();
    if s.starts_with(|c: char| c.is_ascii_digit()) {
        Ok(Target::Abs(parse_num(s)?))
    } else {
        Ok(Target::Label(s.to_string()))
    }
}

fn cond_code(name: &str) -> Option<u32> {
    COND_NAMES
        .iter()
        .position(|&n| n == name)
        .map(|i| i as u32)
}

fn parse_line(line: &str) -> Result<Option<Item>> {
    let line = line.split(';').next().unwrap_or("").trim();
    if line.is_empty() {
        return Ok(None);
    }
    if let Some(lbl) = line.strip_suffix(':') {
        return Ok(Some(Item::Label(lbl.trim().to_string())));
    }
    if let Some(rest) = line.strip_prefix(".word") {
        return Ok(Some(Item::Word(parse_num(rest)? as u16)));
    }

    let (mn, rest) = match line.split_once(char::is_whitespace) {
        Some((m, r)) => (m, r.trim()),
        None => (line, ""),
    };
    let mn = mn.to_ascii_lowercase();

    if let Some(&(_, op)) = BARE.iter().find(|&&(n, _)| n == mn) {
        return Ok(Some(Item::Instr(Inst::Bare(op))));
    }
    let inst = match mn.as_str() {
        "push" | "pop" => {
            anyhow::ensure!(rest.eq_ignore_ascii_case("acc"), "{mn}: only acc supported");
            Inst::Bare(if mn == "push" { 0x761D } else { 0x7611 })
        }
        "sb" => {
            let (t, c) = rest
                .split_once(',')
                .ok_or_else(|| anyhow!("sb needs target, cond"))?;
            let cond = cond_code(c.trim())
                .ok_or_else(|| anyhow!("unknown condition {:?}", c.trim()))?;
            Inst::Sb {
                cond,
                target: parse_target(t)?,
            }
        }
        "b" => Inst::B {
            target: parse_target(rest)?,
        },
        "lcr" => Inst::Lcr {
            ea: parse_num(rest)?,
        },
        "lb" => Inst::Lb {
            ea: parse_num(rest)?,
        },
        "movb" => {
            let (r, imm) = rest
                .split_once(',')
                .ok_or_else(|| anyhow!("movb needs reg, #imm8"))?;
            let imm8 = parse_num(imm)? as u32;
            match r.trim().to_ascii_lowercase().as_str() {
                "al" => Inst::MovbAl { imm8 },
                "ah" => Inst::MovbAh { imm8 },
                other => return Err(anyhow!("movb: unsupported register {other:?}")),
            }
        }
        "rpt" => Inst::RptImm {
            imm8: parse_num(rest)? as u32,
        },
        "trap" => Inst::Trap {
            vec: parse_num(rest)? as u32,
        },
        other => return Err(anyhow!("unsupported mnemonic {other:?}")),
    };
    Ok(Some(Item::Instr(inst)))
}

fn size_of(inst: &Inst) -> u64 {
    match inst {
        Inst::B { .. } | Inst::Lcr { .. } | Inst::Lb { .. } => 4,
        _ => 2,
    }
}

fn resolve(t: &Target, labels: &HashMap<String, u64>) -> Result<u64> {
    match t {
        Target::Abs(a) => Ok(*a),
        Target::Label(name) => labels
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("undefined label {name:?}")),
    }
}

fn rel_field(f: Field, end: u64, target: u64) -> Result<u32> {
    let off = target.wrapping_sub(end) as i64;
    let lim = 1i64 << (f.width - 1);
    anyhow::ensure!(
        (-lim..lim).contains(&off),
        "branch offset {off:#x} out of range for {}-bit field",
        f.width
    );
    Ok(f.inject(off as u32))
}

fn encode(inst: &Inst, pc: u64, labels: &HashMap<String, u64>, out: &mut Vec<u8>) -> Result<()> {
    let end = pc + size_of(inst);
    match inst {
        Inst::Bare(op) => out.extend_from_slice(&op.to_be_bytes()),
        Inst::Sb { cond, target } => {
            let w = 0x6000u32 | COND_W.inject(*cond) | rel_field(REL8, end, resolve(target, labels)?)?;
            out.extend_from_slice(&(w as u16).to_be_bytes());
        }
        Inst::B { target } => {
            let w = 0xFFE0_0000u32 | rel_field(REL21, end, resolve(target, labels)?)?;
            out.extend_from_slice(&w.to_be_bytes());
        }
        Inst::Lcr { ea } => {
            let w = 0x7640_0000u32 | ABS22.inject(*ea as u32);
            out.extend_from_slice(&w.to_be_bytes());
        }
        Inst::Lb { ea } => {
            let w = 0x7680_0000u32 | ABS22.inject(*ea as u32);
            out.extend_from_slice(&w.to_be_bytes());
        }
        Inst::MovbAl { imm8 } => {
            let w = 0x9E00u32 | LOW8.inject(*imm8);
            out.extend_from_slice(&(w as u16).to_be_bytes());
        }
        Inst::MovbAh { imm8 } => {
            let w = 0x9F00u32 | LOW8.inject(*imm8);
            out.extend_from_slice(&(w as u16).to_be_bytes());
        }
        Inst::RptImm { imm8 } => {
            let w = 0xF600u32 | LOW8.inject(*imm8);
            out.extend_from_slice(&(w as u16).to_be_bytes());
        }
        Inst::Trap { vec } => {
            let w = 0x0020u32 | VEC5.inject(*vec);
            out.extend_from_slice(&(w as u16).to_be_bytes());
        }
    }
    Ok(())
}

fn assemble(src: &str, start: u64) -> Result<Vec<u8>> {
    let mut items: Vec<Item> = Vec::new();
    for (i, line) in src.lines().enumerate() {
        match parse_line(line) {
            Ok(Some(item)) => items.push(item),
            Ok(None) => {}
            Err(e) => return Err(anyhow!("line {}: {e}", i + 1)),
        }
    }

    // First pass: label addresses
    let mut labels: HashMap<String, u64> = HashMap::new();
    let mut pc = start;
    for item in &items {
        match item {
            Item::Label(name) => {
                anyhow::ensure!(
                    labels.insert(name.clone(), pc).is_none(),
                    "duplicate label {name:?}"
                );
            }
            Item::Instr(inst) => pc += size_of(inst),
            Item::Word(_) => pc += 2,
        }
    }

    // Second pass: encode
    let mut out = Vec::new();
    let mut pc = start;
    for item in &items {
        match item {
            Item::Label(_) => {}
            Item::Instr(inst) => {
                encode(inst, pc, &labels, &mut out)?;
                pc += size_of(inst);
            }
            Item::Word(w) => {
                out.extend_from_slice(&w.to_be_bytes());
                pc += 2;
            }
        }
    }
    Ok(out)
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    let src = fs::read_to_string(&opts.input)?;
    let bytes = assemble(&src, opts.start)?;
    fs::write(&opts.output, &bytes)?;
    println!("wrote {} bytes to {}", bytes.len(), opts.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use c28x_rs::decoder::{read_word32, select, Size};
    use c28x_rs::isa::c28::CATALOG;
    use c28x_rs::ObjectMode;

    #[test]
    fn bare_ops_and_word_directive() {
        let bytes = assemble("eallow\n.word 0x1234 ; data\nnop\n", 0).unwrap();
        assert_eq!(bytes, vec![0x76, 0x22, 0x12, 0x34, 0x77, 0x00]);
    }

    #[test]
    fn backward_and_forward_branches_resolve() {
        let src = "top:\n  nop\n  sb top, neq\n  sb done, unc\n  nop\ndone:\n  lret\n";
        let bytes = assemble(src, 0x100).unwrap();
        // sb top, neq at 0x102: off = 0x100 - 0x104 = -4
        assert_eq!(&bytes[2..4], &[0x60 | 0x00, 0xFC]);
        // sb done, unc at 0x104: off = 0x108 - 0x106 = 2
        assert_eq!(&bytes[4..6], &[0x6F, 0x02]);
    }

    #[test]
    fn long_branch_round_trips_through_decoder() {
        let src = "b 0x114\n";
        let bytes = assemble(src, 0x100).unwrap();
        assert_eq!(read_word32(&bytes), Some(0xFFE0_0010));
        let m = select(CATALOG, &bytes, ObjectMode::C27).unwrap();
        assert_eq!(m.enc.mnemonic, "b");
        assert_eq!(m.size(), Size::Dword.bytes());
    }

    #[test]
    fn branch_range_is_checked() {
        let err = assemble("sb 0x4000, unc\n", 0).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }
}
