use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use c28x_rs::decoder::read_word16;
use c28x_rs::render::fmt_tokens;
use c28x_rs::tokens::Token;
use c28x_rs::{AddressMode, ArchConfig, C28x, ObjectMode};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Linear-sweep dump of a raw TMS320C28x binary"
)]
struct Opts {
    /// Load address for the binary in target address space
    #[arg(long, default_value_t = 0u64)]
    base: u64,
    /// Skip N bytes at start of file before loading
    #[arg(long, default_value_t = 0usize)]
    skip: usize,
    /// Limit bytes loaded (default: to EOF after --skip)
    #[arg(long)]
    len: Option<usize>,
    /// Start in C28x object mode instead of the C27x reset default
    #[arg(long)]
    c28_obj: bool,
    /// Start with AMODE set (affects loc16/loc32 rendering)
    #[arg(long)]
    amode1: bool,
    /// Emit a JSON array of decoded records instead of text lines
    #[arg(long)]
    json: bool,
    #[arg(value_name = "BINFILE")]
    input: String,
}

#[derive(Debug, serde::Serialize)]
struct Record {
    addr: u64,
    size: usize,
    text: String,
    tokens: Vec<Token>,
}

/// Walk the payload front to back, one record per decode step.
/// Undecodable words become `.word` records with an empty token list,
/// so consumers see every address rather than a silent gap.
fn sweep(arch: &C28x, payload: &[u8], base: u64) -> Vec<Record> {
    let mut records = Vec::new();
    let mut off = 0usize;
    while off < payload.len() {
        let addr = base + off as u64;
        let window = &payload[off..];
        match arch.instruction_text(window, addr) {
            Ok((size, tokens)) => {
                // Apply mode/repeat side effects for the instructions
                // that follow.
                let _ = arch.instruction_info(window, addr);
                records.push(Record {
                    addr,
                    size,
                    text: fmt_tokens(&tokens),
                    tokens,
                });
                off += size;
            }
            Err(_) => {
                let Some(raw) = read_word16(window) else {
                    break;
                };
                records.push(Record {
                    addr,
                    size: 2,
                    text: format!(".word {raw:#06x}"),
                    tokens: Vec::new(),
                });
                off += 2;
            }
        }
    }
    records
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let file = std::fs::read(&opts.input)?;
    anyhow::ensure!(opts.skip <= file.len(), "--skip exceeds file size");
    let mut payload = &file[opts.skip..];
    if let Some(lim) = opts.len {
        anyhow::ensure!(lim <= payload.len(), "--len exceeds remaining file size after skip");
        payload = &payload[..lim];
    }

    let arch = C28x::new(ArchConfig {
        object_mode: if opts.c28_obj {
            ObjectMode::C28
        } else {
            ObjectMode::C27
        },
        address_mode: if opts.amode1 {
            AddressMode::Amode1
        } else {
            AddressMode::Amode0
        },
    });

    let records = sweep(&arch, payload, opts.base);
    if opts.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        for r in &records {
            println!("{:#06x}: {}", r.addr, r.text);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_keeps_undecodable_words_in_the_record_stream() {
        // eallow, an undefined word, nop
        let arch = C28x::default();
        let recs = sweep(&arch, &[0x76, 0x22, 0x00, 0x00, 0x77, 0x00], 0);
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0].text, "eallow");
        assert_eq!((recs[1].addr, recs[1].size), (2, 2));
        assert_eq!(recs[1].text, ".word 0x0000");
        assert!(recs[1].tokens.is_empty());
        assert_eq!(recs[2].addr, 4);
        assert_eq!(recs[2].text, "nop");
    }

    #[test]
    fn sweep_stops_on_a_trailing_odd_byte() {
        let arch = C28x::default();
        let recs = sweep(&arch, &[0x76, 0x22, 0x00], 0);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].text, "eallow");
    }
}
