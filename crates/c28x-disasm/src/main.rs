use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

use c28x_rs::render::fmt_tokens;
use c28x_rs::{AddressMode, ArchConfig, C28x, ObjectMode};

mod analyze;
mod model;
use analyze::{analyze_entries, Block, EdgeKind, EdgeOut, FunctionOut};
use model::{load_raw_bin, read_be16, read_u8, window, Image};

#[derive(Parser, Debug)]
#[command(author, version, about = "TMS320C28x disassembler CLI", long_about=None)]
struct Cli {
    /// Load address for the binary in target address space
    #[arg(long, default_value_t = 0u64)]
    base: u64,
    /// Skip N bytes at start of file before loading
    #[arg(long, default_value_t = 0usize)]
    skip: usize,
    /// Input binary path
    #[arg(value_name = "BINFILE")]
    input: String,
    /// Limit bytes loaded (default: to EOF after --skip)
    #[arg(long)]
    len: Option<usize>,
    /// Start in C28x object mode instead of the C27x reset default
    #[arg(long)]
    c28_obj: bool,
    /// Start with AMODE set (affects loc16/loc32 rendering)
    #[arg(long)]
    amode1: bool,
    /// Subcommand
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List loaded segments (simple single-segment for raw .bin)
    Sections,
    /// Disassemble a range [start, end) in bytes
    Range {
        /// Start address (hex or dec)
        start: String,
        /// End address (hex or dec, exclusive)
        end: String,
        /// Show instruction bytes
        #[arg(long)]
        show_bytes: bool,
        /// Write output to file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<String>,
    },
    /// Analyze code graph from entry points
    Analyze {
        /// Entry addresses (hex or dec). Repeat flag to add multiple entries.
        #[arg(long = "entry", value_name = "ADDR", num_args = 1.., required = false)]
        entries: Vec<String>,
        /// Maximum instructions to decode before stopping
        #[arg(long, default_value_t = 100_000usize)]
        max_instr: usize,
        /// Output format: text or json
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Emit a linear disassembly listing of analyzed code (text format only)
        #[arg(long)]
        listing: bool,
        /// Show instruction bytes in listing (text format only)
        #[arg(long)]
        show_bytes: bool,
        /// Import labels from JSON (Vec<{ addr, name }>)
        #[arg(long, value_name = "FILE")]
        labels_in: Option<String>,
        /// Export labels to JSON (Vec<{ addr, name }>)
        #[arg(long, value_name = "FILE")]
        labels_out: Option<String>,
        /// Write analysis output to file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<String>,
    },
}

fn parse_u64(s: &str) -> Result<u64> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Ok(u64::from_str_radix(hex, 16)?)
    } else {
        Ok(s.parse::<u64>()?)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, serde::Serialize)]
struct BlockOut {
    start: u64,
    end: u64,
    insns: Vec<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct LabelKV {
    addr: u64,
    name: String,
}

#[derive(Debug, Clone, serde::Serialize)]
struct ReportWithLabels {
    entries: Vec<u64>,
    blocks: Vec<BlockOut>,
    edges: Vec<EdgeOut>,
    functions: Vec<FunctionOut>,
    labels: Vec<LabelKV>,
}

fn arch_for(cli: &Cli) -> C28x {
    C28x::new(ArchConfig {
        object_mode: if cli.c28_obj {
            ObjectMode::C28
        } else {
            ObjectMode::C27
        },
        address_mode: if cli.amode1 {
            AddressMode::Amode1
        } else {
            AddressMode::Amode0
        },
    })
}

/// Render one instruction line; `.word` fallback on no-match. Returns
/// the byte step to the next line.
fn render_line(
    buf: &mut String,
    img: &Image,
    arch: &C28x,
    pc: u64,
    show_bytes: bool,
) -> Option<usize> {
    use std::fmt::Write as _;
    let win = window(img, pc)?;
    match arch.instruction_text(win, pc) {
        Ok((size, tokens)) => {
            let _ = arch.instruction_info(win, pc); // track mode/repeat state
            if show_bytes {
                let _ = write!(buf, "{pc:#06x}: ");
                for i in 0..size as u64 {
                    let _ = write!(buf, "{:02x} ", read_u8(img, pc + i).unwrap_or(0));
                }
                let _ = writeln!(buf, "  {}", fmt_tokens(&tokens));
            } else {
                let _ = writeln!(buf, "{pc:#06x}: {}", fmt_tokens(&tokens));
            }
            Some(size)
        }
        Err(_) => {
            let raw = read_be16(img, pc)?;
            let _ = writeln!(buf, "{pc:#06x}: .word {raw:#06x}");
            Some(2)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let img = load_raw_bin(Path::new(&cli.input), cli.base, cli.skip, cli.len)?;

    match cli.cmd {
        Command::Sections => {
            println!(
                "{:<10} {:<12} {:<12} {:<6} {:<6}",
                "name", "start", "end", "perms", "kind"
            );
            for s in &img.segments {
                let start = s.base;
                let end = s.base + (s.bytes.len() as u64);
                println!(
                    "{:<10} {start:#010x} {end:#010x} {:<6} {:<6}",
                    s.name, s.perms, s.kind
                );
            }
        }
        Command::Range {
            ref start,
            ref end,
            show_bytes,
            ref out,
        } => {
            let start = parse_u64(start)?;
            let end = parse_u64(end)?;
            anyhow::ensure!(end >= start, "end must be >= start");

            let arch = arch_for(&cli);
            let mut pc = start;
            let mut buf = String::new();
            while pc < end {
                let Some(step) = render_line(&mut buf, &img, &arch, pc, show_bytes) else {
                    use std::fmt::Write as _;
                    let _ = writeln!(buf, "{pc:#06x}: <oob>");
                    break;
                };
                pc = pc.wrapping_add(step as u64);
            }
            if let Some(path) = out {
                std::fs::write(path, buf)?;
            } else {
                print!("{}", buf);
            }
        }
        Command::Analyze {
            ref entries,
            max_instr,
            format,
            listing,
            show_bytes,
            ref labels_in,
            ref labels_out,
            ref out,
        } => {
            // default seed: start of first segment
            let mut seeds: Vec<u64> = if entries.is_empty() {
                img.segments.first().map(|s| s.base).into_iter().collect()
            } else {
                let mut v = Vec::new();
                for e in entries {
                    v.push(parse_u64(e)?);
                }
                v
            };
            seeds.sort_unstable();
            seeds.dedup();
            let arch = arch_for(&cli);
            let (visited, sizes, edges, rets) = analyze_entries(&img, &arch, &seeds, max_instr);

            // Compute block starts: entries + all edge destinations
            let mut block_starts: HashSet<u64> = seeds.iter().copied().collect();
            for e in &edges {
                block_starts.insert(e.to);
            }

            // Build blocks by linear sweep from each start until next start/unknown
            let mut starts: Vec<u64> = block_starts.into_iter().collect();
            starts.sort_unstable();
            let mut blocks: Vec<Block> = Vec::new();
            let mut addr_to_block: HashMap<u64, u64> = HashMap::new(); // pc -> block start
            for &start in &starts {
                if !visited.contains(&start) {
                    continue;
                }
                if addr_to_block.contains_key(&start) {
                    continue;
                }
                let mut cur = start;
                loop {
                    let Some(&sz) = sizes.get(&cur) else { break };
                    let next = cur.wrapping_add(sz as u64);
                    // Close the block after an unconditional branch or return.
                    let is_uncond = edges
                        .iter()
                        .any(|e| e.from == cur && matches!(e.kind, EdgeKind::Branch));
                    let is_ret = rets.contains(&cur);
                    let should_end = is_uncond
                        || is_ret
                        || !visited.contains(&next)
                        || starts.binary_search(&next).is_ok();
                    if should_end {
                        let end = next;
                        blocks.push(Block { start, end });
                        let mut pc = start;
                        while pc < end {
                            addr_to_block.insert(pc, start);
                            if let Some(&ss) = sizes.get(&pc) {
                                pc = pc.wrapping_add(ss as u64);
                            } else {
                                break;
                            }
                        }
                        break;
                    } else {
                        cur = next;
                    }
                }
            }

            // Normalize edges to block-level
            let mut edges_out: Vec<EdgeOut> = Vec::new();
            for e in &edges {
                let from_block = *addr_to_block.get(&e.from).unwrap_or(&e.from);
                let to_block = starts.iter().copied().find(|&s| s == e.to).unwrap_or(e.to);
                let kind = match e.kind {
                    EdgeKind::Fallthrough => "ft",
                    EdgeKind::Branch => "br",
                    EdgeKind::CondBranch => "cbr",
                    EdgeKind::Call => "call",
                }
                .to_string();
                edges_out.push(EdgeOut {
                    from: from_block,
                    to: to_block,
                    kind,
                });
            }

            // Functions: treat each seed as a root and collect reachable block starts
            let mut functions: Vec<FunctionOut> = Vec::new();
            let mut adj: HashMap<u64, Vec<u64>> = HashMap::new();
            for e in &edges_out {
                adj.entry(e.from).or_default().push(e.to);
            }
            for &entry in &seeds {
                let entry_block = starts.iter().copied().find(|&s| s == entry).unwrap_or(entry);
                let mut seen: HashSet<u64> = HashSet::new();
                let mut q = VecDeque::new();
                q.push_back(entry_block);
                while let Some(b) = q.pop_front() {
                    if !seen.insert(b) {
                        continue;
                    }
                    if let Some(nexts) = adj.get(&b) {
                        for &n in nexts {
                            q.push_back(n);
                        }
                    }
                }
                let mut blks: Vec<u64> = seen.into_iter().collect();
                blks.sort_unstable();
                functions.push(FunctionOut {
                    entry: entry_block,
                    blocks: blks,
                });
            }

            // Prepare labels (imported or autogenerated)
            let mut labels: HashMap<u64, String> = HashMap::new();
            if let Some(path) = labels_in {
                if let Ok(txt) = std::fs::read_to_string(path) {
                    if let Ok(v) = serde_json::from_str::<Vec<LabelKV>>(&txt) {
                        for kv in v {
                            labels.insert(kv.addr, kv.name);
                        }
                    }
                }
            }
            for &e in &seeds {
                labels.entry(e).or_insert_with(|| format!("sub_{e:06x}"));
            }
            for b in &blocks {
                labels
                    .entry(b.start)
                    .or_insert_with(|| format!("loc_{:06x}", b.start));
            }

            match format {
                OutputFormat::Json => {
                    let report_blocks =
                        enrich_blocks_with_text(&img, &arch_for(&cli), &blocks, show_bytes);
                    if let Some(outp) = labels_out {
                        let mut arr: Vec<LabelKV> = Vec::new();
                        for (addr, name) in &labels {
                            arr.push(LabelKV {
                                addr: *addr,
                                name: name.clone(),
                            });
                        }
                        let _ =
                            std::fs::write(outp, serde_json::to_string_pretty(&arr).unwrap_or_default());
                    }
                    let mut lbl_vec: Vec<LabelKV> = labels
                        .iter()
                        .map(|(k, v)| LabelKV {
                            addr: *k,
                            name: v.clone(),
                        })
                        .collect();
                    lbl_vec.sort_by_key(|kv| kv.addr);
                    let report = ReportWithLabels {
                        entries: seeds.clone(),
                        blocks: report_blocks,
                        edges: edges_out,
                        functions,
                        labels: lbl_vec,
                    };
                    let json = serde_json::to_string_pretty(&report)?;
                    if let Some(path) = out {
                        std::fs::write(path, json)?;
                    } else {
                        println!("{}", json);
                    }
                }
                OutputFormat::Text => {
                    println!("Analysis summary:");
                    println!(
                        "  entries   : {:?}",
                        seeds.iter().map(|a| format!("{a:#06x}")).collect::<Vec<_>>()
                    );
                    println!("  insts     : {}", visited.len());
                    println!("  blocks    : {}", blocks.len());
                    println!("  edges     : {}", edges.len());
                    println!("  functions : {}", functions.len());
                    println!("Edges:");
                    for e in &edges_out {
                        println!("  {:#06x} -> {:#06x} ({})", e.from, e.to, e.kind);
                    }
                    if listing {
                        let mut pcs: Vec<u64> = visited.iter().copied().collect();
                        pcs.sort_unstable();
                        // Re-decode from a fresh context in address order.
                        // OBJMODE/AMODE changes therefore apply in listing
                        // order, which can differ from the order the
                        // analysis worklist traversed them.
                        let arch = arch_for(&cli);
                        println!("\nListing (analyzed PCs):");
                        let mut buf = String::new();
                        for pc in pcs {
                            if let Some(lbl) = labels.get(&pc) {
                                use std::fmt::Write as _;
                                let _ = writeln!(buf, "{pc:#06x} <{lbl}>:");
                            }
                            let _ = render_line(&mut buf, &img, &arch, pc, show_bytes);
                        }
                        print!("{}", buf);
                    }
                    if let Some(outp) = labels_out {
                        let mut arr: Vec<LabelKV> = Vec::new();
                        for (addr, name) in &labels {
                            arr.push(LabelKV {
                                addr: *addr,
                                name: name.clone(),
                            });
                        }
                        let _ =
                            std::fs::write(outp, serde_json::to_string_pretty(&arr).unwrap_or_default());
                    }
                }
            }
        }
    }

    Ok(())
}

/// Render each block's instructions for the JSON report. Runs on a
/// fresh context in block-sorted order, so mode-change side effects
/// apply in that order rather than the analysis traversal order; mixed
/// OBJMODE/AMODE programs can list under a different mode than the one
/// analysis decoded with.
fn enrich_blocks_with_text(
    img: &Image,
    arch: &C28x,
    blocks: &[Block],
    show_bytes: bool,
) -> Vec<BlockOut> {
    let mut out = Vec::with_capacity(blocks.len());
    for b in blocks {
        let mut lines = String::new();
        let mut pc = b.start;
        while pc < b.end {
            let Some(step) = render_line(&mut lines, img, arch, pc, show_bytes) else {
                break;
            };
            pc = pc.wrapping_add(step as u64);
        }
        out.push(BlockOut {
            start: b.start,
            end: b.end,
            insns: lines.lines().map(str::to_owned).collect(),
        });
    }
    out
}
