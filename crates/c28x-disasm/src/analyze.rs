use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};

use c28x_rs::flow::{FlowKind, Target};
use c28x_rs::C28x;

use crate::model::{is_mapped, window, Image};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Fallthrough,
    Branch,
    CondBranch,
    Call,
}

#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub from: u64,
    pub to: u64,
    pub kind: EdgeKind,
}

/// Recursive-descent sweep from the entry set, driven entirely by the
/// decoder's control-flow facts. Returns visited addresses, per-address
/// instruction sizes, raw edges, and return sites.
pub fn analyze_entries(
    img: &Image,
    arch: &C28x,
    entries: &[u64],
    max_instr: usize,
) -> (
    HashSet<u64>,
    HashMap<u64, usize>,
    Vec<Edge>,
    HashSet<u64>,
) {
    let mut queue: VecDeque<u64> = VecDeque::new();
    let mut visited: HashSet<u64> = HashSet::new();
    let mut sizes: HashMap<u64, usize> = HashMap::new();
    let mut edges: Vec<Edge> = Vec::new();
    let mut rets: HashSet<u64> = HashSet::new();
    for &e in entries {
        if is_mapped(img, e) {
            queue.push_back(e);
        }
    }
    let mut steps = 0usize;
    while let Some(pc) = queue.pop_front() {
        if steps >= max_instr {
            break;
        }
        if !visited.insert(pc) {
            continue;
        }
        let Some(win) = window(img, pc) else { continue };
        let Ok(info) = arch.instruction_info(win, pc) else {
            continue;
        };
        steps += 1;
        sizes.insert(pc, info.size);
        let ft = pc.wrapping_add(info.size as u64);

        match info.flow.kind {
            FlowKind::Branch {
                target,
                conditional,
            } => {
                if let Target::Absolute(tgt) = target {
                    let kind = if conditional {
                        EdgeKind::CondBranch
                    } else {
                        EdgeKind::Branch
                    };
                    edges.push(Edge {
                        from: pc,
                        to: tgt,
                        kind,
                    });
                    if is_mapped(img, tgt) && !visited.contains(&tgt) {
                        queue.push_back(tgt);
                    }
                }
            }
            FlowKind::Call { target } => {
                if let Target::Absolute(tgt) = target {
                    edges.push(Edge {
                        from: pc,
                        to: tgt,
                        kind: EdgeKind::Call,
                    });
                    if is_mapped(img, tgt) {
                        queue.push_back(tgt);
                    }
                }
            }
            FlowKind::Return => {
                rets.insert(pc);
            }
            FlowKind::Sequential | FlowKind::Trap => {}
        }

        if info.flow.falls_through && is_mapped(img, ft) {
            edges.push(Edge {
                from: pc,
                to: ft,
                kind: EdgeKind::Fallthrough,
            });
            if !visited.contains(&ft) {
                queue.push_back(ft);
            }
        }
    }
    (visited, sizes, edges, rets)
}

#[derive(Debug, Clone, Serialize)]
pub struct Block {
    pub start: u64,
    pub end: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeOut {
    pub from: u64,
    pub to: u64,
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionOut {
    pub entry: u64,
    pub blocks: Vec<u64>,
}
