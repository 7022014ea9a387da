//! Drives one of the three allocator variants through a text trace file and
//! reports program-break growth and final heap-checker output.
//!
//! Trace format: one operation per line, blank lines and `#`-prefixed lines
//! ignored.
//!
//! ```text
//! a <id> <size>     allocate <size> bytes, remember the result under <id>
//! f <id>            free the block previously allocated under <id>
//! r <id> <size>     realloc the block under <id> to <size> bytes
//! ```

use std::collections::HashMap;
use std::fs;

use blockalloc::{Allocator, ExplicitAllocator, ImplicitAllocator, ImplicitCoalescingAllocator, SbrkHeap};
use clap::{Parser, ValueEnum};

#[derive(Copy, Clone, ValueEnum)]
enum Variant {
    Implicit,
    ImplicitCoalescing,
    Explicit,
}

#[derive(Parser)]
#[command(about = "Replay an allocation trace against one of the block allocator variants")]
struct Args {
    /// Path to the trace file.
    #[arg(long)]
    trace: String,

    /// Which allocator design to run the trace against.
    #[arg(long, value_enum, default_value_t = Variant::Explicit)]
    variant: Variant,

    /// Print every heap-checker violation as it's found, not just a summary.
    #[arg(long)]
    verbose: bool,
}

enum Op {
    Alloc { id: String, size: usize },
    Free { id: String },
    Realloc { id: String, size: usize },
}

fn parse_trace(text: &str) -> Vec<Op> {
    let mut ops = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            ["a", id, size] => ops.push(Op::Alloc {
                id: id.to_string(),
                size: size.parse().expect("alloc size must be a number"),
            }),
            ["f", id] => ops.push(Op::Free { id: id.to_string() }),
            ["r", id, size] => ops.push(Op::Realloc {
                id: id.to_string(),
                size: size.parse().expect("realloc size must be a number"),
            }),
            _ => log::warn!("ignoring malformed trace line: {line:?}"),
        }
    }
    ops
}

fn run<A: Allocator>(mut allocator: A, ops: &[Op], verbose: bool) {
    allocator.init().expect("heap provider rejected the initial extension");
    let mut live: HashMap<String, *mut u8> = HashMap::new();

    for op in ops {
        match op {
            Op::Alloc { id, size } => match allocator.alloc(*size) {
                Some(ptr) => {
                    println!("alloc {id} ({size} bytes) -> {ptr:?}");
                    live.insert(id.clone(), ptr);
                }
                None => println!("alloc {id} ({size} bytes) -> FAILED"),
            },
            Op::Free { id } => match live.remove(id) {
                Some(ptr) => match allocator.free(ptr) {
                    Ok(()) => println!("free {id} ({ptr:?}) -> ok"),
                    Err(e) => println!("free {id} ({ptr:?}) -> error: {e}"),
                },
                None => log::warn!("free {id}: no live allocation with that id"),
            },
            Op::Realloc { id, size } => {
                let old = live.get(id).copied();
                match allocator.realloc(old, *size) {
                    Some(ptr) => {
                        println!("realloc {id} ({size} bytes) -> {ptr:?}");
                        live.insert(id.clone(), ptr);
                    }
                    None => {
                        println!("realloc {id} ({size} bytes) -> freed / FAILED");
                        live.remove(id);
                    }
                }
            }
        }

        let violations = allocator.check(verbose);
        if !violations.is_empty() {
            println!("  ** heap check found {} violation(s): {violations:?}", violations.len());
        }
    }

    println!("\n{} allocations still live at end of trace", live.len());
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let text = fs::read_to_string(&args.trace).expect("failed to read trace file");
    let ops = parse_trace(&text);
    println!("loaded {} operations from {}", ops.len(), args.trace);

    match args.variant {
        Variant::Implicit => run(ImplicitAllocator::new(SbrkHeap::new()), &ops, args.verbose),
        Variant::ImplicitCoalescing => {
            run(ImplicitCoalescingAllocator::new(SbrkHeap::new()), &ops, args.verbose)
        }
        Variant::Explicit => run(ExplicitAllocator::new(SbrkHeap::new()), &ops, args.verbose),
    }
}
