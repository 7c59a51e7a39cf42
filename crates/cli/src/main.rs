//! Memory hierarchy simulator CLI.
//!
//! This binary drives the simulator over a recorded trace. It performs:
//! 1. **Configuration:** Builds a `Config` from the command-line flags, with
//!    the library defaults as the baseline.
//! 2. **Simulation:** Streams the trace file through the simulator in
//!    batches, printing coarse progress.
//! 3. **Reporting:** Writes the configuration summary and the final
//!    statistics report to the output file.
//!
//! Any fatal condition (unreadable trace, invalid configuration, exhausted
//! physical memory, impossible tiny-pointer placement) produces a single
//! diagnostic line on stderr and a nonzero exit.

use std::fs::File;
use std::io::Write;
use std::process;

use clap::{Parser, ValueEnum};

use memsim_core::config::{AllocatorKind, Config};
use memsim_core::Simulator;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AllocatorArg {
    /// Monotonic next-frame allocator.
    Linear,
    /// Power-of-two-choices tiny-pointer allocator.
    Tinyptr,
}

#[derive(Parser, Debug)]
#[command(
    name = "memsim",
    version,
    about = "Trace-driven virtual-memory and data-cache simulator",
    long_about = "Replays a binary memory-reference trace through a two-level TLB, \
per-level page-walk caches, a four-level page table, and an inclusive \
L1/L2/L3 write-back cache hierarchy, then reports per-structure statistics.\n\n\
The trace is a flat sequence of 24-byte little-endian records: \
pc (u64), effective address (u64), size (u32), is_read (u32)."
)]
struct Cli {
    /// Path to the binary trace file.
    trace_file: String,

    /// Output file for simulation results.
    #[arg(short, long, default_value = "memory_simulator.out")]
    output: String,

    /// Physical memory size in GB.
    #[arg(long = "phys_mem_gb")]
    phys_mem_gb: Option<u64>,

    /// Batch size for trace processing.
    #[arg(long = "batch_size")]
    batch_size: Option<usize>,

    /// Frame allocator variant.
    #[arg(long)]
    allocator: Option<AllocatorArg>,

    /// Seed for the tiny-pointer hash pair.
    #[arg(long)]
    seed: Option<u64>,

    /// L1 TLB size in entries.
    #[arg(long = "l1_tlb_size")]
    l1_tlb_size: Option<u64>,

    /// L1 TLB associativity.
    #[arg(long = "l1_tlb_ways")]
    l1_tlb_ways: Option<u64>,

    /// L2 TLB size in entries.
    #[arg(long = "l2_tlb_size")]
    l2_tlb_size: Option<u64>,

    /// L2 TLB associativity.
    #[arg(long = "l2_tlb_ways")]
    l2_tlb_ways: Option<u64>,

    /// L1 cache size in bytes.
    #[arg(long = "l1_cache_size")]
    l1_cache_size: Option<u64>,

    /// L1 cache associativity.
    #[arg(long = "l1_ways")]
    l1_ways: Option<u64>,

    /// L1 cache line size in bytes.
    #[arg(long = "l1_line")]
    l1_line: Option<u64>,

    /// L2 cache size in bytes.
    #[arg(long = "l2_cache_size")]
    l2_cache_size: Option<u64>,

    /// L2 cache associativity.
    #[arg(long = "l2_ways")]
    l2_ways: Option<u64>,

    /// L2 cache line size in bytes.
    #[arg(long = "l2_line")]
    l2_line: Option<u64>,

    /// L3 cache size in bytes.
    #[arg(long = "l3_cache_size")]
    l3_cache_size: Option<u64>,

    /// L3 cache associativity.
    #[arg(long = "l3_ways")]
    l3_ways: Option<u64>,

    /// L3 cache line size in bytes.
    #[arg(long = "l3_line")]
    l3_line: Option<u64>,

    /// PTE cacheable flag (0 or 1).
    #[arg(long = "pte_cachable")]
    pte_cachable: Option<u64>,

    /// Number of PGD entries.
    #[arg(long = "pgd_size")]
    pgd_size: Option<u64>,

    /// Number of PUD entries.
    #[arg(long = "pud_size")]
    pud_size: Option<u64>,

    /// Number of PMD entries.
    #[arg(long = "pmd_size")]
    pmd_size: Option<u64>,

    /// Number of PTE entries.
    #[arg(long = "pte_size")]
    pte_size: Option<u64>,

    /// PGD PWC size in entries.
    #[arg(long = "pgd_pwc_size")]
    pgd_pwc_size: Option<u64>,

    /// PGD PWC associativity.
    #[arg(long = "pgd_pwc_ways")]
    pgd_pwc_ways: Option<u64>,

    /// PUD PWC size in entries.
    #[arg(long = "pud_pwc_size")]
    pud_pwc_size: Option<u64>,

    /// PUD PWC associativity.
    #[arg(long = "pud_pwc_ways")]
    pud_pwc_ways: Option<u64>,

    /// PMD PWC size in entries.
    #[arg(long = "pmd_pwc_size")]
    pmd_pwc_size: Option<u64>,

    /// PMD PWC associativity.
    #[arg(long = "pmd_pwc_ways")]
    pmd_pwc_ways: Option<u64>,

    /// Enable Table-of-Contents sub-indexing in the PWCs (0 or 1).
    #[arg(long = "toc_enabled")]
    toc_enabled: Option<u64>,

    /// TOC sub-entries per PWC way (power of two).
    #[arg(long = "toc_size")]
    toc_size: Option<u64>,
}

/// Applies the parsed flags on top of the library defaults.
///
/// # Arguments
///
/// * `cli` - The parsed command line.
///
/// # Returns
///
/// A `Config` where every flag the user supplied overrides the default.
/// Validation happens in `Simulator::new`, so an inconsistent combination
/// is reported there.
fn build_config(cli: &Cli) -> Config {
    let mut config = Config::default();

    let set = |target: &mut u64, value: Option<u64>| {
        if let Some(v) = value {
            *target = v;
        }
    };

    set(&mut config.memory.phys_mem_gb, cli.phys_mem_gb);
    if let Some(batch) = cli.batch_size {
        config.memory.batch_size = batch;
    }
    if let Some(allocator) = cli.allocator {
        config.memory.allocator = match allocator {
            AllocatorArg::Linear => AllocatorKind::Linear,
            AllocatorArg::Tinyptr => AllocatorKind::TinyPtr,
        };
    }
    set(&mut config.memory.seed, cli.seed);

    set(&mut config.tlb.l1_entries, cli.l1_tlb_size);
    set(&mut config.tlb.l1_ways, cli.l1_tlb_ways);
    set(&mut config.tlb.l2_entries, cli.l2_tlb_size);
    set(&mut config.tlb.l2_ways, cli.l2_tlb_ways);

    set(&mut config.cache.l1.size_bytes, cli.l1_cache_size);
    set(&mut config.cache.l1.ways, cli.l1_ways);
    set(&mut config.cache.l1.line_bytes, cli.l1_line);
    set(&mut config.cache.l2.size_bytes, cli.l2_cache_size);
    set(&mut config.cache.l2.ways, cli.l2_ways);
    set(&mut config.cache.l2.line_bytes, cli.l2_line);
    set(&mut config.cache.l3.size_bytes, cli.l3_cache_size);
    set(&mut config.cache.l3.ways, cli.l3_ways);
    set(&mut config.cache.l3.line_bytes, cli.l3_line);

    if let Some(flag) = cli.pte_cachable {
        config.page_table.pte_cachable = flag != 0;
    }
    set(&mut config.page_table.pgd_entries, cli.pgd_size);
    set(&mut config.page_table.pud_entries, cli.pud_size);
    set(&mut config.page_table.pmd_entries, cli.pmd_size);
    set(&mut config.page_table.pte_entries, cli.pte_size);

    set(&mut config.pwc.pgd_entries, cli.pgd_pwc_size);
    set(&mut config.pwc.pgd_ways, cli.pgd_pwc_ways);
    set(&mut config.pwc.pud_entries, cli.pud_pwc_size);
    set(&mut config.pwc.pud_ways, cli.pud_pwc_ways);
    set(&mut config.pwc.pmd_entries, cli.pmd_pwc_size);
    set(&mut config.pwc.pmd_ways, cli.pmd_pwc_ways);

    if let Some(flag) = cli.toc_enabled {
        config.page_table.toc_enabled = flag != 0;
    }
    set(&mut config.page_table.toc_size, cli.toc_size);

    config
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let config = build_config(&cli);

    let mut out = File::create(&cli.output).unwrap_or_else(|e| {
        eprintln!("Error: unable to open output file {}: {}", cli.output, e);
        process::exit(1);
    });

    config.write_summary(&mut out).unwrap_or_else(|e| {
        eprintln!("Error: writing to {}: {}", cli.output, e);
        process::exit(1);
    });

    let mut simulator = Simulator::new(config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    println!("Memory Hierarchy Simulator");
    println!("==========================");
    println!("Trace: {}", cli.trace_file);

    let count = simulator.run_trace(&cli.trace_file).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    println!("Processed {} references", count);

    if let Err(e) = simulator.report(&mut out) {
        eprintln!("Error: writing to {}: {}", cli.output, e);
        process::exit(1);
    }
    out.flush().ok();
    println!("Results written to {}", cli.output);
}
