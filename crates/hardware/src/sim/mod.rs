//! Simulation driver surface.
//!
//! This module ties the translation engine and cache hierarchy together
//! behind the three-operation driver API. It provides:
//! 1. **Construction:** `Simulator::new` validates the configuration and
//!    assembles physical memory, the cache stack, and the page table.
//! 2. **Ingestion:** `process_batch` runs references strictly in order;
//!    `run_trace` streams a whole trace file through it.
//! 3. **Reporting:** `report` renders the final statistics to any writer.
//!
//! Each simulator instance is a closed world: all state lives in the instance
//! and references are consumed one at a time, so independent traces can run
//! in independent instances without any shared state.

/// Trace-file reading.
pub mod loader;

pub use loader::TraceReader;

use std::collections::HashMap;
use std::io::{self, Write};

use crate::cache::CacheHierarchy;
use crate::common::constants::{PAGE_SIZE, PROGRESS_INTERVAL};
use crate::common::{MemRef, SimResult, VirtAddr};
use crate::config::{AllocatorKind, Config};
use crate::mmu::PageTable;
use crate::phys::PhysicalMemory;

/// The complete simulator: physical memory, cache hierarchy, and page table.
pub struct Simulator {
    config: Config,
    phys: PhysicalMemory,
    caches: CacheHierarchy,
    page_table: PageTable,
    access_count: u64,
    virtual_pages: HashMap<u64, u64>,
    physical_pages: HashMap<u64, u64>,
}

impl Simulator {
    /// Validates `config` and builds the simulator, allocating the root
    /// page-table page.
    ///
    /// # Arguments
    ///
    /// * `config` - Full simulator configuration.
    ///
    /// # Returns
    ///
    /// A ready simulator, or `SimError::Config` when validation fails. A
    /// configuration accepted here will not panic later in the run.
    pub fn new(config: Config) -> SimResult<Self> {
        config.validate()?;

        let mut phys = match config.memory.allocator {
            AllocatorKind::Linear => PhysicalMemory::new_linear(config.memory.phys_mem_bytes()),
            AllocatorKind::TinyPtr => PhysicalMemory::new_tiny(
                config.memory.phys_mem_bytes(),
                config.memory.hash_seeds(),
            ),
        };

        let caches = CacheHierarchy::new(
            config.cache.l1.as_tuple(),
            config.cache.l2.as_tuple(),
            config.cache.l3.as_tuple(),
        );

        let page_table = PageTable::new(&config, &mut phys)?;

        Ok(Self {
            config,
            phys,
            caches,
            page_table,
            access_count: 0,
            virtual_pages: HashMap::new(),
            physical_pages: HashMap::new(),
        })
    }

    /// Runs one batch of references, in order. Per-reference semantics are
    /// identical regardless of batching.
    ///
    /// # Arguments
    ///
    /// * `records` - References to process, consumed strictly in order.
    ///
    /// # Returns
    ///
    /// `Ok(())`, or the allocation error that stopped the batch (all state
    /// transitions of earlier references are complete at that point).
    pub fn process_batch(&mut self, records: &[MemRef]) -> SimResult<()> {
        for record in records {
            self.access_count += 1;

            let vaddr = VirtAddr::new(record.ea);
            let paddr = self
                .page_table
                .translate(vaddr, &mut self.caches, &mut self.phys)?;
            self.caches.access(paddr.val(), !record.is_read);

            *self.virtual_pages.entry(vaddr.vpn()).or_insert(0) += 1;
            *self.physical_pages.entry(paddr.pfn()).or_insert(0) += 1;

            if self.access_count % PROGRESS_INTERVAL == 0 {
                log::info!(
                    "processed {}*10M accesses",
                    self.access_count / PROGRESS_INTERVAL
                );
            }
        }
        Ok(())
    }

    /// Streams an entire trace file through `process_batch`.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the binary trace file.
    ///
    /// # Returns
    ///
    /// The total number of references processed so far, or the I/O or
    /// allocation error that ended the run.
    pub fn run_trace(&mut self, path: &str) -> SimResult<u64> {
        let batch_size = self.config.memory.batch_size.max(1);
        let mut reader = TraceReader::open(path)?;
        let mut batch = Vec::with_capacity(batch_size);
        loop {
            let n = reader.read_batch(batch_size, &mut batch)?;
            if n == 0 {
                break;
            }
            self.process_batch(&batch)?;
        }
        Ok(self.access_count)
    }

    /// Renders the full statistics report.
    ///
    /// # Arguments
    ///
    /// * `w` - Destination writer (a file for the CLI, a buffer in tests).
    ///
    /// # Returns
    ///
    /// Any error the writer produced.
    pub fn report(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "Simulation Results:")?;
        writeln!(w, "==================")?;
        writeln!(w, "{:<22}{}", "Total accesses:", self.access_count)?;
        writeln!(w, "{:<22}{}", "Unique virtual pages:", self.virtual_pages.len())?;
        writeln!(w, "{:<22}{}", "Unique physical pages:", self.physical_pages.len())?;
        writeln!(
            w,
            "{:<22}{:.2} MB",
            "Physical memory used:",
            (self.physical_pages.len() as u64 * PAGE_SIZE) as f64 / (1024.0 * 1024.0)
        )?;

        self.page_table.write_detailed_stats(w)?;
        self.page_table.write_memory_stats(w)?;
        self.caches.write_stats(w)?;
        Ok(())
    }

    /// References processed so far.
    pub fn access_count(&self) -> u64 {
        self.access_count
    }

    /// The active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The translation engine.
    pub fn page_table(&self) -> &PageTable {
        &self.page_table
    }

    /// The data-cache stack.
    pub fn hierarchy(&self) -> &CacheHierarchy {
        &self.caches
    }

    /// The physical-memory pool.
    pub fn physical_memory(&self) -> &PhysicalMemory {
        &self.phys
    }
}
