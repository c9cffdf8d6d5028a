//! Per-chunk file creation.
//!
//! A [`Worker`] owns a fixed-size rayon pool and creates `files_per_dir`
//! placeholders in every directory of its [`WorkOrder`]. When running as a
//! child process the order arrives as JSON on stdin and outcomes leave as
//! JSON lines on stdout; see [`serve`].

use std::io::{self, BufWriter, Read, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::creator::{FileOutcome, create_placeholder};
use crate::error::Result;

/// Everything a worker needs to process one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrder {
    #[serde(with = "crate::wire::paths")]
    pub directories: Vec<PathBuf>,
    pub files_per_dir: usize,
    pub threads: NonZeroUsize,
    /// CPU core to pin the worker process to, if any.
    #[serde(default)]
    pub pin_core: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
pub struct Worker {
    threads: NonZeroUsize,
}

impl Worker {
    pub fn new(threads: NonZeroUsize) -> Self {
        Self { threads }
    }

    /// Creates every file of the chunk and returns one outcome per file,
    /// grouped by directory in order. Individual failures are outcomes, not
    /// errors; only a pool that cannot be built fails the call.
    pub fn run(&self, directories: &[PathBuf], files_per_dir: usize) -> Result<Vec<FileOutcome>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads.get())
            .thread_name(|i| format!("fba-writer-{i}"))
            .build()?;

        debug!(
            directories = directories.len(),
            files_per_dir,
            threads = self.threads.get(),
            "worker starting"
        );

        // Parallel collect keeps submission order.
        let outcomes: Vec<FileOutcome> = pool.install(|| {
            directories
                .par_iter()
                .flat_map(|dir| {
                    (0..files_per_dir)
                        .into_par_iter()
                        .map(move |_| create_placeholder(dir))
                })
                .collect()
        });

        debug!(outcomes = outcomes.len(), "worker finished");
        Ok(outcomes)
    }
}

/// Runs one work order read from `input`, writing each outcome as a JSON
/// line to `output`.
pub fn serve<R: Read, W: Write>(input: R, output: W) -> Result<()> {
    let order: WorkOrder = serde_json::from_reader(input)?;

    if let Some(core) = order.pin_core {
        if let Err(e) = pin_to_core(core) {
            warn!("could not pin worker to core {core}: {e}. Continuing without pinning.");
        }
    }

    let outcomes = Worker::new(order.threads).run(&order.directories, order.files_per_dir)?;

    let mut out = BufWriter::new(output);
    for outcome in &outcomes {
        serde_json::to_writer(&mut out, outcome)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

/// Restricts the calling process to a single CPU core. Only implemented on
/// Linux; elsewhere this is a no-op.
pub fn pin_to_core(core: usize) -> io::Result<()> {
    #[cfg(target_os = "linux")]
    {
        if core >= libc::CPU_SETSIZE as usize {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("core {core} out of range"),
            ));
        }
        // SAFETY: cpu_set_t is plain data, and sched_setaffinity only reads
        // the set for the lifetime of the call.
        unsafe {
            let mut cpu_set: libc::cpu_set_t = std::mem::zeroed();
            libc::CPU_SET(core, &mut cpu_set);
            let size = std::mem::size_of::<libc::cpu_set_t>();
            let result = libc::sched_setaffinity(0, size, &cpu_set);
            if result != 0 {
                return Err(io::Error::last_os_error());
            }
        }
    }
    #[cfg(not(target_os = "linux"))]
    let _ = core;
    Ok(())
}
