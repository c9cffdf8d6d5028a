//! Scans the root, splits the directories into chunks and runs one worker per
//! chunk, either as a child process or on a blocking thread.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::creator::FileOutcome;
use crate::enumerate::enumerate_directories;
use crate::error::{Error, Result};
use crate::plan::{Plan, partition};
use crate::worker::{WorkOrder, Worker};

/// Where chunks run.
#[derive(Debug, Clone)]
pub enum Dispatch {
    /// Spawn `program worker` once per chunk.
    Process { program: PathBuf },
    /// Run each chunk on a tokio blocking thread with its own writer pool.
    InProcess,
}

impl Dispatch {
    /// Child processes of the currently running executable.
    pub fn current_exe() -> Result<Self> {
        Ok(Dispatch::Process {
            program: std::env::current_exe()?,
        })
    }
}

/// Totals for one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub directories: usize,
    pub skipped: usize,
    pub files_per_dir: usize,
    pub chunks: usize,
    pub created: usize,
    pub failed: usize,
    pub failed_chunks: usize,
}

struct ChunkReport {
    index: usize,
    directories: usize,
    result: Result<Vec<FileOutcome>>,
}

pub struct Coordinator {
    config: Config,
    dispatch: Dispatch,
}

impl Coordinator {
    pub fn new(config: Config, dispatch: Dispatch) -> Self {
        Self { config, dispatch }
    }

    /// Runs the whole generation, printing user-facing lines to `out`.
    ///
    /// Only an unreadable root or a failing `out` abort the run. Failed files
    /// and failed chunks are printed and counted in the summary.
    pub async fn run<W: Write>(&self, out: &mut W) -> Result<RunSummary> {
        writeln!(out, "Scanning directories...")?;
        let root = self.config.root.clone();
        let found = tokio::task::spawn_blocking(move || enumerate_directories(&root)).await??;
        writeln!(out, "{} directories found.", found.directories.len())?;

        let mut summary = RunSummary {
            directories: found.directories.len(),
            skipped: found.skipped,
            ..Default::default()
        };
        if found.directories.is_empty() {
            writeln!(out, "No directories found to create files in.")?;
            return Ok(summary);
        }

        let plan = Plan::new(
            found.directories.len(),
            self.config.total_files,
            self.config.processes,
        );
        summary.files_per_dir = plan.files_per_dir;
        summary.chunks = plan.chunks;
        info!(
            files_per_dir = plan.files_per_dir,
            expected_files = plan.expected_files(),
            chunks = plan.chunks,
            chunk_size = plan.chunk_size,
            processes = plan.processes,
            "plan ready"
        );

        if self.config.dry_run {
            writeln!(
                out,
                "Plan: {} files in each of {} directories ({} total), {} chunks of up to {} directories on {} processes",
                plan.files_per_dir,
                plan.directories,
                plan.expected_files(),
                plan.chunks,
                plan.chunk_size,
                plan.processes
            )?;
            return Ok(summary);
        }

        let reports = self.dispatch_chunks(&plan, found.directories).await;

        for report in reports {
            match report.result {
                Ok(outcomes) => {
                    for outcome in &outcomes {
                        if outcome.is_created() {
                            summary.created += 1;
                        } else {
                            summary.failed += 1;
                        }
                        writeln!(out, "{outcome}")?;
                    }
                }
                Err(e) => {
                    error!(chunk = report.index, "worker failed: {e}");
                    summary.failed_chunks += 1;
                    writeln!(
                        out,
                        "Worker for chunk {} ({} directories) failed: {}",
                        report.index, report.directories, e
                    )?;
                }
            }
        }
        out.flush()?;
        Ok(summary)
    }

    /// Runs every chunk with at most `plan.processes` in flight and returns
    /// the reports in chunk order.
    async fn dispatch_chunks(&self, plan: &Plan, directories: Vec<PathBuf>) -> Vec<ChunkReport> {
        let limit = Arc::new(Semaphore::new(plan.processes));
        let cores = num_cpus::get().max(1);

        let handles: Vec<_> = partition(&directories, plan.chunk_size)
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| {
                let order = WorkOrder {
                    directories: chunk,
                    files_per_dir: plan.files_per_dir,
                    threads: self.config.threads_per_process,
                    pin_core: self.config.pin_workers.then_some(index % cores),
                };
                let dispatch = self.dispatch.clone();
                let limit = Arc::clone(&limit);
                let count = order.directories.len();
                let handle = tokio::spawn(async move {
                    let _permit = limit.acquire_owned().await.map_err(|_| Error::DispatcherClosed)?;
                    debug!(chunk = index, directories = count, "dispatching chunk");
                    run_chunk(&dispatch, order).await
                });
                (index, count, handle)
            })
            .collect();

        let mut reports = Vec::with_capacity(handles.len());
        for (index, directories, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(Error::Join(e)),
            };
            debug!(chunk = index, ok = result.is_ok(), "chunk finished");
            reports.push(ChunkReport {
                index,
                directories,
                result,
            });
        }
        reports
    }
}

async fn run_chunk(dispatch: &Dispatch, order: WorkOrder) -> Result<Vec<FileOutcome>> {
    match dispatch {
        Dispatch::Process { program } => run_child(program, &order).await,
        Dispatch::InProcess => {
            tokio::task::spawn_blocking(move || {
                Worker::new(order.threads).run(&order.directories, order.files_per_dir)
            })
            .await?
        }
    }
}

async fn run_child(program: &Path, order: &WorkOrder) -> Result<Vec<FileOutcome>> {
    let payload = serde_json::to_vec(order)?;

    let mut child = Command::new(program)
        .arg("worker")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()?;

    // The worker reads its whole order before writing anything, so writing
    // stdin to completion first cannot deadlock on a full stdout pipe.
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(&payload).await?;
        stdin.shutdown().await?;
    }

    let output = child.wait_with_output().await?;
    if !output.status.success() {
        return Err(Error::WorkerExited(output.status));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_str(line).map_err(Error::from))
        .collect()
}
