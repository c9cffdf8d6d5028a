use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::error::Error;

pub const DEFAULT_TOTAL_FILES: usize = 100_000;
pub const DEFAULT_THREADS_PER_PROCESS: usize = 20;

#[derive(Parser, Debug)]
#[command(
    name = "fba",
    version,
    about = "Fill every directory under a root with placeholder JSON files",
    args_conflicts_with_subcommands = true
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub generate: GenerateArgs,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Process one work order from stdin (spawned by the coordinator)
    #[command(hide = true)]
    Worker,
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Directory whose descendants receive the files
    #[arg(long, env = "FBA_ROOT")]
    pub root: Option<PathBuf>,

    /// Total number of files to aim for
    #[arg(long, env = "FBA_TOTAL_FILES", default_value_t = DEFAULT_TOTAL_FILES)]
    pub total_files: usize,

    /// Writer threads inside each worker process
    #[arg(long, env = "FBA_THREADS_PER_PROCESS", default_value_t = DEFAULT_THREADS_PER_PROCESS)]
    pub threads_per_process: usize,

    /// Worker processes to run at once (default: number of CPUs)
    #[arg(long, env = "FBA_PROCESSES")]
    pub processes: Option<usize>,

    /// Pin each worker process to a single CPU core (Linux only)
    #[arg(long, env = "FBA_PIN_WORKERS")]
    pub pin_workers: bool,

    /// Run chunks on threads of this process instead of child processes
    #[arg(long, env = "FBA_IN_PROCESS")]
    pub in_process: bool,

    /// Print the plan without creating anything
    #[arg(long, env = "FBA_DRY_RUN")]
    pub dry_run: bool,
}

/// Validated settings for one generation run.
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub total_files: usize,
    pub threads_per_process: NonZeroUsize,
    pub processes: NonZeroUsize,
    pub pin_workers: bool,
    pub dry_run: bool,
}

impl Config {
    /// Defaults: 100 000 files, 20 threads per process, one process per CPU.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            total_files: DEFAULT_TOTAL_FILES,
            threads_per_process: NonZeroUsize::new(DEFAULT_THREADS_PER_PROCESS)
                .unwrap_or(NonZeroUsize::MIN),
            processes: available_processes(),
            pin_workers: false,
            dry_run: false,
        }
    }

    pub fn with_total_files(mut self, total_files: usize) -> Self {
        self.total_files = total_files;
        self
    }

    pub fn with_threads_per_process(mut self, threads: NonZeroUsize) -> Self {
        self.threads_per_process = threads;
        self
    }

    pub fn with_processes(mut self, processes: NonZeroUsize) -> Self {
        self.processes = processes;
        self
    }

    pub fn with_pin_workers(mut self, pin_workers: bool) -> Self {
        self.pin_workers = pin_workers;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

impl TryFrom<GenerateArgs> for Config {
    type Error = Error;

    fn try_from(args: GenerateArgs) -> Result<Self, Self::Error> {
        let root = args
            .root
            .ok_or_else(|| Error::InvalidConfig("--root is required".into()))?;
        let threads = NonZeroUsize::new(args.threads_per_process).ok_or_else(|| {
            Error::InvalidConfig("--threads-per-process must be at least 1".into())
        })?;
        let processes = match args.processes {
            Some(n) => NonZeroUsize::new(n)
                .ok_or_else(|| Error::InvalidConfig("--processes must be at least 1".into()))?,
            None => available_processes(),
        };

        Ok(Config::new(root)
            .with_total_files(args.total_files)
            .with_threads_per_process(threads)
            .with_processes(processes)
            .with_pin_workers(args.pin_workers)
            .with_dry_run(args.dry_run))
    }
}

fn available_processes() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("fba").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["--root", "/data"]);
        assert!(cli.command.is_none());
        let config = Config::try_from(cli.generate).unwrap();
        assert_eq!(config.root, PathBuf::from("/data"));
        assert_eq!(config.total_files, 100_000);
        assert_eq!(config.threads_per_process.get(), 20);
        assert_eq!(config.processes.get(), num_cpus::get().max(1));
        assert!(!config.pin_workers);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_all_flags() {
        let cli = parse(&[
            "--root",
            "/data",
            "--total-files",
            "30",
            "--threads-per-process",
            "3",
            "--processes",
            "2",
            "--pin-workers",
            "--dry-run",
        ]);
        assert!(!cli.generate.in_process);
        let config = Config::try_from(cli.generate).unwrap();
        assert_eq!(config.total_files, 30);
        assert_eq!(config.threads_per_process.get(), 3);
        assert_eq!(config.processes.get(), 2);
        assert!(config.pin_workers);
        assert!(config.dry_run);
    }

    #[test]
    fn test_missing_root_rejected() {
        let err = Config::try_from(parse(&[]).generate).unwrap_err();
        assert!(err.to_string().contains("--root"), "{err}");
    }

    #[test]
    fn test_zero_counts_rejected() {
        let cli = parse(&["--root", "/", "--threads-per-process", "0"]);
        assert!(Config::try_from(cli.generate).is_err());
        let cli = parse(&["--root", "/", "--processes", "0"]);
        assert!(Config::try_from(cli.generate).is_err());
    }

    #[test]
    fn test_worker_subcommand() {
        let cli = parse(&["worker"]);
        assert!(matches!(cli.command, Some(Command::Worker)));
        assert!(CliArgs::try_parse_from(["fba", "worker", "--root", "/"]).is_err());
    }
}
