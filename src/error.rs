use std::path::PathBuf;
use std::process::ExitStatus;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cannot read root {}: {source}", path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("root {} is not a directory", .0.display())]
    RootNotDirectory(PathBuf),

    #[error("error building writer pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("worker process exited with {0}")]
    WorkerExited(ExitStatus),

    #[error("malformed worker protocol data: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("worker task did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("dispatcher closed")]
    DispatcherClosed,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
