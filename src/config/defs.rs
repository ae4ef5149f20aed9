use std::collections::HashMap;
use std::path::PathBuf;

use lazy_static::lazy_static;
use thiserror::Error;

use crate::cli::Arguments;

// External software
pub const DORADO_TAG: &str = "dorado";
pub const GZIP_TAG: &str = "gzip";
pub const NANOPLOT_TAG: &str = "NanoPlot";

lazy_static! {
    pub static ref TOOL_VERSIONS: HashMap<&'static str, f32> = {
        let mut m = HashMap::new();
        m.insert(DORADO_TAG, 0.5);
        m.insert(GZIP_TAG, 1.0);
        m.insert(NANOPLOT_TAG, 1.41);

        m
    };
}

// Static filenames
pub const CALLS_BAM_SUFFIX: &str = "calls.bam";
pub const DEMUX_DIR_SUFFIX: &str = "demux_fastq_files";
pub const UNCLASSIFIED_FASTQ: &str = "unclassified.fastq";
pub const NANOPLOT_DIR_SUFFIX: &str = "_NanoPlot";

pub const FASTQ_SUFFIX: &str = ".fastq";
pub const FASTQ_GZ_SUFFIX: &str = ".fastq.gz";

// Static parameters

/// Demultiplexed FASTQ files below this size are discarded before compression.
pub const MIN_FASTQ_BYTES: u64 = 10 * 1024 * 1024;

pub const DEFAULT_MODEL: &str = "dna_r10.4.1_e8.2_400bps_sup@v4.3.0";

pub struct RunConfig {
    pub cwd: PathBuf,
    pub out_dir: PathBuf,
    pub pod5_path: PathBuf,
    pub sample_sheet: Option<PathBuf>,
    pub threads: usize,
    pub args: Arguments,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to execute {tool}: {error}")]
    ToolExecution { tool: String, error: String },

    #[error("{tool} exited with status {status}")]
    ToolFailed { tool: String, status: i32 },

    #[error("File operation failed: {0}")]
    IOError(String),

    #[error("Expected file missing: {}", .0.display())]
    MissingFile(PathBuf),
}

impl PipelineError {
    /// Exit code surfaced to the invoker: a failed tool's own status where
    /// one exists, otherwise 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::ToolFailed { status, .. } if *status > 0 => *status,
            _ => 1,
        }
    }
}
