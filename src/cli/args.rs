use clap::Parser;

use crate::config::defs::DEFAULT_MODEL;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "dorado-runner", version, about = "Dorado basecalling, demux, and QC pipeline")]
pub struct Arguments {
    /// Directory of raw pod5 signal files
    pub pod5_path: String,

    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    #[arg(long, default_value_t = 8, help = "Thread count passed to demux and NanoPlot; clamped to physical cores")]
    pub threads: usize,

    #[arg(long = "sample_sheet", help = "ONT sample sheet forwarded to dorado demux")]
    pub sample_sheet: Option<String>,

    #[arg(long = "kit_name", default_value = "SQK-RBK114-96")]
    pub kit_name: String,

    #[arg(long = "min_qscore", default_value_t = 8)]
    pub min_qscore: u32,

    #[arg(long = "output_dir", help = "Output directory for all generated files. Defaults to the current working directory.")]
    pub output_dir: Option<String>,

    #[arg(long, default_value = "sample", help = "Prefix for the calls file and the demux directory")]
    pub prefix: String,

    #[arg(long = "nanoplot_path", default_value = "NanoPlot")]
    pub nanoplot_path: String,

    #[arg(long = "dorado_path", default_value = "dorado")]
    pub dorado_path: String,

    #[arg(long, default_value = DEFAULT_MODEL, help = "Basecalling model name or path to a downloaded model directory")]
    pub model: String,

    #[arg(long, default_value = "cuda:all", help = "Device string forwarded to dorado -x")]
    pub device: String,
}
