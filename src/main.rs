mod cli;
mod config;
mod pipelines;
mod utils;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use std::{env, fs};

use anyhow::{Result, anyhow};
use env_logger::Builder;
use log::{LevelFilter, debug, error, info};

use crate::cli::parse;
use crate::config::defs::RunConfig;
use crate::utils::file::file_path_manipulator;
use crate::utils::system::detect_cores_and_load;
use pipelines::basecall_qc;

#[tokio::main]
async fn main() -> Result<()> {
    let run_start = Instant::now();

    let args = parse();

    let log_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    println!("\n-------------\n Dorado Runner\n-------------\n");

    let cwd = env::current_dir()?;
    info!("The current directory is {:?}\n", cwd);

    let (max_cores, cpu_load) = detect_cores_and_load(args.threads).await?;
    debug!(
        "Detected {} usable cores; CPU load {}%; requested {} threads",
        max_cores, cpu_load, args.threads
    );

    let pod5_path = file_path_manipulator(Path::new(&args.pod5_path), Some(&cwd), None, None, "");
    if !pod5_path.exists() {
        return Err(anyhow!("Cannot find pod5 path {}", pod5_path.display()));
    }

    let sample_sheet = match &args.sample_sheet {
        Some(sheet) => {
            let sheet_path = file_path_manipulator(Path::new(sheet), Some(&cwd), None, None, "");
            if !sheet_path.is_file() {
                return Err(anyhow!("Cannot find sample sheet {}", sheet_path.display()));
            }
            Some(sheet_path)
        }
        None => None,
    };

    let out_dir = setup_output_dir(&args, &cwd)?;

    let run_config = Arc::new(RunConfig {
        cwd,
        out_dir,
        pod5_path,
        sample_sheet,
        threads: max_cores,
        args,
    });

    if let Err(e) = basecall_qc::run(run_config).await {
        error!(
            "Pipeline failed: {} at {} milliseconds.",
            e,
            run_start.elapsed().as_millis()
        );
        std::process::exit(e.exit_code());
    }

    println!("Run complete: {} milliseconds.", run_start.elapsed().as_millis());
    Ok(())
}

/// Sets up the output directory.
/// If `output_dir` is specified from args, uses it; otherwise the current
/// working directory. Ensures the directory exists.
///
/// # Arguments
/// * `args` - The parsed command-line arguments.
/// * `cwd` - The current working directory.
/// # Returns
/// path to the output directory.
fn setup_output_dir(args: &cli::args::Arguments, cwd: &Path) -> Result<PathBuf> {
    let out_dir = match &args.output_dir {
        Some(out) => {
            let path = PathBuf::from(out);
            if path.is_absolute() { path } else { cwd.join(path) }
        }
        None => cwd.to_path_buf(),
    };
    fs::create_dir_all(&out_dir)?;
    Ok(out_dir)
}
