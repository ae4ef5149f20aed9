use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::process::Command;

use crate::config::defs::{
    CALLS_BAM_SUFFIX, DEMUX_DIR_SUFFIX, DORADO_TAG, FASTQ_GZ_SUFFIX, FASTQ_SUFFIX, GZIP_TAG,
    MIN_FASTQ_BYTES, NANOPLOT_TAG, PipelineError, RunConfig, UNCLASSIFIED_FASTQ,
};
use crate::utils::command::dorado::{self, DoradoConfig};
use crate::utils::command::{check_versions, exit_status_to_result, gzip, nanoplot, run_tool};
use crate::utils::file::{file_path_manipulator, files_with_suffix, remove_files_below};
use crate::utils::streams::write_child_stdout_to_file;

/// Runs the three pipeline stages in fixed order: basecall, demultiplex,
/// post-process. Any stage failure aborts the run.
pub async fn run(config: Arc<RunConfig>) -> Result<(), PipelineError> {
    println!("\n-------------\n Basecall / Demux / QC\n-------------\n");

    check_versions(&config.args)
        .await
        .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;

    let calls_path = basecaller(&config).await?;
    if !calls_path.is_file() {
        return Err(PipelineError::MissingFile(calls_path));
    }

    let demux_dir = demux(&config, &calls_path).await?;
    post_process(&config, &demux_dir).await?;

    Ok(())
}

/// Basecalls the pod5 directory with dorado, streaming the BAM it emits on
/// stdout into `{out_dir}/{prefix}_calls.bam`.
///
/// # Arguments
///
/// * `config` - RunConfig struct from main.
///
/// # Returns
/// Path to the calls file.
async fn basecaller(config: &RunConfig) -> Result<PathBuf, PipelineError> {
    let calls_path = file_path_manipulator(
        Path::new(&config.args.prefix),
        Some(&config.out_dir),
        None,
        Some(CALLS_BAM_SUFFIX),
        "_",
    );
    info!(
        "Basecalling {} -> {}",
        config.pod5_path.display(),
        calls_path.display()
    );

    let argv = dorado::arg_generator(
        config,
        &DoradoConfig::Basecaller {
            pod5_path: &config.pod5_path,
        },
    );
    debug!("{} argv: {:?}", DORADO_TAG, argv);

    let mut child = Command::new(&config.args.dorado_path)
        .args(&argv)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| PipelineError::ToolExecution {
            tool: DORADO_TAG.to_string(),
            error: e.to_string(),
        })?;

    let bytes = write_child_stdout_to_file(&mut child, &calls_path)
        .await
        .map_err(|e| PipelineError::IOError(e.to_string()))?;
    let status = child.wait().await.map_err(|e| PipelineError::ToolExecution {
        tool: DORADO_TAG.to_string(),
        error: e.to_string(),
    })?;
    exit_status_to_result(DORADO_TAG, status)?;

    debug!("Wrote {} bytes to {}", bytes, calls_path.display());
    Ok(calls_path)
}

/// Demultiplexes the calls file into per-sample FASTQs under
/// `{out_dir}/{prefix}_demux_fastq_files`.
async fn demux(config: &RunConfig, calls_path: &Path) -> Result<PathBuf, PipelineError> {
    let demux_dir = file_path_manipulator(
        Path::new(&config.args.prefix),
        Some(&config.out_dir),
        None,
        Some(DEMUX_DIR_SUFFIX),
        "_",
    );
    info!(
        "Demultiplexing {} -> {}",
        calls_path.display(),
        demux_dir.display()
    );

    let argv = dorado::arg_generator(
        config,
        &DoradoConfig::Demux {
            calls_path,
            demux_dir: &demux_dir,
        },
    );
    run_tool(DORADO_TAG, &config.args.dorado_path, &argv).await?;
    Ok(demux_dir)
}

/// Drops the unclassified reads and every undersized FASTQ, compresses the
/// survivors, and generates one NanoPlot report per compressed file.
async fn post_process(config: &RunConfig, demux_dir: &Path) -> Result<(), PipelineError> {
    if !demux_dir.is_dir() {
        return Err(PipelineError::MissingFile(demux_dir.to_path_buf()));
    }

    let unclassified = demux_dir.join(UNCLASSIFIED_FASTQ);
    fs::remove_file(&unclassified).map_err(|e| {
        PipelineError::IOError(format!("removing {}: {}", unclassified.display(), e))
    })?;
    info!("Removed {}", unclassified.display());

    let survivors = remove_files_below(demux_dir, FASTQ_SUFFIX, MIN_FASTQ_BYTES)
        .map_err(|e| PipelineError::IOError(e.to_string()))?;

    if survivors.is_empty() {
        warn!(
            "No demultiplexed FASTQ at or above {} bytes; skipping compression and QC",
            MIN_FASTQ_BYTES
        );
        return Ok(());
    }

    info!("Compressing {} FASTQ file(s)", survivors.len());
    let argv = gzip::arg_generator(&survivors);
    run_tool(GZIP_TAG, GZIP_TAG, &argv).await?;

    let compressed = files_with_suffix(demux_dir, FASTQ_GZ_SUFFIX)
        .map_err(|e| PipelineError::IOError(e.to_string()))?;
    for fastq_gz in &compressed {
        let base = nanoplot::report_base(fastq_gz).ok_or_else(|| {
            PipelineError::IOError(format!("Unexpected file name: {}", fastq_gz.display()))
        })?;
        info!("NanoPlot report for {}", fastq_gz.display());
        let argv = nanoplot::arg_generator(config, fastq_gz, &base);
        run_tool(NANOPLOT_TAG, &config.args.nanoplot_path, &argv).await?;
    }

    Ok(())
}
