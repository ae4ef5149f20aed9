//! Functions and structs for building and running external tool command lines.

use std::process::ExitStatus;

use anyhow::Result;
use futures::future::try_join3;
use log::{debug, info, warn};
use tokio::process::Command;

use crate::cli::Arguments;
use crate::config::defs::{DORADO_TAG, GZIP_TAG, NANOPLOT_TAG, PipelineError, TOOL_VERSIONS};

pub mod dorado {
    use std::path::Path;
    use std::process::Stdio;

    use anyhow::{Result, anyhow};
    use tokio::process::Command;

    use crate::config::defs::RunConfig;
    use crate::utils::streams::{ChildStream, read_child_output_to_vec};

    /// The two dorado subcommands this pipeline drives.
    pub enum DoradoConfig<'a> {
        Basecaller {
            pod5_path: &'a Path,
        },
        Demux {
            calls_path: &'a Path,
            demux_dir: &'a Path,
        },
    }

    pub async fn dorado_presence_check(dorado_path: &str) -> Result<String> {
        let args: Vec<&str> = vec!["--version"];

        let mut child = Command::new(dorado_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| anyhow!("Failed to spawn {}: {}. Is dorado installed?", dorado_path, e))?;

        let mut lines = read_child_output_to_vec(&mut child, ChildStream::Stdout).await?;
        if lines.is_empty() {
            // dorado prints its version on stderr
            lines = read_child_output_to_vec(&mut child, ChildStream::Stderr).await?;
        }
        child.wait().await?;

        let first_line = lines
            .first()
            .ok_or_else(|| anyhow!("No output from dorado --version"))?;
        let version = first_line
            .split_whitespace()
            .next()
            .ok_or_else(|| anyhow!("Invalid dorado --version output: {}", first_line))?
            .to_string();
        if version.is_empty() {
            return Err(anyhow!("Empty version number in dorado --version output: {}", first_line));
        }
        Ok(version)
    }

    pub fn arg_generator(config: &RunConfig, dorado_config: &DoradoConfig) -> Vec<String> {
        let mut args_vec: Vec<String> = Vec::new();
        match dorado_config {
            DoradoConfig::Basecaller { pod5_path } => {
                args_vec.push("basecaller".to_string());
                args_vec.push(config.args.model.clone());
                args_vec.push(pod5_path.to_string_lossy().into_owned());
                args_vec.push("-v".to_string());
                args_vec.push("-x".to_string());
                args_vec.push(config.args.device.clone());
                args_vec.push("--kit-name".to_string());
                args_vec.push(config.args.kit_name.clone());
                args_vec.push("--min-qscore".to_string());
                args_vec.push(config.args.min_qscore.to_string());
            }
            DoradoConfig::Demux { calls_path, demux_dir } => {
                args_vec.push("demux".to_string());
                args_vec.push(calls_path.to_string_lossy().into_owned());
                args_vec.push("--emit-fastq".to_string());
                args_vec.push("--output-dir".to_string());
                args_vec.push(demux_dir.to_string_lossy().into_owned());
                args_vec.push("--kit-name".to_string());
                args_vec.push(config.args.kit_name.clone());
                args_vec.push("--threads".to_string());
                args_vec.push(config.threads.to_string());
                args_vec.push("-v".to_string());
                if let Some(sheet) = &config.sample_sheet {
                    args_vec.push("--sample-sheet".to_string());
                    args_vec.push(sheet.to_string_lossy().into_owned());
                }
            }
        }
        args_vec
    }
}

pub mod gzip {
    use std::path::PathBuf;
    use std::process::Stdio;

    use anyhow::{Result, anyhow};
    use tokio::process::Command;

    use crate::config::defs::GZIP_TAG;
    use crate::utils::streams::{ChildStream, read_child_output_to_vec};

    pub async fn gzip_presence_check() -> Result<String> {
        let args: Vec<&str> = vec!["--version"];

        let mut child = Command::new(GZIP_TAG)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| anyhow!("Failed to spawn {}: {}. Is gzip installed?", GZIP_TAG, e))?;

        let lines = read_child_output_to_vec(&mut child, ChildStream::Stdout).await?;
        child.wait().await?;

        let first_line = lines
            .first()
            .ok_or_else(|| anyhow!("No output from gzip --version"))?;
        let version = first_line
            .split_whitespace()
            .nth(1)
            .ok_or_else(|| anyhow!("Invalid gzip --version output: {}", first_line))?
            .to_string();
        if version.is_empty() {
            return Err(anyhow!("Empty version number in gzip --version output: {}", first_line));
        }
        Ok(version)
    }

    /// gzip compresses in place; the argument list is just the file set.
    pub fn arg_generator(files: &[PathBuf]) -> Vec<String> {
        files.iter().map(|f| f.to_string_lossy().into_owned()).collect()
    }
}

pub mod nanoplot {
    use std::path::Path;
    use std::process::Stdio;

    use anyhow::{Result, anyhow};
    use tokio::process::Command;

    use crate::config::defs::{NANOPLOT_DIR_SUFFIX, RunConfig};
    use crate::utils::streams::{ChildStream, read_child_output_to_vec};

    pub async fn nanoplot_presence_check(nanoplot_path: &str) -> Result<String> {
        let args: Vec<&str> = vec!["--version"];

        let mut child = Command::new(nanoplot_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| anyhow!("Failed to spawn {}: {}. Is NanoPlot installed?", nanoplot_path, e))?;

        let lines = read_child_output_to_vec(&mut child, ChildStream::Stdout).await?;
        child.wait().await?;

        let first_line = lines
            .first()
            .ok_or_else(|| anyhow!("No output from NanoPlot --version"))?;
        let version = first_line
            .split_whitespace()
            .nth(1)
            .ok_or_else(|| anyhow!("Invalid NanoPlot --version output: {}", first_line))?
            .to_string();
        if version.is_empty() {
            return Err(anyhow!("Empty version number in NanoPlot --version output: {}", first_line));
        }
        Ok(version)
    }

    /// Base name of a demultiplexed file: strips both the `.gz` and `.fastq`
    /// extensions. Returns None when the name has no extension to strip.
    pub fn report_base(fastq_gz: &Path) -> Option<String> {
        let stem = fastq_gz.file_stem()?;
        let base = Path::new(stem).file_stem()?;
        Some(base.to_string_lossy().into_owned())
    }

    pub fn arg_generator(config: &RunConfig, fastq_gz: &Path, base: &str) -> Vec<String> {
        let report_dir = fastq_gz.with_file_name(format!("{}{}", base, NANOPLOT_DIR_SUFFIX));

        let mut args_vec: Vec<String> = Vec::new();
        args_vec.push("--threads".to_string());
        args_vec.push(config.threads.to_string());
        args_vec.push("--verbose".to_string());
        args_vec.push("-p".to_string());
        args_vec.push(format!("{}_", base));
        args_vec.push("-o".to_string());
        args_vec.push(report_dir.to_string_lossy().into_owned());
        args_vec.push("--info_in_report".to_string());
        args_vec.push("--only-report".to_string());
        args_vec.push("--N50".to_string());
        args_vec.push("--no_static".to_string());
        args_vec.push("--fastq".to_string());
        args_vec.push(fastq_gz.to_string_lossy().into_owned());
        args_vec
    }
}

/// Runs an external tool to completion, discarding its stdout. Stderr passes
/// through to the invoker so tool progress stays visible.
///
/// # Arguments
///
/// * `tool` - Tool tag used in error reporting.
/// * `exe` - Executable name or path.
/// * `args` - Full argument vector.
///
/// # Returns
/// Ok on a zero exit status, PipelineError::ToolFailed otherwise.
pub async fn run_tool(tool: &str, exe: &str, args: &[String]) -> Result<(), PipelineError> {
    debug!("{} argv: {:?}", tool, args);
    let status = Command::new(exe)
        .args(args)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::inherit())
        .status()
        .await
        .map_err(|e| PipelineError::ToolExecution {
            tool: tool.to_string(),
            error: e.to_string(),
        })?;
    exit_status_to_result(tool, status)
}

pub fn exit_status_to_result(tool: &str, status: ExitStatus) -> Result<(), PipelineError> {
    if status.success() {
        Ok(())
    } else {
        Err(PipelineError::ToolFailed {
            tool: tool.to_string(),
            status: status.code().unwrap_or(1),
        })
    }
}

/// First two numeric components of a version string, e.g. "0.5.1+abc" -> 0.5.
fn version_to_f32(version: &str) -> Option<f32> {
    let numeric: String = version
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let mut parts = numeric.split('.').filter(|p| !p.is_empty());
    let major = parts.next()?;
    let minor = parts.next().unwrap_or("0");
    format!("{}.{}", major, minor).parse().ok()
}

/// Confirms all three external tools can be spawned before any work starts,
/// logging the versions they report. Warns when a tool looks older than the
/// minimum this pipeline was written against.
pub async fn check_versions(args: &Arguments) -> Result<()> {
    let (dorado_version, gzip_version, nanoplot_version) = try_join3(
        dorado::dorado_presence_check(&args.dorado_path),
        gzip::gzip_presence_check(),
        nanoplot::nanoplot_presence_check(&args.nanoplot_path),
    )
    .await?;

    for (tool, version) in [
        (DORADO_TAG, &dorado_version),
        (GZIP_TAG, &gzip_version),
        (NANOPLOT_TAG, &nanoplot_version),
    ] {
        info!("{} version: {}", tool, version);
        if let (Some(min), Some(found)) = (TOOL_VERSIONS.get(tool), version_to_f32(version)) {
            if found < *min {
                warn!("{} version {} is older than expected minimum {}", tool, version, min);
            }
        }
    }
    Ok(())
}
