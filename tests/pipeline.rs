//! End-to-end runs of the compiled binary against stub dorado/gzip/NanoPlot
//! executables placed at the front of PATH.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Result;
use tempfile::TempDir;

const DORADO_STUB: &str = r#"#!/bin/sh
if [ -n "$DORADO_LOG" ]; then
    echo "$*" >> "$DORADO_LOG"
fi
if [ "$1" = "--version" ]; then
    echo "0.5.1+stub" >&2
    exit 0
fi
case "$1" in
basecaller)
    printf 'BAM\1stub-calls'
    ;;
demux)
    out=""
    prev=""
    for arg in "$@"; do
        if [ "$prev" = "--output-dir" ]; then out="$arg"; fi
        prev="$arg"
    done
    mkdir -p "$out"
    printf 'unclassified-reads' > "$out/unclassified.fastq"
    head -c 11534336 /dev/zero > "$out/barcode01.fastq"
    printf 'tiny' > "$out/barcode02.fastq"
    ;;
*)
    exit 64
    ;;
esac
"#;

const DORADO_STUB_FAILING: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
    echo "0.5.1+stub" >&2
    exit 0
fi
exit 3
"#;

const DORADO_STUB_NO_UNCLASSIFIED: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
    echo "0.5.1+stub" >&2
    exit 0
fi
case "$1" in
basecaller)
    printf 'BAM\1stub-calls'
    ;;
demux)
    out=""
    prev=""
    for arg in "$@"; do
        if [ "$prev" = "--output-dir" ]; then out="$arg"; fi
        prev="$arg"
    done
    mkdir -p "$out"
    head -c 11534336 /dev/zero > "$out/barcode01.fastq"
    ;;
esac
"#;

const GZIP_STUB: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
    echo "gzip 1.12 (stub)"
    exit 0
fi
for f in "$@"; do
    cat "$f" > "$f.gz"
    rm "$f"
done
"#;

const NANOPLOT_STUB: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
    echo "NanoPlot 1.42.0"
    exit 0
fi
out=""
prev=""
for arg in "$@"; do
    if [ "$prev" = "-o" ]; then out="$arg"; fi
    prev="$arg"
done
mkdir -p "$out"
printf 'report' > "$out/NanoPlot-report.html"
"#;

fn write_stub(dir: &Path, name: &str, script: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, script)?;
    let mut perms = fs::metadata(&path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms)?;
    Ok(path)
}

struct StubEnv {
    bin_dir: TempDir,
    pod5_dir: TempDir,
    out_root: TempDir,
}

impl StubEnv {
    fn new(dorado_script: &str) -> Result<Self> {
        let bin_dir = TempDir::new()?;
        write_stub(bin_dir.path(), "dorado", dorado_script)?;
        write_stub(bin_dir.path(), "gzip", GZIP_STUB)?;
        write_stub(bin_dir.path(), "NanoPlot", NANOPLOT_STUB)?;
        Ok(StubEnv {
            bin_dir,
            pod5_dir: TempDir::new()?,
            out_root: TempDir::new()?,
        })
    }

    fn path_var(&self) -> String {
        format!(
            "{}:{}",
            self.bin_dir.path().display(),
            std::env::var("PATH").unwrap_or_default()
        )
    }

    fn command(&self, out_dir: &Path) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_dorado-runner"));
        cmd.arg(self.pod5_dir.path())
            .arg("--output_dir")
            .arg(out_dir)
            .args(["--prefix", "sampleA", "--threads", "2"])
            .env("PATH", self.path_var());
        cmd
    }
}

#[test]
fn pipeline_produces_expected_layout() -> Result<()> {
    let env = StubEnv::new(DORADO_STUB)?;
    let out_dir = env.out_root.path().join("run1");

    let status = env.command(&out_dir).status()?;
    assert!(status.success());

    let calls = out_dir.join("sampleA_calls.bam");
    assert!(calls.is_file(), "calls file missing");
    assert_eq!(fs::read(&calls)?, b"BAM\x01stub-calls");

    let demux_dir = out_dir.join("sampleA_demux_fastq_files");
    assert!(demux_dir.is_dir());

    // unclassified reads are dropped outright
    assert!(!demux_dir.join("unclassified.fastq").exists());
    assert!(!demux_dir.join("unclassified.fastq.gz").exists());

    // the undersized barcode is gone before compression
    assert!(!demux_dir.join("barcode02.fastq").exists());
    assert!(!demux_dir.join("barcode02.fastq.gz").exists());

    // the surviving barcode is compressed and reported on
    assert!(!demux_dir.join("barcode01.fastq").exists());
    assert!(demux_dir.join("barcode01.fastq.gz").is_file());
    assert!(demux_dir.join("barcode01_NanoPlot").is_dir());

    Ok(())
}

#[test]
fn failing_basecaller_halts_the_run_and_propagates_its_status() -> Result<()> {
    let env = StubEnv::new(DORADO_STUB_FAILING)?;
    let out_dir = env.out_root.path().join("run2");

    let status = env.command(&out_dir).status()?;
    assert_eq!(status.code(), Some(3));

    // demux never ran
    assert!(!out_dir.join("sampleA_demux_fastq_files").exists());
    Ok(())
}

#[test]
fn sample_sheet_is_forwarded_to_demux() -> Result<()> {
    let env = StubEnv::new(DORADO_STUB)?;
    let out_dir = env.out_root.path().join("run3");

    let sheet = env.out_root.path().join("sheet.csv");
    fs::write(&sheet, "flow_cell_id,kit,barcode,alias\n")?;
    let dorado_log = env.out_root.path().join("dorado_args.log");

    let status = env
        .command(&out_dir)
        .arg("--sample_sheet")
        .arg(&sheet)
        .env("DORADO_LOG", &dorado_log)
        .status()?;
    assert!(status.success());

    let log = fs::read_to_string(&dorado_log)?;
    let demux_line = log
        .lines()
        .find(|l| l.starts_with("demux"))
        .expect("demux was never invoked");
    assert!(demux_line.contains(&format!("--sample-sheet {}", sheet.display())));
    assert!(demux_line.contains("--emit-fastq"));

    let basecall_line = log
        .lines()
        .find(|l| l.starts_with("basecaller"))
        .expect("basecaller was never invoked");
    assert!(basecall_line.contains("--kit-name SQK-RBK114-96"));
    assert!(basecall_line.contains("--min-qscore 8"));
    Ok(())
}

#[test]
fn missing_unclassified_output_is_fatal() -> Result<()> {
    let env = StubEnv::new(DORADO_STUB_NO_UNCLASSIFIED)?;
    let out_dir = env.out_root.path().join("run4");

    let status = env.command(&out_dir).status()?;
    assert!(!status.success());

    // post-processing aborted before compression
    let demux_dir = out_dir.join("sampleA_demux_fastq_files");
    assert!(demux_dir.join("barcode01.fastq").exists());
    assert!(!demux_dir.join("barcode01.fastq.gz").exists());
    Ok(())
}

#[test]
fn missing_pod5_path_fails_before_any_tool_runs() -> Result<()> {
    let env = StubEnv::new(DORADO_STUB)?;
    let out_dir = env.out_root.path().join("run5");

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_dorado-runner"));
    let status = cmd
        .arg(env.pod5_dir.path().join("does-not-exist"))
        .arg("--output_dir")
        .arg(&out_dir)
        .env("PATH", env.path_var())
        .status()?;
    assert!(!status.success());
    assert!(!out_dir.join("sample_calls.bam").exists());
    Ok(())
}
