// src/utils/streams.rs
use anyhow::{Result, anyhow};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChildStream {
    Stdout,
    Stderr,
}

/// Collects one of a child's output streams into a vector of lines.
/// The stream must have been spawned piped; it is consumed to EOF.
///
/// # Arguments
///
/// * `child` - The spawned child process.
/// * `stream` - Which of the child's streams to read.
///
/// # Returns
/// Vector of output lines.
pub async fn read_child_output_to_vec(
    child: &mut Child,
    stream: ChildStream,
) -> Result<Vec<String>> {
    let lines: Vec<String> = match stream {
        ChildStream::Stdout => {
            let stdout = child
                .stdout
                .take()
                .ok_or_else(|| anyhow!("Failed to capture child stdout"))?;
            LinesStream::new(BufReader::new(stdout).lines())
                .collect::<Result<Vec<String>, std::io::Error>>()
                .await?
        }
        ChildStream::Stderr => {
            let stderr = child
                .stderr
                .take()
                .ok_or_else(|| anyhow!("Failed to capture child stderr"))?;
            LinesStream::new(BufReader::new(stderr).lines())
                .collect::<Result<Vec<String>, std::io::Error>>()
                .await?
        }
    };
    Ok(lines)
}

/// Streams a child's stdout into a file on disk, byte for byte.
/// Used for tools that write their primary output to stdout.
///
/// # Arguments
///
/// * `child` - The spawned child process, stdout piped.
/// * `path` - Destination file; truncated if it exists.
///
/// # Returns
/// Number of bytes written.
pub async fn write_child_stdout_to_file(child: &mut Child, path: &Path) -> Result<u64> {
    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("Failed to capture child stdout"))?;
    let mut file = tokio::fs::File::create(path).await?;
    let bytes = tokio::io::copy(&mut stdout, &mut file).await?;
    file.flush().await?;
    Ok(bytes)
}
