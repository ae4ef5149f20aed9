use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;

/// Rebuilds a path with an optional prefix/suffix spliced onto the file name
/// and an optional base directory for relative paths.
///
/// # Arguments
///
/// * `path` - Path whose file name is being manipulated.
/// * `base_dir` - Directory to anchor relative results under.
/// * `prefix` - Optional string prepended to the file name.
/// * `suffix` - Optional string appended to the file name.
/// * `separator` - Placed between the file name and each added part.
///
/// # Returns
/// The rebuilt path.
pub fn file_path_manipulator(
    path: &Path,
    base_dir: Option<&Path>,
    prefix: Option<&str>,
    suffix: Option<&str>,
    separator: &str,
) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if let Some(prefix) = prefix {
        name = format!("{}{}{}", prefix, separator, name);
    }
    if let Some(suffix) = suffix {
        name = format!("{}{}{}", name, separator, suffix);
    }
    let renamed = path.with_file_name(name);
    match base_dir {
        Some(base) if renamed.is_relative() => base.join(renamed),
        _ => renamed,
    }
}

/// Lists the regular files in `dir` whose names end with `suffix`, sorted so
/// downstream tool invocations are deterministic.
pub fn files_with_suffix(dir: &Path, suffix: &str) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(suffix));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Deletes every file in `dir` ending with `suffix` that is smaller than
/// `min_bytes`, returning the survivors.
pub fn remove_files_below(dir: &Path, suffix: &str, min_bytes: u64) -> io::Result<Vec<PathBuf>> {
    let mut survivors = Vec::new();
    for path in files_with_suffix(dir, suffix)? {
        let size = fs::metadata(&path)?.len();
        if size < min_bytes {
            fs::remove_file(&path)?;
            info!("Removed undersized file {} ({} bytes)", path.display(), size);
        } else {
            survivors.push(path);
        }
    }
    Ok(survivors)
}
