use crate::error::{CliError, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extension of identifier list files.
pub const IDENTIFIER_LIST_EXTENSION: &str = "gcd";

const EXCLUDED_MARKER: char = '#';

fn read_lines(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads one identifier per line, skipping blank lines and `#` comments.
pub fn read_identifier_list(path: &Path) -> Result<Vec<String>> {
    Ok(read_lines(path)?
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn list_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| CliError::Read {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| CliError::Read {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(IDENTIFIER_LIST_EXTENSION))
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Collects the identifiers of every input, which may be a list file or a directory of
/// `.gcd` list files. The result is deduplicated and sorted.
pub fn collect_identifiers(inputs: &[PathBuf]) -> Result<Vec<String>> {
    let mut identifiers = BTreeSet::new();
    for input in inputs {
        let files = if input.is_dir() {
            list_files_in(input)?
        } else if input.is_file() {
            vec![input.clone()]
        } else {
            return Err(CliError::Argument(format!(
                "Input '{}' is neither a file nor a directory",
                input.display()
            )));
        };
        for file in files {
            let listed = read_identifier_list(&file)?;
            debug!("{} identifier(s) listed in {}", listed.len(), file.display());
            identifiers.extend(listed);
        }
    }
    info!("Collected {} unique identifier(s)", identifiers.len());
    Ok(identifiers.into_iter().collect())
}

/// Reads identifiers to skip. Ledger lines such as `ABEBUF: polymeric` contribute the
/// part before the first colon.
pub fn read_exclusions(path: &Path) -> Result<BTreeSet<String>> {
    Ok(read_lines(path)?
        .lines()
        .filter_map(|line| line.split(':').next())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect())
}

/// Prefixes excluded identifiers with `#` so the run counts them without processing them.
pub fn mark_excluded(identifiers: Vec<String>, excluded: &BTreeSet<String>) -> Vec<String> {
    identifiers
        .into_iter()
        .map(|id| {
            if excluded.contains(&id) {
                format!("{}{}", EXCLUDED_MARKER, id)
            } else {
                id
            }
        })
        .collect()
}
