// Copyright (c) 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Plain-text per-length lookup tables.
//!
//! Two layouts are accepted, both holding one value per cycle length
//! `1..=N`:
//!
//! - `N` whitespace-separated integers, in length order;
//! - `N` lines of `<length> <value>`, with `<length>` counting up from 1.
//!
//! `#` starts a comment that runs to the end of the line.

use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("cannot read table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{source_name}: line {line}: {token:?} is not a non-negative integer")]
    Parse { source_name: String, line: usize, token: String },

    #[error("{source_name}: expected {expected} entries, found {found}")]
    Short { source_name: String, expected: usize, found: usize },

    #[error("{source_name}: expected {expected} entries, found {found} values")]
    Extra { source_name: String, expected: usize, found: usize },

    #[error("{source_name}: line {line}: cycle length {found} out of order, expected {expected}")]
    BadLength { source_name: String, line: usize, expected: u64, found: u64 },
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Read a table for an `ports`-port switch from disk.
pub fn read_table(path: &Path, ports: usize) -> Result<Vec<u64>, TableError> {
    let text = std::fs::read_to_string(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let values = parse_table(&path.display().to_string(), &text, ports)?;
    log::debug!("loaded {} table entries from {}", values.len(), path.display());
    Ok(values)
}

/// Parse table text. `source_name` only appears in error messages.
pub fn parse_table(source_name: &str, text: &str, ports: usize) -> Result<Vec<u64>, TableError> {
    let mut lines: Vec<(usize, Vec<u64>)> = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw.split('#').next().unwrap_or("");
        let mut values = Vec::new();
        for token in content.split_whitespace() {
            let value = token.parse::<u64>().map_err(|_| TableError::Parse {
                source_name: source_name.to_string(),
                line,
                token: token.to_string(),
            })?;
            values.push(value);
        }
        if !values.is_empty() {
            lines.push((line, values));
        }
    }

    let found: usize = lines.iter().map(|(_, v)| v.len()).sum();
    let paired = ports > 0 && found == 2 * ports && lines.iter().all(|(_, v)| v.len() == 2);

    if paired {
        let mut table = Vec::with_capacity(ports);
        for (expected, (line, pair)) in (1u64..).zip(lines.iter()) {
            if pair[0] != expected {
                return Err(TableError::BadLength {
                    source_name: source_name.to_string(),
                    line: *line,
                    expected,
                    found: pair[0],
                });
            }
            table.push(pair[1]);
        }
        return Ok(table);
    }

    if found < ports {
        return Err(TableError::Short { source_name: source_name.to_string(), expected: ports, found });
    }
    if found > ports {
        return Err(TableError::Extra { source_name: source_name.to_string(), expected: ports, found });
    }
    Ok(lines.into_iter().flat_map(|(_, v)| v).collect())
}
