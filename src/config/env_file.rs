//! Reading and updating a dotenv file.
//!
//! The CLI loads `.env` at startup and, after deployment, records the new
//! `CONTRACT_ADDRESS` in it. Updates preserve other lines, comments and
//! ordering.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

/// Load the dotenv file at `path` into the process environment.
///
/// Variables that are already set win over the file. A missing file is not
/// an error; the return value says whether anything was loaded.
pub fn load_env_file(path: &Path) -> Result<bool, dotenvy::Error> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Parse the dotenv file at `path` without touching the environment.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>, dotenvy::Error> {
    dotenvy::from_path_iter(path)?.collect()
}

/// Set `key` to `value` in dotenv-formatted `content`.
///
/// Every existing `key=` line is replaced; if none exists the entry is
/// appended.
pub fn set_var(content: &str, key: &str, value: &str) -> String {
    let entry = format!("{}={}", key, value);
    let mut found = false;

    let mut lines: Vec<String> = content
        .lines()
        .map(|line| {
            if is_entry_for(line, key) {
                found = true;
                entry.clone()
            } else {
                line.to_string()
            }
        })
        .collect();

    if !found {
        lines.push(entry);
    }

    let mut updated = lines.join("\n");
    updated.push('\n');
    updated
}

fn is_entry_for(line: &str, key: &str) -> bool {
    let line = line.trim_start();
    let line = line.strip_prefix("export ").unwrap_or(line);
    line.strip_prefix(key)
        .map(|rest| rest.trim_start().starts_with('='))
        .unwrap_or(false)
}

/// Rewrite `key` in the dotenv file at `path`, creating the file if needed.
pub fn update_env_file(path: &Path, key: &str, value: &str) -> io::Result<()> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e),
    };

    fs::write(path, set_var(&content, key, value))
}
