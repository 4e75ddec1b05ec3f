//! Minimal parser for Java-style `key=value` properties files, as used by
//! `spark-defaults.conf`.

use std::path::Path;

/// Parse properties from a string. Blank lines and `#`/`!` comment lines are
/// skipped; the first unescaped `=` separates key and value. Keys and values
/// are trimmed. Declaration order is preserved.
pub fn parse_properties(contents: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        if let Some(split_at) = find_separator(line) {
            let key = line[..split_at].trim();
            let value = line[split_at + 1..].trim();
            if !key.is_empty() {
                pairs.push((key.to_string(), value.to_string()));
            }
        }
    }
    pairs
}

/// Load and parse a properties file. A missing or unreadable file yields an
/// empty list, callers treat local defaults as optional.
pub fn load_properties_file(path: &Path) -> Vec<(String, String)> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_properties(&contents),
        Err(_) => Vec::new(),
    }
}

fn find_separator(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    for (index, byte) in bytes.iter().enumerate() {
        if *byte == b'=' && (index == 0 || bytes[index - 1] != b'\\') {
            return Some(index);
        }
    }
    None
}
