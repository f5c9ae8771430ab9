// src/replay/module_path.rs

use crate::model::ModulePath;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

pub const UNKNOWN_YEAR: &str = "Unknown Year";
pub const UNKNOWN_MODULE: &str = "Unknown Module";

fn year_segment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Year\s*\d+$").expect("year pattern is valid"))
}

/// Finds the first `Year N` segment of `relative` and the segment after it.
///
/// Both separators are accepted so archives copied from Windows resolve the
/// same way. Never fails: paths without a usable year segment resolve to the
/// `Unknown` placeholders.
pub fn resolve(relative: &Path) -> ModulePath {
    let text = relative.to_string_lossy();
    let parts: Vec<&str> = text.split(['/', '\\']).filter(|p| !p.is_empty()).collect();

    match parts.iter().position(|p| year_segment().is_match(p)) {
        Some(i) if i + 1 < parts.len() => ModulePath { year: parts[i].to_string(), module: parts[i + 1].to_string() },
        _ => unknown(),
    }
}

fn unknown() -> ModulePath {
    ModulePath { year: UNKNOWN_YEAR.to_string(), module: UNKNOWN_MODULE.to_string() }
}

/// Splits `"CODE - NAME"` on the first `" - "`; without one, both halves are the folder name.
pub fn split_module_name(module: &str) -> (String, String) {
    match module.split_once(" - ") {
        Some((code, name)) if !code.trim().is_empty() && !name.trim().is_empty() => {
            (code.trim().to_string(), name.trim().to_string())
        }
        _ => (module.trim().to_string(), module.trim().to_string()),
    }
}
