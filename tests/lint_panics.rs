//! Lint: engine code must report failures as `Result`s, never panic.
//!
//! Scans every `.rs` file under `src/` and flags `.unwrap()`, `.expect(`,
//! `panic!(` and `unreachable!(` outside `#[cfg(test)]` sections. A save that
//! fails to parse or a store that refuses a write must never take the host
//! page down with it.

use std::fs;
use std::path::Path;

const FORBIDDEN: &[&str] = &[".unwrap()", ".expect(", "panic!(", "unreachable!("];

/// Scan the non-test part of a source file for panicking calls.
fn find_panics(source: &str) -> Vec<(usize, String)> {
    let mut violations = Vec::new();

    for (line_num_0, line) in source.lines().enumerate() {
        let trimmed = line.trim();

        // Everything after the first test module is test code
        if trimmed.starts_with("#[cfg(test)]") {
            break;
        }

        if trimmed.starts_with("//") {
            continue;
        }

        if FORBIDDEN.iter().any(|pat| line.contains(pat)) {
            violations.push((line_num_0 + 1, trimmed.to_string()));
        }
    }

    violations
}

#[test]
fn no_panics_in_engine_code() {
    let src_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
    let mut all_violations = Vec::new();

    visit_source_files(&src_dir, &mut all_violations);

    if !all_violations.is_empty() {
        let mut msg = String::from(
            "Found panicking calls in non-test engine code.\n\
             Propagate an EconomyError/SaveError/ConfigError instead.\n\n",
        );
        for (file, line_num, line) in &all_violations {
            msg.push_str(&format!("  {}:{}: {}\n", file, line_num, line));
        }
        panic!("{}", msg);
    }
}

fn visit_source_files(dir: &Path, violations: &mut Vec<(String, usize, String)>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            visit_source_files(&path, violations);
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            let Ok(source) = fs::read_to_string(&path) else {
                continue;
            };
            let display_path = path.display().to_string();
            for (line_num, line) in find_panics(&source) {
                violations.push((display_path.clone(), line_num, line));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_unwrap() {
        let source = "let x = store.read(key).unwrap();";
        assert_eq!(find_panics(source).len(), 1);
    }

    #[test]
    fn detects_expect_and_panic() {
        let source = "let x = a.expect(\"boom\");\npanic!(\"no\");";
        assert_eq!(find_panics(source).len(), 2);
    }

    #[test]
    fn allows_unwrap_or() {
        let source = "let n = map.get(&k).copied().unwrap_or(0);";
        assert!(find_panics(source).is_empty());
    }

    #[test]
    fn ignores_comments() {
        let source = "// value.unwrap() is fine in a comment";
        assert!(find_panics(source).is_empty());
    }

    #[test]
    fn stops_at_test_module() {
        let source = "fn f() {}\n#[cfg(test)]\nmod tests { fn t() { x.unwrap(); } }";
        assert!(find_panics(source).is_empty());
    }
}
