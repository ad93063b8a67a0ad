//! Helpers for the `translate` suite binary

use std::path::{Path, PathBuf};

/// Name the suite binary reports to test listers
pub const SUITE_TEST_NAME: &str = "suite";

/// Workspace root, where `swiftcheck.toml` and `node_modules` are looked up.
/// Cargo runs test binaries from the package directory, not from here.
pub fn workspace_root() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest
        .ancestors()
        .nth(2)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| manifest.to_path_buf())
}

/// Resolve a user-supplied path, or `default` under the workspace root
pub fn resolve(path: Option<PathBuf>, default: &str) -> PathBuf {
    path.unwrap_or_else(|| workspace_root().join(default))
}

/// Answer a libtest `--list` request the way libtest does.
///
/// Returns `None` unless `--list` is among `args`. The suite is one test; it
/// is never `#[ignore]`d, so `--ignored` lists nothing.
pub fn libtest_listing(args: &[String]) -> Option<String> {
    let has = |flag: &str| args.iter().any(|a| a == flag);
    if !has("--list") {
        return None;
    }

    let terse = args
        .windows(2)
        .any(|w| w[0] == "--format" && w[1] == "terse")
        || has("--format=terse");
    let count = usize::from(!has("--ignored"));

    let mut out = String::new();
    if count == 1 {
        out.push_str(&format!("{}: test\n", SUITE_TEST_NAME));
    }
    if !terse {
        let noun = if count == 1 { "test" } else { "tests" };
        out.push_str(&format!("\n{} {}, 0 benchmarks\n", count, noun));
    }
    Some(out)
}
