// Shared build script helper that turns a crate README into crate-level rustdoc.
// Include this in build.rs files with: include!("../build_common.rs");
//
// Required imports in the including file:
//   use std::env;
//   use std::fs;
//   use std::path::Path;

/// Write `README_GENERATED.md` into `OUT_DIR` for `#![doc = include_str!(...)]`.
///
/// Links of the form `](src/foo.rs)` are rewritten to `](foo)` so rustdoc
/// resolves them as modules, and `](../../README.md` is pointed at the
/// repository URL declared in the workspace manifest. A crate without a
/// README gets a one-line doc naming the crate.
fn process_readme_for_rustdoc(crate_dir: &str) {
    println!("cargo:rerun-if-changed=README.md");
    println!("cargo:rerun-if-changed=../../Cargo.toml");

    let readme_path = Path::new(crate_dir).join("README.md");
    let rustdoc_content = match fs::read_to_string(&readme_path) {
        Ok(content) => {
            let mut rewritten = content.replace("](src/", "](").replace(".rs)", ")");
            if let Some(url) = workspace_repo_url(crate_dir) {
                rewritten = rewritten.replace("](../../README.md", &format!("]({url}"));
            }
            rewritten
        }
        Err(_) => {
            let name = env::var("CARGO_PKG_NAME").unwrap_or_default();
            format!("`{name}`\n")
        }
    };

    let out_dir = env::var("OUT_DIR").unwrap();
    fs::write(Path::new(&out_dir).join("README_GENERATED.md"), rustdoc_content).unwrap();
}

/// Read `repository = "..."` from the workspace `Cargo.toml`.
fn workspace_repo_url(crate_dir: &str) -> Option<String> {
    let workspace_toml = Path::new(crate_dir).parent()?.parent()?.join("Cargo.toml");
    let content = fs::read_to_string(workspace_toml).ok()?;

    content.lines().map(str::trim).find_map(|line| {
        if !line.starts_with("repository") || !line.contains('=') {
            return None;
        }
        let start = line.find('"')?;
        let end = line.rfind('"')?;
        (start < end).then(|| line[start + 1..end].to_string())
    })
}
