//! Common utilities for benchmarks

use camino::Utf8Path;
use criterion::Criterion;
use pprof::criterion::{Output, PProfProfiler};
use std::fmt::Write as _;

/// Configure criterion with flamegraph profiling support
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(3))
        .measurement_time(std::time::Duration::from_secs(10))
        .sample_size(100)
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}

/// Synthetic manifest with `count` declarations split into commented sections.
///
/// Mixes exact pins, ranges, compatible releases, extras, markers and VCS
/// references so every parser path is hit.
pub fn generate_manifest(count: usize) -> String {
    let mut text = String::new();
    for i in 0..count {
        if i % 10 == 0 {
            let _ = writeln!(text, "\n# section {}", i / 10);
        }
        let line = match i % 6 {
            0 => format!("package-{}=={}.{}.{}", i, i % 5 + 1, i % 10, i % 7),
            1 => format!("package-{}>={}.0,<{}.0", i, i % 5 + 1, i % 5 + 2),
            2 => format!("package-{}~={}.{}", i, i % 3 + 1, i % 9),
            3 => format!("Package_{}[extra]>=1.{} ; python_version >= \"3.8\"", i, i % 4),
            4 => format!(
                "package-{} @ git+https://github.com/example/package-{}.git@{:040x}",
                i, i, i
            ),
            _ => format!("package-{}  # unpinned on purpose", i),
        };
        text.push_str(&line);
        text.push('\n');
    }
    text
}

/// Synthetic Python module importing `imports` distinct top-level modules.
pub fn generate_python_source(imports: usize) -> String {
    let mut text = String::from("\"\"\"Generated module.\n\nimport not_real\n\"\"\"\n");
    for i in 0..imports {
        match i % 4 {
            0 => {
                let _ = writeln!(text, "import package_{}", i);
            }
            1 => {
                let _ = writeln!(text, "from package_{}.sub import thing  # comment", i);
            }
            2 => {
                let _ = writeln!(text, "import os, package_{} as p{}", i, i);
            }
            _ => {
                let _ = writeln!(text, "    from package_{} import (a, b)", i);
            }
        }
        let _ = writeln!(text, "value_{} = \"import fake_{}\"", i, i);
    }
    text
}

/// Write `files` generated Python modules under `root`.
pub fn write_source_tree(root: &Utf8Path, files: usize, imports: usize) -> std::io::Result<()> {
    let source = generate_python_source(imports);
    for i in 0..files {
        let dir = root.join(format!("pkg_{}", i % 8));
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join(format!("module_{}.py", i)), &source)?;
    }
    Ok(())
}
