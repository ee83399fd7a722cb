//! Test fixtures for creating test data
//!
//! Canned conda outputs and on-disk environment trees.

use std::fs;
use std::path::{Path, PathBuf};

use envrecon::common::context::{ReconSettings, RunContext};

/// Clean `--from-history` export
pub const CLEAN_HISTORY: &str = "name: demo\nchannels:\n  - defaults\ndependencies:\n  - python=3.10\n  - numpy=1.24\nprefix: /envs/demo\n";

/// History with a build string, rejected by the classifier
pub const DIRTY_HISTORY: &str =
    "name: demo\ndependencies:\n  - python=3.9\n  - numpy=1.24=py39h1234567_0\n";

/// Full export with a pip section carrying constraints and comments
pub const FULL_EXPORT_WITH_PIP: &str = r#"name: demo
channels:
  - defaults
dependencies:
  - python=3.10.12
  - numpy=1.24.4
  - pip=23.2.1
  - pip:
      - requests==2.31.0
      - torch>=2.0  # gpu build
      - rich
prefix: /envs/demo
"#;

/// Full export without any pip section
pub const FULL_EXPORT_NO_PIP: &str =
    "name: demo\ndependencies:\n  - python=3.10.12\n  - numpy=1.24.4\n";

/// `conda list --export` output
pub const FLAT_LISTING: &str = "# This file may be used to create an environment using:\n# $ conda create --name <env> --file <this file>\n# platform: linux-64\n@EXPLICIT\npython=3.9.18=0\nnumpy=1.24.4=py39h1234567_0\nsix=1.16.0=pyhd3eb1b0_1\n";

/// Listing with only comments
pub const EMPTY_FLAT_LISTING: &str = "# This file may be used to create an environment using:\n# platform: linux-64\n";

/// History export with `count` bare entries
pub fn long_history(count: usize) -> String {
    let mut text = String::from("dependencies:\n");
    for i in 0..count {
        text.push_str(&format!("  - pkg{i}\n"));
    }
    text
}

/// Create a prefix with `conda-meta/history` below `root`
pub fn create_env(root: &Path, relative: &str) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(path.join("conda-meta")).unwrap();
    fs::write(
        path.join("conda-meta").join("history"),
        "==> 2024-01-01 00:00:00 <==\n# cmd: conda create -n env python\n# conda version: 23.7.4\n",
    )
    .unwrap();
    path
}

/// Create a base install (with a package cache) below `root`
pub fn create_base_install(root: &Path, relative: &str) -> PathBuf {
    let path = create_env(root, relative);
    fs::create_dir_all(path.join("pkgs")).unwrap();
    path
}

/// Context with default settings and a fake conda executable
pub fn test_context() -> RunContext {
    RunContext::new(ReconSettings::default(), "/opt/conda/bin/conda")
}
