//! Fixture manifest for span golden tests.
//!
//! A fixtures directory holds `manifest.toml` plus one input and one expected
//! snapshot file per case:
//!
//! ```toml
//! [[case]]
//! name = "basic"
//! input = "basic.html"
//! expected = "basic.snap"
//! context = "div"   # optional fragment context tag
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(rename = "case")]
    pub cases: Vec<SpanCase>,
}

#[derive(Debug, Deserialize)]
pub struct SpanCase {
    pub name: String,
    pub input: String,
    pub expected: String,
    pub context: Option<String>,
}

impl SpanCase {
    pub fn input_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.input)
    }

    pub fn expected_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.expected)
    }
}

pub fn load_manifest(dir: &Path) -> Manifest {
    let path = dir.join("manifest.toml");
    let raw = std::fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("read {}: {err}", path.display()));
    toml::from_str(&raw).unwrap_or_else(|err| panic!("parse {}: {err}", path.display()))
}

/// Expected snapshot lines; trailing newline and `#`-prefixed lines ignored.
pub fn load_expected(path: &Path) -> Vec<String> {
    let raw = std::fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("read {}: {err}", path.display()));
    raw.lines()
        .filter(|line| !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
