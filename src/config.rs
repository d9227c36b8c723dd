use crate::executable::Executable;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Component, Path, PathBuf},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub executable: String,
    /// Normalized (`.ext`, lower-case), in file order, duplicates kept.
    pub extensions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TomlConfig {
    executable: String,
    #[serde(default)]
    extensions: Vec<String>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).is_file() {
            bail!("configuration file not found: {}", path);
        }
        let s = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path))?;
        if is_toml(path) {
            let raw: TomlConfig = toml::from_str(&s)
                .with_context(|| format!("invalid TOML in {}", path))?;
            Self::from_parts(raw.executable.trim(), raw.extensions.iter().map(String::as_str))
        } else {
            Self::parse(&s).with_context(|| format!("invalid config {}", path))
        }
    }

    /// First meaningful line is the executable, the rest are extensions.
    /// Blank lines and `#` comments are skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'));
        let Some(exe) = lines.next() else {
            bail!("config file must contain at least an executable path and one extension");
        };
        Self::from_parts(exe, lines)
    }

    fn from_parts<'a>(exe: &str, extensions: impl Iterator<Item = &'a str>) -> Result<Self> {
        let extensions: Vec<String> = extensions
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(normalize_extension)
            .collect();
        if exe.is_empty() || extensions.is_empty() {
            bail!("config file must contain at least an executable path and one extension");
        }
        Ok(Self { executable: exe.to_string(), extensions })
    }

    /// Absolute path of the configured executable; it must exist.
    /// Links are not followed, so the registry gets the path as configured.
    pub fn resolve_executable(&self) -> Result<Executable> {
        let p = Path::new(&self.executable);
        let abs = if p.is_absolute() {
            p.to_path_buf()
        } else {
            env::current_dir().context("read working directory")?.join(p)
        };
        let abs = dunce::simplified(&lexical_normalize(&abs)).to_path_buf();
        if !abs.is_file() {
            bail!("executable not found: {}", abs.display());
        }
        Ok(Executable::new(abs.to_string_lossy().to_string()))
    }
}

pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') { ext } else { format!(".{ext}") }
}

/// Drops `.` and folds `..` without touching the filesystem.
fn lexical_normalize(p: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for c in p.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn is_toml(path: &str) -> bool {
    Path::new(path)
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"))
}
