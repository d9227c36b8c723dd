pub mod memory;
#[cfg(windows)]
pub mod windows;

use std::{fmt, io};
use thiserror::Error;
use tracing::debug;

pub const FILE_EXTS: &str = "Software\\Microsoft\\Windows\\CurrentVersion\\Explorer\\FileExts";
pub const APP_PATHS: &str = "Software\\Microsoft\\Windows\\CurrentVersion\\App Paths";
pub const APPLICATIONS: &str = "Applications";
pub const MRU_LIST: &str = "MRUList";

/// Root namespaces the tool reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Hive {
    ClassesRoot,
    CurrentUser,
    LocalMachine,
}

impl fmt::Display for Hive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Hive::ClassesRoot => "HKCR",
            Hive::CurrentUser => "HKCU",
            Hive::LocalMachine => "HKLM",
        };
        f.write_str(s)
    }
}

/// Value payloads the tool cares about. Anything else is surfaced as `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegData {
    String(String),
    /// Empty REG_NONE marker, used for OpenWithProgids entries.
    None,
    /// Read-only: a type the tool never writes.
    Other,
}

impl RegData {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RegData::String(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("access denied: {0}")]
    PermissionDenied(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("registry error at {path}: {message}")]
    Other { path: String, message: String },
}

impl RegistryError {
    pub fn classify(hive: Hive, path: &str, err: io::Error) -> Self {
        let at = format!("{hive}\\{path}");
        match err.kind() {
            io::ErrorKind::PermissionDenied => RegistryError::PermissionDenied(at),
            io::ErrorKind::NotFound => RegistryError::NotFound(at),
            _ => RegistryError::Other { path: at, message: err.to_string() },
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, RegistryError::PermissionDenied(_))
    }
}

pub type RegResult<T> = std::result::Result<T, RegistryError>;

/// Hierarchical key-value store with the registry's shape.
///
/// Writes create the key (and its ancestors) on demand. Every call opens and
/// releases its own key handle.
pub trait RegistryStore {
    fn key_exists(&self, hive: Hive, path: &str) -> RegResult<bool>;

    /// Reads a string value. `name == ""` addresses the key's default value.
    fn get_string(&self, hive: Hive, path: &str, name: &str) -> RegResult<String>;

    fn set_value(&self, hive: Hive, path: &str, name: &str, data: &RegData) -> RegResult<()>;

    fn values(&self, hive: Hive, path: &str) -> RegResult<Vec<(String, RegData)>>;

    fn set_string(&self, hive: Hive, path: &str, name: &str, value: &str) -> RegResult<()> {
        self.set_value(hive, path, name, &RegData::String(value.to_string()))
    }
}

/// Rejects payloads a store must not write. `Other` has no bytes to write back.
pub fn check_writable(hive: Hive, path: &str, name: &str, data: &RegData) -> RegResult<()> {
    match data {
        RegData::Other => Err(RegistryError::Other {
            path: format!("{hive}\\{path}"),
            message: format!("refusing to write value {name:?} of unknown type"),
        }),
        _ => Ok(()),
    }
}

/// Collects enumerated items up to the first error, keeping what was read.
pub fn take_until_error<T>(items: impl IntoIterator<Item = io::Result<T>>) -> Vec<T> {
    let mut out = Vec::new();
    for item in items {
        match item {
            Ok(v) => out.push(v),
            Err(e) => {
                debug!("enumeration stopped early: {e}");
                break;
            }
        }
    }
    out
}

pub fn file_exts_key(extension: &str, sub: &str) -> String {
    format!("{FILE_EXTS}\\{extension}\\{sub}")
}
