use std::fmt;

/// Absolute path of the handler executable, with Windows-style path helpers
/// that behave the same on every host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executable {
    path: String,
}

impl Executable {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// `notepad++.exe`
    pub fn file_name(&self) -> &str {
        file_name(&self.path)
    }

    /// `notepad++`
    pub fn stem(&self) -> &str {
        file_stem(&self.path)
    }

    pub fn directory(&self) -> &str {
        match self.path.rfind(is_separator) {
            // keep the separator for roots: `/`, `C:\`
            Some(i) if i == 0 || self.path[..i].ends_with(':') => &self.path[..=i],
            Some(i) => &self.path[..i],
            None => "",
        }
    }

    pub fn open_command(&self) -> String {
        format!("\"{}\" \"%1\"", self.path)
    }

    pub fn default_icon(&self) -> String {
        format!("\"{}\",0", self.path)
    }
}

impl fmt::Display for Executable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

pub fn file_name(path: &str) -> &str {
    path.rsplit(is_separator).next().unwrap_or(path)
}

fn is_separator(c: char) -> bool {
    c == '\\' || c == '/'
}

pub fn file_stem(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(i) if i > 0 => &name[..i],
        _ => name,
    }
}
