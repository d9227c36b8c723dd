use crate::executable::file_stem;
use crate::registry::{file_exts_key, Hive, RegistryStore};
use std::path::Path;
use tracing::debug;

/// What the registry currently says about one extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationQuery {
    pub extension: String,
    pub has_default: bool,
    pub prog_id: Option<String>,
    pub executable: Option<String>,
    pub description: Option<String>,
}

impl AssociationQuery {
    fn empty(extension: &str) -> Self {
        Self { extension: extension.to_string(), ..Default::default() }
    }

    /// Short name of the current handler for display.
    pub fn handler_name(&self) -> &str {
        match (&self.executable, &self.prog_id) {
            (Some(exe), _) => file_stem(exe),
            (None, Some(id)) => id,
            (None, None) => "Unknown",
        }
    }
}

/// Resolves the current default for `extension` (lower-case, leading dot).
///
/// The per-user UserChoice override wins and is trusted as-is. Otherwise the
/// class registration is consulted and its open command checked. Read failures
/// only mean that one fact is unknown.
pub fn lookup(store: &dyn RegistryStore, extension: &str) -> AssociationQuery {
    let mut info = AssociationQuery::empty(extension);

    let user_choice = file_exts_key(extension, "UserChoice");
    if let Ok(id) = store.get_string(Hive::CurrentUser, &user_choice, "ProgId") {
        if !id.is_empty() {
            info.prog_id = Some(id);
            info.has_default = true;
        }
    }

    if !info.has_default {
        match store.key_exists(Hive::ClassesRoot, extension) {
            Ok(true) => {
                if let Ok(id) = store.get_string(Hive::ClassesRoot, extension, "") {
                    if !id.is_empty() {
                        info.prog_id = Some(id);
                    }
                }
            }
            Ok(false) => {
                debug!("{extension}: not registered");
                return info;
            }
            Err(e) => debug!("{extension}: class key unreadable: {e}"),
        }
    }

    if let Some(id) = info.prog_id.clone() {
        let command_key = format!("{id}\\shell\\open\\command");
        match store.get_string(Hive::ClassesRoot, &command_key, "") {
            Ok(command) => {
                info.executable = command_executable(&command).map(str::to_string);
            }
            Err(e) => debug!("{extension}: no open command for {id}: {e}"),
        }

        if let Some(exe) = &info.executable {
            if Path::new(exe).is_file() || !exe.starts_with('%') {
                info.has_default = true;
            }
        }

        if let Ok(desc) = store.get_string(Hive::ClassesRoot, &id, "") {
            info.description = Some(desc);
        }
    }

    info
}

/// Leading executable of a shell command line: the quoted prefix, or the
/// first whitespace-delimited token.
pub fn command_executable(command: &str) -> Option<&str> {
    if let Some(rest) = command.strip_prefix('"') {
        return match rest.find('"') {
            Some(end) if end > 0 => Some(&rest[..end]),
            _ => None,
        };
    }
    command.split_whitespace().next()
}
