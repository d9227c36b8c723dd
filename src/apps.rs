use crate::executable::Executable;
use crate::registry::{Hive, RegResult, RegistryStore, APPLICATIONS, APP_PATHS};
use tracing::{info, warn};

#[derive(Debug)]
pub struct AppRegistration {
    /// Hive the App Paths entry landed in, if any.
    pub app_paths: RegResult<Hive>,
    pub applications: RegResult<()>,
}

/// One-time, per-run registration of the executable itself.
pub fn register_application(store: &dyn RegistryStore, exe: &Executable) -> AppRegistration {
    let app_paths = register_app_paths(store, exe);
    match &app_paths {
        Ok(Hive::LocalMachine) => info!("registered App Paths (system): {}", exe.file_name()),
        Ok(_) => info!("registered App Paths (user): {}", exe.file_name()),
        Err(e) => warn!("could not register in App Paths: {e}"),
    }

    let applications = register_in_applications(store, exe);
    match &applications {
        Ok(()) => info!("registered in Applications: {}", exe.file_name()),
        Err(e) if e.is_permission_denied() => warn!("could not register in Applications (needs admin)"),
        Err(e) => warn!("failed to register in Applications: {e}"),
    }

    AppRegistration { app_paths, applications }
}

/// Prefers the machine-wide hive and falls back to the user hive on access denied.
pub fn register_app_paths(store: &dyn RegistryStore, exe: &Executable) -> RegResult<Hive> {
    match write_app_paths(store, Hive::LocalMachine, exe) {
        Ok(()) => Ok(Hive::LocalMachine),
        Err(e) if e.is_permission_denied() => {
            write_app_paths(store, Hive::CurrentUser, exe).map(|()| Hive::CurrentUser)
        }
        Err(e) => Err(e),
    }
}

fn write_app_paths(store: &dyn RegistryStore, hive: Hive, exe: &Executable) -> RegResult<()> {
    let key = format!("{APP_PATHS}\\{}", exe.file_name());
    store.set_string(hive, &key, "", exe.path())?;
    store.set_string(hive, &key, "Path", exe.directory())
}

pub fn register_in_applications(store: &dyn RegistryStore, exe: &Executable) -> RegResult<()> {
    let key = format!("{APPLICATIONS}\\{}", exe.file_name());
    store.set_string(Hive::ClassesRoot, &key, "FriendlyAppName", exe.stem())?;
    store.set_string(
        Hive::ClassesRoot,
        &format!("{key}\\shell\\open\\command"),
        "",
        &exe.open_command(),
    )?;
    store.set_string(Hive::ClassesRoot, &format!("{key}\\DefaultIcon"), "", &exe.default_icon())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::memory::MemoryRegistry;

    fn exe() -> Executable {
        Executable::new("C:\\Tools\\Edit Pad\\pad.exe")
    }

    #[test]
    fn app_paths_machine_wide_when_allowed() {
        let reg = MemoryRegistry::new();
        assert_eq!(register_app_paths(&reg, &exe()).unwrap(), Hive::LocalMachine);
        let key = format!("{APP_PATHS}\\pad.exe");
        assert_eq!(reg.get_string(Hive::LocalMachine, &key, "").unwrap(), "C:\\Tools\\Edit Pad\\pad.exe");
        assert_eq!(reg.get_string(Hive::LocalMachine, &key, "Path").unwrap(), "C:\\Tools\\Edit Pad");
    }

    #[test]
    fn app_paths_falls_back_to_user_hive() {
        let reg = MemoryRegistry::new();
        reg.deny_writes(Hive::LocalMachine, "");
        assert_eq!(register_app_paths(&reg, &exe()).unwrap(), Hive::CurrentUser);
        assert!(reg
            .key_exists(Hive::CurrentUser, &format!("{APP_PATHS}\\pad.exe"))
            .unwrap());
    }

    #[test]
    fn applications_entry_and_independent_failures() {
        let reg = MemoryRegistry::new();
        reg.deny_writes(Hive::LocalMachine, "");
        reg.deny_writes(Hive::CurrentUser, "");
        let out = register_application(&reg, &exe());
        assert!(out.app_paths.is_err());
        assert!(out.applications.is_ok());
        assert_eq!(
            reg.get_string(Hive::ClassesRoot, "Applications\\pad.exe", "FriendlyAppName").unwrap(),
            "pad"
        );
        assert_eq!(
            reg.get_string(Hive::ClassesRoot, "Applications\\pad.exe\\DefaultIcon", "").unwrap(),
            "\"C:\\Tools\\Edit Pad\\pad.exe\",0"
        );
    }
}
