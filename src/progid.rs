use crate::executable::Executable;
use crate::registry::{Hive, RegResult, RegistryStore};
use tracing::{debug, error};

/// `C:\Apps\My App.exe` + `.txt` -> `MyApp.txt`
pub fn generate(exe: &Executable, extension: &str) -> String {
    let app: String = exe.stem().chars().filter(|c| c.is_alphanumeric()).collect();
    format!("{app}.{}", extension.trim_start_matches('.'))
}

pub fn describe(exe: &Executable, extension: &str) -> String {
    format!("{} {} File", exe.stem(), extension.to_uppercase())
}

/// Creates or overwrites the ProgID: description, DefaultIcon and open command.
pub fn register(
    store: &dyn RegistryStore,
    exe: &Executable,
    prog_id: &str,
    description: Option<&str>,
) -> RegResult<()> {
    let description = description
        .map(str::to_string)
        .unwrap_or_else(|| format!("{} Document", exe.stem()));

    let res = write_entries(store, exe, prog_id, &description);
    match &res {
        Ok(()) => debug!("created ProgID {prog_id}"),
        Err(e) if e.is_permission_denied() => {
            error!("permission denied creating ProgID {prog_id}; try running as Administrator")
        }
        Err(e) => error!("failed to create ProgID {prog_id}: {e}"),
    }
    res
}

fn write_entries(
    store: &dyn RegistryStore,
    exe: &Executable,
    prog_id: &str,
    description: &str,
) -> RegResult<()> {
    store.set_string(Hive::ClassesRoot, prog_id, "", description)?;
    store.set_string(Hive::ClassesRoot, &format!("{prog_id}\\DefaultIcon"), "", &exe.default_icon())?;
    store.set_string(
        Hive::ClassesRoot,
        &format!("{prog_id}\\shell\\open\\command"),
        "",
        &exe.open_command(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::memory::MemoryRegistry;

    #[test]
    fn generated_ids_strip_non_alphanumerics() {
        let exe = Executable::new("C:\\Apps\\My App.exe");
        assert_eq!(generate(&exe, ".txt"), "MyApp.txt");
        assert_eq!(generate(&exe, ".log"), "MyApp.log");
        let npp = Executable::new("C:\\Program Files\\Notepad++\\notepad++.exe");
        assert_eq!(generate(&npp, ".ini"), "notepad.ini");
    }

    #[test]
    fn description_uses_upper_extension() {
        let exe = Executable::new("C:\\Apps\\edit.exe");
        assert_eq!(describe(&exe, ".md"), "edit .MD File");
    }

    #[test]
    fn register_twice_overwrites() {
        let reg = MemoryRegistry::new();
        let exe = Executable::new("C:\\Apps\\edit.exe");
        register(&reg, &exe, "edit.md", None).unwrap();
        register(&reg, &exe, "edit.md", None).unwrap();

        assert_eq!(reg.values(Hive::ClassesRoot, "edit.md").unwrap().len(), 1);
        assert_eq!(reg.get_string(Hive::ClassesRoot, "edit.md", "").unwrap(), "edit Document");
        assert_eq!(
            reg.get_string(Hive::ClassesRoot, "edit.md\\DefaultIcon", "").unwrap(),
            "\"C:\\Apps\\edit.exe\",0"
        );
        assert_eq!(
            reg.get_string(Hive::ClassesRoot, "edit.md\\shell\\open\\command", "").unwrap(),
            "\"C:\\Apps\\edit.exe\" \"%1\""
        );
    }

    #[test]
    fn denied_registration_reports_cause() {
        let reg = MemoryRegistry::new();
        reg.deny_writes(Hive::ClassesRoot, "");
        let exe = Executable::new("C:\\Apps\\edit.exe");
        let err = register(&reg, &exe, "edit.md", Some("x")).unwrap_err();
        assert!(err.is_permission_denied());
    }
}
