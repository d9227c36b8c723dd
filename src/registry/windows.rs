use super::{check_writable, take_until_error, Hive, RegData, RegResult, RegistryError, RegistryStore};
use std::io;
use winreg::{enums::*, types::FromRegValue, RegKey, RegValue};

/// The live registry, through `winreg`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsRegistry;

impl WindowsRegistry {
    pub fn new() -> Self {
        Self
    }
}

fn root(hive: Hive) -> RegKey {
    let h = match hive {
        Hive::ClassesRoot => HKEY_CLASSES_ROOT,
        Hive::CurrentUser => HKEY_CURRENT_USER,
        Hive::LocalMachine => HKEY_LOCAL_MACHINE,
    };
    RegKey::predef(h)
}

fn convert(v: RegValue) -> RegData {
    match v.vtype {
        REG_SZ | REG_EXPAND_SZ => String::from_reg_value(&v)
            .map(RegData::String)
            .unwrap_or(RegData::Other),
        REG_NONE => RegData::None,
        _ => RegData::Other,
    }
}

impl RegistryStore for WindowsRegistry {
    fn key_exists(&self, hive: Hive, path: &str) -> RegResult<bool> {
        match root(hive).open_subkey(path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(RegistryError::classify(hive, path, e)),
        }
    }

    fn get_string(&self, hive: Hive, path: &str, name: &str) -> RegResult<String> {
        let key = root(hive)
            .open_subkey(path)
            .map_err(|e| RegistryError::classify(hive, path, e))?;
        key.get_value::<String, _>(name)
            .map_err(|e| RegistryError::classify(hive, path, e))
    }

    fn set_value(&self, hive: Hive, path: &str, name: &str, data: &RegData) -> RegResult<()> {
        check_writable(hive, path, name, data)?;
        let (key, _) = root(hive)
            .create_subkey_with_flags(path, KEY_WRITE)
            .map_err(|e| RegistryError::classify(hive, path, e))?;
        let res = match data {
            RegData::String(s) => key.set_value(name, s),
            // only `None` is left after check_writable
            _ => key.set_raw_value(
                name,
                &RegValue { bytes: Vec::new(), vtype: REG_NONE },
            ),
        };
        res.map_err(|e| RegistryError::classify(hive, path, e))
    }

    fn values(&self, hive: Hive, path: &str) -> RegResult<Vec<(String, RegData)>> {
        let key = root(hive)
            .open_subkey(path)
            .map_err(|e| RegistryError::classify(hive, path, e))?;
        Ok(take_until_error(key.enum_values())
            .into_iter()
            .map(|(name, value)| (name, convert(value)))
            .collect())
    }
}
