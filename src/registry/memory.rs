use super::{check_writable, Hive, RegData, RegResult, RegistryError, RegistryStore};
use std::{cell::RefCell, collections::BTreeMap};

#[derive(Debug, Default)]
struct Key {
    // insertion order, names compared case-insensitively
    values: Vec<(String, RegData)>,
}

/// In-memory registry for exercising lookups and writers without touching
/// the live registry.
///
/// Key paths and value names are case-insensitive like the real registry.
/// Read and write denials can be injected per hive and path prefix.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    keys: RefCell<BTreeMap<(Hive, String), Key>>,
    denied: RefCell<Vec<(Hive, String)>>,
    denied_reads: RefCell<Vec<(Hive, String)>>,
    writes: RefCell<usize>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every write under `prefix` (or the whole hive for `""`) fail with access denied.
    pub fn deny_writes(&self, hive: Hive, prefix: &str) {
        self.denied.borrow_mut().push((hive, normalize(prefix)));
    }

    /// Makes every read under `prefix` (or the whole hive for `""`) fail with access denied.
    pub fn deny_reads(&self, hive: Hive, prefix: &str) {
        self.denied_reads.borrow_mut().push((hive, normalize(prefix)));
    }

    /// Places a value as if another program had written it: no denials, any payload.
    pub fn seed(&self, hive: Hive, path: &str, name: &str, data: RegData) {
        self.insert(hive, path, name, data);
    }

    /// Number of successful value writes since creation.
    pub fn write_count(&self) -> usize {
        *self.writes.borrow()
    }

    pub fn get(&self, hive: Hive, path: &str, name: &str) -> Option<RegData> {
        let keys = self.keys.borrow();
        let key = keys.get(&(hive, normalize(path)))?;
        key.values
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    fn check_read(&self, hive: Hive, path: &str) -> RegResult<()> {
        if covered(&self.denied_reads.borrow(), hive, path) {
            return Err(RegistryError::PermissionDenied(format!("{hive}\\{path}")));
        }
        Ok(())
    }

    fn insert(&self, hive: Hive, path: &str, name: &str, data: RegData) {
        let norm = normalize(path);
        let mut keys = self.keys.borrow_mut();

        // creating a key creates its ancestors
        let mut prefix = String::new();
        for part in norm.split('\\') {
            if !prefix.is_empty() {
                prefix.push('\\');
            }
            prefix.push_str(part);
            keys.entry((hive, prefix.clone())).or_default();
        }

        let key = keys.entry((hive, norm)).or_default();
        match key.values.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some(slot) => slot.1 = data,
            None => key.values.push((name.to_string(), data)),
        }
    }
}

fn covered(rules: &[(Hive, String)], hive: Hive, path: &str) -> bool {
    let norm = normalize(path);
    rules.iter().any(|(h, prefix)| {
        *h == hive
            && (prefix.is_empty() || norm == *prefix || norm.starts_with(&format!("{prefix}\\")))
    })
}

impl RegistryStore for MemoryRegistry {
    fn key_exists(&self, hive: Hive, path: &str) -> RegResult<bool> {
        self.check_read(hive, path)?;
        Ok(self.keys.borrow().contains_key(&(hive, normalize(path))))
    }

    fn get_string(&self, hive: Hive, path: &str, name: &str) -> RegResult<String> {
        if !self.key_exists(hive, path)? {
            return Err(RegistryError::NotFound(format!("{hive}\\{path}")));
        }
        match self.get(hive, path, name) {
            Some(RegData::String(s)) => Ok(s),
            Some(_) => Err(RegistryError::Other {
                path: format!("{hive}\\{path}"),
                message: format!("value {name:?} is not a string"),
            }),
            None => Err(RegistryError::NotFound(format!("{hive}\\{path}\\{name}"))),
        }
    }

    fn set_value(&self, hive: Hive, path: &str, name: &str, data: &RegData) -> RegResult<()> {
        if covered(&self.denied.borrow(), hive, path) {
            return Err(RegistryError::PermissionDenied(format!("{hive}\\{path}")));
        }
        check_writable(hive, path, name, data)?;
        self.insert(hive, path, name, data.clone());
        *self.writes.borrow_mut() += 1;
        Ok(())
    }

    fn values(&self, hive: Hive, path: &str) -> RegResult<Vec<(String, RegData)>> {
        self.check_read(hive, path)?;
        let keys = self.keys.borrow();
        keys.get(&(hive, normalize(path)))
            .map(|k| k.values.clone())
            .ok_or_else(|| RegistryError::NotFound(format!("{hive}\\{path}")))
    }
}

fn normalize(path: &str) -> String {
    path.trim_matches('\\').to_lowercase()
}
