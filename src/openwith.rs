use crate::executable::Executable;
use crate::registry::{
    file_exts_key, Hive, RegData, RegResult, RegistryError, RegistryStore, APPLICATIONS, MRU_LIST,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    ClassOpenWithProgids,
    UserOpenWithProgids,
    Applications,
    UserOpenWithList,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::ClassOpenWithProgids,
        Strategy::UserOpenWithProgids,
        Strategy::Applications,
        Strategy::UserOpenWithList,
    ];
}

#[derive(Debug)]
pub enum StrategyOutcome {
    Applied,
    Skipped(&'static str),
    Failed(RegistryError),
}

#[derive(Debug)]
pub struct OpenWithResult {
    pub outcomes: Vec<(Strategy, StrategyOutcome)>,
}

impl OpenWithResult {
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().any(|(_, o)| matches!(o, StrategyOutcome::Applied))
    }

    pub fn outcome(&self, strategy: Strategy) -> Option<&StrategyOutcome> {
        self.outcomes.iter().find(|(s, _)| *s == strategy).map(|(_, o)| o)
    }
}

/// Offers `exe` in the "Open with" menu for `extension` without touching the default.
///
/// The four strategies are independent; each one's failure is only logged at debug level.
pub fn add(store: &dyn RegistryStore, extension: &str, prog_id: &str, exe: &Executable) -> OpenWithResult {
    let outcomes = Strategy::ALL
        .iter()
        .map(|&s| {
            let outcome = match s {
                Strategy::ClassOpenWithProgids => applied(store.set_value(
                    Hive::ClassesRoot,
                    &format!("{extension}\\OpenWithProgids"),
                    prog_id,
                    &RegData::None,
                )),
                Strategy::UserOpenWithProgids => applied(store.set_value(
                    Hive::CurrentUser,
                    &file_exts_key(extension, "OpenWithProgids"),
                    prog_id,
                    &RegData::None,
                )),
                Strategy::Applications => applied(supported_type(store, extension, exe)),
                Strategy::UserOpenWithList => mru_insert(store, extension, exe),
            };
            if let StrategyOutcome::Failed(e) = &outcome {
                debug!("{extension}: open-with via {s:?} failed: {e}");
            }
            (s, outcome)
        })
        .collect();
    OpenWithResult { outcomes }
}

fn applied(res: RegResult<()>) -> StrategyOutcome {
    match res {
        Ok(()) => StrategyOutcome::Applied,
        Err(e) => StrategyOutcome::Failed(e),
    }
}

fn supported_type(store: &dyn RegistryStore, extension: &str, exe: &Executable) -> RegResult<()> {
    let app_key = format!("{APPLICATIONS}\\{}", exe.file_name());
    store.set_string(Hive::ClassesRoot, &app_key, "FriendlyAppName", exe.stem())?;
    store.set_string(
        Hive::ClassesRoot,
        &format!("{app_key}\\shell\\open\\command"),
        "",
        &exe.open_command(),
    )?;
    store.set_string(Hive::ClassesRoot, &format!("{app_key}\\SupportedTypes"), extension, "")
}

fn mru_insert(store: &dyn RegistryStore, extension: &str, exe: &Executable) -> StrategyOutcome {
    let key = file_exts_key(extension, "OpenWithList");
    let values = match store.values(Hive::CurrentUser, &key) {
        Ok(v) => v,
        Err(RegistryError::NotFound(_)) => Vec::new(),
        Err(e) => return StrategyOutcome::Failed(e),
    };

    let list = MruList::from_values(&values);
    match list.plan_insert(exe.file_name()) {
        MruInsert::AlreadyPresent => StrategyOutcome::Skipped("already listed"),
        MruInsert::Full => StrategyOutcome::Skipped("no free letter"),
        MruInsert::Insert { letter, order } => {
            let res = store
                .set_string(Hive::CurrentUser, &key, &letter.to_string(), exe.file_name())
                .and_then(|()| match order {
                    Some(order) => store.set_string(Hive::CurrentUser, &key, MRU_LIST, &order),
                    None => Ok(()),
                });
            applied(res)
        }
    }
}

/// Letter-keyed OpenWithList contents plus the separate MRUList order string.
/// Letters holding a non-string value map to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MruList {
    pub entries: BTreeMap<char, Option<String>>,
    pub order: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MruInsert {
    AlreadyPresent,
    Full,
    /// `order` is `None` when the letter was already part of the order string.
    Insert { letter: char, order: Option<String> },
}

impl MruList {
    pub fn from_values(values: &[(String, RegData)]) -> Self {
        let mut list = MruList::default();
        for (name, data) in values {
            if name.eq_ignore_ascii_case(MRU_LIST) {
                if let Some(s) = data.as_str() {
                    list.order = s.to_string();
                }
                continue;
            }
            let mut chars = name.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                // a letter is taken whatever its data type
                if c.is_ascii_alphabetic() {
                    list.entries.insert(c.to_ascii_lowercase(), data.as_str().map(str::to_string));
                }
            }
        }
        list
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.entries
            .values()
            .flatten()
            .any(|v| v.eq_ignore_ascii_case(file_name))
    }

    pub fn plan_insert(&self, file_name: &str) -> MruInsert {
        if self.contains(file_name) {
            return MruInsert::AlreadyPresent;
        }
        match next_free_letter(&self.entries) {
            None => MruInsert::Full,
            Some(letter) => MruInsert::Insert { letter, order: reorder_on_insert(&self.order, letter) },
        }
    }
}

pub fn next_free_letter<V>(entries: &BTreeMap<char, V>) -> Option<char> {
    ('a'..='z').find(|c| !entries.contains_key(c))
}

/// Puts `letter` at the front of the order string, unless it is already listed.
pub fn reorder_on_insert(order: &str, letter: char) -> Option<String> {
    if order.contains(letter) {
        None
    } else {
        Some(format!("{letter}{order}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sz(name: &str, v: &str) -> (String, RegData) {
        (name.to_string(), RegData::String(v.to_string()))
    }

    #[test]
    fn assigns_next_letter_and_prepends() {
        let list = MruList::from_values(&[sz("a", "foo.exe"), sz("b", "bar.exe"), sz("MRUList", "ba")]);
        assert_eq!(
            list.plan_insert("baz.exe"),
            MruInsert::Insert { letter: 'c', order: Some("cba".to_string()) }
        );
    }

    #[test]
    fn existing_file_name_is_a_noop() {
        let list = MruList::from_values(&[sz("a", "Foo.EXE"), sz("MRUList", "a")]);
        assert_eq!(list.plan_insert("foo.exe"), MruInsert::AlreadyPresent);
    }

    #[test]
    fn gaps_are_filled_first() {
        let list = MruList::from_values(&[sz("a", "x.exe"), sz("c", "y.exe")]);
        assert_eq!(next_free_letter(&list.entries), Some('b'));
    }

    #[test]
    fn full_list() {
        let entries: BTreeMap<char, Option<String>> =
            ('a'..='z').map(|c| (c, Some(format!("{c}.exe")))).collect();
        let list = MruList { entries, order: String::new() };
        assert_eq!(list.plan_insert("new.exe"), MruInsert::Full);
    }

    #[test]
    fn ignores_non_letter_names() {
        let list = MruList::from_values(&[sz("1", "one.exe"), sz("ab", "two.exe"), sz("", "default")]);
        assert!(list.entries.is_empty());
    }

    #[test]
    fn non_string_letters_stay_occupied() {
        let list = MruList::from_values(&[
            ("a".to_string(), RegData::Other),
            ("b".to_string(), RegData::None),
            sz("MRUList", "ab"),
        ]);
        assert_eq!(list.entries.get(&'a'), Some(&None));
        assert_eq!(
            list.plan_insert("baz.exe"),
            MruInsert::Insert { letter: 'c', order: Some("cab".to_string()) }
        );
    }

    #[test]
    fn order_keeps_already_listed_letter() {
        assert_eq!(reorder_on_insert("cab", 'a'), None);
        assert_eq!(reorder_on_insert("", 'a'), Some("a".to_string()));
    }
}
