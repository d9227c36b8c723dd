use crate::registry::{Hive, RegResult, RegistryStore};
use tracing::error;

/// Points the extension's class registration at `prog_id`, making it the default handler.
pub fn set_default(store: &dyn RegistryStore, extension: &str, prog_id: &str) -> RegResult<()> {
    let res = store.set_string(Hive::ClassesRoot, extension, "", prog_id);
    if let Err(e) = &res {
        if e.is_permission_denied() {
            error!("permission denied for extension {extension}");
        } else {
            error!("failed to associate {extension}: {e}");
        }
    }
    res
}
