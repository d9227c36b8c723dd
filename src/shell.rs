use std::ptr;
use windows_sys::Win32::UI::Shell::{IsUserAnAdmin, SHChangeNotify, SHCNE_ASSOCCHANGED, SHCNF_IDLIST};

pub fn is_admin() -> bool {
    unsafe { IsUserAnAdmin() != 0 }
}

/// Tells Explorer that file associations changed so it refreshes icons and menus.
pub fn notify_association_change() {
    unsafe { SHChangeNotify(SHCNE_ASSOCCHANGED, SHCNF_IDLIST, ptr::null(), ptr::null()) }
}
