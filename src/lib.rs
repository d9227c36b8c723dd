pub mod apps;
pub mod associate;
pub mod config;
pub mod driver;
pub mod executable;
pub mod lookup;
pub mod openwith;
pub mod progid;
pub mod registry;
pub mod report;
#[cfg(windows)]
pub mod shell;
