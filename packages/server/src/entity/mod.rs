pub mod event;
pub mod plugin;
pub mod version;
