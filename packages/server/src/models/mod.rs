pub mod event;
pub mod ingest;
pub mod plugin;
pub mod version;
