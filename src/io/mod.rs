pub mod config_io;
pub mod snapshot_io;
pub mod sync_api;
