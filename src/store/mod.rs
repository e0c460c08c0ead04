//! Persistence layer (JSON document store).

pub mod file;

pub use file::UserStore;
