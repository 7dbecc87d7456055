//! salvager — read-only, page-granular access to SQLite-format databases
//! for corruption recovery.
//!
//! The pager serves individual pages, possibly overridden by newer
//! committed versions in the `-wal` companion, while classifying damage in
//! either file instead of failing the whole operation at the first
//! inconsistency. Writes, SQL semantics and encryption are out of scope;
//! this is a library component for a larger repair pipeline.

// Base modules
pub mod config;
pub mod error;
pub mod fileops;
pub mod mapped;
pub mod notify;

// Folder modules
pub mod pager; // src/pager/{mod,core,init,io}.rs
pub mod wal; // src/wal/{mod,frame,overlay}.rs

// Convenient re-exports
pub use config::SalvageConfig;
pub use error::{ErrorKind, InfoValue, RepairError, Severity};
pub use mapped::{FileHandle, MappedBuffer};
pub use notify::{callback, Notifier, SubscriptionHandle};
pub use pager::{InitState, PageGeometry, Pager};
pub use wal::Wal;
