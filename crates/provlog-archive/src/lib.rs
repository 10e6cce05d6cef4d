//! # Provlog Archive
//!
//! Append-only archive sink, redundant to the primary store. Events land in
//! one JSON Lines file per agent per UTC day; line order is append order.
//! The archive is never read on the write path; only the reconciler and
//! health checks touch it.

pub mod backend;
pub mod file;

pub use backend::{ArchiveBackend, ArchiveError, ArchiveRecord};
pub use file::FileArchive;
