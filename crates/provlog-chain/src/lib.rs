//! # Provlog Chain
//!
//! The write and verification paths of the ledger:
//!
//! - [`Appender`] — serializes appends per agent, binds the primary-store
//!   commit to the archive hand-off
//! - [`ChainVerifier`] — recomputes and re-links a stored chain, reporting
//!   the first divergence
//! - [`Reconciler`] — cross-checks the primary store against the archive for
//!   one agent and day

pub mod append;
pub mod lease;
pub mod reconcile;
pub mod verify;

pub use append::{AppendError, Appender};
pub use lease::LeaseMap;
pub use reconcile::{ReconcileError, ReconcileReport, Reconciler};
pub use verify::{ChainVerdict, ChainVerifier, VerifyError};
