//! Conflict lifecycle for git workspace sync.
//!
//! A path enters conflict when a remote update diverges from a local edit
//! (`base`/`modified` -> `conflict`) and leaves it when the remote version is
//! promoted to the new base (`conflict` -> `base`). The [`ConflictManager`]
//! owns both transitions and the remote content parked in the conflict
//! segments meanwhile.

pub mod conflict;
pub mod error;

pub use conflict::ConflictManager;
pub use error::{MergeError, MergeResult};
