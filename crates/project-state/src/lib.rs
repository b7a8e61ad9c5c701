//! Project-State: the project record collaborator for badge autofill
//!
//! The project record is owned by an external system (a web app, a database
//! row, a JSON document). The autofill engine only reads fields from it and
//! proposes updates, so this crate defines the narrow contract the engine
//! relies on and nothing more.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: field-level reads, "set and non-blank" checks, and applying a batch
//! of field updates under the owner's own transaction guarantee.
//!
//! ## Key Components
//!
//! - [`ProjectRecord`]: read/write contract implemented by record owners
//! - [`FieldUpdate`]: one staged write, applied as a batch by [`ProjectRecord::apply`]
//! - [`fakes::MemoryProject`]: in-memory record, also the JSON-file form used by the CLI

mod error;
pub mod fakes;
pub mod record;

pub use error::StateError;
pub use fakes::MemoryProject;
pub use record::{FieldUpdate, ProjectRecord};

/// Result type for project-state operations
pub type StateResult<T> = std::result::Result<T, StateError>;
