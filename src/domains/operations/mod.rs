//! Operations domain module.
//!
//! The operation table and everything that turns a named invocation into an
//! upstream call.
//!
//! ## Architecture
//!
//! - `catalog.rs` - Static table of operations and their argument declarations
//! - `validator.rs` - Generic argument validation against the table
//! - `dispatcher.rs` - Resolve, validate, render and execute
//! - `error.rs` - Front-end independent error taxonomy

mod catalog;
mod dispatcher;
mod error;
mod validator;

pub use catalog::{
    EntityKind, FieldKind, FieldSpec, OPERATIONS, OperationKind, OperationSpec, OperationTable,
    PATH_ID, catalog,
};
pub use dispatcher::{Dispatcher, build_descriptor};
pub use error::{GatewayError, upstream_message};
pub use validator::{ValidatedArgs, ValidationError, validate};
