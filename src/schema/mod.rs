//! Declarative DDL builder
//!
//! [`Column`], [`Index`] and [`Constraint`] render their own MySQL fragments;
//! [`Table`] buffers them and executes `CREATE`/`ALTER`/`DROP TABLE` through the
//! shared connection. Table also carries the row helpers migrations use for data
//! changes (`insert`, `update`, `delete`, `import`).

pub mod column;
pub mod constraint;
pub mod error;
pub mod import;
pub mod index;
pub mod table;

pub use column::{Column, ColumnOptions, DefaultValue, AUTOINCREMENT};
pub use constraint::{Constraint, ConstraintOptions, ReferentialAction};
pub use error::SchemaError;
pub use import::{ImportFormat, NULL_SENTINEL};
pub use index::{Index, IndexOptions, PRIMARY};
pub use table::Table;
