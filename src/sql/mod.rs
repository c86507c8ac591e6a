//! SQL statement classification (spec §4.3, C3).

pub mod classifier;

pub use classifier::{classify, SqlOperation, StatementClassification};
