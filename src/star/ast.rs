//! Generic STAR tree
//!
//! The output of the generic parser: an ordered, dialect-neutral tree of data
//! blocks, save frames, loops and raw values, plus the location and diagnostic
//! types used to report problems in the source text.

pub mod containers;
pub mod diagnostics;
pub mod range;
pub mod value;

pub use containers::{Container, DataBlock, DataExtent, Entry, Item, Loop, LoopRow, LoopSlot, SaveFrame};
pub use diagnostics::{Diagnostic, DiagnosticSeverity};
pub use range::{Position, Range, SourceLocation};
pub use value::{StarValue, FALSE_STRING, NULL_STRING, TRUE_STRING, UNKNOWN_STRING};
