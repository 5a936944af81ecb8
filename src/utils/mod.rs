//! Generic utility primitives with zero domain knowledge.
//!
//! - `io` - File I/O with consistent error handling
//! - `sql` - SQL identifier and literal quoting

pub mod io;
pub mod sql;
