//! # Pegmatite toolkit
//!
//! Ready-made grammars built on [`pegmatite`]: quoted strings with escape
//! sequences, numbers in the common bases and notations, and Unicode
//! whitespace. They double as worked examples of the engine's optimization
//! rules (`scan`, `prefix_table`, `many`) and of the `Labels` registry.

pub mod combine;
pub mod numbers;
pub mod strings;
pub mod whitespace;

pub use combine::after;
pub use numbers::{NumberError, NumberValue, Numbers, number};
pub use strings::{StringValue, string};
pub use whitespace::{is_white_space, ws};
