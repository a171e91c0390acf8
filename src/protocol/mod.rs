//! Text-format building blocks shared by the array codec.
//!
//! - [`bytea`]: hex / legacy escape encoding of binary values
//! - [`quote`]: double-quote escaping of one array element

pub mod bytea;
pub mod quote;

pub use bytea::{HEX_FORMAT_MIN_VERSION, decode_bytea, encode_bytea};
pub use quote::{append_quoted, unescape_quoted};
