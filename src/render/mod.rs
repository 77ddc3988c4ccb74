//! Output serialization.

mod json;

pub use json::{elements_to_json, to_json, JsonFormat};
