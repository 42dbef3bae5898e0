//! Per-combination vector indices.

pub mod builder;
pub mod format;
pub mod key;
pub mod registry;
pub mod search;

pub use builder::{all_combinations, build_index, write_index};
pub use format::{FlatIndex, NO_MATCH};
pub use key::{PreferenceKey, normalize_tag};
pub use registry::IndexRegistry;
pub use search::search;
