// Local filesystem sources.
// The writable mirror of the last remote fetch and the read-only bundled defaults.

pub mod paths;
pub mod store;

pub use paths::{collection_dir, default_mirror_root, item_path};
pub use store::{BundledDir, DiskMirror};
