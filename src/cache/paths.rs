// Mirror path utilities.
// Constructs `<root>/<collection>/<id>.json` paths for mirrored and bundled templates.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::types::CollectionType;

/// Default mirror directory (~/.cache/tiered-templates/mirror on Linux).
pub fn default_mirror_root() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tiered-templates").map(|dirs| dirs.cache_dir().join("mirror"))
}

/// Directory holding one collection.
pub fn collection_dir(root: &Path, kind: CollectionType) -> PathBuf {
    root.join(kind.as_str())
}

/// File holding a single item.
pub fn item_path(root: &Path, kind: CollectionType, id: &str) -> PathBuf {
    collection_dir(root, kind).join(format!("{}.json", encode_name(id)))
}

/// Encode a name for use as a file name.
/// Percent-encodes `%` and characters that are unsafe in paths, so distinct names
/// always map to distinct files.
fn encode_name(name: &str) -> String {
    let mut encoded = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '%' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => {
                encoded.push_str(&format!("%{:02X}", c as u32));
            }
            c if c.is_control() => {
                let mut buf = [0; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    encoded.push_str(&format!("%{:02X}", byte));
                }
            }
            c => encoded.push(c),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_name() {
        assert_eq!(encode_name("checkout"), "checkout");
        assert_eq!(encode_name("with/slash"), "with%2Fslash");
        assert_eq!(encode_name("../escape"), "..%2Fescape");
        assert_eq!(encode_name("ns:step"), "ns%3Astep");
        assert_eq!(encode_name("tab\tid"), "tab%09id");
    }

    #[test]
    fn test_encode_name_is_collision_free() {
        let names = ["a/b", "a_b", "a%2Fb", "a%b", "a:b"];
        let encoded: std::collections::HashSet<String> =
            names.iter().map(|name| encode_name(name)).collect();
        assert_eq!(encoded.len(), names.len());
    }

    #[test]
    fn test_item_paths() {
        let root = Path::new("/var/mirror");
        assert_eq!(
            collection_dir(root, CollectionType::Workflows),
            Path::new("/var/mirror/workflows")
        );
        assert_eq!(
            item_path(root, CollectionType::Steps, "build"),
            Path::new("/var/mirror/steps/build.json")
        );
        assert!(item_path(root, CollectionType::Steps, "a/b").ends_with("steps/a%2Fb.json"));
    }

    #[test]
    fn test_default_mirror_root() {
        if let Some(root) = default_mirror_root() {
            assert!(root.ends_with("mirror"));
        }
    }
}
