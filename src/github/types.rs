// GitHub contents API response types.
// Directory listings, file payloads and rate limit headers.

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

/// Kind of entry in a directory listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Dir,
    Symlink,
    Submodule,
    #[serde(other)]
    Unknown,
}

/// One entry of a `GET /contents/<dir>` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Repository-relative path. Absent in some mirrors of the API.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl ContentEntry {
    /// Whether this entry is a `.json` file.
    pub fn is_json_file(&self) -> bool {
        self.entry_type == EntryType::File && self.name.ends_with(".json")
    }

    /// Path to request for this entry, falling back to `<dir>/<name>`.
    pub fn path_in(&self, dir: &str) -> String {
        match &self.path {
            Some(path) if !path.is_empty() => path.clone(),
            _ if dir.is_empty() => self.name.clone(),
            _ => format!("{}/{}", dir.trim_end_matches('/'), self.name),
        }
    }
}

/// Response of a `GET /contents/<file>` request.
#[derive(Debug, Clone, Deserialize)]
pub struct FileContent {
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

/// Rate limit information from response headers.
#[derive(Debug, Clone, Default)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: Option<u64>,
    pub reset: u64,
}

impl RateLimit {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let number = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
        };

        Self {
            limit: number("x-ratelimit-limit").unwrap_or_default(),
            remaining: number("x-ratelimit-remaining"),
            reset: number("x-ratelimit-reset").unwrap_or_default(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_listing_deserializes() {
        let entries: Vec<ContentEntry> = serde_json::from_str(
            r#"[
                {"name":"a.json","type":"file","path":"templates/steps/a.json","sha":"1","size":10},
                {"name":"nested","type":"dir"},
                {"name":"README.md","type":"file"},
                {"name":"odd","type":"something-new"}
            ]"#,
        )
        .unwrap();

        assert!(entries[0].is_json_file());
        assert_eq!(entries[1].entry_type, EntryType::Dir);
        assert!(!entries[1].is_json_file());
        assert!(!entries[2].is_json_file());
        assert_eq!(entries[3].entry_type, EntryType::Unknown);
    }

    #[test]
    fn test_path_in() {
        let entry = ContentEntry {
            name: "a.json".into(),
            entry_type: EntryType::File,
            path: None,
            sha: None,
            size: None,
        };
        assert_eq!(entry.path_in("templates/steps/"), "templates/steps/a.json");
        assert_eq!(entry.path_in(""), "a.json");

        let entry = ContentEntry {
            path: Some("x/a.json".into()),
            ..entry
        };
        assert_eq!(entry.path_in("templates/steps"), "x/a.json");
    }

    #[test]
    fn test_rate_limit_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-limit", HeaderValue::from_static("60"));
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        headers.insert("x-ratelimit-reset", HeaderValue::from_static("1700000000"));

        let limit = RateLimit::from_headers(&headers);
        assert_eq!(limit.limit, 60);
        assert!(limit.is_exhausted());
        assert_eq!(limit.reset, 1_700_000_000);

        assert!(!RateLimit::from_headers(&HeaderMap::new()).is_exhausted());
    }
}
