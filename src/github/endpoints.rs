// GitHub contents endpoints.
// Directory listing and base64 file retrieval, exposed as a remote fetcher.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::Value;

use crate::config::RemoteTarget;
use crate::error::{Result, TemplateError};
use crate::loader::RemoteFetcher;

use super::client::GitHubClient;
use super::types::{ContentEntry, EntryType, FileContent};

impl GitHubClient {
    /// List a repository directory.
    pub async fn list_directory(
        &self,
        target: &RemoteTarget,
        path: &str,
    ) -> Result<Vec<ContentEntry>> {
        let response = self.get_contents(target, path).await?;
        let body: Value = response.json().await?;

        if !body.is_array() {
            return Err(TemplateError::remote(format!(
                "expected a directory listing at '{}'",
                path
            )));
        }
        Ok(serde_json::from_value(body)?)
    }

    /// Read a repository file, decoding the base64 transport envelope.
    pub async fn read_file(&self, target: &RemoteTarget, path: &str) -> Result<Vec<u8>> {
        let response = self.get_contents(target, path).await?;
        let body: Value = response.json().await?;

        let file: FileContent = match body {
            Value::Object(_) => serde_json::from_value(body)?,
            _ => {
                return Err(TemplateError::remote(format!(
                    "expected file content at '{}'",
                    path
                )));
            }
        };
        decode_content(&file, path)
    }
}

fn decode_content(file: &FileContent, path: &str) -> Result<Vec<u8>> {
    if file.entry_type != EntryType::File {
        return Err(TemplateError::remote(format!(
            "'{}' is not a file",
            path
        )));
    }
    match file.encoding.as_deref() {
        None | Some("base64") => {}
        Some(other) => {
            return Err(TemplateError::remote(format!(
                "unsupported encoding '{}' for '{}'",
                other, path
            )));
        }
    }

    let content = file
        .content
        .as_deref()
        .ok_or_else(|| TemplateError::remote(format!("no content for '{}'", path)))?;
    // GitHub wraps base64 at 60 columns.
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| TemplateError::remote(format!("invalid base64 in '{}': {}", path, e)))
}

#[async_trait]
impl RemoteFetcher for GitHubClient {
    async fn list_directory(&self, target: &RemoteTarget, path: &str) -> Result<Vec<ContentEntry>> {
        GitHubClient::list_directory(self, target, path).await
    }

    async fn read_file(&self, target: &RemoteTarget, path: &str) -> Result<Vec<u8>> {
        GitHubClient::read_file(self, target, path).await
    }
}
