use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::context::dictionary::LookupError;

pub struct DiskCache {
    base_dir: PathBuf,
}

impl DiskCache {
    pub fn new(subdir: &str) -> Option<Self> {
        let base = dirs::data_dir()?.join("spelldrill").join(subdir);
        fs::create_dir_all(&base).ok()?;
        Some(Self { base_dir: base })
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Option<Self> {
        fs::create_dir_all(&base_dir).ok()?;
        Some(Self { base_dir })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let path = self.base_dir.join(Self::sanitize_key(key));
        fs::read_to_string(path).ok()
    }

    pub fn put(&self, key: &str, content: &str) -> bool {
        let path = self.base_dir.join(Self::sanitize_key(key));
        fs::write(path, content).is_ok()
    }

    /// One file per key. Percent-encoding keeps distinct keys on distinct
    /// files and leaves no path separators.
    fn sanitize_key(key: &str) -> String {
        format!("{}.json", encode_path_segment(key))
    }
}

/// Percent-encode everything outside the URL unreserved set. Hand-rolled
/// because the offline build has no `reqwest::Url` to lean on.
pub fn encode_path_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for b in raw.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

#[cfg(feature = "network")]
pub fn fetch_url(url: &str, timeout: Duration) -> Result<String, LookupError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LookupError::Transport(e.to_string()))?;
    let response = client
        .get(url)
        .send()
        .map_err(|e| LookupError::Transport(e.to_string()))?;
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(LookupError::NotFound);
    }
    if !status.is_success() {
        return Err(LookupError::Status(status.as_u16()));
    }
    response
        .text()
        .map_err(|e| LookupError::Transport(e.to_string()))
}

#[cfg(not(feature = "network"))]
pub fn fetch_url(_url: &str, _timeout: Duration) -> Result<String, LookupError> {
    Err(LookupError::Disabled)
}
