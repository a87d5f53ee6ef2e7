// Download placement - pure logic.
// Every download lands in the configured downloads directory under the
// file name the URL (or the engine's suggestion) carries.

use std::path::{Path, PathBuf};

use serde::Serialize;
use url::Url;

use crate::state::ShellEvent;

const FALLBACK_NAME: &str = "download";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Download {
    pub filename: String,
    pub path: String,
}

impl Download {
    pub fn started(&self) -> ShellEvent {
        ShellEvent::DownloadStarted(self.clone())
    }
}

/// Last path segment of the URL, percent-decoded and stripped of anything
/// that could leave the downloads directory.
pub fn file_name_for(url: &str) -> String {
    let segment = Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .unwrap_or_default();
    let decoded = urlencoding::decode(&segment)
        .map(|s| s.into_owned())
        .unwrap_or(segment);
    sanitize(&decoded)
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.');
    if cleaned.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Where a download requested from `url` is saved.
pub fn requested(dir: &Path, url: &str) -> Download {
    let filename = file_name_for(url);
    let path: PathBuf = dir.join(&filename);
    Download {
        filename,
        path: path.to_string_lossy().into_owned(),
    }
}

/// Event for a finished download; `path` is what the engine actually wrote.
pub fn finished(dir: &Path, url: &str, path: Option<&Path>, success: bool) -> ShellEvent {
    let download = match path {
        Some(path) => Download {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file_name_for(url)),
            path: path.to_string_lossy().into_owned(),
        },
        None => requested(dir, url),
    };
    if success {
        log::info!("[Downloads] Saved {}", download.path);
        ShellEvent::DownloadCompleted(download)
    } else {
        log::warn!("[Downloads] Failed {}", download.filename);
        ShellEvent::DownloadFailed(download)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://a.test/files/report.pdf", "report.pdf")]
    #[case("https://a.test/files/my%20notes.txt", "my notes.txt")]
    #[case("https://a.test/", "download")]
    #[case("https://a.test/files/..%2F..%2Fetc%2Fpasswd", "_.._etc_passwd")]
    #[case("not a url", "download")]
    fn test_file_name_for(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(file_name_for(url), expected);
    }

    #[test]
    fn test_requested_lands_in_download_dir() {
        let dir = Path::new("/home/user/Downloads");
        let download = requested(dir, "https://a.test/archive.zip");
        assert_eq!(download.filename, "archive.zip");
        assert_eq!(PathBuf::from(&download.path), dir.join("archive.zip"));
        assert_eq!(download.started(), ShellEvent::DownloadStarted(download.clone()));
    }

    #[test]
    fn test_finished_prefers_engine_path() {
        let dir = Path::new("/tmp/dl");
        let written = Path::new("/tmp/dl/archive (1).zip");
        match finished(dir, "https://a.test/archive.zip", Some(written), true) {
            ShellEvent::DownloadCompleted(d) => {
                assert_eq!(d.filename, "archive (1).zip");
                assert_eq!(PathBuf::from(d.path), written);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_failed_download() {
        let dir = Path::new("/tmp/dl");
        let event = finished(dir, "https://a.test/archive.zip", None, false);
        assert_eq!(event, ShellEvent::DownloadFailed(requested(dir, "https://a.test/archive.zip")));
    }

    #[test]
    fn test_event_wire_names() {
        let download = requested(Path::new("/tmp/dl"), "https://a.test/a.bin");
        let started = serde_json::to_value(download.started()).unwrap();
        assert_eq!(started["type"], "download-started");
        assert_eq!(started["payload"]["filename"], "a.bin");

        let done = serde_json::to_value(ShellEvent::DownloadCompleted(download)).unwrap();
        assert_eq!(done["type"], "download-complete");
    }
}
