// Persistence gateway: flat JSON files for passwords, settings and visit stats.
//
// `ProfileStore` is the synchronous file layer. `Gateway` puts it behind a
// request queue served by one blocking worker, so every write to a given
// file is serialized and UI callers only ever see best-effort results.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::{mpsc, oneshot};

use crate::error::ShellResult;
use crate::modules::passwords::{self, PasswordEntry};
use crate::modules::policy::SettingsProvider;
use crate::modules::stats::{self, StatsEntry};
use crate::settings::SettingsRecord;

const PASSWORD_FILE: &str = "passwords.json";
const SETTINGS_FILE: &str = "settings.json";
const STATS_FILE: &str = "stats.json";

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub struct ProfileStore {
    dir: PathBuf,
    settings: SettingsProvider,
}

impl ProfileStore {
    /// Opens the profile directory and publishes the stored settings to
    /// `settings`, which the network policy reads from.
    pub fn open(dir: impl Into<PathBuf>, settings: SettingsProvider) -> Self {
        let dir = dir.into();
        if let Err(e) = fs::create_dir_all(&dir) {
            log::warn!("[Store] Failed to create {:?}: {}", dir, e);
        }
        let store = Self { dir, settings };
        let loaded: SettingsRecord = store.load_json(SETTINGS_FILE);
        store.settings.update(loaded);
        store
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn settings_provider(&self) -> SettingsProvider {
        self.settings.clone()
    }

    /// Missing file => default. Unreadable or malformed => default, logged.
    fn load_json<T: DeserializeOwned + Default>(&self, file: &str) -> T {
        let path = self.dir.join(file);
        if !path.exists() {
            return T::default();
        }
        match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("[Store] Failed to parse {}: {}, using defaults", file, e);
                T::default()
            }),
            Err(e) => {
                log::warn!("[Store] Failed to read {}: {}, using defaults", file, e);
                T::default()
            }
        }
    }

    fn save_json<T: Serialize + ?Sized>(&self, file: &str, data: &T) -> ShellResult<()> {
        let path = self.dir.join(file);
        let tmp_path = path.with_extension("tmp");
        fs::create_dir_all(&self.dir)?;

        let json = serde_json::to_string_pretty(data)?;

        // Atomic write: tmp + rename, a crash never leaves a half-written file
        fs::write(&tmp_path, json)?;
        fs::rename(tmp_path, path)?;
        Ok(())
    }

    // --- Passwords ---

    pub fn all_passwords(&self) -> Vec<PasswordEntry> {
        self.load_json(PASSWORD_FILE)
    }

    pub fn save_password(&self, url: &str, username: &str, password: &str) -> ShellResult<()> {
        let mut entries = self.all_passwords();
        let added = passwords::upsert(&mut entries, url, username, password, now_ms());
        self.save_json(PASSWORD_FILE, &entries)?;
        log::info!(
            "[Store] {} password for {} @ {}",
            if added { "Saved" } else { "Updated" },
            username,
            url
        );
        Ok(())
    }

    /// Returns whether an entry was removed.
    pub fn delete_password(&self, id: i64) -> ShellResult<bool> {
        let mut entries = self.all_passwords();
        let before = entries.len();
        entries.retain(|p| p.id != id);
        self.save_json(PASSWORD_FILE, &entries)?;
        Ok(entries.len() != before)
    }

    /// Upserts every complete row; incomplete rows are skipped. Returns the
    /// number of imported rows.
    pub fn import_passwords_csv(&self, text: &str) -> ShellResult<usize> {
        let rows = passwords::parse_csv(text);
        let mut entries = self.all_passwords();
        let now = now_ms();
        for row in &rows {
            passwords::upsert(&mut entries, &row.url, &row.username, &row.password, now);
        }
        self.save_json(PASSWORD_FILE, &entries)?;
        log::info!("[Store] Imported {} passwords", rows.len());
        Ok(rows.len())
    }

    pub fn export_passwords_csv(&self) -> String {
        passwords::export_csv(&self.all_passwords())
    }

    // --- Settings ---

    pub fn settings(&self) -> SettingsRecord {
        (*self.settings.current()).clone()
    }

    /// Shallow-merges `partial` into the current settings, refreshes the
    /// shared provider and persists. Returns the merged record.
    pub fn save_settings(&self, partial: &Map<String, Value>) -> ShellResult<SettingsRecord> {
        let mut merged = self.settings();
        merged.merge(partial);
        self.settings.update(merged.clone());
        self.save_json(SETTINGS_FILE, &merged)?;
        Ok(merged)
    }

    // --- Stats ---

    pub fn stats(&self) -> Vec<StatsEntry> {
        self.load_json(STATS_FILE)
    }

    /// Returns false without touching the file when statistics are disabled.
    pub fn record_visit(&self, domain: &str) -> ShellResult<bool> {
        if !self.settings.current().stats_enabled {
            return Ok(false);
        }
        let mut entries = self.stats();
        stats::record_visit(&mut entries, domain, now_ms());
        self.save_json(STATS_FILE, &entries)?;
        Ok(true)
    }

    fn serve(&self, request: Request) {
        match request {
            Request::GetAllPasswords(reply) => {
                let _ = reply.send(self.all_passwords());
            }
            Request::SavePassword {
                url,
                username,
                password,
                reply,
            } => {
                let _ = reply.send(degrade(self.save_password(&url, &username, &password)).is_some());
            }
            Request::DeletePassword { id, reply } => {
                let _ = reply.send(degrade(self.delete_password(id)).unwrap_or(false));
            }
            Request::ImportCsv { text, reply } => {
                let _ = reply.send(degrade(self.import_passwords_csv(&text)).unwrap_or(0));
            }
            Request::ExportCsv(reply) => {
                let _ = reply.send(self.export_passwords_csv());
            }
            Request::GetSettings(reply) => {
                let _ = reply.send(self.settings());
            }
            Request::SaveSettings { partial, reply } => {
                let _ = reply.send(degrade(self.save_settings(&partial)).is_some());
            }
            Request::GetStats(reply) => {
                let _ = reply.send(self.stats());
            }
            Request::RecordVisit { domain, reply } => {
                let recorded = degrade(self.record_visit(&domain)).unwrap_or(false);
                if let Some(reply) = reply {
                    let _ = reply.send(recorded);
                }
            }
        }
    }
}

fn degrade<T>(result: ShellResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("[Store] Operation failed: {}", e);
            None
        }
    }
}

enum Request {
    GetAllPasswords(oneshot::Sender<Vec<PasswordEntry>>),
    SavePassword {
        url: String,
        username: String,
        password: String,
        reply: oneshot::Sender<bool>,
    },
    DeletePassword {
        id: i64,
        reply: oneshot::Sender<bool>,
    },
    ImportCsv {
        text: String,
        reply: oneshot::Sender<usize>,
    },
    ExportCsv(oneshot::Sender<String>),
    GetSettings(oneshot::Sender<SettingsRecord>),
    SaveSettings {
        partial: Map<String, Value>,
        reply: oneshot::Sender<bool>,
    },
    GetStats(oneshot::Sender<Vec<StatsEntry>>),
    RecordVisit {
        domain: String,
        reply: Option<oneshot::Sender<bool>>,
    },
}

pub struct Gateway;

impl Gateway {
    /// Moves the store onto a blocking worker. Must be called inside a tokio runtime.
    pub fn spawn(store: ProfileStore) -> GatewayHandle {
        let (tx, mut rx) = mpsc::unbounded_channel::<Request>();
        tokio::task::spawn_blocking(move || {
            log::info!("[Store] Gateway serving {:?}", store.dir());
            while let Some(request) = rx.blocking_recv() {
                store.serve(request);
            }
            log::info!("[Store] Gateway stopped");
        });
        GatewayHandle { tx }
    }
}

/// Cheap-to-clone client of the gateway worker. Every call degrades to
/// "no data" when the worker is gone; nothing is surfaced to the user.
#[derive(Clone)]
pub struct GatewayHandle {
    tx: mpsc::UnboundedSender<Request>,
}

impl GatewayHandle {
    async fn call<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Request, fallback: T) -> T {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(make(reply)).is_err() {
            log::warn!("[Store] Gateway is not running");
            return fallback;
        }
        match rx.await {
            Ok(value) => value,
            Err(_) => {
                log::warn!("[Store] Gateway dropped a request");
                fallback
            }
        }
    }

    pub async fn get_all_passwords(&self) -> Vec<PasswordEntry> {
        self.call(Request::GetAllPasswords, Vec::new()).await
    }

    pub async fn save_password(&self, url: &str, username: &str, password: &str) -> bool {
        let (url, username, password) = (url.to_string(), username.to_string(), password.to_string());
        self.call(
            |reply| Request::SavePassword {
                url,
                username,
                password,
                reply,
            },
            false,
        )
        .await
    }

    pub async fn delete_password(&self, id: i64) -> bool {
        self.call(|reply| Request::DeletePassword { id, reply }, false).await
    }

    pub async fn import_passwords_csv(&self, text: &str) -> usize {
        let text = text.to_string();
        self.call(|reply| Request::ImportCsv { text, reply }, 0).await
    }

    pub async fn export_passwords_csv(&self) -> String {
        self.call(Request::ExportCsv, passwords::export_csv(&[])).await
    }

    pub async fn get_settings(&self) -> SettingsRecord {
        self.call(Request::GetSettings, SettingsRecord::default()).await
    }

    pub async fn save_settings(&self, partial: Map<String, Value>) -> bool {
        self.call(|reply| Request::SaveSettings { partial, reply }, false).await
    }

    pub async fn get_stats(&self) -> Vec<StatsEntry> {
        self.call(Request::GetStats, Vec::new()).await
    }

    pub async fn record_visit(&self, domain: &str) -> bool {
        let domain = domain.to_string();
        self.call(
            |reply| Request::RecordVisit {
                domain,
                reply: Some(reply),
            },
            false,
        )
        .await
    }

    /// Fire-and-forget variant for synchronous callers.
    pub fn record_visit_detached(&self, domain: &str) {
        let request = Request::RecordVisit {
            domain: domain.to_string(),
            reply: None,
        };
        if self.tx.send(request).is_err() {
            log::warn!("[Store] Gateway is not running, visit to {} dropped", domain);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store() -> (ProfileStore, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        (ProfileStore::open(dir.path(), SettingsProvider::default()), dir)
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_missing_files_yield_defaults() {
        let (store, _dir) = store();
        assert!(store.all_passwords().is_empty());
        assert!(store.stats().is_empty());
        assert_eq!(store.settings(), SettingsRecord::default());
    }

    #[test]
    fn test_malformed_files_fall_back_silently() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PASSWORD_FILE), "{not json").unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "[1,2,3]").unwrap();
        fs::write(dir.path().join(STATS_FILE), "").unwrap();

        let store = ProfileStore::open(dir.path(), SettingsProvider::default());
        assert!(store.all_passwords().is_empty());
        assert!(store.stats().is_empty());
        assert_eq!(store.settings(), SettingsRecord::default());
    }

    #[test]
    fn test_save_password_upserts() {
        let (store, _dir) = store();
        store.save_password("https://a.com", "bob", "pw1").unwrap();
        store.save_password("https://a.com", "bob", "pw2").unwrap();
        let entries = store.all_passwords();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].password, "pw2");

        store.save_password("https://a.com", "carol", "pw3").unwrap();
        assert_eq!(store.all_passwords().len(), 2);
    }

    #[test]
    fn test_delete_password() {
        let (store, _dir) = store();
        store.save_password("https://a.com", "bob", "pw1").unwrap();
        let id = store.all_passwords()[0].id;
        assert!(store.delete_password(id).unwrap());
        assert!(!store.delete_password(id).unwrap());
        assert!(store.all_passwords().is_empty());
    }

    #[test]
    fn test_csv_import_counts_valid_rows() {
        let (store, _dir) = store();
        let text = "URL,Username,Password\nhttps://a.com,bob,pw1\n,missing,pw2\nhttps://c.com,carol,pw3";
        assert_eq!(store.import_passwords_csv(text).unwrap(), 2);

        let entries = store.all_passwords();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|p| p.url == "https://c.com" && p.username == "carol"));
        assert!(store.export_passwords_csv().contains("\"https://a.com\",\"bob\",\"pw1\""));
    }

    #[test]
    fn test_settings_merge_persists_and_refreshes_provider() {
        let dir = tempfile::tempdir().unwrap();
        let provider = SettingsProvider::default();
        let store = ProfileStore::open(dir.path(), provider.clone());

        store
            .save_settings(&object(json!({"httpsOnly": true, "theme": "light"})))
            .unwrap();
        assert!(provider.current().https_only);

        let reopened = ProfileStore::open(dir.path(), SettingsProvider::default());
        let settings = reopened.settings();
        assert!(settings.https_only);
        assert!(settings.do_not_track);
        assert_eq!(settings.extra.get("theme"), Some(&json!("light")));
    }

    #[test]
    fn test_record_visit_twice() {
        let (store, _dir) = store();
        assert!(store.record_visit("example.com").unwrap());
        assert!(store.record_visit("example.com").unwrap());
        store.record_visit("other.org").unwrap();

        let entries = store.stats();
        assert_eq!(entries[0].domain, "example.com");
        assert_eq!(entries[0].visits, 2);
        assert!(entries.windows(2).all(|w| w[0].visits >= w[1].visits));
    }

    #[test]
    fn test_record_visit_respects_stats_flag() {
        let (store, _dir) = store();
        store
            .save_settings(&object(json!({"statsEnabled": false})))
            .unwrap();
        assert!(!store.record_visit("example.com").unwrap());
        assert!(store.stats().is_empty());
    }

    #[tokio::test]
    async fn test_gateway_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Gateway::spawn(ProfileStore::open(dir.path(), SettingsProvider::default()));

        assert!(gateway.save_password("https://a.com", "bob", "pw1").await);
        assert!(gateway.save_password("https://a.com", "bob", "pw2").await);
        let passwords = gateway.get_all_passwords().await;
        assert_eq!(passwords.len(), 1);
        assert_eq!(passwords[0].password, "pw2");

        assert!(gateway.record_visit("a.com").await);
        gateway.record_visit_detached("a.com");
        // Requests are served in order, so this read sees the detached write
        let stats = gateway.get_stats().await;
        assert_eq!(stats[0].visits, 2);

        assert!(gateway.save_settings(object(json!({"statsEnabled": false}))).await);
        assert!(!gateway.get_settings().await.stats_enabled);
        assert!(!gateway.record_visit("a.com").await);

        assert_eq!(
            gateway
                .import_passwords_csv("URL,Username,Password\nhttps://b.com,eve,x")
                .await,
            1
        );
        assert!(gateway.export_passwords_csv().await.contains("https://b.com"));
    }

    #[tokio::test]
    async fn test_gateway_degrades_when_files_are_unwritable() {
        let dir = tempfile::tempdir().unwrap();
        // A directory squatting on the file name makes every write fail
        fs::create_dir(dir.path().join(PASSWORD_FILE)).unwrap();
        let gateway = Gateway::spawn(ProfileStore::open(dir.path(), SettingsProvider::default()));

        assert!(!gateway.save_password("https://a.com", "bob", "pw").await);
        assert!(gateway.get_all_passwords().await.is_empty());
    }
}
