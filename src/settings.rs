use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchEngine {
    #[default]
    Google,
    Bing,
    Yandex,
    DuckDuckGo,
}

impl SearchEngine {
    pub fn query_url(&self, query: &str) -> String {
        let q = urlencoding::encode(query);
        match self {
            Self::Google => format!("https://www.google.com/search?q={}", q),
            Self::Bing => format!("https://www.bing.com/search?q={}", q),
            Self::Yandex => format!("https://yandex.com/search/?text={}", q),
            Self::DuckDuckGo => format!("https://duckduckgo.com/?q={}", q),
        }
    }
}

fn enabled() -> bool {
    true
}

/// Privacy and profile settings persisted in `settings.json`.
///
/// Keys this crate does not know about are kept in `extra` so a save never
/// drops preferences written by another surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRecord {
    #[serde(default = "enabled")]
    pub do_not_track: bool,
    #[serde(default)]
    pub https_only: bool,
    #[serde(default = "enabled")]
    pub stats_enabled: bool,
    #[serde(default)]
    pub search_engine: SearchEngine,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for SettingsRecord {
    fn default() -> Self {
        Self {
            do_not_track: true,
            https_only: false,
            stats_enabled: true,
            search_engine: SearchEngine::default(),
            extra: Map::new(),
        }
    }
}

impl SettingsRecord {
    /// Shallow merge: every key of `partial` replaces the stored value, all
    /// other keys are left alone. A recognized key carrying a value of the
    /// wrong type is skipped rather than poisoning the whole record.
    pub fn merge(&mut self, partial: &Map<String, Value>) {
        for (key, value) in partial {
            let mut candidate = match serde_json::to_value(&*self) {
                Ok(Value::Object(map)) => map,
                _ => return,
            };
            candidate.insert(key.clone(), value.clone());
            match serde_json::from_value::<SettingsRecord>(Value::Object(candidate)) {
                Ok(merged) => *self = merged,
                Err(e) => log::warn!("[Settings] Ignoring invalid value for '{}': {}", key, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_defaults_match_missing_file_contract() {
        let s = SettingsRecord::default();
        assert!(s.do_not_track);
        assert!(!s.https_only);
        assert!(s.stats_enabled);
        assert_eq!(
            serde_json::to_value(&s).unwrap(),
            json!({"doNotTrack": true, "httpsOnly": false, "statsEnabled": true, "searchEngine": "google"})
        );
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let raw = r#"{"doNotTrack":false,"theme":"light","blurLevel":10}"#;
        let s: SettingsRecord = serde_json::from_str(raw).unwrap();
        assert!(!s.do_not_track);
        assert!(s.stats_enabled, "missing keys fall back to defaults");
        assert_eq!(s.extra.get("theme"), Some(&json!("light")));

        let back = serde_json::to_value(&s).unwrap();
        assert_eq!(back["blurLevel"], json!(10));
    }

    #[test]
    fn test_merge_is_shallow() {
        let mut s = SettingsRecord::default();
        s.merge(&object(json!({"theme": "dark"})));
        s.merge(&object(json!({"httpsOnly": true})));

        assert!(s.https_only);
        assert!(s.do_not_track);
        assert_eq!(s.extra.get("theme"), Some(&json!("dark")));
    }

    #[test]
    fn test_merge_skips_wrongly_typed_key() {
        let mut s = SettingsRecord::default();
        s.merge(&object(json!({"statsEnabled": "nope", "httpsOnly": true})));
        assert!(s.stats_enabled);
        assert!(s.https_only);
    }

    #[test]
    fn test_search_engine_query_url() {
        assert_eq!(
            SearchEngine::DuckDuckGo.query_url("rust lang"),
            "https://duckduckgo.com/?q=rust%20lang"
        );
        assert_eq!(
            SearchEngine::Yandex.query_url("c++"),
            "https://yandex.com/search/?text=c%2B%2B"
        );
    }
}
