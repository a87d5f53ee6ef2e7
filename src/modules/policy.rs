// Content-security network policy - pure logic.
// Consulted synchronously for every outgoing request, so settings are read
// through a lock-free snapshot that the store refreshes on every save.

use std::sync::Arc;

use arc_swap::ArcSwap;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::modules::navigation::is_internal_url;
use crate::settings::SettingsRecord;

const DNT: &str = "dnt";

/// Shared, explicitly injected settings snapshot.
#[derive(Clone)]
pub struct SettingsProvider {
    current: Arc<ArcSwap<SettingsRecord>>,
}

impl SettingsProvider {
    pub fn new(initial: SettingsRecord) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(initial)),
        }
    }

    /// Lock-free read for the hot path.
    pub fn current(&self) -> Arc<SettingsRecord> {
        self.current.load_full()
    }

    pub fn update(&self, settings: SettingsRecord) {
        self.current.store(Arc::new(settings));
    }
}

impl Default for SettingsProvider {
    fn default() -> Self {
        Self::new(SettingsRecord::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestDecision {
    Proceed,
    Redirect(String),
    /// Internal pseudo-URLs are served by the shell, never by the engine.
    Internal,
}

pub struct RequestPolicy {
    settings: SettingsProvider,
}

impl RequestPolicy {
    pub fn new(settings: SettingsProvider) -> Self {
        Self { settings }
    }

    /// HTTPS-only: plain-HTTP requests are redirected to their https equivalent.
    pub fn before_request(&self, url: &str) -> RequestDecision {
        if is_internal_url(url) {
            return RequestDecision::Internal;
        }
        if !self.settings.current().https_only {
            return RequestDecision::Proceed;
        }

        match Url::parse(url) {
            Ok(mut parsed) if parsed.scheme() == "http" => {
                // http -> https is always an allowed scheme change
                if parsed.set_scheme("https").is_err() {
                    return RequestDecision::Proceed;
                }
                RequestDecision::Redirect(parsed.to_string())
            }
            _ => RequestDecision::Proceed,
        }
    }

    /// Do-Not-Track: forces `DNT: 1` on every outgoing request.
    pub fn before_send_headers(&self, headers: &mut HeaderMap) {
        if self.settings.current().do_not_track {
            headers.insert(HeaderName::from_static(DNT), HeaderValue::from_static("1"));
        }
    }
}
