// Tauri host binding.
// Content views are child webviews of the main window, stacked under the
// toolbar and right of the sidebar. Everything here is glue: state lives
// in `Shell`, persistence behind the gateway.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::{Map, Value};
use tauri::plugin::{Builder, TauriPlugin};
use tauri::webview::{DownloadEvent, PageLoadEvent};
use tauri::{
    AppHandle, Emitter, Manager, PhysicalPosition, PhysicalSize, Runtime, State, Url, Webview,
    WebviewBuilder, WebviewUrl, Window,
};

use crate::config::ShellConfig;
use crate::error::{ShellError, ShellResult};
use crate::modules::commands::{NavActionKind, NavCommand};
use crate::modules::downloads;
use crate::modules::passwords::PasswordEntry;
use crate::modules::policy::{RequestDecision, RequestPolicy, SettingsProvider};
use crate::modules::session::SessionHistory;
use crate::modules::shortcuts::{KeyEvent, Shortcut};
use crate::modules::stats::{domain_of, StatsEntry};
use crate::modules::views::{ContentView, ViewEvent, ViewHost};
use crate::settings::SettingsRecord;
use crate::shell::Shell;
use crate::state::{NavState, ShellEvent, Tab, TabId};
use crate::store::{Gateway, GatewayHandle, ProfileStore};

/// Event name every `ShellEvent` is emitted under.
pub const SHELL_EVENT: &str = "shell-event";

const MAIN_WINDOW: &str = "main";
const TOOLBAR_HEIGHT: f64 = 56.0 + 28.0;
const SIDEBAR_WIDTH: f64 = 240.0;

// Page-visible half of Do-Not-Track; the header half needs request interception.
const DNT_SCRIPT: &str =
    "Object.defineProperty(Navigator.prototype, 'doNotTrack', { get: () => '1' });";

fn view_err(e: tauri::Error) -> ShellError {
    ShellError::view(e.to_string())
}

fn content_bounds<R: Runtime>(
    window: &Window<R>,
) -> ShellResult<(PhysicalPosition<i32>, PhysicalSize<u32>)> {
    let physical_size = window.inner_size().map_err(view_err)?;
    let scale = window.scale_factor().map_err(view_err)?;
    let top = (TOOLBAR_HEIGHT * scale) as u32;
    let left = (SIDEBAR_WIDTH * scale) as u32;

    Ok((
        PhysicalPosition::new(left as i32, top as i32),
        PhysicalSize::new(
            physical_size.width.saturating_sub(left).max(100),
            physical_size.height.saturating_sub(top).max(100),
        ),
    ))
}

pub struct TauriView<R: Runtime> {
    webview: Webview<R>,
    history: Arc<Mutex<SessionHistory>>,
    devtools: bool,
}

impl<R: Runtime> TauriView<R> {
    fn history(&self) -> ShellResult<std::sync::MutexGuard<'_, SessionHistory>> {
        self.history
            .lock()
            .map_err(|_| ShellError::view("session history poisoned"))
    }

    fn eval(&self, js: &str) -> ShellResult<()> {
        self.webview.eval(js).map_err(view_err)
    }

    fn traverse(&self, js: &str) -> ShellResult<()> {
        let result = self.eval(js);
        if result.is_err() {
            self.history()?.cancel_traversal();
        }
        result
    }

    fn fit(&self, position: PhysicalPosition<i32>, size: PhysicalSize<u32>) {
        let bounds = tauri::Rect {
            position: tauri::Position::Physical(position),
            size: tauri::Size::Physical(size),
        };
        if let Err(e) = self.webview.set_bounds(bounds) {
            log::warn!("[Host] Failed to resize {}: {}", self.webview.label(), e);
        }
    }
}

impl<R: Runtime> ContentView for TauriView<R> {
    fn load_url(&mut self, url: &str) -> ShellResult<()> {
        let parsed = Url::parse(url)?;
        self.webview.navigate(parsed).map_err(view_err)
    }

    fn can_go_back(&self) -> ShellResult<bool> {
        Ok(self.history()?.can_go_back())
    }

    fn can_go_forward(&self) -> ShellResult<bool> {
        Ok(self.history()?.can_go_forward())
    }

    fn go_back(&mut self) -> ShellResult<()> {
        if !self.history()?.begin_back() {
            return Ok(());
        }
        self.traverse("window.history.back()")
    }

    fn go_forward(&mut self) -> ShellResult<()> {
        if !self.history()?.begin_forward() {
            return Ok(());
        }
        self.traverse("window.history.forward()")
    }

    fn reload(&mut self) -> ShellResult<()> {
        self.eval("window.location.reload()")
    }

    fn stop(&mut self) -> ShellResult<()> {
        self.eval("window.stop()")
    }

    fn title(&self) -> Option<String> {
        let history = self.history().ok()?;
        history.current().and_then(domain_of)
    }

    fn is_devtools_open(&self) -> bool {
        self.devtools
    }

    fn open_devtools(&mut self) -> ShellResult<()> {
        self.webview.open_devtools();
        self.devtools = true;
        Ok(())
    }

    fn close_devtools(&mut self) -> ShellResult<()> {
        self.webview.close_devtools();
        self.devtools = false;
        Ok(())
    }

    fn set_visible(&mut self, visible: bool) -> ShellResult<()> {
        if visible {
            self.webview.show().map_err(view_err)
        } else {
            self.webview.hide().map_err(view_err)
        }
    }

    fn close(&mut self) -> ShellResult<()> {
        self.webview.close().map_err(view_err)
    }
}

pub struct TauriHost<R: Runtime> {
    window: Window<R>,
    policy: Arc<RequestPolicy>,
    settings: SettingsProvider,
    user_agent: String,
    download_dir: PathBuf,
}

impl<R: Runtime> TauriHost<R> {
    pub fn new(window: Window<R>, settings: SettingsProvider, config: &ShellConfig) -> Self {
        Self {
            window,
            policy: Arc::new(RequestPolicy::new(settings.clone())),
            settings,
            user_agent: config.user_agent.clone(),
            download_dir: config.download_dir.clone(),
        }
    }
}

impl<R: Runtime> ViewHost for TauriHost<R> {
    type View = TauriView<R>;

    fn create_view(&mut self, tab: &Tab) -> ShellResult<TauriView<R>> {
        let label = format!("content-{}", tab.id.0);
        let url = Url::parse(&tab.url)?;
        let history = Arc::new(Mutex::new(SessionHistory::new(&tab.url)));
        let (position, size) = content_bounds(&self.window)?;

        let tab_id = tab.id;
        let policy = self.policy.clone();
        let app = self.window.app_handle().clone();
        let redirect_label = label.clone();
        let page_history = history.clone();
        let download_dir = self.download_dir.clone();

        let mut builder = WebviewBuilder::new(&label, WebviewUrl::External(url))
            .user_agent(&self.user_agent)
            .on_navigation(move |url| match policy.before_request(url.as_str()) {
                RequestDecision::Proceed => true,
                RequestDecision::Internal => false,
                RequestDecision::Redirect(target) => {
                    log::info!("[Host] Upgrading {} to {}", url, target);
                    let app = app.clone();
                    let label = redirect_label.clone();
                    tauri::async_runtime::spawn(async move {
                        if let (Some(webview), Ok(target)) =
                            (app.get_webview(&label), Url::parse(&target))
                        {
                            if let Err(e) = webview.navigate(target) {
                                log::warn!("[Host] Failed to upgrade {}: {}", label, e);
                            }
                        }
                    });
                    false
                }
            })
            .on_page_load(move |webview, payload| {
                let event = match payload.event() {
                    PageLoadEvent::Started => {
                        if let Ok(mut history) = page_history.lock() {
                            history.start_load();
                        }
                        ViewEvent::LoadStarted
                    }
                    PageLoadEvent::Finished => {
                        if let Ok(mut history) = page_history.lock() {
                            history.commit(payload.url().as_str());
                        }
                        ViewEvent::LoadStopped
                    }
                };
                let app = webview.app_handle().clone();
                // Never re-enter the shell lock from inside an engine callback
                tauri::async_runtime::spawn(async move {
                    forward_view_event(&app, tab_id, event);
                });
            })
            .on_download(move |webview, event| {
                let app = webview.app_handle();
                let state = app.state::<HostState<R>>();
                match event {
                    DownloadEvent::Requested { url, destination } => {
                        let download = downloads::requested(&download_dir, url.as_str());
                        log::info!("[Host] Downloading {} to {}", url, download.path);
                        *destination = PathBuf::from(&download.path);
                        state.publish(app, vec![download.started()]);
                    }
                    DownloadEvent::Finished { url, path, success } => {
                        let event =
                            downloads::finished(&download_dir, url.as_str(), path.as_deref(), success);
                        state.publish(app, vec![event]);
                    }
                    _ => {}
                }
                true
            });

        if self.settings.current().do_not_track {
            builder = builder.initialization_script(DNT_SCRIPT);
        }

        let webview = self
            .window
            .add_child(builder, position, size)
            .map_err(view_err)?;
        log::debug!("[Host] Created {} for {}", label, tab.url);

        Ok(TauriView {
            webview,
            history,
            devtools: false,
        })
    }
}

type HostShell<R> = Shell<TauriHost<R>>;

pub struct HostState<R: Runtime> {
    shell: Mutex<Option<HostShell<R>>>,
    gateway: GatewayHandle,
    settings: SettingsProvider,
    config: ShellConfig,
}

impl<R: Runtime> HostState<R> {
    fn attach(&self, window: Window<R>) -> ShellResult<()> {
        let host = TauriHost::new(window, self.settings.clone(), &self.config);
        let mut slot = self
            .shell
            .lock()
            .map_err(|_| ShellError::host("shell lock poisoned"))?;
        *slot = Some(Shell::new(host, self.settings.clone()));
        Ok(())
    }

    /// Runs `f` under the shell lock, then publishes what it produced.
    fn with_shell<T>(
        &self,
        app: &AppHandle<R>,
        f: impl FnOnce(&mut HostShell<R>) -> ShellResult<T>,
    ) -> ShellResult<T> {
        let (value, events) = {
            let mut slot = self
                .shell
                .lock()
                .map_err(|_| ShellError::host("shell lock poisoned"))?;
            let shell = slot
                .as_mut()
                .ok_or_else(|| ShellError::host("main window not ready"))?;
            let value = f(shell)?;
            (value, shell.drain_events())
        };
        self.publish(app, events);
        Ok(value)
    }

    fn publish(&self, app: &AppHandle<R>, events: Vec<ShellEvent>) {
        for event in events {
            match event {
                ShellEvent::VisitRecorded(domain) => self.gateway.record_visit_detached(&domain),
                other => {
                    if let Err(e) = app.emit(SHELL_EVENT, &other) {
                        log::warn!("[Host] Failed to emit shell event: {}", e);
                    }
                }
            }
        }
    }
}

fn forward_view_event<R: Runtime>(app: &AppHandle<R>, tab: TabId, event: ViewEvent) {
    let state = app.state::<HostState<R>>();
    if let Err(e) = state.with_shell(app, |shell| {
        shell.handle_view_event(tab, event);
        Ok(())
    }) {
        log::warn!("[Host] Dropped {:?} for {}: {}", event, tab, e);
    }
}

fn relayout<R: Runtime>(app: &AppHandle<R>, window: &Window<R>) {
    let Ok((position, size)) = content_bounds(window) else {
        return;
    };
    let state = app.state::<HostState<R>>();
    if let Err(e) = state.with_shell(app, |shell| {
        for id in shell.views().ids() {
            if let Some(view) = shell.views().get(id) {
                view.fit(position, size);
            }
        }
        Ok(())
    }) {
        log::warn!("[Host] Skipped relayout: {}", e);
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabsSnapshot {
    tabs: Vec<Tab>,
    active_tab_id: TabId,
}

type CommandResult<T> = Result<T, String>;

fn to_command<T>(result: ShellResult<T>) -> CommandResult<T> {
    result.map_err(|e| e.to_string())
}

// --- Tab commands ---

#[tauri::command]
fn get_tabs<R: Runtime>(app: AppHandle<R>, state: State<'_, HostState<R>>) -> CommandResult<TabsSnapshot> {
    to_command(state.with_shell(&app, |shell| {
        Ok(TabsSnapshot {
            tabs: shell.tabs().tabs().to_vec(),
            active_tab_id: shell.active_tab_id(),
        })
    }))
}

#[tauri::command]
fn add_tab<R: Runtime>(app: AppHandle<R>, state: State<'_, HostState<R>>) -> CommandResult<TabId> {
    to_command(state.with_shell(&app, |shell| Ok(shell.add_tab())))
}

#[tauri::command]
fn remove_tab<R: Runtime>(app: AppHandle<R>, state: State<'_, HostState<R>>, id: TabId) -> CommandResult<()> {
    to_command(state.with_shell(&app, |shell| {
        shell.remove_tab(id);
        Ok(())
    }))
}

#[tauri::command]
fn activate_tab<R: Runtime>(app: AppHandle<R>, state: State<'_, HostState<R>>, id: TabId) -> CommandResult<()> {
    to_command(state.with_shell(&app, |shell| {
        if !shell.tabs().contains(id) {
            return Err(ShellError::NotFound(id));
        }
        shell.activate_tab(id);
        Ok(())
    }))
}

#[tauri::command]
fn toggle_pin<R: Runtime>(app: AppHandle<R>, state: State<'_, HostState<R>>, id: TabId) -> CommandResult<()> {
    to_command(state.with_shell(&app, |shell| {
        shell.toggle_pin(id);
        Ok(())
    }))
}

#[tauri::command]
fn close_others<R: Runtime>(app: AppHandle<R>, state: State<'_, HostState<R>>, id: TabId) -> CommandResult<()> {
    to_command(state.with_shell(&app, |shell| {
        shell.close_others(id);
        Ok(())
    }))
}

#[tauri::command]
fn duplicate_tab<R: Runtime>(
    app: AppHandle<R>,
    state: State<'_, HostState<R>>,
    id: TabId,
) -> CommandResult<Option<TabId>> {
    to_command(state.with_shell(&app, |shell| Ok(shell.duplicate_tab(id))))
}

#[tauri::command]
fn reorder_tabs<R: Runtime>(
    app: AppHandle<R>,
    state: State<'_, HostState<R>>,
    order: Vec<TabId>,
) -> CommandResult<()> {
    to_command(state.with_shell(&app, |shell| {
        shell.reorder_tabs(&order);
        Ok(())
    }))
}

#[tauri::command]
fn navigate<R: Runtime>(
    app: AppHandle<R>,
    state: State<'_, HostState<R>>,
    input: String,
) -> CommandResult<Option<String>> {
    to_command(state.with_shell(&app, |shell| Ok(shell.navigate(&input))))
}

#[tauri::command]
fn open_in_new_tab<R: Runtime>(
    app: AppHandle<R>,
    state: State<'_, HostState<R>>,
    input: String,
) -> CommandResult<Option<TabId>> {
    to_command(state.with_shell(&app, |shell| Ok(shell.open_in_new_tab(&input))))
}

// --- Navigation commands ---

#[tauri::command]
fn trigger_nav_action<R: Runtime>(
    app: AppHandle<R>,
    state: State<'_, HostState<R>>,
    kind: NavActionKind,
) -> CommandResult<NavCommand> {
    to_command(state.with_shell(&app, |shell| Ok(shell.trigger_nav_action(kind))))
}

#[tauri::command]
fn get_nav_state<R: Runtime>(app: AppHandle<R>, state: State<'_, HostState<R>>) -> CommandResult<NavState> {
    to_command(state.with_shell(&app, |shell| Ok(shell.nav_state())))
}

#[tauri::command]
fn handle_key<R: Runtime>(
    app: AppHandle<R>,
    state: State<'_, HostState<R>>,
    event: KeyEvent,
) -> CommandResult<bool> {
    to_command(state.with_shell(&app, |shell| Ok(shell.handle_key(&event))))
}

#[tauri::command]
fn get_shortcuts<R: Runtime>(app: AppHandle<R>, state: State<'_, HostState<R>>) -> CommandResult<Vec<Shortcut>> {
    to_command(state.with_shell(&app, |shell| Ok(shell.shortcuts().shortcuts().to_vec())))
}

// --- Persistence commands ---

#[tauri::command]
async fn get_all_passwords<R: Runtime>(state: State<'_, HostState<R>>) -> CommandResult<Vec<PasswordEntry>> {
    Ok(state.gateway.get_all_passwords().await)
}

#[tauri::command]
async fn save_password<R: Runtime>(
    state: State<'_, HostState<R>>,
    url: String,
    username: String,
    password: String,
) -> CommandResult<bool> {
    Ok(state.gateway.save_password(&url, &username, &password).await)
}

#[tauri::command]
async fn delete_password<R: Runtime>(state: State<'_, HostState<R>>, id: i64) -> CommandResult<bool> {
    Ok(state.gateway.delete_password(id).await)
}

#[tauri::command]
async fn import_passwords_csv<R: Runtime>(state: State<'_, HostState<R>>, text: String) -> CommandResult<usize> {
    Ok(state.gateway.import_passwords_csv(&text).await)
}

#[tauri::command]
async fn export_passwords_csv<R: Runtime>(state: State<'_, HostState<R>>) -> CommandResult<String> {
    Ok(state.gateway.export_passwords_csv().await)
}

#[tauri::command]
async fn get_settings<R: Runtime>(state: State<'_, HostState<R>>) -> CommandResult<SettingsRecord> {
    Ok(state.gateway.get_settings().await)
}

#[tauri::command]
async fn save_settings<R: Runtime>(
    state: State<'_, HostState<R>>,
    partial: Map<String, Value>,
) -> CommandResult<bool> {
    Ok(state.gateway.save_settings(partial).await)
}

#[tauri::command]
async fn get_stats<R: Runtime>(state: State<'_, HostState<R>>) -> CommandResult<Vec<StatsEntry>> {
    Ok(state.gateway.get_stats().await)
}

/// Shell plugin. The application must create a window labelled "main";
/// content views attach to it once it is ready.
pub fn init<R: Runtime>(config: ShellConfig) -> TauriPlugin<R> {
    Builder::new("mix-browser")
        .invoke_handler(tauri::generate_handler![
            get_tabs,
            add_tab,
            remove_tab,
            activate_tab,
            toggle_pin,
            close_others,
            duplicate_tab,
            reorder_tabs,
            navigate,
            open_in_new_tab,
            trigger_nav_action,
            get_nav_state,
            handle_key,
            get_shortcuts,
            get_all_passwords,
            save_password,
            delete_password,
            import_passwords_csv,
            export_passwords_csv,
            get_settings,
            save_settings,
            get_stats
        ])
        .setup(move |app, _api| {
            let settings = SettingsProvider::default();
            let store = ProfileStore::open(config.data_dir.clone(), settings.clone());
            let gateway = tauri::async_runtime::block_on(async move { Gateway::spawn(store) });
            log::info!("[Host] Profile at {:?}", config.data_dir);

            app.manage(HostState::<R> {
                shell: Mutex::new(None),
                gateway,
                settings,
                config,
            });
            Ok(())
        })
        .on_window_ready(|window| {
            if window.label() != MAIN_WINDOW {
                return;
            }
            let app = window.app_handle().clone();
            let state = app.state::<HostState<R>>();
            if let Err(e) = state.attach(window.clone()) {
                log::error!("[Host] Failed to attach shell: {}", e);
                return;
            }

            let resized = window.clone();
            window.on_window_event(move |event| {
                if let tauri::WindowEvent::Resized(_) = event {
                    relayout(resized.app_handle(), &resized);
                }
            });
        })
        .build()
}

/// Logger plugin, registered next to `init`.
pub fn logger<R: Runtime>() -> TauriPlugin<R> {
    tauri_plugin_log::Builder::default()
        .level(log::LevelFilter::Info)
        .build()
}
