//! Session lifecycle: handshake, frame endpoint, and mode dispatch.
//!
//! One session per frame instance. [`run`] opens the channel over the given
//! transport, fetches the initial `{mode, ...properties}` snapshot exactly
//! once, dispatches the author callback for the session's mode, and then
//! serves the frame-exposed protocol surface until the host closes the
//! channel.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite};
use tokio::sync::mpsc;

use crate::channel::{Channel, HostCaller};
use crate::context::{
    compose, AssetSourceExtras, BaseCtx, ConfigScreenExtras, FieldExtensionConfigExtras,
    FieldExtensionExtras, FrameControls, InspectorExtras, InspectorPanelExtras,
    ItemCollectionOutletExtras, ItemFormOutletExtras, ItemFormSidebarExtras,
    ItemFormSidebarPanelExtras, ModalExtras, PageExtras, UploadSidebarExtras,
    UploadSidebarPanelExtras,
};
use crate::error::{Error, Result};
use crate::field_fanout::fan_out;
use crate::height::{HeightTracker, LayoutProbe, ObserverHost};
use crate::hooks::{PluginHooks, RenderHook};
use crate::host::HostHandle;
use crate::merged::MergedCtx;
use crate::mode::Mode;
use crate::model::{Field, Snapshot};
use crate::protocol::Envelope;
use crate::settings::SettingsStore;

/// Version string served by the `sdkVersion` probe.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Platform bindings for layout measurement and change observation.
#[derive(Clone)]
pub struct FramePlatform {
    pub probe: Arc<dyn LayoutProbe>,
    pub observers: Arc<dyn ObserverHost>,
}

/// Session tuning knobs.
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// Fail startup if the host does not answer the initial settings fetch
    /// within this window. `None` waits forever.
    pub handshake_timeout: Option<Duration>,
}

/// Run a session over stdio. Convenience wrapper for hosts that embed the
/// frame as a subprocess.
pub async fn run_stdio(
    hooks: PluginHooks,
    platform: FramePlatform,
    options: ConnectOptions,
) -> Result<()> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();
    run(
        hooks,
        platform,
        tokio::io::BufReader::new(stdin),
        tokio::io::BufWriter::new(stdout),
        options,
    )
    .await
}

/// Run a session over an arbitrary transport until the host closes it.
pub async fn run<R, W>(
    hooks: PluginHooks,
    platform: FramePlatform,
    reader: R,
    writer: W,
    options: ConnectOptions,
) -> Result<()>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (channel, writer_task) = Channel::start(writer);
    let host = HostHandle::new(Arc::clone(&channel) as Arc<dyn HostCaller>);
    let hooks = Arc::new(hooks);

    // The select in the handshake must stay cancel-safe, so line reading
    // gets its own task and everything downstream consumes a channel.
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    let reader_task = tokio::spawn(async move {
        let mut reader = reader;
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => break,
                Ok(_) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if line_tx.send(line.trim().to_string()).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "transport read failed");
                    break;
                }
            }
        }
    });

    let initial = match handshake(&channel, &host, &hooks, &mut line_rx, &options).await {
        Ok(initial) => initial,
        Err(err) => {
            channel.shutdown("startup failed");
            reader_task.abort();
            writer_task.abort();
            return Err(err);
        }
    };

    let mode = initial.mode.clone();
    tracing::debug!(mode = %mode, "session established");

    let settings = Arc::new(SettingsStore::new(initial.clone()));
    let tracker = HeightTracker::new(host.clone(), platform.probe, platform.observers);
    let frame = FrameControls::new(Arc::clone(&tracker));

    let state = SessionState {
        channel: Arc::clone(&channel),
        host: host.clone(),
        hooks: Arc::clone(&hooks),
        settings: Arc::clone(&settings),
        mode: mode.clone(),
    };

    dispatch_initial(&mode, &hooks, &host, &frame, &initial);

    if mode.is_rendering() {
        let listener_mode = mode.clone();
        let listener_hooks = Arc::clone(&hooks);
        let listener_host = host.clone();
        let listener_frame = frame.clone();
        settings.set_listener(Box::new(move |snapshot| {
            dispatch_render(
                &listener_mode,
                &listener_hooks,
                &listener_host,
                &listener_frame,
                &snapshot,
            );
        }));
    }

    while let Some(line) = line_rx.recv().await {
        state.handle_line(&line);
    }

    // Host is gone; nothing left to flush or answer.
    channel.shutdown("host closed the channel");
    tracker.stop();
    reader_task.abort();
    writer_task.abort();
    Ok(())
}

/// Fetch the initial snapshot, answering probe calls and call responses
/// that arrive while the fetch is in flight.
async fn handshake(
    channel: &Arc<Channel>,
    host: &HostHandle,
    hooks: &Arc<PluginHooks>,
    line_rx: &mut mpsc::UnboundedReceiver<String>,
    options: &ConnectOptions,
) -> Result<Snapshot> {
    let settings_future = host.get_settings();
    tokio::pin!(settings_future);

    let deadline = options.handshake_timeout.map(tokio::time::sleep);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            result = &mut settings_future => return result,
            () = async {
                match deadline.as_mut().as_pin_mut() {
                    Some(sleep) => sleep.await,
                    None => std::future::pending().await,
                }
            } => {
                return Err(Error::handshake("host did not answer the settings fetch"));
            }
            line = line_rx.recv() => {
                let Some(line) = line else {
                    return Err(Error::handshake("channel closed before initial settings"));
                };
                handle_handshake_line(channel, hooks, &line);
            }
        }
    }
}

fn handle_handshake_line(channel: &Arc<Channel>, hooks: &Arc<PluginHooks>, line: &str) {
    let envelope = match Envelope::parse(line) {
        Ok(envelope) => envelope,
        Err(err) => {
            tracing::warn!(error = %err, "dropping malformed line");
            return;
        }
    };
    match envelope {
        Envelope::Response {
            id,
            ok,
            data,
            code,
            message,
        } => {
            channel.complete_from_envelope(&id, ok, data, code, message);
        }
        Envelope::Call { id, method, params } => {
            let outcome = probe_method(hooks, &method, &params).unwrap_or_else(|| {
                Err(Error::validation(format!(
                    "method {method} is not available before startup completes"
                )))
            });
            respond(channel, id, &method, outcome);
        }
    }
}

/// Methods that need no session state and are served even before startup
/// completes. Returns `None` for everything else.
fn probe_method(hooks: &PluginHooks, method: &str, _params: &Value) -> Option<Result<Value>> {
    match method {
        "sdkVersion" => Some(Ok(json!({ "version": SDK_VERSION }))),
        "implementedHooks" => {
            Some(serde_json::to_value(hooks.implemented()).map_err(Error::from))
        }
        _ => None,
    }
}

fn respond(channel: &Arc<Channel>, id: Option<String>, method: &str, outcome: Result<Value>) {
    let Some(id) = id else {
        if let Err(err) = outcome {
            tracing::warn!(method, error = %err, "notification handler failed");
        }
        return;
    };
    let envelope = match outcome {
        Ok(data) => Envelope::response_ok(id, Some(data)),
        Err(err) => Envelope::response_error(id, err.wire_code(), err.to_string()),
    };
    if let Err(err) = channel.send(&envelope) {
        tracing::warn!(method, error = %err, "failed to send response");
    }
}

struct SessionState {
    channel: Arc<Channel>,
    host: HostHandle,
    hooks: Arc<PluginHooks>,
    settings: Arc<SettingsStore>,
    mode: Mode,
}

impl SessionState {
    fn handle_line(&self, line: &str) {
        let envelope = match Envelope::parse(line) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(error = %err, "dropping malformed line");
                return;
            }
        };
        match envelope {
            Envelope::Response {
                id,
                ok,
                data,
                code,
                message,
            } => {
                self.channel
                    .complete_from_envelope(&id, ok, data, code, message);
            }
            Envelope::Call { id, method, params } => {
                self.handle_call(id, &method, params);
            }
        }
    }

    fn handle_call(&self, id: Option<String>, method: &str, params: Value) {
        if let Some(outcome) = probe_method(&self.hooks, method, &params) {
            respond(&self.channel, id, method, outcome);
            return;
        }

        match method {
            "settingsChange" => {
                let outcome = self.apply_settings_change(params);
                respond(&self.channel, id, method, outcome);
            }
            "callHook" => {
                let outcome = self.call_declarative_hook(&params);
                respond(&self.channel, id, method, outcome);
            }
            "fieldExtensionOverrides" | "fieldDecorators" | "fieldBlockStyles" => {
                let outcome = self.call_field_hook(method, &params);
                respond(&self.channel, id, method, outcome);
            }
            "invokeHook" => self.spawn_merged_hook(id, &params),
            other => {
                respond(
                    &self.channel,
                    id,
                    method,
                    Err(Error::validation(format!("unknown method: {other}"))),
                );
            }
        }
    }

    /// Store the pushed snapshot; the registered change listener re-renders.
    fn apply_settings_change(&self, params: Value) -> Result<Value> {
        let snapshot: Snapshot = serde_json::from_value(params)?;
        if snapshot.mode != self.mode {
            tracing::warn!(
                session_mode = %self.mode,
                pushed_mode = %snapshot.mode,
                "pushed mode differs from session mode; dispatch stays on the session mode",
            );
        }
        self.settings.push(snapshot);
        Ok(Value::Null)
    }

    fn call_declarative_hook(&self, params: &Value) -> Result<Value> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::validation("callHook: missing hook name"))?;
        let args = params.get("args").cloned().unwrap_or(Value::Null);

        let Some(hook) = self.hooks.declarative.get(name) else {
            return Err(Error::validation(format!("unknown hook: {name}")));
        };
        let base = BaseCtx::from_snapshot(self.host.clone(), &self.settings.current());
        hook(&args, &base)
    }

    fn call_field_hook(&self, method: &str, params: &Value) -> Result<Value> {
        let fields: Vec<Field> =
            serde_json::from_value(params.get("fields").cloned().unwrap_or(Value::Null))
                .map_err(|err| Error::validation(format!("{method}: bad fields list: {err}")))?;

        let hook = match method {
            "fieldExtensionOverrides" => self.hooks.field_extension_overrides.as_ref(),
            "fieldDecorators" => self.hooks.field_decorators.as_ref(),
            _ => self.hooks.field_block_styles.as_ref(),
        };

        let base = BaseCtx::from_snapshot(self.host.clone(), &self.settings.current());
        let results = fan_out(hook, &fields, &base);
        Ok(serde_json::to_value(results)?)
    }

    /// Merged-execution entry point. The handler may call back into the
    /// host, so it runs in its own task; the response goes out when it
    /// finishes.
    fn spawn_merged_hook(&self, id: Option<String>, params: &Value) {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            respond(
                &self.channel,
                id,
                "invokeHook",
                Err(Error::validation("invokeHook: missing hook name")),
            );
            return;
        };

        let Some(hook) = self.hooks.merged.get(name) else {
            respond(
                &self.channel,
                id,
                "invokeHook",
                Err(Error::validation(format!("unknown hook: {name}"))),
            );
            return;
        };

        let call_id = params
            .get("callId")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let args = params.get("args").cloned().unwrap_or(Value::Null);
        let extra_state = match params.get("extraState") {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };

        let ctx = MergedCtx::new(
            self.host.clone(),
            call_id,
            self.settings.current().properties,
            extra_state,
        );

        let future = hook(args, ctx);
        let channel = Arc::clone(&self.channel);
        tokio::spawn(async move {
            let outcome = future.await;
            respond(&channel, id, "invokeHook", outcome);
        });
    }
}

/// First dispatch after the handshake.
fn dispatch_initial(
    mode: &Mode,
    hooks: &Arc<PluginHooks>,
    host: &HostHandle,
    frame: &FrameControls,
    snapshot: &Snapshot,
) {
    match mode {
        Mode::OnBoot => {
            if let Some(hook) = &hooks.on_boot {
                let ctx = BaseCtx::from_snapshot(host.clone(), snapshot);
                tokio::spawn(hook(ctx));
            }
        }
        Mode::Init => {}
        Mode::Unsupported(value) => {
            tracing::warn!(mode = %value, "unsupported mode; nothing will render");
        }
        _ => dispatch_render(mode, hooks, host, frame, snapshot),
    }
}

/// Compose the context for a rendering mode and spawn the author callback.
/// Invocations are not serialized; a slow callback may overlap the next one.
fn dispatch_render(
    mode: &Mode,
    hooks: &Arc<PluginHooks>,
    host: &HostHandle,
    frame: &FrameControls,
    snapshot: &Snapshot,
) {
    match mode {
        Mode::RenderPage => {
            spawn_render::<PageExtras>(&hooks.render_page, host, frame, snapshot);
        }
        Mode::RenderModal => {
            spawn_render::<ModalExtras>(&hooks.render_modal, host, frame, snapshot);
        }
        Mode::RenderAssetSource => {
            spawn_render::<AssetSourceExtras>(&hooks.render_asset_source, host, frame, snapshot);
        }
        Mode::RenderItemFormSidebar => {
            spawn_render::<ItemFormSidebarExtras>(
                &hooks.render_item_form_sidebar,
                host,
                frame,
                snapshot,
            );
        }
        Mode::RenderItemFormSidebarPanel => {
            spawn_render::<ItemFormSidebarPanelExtras>(
                &hooks.render_item_form_sidebar_panel,
                host,
                frame,
                snapshot,
            );
        }
        Mode::RenderItemFormOutlet => {
            spawn_render::<ItemFormOutletExtras>(
                &hooks.render_item_form_outlet,
                host,
                frame,
                snapshot,
            );
        }
        Mode::RenderItemCollectionOutlet => {
            spawn_render::<ItemCollectionOutletExtras>(
                &hooks.render_item_collection_outlet,
                host,
                frame,
                snapshot,
            );
        }
        Mode::RenderFieldExtension => {
            spawn_render::<FieldExtensionExtras>(
                &hooks.render_field_extension,
                host,
                frame,
                snapshot,
            );
        }
        Mode::RenderFieldExtensionConfigScreen => {
            spawn_render::<FieldExtensionConfigExtras>(
                &hooks.render_field_extension_config_screen,
                host,
                frame,
                snapshot,
            );
        }
        Mode::RenderConfigScreen => {
            spawn_render::<ConfigScreenExtras>(&hooks.render_config_screen, host, frame, snapshot);
        }
        Mode::RenderInspector => {
            spawn_render::<InspectorExtras>(&hooks.render_inspector, host, frame, snapshot);
        }
        Mode::RenderInspectorPanel => {
            spawn_render::<InspectorPanelExtras>(
                &hooks.render_inspector_panel,
                host,
                frame,
                snapshot,
            );
        }
        Mode::RenderUploadSidebar => {
            spawn_render::<UploadSidebarExtras>(
                &hooks.render_upload_sidebar,
                host,
                frame,
                snapshot,
            );
        }
        Mode::RenderUploadSidebarPanel => {
            spawn_render::<UploadSidebarPanelExtras>(
                &hooks.render_upload_sidebar_panel,
                host,
                frame,
                snapshot,
            );
        }
        Mode::OnBoot | Mode::Init | Mode::Unsupported(_) => {}
    }
}

fn spawn_render<E: DeserializeOwned + Default + Send + 'static>(
    hook: &Option<RenderHook<E>>,
    host: &HostHandle,
    frame: &FrameControls,
    snapshot: &Snapshot,
) {
    if let Some(hook) = hook {
        let ctx = compose::<E>(host.clone(), snapshot, frame.clone());
        tokio::spawn(hook(ctx));
    }
}
