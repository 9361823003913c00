//! Session actor
//!
//! Owns every piece of mutable session state and processes one message at a
//! time: caller commands, transport events (via the listener task) and
//! sampler ticks. Status changes, sampler start/stop and handle replacement
//! all happen inside a single message, so no observer can see them torn.
//!
//! ```text
//!  StreamManager ──Command──► ┌──────────────┐ ──publish──► StatusBroadcaster
//!                             │ SessionActor │
//!  SDK ─► sink ─► listener ──►│  state, handle, sampler
//!                             └──────────────┘ ◄──tick── MetricsSampler
//! ```

use std::ops::ControlFlow;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::event::SessionEvent;
use super::handle::SessionHandle;
use super::machine::transition;
use super::sampler::{MetricsSampler, SamplerTick};
use crate::client::config::{SessionConfig, StreamConfiguration};
use crate::device::{CameraPosition, DeviceBinder, DeviceError, DeviceProvider, ToggleState};
use crate::status::{StatusBroadcaster, StreamStatus};
use crate::transport::event::TaggedEvent;
use crate::transport::{PreviewHandle, Transport, TransportEventSink};

/// Messages processed by the session actor
#[derive(Debug)]
pub(crate) enum Command {
    Start {
        config: StreamConfiguration,
        respond_to: oneshot::Sender<()>,
    },
    Stop {
        respond_to: oneshot::Sender<()>,
    },
    SetCameraPosition {
        position: CameraPosition,
        respond_to: oneshot::Sender<()>,
    },
    SetMicrophoneEnabled {
        enabled: bool,
        respond_to: oneshot::Sender<()>,
    },
    SetCameraEnabled {
        enabled: bool,
        respond_to: oneshot::Sender<()>,
    },
    SetPreview {
        preview: Option<PreviewHandle>,
        respond_to: oneshot::Sender<()>,
    },
    GetSnapshot {
        respond_to: oneshot::Sender<SessionSnapshot>,
    },
    /// Event from the handle with the given id
    Transport {
        handle_id: u64,
        event: SessionEvent,
    },
    Shutdown {
        respond_to: oneshot::Sender<()>,
    },
}

/// Point-in-time view of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub status: StreamStatus,
    pub toggles: ToggleState,
    /// Id of the current session handle
    pub handle_id: u64,
    /// Whether the current handle has issued a connect
    pub handle_connected: bool,
}

pub(crate) struct SessionActor {
    transport: Arc<dyn Transport>,
    binder: DeviceBinder,
    status: Arc<StatusBroadcaster>,
    config: SessionConfig,
    toggles: ToggleState,
    handle: Option<SessionHandle>,
    next_handle_id: u64,
    sampler: Option<MetricsSampler>,
    next_sampler_id: u64,
    preview: Option<PreviewHandle>,
    event_tx: mpsc::UnboundedSender<TaggedEvent>,
    tick_tx: mpsc::Sender<SamplerTick>,
    shutdown: CancellationToken,
}

impl SessionActor {
    /// Spawn the actor and its transport listener.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn spawn(
        transport: Arc<dyn Transport>,
        devices: Arc<dyn DeviceProvider>,
        status: Arc<StatusBroadcaster>,
        config: SessionConfig,
    ) -> (mpsc::Sender<Command>, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::channel(config.command_capacity);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (tick_tx, tick_rx) = mpsc::channel(1);
        let shutdown = CancellationToken::new();

        spawn_listener(event_rx, command_tx.downgrade(), shutdown.clone());

        let mut actor = Self {
            transport,
            binder: DeviceBinder::new(devices, config.camera_off),
            status,
            toggles: config.initial_toggles,
            config,
            handle: None,
            next_handle_id: 1,
            sampler: None,
            next_sampler_id: 1,
            preview: None,
            event_tx,
            tick_tx,
            shutdown,
        };

        let task = tokio::spawn(async move {
            if let Some(event) = actor.open_handle() {
                actor.apply_event(event);
            }
            actor.run(command_rx, tick_rx).await;
        });

        (command_tx, task)
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut ticks: mpsc::Receiver<SamplerTick>,
    ) {
        loop {
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    Some(command) => {
                        if self.handle_command(command).is_break() {
                            return;
                        }
                    }
                    None => break,
                },
                Some(tick) = ticks.recv() => self.on_tick(tick),
            }
        }

        self.teardown();
    }

    /// Process one command. `Break` means the actor has shut down.
    fn handle_command(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Start { config, respond_to } => {
                self.start(config);
                let _ = respond_to.send(());
            }
            Command::Stop { respond_to } => {
                self.stop();
                let _ = respond_to.send(());
            }
            Command::SetCameraPosition {
                position,
                respond_to,
            } => {
                self.set_camera_position(position);
                let _ = respond_to.send(());
            }
            Command::SetMicrophoneEnabled {
                enabled,
                respond_to,
            } => {
                self.set_microphone_enabled(enabled);
                let _ = respond_to.send(());
            }
            Command::SetCameraEnabled {
                enabled,
                respond_to,
            } => {
                self.set_camera_enabled(enabled);
                let _ = respond_to.send(());
            }
            Command::SetPreview {
                preview,
                respond_to,
            } => {
                self.set_preview(preview);
                let _ = respond_to.send(());
            }
            Command::GetSnapshot { respond_to } => {
                let _ = respond_to.send(self.snapshot());
            }
            Command::Transport { handle_id, event } => self.on_transport_event(handle_id, event),
            Command::Shutdown { respond_to } => {
                self.teardown();
                let _ = respond_to.send(());
                return ControlFlow::Break(());
            }
        }

        ControlFlow::Continue(())
    }

    fn start(&mut self, config: StreamConfiguration) {
        let current = self.status.current();
        if !current.can_start() {
            tracing::debug!(status = %current, "Start ignored, attempt already running");
            return;
        }

        self.set_status(StreamStatus::Connecting);

        let bound = match self.handle.as_mut() {
            Some(handle) => handle.bind_devices(&self.binder, &self.toggles),
            None => Ok(()),
        };
        if let Err(e) = bound {
            tracing::warn!(error = %e, "Device binding failed on start");
            self.apply_event(e.into());
            return;
        }

        match config.publish_target() {
            Ok(target) => {
                if let Some(handle) = self.handle.as_mut() {
                    handle.connect(&target);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, url = %config.url(), "Invalid publish configuration");
                self.apply_event(SessionEvent::ConnectionFailed);
            }
        }
    }

    fn stop(&mut self) {
        let current = self.status.current();
        if !current.is_live_or_connecting() {
            tracing::debug!(status = %current, "Stop ignored, no attempt running");
            return;
        }

        self.set_status(StreamStatus::Stopped);
    }

    fn set_camera_position(&mut self, position: CameraPosition) {
        self.toggles.set_camera_position(position);

        let result = match self.handle.as_mut() {
            Some(handle) => handle.sync_camera(&self.binder, &self.toggles),
            None => Ok(()),
        };
        self.on_device_result(result);
    }

    fn set_microphone_enabled(&mut self, enabled: bool) {
        self.toggles.is_microphone_enabled = enabled;

        let result = match self.handle.as_mut() {
            Some(handle) => handle.sync_microphone(&self.binder, &self.toggles),
            None => Ok(()),
        };
        self.on_device_result(result);
    }

    fn set_camera_enabled(&mut self, enabled: bool) {
        self.toggles.is_camera_enabled = enabled;

        let result = match self.handle.as_mut() {
            Some(handle) => handle.sync_camera(&self.binder, &self.toggles),
            None => Ok(()),
        };
        self.on_device_result(result);
    }

    fn on_device_result(&mut self, result: Result<(), DeviceError>) {
        if let Err(e) = result {
            tracing::warn!(error = %e, "Device unavailable");
            self.apply_event(e.into());
        }
    }

    fn set_preview(&mut self, preview: Option<PreviewHandle>) {
        if let Some(handle) = self.handle.as_mut() {
            handle.set_preview(preview.clone());
        }
        self.preview = preview;
    }

    fn on_transport_event(&mut self, handle_id: u64, event: SessionEvent) {
        let current_id = self.handle.as_ref().map(|h| h.id());
        if current_id != Some(handle_id) {
            tracing::debug!(
                handle_id = handle_id,
                current = ?current_id,
                event = ?event,
                "Dropping event from discarded handle"
            );
            return;
        }

        self.apply_event(event);
    }

    fn on_tick(&mut self, tick: SamplerTick) {
        let is_current = self
            .sampler
            .as_ref()
            .is_some_and(|s| s.id() == tick.sampler_id);
        if !is_current || !self.status.current().is_live() {
            tracing::trace!(sampler_id = tick.sampler_id, "Discarding stale metrics tick");
            return;
        }

        if let Some(handle) = self.handle.as_ref() {
            let metrics = handle.metrics();
            tracing::trace!(
                video_bitrate = metrics.video_bitrate,
                audio_bitrate = metrics.audio_bitrate,
                "Live metrics"
            );
            self.status.publish(StreamStatus::Live(Some(metrics)));
        }
    }

    /// Run an event through the state machine
    fn apply_event(&mut self, event: SessionEvent) {
        // A lost device must be resolved again by the next bind
        if let (Some(kind), Some(handle)) = (event.lost_device(), self.handle.as_mut()) {
            handle.release(kind);
        }

        let current = self.status.current();
        match transition(&current, &event) {
            Some(next) => {
                tracing::debug!(event = ?event, "Event accepted");
                self.set_status(next);
            }
            None => {
                tracing::debug!(status = %current, event = ?event, "Event ignored");
            }
        }
    }

    /// Move to `next`, applying every side effect of the change
    ///
    /// Order matters: the sampler is cancelled and the handle replaced before
    /// the new status becomes visible, and device failures found while
    /// binding the replacement handle are applied after it.
    fn set_status(&mut self, next: StreamStatus) {
        let previous = self.status.current();

        if previous.is_live() && !next.is_live() {
            self.stop_sampler();
        }

        let mut follow_up = None;
        if previous.is_live_or_connecting() && !next.is_live_or_connecting() {
            follow_up = self.replace_handle();
        }

        self.status.publish(next);
        tracing::info!(from = %previous, to = %next, "Stream status changed");

        if next.is_live() && !previous.is_live() {
            self.start_sampler();
        }

        if let Some(event) = follow_up {
            self.apply_event(event);
        }
    }

    fn start_sampler(&mut self) {
        let id = self.next_sampler_id;
        self.next_sampler_id += 1;

        let sampler = MetricsSampler::spawn(
            id,
            self.config.metrics_interval,
            &self.shutdown,
            self.tick_tx.clone(),
        );
        if let Some(old) = self.sampler.replace(sampler) {
            old.stop();
        }
    }

    fn stop_sampler(&mut self) {
        if let Some(sampler) = self.sampler.take() {
            sampler.stop();
        }
    }

    /// Close the current handle and open a fresh one
    fn replace_handle(&mut self) -> Option<SessionEvent> {
        if let Some(handle) = self.handle.take() {
            handle.close();
        }
        self.open_handle()
    }

    /// Open a handle and bind devices. Returns the failure event, if any.
    fn open_handle(&mut self) -> Option<SessionEvent> {
        let id = self.next_handle_id;
        self.next_handle_id += 1;

        let sink = TransportEventSink::new(id, self.event_tx.clone());
        let mut handle = SessionHandle::open(
            self.transport.as_ref(),
            sink,
            &self.config.encoder,
            self.preview.clone(),
        );

        let bound = handle.bind_devices(&self.binder, &self.toggles);
        self.handle = Some(handle);

        match bound {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(handle_id = id, error = %e, "Device binding failed");
                Some(e.into())
            }
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status.current(),
            toggles: self.toggles,
            handle_id: self.handle.as_ref().map(|h| h.id()).unwrap_or_default(),
            handle_connected: self.handle.as_ref().is_some_and(|h| h.is_connected()),
        }
    }

    fn teardown(&mut self) {
        self.stop_sampler();
        self.shutdown.cancel();

        if let Some(handle) = self.handle.take() {
            handle.close();
        }
        self.status.close();

        tracing::info!("Session shut down");
    }
}

/// Forward transport callbacks into the actor mailbox
///
/// Holds only a weak sender so it never keeps the actor alive.
fn spawn_listener(
    mut events: mpsc::UnboundedReceiver<TaggedEvent>,
    commands: mpsc::WeakSender<Command>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let tagged = tokio::select! {
                _ = shutdown.cancelled() => break,
                tagged = events.recv() => match tagged {
                    Some(tagged) => tagged,
                    None => break,
                },
            };

            let Some(commands) = commands.upgrade() else {
                break;
            };

            let command = Command::Transport {
                handle_id: tagged.handle_id,
                event: SessionEvent::from(tagged.event),
            };
            if commands.send(command).await.is_err() {
                break;
            }
        }
        tracing::trace!("Transport listener exited");
    })
}
