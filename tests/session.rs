//! End-to-end session behaviour against the recording transport

use std::sync::{Arc, Weak};
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;

use rtmp_live::client::CameraOffPolicy;
use rtmp_live::device::DeviceKind;
use rtmp_live::error::Permission;
use rtmp_live::testing::{MockDevices, MockTransport};
use rtmp_live::transport::{PreviewSink, TransportEvent, VideoFrame};
use rtmp_live::{
    CameraPosition, SessionConfig, StatusSubscription, StreamConfiguration, StreamManager,
    StreamMetrics, StreamStatus, StreamingError,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Harness {
    manager: StreamManager,
    transport: MockTransport,
    devices: MockDevices,
}

fn harness() -> Harness {
    harness_with(SessionConfig::default())
}

fn harness_with(config: SessionConfig) -> Harness {
    init_tracing();
    let transport = MockTransport::new();
    let devices = MockDevices::new();
    let manager = StreamManager::with_config(
        Arc::new(transport.clone()),
        Arc::new(devices.clone()),
        config,
    );
    Harness {
        manager,
        transport,
        devices,
    }
}

fn config() -> StreamConfiguration {
    StreamConfiguration::new("rtmp://ingest.example.com/live", "secret_key")
}

/// Let the listener and actor drain everything already queued
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

async fn go_live(h: &Harness, statuses: &mut StatusSubscription) {
    h.manager.start(config()).await;
    assert_eq!(statuses.recv().await, Some(StreamStatus::Connecting));

    h.transport.emit(TransportEvent::ConnectSuccess);
    h.transport.emit(TransportEvent::PublishStart);
    assert_eq!(statuses.recv().await, Some(StreamStatus::Live(None)));
}

#[tokio::test(start_paused = true)]
async fn test_successful_publish() {
    let h = harness();
    let mut statuses = h.manager.statuses();

    assert_eq!(statuses.recv().await, Some(StreamStatus::Idle));
    go_live(&h, &mut statuses).await;

    assert!(h.manager.status().metrics().is_none());

    let session = h.transport.last_session().unwrap();
    assert_eq!(
        session.connect_urls,
        vec!["rtmp://ingest.example.com/live".to_string()]
    );
    assert_eq!(session.published_keys, vec!["secret_key".to_string()]);
    assert!(session.camera.is_some());
    assert!(session.microphone.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_connection_failure_then_retry() {
    let h = harness();
    let mut statuses = h.manager.statuses();
    assert_eq!(statuses.recv().await, Some(StreamStatus::Idle));

    h.manager.start(config()).await;
    assert_eq!(statuses.recv().await, Some(StreamStatus::Connecting));

    h.transport.emit(TransportEvent::ConnectFailed);
    assert_eq!(
        statuses.recv().await,
        Some(StreamStatus::Failed(StreamingError::RtmpConnectionFailed))
    );

    // Nothing is running, so stop is absorbed
    h.manager.stop().await;
    settle().await;
    assert!(statuses.drain().is_empty());

    h.manager.start(config()).await;
    assert_eq!(statuses.recv().await, Some(StreamStatus::Connecting));

    // The retry runs on a fresh handle
    assert_eq!(h.transport.session_count(), 2);
    assert_eq!(h.transport.session(1).unwrap().connect_urls.len(), 1);
    assert!(h.transport.session(0).unwrap().connection_closed);
}

#[tokio::test(start_paused = true)]
async fn test_publish_rejected() {
    let h = harness();
    let mut statuses = h.manager.statuses();
    statuses.drain();

    h.manager.start(config()).await;
    h.transport.emit_code("NetStream.Publish.BadName");
    settle().await;

    assert_eq!(
        statuses.drain(),
        vec![
            StreamStatus::Connecting,
            StreamStatus::Failed(StreamingError::RtmpPublishFailed),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_rejected_connect_code_fails() {
    let h = harness();

    h.manager.start(config()).await;
    assert!(h.transport.emit_code("NetConnection.Connect.Rejected"));
    settle().await;

    assert_eq!(
        h.manager.status(),
        StreamStatus::Failed(StreamingError::RtmpConnectionFailed)
    );
}

#[tokio::test(start_paused = true)]
async fn test_camera_lost_while_live() {
    let h = harness_with(SessionConfig::default().metrics_interval(Duration::from_secs(1)));
    let mut statuses = h.manager.statuses();
    statuses.drain();

    go_live(&h, &mut statuses).await;

    h.transport.emit(TransportEvent::CaptureLost(DeviceKind::Camera));
    assert_eq!(
        statuses.recv().await,
        Some(StreamStatus::Failed(StreamingError::CameraUnavailable))
    );

    // Sampler is gone: no metrics after the failure
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(statuses.drain().is_empty());
    assert_eq!(
        h.manager.status(),
        StreamStatus::Failed(StreamingError::CameraUnavailable)
    );
}

#[tokio::test(start_paused = true)]
async fn test_stop_while_live_replaces_handle() {
    let h = harness();
    let mut statuses = h.manager.statuses();
    statuses.drain();

    go_live(&h, &mut statuses).await;
    let before = h.manager.handle_id().await.unwrap();

    h.manager.stop().await;
    assert_eq!(statuses.try_recv(), Some(StreamStatus::Stopped));

    let after = h.manager.handle_id().await.unwrap();
    assert_ne!(before, after);

    let old = h.transport.session(0).unwrap();
    assert!(old.stream_closed);
    assert!(old.connection_closed);

    h.manager.start(config()).await;
    assert_eq!(statuses.recv().await, Some(StreamStatus::Connecting));

    let new = h.transport.last_session().unwrap();
    assert_eq!(new.handle_id, after);
    assert_eq!(new.connect_urls.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_while_connecting() {
    let h = harness();
    let mut statuses = h.manager.statuses();
    statuses.drain();

    h.manager.start(config()).await;
    h.manager.stop().await;

    assert_eq!(
        statuses.drain(),
        vec![StreamStatus::Connecting, StreamStatus::Stopped]
    );

    // A late success from the cancelled attempt is ignored
    h.transport.emit_from(0, TransportEvent::PublishStart);
    settle().await;
    assert!(statuses.drain().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_remote_close_while_live() {
    let h = harness();
    let mut statuses = h.manager.statuses();
    statuses.drain();

    go_live(&h, &mut statuses).await;
    h.transport.emit(TransportEvent::ConnectClosed);

    assert_eq!(statuses.recv().await, Some(StreamStatus::Stopped));
    assert_eq!(h.transport.session_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_double_start_connects_once() {
    let h = harness();
    let mut statuses = h.manager.statuses();

    h.manager.start(config()).await;
    h.manager.start(config()).await;
    settle().await;

    assert_eq!(h.transport.connect_count(), 1);
    assert_eq!(
        statuses.drain(),
        vec![StreamStatus::Idle, StreamStatus::Connecting]
    );
}

#[tokio::test(start_paused = true)]
async fn test_stop_while_idle_is_ignored() {
    let h = harness();
    let mut statuses = h.manager.statuses();

    h.manager.stop().await;
    settle().await;

    assert_eq!(statuses.drain(), vec![StreamStatus::Idle]);
    assert_eq!(h.transport.session_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_metrics_while_live() {
    let h = harness_with(SessionConfig::default().metrics_interval(Duration::from_secs(1)));
    let metrics = StreamMetrics::new(2_800_000, 127_000);
    h.transport.set_bitrates(metrics);

    let mut statuses = h.manager.statuses();
    statuses.drain();
    go_live(&h, &mut statuses).await;

    let sampled = statuses.recv().await.unwrap();
    assert!(sampled.is_live());
    assert_eq!(sampled.metrics(), Some(metrics));

    let sampled = statuses.recv().await.unwrap();
    assert_eq!(sampled.metrics(), Some(metrics));
}

#[tokio::test(start_paused = true)]
async fn test_no_metrics_after_stop() {
    let h = harness_with(SessionConfig::default().metrics_interval(Duration::from_secs(1)));
    let mut statuses = h.manager.statuses();
    statuses.drain();
    go_live(&h, &mut statuses).await;

    tokio::time::sleep(Duration::from_millis(1500)).await;
    h.manager.stop().await;

    let seen = statuses.drain();
    assert_eq!(seen.last(), Some(&StreamStatus::Stopped));

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(statuses.drain().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_toggles_do_not_change_status() {
    let h = harness();
    let mut statuses = h.manager.statuses();
    statuses.drain();
    go_live(&h, &mut statuses).await;

    h.manager.set_microphone_enabled(false).await;
    h.manager.set_camera_position(CameraPosition::Front).await;
    h.manager.set_camera_enabled(false).await;
    settle().await;

    assert!(statuses.drain().is_empty());
    assert!(h.manager.status().is_live());

    let toggles = h.manager.toggles().await.unwrap();
    assert!(toggles.is_front_camera);
    assert!(!toggles.is_microphone_enabled);
    assert!(!toggles.is_camera_enabled);

    let session = h.transport.last_session().unwrap();
    assert!(session.audio_muted);
    assert!(session.microphone.is_some());
    assert!(session.camera.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_camera_off_mute_policy() {
    let h = harness_with(SessionConfig::default().camera_off_policy(CameraOffPolicy::Mute));

    h.manager.set_camera_enabled(false).await;

    let session = h.transport.last_session().unwrap();
    assert!(session.camera.is_some());
    assert!(session.video_muted);
}

#[tokio::test(start_paused = true)]
async fn test_toggles_survive_restart() {
    let h = harness();
    let mut statuses = h.manager.statuses();
    statuses.drain();

    h.manager.set_camera_position(CameraPosition::Front).await;
    h.manager.set_microphone_enabled(false).await;

    go_live(&h, &mut statuses).await;
    h.manager.stop().await;

    let toggles = h.manager.toggles().await.unwrap();
    assert_eq!(toggles.camera_position(), CameraPosition::Front);
    assert!(!toggles.is_microphone_enabled);

    let fresh = h.transport.last_session().unwrap();
    assert_eq!(
        fresh.camera.unwrap().position,
        Some(CameraPosition::Front)
    );
    assert!(fresh.audio_muted);
}

#[tokio::test(start_paused = true)]
async fn test_missing_camera_fails_session() {
    let h = harness();
    h.devices.set_camera_available(CameraPosition::Front, false);
    let mut statuses = h.manager.statuses();
    statuses.drain();

    h.manager.set_camera_position(CameraPosition::Front).await;
    assert_eq!(
        statuses.try_recv(),
        Some(StreamStatus::Failed(StreamingError::CameraUnavailable))
    );

    // Still missing: the attempt fails right after connecting
    h.manager.start(config()).await;
    assert_eq!(
        statuses.drain(),
        vec![
            StreamStatus::Connecting,
            StreamStatus::Failed(StreamingError::CameraUnavailable),
        ]
    );
    assert_eq!(h.transport.connect_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_camera_lost_while_idle_blocks_next_start() {
    let h = harness();
    let mut statuses = h.manager.statuses();
    statuses.drain();

    h.devices.set_camera_available(CameraPosition::Back, false);
    h.transport.emit(TransportEvent::CaptureLost(DeviceKind::Camera));
    settle().await;
    assert_eq!(
        statuses.drain(),
        vec![StreamStatus::Failed(StreamingError::CameraUnavailable)]
    );
    assert!(h.transport.last_session().unwrap().camera.is_none());

    h.manager.start(config()).await;
    assert_eq!(
        statuses.drain(),
        vec![
            StreamStatus::Connecting,
            StreamStatus::Failed(StreamingError::CameraUnavailable),
        ]
    );
    assert_eq!(h.transport.connect_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_microphone_lost_while_stopped_blocks_next_start() {
    let h = harness();
    let mut statuses = h.manager.statuses();
    statuses.drain();

    go_live(&h, &mut statuses).await;
    h.manager.stop().await;
    assert_eq!(statuses.drain(), vec![StreamStatus::Stopped]);

    h.devices.set_microphone_available(false);
    h.transport
        .emit(TransportEvent::CaptureLost(DeviceKind::Microphone));
    settle().await;
    assert_eq!(
        statuses.drain(),
        vec![StreamStatus::Failed(StreamingError::MicrophoneUnavailable)]
    );

    h.manager.start(config()).await;
    assert_eq!(
        statuses.drain(),
        vec![
            StreamStatus::Connecting,
            StreamStatus::Failed(StreamingError::MicrophoneUnavailable),
        ]
    );
    assert_eq!(h.transport.connect_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_lost_camera_returns_before_start() {
    let h = harness();
    let mut statuses = h.manager.statuses();
    statuses.drain();

    h.transport.emit(TransportEvent::CaptureLost(DeviceKind::Camera));
    settle().await;
    assert_eq!(
        statuses.drain(),
        vec![StreamStatus::Failed(StreamingError::CameraUnavailable)]
    );

    // Device is back by the time the user retries
    h.manager.start(config()).await;
    assert_eq!(statuses.drain(), vec![StreamStatus::Connecting]);

    let session = h.transport.last_session().unwrap();
    assert!(session.camera.is_some());
    assert_eq!(session.connect_urls.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_camera_reenabled_at_toggled_position() {
    let h = harness();
    let mut statuses = h.manager.statuses();
    statuses.drain();

    h.manager.set_camera_enabled(false).await;
    assert!(h.transport.last_session().unwrap().camera.is_none());

    h.manager.set_camera_position(CameraPosition::Front).await;
    assert!(h.transport.last_session().unwrap().camera.is_none());

    h.manager.set_camera_enabled(true).await;
    let session = h.transport.last_session().unwrap();
    assert_eq!(session.camera.unwrap().position, Some(CameraPosition::Front));
    assert!(!session.video_muted);

    settle().await;
    assert!(statuses.drain().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_camera_reenabled_while_missing() {
    let h = harness();
    let mut statuses = h.manager.statuses();
    statuses.drain();
    go_live(&h, &mut statuses).await;

    h.manager.set_camera_enabled(false).await;
    h.devices.set_camera_available(CameraPosition::Back, false);
    h.manager.set_camera_enabled(true).await;

    assert_eq!(
        statuses.drain(),
        vec![StreamStatus::Failed(StreamingError::CameraUnavailable)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_microphone_lost() {
    let h = harness();
    let mut statuses = h.manager.statuses();
    statuses.drain();
    go_live(&h, &mut statuses).await;

    h.transport
        .emit(TransportEvent::CaptureLost(DeviceKind::Microphone));
    assert_eq!(
        statuses.recv().await,
        Some(StreamStatus::Failed(StreamingError::MicrophoneUnavailable))
    );
}

#[tokio::test(start_paused = true)]
async fn test_permission_denied_is_ignored() {
    let h = harness();
    let mut statuses = h.manager.statuses();
    statuses.drain();
    go_live(&h, &mut statuses).await;

    h.transport
        .emit(TransportEvent::PermissionDenied(Permission::Camera));
    h.transport.emit(TransportEvent::PublishIdle);
    settle().await;

    assert!(statuses.drain().is_empty());
    assert!(h.manager.status().is_live());
}

#[tokio::test(start_paused = true)]
async fn test_invalid_url_fails_connection() {
    let h = harness();
    let mut statuses = h.manager.statuses();
    statuses.drain();

    h.manager
        .start(StreamConfiguration::new("http://example.com/live", "key"))
        .await;

    assert_eq!(
        statuses.drain(),
        vec![
            StreamStatus::Connecting,
            StreamStatus::Failed(StreamingError::RtmpConnectionFailed),
        ]
    );
    assert_eq!(h.transport.connect_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_key_embedded_in_url() {
    let h = harness();

    h.manager
        .start(StreamConfiguration::new(
            "rtmp://ingest.example.com/live/embedded",
            "",
        ))
        .await;

    let session = h.transport.last_session().unwrap();
    assert_eq!(session.published_keys, vec!["embedded".to_string()]);
    assert_eq!(session.connect_urls.len(), 1);
    assert!(!session.connect_urls[0].ends_with("/embedded"));
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_same_sequence() {
    let h = harness();
    let mut first = h.manager.statuses();
    let mut second = h.manager.statuses();
    assert_eq!(h.manager.subscriber_count(), 2);

    h.manager.start(config()).await;
    h.transport.emit(TransportEvent::PublishStart);
    settle().await;
    h.manager.stop().await;

    let expected = vec![
        StreamStatus::Idle,
        StreamStatus::Connecting,
        StreamStatus::Live(None),
        StreamStatus::Stopped,
    ];
    assert_eq!(first.drain(), expected);
    assert_eq!(second.drain(), expected);
}

#[tokio::test(start_paused = true)]
async fn test_late_subscriber_gets_current_first() {
    let h = harness();

    h.manager.start(config()).await;
    h.transport.emit(TransportEvent::PublishStart);
    settle().await;

    let mut late = h.manager.statuses();
    assert_eq!(late.try_recv(), Some(StreamStatus::Live(None)));
    assert!(late.try_recv().is_none());

    h.manager.stop().await;
    assert_eq!(late.try_recv(), Some(StreamStatus::Stopped));
}

#[tokio::test(start_paused = true)]
async fn test_dropped_subscriber_is_pruned() {
    let h = harness();
    let statuses = h.manager.statuses();
    assert_eq!(h.manager.subscriber_count(), 1);

    drop(statuses);
    assert_eq!(h.manager.subscriber_count(), 0);
}

#[derive(Default)]
struct RecordingPreview {
    frames: Mutex<Vec<u32>>,
}

impl PreviewSink for RecordingPreview {
    fn push_frame(&self, frame: VideoFrame) {
        self.frames.lock().push(frame.timestamp);
    }
}

fn frame(timestamp: u32) -> VideoFrame {
    VideoFrame {
        timestamp,
        width: 1280,
        height: 720,
        data: Bytes::from_static(&[0u8; 16]),
    }
}

#[tokio::test(start_paused = true)]
async fn test_preview_follows_handle() {
    let h = harness();
    let preview = Arc::new(RecordingPreview::default());
    let sink: Arc<dyn PreviewSink> = preview.clone();
    let weak: Weak<dyn PreviewSink> = Arc::downgrade(&sink);

    h.manager.attach_preview(weak).await;
    assert!(h.transport.push_preview_frame(frame(1)));

    h.manager.start(config()).await;
    h.manager.stop().await;

    // Replacement handle is wired to the same surface
    assert!(h.transport.push_preview_frame(frame(2)));
    assert_eq!(*preview.frames.lock(), vec![1, 2]);

    h.manager.detach_preview().await;
    assert!(!h.transport.push_preview_frame(frame(3)));
}

#[tokio::test(start_paused = true)]
async fn test_preview_dropped_by_owner() {
    let h = harness();
    let sink: Arc<dyn PreviewSink> = Arc::new(RecordingPreview::default());

    h.manager.attach_preview(Arc::downgrade(&sink)).await;
    drop(sink);

    assert!(!h.transport.push_preview_frame(frame(1)));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_ends_subscriptions() {
    let h = harness();
    let mut statuses = h.manager.statuses();

    h.manager.start(config()).await;
    h.manager.shutdown().await;
    settle().await;

    assert_eq!(statuses.recv().await, Some(StreamStatus::Idle));
    assert_eq!(statuses.recv().await, Some(StreamStatus::Connecting));
    assert_eq!(statuses.recv().await, None);

    assert!(!h.manager.is_running());
    assert!(h.transport.last_session().unwrap().connection_closed);

    // Calls after shutdown are absorbed
    h.manager.start(config()).await;
    assert!(h.manager.snapshot().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_snapshot() {
    let h = harness();

    let snapshot = h.manager.snapshot().await.unwrap();
    assert!(snapshot.status.is_idle());
    assert!(!snapshot.handle_connected);

    h.manager.start(config()).await;
    let snapshot = h.manager.snapshot().await.unwrap();
    assert!(snapshot.status.is_connecting());
    assert!(snapshot.handle_connected);
    assert_eq!(snapshot.handle_id, h.transport.last_session().unwrap().handle_id);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_manager_tears_down() {
    let Harness {
        manager, transport, ..
    } = harness();
    let mut statuses = manager.statuses();

    manager.start(config()).await;
    drop(manager);
    settle().await;

    assert_eq!(
        statuses.drain(),
        vec![StreamStatus::Idle, StreamStatus::Connecting]
    );
    assert_eq!(statuses.recv().await, None);
    assert!(transport.last_session().unwrap().connection_closed);
    assert!(transport.last_session().unwrap().stream_closed);
}
