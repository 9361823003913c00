//! Console publisher demo
//!
//! Run with: cargo run --example console_publisher [URL] [STREAM_KEY]
//!
//! Drives a full session against a simulated ingest server that accepts
//! every connection, reports a steady bitrate and drops the connection
//! after a while. Status changes are printed as they arrive.
//!
//! Set `RUST_LOG=rtmp_live=debug` to see the session's own logging.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rtmp_live::client::{EncoderSettings, SessionConfig};
use rtmp_live::device::{CaptureDevice, DeviceProvider};
use rtmp_live::testing::MockDevices;
use rtmp_live::transport::{
    Connection, PreviewHandle, PublishStream, Transport, TransportEvent, TransportEventSink,
};
use rtmp_live::{CameraPosition, StreamConfiguration, StreamManager, StreamMetrics, StreamStatus};

/// Ingest server stand-in: every connect succeeds after a short delay
struct SimulatedTransport {
    session_lifetime: Duration,
}

impl Transport for SimulatedTransport {
    fn create_session(
        &self,
        events: TransportEventSink,
    ) -> (Box<dyn Connection>, Box<dyn PublishStream>) {
        let bytes_sent = Arc::new(AtomicU64::new(0));
        (
            Box::new(SimulatedConnection {
                events: events.clone(),
                lifetime: self.session_lifetime,
                bytes_sent: Arc::clone(&bytes_sent),
            }),
            Box::new(SimulatedStream { events, bytes_sent }),
        )
    }
}

struct SimulatedConnection {
    events: TransportEventSink,
    lifetime: Duration,
    bytes_sent: Arc<AtomicU64>,
}

impl Connection for SimulatedConnection {
    fn connect(&mut self, url: &str) {
        println!("  [server] connect {}", url);
        let events = self.events.clone();
        let lifetime = self.lifetime;
        let bytes_sent = Arc::clone(&self.bytes_sent);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            events.emit_code("NetConnection.Connect.Success");
            tokio::time::sleep(Duration::from_millis(200)).await;
            events.emit_code("NetStream.Publish.Start");

            let mut elapsed = Duration::ZERO;
            while elapsed < lifetime {
                tokio::time::sleep(Duration::from_millis(100)).await;
                elapsed += Duration::from_millis(100);
                bytes_sent.fetch_add(2_500_000 / 80, Ordering::Relaxed);
            }
            events.emit(TransportEvent::ConnectClosed);
        });
    }

    fn close(&mut self) {
        println!("  [server] connection closed");
    }
}

struct SimulatedStream {
    events: TransportEventSink,
    bytes_sent: Arc<AtomicU64>,
}

impl PublishStream for SimulatedStream {
    fn configure(&mut self, settings: &EncoderSettings) {
        println!(
            "  [encoder] {}x{} @ {} kbps video, {} kbps audio",
            settings.video.width,
            settings.video.height,
            settings.video.bitrate / 1000,
            settings.audio.bitrate / 1000
        );
    }

    fn attach_camera(&mut self, camera: Option<&CaptureDevice>) {
        match camera {
            Some(camera) => println!("  [capture] camera: {}", camera.name),
            None => println!("  [capture] camera detached"),
        }
    }

    fn attach_microphone(&mut self, microphone: Option<&CaptureDevice>) {
        if let Some(microphone) = microphone {
            println!("  [capture] microphone: {}", microphone.name);
        }
    }

    fn set_video_muted(&mut self, _muted: bool) {}

    fn set_audio_muted(&mut self, _muted: bool) {}

    fn set_preview(&mut self, _preview: Option<PreviewHandle>) {}

    fn publish(&mut self, _stream_key: &str) {
        println!("  [server] publish requested on handle {}", self.events.handle_id());
    }

    fn close(&mut self) {}

    fn bitrates(&self) -> StreamMetrics {
        // Bytes per second over the last sample, as bits
        let bytes = self.bytes_sent.swap(0, Ordering::Relaxed);
        StreamMetrics::new(bytes * 8, 128_000)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let url = args
        .next()
        .unwrap_or_else(|| "rtmp://localhost/live".to_string());
    let key = args.next().unwrap_or_else(|| "demo_key".to_string());

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("console_publisher=info".parse()?),
        )
        .init();

    let devices: Arc<dyn DeviceProvider> = Arc::new(MockDevices::new());
    let transport = Arc::new(SimulatedTransport {
        session_lifetime: Duration::from_secs(4),
    });

    let manager = StreamManager::with_config(
        transport,
        devices,
        SessionConfig::default().metrics_interval(Duration::from_secs(1)),
    );

    let mut statuses = manager.statuses();
    let printer = tokio::spawn(async move {
        while let Some(status) = statuses.recv().await {
            match status.metrics() {
                Some(m) => println!(
                    "status: {} ({} kbps video, {} kbps audio)",
                    status,
                    m.video_kbps(),
                    m.audio_kbps()
                ),
                None => println!("status: {}", status),
            }
        }
    });

    manager.start(StreamConfiguration::new(url, key)).await;

    tokio::time::sleep(Duration::from_secs(2)).await;
    manager.set_camera_position(CameraPosition::Front).await;

    // Wait for the server to drop us
    while !matches!(manager.status(), StreamStatus::Stopped | StreamStatus::Failed(_)) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    manager.shutdown().await;
    printer.await?;

    Ok(())
}
