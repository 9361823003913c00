//! Session and stream configuration

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::device::ToggleState;
use crate::error::UrlError;

/// Default RTMP port
pub const DEFAULT_RTMP_PORT: u16 = 1935;

/// Default RTMPS port
pub const DEFAULT_RTMPS_PORT: u16 = 443;

/// What disabling the camera does to the attached device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraOffPolicy {
    /// Detach the camera; re-enabling resolves it again
    #[default]
    Detach,
    /// Keep the camera attached and mute the video track
    Mute,
}

/// Video encoder settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSettings {
    pub width: u32,
    pub height: u32,
    /// Target bitrate (bits/sec)
    pub bitrate: u32,
    pub profile_level: String,
    pub max_keyframe_interval: Duration,
    pub allow_frame_reordering: bool,
    pub hardware_encoder: bool,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            bitrate: 3_000_000,
            profile_level: "H264_Main_AutoLevel".into(),
            max_keyframe_interval: Duration::from_secs(2),
            allow_frame_reordering: false,
            hardware_encoder: true,
        }
    }
}

/// Audio encoder settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSettings {
    /// Target bitrate (bits/sec)
    pub bitrate: u32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self { bitrate: 128_000 }
    }
}

/// Encoder settings applied to every new publish stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncoderSettings {
    pub video: VideoSettings,
    pub audio: AudioSettings,
}

/// Streaming session options
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Encoder settings
    pub encoder: EncoderSettings,

    /// Interval between live metrics samples
    pub metrics_interval: Duration,

    /// Capacity of the session command mailbox
    pub command_capacity: usize,

    /// Input configuration at construction
    pub initial_toggles: ToggleState,

    /// Behavior of `set_camera_enabled(false)`
    pub camera_off: CameraOffPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            encoder: EncoderSettings::default(),
            metrics_interval: Duration::from_secs(1),
            command_capacity: 256,
            initial_toggles: ToggleState::default(),
            camera_off: CameraOffPolicy::default(),
        }
    }
}

impl SessionConfig {
    /// Set encoder settings
    pub fn encoder(mut self, encoder: EncoderSettings) -> Self {
        self.encoder = encoder;
        self
    }

    /// Set the metrics sampling interval
    pub fn metrics_interval(mut self, interval: Duration) -> Self {
        self.metrics_interval = interval.max(Duration::from_millis(10));
        self
    }

    /// Set the command mailbox capacity
    pub fn command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity.max(1);
        self
    }

    /// Set the initial input configuration
    pub fn initial_toggles(mut self, toggles: ToggleState) -> Self {
        self.initial_toggles = toggles;
        self
    }

    /// Set what disabling the camera does
    pub fn camera_off_policy(mut self, policy: CameraOffPolicy) -> Self {
        self.camera_off = policy;
        self
    }
}

/// Destination of one streaming attempt
///
/// The stream key is kept secret: it is redacted from `Debug` output and
/// never logged.
#[derive(Debug, Clone)]
pub struct StreamConfiguration {
    url: String,
    stream_key: SecretString,
}

impl StreamConfiguration {
    pub fn new(url: impl Into<String>, stream_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            stream_key: SecretString::from(stream_key.into()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn stream_key(&self) -> &SecretString {
        &self.stream_key
    }

    /// Parse the publish URL
    pub fn parse_url(&self) -> Result<RtmpUrl, UrlError> {
        RtmpUrl::parse(&self.url)
    }

    /// Resolve where to connect and which key to publish
    ///
    /// An explicit key wins; otherwise the key embedded in the URL path is
    /// used and stripped from the connect URL.
    pub fn publish_target(&self) -> Result<PublishTarget, UrlError> {
        let parsed = self.parse_url()?;
        let explicit = self.stream_key.expose_secret().trim();

        if !explicit.is_empty() {
            return Ok(PublishTarget {
                connect_url: self.url.trim().trim_end_matches('/').to_string(),
                stream_key: SecretString::from(explicit.to_string()),
            });
        }

        let embedded = parsed.stream_key.clone().ok_or(UrlError::MissingStreamKey)?;
        Ok(PublishTarget {
            connect_url: parsed.base_url(),
            stream_key: SecretString::from(embedded),
        })
    }
}

/// Resolved connect URL and stream key
#[derive(Debug, Clone)]
pub struct PublishTarget {
    pub connect_url: String,
    pub stream_key: SecretString,
}

/// Components of an `rtmp://` or `rtmps://` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtmpUrl {
    pub secure: bool,
    pub host: String,
    /// Explicit port, if the URL carried one
    pub port: Option<u16>,
    pub app: String,
    /// Path after the application name
    pub stream_key: Option<String>,
}

impl RtmpUrl {
    /// Parse `rtmp[s]://host[:port]/app[/stream_key]`
    pub fn parse(url: &str) -> Result<Self, UrlError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(UrlError::Empty);
        }

        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| UrlError::UnsupportedScheme(String::new()))?;

        let secure = match scheme.to_ascii_lowercase().as_str() {
            "rtmp" => false,
            "rtmps" => true,
            other => return Err(UrlError::UnsupportedScheme(other.to_string())),
        };

        let (authority, path) = match rest.split_once('/') {
            Some((authority, path)) => (authority, path),
            None => (rest, ""),
        };

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) if !port.ends_with(']') => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| UrlError::InvalidPort(port.to_string()))?;
                (host, Some(port))
            }
            _ => (authority, None),
        };

        if host.is_empty() {
            return Err(UrlError::MissingHost);
        }

        let path = path.trim_matches('/');
        let (app, stream_key) = match path.split_once('/') {
            Some((app, key)) => (app, Some(key.to_string())),
            None => (path, None),
        };

        if app.is_empty() {
            return Err(UrlError::MissingApp);
        }

        Ok(Self {
            secure,
            host: host.to_string(),
            port,
            app: app.to_string(),
            stream_key: stream_key.filter(|k| !k.is_empty()),
        })
    }

    /// Port to connect to, falling back to the scheme default
    pub fn effective_port(&self) -> u16 {
        match (self.port, self.secure) {
            (Some(port), _) => port,
            (None, true) => DEFAULT_RTMPS_PORT,
            (None, false) => DEFAULT_RTMP_PORT,
        }
    }

    /// URL up to and including the application name
    pub fn base_url(&self) -> String {
        let scheme = if self.secure { "rtmps" } else { "rtmp" };
        match self.port {
            Some(port) => format!("{}://{}:{}/{}", scheme, self.host, port, self.app),
            None => format!("{}://{}/{}", scheme, self.host, self.app),
        }
    }
}
