use crate::sampler::MAX_SAMPLE_INTERVAL;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Longest accepted scan timeout (one day)
pub const MAX_SCAN_TIMEOUT_SECONDS: u64 = 86_400;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct KioskConfig {
    pub camera: CameraConfig,
    pub scanner: ScannerConfig,
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub system: SystemConfig,
}

/// Where frames come from
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Live camera device (`/dev/videoN`)
    Device,
    /// Directory of still images replayed as frames
    Images,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// Frame source
    #[serde(default = "default_camera_source")]
    pub source: SourceKind,

    /// Camera device index (e.g., 0 for /dev/video0)
    #[serde(default = "default_camera_index")]
    pub index: u32,

    /// Requested resolution (width, height)
    #[serde(default = "default_camera_resolution")]
    pub resolution: (u32, u32),

    /// Frames per second requested from the device
    #[serde(default = "default_camera_fps")]
    pub fps: u32,

    /// Directory of images for the `images` source
    #[serde(default)]
    pub image_dir: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScannerConfig {
    /// Period between sampling ticks
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,

    /// Give up scanning after this many seconds; unset scans until stopped
    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    /// Start a new scan after each check-in
    #[serde(default = "default_continuous")]
    pub continuous: bool,
}

impl ScannerConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Serve the check-in endpoint from this process
    #[serde(default = "default_server_enabled")]
    pub enabled: bool,

    /// IP address to bind to
    #[serde(default = "default_server_ip")]
    pub ip: String,

    /// Port to listen on
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Bearer token scanner devices must present
    #[serde(default = "default_device_token")]
    pub device_token: String,

    /// JSON file with the invite list; built-in sample invites when unset
    #[serde(default)]
    pub invites_path: Option<String>,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClientConfig {
    /// Base URL of the check-in API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Bearer token sent with each check-in
    #[serde(default = "default_device_token")]
    pub token: String,

    /// Request timeout in seconds
    #[serde(default = "default_client_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SystemConfig {
    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

impl KioskConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("camera.source", "device")?
            .set_default("camera.index", default_camera_index())?
            .set_default(
                "camera.resolution",
                vec![default_camera_resolution().0, default_camera_resolution().1],
            )?
            .set_default("camera.fps", default_camera_fps())?
            .set_default("scanner.sample_interval_ms", default_sample_interval_ms())?
            .set_default("scanner.continuous", default_continuous())?
            .set_default("server.enabled", default_server_enabled())?
            .set_default("server.ip", default_server_ip())?
            .set_default("server.port", default_server_port())?
            .set_default("server.device_token", default_device_token())?
            .set_default("client.api_base_url", default_api_base_url())?
            .set_default("client.token", default_device_token())?
            .set_default("client.timeout_seconds", default_client_timeout())?
            .set_default(
                "system.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            .add_source(File::with_name(&path_str).required(false))
            // KIOSK_SCANNER__SAMPLE_INTERVAL_MS style overrides
            .add_source(
                Environment::with_prefix("KIOSK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: KioskConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.resolution.0 == 0 || self.camera.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera resolution must be greater than 0".to_string(),
            ));
        }

        if self.camera.fps == 0 {
            return Err(ConfigError::Message(
                "Camera fps must be greater than 0".to_string(),
            ));
        }

        if self.camera.source == SourceKind::Images && self.camera.image_dir.is_none() {
            return Err(ConfigError::Message(
                "camera.image_dir is required for the images source".to_string(),
            ));
        }

        if self.scanner.sample_interval_ms == 0 {
            return Err(ConfigError::Message(
                "Scanner sample_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.scanner.sample_interval() > MAX_SAMPLE_INTERVAL {
            return Err(ConfigError::Message(format!(
                "Scanner sample_interval_ms must be at most {}",
                MAX_SAMPLE_INTERVAL.as_millis()
            )));
        }

        match self.scanner.timeout_seconds {
            Some(0) => {
                return Err(ConfigError::Message(
                    "Scanner timeout_seconds must be greater than 0 when set".to_string(),
                ));
            }
            Some(seconds) if seconds > MAX_SCAN_TIMEOUT_SECONDS => {
                return Err(ConfigError::Message(format!(
                    "Scanner timeout_seconds must be at most {}",
                    MAX_SCAN_TIMEOUT_SECONDS
                )));
            }
            _ => {}
        }

        if self.server.enabled {
            if self.server.device_token.is_empty() {
                return Err(ConfigError::Message(
                    "Server device_token must not be empty".to_string(),
                ));
            }

            self.server
                .bind_address()
                .parse::<SocketAddr>()
                .map_err(|e| {
                    ConfigError::Message(format!(
                        "Invalid server address {}: {}",
                        self.server.bind_address(),
                        e
                    ))
                })?;
        }

        if self.client.api_base_url.is_empty() {
            return Err(ConfigError::Message(
                "Client api_base_url must not be empty".to_string(),
            ));
        }

        if self.system.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                source: default_camera_source(),
                index: default_camera_index(),
                resolution: default_camera_resolution(),
                fps: default_camera_fps(),
                image_dir: None,
            },
            scanner: ScannerConfig {
                sample_interval_ms: default_sample_interval_ms(),
                timeout_seconds: None,
                continuous: default_continuous(),
            },
            server: ServerConfig::default(),
            client: ClientConfig::default(),
            system: SystemConfig {
                event_bus_capacity: default_event_bus_capacity(),
            },
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: default_server_enabled(),
            ip: default_server_ip(),
            port: default_server_port(),
            device_token: default_device_token(),
            invites_path: None,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            token: default_device_token(),
            timeout_seconds: default_client_timeout(),
        }
    }
}

// Default value functions
fn default_camera_source() -> SourceKind {
    SourceKind::Device
}
fn default_camera_index() -> u32 {
    0
}
fn default_camera_resolution() -> (u32, u32) {
    (1280, 720)
}
fn default_camera_fps() -> u32 {
    30
}

fn default_sample_interval_ms() -> u64 {
    300
}
fn default_continuous() -> bool {
    true
}

fn default_server_enabled() -> bool {
    true
}
fn default_server_ip() -> String {
    "0.0.0.0".to_string()
}
fn default_server_port() -> u16 {
    8080
}
fn default_device_token() -> String {
    "SCANNER_DEVICE_SECRET".to_string()
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}
fn default_client_timeout() -> u64 {
    10
}

fn default_event_bus_capacity() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = KioskConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.scanner.sample_interval(), Duration::from_millis(300));
        assert!(config.scanner.timeout().is_none());
        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_config_validation() {
        let mut config = KioskConfig::default();
        config.camera.resolution = (0, 0);
        assert!(config.validate().is_err());

        config.camera.resolution = (640, 480);
        assert!(config.validate().is_ok());

        config.scanner.sample_interval_ms = 0;
        assert!(config.validate().is_err());
        config.scanner.sample_interval_ms = 300;

        config.scanner.timeout_seconds = Some(0);
        assert!(config.validate().is_err());
        config.scanner.timeout_seconds = Some(30);
        assert!(config.validate().is_ok());

        config.scanner.sample_interval_ms = u64::MAX;
        assert!(config.validate().is_err());
        config.scanner.sample_interval_ms = 60_000;
        assert!(config.validate().is_ok());
        config.scanner.sample_interval_ms = 300;

        config.scanner.timeout_seconds = Some(u64::MAX);
        assert!(config.validate().is_err());
        config.scanner.timeout_seconds = Some(MAX_SCAN_TIMEOUT_SECONDS);
        assert!(config.validate().is_ok());
        config.scanner.timeout_seconds = Some(30);

        config.camera.source = SourceKind::Images;
        assert!(config.validate().is_err());
        config.camera.image_dir = Some("./frames".to_string());
        assert!(config.validate().is_ok());

        config.server.ip = "not an ip".to_string();
        assert!(config.validate().is_err());
        config.server.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[camera]
source = "images"
image_dir = "/tmp/frames"

[scanner]
sample_interval_ms = 150
timeout_seconds = 45

[server]
port = 9090
"#
        )
        .unwrap();

        let config = KioskConfig::load_from_file(file.path()).unwrap();

        assert_eq!(config.camera.source, SourceKind::Images);
        assert_eq!(config.camera.image_dir.as_deref(), Some("/tmp/frames"));
        assert_eq!(config.camera.resolution, (1280, 720));
        assert_eq!(config.scanner.sample_interval_ms, 150);
        assert_eq!(config.scanner.timeout(), Some(Duration::from_secs(45)));
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.device_token, "SCANNER_DEVICE_SECRET");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = KioskConfig::load_from_file("/nonexistent/kiosk.toml").unwrap();

        assert_eq!(config.camera.source, SourceKind::Device);
        assert_eq!(config.scanner.sample_interval_ms, 300);
        assert!(config.scanner.continuous);
    }

    #[test]
    fn test_env_overrides_defaults() {
        // No other test reads client.timeout_seconds
        std::env::set_var("KIOSK_CLIENT__TIMEOUT_SECONDS", "42");
        let config = KioskConfig::load_from_file("/nonexistent/kiosk.toml");
        std::env::remove_var("KIOSK_CLIENT__TIMEOUT_SECONDS");

        let config = config.unwrap();
        assert_eq!(config.client.timeout_seconds, 42);
    }
}
