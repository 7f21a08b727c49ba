//! Fingerprint configuration generation
//!
//! Produces the starter template, fully random configurations, and
//! template-based configurations with user overrides.

use rand::rngs::ThreadRng;
use rand::Rng;
use serde_json::{Map, Value, json};
use uuid::Builder;

use crate::category::Category;
use crate::config::{CategorySetting, FingerprintConfig};
use crate::{Error, Result};

const LANGUAGES: &[&str] = &[
    "en-US", "en-GB", "zh-CN", "zh-TW", "ja", "ko", "de", "fr", "es", "it", "pt-BR", "ru", "nl",
    "pl", "tr", "ar", "th", "vi", "id", "cs",
];

const TIMEZONES: &[&str] = &[
    "America/New_York",
    "America/Los_Angeles",
    "America/Chicago",
    "America/Denver",
    "Europe/London",
    "Europe/Paris",
    "Europe/Berlin",
    "Europe/Moscow",
    "Asia/Tokyo",
    "Asia/Shanghai",
    "Asia/Singapore",
    "Asia/Dubai",
    "Australia/Sydney",
    "Pacific/Auckland",
];

const SCREEN_RESOLUTIONS: &[(u32, u32)] = &[
    (1366, 768),
    (1920, 1080),
    (1536, 864),
    (1440, 900),
    (1600, 900),
    (1280, 720),
    (1600, 1200),
    (2560, 1440),
    (3840, 2160),
    (1280, 1024),
    (1680, 1050),
    (2560, 1600),
    (1920, 1200),
    (1360, 768),
    (1024, 768),
];

const SCALE_FACTORS: &[f64] = &[1.0, 1.25, 1.5, 1.75, 2.0, 2.25, 2.5, 3.0];
const COLOR_DEPTHS: &[u32] = &[24, 30, 32];
const TOUCH_POINTS: &[u32] = &[0, 5, 10];
const HARDWARE_CONCURRENCY: &[u32] = &[2, 4, 6, 8, 12, 16, 20, 24];
const DEVICE_MEMORY_GB: &[u32] = &[4, 8, 16, 32];
const STORAGE_QUOTA_GB: &[u32] = &[500, 1000, 2000, 4000];
const PROXY_PORTS: &[u16] = &[8080, 3128, 1080, 8888, 9999];
const DO_NOT_TRACK: &[&str] = &["1", "0", "unspecified"];
const PROTECTED_FONTS: &[&str] = &["Arial", "Times New Roman", "Courier New"];

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:126.0) Gecko/20100101 Firefox/126.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:126.0) Gecko/20100101 Firefox/126.0",
];

/// Accuracy (metres) recorded for user-supplied coordinates.
const OVERRIDE_ACCURACY: f64 = 100.0;

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// `["en-US", "en"]` for a regional tag, `["ja"]` otherwise.
fn language_list(language: &str) -> Vec<String> {
    let mut languages = vec![language.to_string()];
    if let Some((base, _)) = language.split_once('-')
        && !languages.iter().any(|l| l == base)
    {
        languages.push(base.to_string());
    }
    languages
}

fn params(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn setting(mode: &str, value: Value) -> CategorySetting {
    CategorySetting {
        enabled: true,
        mode: mode.to_string(),
        params: params(value),
    }
}

/// Draws random configurations from the value pools.
pub struct FingerprintGenerator<R: Rng> {
    rng: R,
}

impl FingerprintGenerator<ThreadRng> {
    pub fn new() -> Self {
        Self::with_rng(rand::thread_rng())
    }
}

impl Default for FingerprintGenerator<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> FingerprintGenerator<R> {
    /// Use a caller-supplied RNG, e.g. a seeded one for reproducible output.
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    fn pick<T: Copy>(&mut self, pool: &[T]) -> T {
        pool[self.rng.gen_range(0..pool.len())]
    }

    fn uuid(&mut self) -> String {
        Builder::from_random_bytes(self.rng.r#gen::<[u8; 16]>())
            .into_uuid()
            .to_string()
    }

    fn level(&mut self, low: f64, high: f64) -> f64 {
        round_to(self.rng.gen_range(low..high), 2)
    }

    fn ipv4(&mut self, first: std::ops::RangeInclusive<u8>) -> String {
        format!(
            "{}.{}.{}.{}",
            self.rng.gen_range(first),
            self.rng.gen_range(1..=254u8),
            self.rng.gen_range(1..=254u8),
            self.rng.gen_range(1..=254u8)
        )
    }

    /// A configuration touching every category with a random value.
    pub fn random_config(&mut self) -> FingerprintConfig {
        let language = self.pick(LANGUAGES);
        let timezone = self.pick(TIMEZONES);
        let (width, height) = self.pick(SCREEN_RESOLUTIONS);
        let scale_factor = self.pick(SCALE_FACTORS);
        // Taskbars and docks take roughly 2% of the width and 5% of the height
        let available_width = (f64::from(width) * 0.98) as u32;
        let available_height = (f64::from(height) * 0.95) as u32;
        let geolocation = json!({
            "latitude": round_to(self.rng.gen_range(-85.0..85.0), 6),
            "longitude": round_to(self.rng.gen_range(-180.0..180.0), 6),
            "accuracy": round_to(self.rng.gen_range(50.0..1000.0), 2),
        });

        let mut config = FingerprintConfig::new();
        config.id = self.uuid();
        config.fingerprint_mode = Some("random".to_string());

        let settings = [
            (Category::Language, setting("custom", json!({"language": language, "languages": language_list(language)}))),
            (Category::UiLanguage, setting("custom", json!({"language": language}))),
            (Category::Timezone, setting("custom", json!({"timezone": timezone}))),
            (Category::Geolocation, setting("custom", geolocation)),
            (Category::ScreenResolution, setting("custom", json!({"width": width, "height": height}))),
            (Category::DisplayZoom, setting("custom", json!({"scale_factor": scale_factor}))),
            (
                Category::ScreenSize,
                setting("custom", json!({"available_width": available_width, "available_height": available_height})),
            ),
            (Category::ColorDepth, setting("custom", json!({"depth": self.pick(COLOR_DEPTHS)}))),
            (Category::TouchPoints, setting("custom", json!({"max_touch_points": self.pick(TOUCH_POINTS)}))),
            (
                Category::Canvas,
                setting("noise", json!({"noise_seed": self.uuid(), "noise_level": self.level(0.1, 0.5)})),
            ),
            (Category::CanvasFont, setting("custom", json!({"protected_fonts": PROTECTED_FONTS}))),
            (Category::CssFont, setting("noise", json!({"noise_level": self.level(0.1, 0.4)}))),
            (Category::Webrtc, setting("auto_replace", json!({}))),
            (
                Category::Webgl,
                setting("noise", json!({"noise_seed": self.uuid(), "noise_level": self.level(0.1, 0.3)})),
            ),
            (Category::Webgpu, setting("default", json!({}))),
            (Category::AudioContext, setting("noise", json!({"noise_level": self.level(0.05, 0.2)}))),
            (Category::ClientRects, setting("noise", json!({"noise_level": self.level(0.01, 0.1)}))),
            (Category::SslTls, setting("noise", json!({}))),
            (Category::HardwareConcurrency, setting("custom", json!({"cores": self.pick(HARDWARE_CONCURRENCY)}))),
            (Category::StorageQuota, setting("custom", json!({"quota_gb": self.pick(STORAGE_QUOTA_GB)}))),
            (Category::DeviceMemory, setting("custom", json!({"memory_gb": self.pick(DEVICE_MEMORY_GB)}))),
            (
                Category::Battery,
                setting("noise", json!({"charging": self.rng.gen_bool(0.5), "level": self.level(0.1, 1.0)})),
            ),
            (Category::PortScanProtection, setting("enable", json!({}))),
            (Category::ConsoleOutput, setting("disable", json!({}))),
            (Category::DoNotTrack, setting("enable", json!({"value": self.pick(DO_NOT_TRACK)}))),
            (Category::UserAgent, setting("custom", json!({"user_agent": self.pick(USER_AGENTS)}))),
            (Category::Plugins, setting("noise", json!({"noise_level": self.level(0.1, 0.3)}))),
            (Category::MimeTypes, setting("noise", json!({"noise_level": self.level(0.05, 0.2)}))),
            (Category::NavigatorProperties, setting("default", json!({}))),
            (Category::DevicePixelRatio, setting("default", json!({}))),
            (Category::WebdriverDetection, setting("disable", json!({}))),
            (Category::TlsClientHello, setting("noise", json!({}))),
            (Category::CdpProtection, setting("enable", json!({}))),
            (Category::IpAddress, setting("custom", json!({"ip": self.ipv4(192..=223)}))),
            (Category::MediaDevices, setting("noise", json!({"noise_level": self.level(0.05, 0.2)}))),
            (Category::SpeechVoices, setting("noise", json!({"noise_level": self.level(0.05, 0.2)}))),
            (Category::LocalStorage, setting("isolate", json!({}))),
            (
                Category::Proxy,
                setting("fake_ip", json!({"proxy_ip": self.ipv4(127..=192), "proxy_port": self.pick(PROXY_PORTS)})),
            ),
            (Category::Dns, setting("noise", json!({}))),
            (Category::IndexedDb, setting("isolate", json!({}))),
        ];
        config.settings.extend(settings);
        config
    }
}

/// Every category enabled in `default` mode, with sample params for
/// `language`, `screen_resolution` and `geolocation`.
pub fn template_config() -> FingerprintConfig {
    let mut config = FingerprintConfig::new();
    config.fingerprint_mode = Some("fixed".to_string());
    for category in Category::ALL {
        config.settings.insert(category, CategorySetting::default());
    }
    let samples = [
        (Category::Language, json!({"language": "en-US", "languages": ["en-US", "en"]})),
        (Category::ScreenResolution, json!({"width": 1920, "height": 1080})),
        (
            Category::Geolocation,
            json!({"latitude": 37.7749, "longitude": -122.4194, "accuracy": OVERRIDE_ACCURACY}),
        ),
    ];
    for (category, value) in samples {
        config.settings.entry(category).or_default().params = params(value);
    }
    config
}

/// User-supplied values that take precedence over generated ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub language: Option<String>,
    pub timezone: Option<String>,
    /// `(width, height)`
    pub resolution: Option<(u32, u32)>,
    /// `(latitude, longitude)`
    pub location: Option<(f64, f64)>,
}

impl Overrides {
    pub fn is_empty(&self) -> bool {
        self.categories().is_empty()
    }

    fn categories(&self) -> Vec<(Category, Map<String, Value>)> {
        let mut out = Vec::new();
        if let Some(language) = &self.language {
            out.push((
                Category::Language,
                params(json!({"language": language, "languages": language_list(language)})),
            ));
        }
        if let Some(timezone) = &self.timezone {
            out.push((Category::Timezone, params(json!({"timezone": timezone}))));
        }
        if let Some((width, height)) = self.resolution {
            out.push((
                Category::ScreenResolution,
                params(json!({"width": width, "height": height})),
            ));
        }
        if let Some((latitude, longitude)) = self.location {
            out.push((
                Category::Geolocation,
                params(json!({"latitude": latitude, "longitude": longitude, "accuracy": OVERRIDE_ACCURACY})),
            ));
        }
        out
    }
}

/// Derive a new configuration from a template.
///
/// The result gets a fresh id and creation time. Every category an override
/// touches is switched to enabled `custom` mode and its params are updated
/// key by key.
pub fn merge_with_template(template: &FingerprintConfig, overrides: &Overrides) -> FingerprintConfig {
    let mut config = template.clone();
    let fresh = FingerprintConfig::new();
    config.id = fresh.id;
    config.created_at = fresh.created_at;

    for (category, values) in overrides.categories() {
        let setting = config.settings.entry(category).or_default();
        setting.enabled = true;
        setting.mode = "custom".to_string();
        setting.params.extend(values);
    }
    config
}

/// Overwrite params of already-configured categories, keeping their mode.
pub fn apply_params(config: &mut FingerprintConfig, overrides: &Overrides) {
    for (category, values) in overrides.categories() {
        match config.settings.get_mut(&category) {
            Some(setting) => setting.params.extend(values),
            None => tracing::debug!(%category, "Override for unconfigured category ignored"),
        }
    }
}

/// Parse a `WIDTHxHEIGHT` resolution such as `1920x1080`.
pub fn parse_resolution(value: &str) -> Result<(u32, u32)> {
    let invalid = || Error::InvalidConfig {
        message: format!("invalid resolution '{value}', expected WIDTHxHEIGHT such as 1920x1080"),
    };
    let (width, height) = value.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
    let width: u32 = width.trim().parse().map_err(|_| invalid())?;
    let height: u32 = height.trim().parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok((width, height))
}
