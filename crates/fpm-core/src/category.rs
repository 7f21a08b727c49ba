//! Fingerprint categories and the category → target-file mapping table

use std::collections::HashMap;
use std::str::FromStr;

use fpm_fs::validate_relative_path;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A fingerprinting domain whose patches share a set of target files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Language,
    UiLanguage,
    Timezone,
    Geolocation,
    ScreenResolution,
    DisplayZoom,
    ScreenSize,
    ColorDepth,
    TouchPoints,
    Canvas,
    CanvasFont,
    CssFont,
    Webrtc,
    Webgl,
    Webgpu,
    AudioContext,
    ClientRects,
    SslTls,
    HardwareConcurrency,
    StorageQuota,
    DeviceMemory,
    Battery,
    PortScanProtection,
    ConsoleOutput,
    DoNotTrack,
    UserAgent,
    Plugins,
    MimeTypes,
    NavigatorProperties,
    DevicePixelRatio,
    WebdriverDetection,
    TlsClientHello,
    CdpProtection,
    IpAddress,
    MediaDevices,
    SpeechVoices,
    LocalStorage,
    Proxy,
    Dns,
    IndexedDb,
}

impl Category {
    /// Every category, in catalogue order. Sessions apply categories in
    /// this order.
    pub const ALL: [Category; 40] = [
        Category::Language,
        Category::UiLanguage,
        Category::Timezone,
        Category::Geolocation,
        Category::ScreenResolution,
        Category::DisplayZoom,
        Category::ScreenSize,
        Category::ColorDepth,
        Category::TouchPoints,
        Category::Canvas,
        Category::CanvasFont,
        Category::CssFont,
        Category::Webrtc,
        Category::Webgl,
        Category::Webgpu,
        Category::AudioContext,
        Category::ClientRects,
        Category::SslTls,
        Category::HardwareConcurrency,
        Category::StorageQuota,
        Category::DeviceMemory,
        Category::Battery,
        Category::PortScanProtection,
        Category::ConsoleOutput,
        Category::DoNotTrack,
        Category::UserAgent,
        Category::Plugins,
        Category::MimeTypes,
        Category::NavigatorProperties,
        Category::DevicePixelRatio,
        Category::WebdriverDetection,
        Category::TlsClientHello,
        Category::CdpProtection,
        Category::IpAddress,
        Category::MediaDevices,
        Category::SpeechVoices,
        Category::LocalStorage,
        Category::Proxy,
        Category::Dns,
        Category::IndexedDb,
    ];

    /// Name used in configuration documents and as the catalogue directory.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Language => "language",
            Self::UiLanguage => "ui_language",
            Self::Timezone => "timezone",
            Self::Geolocation => "geolocation",
            Self::ScreenResolution => "screen_resolution",
            Self::DisplayZoom => "display_zoom",
            Self::ScreenSize => "screen_size",
            Self::ColorDepth => "color_depth",
            Self::TouchPoints => "touch_points",
            Self::Canvas => "canvas",
            Self::CanvasFont => "canvas_font",
            Self::CssFont => "css_font",
            Self::Webrtc => "webrtc",
            Self::Webgl => "webgl",
            Self::Webgpu => "webgpu",
            Self::AudioContext => "audio_context",
            Self::ClientRects => "client_rects",
            Self::SslTls => "ssl_tls",
            Self::HardwareConcurrency => "hardware_concurrency",
            Self::StorageQuota => "storage_quota",
            Self::DeviceMemory => "device_memory",
            Self::Battery => "battery",
            Self::PortScanProtection => "port_scan_protection",
            Self::ConsoleOutput => "console_output",
            Self::DoNotTrack => "do_not_track",
            Self::UserAgent => "user_agent",
            Self::Plugins => "plugins",
            Self::MimeTypes => "mime_types",
            Self::NavigatorProperties => "navigator_properties",
            Self::DevicePixelRatio => "device_pixel_ratio",
            Self::WebdriverDetection => "webdriver_detection",
            Self::TlsClientHello => "tls_client_hello",
            Self::CdpProtection => "cdp_protection",
            Self::IpAddress => "ip_address",
            Self::MediaDevices => "media_devices",
            Self::SpeechVoices => "speech_voices",
            Self::LocalStorage => "local_storage",
            Self::Proxy => "proxy",
            Self::Dns => "dns",
            Self::IndexedDb => "indexed_db",
        }
    }

    /// Default Chromium source files touched by this category.
    fn default_targets(&self) -> &'static [&'static str] {
        match self {
            Self::Language => &[
                "third_party/blink/renderer/core/frame/navigator_language.cc",
                "ui/base/l10n/l10n_util.cc",
                "net/http/http_request_headers.cc",
                "chrome/app/chrome_main_delegate.cc",
                "chrome/browser/chrome_content_browser_client.cc",
            ],
            Self::UiLanguage => &[
                "content/public/common/content_constants.cc",
                "ui/base/l10n/l10n_util.cc",
                "chrome/browser/browser_process_impl.cc",
                "ui/base/resource/resource_bundle.cc",
            ],
            Self::Timezone => &[
                "content/browser/renderer_host/render_process_host_impl.cc",
                "services/device/time_zone_monitor/time_zone_monitor.cc",
                "third_party/blink/renderer/core/timing/performance.cc",
                "base/time/time.cc",
            ],
            Self::Geolocation => &[
                "content/browser/geolocation/geolocation_service_impl.cc",
                "third_party/blink/renderer/modules/geolocation/geolocation.cc",
                "services/device/geolocation/geolocation_provider_impl.cc",
                "services/device/geolocation/location_arbitrator.cc",
                "services/device/geolocation/public_ip_address_geolocator.cc",
            ],
            Self::ScreenResolution => &[
                "third_party/blink/renderer/core/frame/screen.cc",
                "ui/display/screen.cc",
                "ui/display/display.cc",
                "ui/display/display_list.cc",
            ],
            Self::DisplayZoom => &[
                "third_party/blink/renderer/core/frame/screen.cc",
                "ui/display/screen.cc",
                "ui/display/display.cc",
            ],
            Self::ScreenSize
            | Self::ColorDepth
            | Self::TouchPoints
            | Self::DevicePixelRatio => &[
                "third_party/blink/renderer/core/frame/screen.cc",
                "ui/display/screen.cc",
            ],
            Self::Canvas => &[
                "third_party/blink/renderer/modules/canvas/canvas2d/canvas_rendering_context_2d.cc",
                "third_party/blink/renderer/platform/graphics/canvas_2d_layer_bridge.cc",
                "third_party/blink/renderer/modules/canvas/canvas2d/base_rendering_context_2d.cc",
                "third_party/blink/renderer/platform/graphics/image_data_buffer.h",
            ],
            Self::CanvasFont => &[
                "third_party/blink/renderer/modules/canvas/canvas2d/canvas_rendering_context_2d.cc",
                "third_party/blink/renderer/platform/fonts/font_selector.cc",
                "third_party/blink/renderer/platform/fonts/font_cache.cc",
            ],
            Self::CssFont => &[
                "third_party/blink/renderer/core/css/css_font_selector.cc",
                "third_party/blink/renderer/core/css/font_face_set.cc",
                "third_party/blink/renderer/platform/fonts/font_cache.cc",
            ],
            Self::Webrtc => &[
                "third_party/blink/renderer/modules/peerconnection/rtc_peer_connection.cc",
                "net/base/network_interfaces.h",
                "services/network/p2p/socket_manager.cc",
                "third_party/blink/renderer/modules/peerconnection/rtc_ice_candidate.cc",
            ],
            Self::Webgl => &[
                "third_party/blink/renderer/modules/webgl/webgl_rendering_context_base.cc",
                "gpu/command_buffer/client/gles2_implementation.cc",
                "third_party/blink/renderer/modules/webgl/webgl2_rendering_context.cc",
                "third_party/blink/renderer/core/html/canvas/html_canvas_element.cc",
            ],
            Self::Webgpu => &[
                "third_party/blink/renderer/modules/webgpu/gpu.cc",
                "third_party/blink/renderer/modules/webgpu/gpu_adapter.cc",
                "third_party/blink/renderer/modules/webgpu/gpu_device.cc",
            ],
            Self::AudioContext => &[
                "third_party/blink/renderer/modules/webaudio/audio_context.cc",
                "third_party/blink/renderer/modules/webaudio/base_audio_context.cc",
                "third_party/blink/renderer/modules/webaudio/offline_audio_context.cc",
            ],
            Self::ClientRects => &[
                "third_party/blink/renderer/core/dom/element.cc",
                "third_party/blink/renderer/core/layout/layout_object.cc",
                "third_party/blink/renderer/core/layout/layout_box.cc",
            ],
            Self::SslTls => &[
                "net/ssl/ssl_client_socket_impl.cc",
                "net/ssl/ssl_config.cc",
                "net/socket/ssl_client_socket.cc",
            ],
            Self::HardwareConcurrency => &[
                "third_party/blink/renderer/core/workers/navigator_concurrent_hardware.cc",
                "third_party/blink/renderer/core/frame/navigator.cc",
            ],
            Self::StorageQuota => &[
                "third_party/blink/renderer/modules/quota/storage_manager.cc",
                "content/browser/quota/quota_manager_impl.cc",
            ],
            Self::DeviceMemory => &[
                "third_party/blink/renderer/core/frame/navigator_device_memory.cc",
                "third_party/blink/renderer/core/frame/navigator.cc",
            ],
            Self::Battery => &[
                "third_party/blink/renderer/modules/battery/battery_manager.cc",
                "services/device/battery/battery_status_manager.cc",
            ],
            Self::PortScanProtection => &[
                "net/socket/tcp_client_socket.cc",
                "net/socket/udp_client_socket.cc",
                "content/browser/renderer_host/render_process_host_impl.cc",
            ],
            Self::ConsoleOutput => &[
                "third_party/blink/renderer/core/inspector/console_message.cc",
                "content/browser/devtools/devtools_agent_host_impl.cc",
            ],
            Self::DoNotTrack => &[
                "third_party/blink/renderer/core/frame/navigator.cc",
                "net/http/http_request_headers.cc",
            ],
            Self::UserAgent => &[
                "content/common/user_agent.cc",
                "third_party/blink/renderer/core/frame/navigator.cc",
                "net/http/http_util.cc",
            ],
            Self::Plugins => &[
                "third_party/blink/renderer/core/frame/navigator_plugins.cc",
                "content/browser/plugin_service_impl.cc",
            ],
            Self::MimeTypes => &[
                "third_party/blink/renderer/core/frame/navigator_plugins.cc",
                "net/base/mime_util.cc",
            ],
            Self::NavigatorProperties => &[
                "third_party/blink/renderer/core/frame/navigator.cc",
                "third_party/blink/renderer/core/frame/navigator_id.cc",
            ],
            Self::WebdriverDetection => &[
                "third_party/blink/renderer/core/frame/navigator.cc",
                "content/browser/renderer_host/render_process_host_impl.cc",
            ],
            Self::TlsClientHello => &[
                "net/ssl/ssl_client_socket_impl.cc",
                "net/socket/ssl_client_socket.cc",
            ],
            Self::CdpProtection => &[
                "content/browser/devtools/devtools_agent_host_impl.cc",
                "content/browser/devtools/devtools_http_handler.cc",
            ],
            Self::IpAddress => &[
                "net/base/network_interfaces.cc",
                "services/network/network_service.cc",
            ],
            Self::MediaDevices => &[
                "third_party/blink/renderer/modules/mediastream/media_devices.cc",
                "content/browser/media/media_devices_dispatcher_host.cc",
            ],
            Self::SpeechVoices => &[
                "third_party/blink/renderer/modules/speech/speech_synthesis.cc",
                "content/browser/speech/speech_synthesis_impl.cc",
            ],
            Self::LocalStorage => &[
                "third_party/blink/renderer/modules/storage/storage_area.cc",
                "content/browser/dom_storage/dom_storage_context_wrapper.cc",
            ],
            Self::Proxy => &[
                "net/proxy_resolution/proxy_config.cc",
                "net/proxy_resolution/proxy_resolver.cc",
            ],
            Self::Dns => &["net/dns/host_resolver_impl.cc", "net/dns/dns_client.cc"],
            Self::IndexedDb => &[
                "third_party/blink/renderer/modules/indexeddb/idb_factory.cc",
                "content/browser/indexed_db/indexed_db_context_impl.cc",
            ],
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::UnknownCategory {
                name: s.to_string(),
            })
    }
}

/// Immutable category → target-file table.
///
/// Built once at startup (defaults plus any overrides from `fpm.toml`) and
/// shared read-only by the artifact store and the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTable {
    targets: HashMap<Category, Vec<String>>,
}

impl MappingTable {
    /// The default Chromium mapping.
    pub fn chromium() -> Self {
        let targets = Category::ALL
            .iter()
            .map(|c| {
                let files = c.default_targets().iter().map(|f| f.to_string()).collect();
                (*c, files)
            })
            .collect();
        Self { targets }
    }

    /// A table with no targets at all. Mostly useful as a starting point for
    /// [`MappingTable::with_targets`].
    pub fn empty() -> Self {
        Self {
            targets: HashMap::new(),
        }
    }

    /// Replace the target list of one category.
    ///
    /// Every path must be relative to the source root and must not escape it.
    pub fn with_targets<I, S>(mut self, category: Category, files: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut validated = Vec::new();
        for file in files {
            let path = validate_relative_path(file.as_ref())?;
            validated.push(path.as_str().to_string());
        }
        self.targets.insert(category, validated);
        Ok(self)
    }

    /// Target files for a category, in declaration order.
    pub fn targets(&self, category: Category) -> &[String] {
        self.targets
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total number of (category, file) pairs.
    pub fn len(&self) -> usize {
        self.targets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MappingTable {
    fn default() -> Self {
        Self::chromium()
    }
}
