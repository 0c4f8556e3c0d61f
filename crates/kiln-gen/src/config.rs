//! Layered configuration system
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `KILN_BACKEND_URL`, `KILN_PROVIDER`, `KILN_OUTPUT_DIR`
//! 2. Project-local: `.kiln/config.toml`
//! 3. Global: `~/.kiln/config.toml`

use kiln_core::{KilnError, Result};
use kiln_media::ExtractOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// `[backend]` section as written in a config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendSection {
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub retries: Option<u32>,
    pub provider: Option<String>,
}

/// `[fallback]` section as written in a config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FallbackSection {
    pub text_to_model_delay_ms: Option<u64>,
    pub image_to_model_delay_ms: Option<u64>,
    pub texture_size: Option<u32>,
    pub speckles: Option<u32>,
}

/// `[media]` section as written in a config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaSection {
    pub extraction_timeout_ms: Option<u64>,
    pub jpeg_quality: Option<u8>,
    pub ffmpeg_path: Option<String>,
    pub ffprobe_path: Option<String>,
}

/// `[output]` section as written in a config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSection {
    pub dir: Option<PathBuf>,
}

/// Top-level config file structure. Every key is optional so a layer only
/// overrides what it mentions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KilnConfigFile {
    #[serde(default)]
    pub backend: BackendSection,
    #[serde(default)]
    pub fallback: FallbackSection,
    #[serde(default)]
    pub media: MediaSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    pub url: String,
    pub timeout_secs: u64,
    pub retries: u32,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FallbackConfig {
    pub text_to_model_delay_ms: u64,
    pub image_to_model_delay_ms: u64,
    pub texture_size: u32,
    pub speckles: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaConfig {
    pub extraction_timeout_ms: u64,
    pub jpeg_quality: u8,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
}

/// Resolved configuration with every layer applied
#[derive(Debug, Clone, PartialEq)]
pub struct KilnConfig {
    pub backend: BackendConfig,
    pub fallback: FallbackConfig,
    pub media: MediaConfig,
    pub output_dir: PathBuf,
}

impl Default for KilnConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                url: DEFAULT_BACKEND_URL.to_string(),
                timeout_secs: 120,
                retries: 0,
                provider: "http".to_string(),
            },
            fallback: FallbackConfig {
                text_to_model_delay_ms: 2000,
                image_to_model_delay_ms: 3000,
                texture_size: 512,
                speckles: 5000,
            },
            media: MediaConfig {
                extraction_timeout_ms: kiln_media::extract::DEFAULT_TIMEOUT_MS,
                jpeg_quality: kiln_media::extract::DEFAULT_JPEG_QUALITY,
                ffmpeg_path: "ffmpeg".to_string(),
                ffprobe_path: "ffprobe".to_string(),
            },
            output_dir: PathBuf::from(".kiln/generated"),
        }
    }
}

impl KilnConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut layers = Vec::new();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                layers.push(Self::load_file(&global_path)?);
            }
        }

        let local_path = PathBuf::from(".kiln/config.toml");
        if local_path.exists() {
            layers.push(Self::load_file(&local_path)?);
        }

        Ok(Self::resolve(layers, |key| std::env::var(key).ok()))
    }

    /// Load config from a specific file path only, plus env overrides
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let file = Self::load_file(path)?;
        Ok(Self::resolve(vec![file], |key| std::env::var(key).ok()))
    }

    /// Apply file layers in order over the defaults, then the environment
    pub fn resolve(layers: Vec<KilnConfigFile>, env: impl Fn(&str) -> Option<String>) -> Self {
        let mut merged = KilnConfigFile::default();
        for layer in layers {
            Self::merge_into(&mut merged, layer);
        }
        Self::apply_env_overrides(&mut merged, env);

        let mut config = KilnConfig::default();
        let b = merged.backend;
        if let Some(url) = b.url {
            config.backend.url = url;
        }
        if let Some(timeout) = b.timeout_secs {
            config.backend.timeout_secs = timeout;
        }
        if let Some(retries) = b.retries {
            config.backend.retries = retries;
        }
        if let Some(provider) = b.provider {
            config.backend.provider = provider;
        }

        let f = merged.fallback;
        if let Some(ms) = f.text_to_model_delay_ms {
            config.fallback.text_to_model_delay_ms = ms;
        }
        if let Some(ms) = f.image_to_model_delay_ms {
            config.fallback.image_to_model_delay_ms = ms;
        }
        if let Some(size) = f.texture_size {
            config.fallback.texture_size = size;
        }
        if let Some(count) = f.speckles {
            config.fallback.speckles = count;
        }

        let m = merged.media;
        if let Some(ms) = m.extraction_timeout_ms {
            config.media.extraction_timeout_ms = ms;
        }
        if let Some(quality) = m.jpeg_quality {
            config.media.jpeg_quality = quality.clamp(1, 100);
        }
        if let Some(path) = m.ffmpeg_path {
            config.media.ffmpeg_path = path;
        }
        if let Some(path) = m.ffprobe_path {
            config.media.ffprobe_path = path;
        }

        if let Some(dir) = merged.output.dir {
            config.output_dir = dir;
        }
        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            seek_seconds: None,
            timeout: Duration::from_millis(self.media.extraction_timeout_ms),
            jpeg_quality: self.media.jpeg_quality,
        }
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".kiln").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<KilnConfigFile> {
        let content = std::fs::read_to_string(path)?;
        let config: KilnConfigFile = toml::from_str(&content).map_err(|e| {
            KilnError::ConfigError(format!("Failed to parse config {}: {}", path.display(), e))
        })?;
        Ok(config)
    }

    fn merge_into(base: &mut KilnConfigFile, overlay: KilnConfigFile) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut base.backend.url, overlay.backend.url);
        take(&mut base.backend.timeout_secs, overlay.backend.timeout_secs);
        take(&mut base.backend.retries, overlay.backend.retries);
        take(&mut base.backend.provider, overlay.backend.provider);

        take(
            &mut base.fallback.text_to_model_delay_ms,
            overlay.fallback.text_to_model_delay_ms,
        );
        take(
            &mut base.fallback.image_to_model_delay_ms,
            overlay.fallback.image_to_model_delay_ms,
        );
        take(&mut base.fallback.texture_size, overlay.fallback.texture_size);
        take(&mut base.fallback.speckles, overlay.fallback.speckles);

        take(
            &mut base.media.extraction_timeout_ms,
            overlay.media.extraction_timeout_ms,
        );
        take(&mut base.media.jpeg_quality, overlay.media.jpeg_quality);
        take(&mut base.media.ffmpeg_path, overlay.media.ffmpeg_path);
        take(&mut base.media.ffprobe_path, overlay.media.ffprobe_path);

        take(&mut base.output.dir, overlay.output.dir);
    }

    fn apply_env_overrides(config: &mut KilnConfigFile, env: impl Fn(&str) -> Option<String>) {
        if let Some(url) = env("KILN_BACKEND_URL") {
            config.backend.url = Some(url);
        }
        if let Some(provider) = env("KILN_PROVIDER") {
            config.backend.provider = Some(provider);
        }
        if let Some(dir) = env("KILN_OUTPUT_DIR") {
            config.output.dir = Some(PathBuf::from(dir));
        }
    }
}
