// =============================================================================
// CONFIGURATION - Load settings from config.toml
// =============================================================================
//
// This module handles loading and parsing configuration from config.toml.
// Provides sensible defaults if config file is missing or has errors.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::backend::ClearFlags;
use crate::util::pack_color;

/// Root configuration structure
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub viewport: ViewportConfig,
    pub graphics: GraphicsConfig,
    pub shaders: ShaderConfig,
    pub debug: DebugConfig,
}

/// Default framebuffer size
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Graphics settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    pub clear_color: [f32; 4],
    pub clear_depth: bool,
    pub clear_stencil: bool,
    /// Frames to render before exiting (headless runs have no window to close).
    pub frames: u32,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.1, 0.2, 0.8, 1.0],
            clear_depth: true,
            clear_stencil: false,
            frames: 3,
        }
    }
}

/// Shader sources
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    pub directory: PathBuf,
    pub vertex: String,
    pub fragment: String,
    pub hot_reload: bool,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("shaders"),
            vertex: "cube.vert".to_string(),
            fragment: "cube.frag".to_string(),
            hot_reload: false,
        }
    }
}

/// Debug settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Wrap the backend in `TracingGl`
    pub trace_calls: bool,
    pub log_to_file: bool,
    pub log_file: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            trace_calls: false,
            log_to_file: false,
            log_file: "renderer.log".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults if not found
    pub fn load() -> Self {
        Self::load_from_path("config.toml").unwrap_or_else(|e| {
            log::warn!("Failed to load config.toml: {}. Using defaults.", e);
            Config::default()
        })
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        log::info!("Loaded configuration from {:?}", path);
        log::debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Buffers to clear at the start of each frame
    pub fn clear_flags(&self) -> ClearFlags {
        let mut flags = ClearFlags::COLOR;
        if self.graphics.clear_depth {
            flags |= ClearFlags::DEPTH;
        }
        if self.graphics.clear_stencil {
            flags |= ClearFlags::STENCIL;
        }
        flags
    }

    /// Viewport size as the signed sizes `glViewport` takes
    pub fn viewport_size(&self) -> Result<(i32, i32)> {
        let width = i32::try_from(self.viewport.width)
            .with_context(|| format!("Viewport width {} is too large", self.viewport.width))?;
        let height = i32::try_from(self.viewport.height)
            .with_context(|| format!("Viewport height {} is too large", self.viewport.height))?;
        Ok((width, height))
    }

    /// Create or truncate the log file and write its header.
    ///
    /// `None` when file logging is disabled.
    pub fn open_log_file(&self) -> Result<Option<File>> {
        if !self.debug.log_to_file {
            return Ok(None);
        }
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.debug.log_file)
            .with_context(|| format!("Failed to open log file: {}", self.debug.log_file))?;
        writeln!(file, "=== Fork Renderer Log ===")?;
        writeln!(file, "Started: {:?}", std::time::SystemTime::now())?;
        writeln!(file)?;
        Ok(Some(file))
    }

    /// Clear color as unsigned RGBA bytes
    pub fn clear_color_bytes(&self) -> [u8; 4] {
        pack_color(self.graphics.clear_color.into()).map(|c| c as u8)
    }

    pub fn vertex_shader_path(&self) -> PathBuf {
        self.shaders.directory.join(&self.shaders.vertex)
    }

    pub fn fragment_shader_path(&self) -> PathBuf {
        self.shaders.directory.join(&self.shaders.fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from_path(dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.viewport.width, 1280);
        assert_eq!(config.graphics.frames, 3);
        assert_eq!(config.vertex_shader_path(), PathBuf::from("shaders/cube.vert"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[viewport]\nwidth = 320\n\n[graphics]\nclear_stencil = true\n\n[debug]\ntrace_calls = true\n",
        )
        .unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.viewport.width, 320);
        assert_eq!(config.viewport.height, 720);
        assert!(config.debug.trace_calls);
        assert_eq!(config.clear_flags(), ClearFlags::ALL);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[viewport\nwidth = ").unwrap();
        assert!(Config::load_from_path(&path).is_err());
    }

    #[test]
    fn oversized_viewport_is_an_error() {
        let mut config = Config::default();
        assert_eq!(config.viewport_size().unwrap(), (1280, 720));
        config.viewport.width = i32::MAX as u32 + 1;
        assert!(config.viewport_size().is_err());
        config.viewport.width = 16;
        config.viewport.height = u32::MAX;
        assert!(config.viewport_size().is_err());
    }

    #[test]
    fn log_file_is_truncated_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("renderer.log");
        std::fs::write(&path, "stale line\n").unwrap();

        let mut config = Config::default();
        config.debug.log_file = path.to_string_lossy().into_owned();
        assert!(config.open_log_file().unwrap().is_none());

        config.debug.log_to_file = true;
        let mut file = config.open_log_file().unwrap().unwrap();
        writeln!(file, "INFO record").unwrap();
        drop(file);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("=== Fork Renderer Log ==="));
        assert!(content.ends_with("INFO record\n"));
        assert!(!content.contains("stale line"));
    }

    #[test]
    fn clear_color_packs_to_bytes() {
        let mut config = Config::default();
        config.graphics.clear_color = [1.0, 0.5, 0.0, 1.0];
        assert_eq!(config.clear_color_bytes(), [255, 128, 0, 255]);
        config.graphics.clear_depth = false;
        assert_eq!(config.clear_flags(), ClearFlags::COLOR);
    }
}
