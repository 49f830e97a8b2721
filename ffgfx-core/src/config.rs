//! Backend configuration
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which fixed-function GPU the backend drives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Graphics Synthesizer: GIF packets under DMA tags.
    #[default]
    Gs,
    /// PowerVR tile accelerator: polygon headers and vertex records.
    Pvr,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    pub target: TargetKind,
    /// Display surface width in pixels.
    pub width: u32,
    /// Display surface height in pixels.
    pub height: u32,
    /// Capacity of each of the two command buffers, in 128-bit qwords.
    pub packet_qwords: usize,
    /// Cursor position (qwords) past which the next draw forces a mid-frame flush.
    pub flush_threshold_qwords: usize,
    /// Largest vertex count emitted under a single primitive header.
    pub max_batch_vertices: usize,
    /// Budget for CPU-side texture copies (header + pixels).
    pub texture_memory_bytes: usize,
    pub vsync: bool,
    /// Minimum frame time enforced at end of frame; 0 disables the limiter.
    pub min_frame_ms: f32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            target: TargetKind::Gs,
            width: 640,
            height: 448,
            packet_qwords: 50_000,
            flush_threshold_qwords: 45_000,
            max_batch_vertices: 32_000,
            texture_memory_bytes: 16 * 1024 * 1024,
            vsync: true,
            min_frame_ms: 0.0,
        }
    }
}

impl BackendConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: BackendConfig =
            serde_json::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            anyhow::bail!("Display size must be non-zero ({}x{})", self.width, self.height);
        }
        if self.width > 2048 || self.height > 2048 {
            anyhow::bail!(
                "Display size {}x{} exceeds the rasterizer range",
                self.width,
                self.height
            );
        }
        if self.packet_qwords < 256 {
            anyhow::bail!("packet_qwords too small: {}", self.packet_qwords);
        }
        if self.flush_threshold_qwords > self.packet_qwords {
            anyhow::bail!(
                "flush_threshold_qwords ({}) exceeds packet_qwords ({})",
                self.flush_threshold_qwords,
                self.packet_qwords
            );
        }
        // One quad (four vertices) is the smallest unit of work.
        if self.max_batch_vertices < 4 || self.max_batch_vertices > 32_767 {
            anyhow::bail!("max_batch_vertices out of range: {}", self.max_batch_vertices);
        }
        if self.min_frame_ms < 0.0 {
            anyhow::bail!("min_frame_ms must not be negative");
        }
        Ok(())
    }
}
