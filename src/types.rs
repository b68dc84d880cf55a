// Strong typing over raw integers. Newtypes for frame indices, frame rates, and pixel dimensions.
// See DESIGN.md: types

use serde::{Deserialize, Serialize};

/// Reference width every composition is designed against (LinkedIn 4:5).
pub const REFERENCE_WIDTH: u32 = 1080;

/// Reference height every composition is designed against (LinkedIn 4:5).
pub const REFERENCE_HEIGHT: u32 = 1350;

/// Frame rate shared by all shipped compositions.
pub const DEFAULT_FPS: u32 = 30;

/// Frame index on a timeline. Newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct FrameIndex(u32);

impl FrameIndex {
    pub fn new(index: u32) -> Self {
        FrameIndex(index)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Frame index as a float, for feeding the interpolators.
    pub fn as_f64(&self) -> f64 {
        self.0 as f64
    }

    /// Shift by `delta` frames, saturating at zero.
    pub fn offset_by(&self, delta: i64) -> Self {
        let shifted = (self.0 as i64 + delta).clamp(0, u32::MAX as i64);
        FrameIndex(shifted as u32)
    }
}

impl From<u32> for FrameIndex {
    fn from(index: u32) -> Self {
        FrameIndex(index)
    }
}

/// Frames per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fps(u32);

impl Fps {
    pub fn new(fps: u32) -> Self {
        Fps(fps)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Whole number of frames covering `secs` seconds.
    pub fn frames_for_secs(&self, secs: u32) -> u32 {
        self.0 * secs
    }

    /// Duration of `frames` frames in seconds.
    pub fn secs_for_frames(&self, frames: u32) -> f64 {
        if self.0 == 0 {
            return 0.0;
        }
        frames as f64 / self.0 as f64
    }
}

impl Default for Fps {
    fn default() -> Self {
        Fps(DEFAULT_FPS)
    }
}

/// Output pixel dimensions of a composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Dimensions { width, height }
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Dimensions {
            width: REFERENCE_WIDTH,
            height: REFERENCE_HEIGHT,
        }
    }
}

/// Aspect-ratio presets for multi-format output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderPreset {
    /// 4:5, maximum LinkedIn feed real estate.
    Linkedin,
    /// 9:16, IG Reels / TikTok / Shorts.
    Reels,
    /// 16:9, YouTube / website embed.
    Landscape,
}

impl RenderPreset {
    pub const ALL: [RenderPreset; 3] = [
        RenderPreset::Linkedin,
        RenderPreset::Reels,
        RenderPreset::Landscape,
    ];

    pub fn dimensions(&self) -> Dimensions {
        match self {
            RenderPreset::Linkedin => Dimensions::new(1080, 1350),
            RenderPreset::Reels => Dimensions::new(1080, 1920),
            RenderPreset::Landscape => Dimensions::new(1920, 1080),
        }
    }

    pub fn fps(&self) -> Fps {
        Fps::default()
    }
}

/// Engine configuration passed from JS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Composition id from the built-in registry.
    pub composition: String,
    /// Override the composition's own output size.
    #[serde(default)]
    pub preset: Option<RenderPreset>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_offset_saturates() {
        let frame = FrameIndex::new(5);
        assert_eq!(frame.offset_by(-10).as_u32(), 0);
        assert_eq!(frame.offset_by(3).as_u32(), 8);
    }

    #[test]
    fn fps_conversions() {
        let fps = Fps::new(30);
        assert_eq!(fps.frames_for_secs(60), 1800);
        assert!((fps.secs_for_frames(246) - 8.2).abs() < 1e-9);
        assert_eq!(Fps::new(0).secs_for_frames(10), 0.0);
    }

    #[test]
    fn presets_match_render_targets() {
        assert_eq!(RenderPreset::Linkedin.dimensions(), Dimensions::new(1080, 1350));
        assert_eq!(RenderPreset::Reels.dimensions(), Dimensions::new(1080, 1920));
        assert_eq!(RenderPreset::Landscape.dimensions(), Dimensions::new(1920, 1080));
    }

    #[test]
    fn preset_serializes_lowercase() {
        let json = serde_json::to_string(&RenderPreset::Reels).unwrap();
        assert_eq!(json, "\"reels\"");
    }
}
