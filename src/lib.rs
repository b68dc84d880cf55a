// reel_engine: frame-timing engine for the promo video compositions and the
// Mission Control dashboard state. Everything is a pure function of frame
// number or fetched snapshot; JS only renders.

mod animate;
mod composer;
mod composition;
#[cfg(not(target_arch = "wasm32"))]
mod config;
mod error;
mod error_boundary;
mod profile;
mod scale;
mod timing;
mod types;
mod vitals;

pub mod dashboard;

use serde::Serialize;
use wasm_bindgen::prelude::*;

pub use animate::{
    counter_value, cursor_visible, interpolate, spring, typewriter_chars, Breakpoint,
    BreakpointTable, Easing, Extrapolate, InterpolateOptions, SpringConfig, VolumeEnvelope,
};
pub use composer::{
    transition_presentation, FrameRange, LayerStyle, Timeline, TimelinePhase, TimelinePosition,
    TimelineSample, WasmTimeline,
};
pub use composition::{CompositionRegistry, CompositionSpec};
#[cfg(not(target_arch = "wasm32"))]
pub use config::DashboardConfig;
pub use error::EngineError;
pub use error_boundary::{BoundaryView, ErrorBoundary};
pub use profile::{
    avatar_variant, grade_color_v2, grade_for_score_v2, is_advanced_variant, load_profile,
    load_profile_v2, next_title, tier_color, xp_percent, AssetCandidate, AssetKind, AvatarAssets,
    AvatarVariant, Milestone, ProfileView, ReadyProfile, RpgClass, RpgProfile, RpgProfileV2,
    TitleTier, V2Meta, V2ScoringEntry, TITLE_TABLE,
};
pub use scale::ScaleFactors;
pub use timing::{SceneSpec, TimingTable, TransitionKind, TransitionSpec, WipeDirection};
pub use types::*;
pub use vitals::{
    grade_color, load_website_stats, nio_avatar_urls, nio_progress, nio_tier_for_score,
    read_website_stats, total_loc, NioTier, SiteStats, WebsiteStats, NIO_TIERS,
};

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameState {
    pub sample: TimelineSample,
    /// Outgoing and incoming layer styles while a transition is active.
    pub layers: Option<(LayerStyle, LayerStyle)>,
    pub width: u32,
    pub height: u32,
    pub scale: ScaleFactors,
}

/// Main engine interface exposed to JavaScript: one composition at one output size.
/// Batch interface to minimize JS↔WASM crossings.
#[wasm_bindgen]
pub struct Engine {
    composition: CompositionSpec,
    timeline: Timeline,
    dimensions: Dimensions,
}

impl Engine {
    /// Parse an `EngineConfig` JSON string and build the engine.
    pub fn from_json(config_json: &str) -> Result<Engine, EngineError> {
        let config: EngineConfig = serde_json::from_str(config_json)
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        Engine::from_config(&config)
    }

    pub fn from_config(config: &EngineConfig) -> Result<Engine, EngineError> {
        let registry = CompositionRegistry::builtin();
        let composition = registry.get(&config.composition)?.clone();
        let timeline = registry.timeline(&composition.id)?;
        let dimensions = config
            .preset
            .map(|p| p.dimensions())
            .unwrap_or_else(|| composition.dimensions());
        Ok(Engine {
            composition,
            timeline,
            dimensions,
        })
    }

    pub fn frame_state(&self, frame: i64) -> FrameState {
        let sample = self.timeline.position_at(frame);
        let layers = match &sample.position {
            TimelinePosition::Transition {
                progress,
                transition,
                ..
            } => Some(transition_presentation(*transition, *progress)),
            TimelinePosition::Scene { .. } => None,
        };
        FrameState {
            sample,
            layers,
            width: self.dimensions.width,
            height: self.dimensions.height,
            scale: ScaleFactors::for_dimensions(self.dimensions),
        }
    }

    pub fn composition(&self) -> &CompositionSpec {
        &self.composition
    }
}

#[wasm_bindgen]
impl Engine {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<Engine, JsValue> {
        Engine::from_json(config_json).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn total_frames(&self) -> u32 {
        self.timeline.total_frames()
    }

    pub fn fps(&self) -> u32 {
        self.composition.fps.as_u32()
    }

    /// Resolve one frame. Returns a `FrameState` as JSON.
    pub fn render_frame(&self, frame: i64) -> Result<String, JsValue> {
        serde_json::to_string(&self.frame_state(frame))
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Scale a reference-design pixel value to this output size.
    pub fn scale_px(&self, px: f64) -> i64 {
        ScaleFactors::for_dimensions(self.dimensions).s(px)
    }
}

/// A validated breakpoint table with fixed options, for per-frame calls from JS.
#[wasm_bindgen]
pub struct WasmAnimator {
    table: BreakpointTable,
    options: InterpolateOptions,
}

impl WasmAnimator {
    pub fn from_json(breakpoints_json: &str, options_json: &str) -> Result<WasmAnimator, EngineError> {
        let table: BreakpointTable = serde_json::from_str(breakpoints_json)
            .map_err(|e| EngineError::InvalidBreakpoints(e.to_string()))?;
        let options = if options_json.trim().is_empty() {
            InterpolateOptions::default()
        } else {
            serde_json::from_str(options_json)
                .map_err(|e| EngineError::InvalidConfig(format!("interpolate options: {}", e)))?
        };
        Ok(WasmAnimator { table, options })
    }
}

#[wasm_bindgen]
impl WasmAnimator {
    /// `breakpoints_json`: `[{"frame":0,"value":0},...]`. `options_json` may be empty.
    #[wasm_bindgen(constructor)]
    pub fn new(breakpoints_json: &str, options_json: &str) -> Result<WasmAnimator, JsValue> {
        WasmAnimator::from_json(breakpoints_json, options_json)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn value_at(&self, frame: f64) -> f64 {
        self.table.value_at(frame, &self.options)
    }
}

/// Derive the avatar badge view. An empty string or `null` means no profile yet.
pub fn profile_view_json(profile_json: &str) -> Result<String, EngineError> {
    let trimmed = profile_json.trim();
    let profile = if trimmed.is_empty() || trimmed == "null" {
        None
    } else {
        let raw: serde_json::Value = serde_json::from_str(trimmed)?;
        Some(RpgProfile::from_value(&raw))
    };
    Ok(serde_json::to_string(&ProfileView::derive(profile.as_ref()))?)
}

#[wasm_bindgen]
pub fn derive_profile_view(profile_json: &str) -> Result<String, JsValue> {
    profile_view_json(profile_json).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// One registered composition as JSON.
pub fn composition_spec_json(id: &str) -> Result<String, EngineError> {
    let registry = CompositionRegistry::builtin();
    Ok(serde_json::to_string(registry.get(id)?)?)
}

#[wasm_bindgen]
pub fn composition_json(id: &str) -> Result<String, JsValue> {
    composition_spec_json(id).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// All registered composition ids as a JSON array.
#[wasm_bindgen]
pub fn list_compositions() -> String {
    let registry = CompositionRegistry::builtin();
    let ids: Vec<&str> = registry.compositions().iter().map(|c| c.id.as_str()).collect();
    serde_json::to_string(&ids).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_creation_works() {
        let engine = Engine::new(r#"{"composition":"ContentOsHighlight"}"#).unwrap();
        assert_eq!(engine.total_frames(), 310);
        assert_eq!(engine.fps(), 30);
    }

    #[test]
    fn preset_overrides_output_size() {
        let config = EngineConfig {
            composition: "LeadMagnet".to_string(),
            preset: Some(RenderPreset::Landscape),
        };
        let engine = Engine::from_config(&config).unwrap();
        let state = engine.frame_state(0);
        assert_eq!((state.width, state.height), (1920, 1080));
        assert_eq!(engine.scale_px(27.0), 48);
        assert_eq!(engine.composition().id, "LeadMagnet");
    }

    #[test]
    fn unknown_composition_fails() {
        let config = EngineConfig {
            composition: "Missing".to_string(),
            preset: None,
        };
        assert!(matches!(
            Engine::from_config(&config),
            Err(EngineError::UnknownComposition(_))
        ));
    }

    #[test]
    fn transition_frames_carry_layers() {
        let engine = Engine::new(r#"{"composition":"ContentOsHighlight"}"#).unwrap();
        // First contentos transition spans frames 26..36.
        assert!(engine.frame_state(31).layers.is_some());
        assert!(engine.frame_state(10).layers.is_none());
        assert!(engine.render_frame(31).unwrap().contains("\"layers\""));
    }

    #[test]
    fn animator_from_json() {
        let animator = WasmAnimator::new(r#"[{"frame":0,"value":0},{"frame":10,"value":100}]"#, "")
            .unwrap();
        assert_eq!(animator.value_at(5.0), 50.0);
        assert_eq!(animator.value_at(-3.0), 0.0);
        assert_eq!(animator.value_at(20.0), 100.0);

        let extended = WasmAnimator::new(
            r#"[{"frame":0,"value":0},{"frame":10,"value":100}]"#,
            r#"{"extrapolate_right":"extend"}"#,
        )
        .unwrap();
        assert_eq!(extended.value_at(20.0), 200.0);
    }

    #[test]
    fn profile_view_from_json() {
        let placeholder = profile_view_json("").unwrap();
        assert!(placeholder.contains("initializing"));
        assert_eq!(profile_view_json("null").unwrap(), placeholder);

        let ready = profile_view_json(r#"{"name":"Shawn","level":20,"avatar_tier":3}"#).unwrap();
        assert!(ready.contains("\"state\":\"ready\""));
        assert!(ready.contains("Skill Forger"));

        assert!(matches!(
            profile_view_json("{ nope"),
            Err(EngineError::Serialization(_))
        ));
    }

    #[test]
    fn composition_listing() {
        let ids: Vec<String> = serde_json::from_str(&list_compositions()).unwrap();
        assert_eq!(ids.len(), 7);
        assert!(ids.contains(&"LeadMagnetReels".to_string()));
        assert!(composition_json("GtmOsHighlight").unwrap().contains("\"duration_in_frames\":246"));
        assert!(matches!(
            composition_spec_json("Nope"),
            Err(EngineError::UnknownComposition(_))
        ));
    }

    #[test]
    fn malformed_json_inputs_are_rejected() {
        assert!(matches!(
            Engine::from_json("{"),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(matches!(
            Engine::from_json(r#"{"composition":"Nope"}"#),
            Err(EngineError::UnknownComposition(_))
        ));
        assert!(matches!(
            WasmAnimator::from_json("[]", ""),
            Err(EngineError::InvalidBreakpoints(_))
        ));
        assert!(matches!(
            WasmAnimator::from_json(r#"[{"frame":5,"value":0},{"frame":1,"value":1}]"#, ""),
            Err(EngineError::InvalidBreakpoints(_))
        ));
        assert!(matches!(
            WasmAnimator::from_json(r#"[{"frame":0,"value":0}]"#, "{ nope"),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(matches!(
            Timeline::from_json("{"),
            Err(EngineError::Serialization(_))
        ));
    }
}
