// Scene composer: maps a global frame to the active scene(s) and their local frames.
// Scene ranges are half-open; adjacent scenes overlap only where a transition is declared.
// See DESIGN.md: composer

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::error::EngineError;
use crate::timing::{TimingTable, TransitionKind, WipeDirection};
use crate::types::FrameIndex;

/// A frame range, inclusive start and exclusive end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRange {
    pub start: u32,
    pub end: u32,
}

impl FrameRange {
    pub fn new(start: u32, end: u32) -> Self {
        FrameRange { start, end }
    }

    pub fn duration(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Check if a frame falls within this range (inclusive start, exclusive end).
    pub fn contains(&self, frame: u32) -> bool {
        frame >= self.start && frame < self.end
    }
}

/// Where the playhead is relative to the scene list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelinePhase {
    BeforeScene,
    InScene,
    InTransition,
    End,
}

/// Active scene(s) at a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimelinePosition {
    Scene {
        scene_index: usize,
        scene_id: String,
        local_frame: u32,
    },
    Transition {
        outgoing_index: usize,
        incoming_index: usize,
        outgoing_local: u32,
        incoming_local: u32,
        /// Blend progress in `[0, 1]`.
        progress: f64,
        transition: TransitionKind,
    },
}

/// Result of resolving a requested frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineSample {
    pub requested_frame: i64,
    /// Frame actually resolved after clamping into `[0, total_frames)`.
    pub frame: FrameIndex,
    pub phase: TimelinePhase,
    pub position: TimelinePosition,
}

impl TimelineSample {
    pub fn clamped(&self) -> bool {
        self.requested_frame != self.frame.as_u32() as i64
    }
}

/// Scenes of a timing table laid out on one global frame counter.
#[derive(Debug, Clone)]
pub struct Timeline {
    table: TimingTable,
    ranges: Vec<FrameRange>,
    total_frames: u32,
}

impl Timeline {
    /// Validate `table` and precompute each scene's global range.
    pub fn new(table: TimingTable) -> Result<Self, EngineError> {
        table.validate()?;

        let mut ranges = Vec::with_capacity(table.scenes.len());
        let mut start = 0u32;
        for scene in &table.scenes {
            ranges.push(FrameRange::new(start, start + scene.duration_frames));
            start += scene.duration_frames - scene.overlap_frames();
        }
        let total_frames = ranges.last().map(|r| r.end).unwrap_or(0);

        tracing::debug!(
            table = %table.id,
            scenes = ranges.len(),
            total_frames,
            "Timeline composed"
        );

        Ok(Timeline {
            table,
            ranges,
            total_frames,
        })
    }

    pub fn builtin(id: &str) -> Result<Self, EngineError> {
        Timeline::new(TimingTable::builtin(id)?)
    }

    /// Parse and validate a JSON timing table.
    pub fn from_json(table_json: &str) -> Result<Self, EngineError> {
        let table: TimingTable = serde_json::from_str(table_json)?;
        Timeline::new(table)
    }

    pub fn table(&self) -> &TimingTable {
        &self.table
    }

    pub fn total_frames(&self) -> u32 {
        self.total_frames
    }

    pub fn scene_count(&self) -> usize {
        self.ranges.len()
    }

    /// Global range of scene `index`.
    pub fn scene_range(&self, index: usize) -> Option<FrameRange> {
        self.ranges.get(index).copied()
    }

    /// Global windows where scene `i` and scene `i + 1` are both on screen.
    pub fn transition_windows(&self) -> Vec<(usize, FrameRange)> {
        self.ranges
            .windows(2)
            .enumerate()
            .filter_map(|(i, pair)| {
                let window = FrameRange::new(pair[1].start, pair[0].end);
                (window.duration() > 0).then_some((i, window))
            })
            .collect()
    }

    /// Resolve a global frame.
    ///
    /// Negative frames resolve to frame 0 in the `BeforeScene` phase. Frames at or
    /// past the end freeze on the last frame in the `End` phase. Neither is an error.
    pub fn position_at(&self, requested_frame: i64) -> TimelineSample {
        let last = self.total_frames.saturating_sub(1);
        let (frame, phase_override) = if requested_frame < 0 {
            (0, Some(TimelinePhase::BeforeScene))
        } else if requested_frame > last as i64 {
            (last, Some(TimelinePhase::End))
        } else {
            (requested_frame as u32, None)
        };

        let position = self.resolve(frame);
        let phase = phase_override.unwrap_or(match position {
            TimelinePosition::Scene { .. } => TimelinePhase::InScene,
            TimelinePosition::Transition { .. } => TimelinePhase::InTransition,
        });

        TimelineSample {
            requested_frame,
            frame: FrameIndex::new(frame),
            phase,
            position,
        }
    }

    /// Seek `delta` frames from an already resolved sample (scrubbing, frame stepping).
    pub fn step(&self, from: &TimelineSample, delta: i64) -> TimelineSample {
        self.position_at(from.frame.offset_by(delta).as_u32() as i64)
    }

    fn resolve(&self, frame: u32) -> TimelinePosition {
        // First scene whose range contains the frame; ranges are ordered by start.
        let index = self
            .ranges
            .iter()
            .position(|r| r.contains(frame))
            .unwrap_or(self.ranges.len() - 1);
        let range = self.ranges[index];

        if let Some(next) = self.ranges.get(index + 1) {
            if next.contains(frame) {
                let overlap = self.table.scenes[index].overlap_frames();
                let incoming_local = frame - next.start;
                let progress = if overlap == 0 {
                    1.0
                } else {
                    (incoming_local as f64 / overlap as f64).clamp(0.0, 1.0)
                };
                let transition = self.table.scenes[index]
                    .transition_out
                    .map(|t| t.kind)
                    .unwrap_or(TransitionKind::Fade);
                return TimelinePosition::Transition {
                    outgoing_index: index,
                    incoming_index: index + 1,
                    outgoing_local: frame - range.start,
                    incoming_local,
                    progress,
                    transition,
                };
            }
        }

        TimelinePosition::Scene {
            scene_index: index,
            scene_id: self.table.scenes[index].id.clone(),
            local_frame: frame.saturating_sub(range.start).min(range.duration() - 1),
        }
    }
}

/// How one layer of a transition is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerStyle {
    pub opacity: f64,
    /// Percentage of the layer revealed along the wipe direction.
    pub reveal_percent: f64,
    pub direction: Option<WipeDirection>,
}

impl LayerStyle {
    fn solid() -> Self {
        LayerStyle {
            opacity: 1.0,
            reveal_percent: 100.0,
            direction: None,
        }
    }
}

/// Outgoing and incoming layer styles for a transition at `progress`.
pub fn transition_presentation(kind: TransitionKind, progress: f64) -> (LayerStyle, LayerStyle) {
    let p = progress.clamp(0.0, 1.0);
    match kind {
        TransitionKind::Fade => (
            LayerStyle {
                opacity: 1.0 - p,
                ..LayerStyle::solid()
            },
            LayerStyle {
                opacity: p,
                ..LayerStyle::solid()
            },
        ),
        TransitionKind::Wipe { direction } => (
            LayerStyle::solid(),
            LayerStyle {
                opacity: 1.0,
                reveal_percent: p * 100.0,
                direction: Some(direction),
            },
        ),
    }
}

// =============================================================================
// WASM Bindings
// =============================================================================

/// WASM-exposed timeline for the render host.
///
/// # Example JSON table
/// ```json
/// {
///   "id": "custom",
///   "scenes": [
///     { "id": "hook", "duration_frames": 36, "transition_out": { "kind": { "type": "fade" }, "duration_frames": 10 } },
///     { "id": "cta", "duration_frames": 94 }
///   ],
///   "declared_total_frames": 120
/// }
/// ```
#[wasm_bindgen]
pub struct WasmTimeline {
    inner: Timeline,
}

#[wasm_bindgen]
impl WasmTimeline {
    /// Create a timeline from a JSON timing table.
    #[wasm_bindgen(constructor)]
    pub fn new(table_json: &str) -> Result<WasmTimeline, JsValue> {
        let inner = Timeline::from_json(table_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid timing table: {}", e)))?;
        Ok(WasmTimeline { inner })
    }

    /// Create a timeline from one of the built-in timing tables.
    #[wasm_bindgen]
    pub fn builtin(id: &str) -> Result<WasmTimeline, JsValue> {
        let inner = Timeline::builtin(id).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(WasmTimeline { inner })
    }

    #[wasm_bindgen]
    pub fn total_frames(&self) -> u32 {
        self.inner.total_frames()
    }

    /// Resolve a global frame. Returns a `TimelineSample` as JSON.
    #[wasm_bindgen]
    pub fn position_at(&self, frame: i64) -> Result<String, JsValue> {
        serde_json::to_string(&self.inner.position_at(frame))
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// The timing table as JSON.
    #[wasm_bindgen]
    pub fn to_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.inner.table())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}
