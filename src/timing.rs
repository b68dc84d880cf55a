// Timing tables: named, versioned scene-duration tables for each video cut.
// Tables are plain values handed to the composer, so several compositions can coexist.
// See DESIGN.md: timing

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::Fps;

/// Direction a wipe travels across the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WipeDirection {
    #[default]
    FromLeft,
    FromRight,
    FromTop,
    FromBottom,
}

/// Visual presentation of a transition between two scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransitionKind {
    Fade,
    Wipe {
        #[serde(default)]
        direction: WipeDirection,
    },
}

/// Overlap between a scene and the one after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionSpec {
    pub kind: TransitionKind,
    pub duration_frames: u32,
}

impl TransitionSpec {
    pub fn fade(duration_frames: u32) -> Self {
        TransitionSpec {
            kind: TransitionKind::Fade,
            duration_frames,
        }
    }

    pub fn wipe(duration_frames: u32) -> Self {
        TransitionSpec {
            kind: TransitionKind::Wipe {
                direction: WipeDirection::FromLeft,
            },
            duration_frames,
        }
    }
}

/// A named, fixed-duration segment of the video timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneSpec {
    pub id: String,
    pub duration_frames: u32,
    /// Transition into the next scene. `None` is a hard cut.
    #[serde(default)]
    pub transition_out: Option<TransitionSpec>,
}

impl SceneSpec {
    pub fn new(id: impl Into<String>, duration_frames: u32) -> Self {
        SceneSpec {
            id: id.into(),
            duration_frames,
            transition_out: None,
        }
    }

    pub fn then(mut self, transition: TransitionSpec) -> Self {
        self.transition_out = Some(transition);
        self
    }

    /// Frames this scene shares with the next one.
    pub fn overlap_frames(&self) -> u32 {
        self.transition_out.map(|t| t.duration_frames).unwrap_or(0)
    }
}

/// Versioned lookup from scene id to duration metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingTable {
    pub id: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub fps: Fps,
    pub scenes: Vec<SceneSpec>,
    /// Length the composition is registered with. Must equal the computed total.
    pub declared_total_frames: u32,
}

fn default_version() -> u32 {
    1
}

impl TimingTable {
    pub fn new(
        id: impl Into<String>,
        version: u32,
        fps: Fps,
        scenes: Vec<SceneSpec>,
        declared_total_frames: u32,
    ) -> Self {
        TimingTable {
            id: id.into(),
            version,
            fps,
            scenes,
            declared_total_frames,
        }
    }

    /// `sum(durations) - sum(overlaps)`. Signed so malformed tables can be reported.
    pub fn computed_total_frames(&self) -> i64 {
        let durations: i64 = self.scenes.iter().map(|s| s.duration_frames as i64).sum();
        durations - self.total_overlap_frames() as i64
    }

    pub fn total_overlap_frames(&self) -> u32 {
        self.scenes.iter().map(|s| s.overlap_frames()).sum()
    }

    pub fn scene(&self, id: &str) -> Option<&SceneSpec> {
        self.scenes.iter().find(|s| s.id == id)
    }

    pub fn scene_index(&self, id: &str) -> Option<usize> {
        self.scenes.iter().position(|s| s.id == id)
    }

    /// Global frame at which scene `id` begins.
    pub fn start_frame(&self, id: &str) -> Option<u32> {
        let index = self.scene_index(id)?;
        Some(
            self.scenes[..index]
                .iter()
                .map(|s| s.duration_frames.saturating_sub(s.overlap_frames()))
                .sum(),
        )
    }

    pub fn duration_secs(&self) -> f64 {
        self.fps.secs_for_frames(self.declared_total_frames)
    }

    /// Check structural rules and the timeline length invariant.
    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |message: String| EngineError::InvalidTimingTable {
            table: self.id.clone(),
            message,
        };

        if self.scenes.is_empty() {
            return Err(invalid("no scenes".to_string()));
        }
        if self.fps.as_u32() == 0 {
            return Err(invalid("fps must be positive".to_string()));
        }

        let mut seen = HashSet::new();
        for scene in &self.scenes {
            if !seen.insert(scene.id.as_str()) {
                return Err(invalid(format!("duplicate scene id '{}'", scene.id)));
            }
            if scene.duration_frames == 0 {
                return Err(invalid(format!("scene '{}' has zero duration", scene.id)));
            }
        }

        if let Some(last) = self.scenes.last() {
            if last.transition_out.is_some() {
                return Err(invalid(format!(
                    "last scene '{}' cannot transition out",
                    last.id
                )));
            }
        }

        for pair in self.scenes.windows(2) {
            let (outgoing, incoming) = (&pair[0], &pair[1]);
            if let Some(transition) = outgoing.transition_out {
                if transition.duration_frames == 0 {
                    return Err(invalid(format!(
                        "transition after '{}' has zero duration",
                        outgoing.id
                    )));
                }
                if transition.duration_frames >= outgoing.duration_frames
                    || transition.duration_frames >= incoming.duration_frames
                {
                    return Err(invalid(format!(
                        "transition of {} frames between '{}' and '{}' must be shorter than both scenes",
                        transition.duration_frames, outgoing.id, incoming.id
                    )));
                }
            }
        }

        // Two consecutive transitions must not overlap inside the middle scene.
        for window in self.scenes.windows(3) {
            let (before, middle) = (&window[0], &window[1]);
            if before.overlap_frames() + middle.overlap_frames() > middle.duration_frames {
                return Err(invalid(format!(
                    "transitions around '{}' overlap each other",
                    middle.id
                )));
            }
        }

        let computed = self.computed_total_frames();
        if computed != self.declared_total_frames as i64 {
            return Err(EngineError::TotalFramesMismatch {
                table: self.id.clone(),
                declared: self.declared_total_frames,
                computed,
            });
        }

        Ok(())
    }

    /// Every table shipped with the engine.
    pub fn builtin_tables() -> Vec<TimingTable> {
        vec![
            lead_magnet_v1(),
            lead_magnet_v2(),
            highlight_246("shawnos", ["hook", "boot-wiki", "progression", "tool-blitz", "cta"]),
            highlight_246("gtmos", ["hook", "boot-blitz", "showcase", "tool-blitz", "cta"]),
            content_os(),
        ]
    }

    pub fn builtin(id: &str) -> Result<TimingTable, EngineError> {
        TimingTable::builtin_tables()
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| EngineError::UnknownTimingTable(id.to_string()))
    }
}

/// 60 seconds at 30fps, six back-to-back scenes.
fn lead_magnet_v1() -> TimingTable {
    let fps = Fps::default();
    let secs = |s: u32| fps.frames_for_secs(s);
    TimingTable::new(
        "lead-magnet-v1",
        1,
        fps,
        vec![
            SceneSpec::new("hook", secs(3)),
            SceneSpec::new("boot", secs(5)),
            SceneSpec::new("wiki-montage", secs(17)),
            SceneSpec::new("progression", secs(15)),
            SceneSpec::new("network-reveal", secs(12)),
            SceneSpec::new("cta", secs(8)),
        ],
        secs(60),
    )
}

/// 30 seconds: 945 scene frames minus three 15-frame overlaps.
fn lead_magnet_v2() -> TimingTable {
    let overlap = TransitionSpec::fade(15);
    TimingTable::new(
        "lead-magnet-v2",
        2,
        Fps::default(),
        vec![
            SceneSpec::new("hook", 90).then(overlap),
            SceneSpec::new("boot-wiki-blitz", 350).then(overlap),
            SceneSpec::new("progression", 250).then(overlap),
            SceneSpec::new("cta-network", 255),
        ],
        900,
    )
}

/// ~8.2 second highlight: 28 + 80 + 58 + 54 + 58 - 4 x 8 = 246 frames, alternating fade and wipe.
fn highlight_246(id: &str, scene_ids: [&str; 5]) -> TimingTable {
    let durations = [28, 80, 58, 54, 58];
    let transitions = [
        TransitionSpec::fade(8),
        TransitionSpec::wipe(8),
        TransitionSpec::fade(8),
        TransitionSpec::wipe(8),
    ];
    let scenes = scene_ids
        .iter()
        .zip(durations)
        .enumerate()
        .map(|(i, (scene_id, duration))| {
            let scene = SceneSpec::new(*scene_id, duration);
            match transitions.get(i) {
                Some(t) => scene.then(*t),
                None => scene,
            }
        })
        .collect();
    TimingTable::new(id, 4, Fps::default(), scenes, 246)
}

/// ~10.3 second highlight: 36 + 110 + 100 + 94 - 3 x 10 = 310 frames.
fn content_os() -> TimingTable {
    TimingTable::new(
        "contentos",
        3,
        Fps::default(),
        vec![
            SceneSpec::new("hook", 36).then(TransitionSpec::fade(10)),
            SceneSpec::new("boot-wiki-blitz", 110).then(TransitionSpec::wipe(10)),
            SceneSpec::new("progression", 100).then(TransitionSpec::fade(10)),
            SceneSpec::new("cta-network", 94),
        ],
        310,
    )
}
