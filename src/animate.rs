// Frame-indexed animators: piecewise-linear breakpoint interpolation, easing, and spring motion.
// Every function here is pure. Same frame in, same value out, so the host can seek and re-render freely.
// See DESIGN.md: animate

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// A single `(frame, value)` pair in a breakpoint table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub frame: f64,
    pub value: f64,
}

impl Breakpoint {
    pub fn new(frame: f64, value: f64) -> Self {
        Breakpoint { frame, value }
    }
}

/// What to do with frames outside the breakpoint range, per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Extrapolate {
    /// Hold the nearest breakpoint's value.
    #[default]
    Clamp,
    /// Continue the slope of the nearest segment.
    Extend,
    /// Return the input frame unchanged.
    Identity,
}

/// Easing curve applied to segment progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Easing {
    #[default]
    Linear,
    EaseOut,
    EaseInOut,
    Spring,
}

impl Easing {
    /// Map `t` in `[0, 1]` through the curve.
    pub fn apply(&self, t: f64) -> f64 {
        match self {
            Easing::Linear => t,
            Easing::EaseOut => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::Spring => {
                // Elastic approximation; real spring physics lives in `spring()`.
                let c4 = (2.0 * std::f64::consts::PI) / 3.0;
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else {
                    2.0_f64.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
                }
            }
        }
    }
}

/// Interpolation options. Left and right extrapolation are independent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct InterpolateOptions {
    #[serde(default)]
    pub extrapolate_left: Extrapolate,
    #[serde(default)]
    pub extrapolate_right: Extrapolate,
    #[serde(default)]
    pub easing: Easing,
}

impl InterpolateOptions {
    /// Clamp on both sides, linear easing.
    pub fn clamped() -> Self {
        InterpolateOptions::default()
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn extend_right(mut self) -> Self {
        self.extrapolate_right = Extrapolate::Extend;
        self
    }
}

/// Validated breakpoint table: finite values, strictly increasing frames, at least one point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakpointTable {
    points: Vec<Breakpoint>,
}

impl BreakpointTable {
    pub fn new(points: Vec<Breakpoint>) -> Result<Self, EngineError> {
        if points.is_empty() {
            return Err(EngineError::InvalidBreakpoints(
                "table needs at least one breakpoint".to_string(),
            ));
        }
        if let Some(bad) = points
            .iter()
            .find(|p| !p.frame.is_finite() || !p.value.is_finite())
        {
            return Err(EngineError::InvalidBreakpoints(format!(
                "non-finite breakpoint ({}, {})",
                bad.frame, bad.value
            )));
        }
        for pair in points.windows(2) {
            if pair[1].frame <= pair[0].frame {
                return Err(EngineError::InvalidBreakpoints(format!(
                    "frames must be strictly increasing, got {} after {}",
                    pair[1].frame, pair[0].frame
                )));
            }
        }
        Ok(BreakpointTable { points })
    }

    /// Build from parallel input/output ranges, the way scenes declare them.
    pub fn from_ranges(frames: &[f64], values: &[f64]) -> Result<Self, EngineError> {
        if frames.len() != values.len() {
            return Err(EngineError::InvalidBreakpoints(format!(
                "input range has {} entries but output range has {}",
                frames.len(),
                values.len()
            )));
        }
        let points = frames
            .iter()
            .zip(values)
            .map(|(&frame, &value)| Breakpoint::new(frame, value))
            .collect();
        BreakpointTable::new(points)
    }

    pub fn points(&self) -> &[Breakpoint] {
        &self.points
    }

    pub fn first(&self) -> Breakpoint {
        self.points[0]
    }

    pub fn last(&self) -> Breakpoint {
        self.points[self.points.len() - 1]
    }

    pub fn value_at(&self, frame: f64, options: &InterpolateOptions) -> f64 {
        interpolate(frame, &self.points, options)
    }
}

impl<'de> Deserialize<'de> for BreakpointTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Bare `[{frame, value}, ...]` from JS, or the `{ "points": [...] }` form we serialize.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Points(Vec<Breakpoint>),
            Table { points: Vec<Breakpoint> },
        }
        let points = match Raw::deserialize(deserializer)? {
            Raw::Points(points) | Raw::Table { points } => points,
        };
        BreakpointTable::new(points).map_err(serde::de::Error::custom)
    }
}

/// Interpolate `input` across `points`.
///
/// Tolerates unvalidated input: an empty table yields `0.0`, a single point is
/// a constant, and zero-width segments return the segment's start value.
pub fn interpolate(input: f64, points: &[Breakpoint], options: &InterpolateOptions) -> f64 {
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return 0.0,
    };
    if points.len() == 1 {
        return first.value;
    }

    if input < first.frame {
        return match options.extrapolate_left {
            Extrapolate::Clamp => first.value,
            Extrapolate::Identity => input,
            Extrapolate::Extend => extend(input, points[0], points[1]),
        };
    }
    if input > last.frame {
        return match options.extrapolate_right {
            Extrapolate::Clamp => last.value,
            Extrapolate::Identity => input,
            Extrapolate::Extend => extend(input, points[points.len() - 2], last),
        };
    }

    // Find the segment containing the input.
    let idx = points
        .windows(2)
        .position(|pair| input <= pair[1].frame)
        .unwrap_or(points.len() - 2);
    let (a, b) = (points[idx], points[idx + 1]);

    let span = b.frame - a.frame;
    if span <= 0.0 {
        return a.value;
    }
    let progress = ((input - a.frame) / span).clamp(0.0, 1.0);
    lerp(a.value, b.value, options.easing.apply(progress))
}

/// Linear continuation of segment `a -> b` through `input`.
fn extend(input: f64, a: Breakpoint, b: Breakpoint) -> f64 {
    let span = b.frame - a.frame;
    if span <= 0.0 {
        return a.value;
    }
    a.value + (b.value - a.value) * (input - a.frame) / span
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Physical spring parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpringConfig {
    #[serde(default = "default_damping")]
    pub damping: f64,
    #[serde(default = "default_stiffness")]
    pub stiffness: f64,
    #[serde(default = "default_mass")]
    pub mass: f64,
    /// Never report values past the target.
    #[serde(default)]
    pub overshoot_clamping: bool,
}

fn default_damping() -> f64 {
    10.0
}

fn default_stiffness() -> f64 {
    100.0
}

fn default_mass() -> f64 {
    1.0
}

impl Default for SpringConfig {
    fn default() -> Self {
        SpringConfig {
            damping: default_damping(),
            stiffness: default_stiffness(),
            mass: default_mass(),
            overshoot_clamping: false,
        }
    }
}

impl SpringConfig {
    pub fn new(damping: f64, stiffness: f64) -> Self {
        SpringConfig {
            damping,
            stiffness,
            ..Default::default()
        }
    }
}

/// Damped spring moving from 0 to 1, sampled at `frame`.
///
/// Closed-form solution of `m x'' + c x' + k x = 0` released from rest one unit
/// away from the target. Negative frames are before release and return 0.
pub fn spring(frame: f64, fps: f64, config: &SpringConfig) -> f64 {
    if frame <= 0.0 || fps <= 0.0 {
        return 0.0;
    }
    let mass = config.mass.max(f64::EPSILON);
    let stiffness = config.stiffness.max(f64::EPSILON);
    let t = frame / fps;

    let omega0 = (stiffness / mass).sqrt();
    let zeta = config.damping / (2.0 * (stiffness * mass).sqrt());
    let x0 = -1.0;

    let displacement = if zeta < 1.0 {
        let omega_d = omega0 * (1.0 - zeta * zeta).sqrt();
        let envelope = (-zeta * omega0 * t).exp();
        envelope * (x0 * (omega_d * t).cos() + (zeta * omega0 * x0 / omega_d) * (omega_d * t).sin())
    } else if (zeta - 1.0).abs() < 1e-9 {
        (-omega0 * t).exp() * (x0 + omega0 * x0 * t)
    } else {
        let root = (zeta * zeta - 1.0).sqrt();
        let r1 = -omega0 * (zeta - root);
        let r2 = -omega0 * (zeta + root);
        let c2 = -r1 * x0 / (r2 - r1);
        let c1 = x0 - c2;
        c1 * (r1 * t).exp() + c2 * (r2 * t).exp()
    };

    let value = 1.0 + displacement;
    if config.overshoot_clamping {
        value.min(1.0)
    } else {
        value
    }
}

/// Background-music fade in / hold / fade out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeEnvelope {
    pub fade_in_frames: u32,
    pub fade_out_frames: u32,
    pub level: f64,
}

impl VolumeEnvelope {
    pub fn new(fade_in_frames: u32, fade_out_frames: u32, level: f64) -> Self {
        VolumeEnvelope {
            fade_in_frames,
            fade_out_frames,
            level,
        }
    }

    /// Volume at `frame` for a timeline of `total_frames`.
    pub fn volume_at(&self, frame: f64, total_frames: u32) -> f64 {
        let total = total_frames as f64;
        let fade_in = self.fade_in_frames as f64;
        let fade_out_start = total - self.fade_out_frames as f64;

        let points = if fade_in < fade_out_start {
            vec![
                Breakpoint::new(0.0, 0.0),
                Breakpoint::new(fade_in, self.level),
                Breakpoint::new(fade_out_start, self.level),
                Breakpoint::new(total, 0.0),
            ]
        } else {
            // Fades overlap: peak halfway.
            vec![
                Breakpoint::new(0.0, 0.0),
                Breakpoint::new(total / 2.0, self.level),
                Breakpoint::new(total, 0.0),
            ]
        };
        interpolate(frame, &points, &InterpolateOptions::clamped())
    }
}

/// Rounded count-up from `from` to `to` over `duration` frames starting at `start`.
pub fn counter_value(frame: f64, start: f64, duration: f64, from: f64, to: f64) -> i64 {
    let points = [
        Breakpoint::new(start, from),
        Breakpoint::new(start + duration.max(1.0), to),
    ];
    interpolate(frame, &points, &InterpolateOptions::clamped()).round() as i64
}

/// Characters of a `len`-character string visible at `frame` when typing at `speed` chars/frame.
pub fn typewriter_chars(frame: f64, start: f64, speed: f64, len: usize) -> usize {
    let elapsed = (frame - start).max(0.0);
    let typed = (elapsed * speed.max(0.0)).floor() as usize;
    typed.min(len)
}

/// 1 Hz cursor blink: visible for the first half-second of every second.
pub fn cursor_visible(frame: u32, fps: u32) -> bool {
    let half_cycle = (fps / 2).max(1);
    frame % (half_cycle * 2) < half_cycle
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn table(pairs: &[(f64, f64)]) -> Vec<Breakpoint> {
        pairs.iter().map(|&(f, v)| Breakpoint::new(f, v)).collect()
    }

    #[test]
    fn midpoint_and_clamped_ends() {
        let points = table(&[(0.0, 0.0), (10.0, 100.0)]);
        let opts = InterpolateOptions::clamped();
        assert_eq!(interpolate(5.0, &points, &opts), 50.0);
        assert_eq!(interpolate(-3.0, &points, &opts), 0.0);
        assert_eq!(interpolate(20.0, &points, &opts), 100.0);
    }

    #[test]
    fn empty_and_single_point_tables() {
        let opts = InterpolateOptions::clamped();
        assert_eq!(interpolate(4.0, &[], &opts), 0.0);
        let single = table(&[(7.0, 42.0)]);
        assert_eq!(interpolate(-100.0, &single, &opts), 42.0);
        assert_eq!(interpolate(7.0, &single, &opts), 42.0);
        assert_eq!(interpolate(1e9, &single, &opts), 42.0);
    }

    #[test]
    fn zero_width_segment_does_not_divide_by_zero() {
        let points = table(&[(0.0, 0.0), (5.0, 10.0), (5.0, 20.0)]);
        let value = interpolate(5.0, &points, &InterpolateOptions::clamped());
        assert!(value.is_finite());
    }

    #[test]
    fn independent_extrapolation_sides() {
        let points = table(&[(0.0, 0.0), (10.0, 100.0)]);
        let opts = InterpolateOptions {
            extrapolate_left: Extrapolate::Clamp,
            extrapolate_right: Extrapolate::Extend,
            easing: Easing::Linear,
        };
        assert_eq!(interpolate(-5.0, &points, &opts), 0.0);
        assert_eq!(interpolate(15.0, &points, &opts), 150.0);

        let identity = InterpolateOptions {
            extrapolate_left: Extrapolate::Identity,
            ..Default::default()
        };
        assert_eq!(interpolate(-5.0, &points, &identity), -5.0);
    }

    #[test]
    fn multi_segment_tables() {
        // Level-up flash: 0 -> 0.7 -> 0.
        let points = table(&[(120.0, 0.0), (130.0, 0.7), (140.0, 0.0)]);
        let opts = InterpolateOptions::clamped();
        assert!((interpolate(125.0, &points, &opts) - 0.35).abs() < 1e-12);
        assert!((interpolate(130.0, &points, &opts) - 0.7).abs() < 1e-12);
        assert!((interpolate(135.0, &points, &opts) - 0.35).abs() < 1e-12);
    }

    #[test]
    fn easing_bounds() {
        for easing in [Easing::Linear, Easing::EaseOut, Easing::EaseInOut, Easing::Spring] {
            let start = easing.apply(0.0);
            let end = easing.apply(1.0);
            assert!((-0.1..=0.1).contains(&start), "Easing start should be ~0");
            assert!((0.9..=1.1).contains(&end), "Easing end should be ~1");
        }
    }

    #[test]
    fn table_rejects_unordered_frames() {
        let result = BreakpointTable::new(table(&[(0.0, 0.0), (0.0, 1.0)]));
        assert!(matches!(result, Err(EngineError::InvalidBreakpoints(_))));
        let result = BreakpointTable::new(Vec::new());
        assert!(result.is_err());
        let result = BreakpointTable::new(table(&[(0.0, f64::NAN)]));
        assert!(result.is_err());
    }

    #[test]
    fn table_from_ranges_checks_lengths() {
        assert!(BreakpointTable::from_ranges(&[0.0, 10.0], &[0.0]).is_err());
        let t = BreakpointTable::from_ranges(&[50.0, 80.0], &[0.0, 22500.0]).unwrap();
        assert_eq!(t.value_at(65.0, &InterpolateOptions::clamped()), 11250.0);
    }

    #[test]
    fn table_deserialization_validates() {
        let ok: Result<BreakpointTable, _> =
            serde_json::from_str(r#"{"points":[{"frame":0,"value":0},{"frame":10,"value":1}]}"#);
        assert!(ok.is_ok());
        let bad: Result<BreakpointTable, _> =
            serde_json::from_str(r#"{"points":[{"frame":10,"value":0},{"frame":0,"value":1}]}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn table_accepts_bare_array_and_object_forms() {
        let bare: BreakpointTable =
            serde_json::from_str(r#"[{"frame":0,"value":0},{"frame":10,"value":100}]"#).unwrap();
        let wrapped: BreakpointTable =
            serde_json::from_str(r#"{"points":[{"frame":0,"value":0},{"frame":10,"value":100}]}"#)
                .unwrap();
        let opts = InterpolateOptions::clamped();
        assert_eq!(bare.value_at(5.0, &opts), 50.0);
        assert_eq!(wrapped.value_at(5.0, &opts), 50.0);
        assert_eq!(bare, wrapped);

        // Serialized form parses back.
        let again: BreakpointTable = serde_json::from_str(&serde_json::to_string(&bare).unwrap()).unwrap();
        assert_eq!(again, bare);

        assert!(serde_json::from_str::<BreakpointTable>("[]").is_err());
        assert!(serde_json::from_str::<BreakpointTable>(
            r#"[{"frame":10,"value":0},{"frame":0,"value":1}]"#
        )
        .is_err());
    }

    #[test]
    fn spring_settles_at_one() {
        let config = SpringConfig::new(12.0, 180.0);
        assert_eq!(spring(0.0, 30.0, &config), 0.0);
        assert_eq!(spring(-5.0, 30.0, &config), 0.0);
        assert!((spring(300.0, 30.0, &config) - 1.0).abs() < 1e-3);
    }

    #[test]
    fn bouncy_spring_overshoots_unless_clamped() {
        let bouncy = SpringConfig::new(5.0, 250.0);
        let peak = (0..60)
            .map(|f| spring(f as f64, 30.0, &bouncy))
            .fold(f64::MIN, f64::max);
        assert!(peak > 1.0);

        let clamped = SpringConfig {
            overshoot_clamping: true,
            ..bouncy
        };
        let peak = (0..60)
            .map(|f| spring(f as f64, 30.0, &clamped))
            .fold(f64::MIN, f64::max);
        assert!(peak <= 1.0);
    }

    #[test]
    fn overdamped_and_critical_springs_do_not_overshoot() {
        for damping in [20.0, 40.0] {
            // stiffness 100, mass 1: critical damping is 20.
            let config = SpringConfig::new(damping, 100.0);
            for f in 0..120 {
                let v = spring(f as f64, 30.0, &config);
                assert!(v <= 1.0 + 1e-9, "damping {} overshot at frame {}: {}", damping, f, v);
            }
        }
    }

    #[test]
    fn volume_envelope_fades() {
        let env = VolumeEnvelope::new(10, 10, 0.25);
        assert_eq!(env.volume_at(0.0, 310), 0.0);
        assert_eq!(env.volume_at(10.0, 310), 0.25);
        assert_eq!(env.volume_at(150.0, 310), 0.25);
        assert_eq!(env.volume_at(310.0, 310), 0.0);
        assert!((env.volume_at(305.0, 310) - 0.125).abs() < 1e-12);
    }

    #[test]
    fn volume_envelope_short_timeline() {
        let env = VolumeEnvelope::new(10, 10, 0.5);
        assert_eq!(env.volume_at(6.0, 12), 0.5);
        assert_eq!(env.volume_at(12.0, 12), 0.0);
    }

    #[test]
    fn counter_and_typewriter() {
        assert_eq!(counter_value(50.0, 50.0, 30.0, 0.0, 22500.0), 0);
        assert_eq!(counter_value(95.0, 50.0, 30.0, 0.0, 22500.0), 22500);
        assert_eq!(counter_value(65.0, 50.0, 30.0, 0.0, 22500.0), 11250);

        assert_eq!(typewriter_chars(0.0, 10.0, 0.5, 20), 0);
        assert_eq!(typewriter_chars(20.0, 10.0, 0.5, 20), 5);
        assert_eq!(typewriter_chars(1000.0, 10.0, 0.5, 20), 20);
    }

    #[test]
    fn cursor_blinks_at_one_hertz() {
        assert!(cursor_visible(0, 30));
        assert!(cursor_visible(14, 30));
        assert!(!cursor_visible(15, 30));
        assert!(!cursor_visible(29, 30));
        assert!(cursor_visible(30, 30));
        // Degenerate frame rate never divides by zero.
        assert!(cursor_visible(0, 1));
    }

    mod property_tests {
        use super::*;

        fn sorted_table_strategy() -> impl Strategy<Value = Vec<Breakpoint>> {
            prop::collection::vec((1.0f64..50.0, -1000.0f64..1000.0), 1..8).prop_map(|steps| {
                let mut frame = 0.0;
                steps
                    .into_iter()
                    .map(|(step, value)| {
                        frame += step;
                        Breakpoint::new(frame, value)
                    })
                    .collect()
            })
        }

        proptest! {
            /// Same frame and table always produce bit-identical output.
            #[test]
            fn interpolation_is_deterministic(
                points in sorted_table_strategy(),
                frame in -500.0f64..1000.0,
            ) {
                let opts = InterpolateOptions::clamped();
                let a = interpolate(frame, &points, &opts);
                let b = interpolate(frame, &points, &opts);
                prop_assert_eq!(a.to_bits(), b.to_bits());
            }

            /// Frames before the first breakpoint clamp to its value, after the last to the last value.
            #[test]
            fn clamping_holds_edge_values(
                points in sorted_table_strategy(),
                before in 1.0f64..500.0,
                after in 1.0f64..500.0,
            ) {
                let opts = InterpolateOptions::clamped();
                let first = points[0];
                let last = points[points.len() - 1];
                prop_assert_eq!(interpolate(first.frame - before, &points, &opts), first.value);
                prop_assert_eq!(interpolate(last.frame + after, &points, &opts), last.value);
            }

            /// Linear interpolation never leaves the range spanned by the table's values.
            #[test]
            fn linear_output_stays_within_value_range(
                points in sorted_table_strategy(),
                frame in -500.0f64..1000.0,
            ) {
                let min = points.iter().map(|p| p.value).fold(f64::INFINITY, f64::min);
                let max = points.iter().map(|p| p.value).fold(f64::NEG_INFINITY, f64::max);
                let v = interpolate(frame, &points, &InterpolateOptions::clamped());
                prop_assert!(v >= min - 1e-9 && v <= max + 1e-9);
            }
        }
    }
}
