// RPG profile view derivation: XP bar fill, next title, sprite variant, and avatar fallback chains.
// Profiles are produced by the external progression engine and only ever read here.
// See DESIGN.md: profile

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// RPG class specialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RpgClass {
    #[default]
    Builder,
    Scribe,
    Strategist,
    Alchemist,
    Polymath,
}

impl RpgClass {
    pub const ALL: [RpgClass; 5] = [
        RpgClass::Builder,
        RpgClass::Scribe,
        RpgClass::Strategist,
        RpgClass::Alchemist,
        RpgClass::Polymath,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RpgClass::Builder => "Builder",
            RpgClass::Scribe => "Scribe",
            RpgClass::Strategist => "Strategist",
            RpgClass::Alchemist => "Alchemist",
            RpgClass::Polymath => "Polymath",
        }
    }

    pub fn parse(name: &str) -> Option<RpgClass> {
        RpgClass::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
    }
}

/// A single milestone achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// ISO-8601.
    #[serde(default)]
    pub unlocked_at: String,
}

/// Profile as written by the progression engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpgProfile {
    pub name: String,
    pub title: String,
    pub level: u32,
    pub xp_total: u64,
    pub xp_next_level: u64,
    pub class: RpgClass,
    /// 0 means the engine has not assigned a tier yet.
    pub avatar_tier: u8,
    pub milestones: Vec<Milestone>,
    /// ISO-8601, empty until the first engine run.
    pub updated_at: String,
}

impl Default for RpgProfile {
    /// Placeholder used when the progression engine hasn't run yet.
    fn default() -> Self {
        RpgProfile {
            name: "Operator".to_string(),
            title: "Terminal Initiate".to_string(),
            level: 0,
            xp_total: 0,
            xp_next_level: 100,
            class: RpgClass::Builder,
            avatar_tier: 0,
            milestones: Vec::new(),
            updated_at: String::new(),
        }
    }
}

impl RpgProfile {
    /// Lenient read: every missing or mistyped field falls back to the default profile.
    pub fn from_value(raw: &Value) -> RpgProfile {
        let defaults = RpgProfile::default();
        let str_field = |key: &str, fallback: &str| {
            raw.get(key)
                .and_then(Value::as_str)
                .unwrap_or(fallback)
                .to_string()
        };
        let u64_field = |key: &str, fallback: u64| {
            raw.get(key)
                .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f.max(0.0) as u64)))
                .unwrap_or(fallback)
        };

        let milestones = raw
            .get("milestones")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|m| serde_json::from_value::<Milestone>(m.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        RpgProfile {
            name: str_field("name", &defaults.name),
            title: str_field("title", &defaults.title),
            level: u64_field("level", defaults.level as u64).min(u32::MAX as u64) as u32,
            xp_total: u64_field("xp_total", defaults.xp_total),
            xp_next_level: u64_field("xp_next_level", defaults.xp_next_level),
            class: raw
                .get("class")
                .and_then(Value::as_str)
                .and_then(RpgClass::parse)
                .unwrap_or(defaults.class),
            avatar_tier: u64_field("avatar_tier", defaults.avatar_tier as u64).min(MAX_AVATAR_TIER as u64)
                as u8,
            milestones,
            updated_at: str_field("updated_at", &defaults.updated_at),
        }
    }

    pub fn latest_milestone(&self) -> Option<&Milestone> {
        self.milestones.iter().max_by(|a, b| a.unlocked_at.cmp(&b.unlocked_at))
    }
}

/// Read `profile.json`. Missing or malformed files mean "not yet available".
pub fn load_profile(path: &Path) -> Option<RpgProfile> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Profile not available");
            return None;
        }
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(value) if value.is_object() => Some(RpgProfile::from_value(&value)),
        Ok(_) => {
            tracing::warn!(path = %path.display(), "Profile is not a JSON object, treating as missing");
            None
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Malformed profile, treating as missing");
            None
        }
    }
}

pub const MAX_AVATAR_TIER: u8 = 6;

/// One row of the title progression table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TitleTier {
    pub level: u32,
    pub title: &'static str,
    pub xp_required: u64,
    pub avatar_tier: u8,
}

const fn tier(level: u32, title: &'static str, xp_required: u64, avatar_tier: u8) -> TitleTier {
    TitleTier {
        level,
        title,
        xp_required,
        avatar_tier,
    }
}

/// Title progression. Two rows per avatar tier (early, advanced), tier 6 has one.
pub const TITLE_TABLE: [TitleTier; 11] = [
    tier(1, "Terminal Initiate", 0, 1),
    tier(5, "Prompt Apprentice", 500, 1),
    tier(10, "Repo Architect", 2_000, 2),
    tier(15, "Pipeline Runner", 5_000, 2),
    tier(20, "Context Weaver", 10_000, 3),
    tier(25, "Skill Forger", 18_000, 3),
    tier(30, "Voice Alchemist", 30_000, 4),
    tier(35, "System Sovereign", 50_000, 4),
    tier(40, "OS Architect", 80_000, 5),
    tier(45, "Cursor Slayer", 120_000, 5),
    tier(50, "Grand Master Cursor Slayer", 200_000, 6),
];

/// XP bar fill in `[0, 100]`, even when `xp_total` overshoots `xp_next_level`.
pub fn xp_percent(xp_total: u64, xp_next_level: u64) -> f64 {
    if xp_next_level == 0 {
        return 0.0;
    }
    (xp_total as f64 / xp_next_level as f64 * 100.0).clamp(0.0, 100.0)
}

/// First title strictly above `level`.
pub fn next_title(level: u32) -> Option<&'static TitleTier> {
    TITLE_TABLE.iter().find(|row| row.level > level)
}

/// Highest title row reached at `level`.
pub fn current_title_row(level: u32) -> Option<(usize, &'static TitleTier)> {
    TITLE_TABLE
        .iter()
        .enumerate()
        .rev()
        .find(|(_, row)| row.level <= level)
}

/// Sprite variant within a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvatarVariant {
    Early,
    Advanced,
}

/// Row `(tier - 1) * 2` of the title table is the early sprite, the next row is advanced.
/// Tier 6 only has the advanced sprite.
pub fn is_advanced_variant(level: u32, avatar_tier: u8) -> bool {
    if avatar_tier == MAX_AVATAR_TIER {
        return true;
    }
    match current_title_row(level) {
        // The row's own tier decides; level can land in a different tier's row.
        Some((index, row)) => index == (row.avatar_tier as usize - 1) * 2 + 1,
        None => false,
    }
}

pub fn avatar_variant(level: u32, avatar_tier: u8) -> AvatarVariant {
    if is_advanced_variant(level, avatar_tier) {
        AvatarVariant::Advanced
    } else {
        AvatarVariant::Early
    }
}

/// Accent color for badges, borders, title text, and XP bar fill.
pub fn tier_color(tier: u8, variant: AvatarVariant) -> String {
    let base = match tier {
        2 => "#10B981",
        3 => "#06B6D4",
        4 => "#F59E0B",
        5 => "#8B5CF6",
        6 => "#FBBF24",
        _ => "#64748B",
    };
    match variant {
        AvatarVariant::Advanced => format!("color-mix(in srgb, {}, #e06060 15%)", base),
        AvatarVariant::Early => base.to_string(),
    }
}

const AVATAR_BASE: &str = "/progression/avatars";

/// What a fallback candidate points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    IdleGif,
    ActionGif,
    StaticPng,
    /// Blinking-cursor boot placeholder. Always renderable.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetCandidate {
    pub kind: AssetKind,
    pub url: Option<String>,
}

impl AssetCandidate {
    fn file(kind: AssetKind, url: String) -> Self {
        AssetCandidate {
            kind,
            url: Some(url),
        }
    }

    fn placeholder() -> Self {
        AssetCandidate {
            kind: AssetKind::Placeholder,
            url: None,
        }
    }
}

/// Ordered fallback chains, best asset first. The host walks them lazily.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarAssets {
    pub idle: Vec<AssetCandidate>,
    pub action: Vec<AssetCandidate>,
    pub still: Vec<AssetCandidate>,
}

impl AvatarAssets {
    pub fn for_tier(tier: u8, variant: AvatarVariant) -> Self {
        let tier = tier.clamp(1, MAX_AVATAR_TIER);
        let url = |kind: &str, ext: &str, advanced: bool| {
            let suffix = if advanced { "-advanced" } else { "" };
            format!("{}/tier-{}-{}{}.{}", AVATAR_BASE, tier, kind, suffix, ext)
        };
        let advanced = variant == AvatarVariant::Advanced;

        // Advanced assets fall back to the early ones of the same tier.
        let chain = |kind: AssetKind, name: &str, ext: &str| {
            let mut chain = vec![AssetCandidate::file(kind, url(name, ext, advanced))];
            if advanced {
                chain.push(AssetCandidate::file(kind, url(name, ext, false)));
            }
            chain
        };

        let mut still = chain(AssetKind::StaticPng, "static", "png");
        still.push(AssetCandidate::placeholder());

        let mut idle = chain(AssetKind::IdleGif, "idle", "gif");
        idle.extend(still.iter().cloned());

        let mut action = chain(AssetKind::ActionGif, "action", "gif");
        action.extend(idle.iter().cloned());

        AvatarAssets {
            idle,
            action,
            still,
        }
    }

    /// Class sprites have no action animation or variants; action falls back to idle.
    pub fn for_class(class: RpgClass) -> Self {
        let name = class.as_str().to_lowercase();
        let still = vec![
            AssetCandidate::file(
                AssetKind::StaticPng,
                format!("{}/class-{}-static.png", AVATAR_BASE, name),
            ),
            AssetCandidate::placeholder(),
        ];
        let mut idle = vec![AssetCandidate::file(
            AssetKind::IdleGif,
            format!("{}/class-{}-idle.gif", AVATAR_BASE, name),
        )];
        idle.extend(still.iter().cloned());
        AvatarAssets {
            action: idle.clone(),
            idle,
            still,
        }
    }

    /// Only the placeholder: nothing to load yet.
    pub fn placeholder() -> Self {
        AvatarAssets {
            idle: vec![AssetCandidate::placeholder()],
            action: vec![AssetCandidate::placeholder()],
            still: vec![AssetCandidate::placeholder()],
        }
    }

    /// First candidate the host reports as available. The placeholder always is.
    pub fn first_available<'a, F>(chain: &'a [AssetCandidate], mut available: F) -> &'a AssetCandidate
    where
        F: FnMut(&str) -> bool,
    {
        static PLACEHOLDER: AssetCandidate = AssetCandidate {
            kind: AssetKind::Placeholder,
            url: None,
        };
        chain
            .iter()
            .find(|c| match &c.url {
                Some(url) => available(url),
                None => true,
            })
            .unwrap_or(&PLACEHOLDER)
    }
}

/// Display state of the avatar badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProfileView {
    /// No profile yet: boot-sequence placeholder.
    Initializing { prompt: String },
    Ready(ReadyProfile),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextTitle {
    pub title: String,
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadyProfile {
    pub name: String,
    pub title: String,
    pub level: u32,
    pub class: RpgClass,
    pub avatar_tier: u8,
    pub variant: AvatarVariant,
    pub accent_color: String,
    /// `None` when the profile has no next-level target.
    pub xp_percent: Option<f64>,
    pub next_title: Option<NextTitle>,
    pub assets: AvatarAssets,
    pub milestone_count: usize,
    pub latest_milestone: Option<String>,
}

impl ProfileView {
    /// Pure derivation from an optional profile.
    pub fn derive(profile: Option<&RpgProfile>) -> ProfileView {
        let profile = match profile {
            Some(p) if p.level > 0 => p,
            _ => {
                return ProfileView::Initializing {
                    prompt: "> initializing...".to_string(),
                }
            }
        };

        let variant = avatar_variant(profile.level, profile.avatar_tier);
        let tier = profile.avatar_tier.max(1);
        ProfileView::Ready(ReadyProfile {
            name: profile.name.clone(),
            title: profile.title.clone(),
            level: profile.level,
            class: profile.class,
            avatar_tier: profile.avatar_tier,
            variant,
            // Badge accent uses the base tier color; advanced tint is for sprite frames.
            accent_color: tier_color(profile.avatar_tier, AvatarVariant::Early),
            xp_percent: (profile.xp_next_level > 0)
                .then(|| xp_percent(profile.xp_total, profile.xp_next_level)),
            next_title: next_title(profile.level).map(|row| NextTitle {
                title: row.title.to_string(),
                level: row.level,
            }),
            assets: AvatarAssets::for_tier(tier, variant),
            milestone_count: profile.milestones.len(),
            latest_milestone: profile.latest_milestone().map(|m| m.title.clone()),
        })
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ProfileView::Ready(_))
    }
}

// -----------------------------------------------------------------------------
// v2 engine output
// -----------------------------------------------------------------------------

/// Per-day scoring record from the v2 engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct V2ScoringEntry {
    pub date: String,
    pub raw_score: f64,
    pub v1_grade: String,
    pub v2_grade: String,
    pub chain_length: u32,
    pub chain_mult: f64,
    pub efficiency_bonus: f64,
    pub velocity_bonus: f64,
    pub ship_bonus: f64,
    pub total_mult: f64,
    pub v2_xp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct V2Meta {
    pub engine_version: String,
    pub v1_xp_total: u64,
    pub xp_delta: i64,
    pub current_ascending_chain: u32,
    pub chain_multiplier: f64,
    pub longest_chain: u32,
    pub class_window: String,
    #[serde(default)]
    pub class_breakdown: std::collections::BTreeMap<String, f64>,
    #[serde(default)]
    pub grade_thresholds: std::collections::BTreeMap<String, f64>,
    #[serde(default)]
    pub scoring_log: Vec<V2ScoringEntry>,
}

/// `profile-v2.json`: the v1 profile plus engine metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpgProfileV2 {
    #[serde(flatten)]
    pub profile: RpgProfile,
    pub v2_meta: V2Meta,
}

/// Read `profile-v2.json`, `None` when missing or malformed.
pub fn load_profile_v2(path: &Path) -> Option<RpgProfileV2> {
    let raw = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(profile) => Some(profile),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Malformed v2 profile, treating as missing");
            None
        }
    }
}

/// v2 grade thresholds, highest first.
pub const GRADE_THRESHOLDS_V2: [(&str, f64); 7] = [
    ("S+", 850.0),
    ("S", 600.0),
    ("A+", 450.0),
    ("A", 300.0),
    ("B", 150.0),
    ("C", 50.0),
    ("D", 0.0),
];

pub fn grade_for_score_v2(score: f64) -> &'static str {
    GRADE_THRESHOLDS_V2
        .iter()
        .find(|(_, min)| score >= *min)
        .map(|(grade, _)| *grade)
        .unwrap_or("D")
}

pub fn grade_color_v2(grade: &str) -> &'static str {
    match grade {
        "S+" => "#FBBF24",
        "S" => "#8B5CF6",
        "A+" => "#06B6D4",
        "A" => "#10B981",
        "B" => "#64748B",
        "C" => "#94A3B8",
        _ => "#475569",
    }
}
