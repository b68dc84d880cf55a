// Website vitals: per-site stats, aggregate score, and Nio tier progression.
// See DESIGN.md: vitals

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalFeature {
    pub name: String,
    pub description: String,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteStats {
    pub name: String,
    pub accent: String,
    pub score: u32,
    pub grade: String,
    /// Lines of code by language.
    pub loc: BTreeMap<String, u64>,
    pub routes: u32,
    #[serde(default)]
    pub route_list: Vec<String>,
    pub components: u32,
    pub api_endpoints: u32,
    #[serde(default)]
    pub api_endpoint_list: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    pub feature_count: u32,
}

impl SiteStats {
    pub fn total_loc(&self) -> u64 {
        total_loc(&self.loc)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NioProgress {
    pub current: u32,
    pub needed: u32,
    pub percent: f64,
    pub next_tier: Option<u8>,
    pub next_tier_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedStats {
    pub components: u32,
    #[serde(default)]
    pub component_list: Vec<String>,
    pub design_tokens: u32,
    pub loc: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfraStats {
    pub monorepo: bool,
    pub vercel_sites: u32,
    pub total_loc: u64,
    pub loc_by_language: BTreeMap<String, u64>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub technical_features: Vec<TechnicalFeature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sites {
    pub shawnos: SiteStats,
    pub gtmos: SiteStats,
    pub contentos: SiteStats,
}

impl Sites {
    pub fn iter(&self) -> impl Iterator<Item = &SiteStats> {
        [&self.shawnos, &self.gtmos, &self.contentos].into_iter()
    }
}

/// `website-stats.json` as written by the stats collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsiteStats {
    pub generated_at: String,
    pub total_score: u32,
    pub grade: String,
    pub nio_tier: u8,
    pub nio_tier_name: String,
    pub nio_progress: NioProgress,
    pub sites: Sites,
    pub shared: SharedStats,
    pub infra: InfraStats,
}

impl WebsiteStats {
    /// Tier implied by `total_score`, which may disagree with a stale `nio_tier`.
    pub fn derived_tier(&self) -> &'static NioTier {
        nio_tier_for_score(self.total_score)
    }

    /// Summed LOC across all three sites and the shared packages.
    pub fn combined_loc(&self) -> u64 {
        self.sites.iter().map(SiteStats::total_loc).sum::<u64>() + total_loc(&self.shared.loc)
    }
}

pub fn total_loc(loc: &BTreeMap<String, u64>) -> u64 {
    loc.values().sum()
}

/// One Nio evolution tier. `max_score` is exclusive; `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NioTier {
    pub tier: u8,
    pub name: &'static str,
    pub min_score: u32,
    pub max_score: Option<u32>,
}

pub const NIO_TIERS: [NioTier; 5] = [
    NioTier {
        tier: 1,
        name: "Spark",
        min_score: 0,
        max_score: Some(10_000),
    },
    NioTier {
        tier: 2,
        name: "Blade",
        min_score: 10_000,
        max_score: Some(20_000),
    },
    NioTier {
        tier: 3,
        name: "Warden",
        min_score: 20_000,
        max_score: Some(35_000),
    },
    NioTier {
        tier: 4,
        name: "Sentinel",
        min_score: 35_000,
        max_score: Some(50_000),
    },
    NioTier {
        tier: 5,
        name: "Ascended",
        min_score: 50_000,
        max_score: None,
    },
];

pub fn nio_tier_for_score(score: u32) -> &'static NioTier {
    NIO_TIERS
        .iter()
        .rev()
        .find(|t| score >= t.min_score)
        .unwrap_or(&NIO_TIERS[0])
}

/// Progress toward the next tier. At the top tier progress is 100%.
pub fn nio_progress(score: u32) -> NioProgress {
    let tier = nio_tier_for_score(score);
    let next = NIO_TIERS.iter().find(|t| t.tier == tier.tier + 1);
    match (tier.max_score, next) {
        (Some(max), Some(next)) => {
            let span = max - tier.min_score;
            let current = score - tier.min_score;
            NioProgress {
                current,
                needed: span,
                percent: (current as f64 / span as f64 * 100.0).clamp(0.0, 100.0),
                next_tier: Some(next.tier),
                next_tier_name: Some(next.name.to_string()),
            }
        }
        _ => NioProgress {
            current: score - tier.min_score,
            needed: 0,
            percent: 100.0,
            next_tier: None,
            next_tier_name: None,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NioAvatarUrls {
    pub idle: String,
    pub still: String,
}

/// Tier is clamped into `1..=5`.
pub fn nio_avatar_urls(tier: i64) -> NioAvatarUrls {
    let t = tier.clamp(1, NIO_TIERS.len() as i64);
    NioAvatarUrls {
        idle: format!("/progression/avatars/nio-tier-{}-idle.gif", t),
        still: format!("/progression/avatars/nio-tier-{}-static.png", t),
    }
}

pub fn grade_color(grade: &str) -> &'static str {
    match grade {
        "S" => "#FBBF24",
        "A" => "#8B5CF6",
        "B" => "#10B981",
        "C" => "#06B6D4",
        "D" => "#F59E0B",
        "F" => "#EF4444",
        _ => "#64748B",
    }
}

/// Read and parse `website-stats.json`.
pub fn read_website_stats(path: &Path) -> Result<WebsiteStats, EngineError> {
    let raw = std::fs::read_to_string(path).map_err(|e| EngineError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let stats: WebsiteStats = serde_json::from_str(&raw)?;
    if stats.derived_tier().tier != stats.nio_tier {
        tracing::warn!(
            declared = stats.nio_tier,
            derived = stats.derived_tier().tier,
            score = stats.total_score,
            "Stored Nio tier disagrees with total score"
        );
    }
    Ok(stats)
}

/// Missing or malformed stats mean "not yet generated".
pub fn load_website_stats(path: &Path) -> Option<WebsiteStats> {
    match read_website_stats(path) {
        Ok(stats) => Some(stats),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Website stats not available");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn site(name: &str, loc: &[(&str, u64)]) -> SiteStats {
        SiteStats {
            name: name.to_string(),
            accent: "#4ADE80".to_string(),
            score: 4_000,
            grade: "A".to_string(),
            loc: loc.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            routes: 12,
            route_list: vec!["/".to_string()],
            components: 30,
            api_endpoints: 2,
            api_endpoint_list: vec![],
            features: vec![],
            feature_count: 0,
        }
    }

    fn stats() -> WebsiteStats {
        WebsiteStats {
            generated_at: "2026-02-01T00:00:00Z".to_string(),
            total_score: 21_500,
            grade: "A".to_string(),
            nio_tier: 3,
            nio_tier_name: "Warden".to_string(),
            nio_progress: nio_progress(21_500),
            sites: Sites {
                shawnos: site("shawnos", &[("tsx", 1_000), ("ts", 500)]),
                gtmos: site("gtmos", &[("tsx", 800)]),
                contentos: site("contentos", &[]),
            },
            shared: SharedStats {
                components: 10,
                component_list: vec![],
                design_tokens: 40,
                loc: [("ts".to_string(), 200)].into_iter().collect(),
            },
            infra: InfraStats {
                monorepo: true,
                vercel_sites: 3,
                total_loc: 2_500,
                loc_by_language: BTreeMap::new(),
                languages: vec!["TypeScript".to_string()],
                technical_features: vec![],
            },
        }
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(nio_tier_for_score(0).name, "Spark");
        assert_eq!(nio_tier_for_score(9_999).tier, 1);
        assert_eq!(nio_tier_for_score(10_000).name, "Blade");
        assert_eq!(nio_tier_for_score(34_999).name, "Warden");
        assert_eq!(nio_tier_for_score(50_000).name, "Ascended");
        assert_eq!(nio_tier_for_score(u32::MAX).tier, 5);
    }

    #[test]
    fn progress_within_and_at_top() {
        let p = nio_progress(25_000);
        assert_eq!(p.current, 5_000);
        assert_eq!(p.needed, 15_000);
        assert_eq!(p.next_tier_name.as_deref(), Some("Sentinel"));

        let top = nio_progress(60_000);
        assert_eq!(top.next_tier, None);
        assert_eq!(top.percent, 100.0);
    }

    #[test]
    fn avatar_tier_is_clamped() {
        assert_eq!(
            nio_avatar_urls(0).idle,
            "/progression/avatars/nio-tier-1-idle.gif"
        );
        assert_eq!(
            nio_avatar_urls(9).still,
            "/progression/avatars/nio-tier-5-static.png"
        );
        assert_eq!(
            nio_avatar_urls(3).idle,
            "/progression/avatars/nio-tier-3-idle.gif"
        );
    }

    #[test]
    fn grade_colors() {
        assert_eq!(grade_color("S"), "#FBBF24");
        assert_eq!(grade_color("F"), "#EF4444");
        assert_eq!(grade_color("Z"), "#64748B");
    }

    #[test]
    fn loc_sums() {
        let s = stats();
        assert_eq!(s.sites.shawnos.total_loc(), 1_500);
        assert_eq!(s.sites.contentos.total_loc(), 0);
        assert_eq!(s.combined_loc(), 2_500);
        assert_eq!(s.derived_tier().name, "Warden");
    }

    #[test]
    fn load_round_trips_through_disk() {
        let dir = std::env::temp_dir().join(format!("reel-engine-vitals-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("website-stats.json");
        std::fs::write(&path, serde_json::to_string(&stats()).unwrap()).unwrap();

        let loaded = load_website_stats(&path).unwrap();
        assert_eq!(loaded.sites.gtmos.total_loc(), 800);

        assert!(matches!(
            read_website_stats(&dir.join("missing.json")),
            Err(EngineError::Io { .. })
        ));
        assert!(load_website_stats(&dir.join("missing.json")).is_none());

        let bad = dir.join("bad.json");
        std::fs::write(&bad, r#"{"total_score": "lots"}"#).unwrap();
        assert!(matches!(
            read_website_stats(&bad),
            Err(EngineError::Serialization(_))
        ));
        std::fs::remove_dir_all(&dir).ok();
    }

    proptest! {
        #[test]
        fn tier_contains_score(score in 0u32..200_000) {
            let tier = nio_tier_for_score(score);
            prop_assert!(score >= tier.min_score);
            if let Some(max) = tier.max_score {
                prop_assert!(score < max);
            }
            let p = nio_progress(score);
            prop_assert!((0.0..=100.0).contains(&p.percent));
        }
    }
}
