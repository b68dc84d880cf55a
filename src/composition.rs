// Render surface: named compositions bound to a timing table, frame rate, and output size.
// See DESIGN.md: composition

use serde::{Deserialize, Serialize};

use crate::composer::Timeline;
use crate::error::EngineError;
use crate::scale::ScaleFactors;
use crate::timing::TimingTable;
use crate::types::{Dimensions, Fps, RenderPreset};

/// One registered composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionSpec {
    pub id: String,
    /// Id of the timing table driving the scenes.
    pub timing_table: String,
    pub duration_in_frames: u32,
    pub fps: Fps,
    pub width: u32,
    pub height: u32,
}

impl CompositionSpec {
    fn from_table(id: &str, table: &TimingTable, preset: RenderPreset) -> Self {
        let dimensions = preset.dimensions();
        CompositionSpec {
            id: id.to_string(),
            timing_table: table.id.clone(),
            duration_in_frames: table.declared_total_frames,
            fps: table.fps,
            width: dimensions.width,
            height: dimensions.height,
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    pub fn scale(&self) -> ScaleFactors {
        ScaleFactors::for_dimensions(self.dimensions())
    }

    pub fn duration_secs(&self) -> f64 {
        self.fps.secs_for_frames(self.duration_in_frames)
    }
}

/// Compositions plus the timing tables they reference.
#[derive(Debug, Clone, Default)]
pub struct CompositionRegistry {
    tables: Vec<TimingTable>,
    compositions: Vec<CompositionSpec>,
}

impl CompositionRegistry {
    pub fn new() -> Self {
        CompositionRegistry::default()
    }

    /// Every composition rendered by the video app.
    pub fn builtin() -> Self {
        let mut registry = CompositionRegistry::new();
        for table in TimingTable::builtin_tables() {
            registry.add_table(table);
        }

        let mut register = |id: &str, table_id: &str, preset: RenderPreset| {
            if let Some(table) = registry.tables.iter().find(|t| t.id == table_id) {
                let spec = CompositionSpec::from_table(id, table, preset);
                registry.compositions.push(spec);
            }
        };
        register("LeadMagnet", "lead-magnet-v1", RenderPreset::Linkedin);
        register("LeadMagnetReels", "lead-magnet-v1", RenderPreset::Reels);
        register("LeadMagnetLandscape", "lead-magnet-v1", RenderPreset::Landscape);
        register("LeadMagnetV2", "lead-magnet-v2", RenderPreset::Linkedin);
        register("ShawnOsHighlight", "shawnos", RenderPreset::Linkedin);
        register("GtmOsHighlight", "gtmos", RenderPreset::Linkedin);
        register("ContentOsHighlight", "contentos", RenderPreset::Linkedin);
        registry
    }

    pub fn add_table(&mut self, table: TimingTable) {
        self.tables.retain(|t| t.id != table.id);
        self.tables.push(table);
    }

    pub fn add_composition(&mut self, spec: CompositionSpec) {
        self.compositions.retain(|c| c.id != spec.id);
        self.compositions.push(spec);
    }

    pub fn compositions(&self) -> &[CompositionSpec] {
        &self.compositions
    }

    pub fn get(&self, id: &str) -> Result<&CompositionSpec, EngineError> {
        self.compositions
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| EngineError::UnknownComposition(id.to_string()))
    }

    pub fn table(&self, id: &str) -> Result<&TimingTable, EngineError> {
        self.tables
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| EngineError::UnknownTimingTable(id.to_string()))
    }

    /// Build the timeline behind composition `id`.
    pub fn timeline(&self, id: &str) -> Result<Timeline, EngineError> {
        let spec = self.get(id)?;
        Timeline::new(self.table(&spec.timing_table)?.clone())
    }

    /// Every table is valid and every composition's length matches its table.
    pub fn validate(&self) -> Result<(), EngineError> {
        for table in &self.tables {
            table.validate()?;
        }
        for spec in &self.compositions {
            let table = self.table(&spec.timing_table)?;
            if spec.duration_in_frames as i64 != table.computed_total_frames() {
                return Err(EngineError::TotalFramesMismatch {
                    table: table.id.clone(),
                    declared: spec.duration_in_frames,
                    computed: table.computed_total_frames(),
                });
            }
            if spec.fps != table.fps {
                return Err(EngineError::InvalidConfig(format!(
                    "composition '{}' renders at {} fps but table '{}' is timed at {} fps",
                    spec.id,
                    spec.fps.as_u32(),
                    table.id,
                    table.fps.as_u32()
                )));
            }
        }
        Ok(())
    }
}
