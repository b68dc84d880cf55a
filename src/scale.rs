// Proportional scaling from the 1080x1350 reference design to any output size.

use serde::{Deserialize, Serialize};

use crate::types::{Dimensions, REFERENCE_HEIGHT, REFERENCE_WIDTH};

/// Scale factors for one output size. LinkedIn and Reels (1080w) scale by 1.0; landscape by ~1.78.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleFactors {
    pub scale_x: f64,
    pub scale_y: f64,
}

impl ScaleFactors {
    pub fn for_dimensions(dimensions: Dimensions) -> Self {
        ScaleFactors {
            scale_x: dimensions.width as f64 / REFERENCE_WIDTH as f64,
            scale_y: dimensions.height as f64 / REFERENCE_HEIGHT as f64,
        }
    }

    /// Scale a horizontal or general pixel value.
    pub fn s(&self, px: f64) -> i64 {
        (px * self.scale_x).round() as i64
    }

    /// Scale a vertical pixel value.
    pub fn sv(&self, px: f64) -> i64 {
        (px * self.scale_y).round() as i64
    }
}
