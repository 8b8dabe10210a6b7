use crate::config::EngineConfig;
use serde::{Deserialize, Serialize};

// =============================================================================
// ENGINE FACTORY PRESETS
// =============================================================================

/// Factory frame layouts. All use Hann windows with a derived overlap-add gain.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnginePreset {
    #[default]
    #[serde(rename = "Reference")]
    Reference,
    #[serde(rename = "Low Latency")]
    LowLatency,
    #[serde(rename = "High Resolution")]
    HighResolution,
    #[serde(rename = "Dense Overlap")]
    DenseOverlap,
}

impl EnginePreset {
    pub const ALL: [EnginePreset; 4] = [
        EnginePreset::Reference,
        EnginePreset::LowLatency,
        EnginePreset::HighResolution,
        EnginePreset::DenseOverlap,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EnginePreset::Reference => "Reference",
            EnginePreset::LowLatency => "Low Latency",
            EnginePreset::HighResolution => "High Resolution",
            EnginePreset::DenseOverlap => "Dense Overlap",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            EnginePreset::Reference => "256-sample frames, 75% overlap",
            EnginePreset::LowLatency => "128-sample frames, 75% overlap",
            EnginePreset::HighResolution => "2048-sample frames for fine frequency resolution",
            EnginePreset::DenseOverlap => "1024-sample frames, 87.5% overlap",
        }
    }

    /// Case-insensitive lookup that ignores spaces, dashes and underscores.
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        Self::ALL.into_iter().find(|p| {
            let candidate: String = p
                .name()
                .chars()
                .filter(|c| *c != ' ')
                .flat_map(char::to_lowercase)
                .collect();
            candidate == key
        })
    }

    pub fn config(&self, sample_rate: f32) -> EngineConfig {
        let (frame_size, overlap) = match self {
            EnginePreset::Reference => (256, 4),
            EnginePreset::LowLatency => (128, 4),
            EnginePreset::HighResolution => (2048, 4),
            EnginePreset::DenseOverlap => (1024, 8),
        };
        EngineConfig::new(frame_size)
            .with_overlap(overlap)
            .with_sample_rate(sample_rate)
    }
}
