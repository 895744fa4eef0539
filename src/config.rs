//! Static configuration: scenarios, archive table, default label tables
//! and the default dataset location.

use crate::{common::*, dataset::LabelMap};
use once_cell::sync::Lazy;

/// Identifier of a prebuilt simulator-generated dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scenario {
    /// Incrementally appearing object classes.
    Classes,
    /// Decreasing illumination over time.
    Illumination,
    /// Shifting weather conditions over time.
    Weather,
}

/// The learning task the dataset is prepared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// Image-patch classification with per-class directories.
    Classification,
    /// Per-frame semantic segmentation of recorded video sequences.
    SemanticSegmentation,
}

/// Output sample size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSize {
    pub height: u32,
    pub width: u32,
}

impl PatchSize {
    /// Default square patch size of the classification datasets.
    pub const CLASSIFICATION: Self = Self {
        height: 64,
        width: 64,
    };
    /// Default frame size of the video datasets.
    pub const VIDEO: Self = Self {
        height: 135,
        width: 240,
    };

    pub fn new(height: u32, width: u32) -> Result<Self> {
        ensure!(
            height > 0 && width > 0,
            "patch height and width must be positive"
        );
        Ok(Self { height, width })
    }

    pub fn num_pixels(&self) -> usize {
        self.height as usize * self.width as usize
    }
}

/// Remote archive descriptor consumed by the [`Downloader`](crate::download::Downloader) seam.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveSpec {
    pub file_name: &'static str,
    pub url: &'static str,
    /// Published digest of the archive, if pinned. `None` leaves
    /// verification to the downloader implementation.
    pub md5: Option<&'static str>,
}

impl ArchiveSpec {
    /// Directory name the archive extracts to.
    pub fn dir_name(&self) -> &'static str {
        self.file_name.split('.').next().unwrap_or(self.file_name)
    }
}

/// Every downloadable archive, classification datasets first.
pub const SCENARIO_ARCHIVES: &[ArchiveSpec] = &[
    ArchiveSpec {
        file_name: "IncrementalClasses_Classification.zip",
        url: "https://zenodo.org/record/4899267/files/IncrementalClasses_Classification.zip",
        md5: None,
    },
    ArchiveSpec {
        file_name: "DecreasingIllumination_Classification.zip",
        url: "https://zenodo.org/record/4899267/files/DecreasingIllumination_Classification.zip",
        md5: None,
    },
    ArchiveSpec {
        file_name: "ShiftingWeather_Classification.zip",
        url: "https://zenodo.org/record/4899267/files/ShiftingWeather_Classification.zip",
        md5: None,
    },
    ArchiveSpec {
        file_name: "IncrementalClasses_Video.zip",
        url: "https://zenodo.org/record/4899267/files/IncrementalClasses_Video.zip",
        md5: None,
    },
    ArchiveSpec {
        file_name: "DecreasingIllumination_Video.zip",
        url: "https://zenodo.org/record/4899267/files/DecreasingIllumination_Video.zip",
        md5: None,
    },
    ArchiveSpec {
        file_name: "ShiftingWeather_Video.zip",
        url: "https://zenodo.org/record/4899267/files/ShiftingWeather_Video.zip",
        md5: None,
    },
];

/// The archive holding the given scenario/task combination.
pub fn archive_for(scenario: Scenario, task: TaskKind) -> &'static ArchiveSpec {
    let index = match (task, scenario) {
        (TaskKind::Classification, Scenario::Classes) => 0,
        (TaskKind::Classification, Scenario::Illumination) => 1,
        (TaskKind::Classification, Scenario::Weather) => 2,
        (TaskKind::SemanticSegmentation, Scenario::Classes) => 3,
        (TaskKind::SemanticSegmentation, Scenario::Illumination) => 4,
        (TaskKind::SemanticSegmentation, Scenario::Weather) => 5,
    };
    &SCENARIO_ARCHIVES[index]
}

/// Labels of the class directories found in the classification trees.
pub static DEFAULT_CLASSIFICATION_LABELMAP: Lazy<LabelMap> = Lazy::new(|| {
    LabelMap::from_iter([
        ("Car", 0),
        ("Pedestrian", 1),
        ("Bicycle", 2),
        ("Bus", 3),
        ("Motorcycle", 4),
        ("Truck", 5),
    ])
});

/// Class ids the segmentation masks are remapped to when no classmap
/// file is given.
pub static DEFAULT_SEMSEG_CLASSMAP: Lazy<LabelMap> = Lazy::new(|| {
    LabelMap::from_iter([
        ("None", 0),
        ("Sky", 1),
        ("Ground", 2),
        ("Road", 3),
        ("Building", 4),
        ("Wall", 5),
        ("Fence", 6),
        ("Vegetation", 7),
        ("Vehicle", 8),
        ("Pedestrian", 9),
    ])
});

/// Default dataset root under the per-user cache directory.
pub fn default_dataset_location() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join("endless-clsim")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_table_is_consistent() {
        let stems: IndexSet<_> = SCENARIO_ARCHIVES.iter().map(|spec| spec.dir_name()).collect();
        assert_eq!(stems.len(), SCENARIO_ARCHIVES.len());

        let spec = archive_for(Scenario::Classes, TaskKind::Classification);
        assert_eq!(spec.dir_name(), "IncrementalClasses_Classification");

        let spec = archive_for(Scenario::Weather, TaskKind::SemanticSegmentation);
        assert_eq!(spec.file_name, "ShiftingWeather_Video.zip");
    }

    #[test]
    fn default_tables_are_populated() {
        assert!(DEFAULT_CLASSIFICATION_LABELMAP.get("Car").is_some());
        assert_eq!(DEFAULT_SEMSEG_CLASSMAP.get("Wall"), Some(5));
    }
}
