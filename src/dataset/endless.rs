use super::{
    ClassificationSubsequence, DatasetPreparer, LabelMap, RandomAccessDataset, VideoSubsequence,
};
use crate::{
    common::*,
    config::{
        archive_for, default_dataset_location, PatchSize, Scenario, TaskKind,
        DEFAULT_CLASSIFICATION_LABELMAP,
    },
    download::{resolve_scenario_dir, Downloader},
    error::DatasetError,
};

/// Options for [`EndlessClSimDataset::load`].
pub struct DatasetInit<'a> {
    /// Dataset root. Defaults to the per-user cache location.
    pub root: Option<PathBuf>,
    /// Prebuilt scenario to resolve under the root; `None` loads a
    /// custom tree directly from the root.
    pub scenario: Option<Scenario>,
    pub task: TaskKind,
    /// Fetch and extract the scenario archive before preparation.
    /// Requires both a scenario and a downloader.
    pub download: bool,
    pub downloader: Option<&'a dyn Downloader>,
    /// Label map for classification mode; defaults to the built-in
    /// table.
    pub labelmap: Option<LabelMap>,
    /// Classmap JSON file for segmentation mode; the built-in class map
    /// is used when absent.
    pub classmap_file: Option<PathBuf>,
    /// Defaults to the task's canonical patch size.
    pub patch_size: Option<PatchSize>,
}

impl Default for DatasetInit<'_> {
    fn default() -> Self {
        Self {
            root: None,
            scenario: None,
            task: TaskKind::Classification,
            download: false,
            downloader: None,
            labelmap: None,
            classmap_file: None,
            patch_size: None,
        }
    }
}

impl DatasetInit<'_> {
    pub fn load(self) -> Result<EndlessClSimDataset> {
        EndlessClSimDataset::load(self)
    }
}

/// One partition of the stream; the variant follows the task the
/// dataset was prepared for.
#[derive(Debug)]
pub enum Subsequence {
    Classification(ClassificationSubsequence),
    Video(VideoSubsequence),
}

impl Subsequence {
    pub fn as_classification(&self) -> Option<&ClassificationSubsequence> {
        match self {
            Self::Classification(subsequence) => Some(subsequence),
            Self::Video(_) => None,
        }
    }

    pub fn as_video(&self) -> Option<&VideoSubsequence> {
        match self {
            Self::Video(subsequence) => Some(subsequence),
            Self::Classification(_) => None,
        }
    }
}

impl RandomAccessDataset for Subsequence {
    type Item = Sample;

    fn num_samples(&self) -> usize {
        match self {
            Self::Classification(subsequence) => subsequence.num_samples(),
            Self::Video(subsequence) => subsequence.num_samples(),
        }
    }

    fn nth(&self, index: usize) -> Result<Sample> {
        match self {
            Self::Classification(subsequence) => {
                let (image, label) = subsequence.nth(index)?;
                Ok(Sample {
                    image,
                    target: Target::Label(label),
                })
            }
            Self::Video(subsequence) => {
                let (image, mask) = subsequence.nth(index)?;
                Ok(Sample {
                    image,
                    target: Target::Mask(mask),
                })
            }
        }
    }
}

/// A decoded sample.
#[derive(Debug)]
pub struct Sample {
    pub image: Tensor,
    pub target: Target,
}

/// Trainer-facing target of a sample.
#[derive(Debug)]
pub enum Target {
    Label(i64),
    Mask(Tensor),
}

/// A continual-learning dataset of paired train/test subsequences.
///
/// Construction either fully succeeds, with both lists populated and of
/// equal length, or fails naming the offending file or directory.
#[derive(Debug)]
pub struct EndlessClSimDataset {
    root: PathBuf,
    task: TaskKind,
    train: Vec<Subsequence>,
    test: Vec<Subsequence>,
}

impl EndlessClSimDataset {
    pub fn load(init: DatasetInit<'_>) -> Result<Self> {
        let DatasetInit {
            root,
            scenario,
            task,
            download,
            downloader,
            labelmap,
            classmap_file,
            patch_size,
        } = init;

        let root = root.unwrap_or_else(default_dataset_location);

        if download {
            let scenario = scenario.ok_or_else(|| {
                DatasetError::Configuration("no scenario defined to download".into())
            })?;
            let downloader = downloader.ok_or_else(|| {
                DatasetError::Configuration(
                    "download requested but no downloader provided".into(),
                )
            })?;
            let spec = archive_for(scenario, task);
            info!("fetching archive '{}'", spec.file_name);
            downloader.ensure_local_copy(spec, &root)?;
        }

        let data_dir = match scenario {
            Some(scenario) => resolve_scenario_dir(&root, scenario, task)?,
            None => root.clone(),
        };

        let patch_size = patch_size.unwrap_or(match task {
            TaskKind::Classification => PatchSize::CLASSIFICATION,
            TaskKind::SemanticSegmentation => PatchSize::VIDEO,
        });
        let labelmap = labelmap.unwrap_or_else(|| DEFAULT_CLASSIFICATION_LABELMAP.clone());
        let preparer = DatasetPreparer::new(&labelmap, classmap_file.as_deref(), patch_size);

        info!("loading dataset from '{}'", data_dir.display());
        let (train, test) = match task {
            TaskKind::Classification => {
                let lists = preparer.prepare_classification(&data_dir)?;
                (
                    lists
                        .train
                        .into_iter()
                        .map(Subsequence::Classification)
                        .collect(),
                    lists
                        .test
                        .into_iter()
                        .map(Subsequence::Classification)
                        .collect(),
                )
            }
            TaskKind::SemanticSegmentation => {
                let lists = preparer.prepare_video(&data_dir)?;
                (
                    lists.train.into_iter().map(Subsequence::Video).collect(),
                    lists.test.into_iter().map(Subsequence::Video).collect(),
                )
            }
        };

        Ok(Self {
            root,
            task,
            train,
            test,
        })
    }

    /// Number of (train, test) subsequence pairs.
    pub fn len(&self) -> usize {
        self.train.len()
    }

    pub fn is_empty(&self) -> bool {
        self.train.is_empty()
    }

    /// The ith (train, test) subsequence pair.
    pub fn get(&self, index: usize) -> Option<(&Subsequence, &Subsequence)> {
        Some((self.train.get(index)?, self.test.get(index)?))
    }

    pub fn train_subsequences(&self) -> &[Subsequence] {
        &self.train
    }

    pub fn test_subsequences(&self) -> &[Subsequence] {
        &self.test
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn task(&self) -> TaskKind {
        self.task
    }
}
