//! Directory scanning and subsequence construction.

use super::{
    ClassificationSubsequence, FrameRecord, LabelMap, PatchRecord, VideoSubsequence,
};
use crate::{common::*, config::PatchSize, error::DatasetError};

/// Train/test split marker parsed from a sequence directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    /// Case-insensitive substring match on the directory name. Exactly
    /// one of the two markers must appear.
    pub fn from_dir_name(name: &str) -> Result<Self> {
        let lower = name.to_lowercase();
        match (lower.contains("train"), lower.contains("test")) {
            (true, false) => Ok(Self::Train),
            (false, true) => Ok(Self::Test),
            (true, true) => Err(DatasetError::Configuration(format!(
                "sequence directory '{}' contains both 'train' and 'test' markers",
                name
            ))
            .into()),
            (false, false) => Err(DatasetError::Configuration(format!(
                "sequence directory '{}' contains neither 'train' nor 'test' marker",
                name
            ))
            .into()),
        }
    }
}

/// Train/test halves produced by one preparation run.
#[derive(Debug)]
pub struct PreparedLists<S> {
    pub train: Vec<S>,
    pub test: Vec<S>,
}

impl<S> PreparedLists<S> {
    fn push(&mut self, split: Split, subsequence: S) {
        match split {
            Split::Train => self.train.push(subsequence),
            Split::Test => self.test.push(subsequence),
        }
    }

    fn check_counts(&self) -> Result<()> {
        ensure!(
            self.train.len() == self.test.len(),
            DatasetError::Configuration(format!(
                "train/test subsequence counts do not match ({} vs {})",
                self.train.len(),
                self.test.len()
            ))
        );
        Ok(())
    }
}

impl<S> Default for PreparedLists<S> {
    fn default() -> Self {
        Self {
            train: vec![],
            test: vec![],
        }
    }
}

/// Builds subsequences from an on-disk dataset tree.
///
/// Preparation is all-or-nothing: the first sequence directory that
/// fails its checks fails the whole run, and sequences after it are not
/// processed.
#[derive(Debug, Clone)]
pub struct DatasetPreparer<'a> {
    labelmap: &'a LabelMap,
    classmap_file: Option<&'a Path>,
    patch_size: PatchSize,
}

impl<'a> DatasetPreparer<'a> {
    pub fn new(
        labelmap: &'a LabelMap,
        classmap_file: Option<&'a Path>,
        patch_size: PatchSize,
    ) -> Self {
        Self {
            labelmap,
            classmap_file,
            patch_size,
        }
    }

    /// Scan a classification tree:
    /// `root/{sequence}/{subsequence}/{class}/{patch}`.
    pub fn prepare_classification(
        &self,
        root: &Path,
    ) -> Result<PreparedLists<ClassificationSubsequence>> {
        ensure!(root.is_dir(), DatasetError::MissingResource(root.to_owned()));

        let mut lists = PreparedLists::default();

        for sequence_dir in sorted_subdirs(root)? {
            let split = Split::from_dir_name(&entry_name(&sequence_dir)?)?;

            for subsequence_dir in sorted_subdirs(&sequence_dir)? {
                let mut records = vec![];

                for class_dir in sorted_subdirs(&subsequence_dir)? {
                    let class_name = entry_name(&class_dir)?;
                    let label = self.labelmap.label_of(&class_name).with_context(|| {
                        format!(
                            "in subsequence directory '{}'",
                            subsequence_dir.display()
                        )
                    })?;
                    for path in sorted_files(&class_dir)? {
                        records.push(PatchRecord { path, label });
                    }
                }

                if records.is_empty() {
                    warn!(
                        "subsequence directory '{}' holds no samples",
                        subsequence_dir.display()
                    );
                }
                lists.push(
                    split,
                    ClassificationSubsequence::new(records, self.patch_size),
                );
            }
        }

        lists.check_counts()?;
        info!(
            "prepared {} train and {} test classification subsequences",
            lists.train.len(),
            lists.test.len()
        );
        Ok(lists)
    }

    /// Scan a video tree: `root/{sequence}/{Color|Seg}/0/{frame}` plus
    /// the `*Sequence.json` and `*Segmentation.json` descriptors, then
    /// slice each sequence into temporal chunks.
    pub fn prepare_video(&self, root: &Path) -> Result<PreparedLists<VideoSubsequence>> {
        ensure!(root.is_dir(), DatasetError::MissingResource(root.to_owned()));

        let mut lists = PreparedLists::default();

        for sequence_dir in sorted_subdirs(root)? {
            let split = Split::from_dir_name(&entry_name(&sequence_dir)?)?;
            let layout = VideoSequenceLayout::scan(&sequence_dir)?;

            let offsets = load_sequence_offsets(&layout.sequence_file)?;
            let chunks = chunk_ranges(&offsets, layout.image_paths.len()).with_context(|| {
                format!(
                    "invalid sequence descriptor '{}'",
                    layout.sequence_file.display()
                )
            })?;

            for chunk in chunks {
                let records: Vec<_> = layout.image_paths[chunk.clone()]
                    .iter()
                    .zip(&layout.mask_paths[chunk])
                    .map(|(image_path, mask_path)| FrameRecord {
                        image_path: image_path.clone(),
                        mask_path: mask_path.clone(),
                    })
                    .collect();

                let subsequence = VideoSubsequence::new(
                    records,
                    &layout.segmentation_file,
                    self.classmap_file,
                    self.patch_size,
                )?;
                lists.push(split, subsequence);
            }
        }

        lists.check_counts()?;
        info!(
            "prepared {} train and {} test video subsequences",
            lists.train.len(),
            lists.test.len()
        );
        Ok(lists)
    }
}

/// Frame/mask trees and descriptor files of one recorded sequence.
#[derive(Debug)]
struct VideoSequenceLayout {
    image_paths: Vec<PathBuf>,
    mask_paths: Vec<PathBuf>,
    sequence_file: PathBuf,
    segmentation_file: PathBuf,
}

impl VideoSequenceLayout {
    fn scan(sequence_dir: &Path) -> Result<Self> {
        let mut image_paths = vec![];
        let mut mask_paths = vec![];
        let mut sequence_file = None;
        let mut segmentation_file = None;

        for entry in fs::read_dir(sequence_dir)
            .with_context(|| format!("failed to list directory '{}'", sequence_dir.display()))?
        {
            let path = entry?.path();
            let name = entry_name(&path)?;

            if path.is_dir() {
                // frames live one level down, in the depth-0 directory
                match name.as_str() {
                    "Color" => image_paths = sorted_files(&path.join("0"))?,
                    "Seg" => mask_paths = sorted_files(&path.join("0"))?,
                    _ => {}
                }
            } else if path.is_file() {
                if name.contains("Sequence.json") {
                    sequence_file = Some(path);
                } else if name.contains("Segmentation.json") {
                    segmentation_file = Some(path);
                }
            }
        }

        ensure!(
            image_paths.len() == mask_paths.len(),
            DatasetError::Integrity(format!(
                "'{}' holds {} frames but {} masks",
                sequence_dir.display(),
                image_paths.len(),
                mask_paths.len()
            ))
        );
        let sequence_file = sequence_file.ok_or_else(|| {
            DatasetError::MissingResource(sequence_dir.join("*Sequence.json"))
        })?;
        let segmentation_file = segmentation_file.ok_or_else(|| {
            DatasetError::MissingResource(sequence_dir.join("*Segmentation.json"))
        })?;

        Ok(Self {
            image_paths,
            mask_paths,
            sequence_file,
            segmentation_file,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SequenceRecord {
    #[serde(rename = "Sequence")]
    sequence: SequenceCounters,
}

#[derive(Debug, Deserialize)]
struct SequenceCounters {
    #[serde(rename = "ImageCounter")]
    image_counter: usize,
}

/// Start offsets of each temporal chunk, in descriptor order.
pub fn load_sequence_offsets(path: &Path) -> Result<Vec<usize>> {
    ensure!(
        path.is_file(),
        DatasetError::MissingResource(path.to_owned())
    );
    let text = fs::read_to_string(path)?;
    let records: Vec<SequenceRecord> = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse sequence descriptor '{}'", path.display()))?;
    Ok(records
        .iter()
        .map(|record| record.sequence.image_counter)
        .collect())
}

/// Slice boundaries derived from chunk start offsets. Chunk `i` spans
/// `offsets[i]..offsets[i + 1]`; the final chunk runs to `total`.
pub fn chunk_ranges(offsets: &[usize], total: usize) -> Result<Vec<Range<usize>>> {
    ensure!(
        !offsets.is_empty(),
        DatasetError::Integrity("sequence descriptor holds no records".into())
    );
    for (&prev, &next) in offsets.iter().tuple_windows() {
        ensure!(
            prev <= next,
            DatasetError::Integrity(format!(
                "chunk offsets must be non-decreasing, found {} after {}",
                next, prev
            ))
        );
    }
    if let Some(&last) = offsets.last() {
        ensure!(
            last <= total,
            DatasetError::Integrity(format!(
                "chunk offset {} exceeds the total file count {}",
                last, total
            ))
        );
    }

    let ranges = offsets
        .iter()
        .enumerate()
        .map(|(index, &start)| {
            let end = offsets.get(index + 1).copied().unwrap_or(total);
            start..end
        })
        .collect();
    Ok(ranges)
}

fn entry_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| format_err!("path '{}' has no file name", path.display()))
}

/// Subdirectories of `path` in deterministic order: all-digit names
/// (the numbered subsequence directories) sort numerically, everything
/// else lexicographically.
fn sorted_subdirs(path: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<_> = list_dir(path)?
        .into_iter()
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort_by(|a, b| compare_names(a, b));
    Ok(dirs)
}

/// Files of `path` sorted lexicographically by name; this is the
/// canonical, filesystem-independent frame order.
fn sorted_files(path: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<_> = list_dir(path)?
        .into_iter()
        .filter(|path| path.is_file())
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn list_dir(path: &Path) -> Result<Vec<PathBuf>> {
    ensure!(path.is_dir(), DatasetError::MissingResource(path.to_owned()));
    fs::read_dir(path)
        .with_context(|| format!("failed to list directory '{}'", path.display()))?
        .map(|entry| Ok(entry?.path()))
        .collect()
}

fn compare_names(a: &Path, b: &Path) -> Ordering {
    let name_a = a.file_name().map(|name| name.to_string_lossy().into_owned());
    let name_b = b.file_name().map(|name| name.to_string_lossy().into_owned());
    match (name_a, name_b) {
        (Some(name_a), Some(name_b)) => match (name_a.parse::<u64>(), name_b.parse::<u64>()) {
            (Ok(num_a), Ok(num_b)) => num_a.cmp(&num_b),
            _ => name_a.cmp(&name_b),
        },
        (name_a, name_b) => name_a.cmp(&name_b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_marker_parsing() {
        assert_eq!(Split::from_dir_name("TrainSequence").unwrap(), Split::Train);
        assert_eq!(Split::from_dir_name("my_TEST_run").unwrap(), Split::Test);

        let err = Split::from_dir_name("TrainAndTest").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DatasetError>(),
            Some(DatasetError::Configuration(_))
        ));
        assert!(Split::from_dir_name("Validation").is_err());
    }

    #[test]
    fn chunk_boundaries_follow_offsets() {
        let ranges = chunk_ranges(&[0, 10, 25], 30).unwrap();
        assert_eq!(ranges, vec![0..10, 10..25, 25..30]);
    }

    #[test]
    fn decreasing_offsets_are_rejected() {
        let err = chunk_ranges(&[0, 10, 5], 30).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DatasetError>(),
            Some(DatasetError::Integrity(_))
        ));
    }

    #[test]
    fn offsets_past_the_end_are_rejected() {
        assert!(chunk_ranges(&[0, 40], 30).is_err());
        assert!(chunk_ranges(&[], 30).is_err());
    }

    #[test]
    fn numbered_directories_sort_numerically() {
        let a = PathBuf::from("/data/2");
        let b = PathBuf::from("/data/10");
        assert_eq!(compare_names(&a, &b), Ordering::Less);

        let a = PathBuf::from("/data/Color");
        let b = PathBuf::from("/data/Seg");
        assert_eq!(compare_names(&a, &b), Ordering::Less);
    }
}
