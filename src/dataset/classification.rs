use super::{image_, RandomAccessDataset};
use crate::{common::*, config::PatchSize, error::DatasetError};

/// Hook applied to decoded image tensors before they are returned.
pub type ImageTransform = Arc<dyn Fn(Tensor) -> Result<Tensor> + Send + Sync>;

/// Hook applied to integer targets before they are returned.
pub type TargetTransform = Arc<dyn Fn(i64) -> i64 + Send + Sync>;

/// One (path, label) record of a classification subsequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatchRecord {
    pub path: PathBuf,
    pub label: i64,
}

/// An ordered, fixed partition of labeled image patches.
pub struct ClassificationSubsequence {
    records: Vec<PatchRecord>,
    patch_size: PatchSize,
    transform: Option<ImageTransform>,
    target_transform: Option<TargetTransform>,
}

impl ClassificationSubsequence {
    pub fn new(records: Vec<PatchRecord>, patch_size: PatchSize) -> Self {
        Self {
            records,
            patch_size,
            transform: None,
            target_transform: None,
        }
    }

    /// Build from parallel path/target lists.
    pub fn from_parallel_lists(
        paths: Vec<PathBuf>,
        targets: Vec<i64>,
        patch_size: PatchSize,
    ) -> Result<Self> {
        ensure!(
            paths.len() == targets.len(),
            DatasetError::Configuration(format!(
                "path and target lists differ in length ({} vs {})",
                paths.len(),
                targets.len()
            ))
        );
        let records = paths
            .into_iter()
            .zip(targets)
            .map(|(path, label)| PatchRecord { path, label })
            .collect();
        Ok(Self::new(records, patch_size))
    }

    pub fn with_transform(mut self, transform: ImageTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_target_transform(mut self, target_transform: TargetTransform) -> Self {
        self.target_transform = Some(target_transform);
        self
    }

    pub fn records(&self) -> &[PatchRecord] {
        &self.records
    }

    /// Raw targets as stored, before any target transform.
    pub fn targets(&self) -> impl Iterator<Item = i64> + '_ {
        self.records.iter().map(|record| record.label)
    }

    pub fn patch_size(&self) -> PatchSize {
        self.patch_size
    }
}

impl Debug for ClassificationSubsequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassificationSubsequence")
            .field("num_records", &self.records.len())
            .field("patch_size", &self.patch_size)
            .finish()
    }
}

impl RandomAccessDataset for ClassificationSubsequence {
    type Item = (Tensor, i64);

    fn num_samples(&self) -> usize {
        self.records.len()
    }

    fn nth(&self, index: usize) -> Result<(Tensor, i64)> {
        let record = self
            .records
            .get(index)
            .ok_or_else(|| format_err!("invalid index {}", index))?;

        let image = image_::load_color(&record.path, self.patch_size)
            .with_context(|| format!("failed to load image file '{}'", record.path.display()))?;
        let image = match &self.transform {
            Some(transform) => transform(image)?,
            None => image,
        };

        let target = match &self.target_transform {
            Some(transform) => transform(record.label),
            None => record.label,
        };

        Ok((image, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallel_lists_must_have_equal_lengths() {
        let err = ClassificationSubsequence::from_parallel_lists(
            vec![PathBuf::from("a.png")],
            vec![0, 1],
            PatchSize::CLASSIFICATION,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DatasetError>(),
            Some(DatasetError::Configuration(_))
        ));
    }

    #[test]
    fn targets_are_stored_verbatim() {
        let subsequence = ClassificationSubsequence::from_parallel_lists(
            vec![PathBuf::from("a.png"), PathBuf::from("b.png")],
            vec![3, 1],
            PatchSize::CLASSIFICATION,
        )
        .unwrap();
        assert_eq!(subsequence.num_samples(), 2);
        assert_eq!(subsequence.targets().collect::<Vec<_>>(), vec![3, 1]);
    }

    #[test]
    fn missing_image_file_fails() {
        let subsequence = ClassificationSubsequence::from_parallel_lists(
            vec![PathBuf::from("/nonexistent/patch.png")],
            vec![0],
            PatchSize::CLASSIFICATION,
        )
        .unwrap();
        let err = subsequence.nth(0).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DatasetError>(),
            Some(DatasetError::MissingResource(_))
        ));
    }
}
