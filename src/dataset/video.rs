use super::{image_, remap_mask, ImageTransform, LabelMap, RandomAccessDataset, SegmentationRangeMap};
use crate::{common::*, config::{PatchSize, DEFAULT_SEMSEG_CLASSMAP}, error::DatasetError};

/// One (frame, mask) record of a video subsequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameRecord {
    pub image_path: PathBuf,
    pub mask_path: PathBuf,
}

/// An ordered, fixed temporal partition of one recorded video sequence.
///
/// Samples pair a color frame with its segmentation mask; raw
/// instance ids in the mask are remapped to class ids on every access.
pub struct VideoSubsequence {
    records: Vec<FrameRecord>,
    range_map: SegmentationRangeMap,
    classmap: LabelMap,
    patch_size: PatchSize,
    transform: Option<ImageTransform>,
}

impl VideoSubsequence {
    /// Load the range map from `segmentation_file` and the class map
    /// from `classmap_file`, falling back to the built-in class map
    /// when no file is given. Both tables are loaded once here.
    pub fn new(
        records: Vec<FrameRecord>,
        segmentation_file: &Path,
        classmap_file: Option<&Path>,
        patch_size: PatchSize,
    ) -> Result<Self> {
        let range_map = SegmentationRangeMap::from_file(segmentation_file)?;
        let classmap = match classmap_file {
            Some(path) => LabelMap::from_classmap_file(path)?,
            None => DEFAULT_SEMSEG_CLASSMAP.clone(),
        };

        Ok(Self {
            records,
            range_map,
            classmap,
            patch_size,
            transform: None,
        })
    }

    /// Build from parallel image/mask path lists.
    pub fn from_parallel_lists(
        image_paths: Vec<PathBuf>,
        mask_paths: Vec<PathBuf>,
        segmentation_file: &Path,
        classmap_file: Option<&Path>,
        patch_size: PatchSize,
    ) -> Result<Self> {
        ensure!(
            image_paths.len() == mask_paths.len(),
            DatasetError::Integrity(format!(
                "image and mask lists differ in length ({} vs {})",
                image_paths.len(),
                mask_paths.len()
            ))
        );
        let records = image_paths
            .into_iter()
            .zip(mask_paths)
            .map(|(image_path, mask_path)| FrameRecord {
                image_path,
                mask_path,
            })
            .collect();
        Self::new(records, segmentation_file, classmap_file, patch_size)
    }

    pub fn with_transform(mut self, transform: ImageTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn records(&self) -> &[FrameRecord] {
        &self.records
    }

    pub fn range_map(&self) -> &SegmentationRangeMap {
        &self.range_map
    }

    pub fn classmap(&self) -> &LabelMap {
        &self.classmap
    }

    pub fn patch_size(&self) -> PatchSize {
        self.patch_size
    }
}

impl Debug for VideoSubsequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoSubsequence")
            .field("num_records", &self.records.len())
            .field("num_ranges", &self.range_map.len())
            .field("patch_size", &self.patch_size)
            .finish()
    }
}

impl RandomAccessDataset for VideoSubsequence {
    type Item = (Tensor, Tensor);

    fn num_samples(&self) -> usize {
        self.records.len()
    }

    fn nth(&self, index: usize) -> Result<(Tensor, Tensor)> {
        let record = self
            .records
            .get(index)
            .ok_or_else(|| format_err!("invalid index {}", index))?;

        let image = image_::load_color(&record.image_path, self.patch_size).with_context(|| {
            format!(
                "failed to load frame image '{}'",
                record.image_path.display()
            )
        })?;
        let image = match &self.transform {
            Some(transform) => transform(image)?,
            None => image,
        };

        let mut ids = image_::load_mask(&record.mask_path, self.patch_size).with_context(|| {
            format!("failed to load mask image '{}'", record.mask_path.display())
        })?;
        remap_mask(&mut ids, &self.range_map, &self.classmap)
            .with_context(|| format!("failed to remap mask '{}'", record.mask_path.display()))?;
        let mask = image_::mask_to_tensor(&ids, self.patch_size);

        Ok((image, mask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_segmentation_descriptor_fails() {
        let err = VideoSubsequence::new(
            vec![],
            Path::new("/nonexistent/ThisSegmentation.json"),
            None,
            PatchSize::VIDEO,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DatasetError>(),
            Some(DatasetError::MissingResource(_))
        ));
    }

    #[test]
    fn unequal_parallel_lists_fail() {
        let err = VideoSubsequence::from_parallel_lists(
            vec![PathBuf::from("f0.png")],
            vec![],
            Path::new("/nonexistent/ThisSegmentation.json"),
            None,
            PatchSize::VIDEO,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DatasetError>(),
            Some(DatasetError::Integrity(_))
        ));
    }
}
