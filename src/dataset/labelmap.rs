//! Class-name tables and segmentation mask remapping.

use crate::{common::*, error::DatasetError};

/// Mapping from class name to trainer-facing integer label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelMap(IndexMap<String, i64>);

impl LabelMap {
    pub fn get(&self, class_name: &str) -> Option<i64> {
        self.0.get(class_name).copied()
    }

    /// Resolve a class name, failing if the table has no entry for it.
    pub fn label_of(&self, class_name: &str) -> Result<i64> {
        self.get(class_name).ok_or_else(|| {
            DatasetError::Configuration(format!(
                "class '{}' is not part of the label map",
                class_name
            ))
            .into()
        })
    }

    pub fn labels(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.values().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Load from a classmap JSON file of the form
    /// `{"ClassMapping": {class: id, ...}}`.
    pub fn from_classmap_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        ensure!(
            path.is_file(),
            DatasetError::MissingResource(path.to_owned())
        );
        let text = fs::read_to_string(path)?;
        let file: ClassMapFile = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse classmap file '{}'", path.display()))?;
        Ok(Self(file.class_mapping))
    }
}

impl<S> FromIterator<(S, i64)> for LabelMap
where
    S: Into<String>,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
    {
        Self(
            iter.into_iter()
                .map(|(name, label)| (name.into(), label))
                .collect(),
        )
    }
}

#[derive(Debug, Deserialize)]
struct ClassMapFile {
    #[serde(rename = "ClassMapping")]
    class_mapping: IndexMap<String, i64>,
}

/// Mapping from class name to the inclusive instance-id interval it
/// covers in raw segmentation masks.
///
/// Lookups scan the entries in insertion order and the first matching
/// range wins; the tables are tens of entries at most.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentationRangeMap {
    ranges: IndexMap<String, (i64, i64)>,
}

impl SegmentationRangeMap {
    /// Build from explicit ranges, validating the bounds.
    pub fn new(ranges: IndexMap<String, (i64, i64)>) -> Result<Self> {
        for (name, &(min, max)) in &ranges {
            ensure!(
                min <= max,
                DatasetError::Integrity(format!(
                    "range for class '{}' is inverted ({}..={})",
                    name, min, max
                ))
            );
        }
        for ((name_a, &(min_a, max_a)), (name_b, &(min_b, max_b))) in
            ranges.iter().tuple_combinations()
        {
            ensure!(
                max_a < min_b || max_b < min_a,
                DatasetError::Integrity(format!(
                    "ranges for classes '{}' and '{}' overlap",
                    name_a, name_b
                ))
            );
        }
        Ok(Self { ranges })
    }

    /// Load from a segmentation descriptor file: a two-element JSON
    /// array whose first record holds the per-class minima and whose
    /// second holds the maxima.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        ensure!(
            path.is_file(),
            DatasetError::MissingResource(path.to_owned())
        );
        let text = fs::read_to_string(path)?;
        let records: Vec<RangeBoundRecord> = serde_json::from_str(&text).with_context(|| {
            format!(
                "failed to parse segmentation descriptor '{}'",
                path.display()
            )
        })?;
        ensure!(
            records.len() == 2,
            DatasetError::Integrity(format!(
                "segmentation descriptor '{}' must hold exactly two records, found {}",
                path.display(),
                records.len()
            ))
        );

        let minima = &records[0].object_class_mapping;
        let maxima = &records[1].object_class_mapping;
        let ranges: IndexMap<_, _> = minima
            .iter()
            .map(|(name, &min)| -> Result<_> {
                let max = maxima.get(name).copied().ok_or_else(|| {
                    DatasetError::Integrity(format!(
                        "class '{}' has a minimum but no maximum bound in '{}'",
                        name,
                        path.display()
                    ))
                })?;
                Ok((name.clone(), (min, max)))
            })
            .try_collect()?;

        Self::new(ranges)
    }

    /// The class whose range contains `instance_id`. A degenerate range
    /// (`min == max`) matches that exact id only.
    pub fn class_name_of(&self, instance_id: i64) -> Result<&str> {
        self.ranges
            .iter()
            .find(|(_, &(min, max))| (min..=max).contains(&instance_id))
            .map(|(name, _)| name.as_str())
            .ok_or_else(|| {
                DatasetError::Integrity(format!(
                    "instance id {} matches no segmentation range",
                    instance_id
                ))
                .into()
            })
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct RangeBoundRecord {
    #[serde(rename = "ObjectClassMapping")]
    object_class_mapping: IndexMap<String, i64>,
}

/// Replace every raw instance id in `mask` with its class label.
///
/// Distinct ids are collected up front (in ascending order) and each is
/// substituted across the whole mask in its own pass, so raw ids that
/// share a target class may be processed in any order.
pub fn remap_mask(
    mask: &mut [i64],
    ranges: &SegmentationRangeMap,
    classmap: &LabelMap,
) -> Result<()> {
    let distinct: BTreeSet<i64> = mask.iter().copied().collect();

    for instance_id in distinct {
        let class_name = ranges.class_name_of(instance_id)?;
        let class_label = classmap.label_of(class_name)?;
        for value in mask.iter_mut() {
            if *value == instance_id {
                *value = class_label;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range_map(entries: &[(&str, i64, i64)]) -> SegmentationRangeMap {
        SegmentationRangeMap::new(
            entries
                .iter()
                .map(|&(name, min, max)| (name.to_owned(), (min, max)))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn degenerate_range_is_exact_match() {
        let ranges = range_map(&[("wall", 5, 5)]);
        let classmap: LabelMap = [("wall", 2)].into_iter().collect();

        let mut mask = vec![5, 5, 5, 5];
        remap_mask(&mut mask, &ranges, &classmap).unwrap();
        assert_eq!(mask, vec![2, 2, 2, 2]);
    }

    #[test]
    fn unmatched_instance_id_fails() {
        let ranges = range_map(&[("wall", 5, 5)]);
        let classmap: LabelMap = [("wall", 2)].into_iter().collect();

        let mut mask = vec![5, 7];
        let err = remap_mask(&mut mask, &ranges, &classmap).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DatasetError>(),
            Some(DatasetError::Integrity(_))
        ));
    }

    #[test]
    fn remapped_values_lie_in_classmap_image() {
        let ranges = range_map(&[("sky", 1, 4), ("wall", 5, 9), ("ground", 10, 10)]);
        let classmap: LabelMap = [("sky", 0), ("wall", 1), ("ground", 2)].into_iter().collect();

        let mut mask = vec![3, 1, 9, 5, 10, 4, 7];
        remap_mask(&mut mask, &ranges, &classmap).unwrap();

        let labels: BTreeSet<i64> = classmap.labels().collect();
        assert!(mask.iter().all(|value| labels.contains(value)));
        assert_eq!(mask, vec![0, 0, 1, 1, 2, 0, 1]);
    }

    #[test]
    fn remap_is_idempotent_on_self_mapped_labels() {
        // Class ids covered by singleton ranges that map back to
        // themselves: a second remap must be a no-op.
        let ranges = range_map(&[("sky", 0, 0), ("wall", 1, 1)]);
        let classmap: LabelMap = [("sky", 0), ("wall", 1)].into_iter().collect();

        let mut mask = vec![0, 1, 1, 0];
        let orig = mask.clone();
        remap_mask(&mut mask, &ranges, &classmap).unwrap();
        assert_eq!(mask, orig);
        remap_mask(&mut mask, &ranges, &classmap).unwrap();
        assert_eq!(mask, orig);
    }

    #[test]
    fn overlapping_ranges_are_rejected() {
        let ranges: IndexMap<String, (i64, i64)> =
            [("sky".to_owned(), (0, 5)), ("wall".to_owned(), (5, 9))]
                .into_iter()
                .collect();
        let err = SegmentationRangeMap::new(ranges).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DatasetError>(),
            Some(DatasetError::Integrity(_))
        ));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let ranges: IndexMap<String, (i64, i64)> =
            [("sky".to_owned(), (4, 1))].into_iter().collect();
        assert!(SegmentationRangeMap::new(ranges).is_err());
    }

    #[test]
    fn first_matching_range_wins_in_insertion_order() {
        let ranges = range_map(&[("far", 20, 29), ("near", 0, 9)]);
        assert_eq!(ranges.class_name_of(25).unwrap(), "far");
        assert_eq!(ranges.class_name_of(3).unwrap(), "near");
    }

    #[test]
    fn unmapped_class_name_is_configuration_error() {
        let classmap: LabelMap = [("wall", 2)].into_iter().collect();
        let err = classmap.label_of("sky").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DatasetError>(),
            Some(DatasetError::Configuration(_))
        ));
    }
}
