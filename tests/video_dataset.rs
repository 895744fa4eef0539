use anyhow::Result;
use endless_clsim::{
    DatasetError, DatasetInit, EndlessClSimDataset, RandomAccessDataset, TaskKind,
};
use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

fn fixture_dir(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn video_tree_is_sliced_at_sequence_boundaries() -> Result<()> {
    // 4 frames per sequence with chunk offsets [0, 2]
    let dataset = EndlessClSimDataset::load(DatasetInit {
        root: Some(fixture_dir("video")),
        task: TaskKind::SemanticSegmentation,
        ..Default::default()
    })?;

    assert_eq!(dataset.len(), 2);
    for index in 0..dataset.len() {
        let (train, test) = dataset.get(index).unwrap();
        assert_eq!(train.num_samples(), 2);
        assert_eq!(test.num_samples(), 2);
    }

    let frames = glob::glob(
        fixture_dir("video")
            .join("TrainSeq")
            .join("Color")
            .join("0")
            .join("*.png")
            .to_str()
            .unwrap(),
    )?
    .count();
    assert_eq!(frames, 4);

    Ok(())
}

#[test]
fn masks_are_remapped_to_class_ids() -> Result<()> {
    let dataset = EndlessClSimDataset::load(DatasetInit {
        root: Some(fixture_dir("video")),
        task: TaskKind::SemanticSegmentation,
        ..Default::default()
    })?;

    let (train, _) = dataset.get(0).unwrap();
    let subsequence = train.as_video().unwrap();
    let (image, mask) = subsequence.nth(0)?;

    assert_eq!(image.size(), vec![3, 135, 240]);
    assert_eq!(mask.size(), vec![135, 240]);

    // raw ids 2 (Sky range 1..=4) and 5 (Wall singleton) remap to the
    // built-in class ids; no raw instance id survives
    let values: BTreeSet<i64> = Vec::<i64>::from(&mask.flatten(0, -1)).into_iter().collect();
    assert_eq!(values, BTreeSet::from([1, 5]));

    Ok(())
}

#[test]
fn classmap_file_overrides_builtin_table() -> Result<()> {
    let dataset = EndlessClSimDataset::load(DatasetInit {
        root: Some(fixture_dir("video")),
        task: TaskKind::SemanticSegmentation,
        classmap_file: Some(fixture_dir("classmap.json")),
        ..Default::default()
    })?;

    let (train, _) = dataset.get(0).unwrap();
    let (_, mask) = train.as_video().unwrap().nth(1)?;

    let values: BTreeSet<i64> = Vec::<i64>::from(&mask.flatten(0, -1)).into_iter().collect();
    assert_eq!(values, BTreeSet::from([7, 3]));

    Ok(())
}

#[test]
fn missing_sequence_descriptor_fails_the_whole_preparation() {
    let err = EndlessClSimDataset::load(DatasetInit {
        root: Some(fixture_dir("video_missing_sequence")),
        task: TaskKind::SemanticSegmentation,
        ..Default::default()
    })
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<DatasetError>(),
        Some(DatasetError::MissingResource(_))
    ));
}
