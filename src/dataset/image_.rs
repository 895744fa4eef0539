//! Synchronous image decoding helpers.

use crate::{common::*, config::PatchSize, error::DatasetError};
use image::{imageops::FilterType, DynamicImage};

fn open(path: &Path) -> Result<DynamicImage> {
    ensure!(
        path.is_file(),
        DatasetError::MissingResource(path.to_owned())
    );
    let image = image::open(path).map_err(|source| DatasetError::Decode {
        path: path.to_owned(),
        source,
    })?;
    Ok(image)
}

/// Decode a color image and resize it to `patch_size`.
///
/// Nearest-neighbor interpolation is used for every resize in this crate
/// so that label-like pixel values survive when the same path handles
/// masks. Returns a `[3, H, W]` float tensor scaled to `[0, 1]`.
pub fn load_color(path: &Path, patch_size: PatchSize) -> Result<Tensor> {
    let image = open(path)?
        .resize_exact(patch_size.width, patch_size.height, FilterType::Nearest)
        .to_rgb8();
    let (height, width) = (image.height() as i64, image.width() as i64);
    let tensor = Tensor::of_slice(image.as_raw())
        .view([height, width, 3])
        .permute(&[2, 0, 1])
        .to_kind(Kind::Float)
        .g_div_scalar(255.0);
    Ok(tensor)
}

/// Decode a grayscale mask and resize it to `patch_size`, preserving the
/// exact instance-id pixel values. Returned ids are in row-major order.
pub fn load_mask(path: &Path, patch_size: PatchSize) -> Result<Vec<i64>> {
    let mask = open(path)?.to_luma8();
    let mask = image::imageops::resize(&mask, patch_size.width, patch_size.height, FilterType::Nearest);
    Ok(mask.into_raw().into_iter().map(i64::from).collect())
}

/// Pack a row-major mask into an `[H, W]` i64 tensor.
pub fn mask_to_tensor(ids: &[i64], patch_size: PatchSize) -> Tensor {
    Tensor::of_slice(ids).view([patch_size.height as i64, patch_size.width as i64])
}
