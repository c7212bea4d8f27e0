use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageError, ImageReader};

use crate::{
    index::AssetIndex,
    texture::{TextureAsset, TextureAssetFormat},
};

fn u16_bytes(data: Vec<u16>) -> Vec<u8> {
    data.into_iter().flat_map(u16::to_le_bytes).collect()
}

/// Converts a decoded image to one of the upload formats. Anything without
/// a direct counterpart is expanded to RGBA.
pub(crate) fn texture_from_image(id: AssetIndex, image: DynamicImage) -> TextureAsset {
    let size = image.dimensions();
    let (data, format) = match image {
        DynamicImage::ImageLuma8(image) => (image.into_vec(), TextureAssetFormat::Ru8),
        DynamicImage::ImageLumaA8(image) => (image.into_vec(), TextureAssetFormat::Rgu8),
        DynamicImage::ImageRgb8(image) => (image.into_vec(), TextureAssetFormat::Rgbu8),
        DynamicImage::ImageRgba8(image) => (image.into_vec(), TextureAssetFormat::Rgbau8),
        DynamicImage::ImageRgb16(image) => (u16_bytes(image.into_vec()), TextureAssetFormat::Rgbu16),
        DynamicImage::ImageRgba16(image) => {
            (u16_bytes(image.into_vec()), TextureAssetFormat::Rgbau16)
        }
        DynamicImage::ImageRgb32F(image) => {
            let converted = DynamicImage::from(image).into_rgb16();
            (u16_bytes(converted.into_vec()), TextureAssetFormat::Rgbu16)
        }
        image => (image.into_rgba8().into_vec(), TextureAssetFormat::Rgbau8),
    };

    TextureAsset {
        id,
        size,
        format,
        data,
    }
}

/// Decodes PNG or JPEG data, guessing the format from the content.
pub(crate) fn decode_texture(id: AssetIndex, buffer: &[u8]) -> Result<TextureAsset, ImageError> {
    let image = ImageReader::new(Cursor::new(buffer))
        .with_guessed_format()?
        .decode()?;
    Ok(texture_from_image(id, image))
}
