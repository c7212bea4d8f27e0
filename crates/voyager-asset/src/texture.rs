use crate::index::AssetIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureAssetFormat {
    Ru8,
    Rgu8,
    Rgbu8,
    Rgbau8,
    Rgbu16,
    Rgbau16,
}

impl TextureAssetFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            TextureAssetFormat::Ru8 => 1,
            TextureAssetFormat::Rgu8 => 2,
            TextureAssetFormat::Rgbu8 => 3,
            TextureAssetFormat::Rgbau8 => 4,
            TextureAssetFormat::Rgbu16 => 6,
            TextureAssetFormat::Rgbau16 => 8,
        }
    }
}

/// Decoded image data, ready for upload.
#[derive(Debug, Clone)]
pub struct TextureAsset {
    pub id: AssetIndex,
    pub size: (u32, u32),
    pub format: TextureAssetFormat,
    pub data: Vec<u8>,
}

impl TextureAsset {
    /// A 1x1 texture of the given color, mostly useful as a placeholder.
    pub fn solid(id: AssetIndex, color: [u8; 4]) -> Self {
        Self {
            id,
            size: (1, 1),
            format: TextureAssetFormat::Rgbau8,
            data: color.to_vec(),
        }
    }

    pub fn byte_size(&self) -> usize {
        self.data.len()
    }
}
