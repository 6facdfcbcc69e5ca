use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Texture import formats the audit understands.
///
/// `Automatic` is a sentinel: the store picks a concrete format per
/// platform at import time. The classifier and batch engine only reason
/// about the resolved (concrete) format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TextureFormat {
    Automatic,
    // ASTC, by block size (larger block = stronger compression).
    Astc4x4,
    Astc5x5,
    Astc6x6,
    Astc8x8,
    Astc10x10,
    Astc12x12,
    // ETC family.
    EtcRgb4,
    EtcRgb4Crunched,
    Etc2Rgb4,
    Etc2Rgba8,
    Etc2Rgba8Crunched,
    // PVRTC family.
    PvrtcRgb2,
    PvrtcRgb4,
    PvrtcRgba2,
    PvrtcRgba4,
    // DXT family.
    Dxt1,
    Dxt1Crunched,
    Dxt5,
    Dxt5Crunched,
    // Uncompressed.
    Alpha8,
    Rgb24,
    Rgba16,
    Rgba32,
}

impl TextureFormat {
    /// True for crunch-compressed variants. Crunch requires multiple-of-4
    /// dimensions.
    pub fn is_crunched(&self) -> bool {
        matches!(
            self,
            TextureFormat::EtcRgb4Crunched
                | TextureFormat::Etc2Rgba8Crunched
                | TextureFormat::Dxt1Crunched
                | TextureFormat::Dxt5Crunched
        )
    }

    /// True for PVRTC variants. PVRTC requires power-of-two dimensions.
    pub fn is_pvrtc(&self) -> bool {
        matches!(
            self,
            TextureFormat::PvrtcRgb2
                | TextureFormat::PvrtcRgb4
                | TextureFormat::PvrtcRgba2
                | TextureFormat::PvrtcRgba4
        )
    }

    pub fn is_astc(&self) -> bool {
        self.astc_block().is_some()
    }

    /// ASTC block edge length (4..=12), or `None` for non-ASTC formats.
    pub fn astc_block(&self) -> Option<u32> {
        match self {
            TextureFormat::Astc4x4 => Some(4),
            TextureFormat::Astc5x5 => Some(5),
            TextureFormat::Astc6x6 => Some(6),
            TextureFormat::Astc8x8 => Some(8),
            TextureFormat::Astc10x10 => Some(10),
            TextureFormat::Astc12x12 => Some(12),
            _ => None,
        }
    }

    /// The smallest ASTC block sizes barely improve quality over 6x6 at a
    /// notable size cost; the batch engine rewrites them to 6x6.
    pub fn redundant_astc_replacement(&self) -> Option<TextureFormat> {
        match self {
            TextureFormat::Astc4x4 | TextureFormat::Astc5x5 => Some(TextureFormat::Astc6x6),
            _ => None,
        }
    }
}

impl fmt::Display for TextureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TextureFormat::Automatic => "Automatic",
            TextureFormat::Astc4x4 => "ASTC_4x4",
            TextureFormat::Astc5x5 => "ASTC_5x5",
            TextureFormat::Astc6x6 => "ASTC_6x6",
            TextureFormat::Astc8x8 => "ASTC_8x8",
            TextureFormat::Astc10x10 => "ASTC_10x10",
            TextureFormat::Astc12x12 => "ASTC_12x12",
            TextureFormat::EtcRgb4 => "ETC_RGB4",
            TextureFormat::EtcRgb4Crunched => "ETC_RGB4Crunched",
            TextureFormat::Etc2Rgb4 => "ETC2_RGB4",
            TextureFormat::Etc2Rgba8 => "ETC2_RGBA8",
            TextureFormat::Etc2Rgba8Crunched => "ETC2_RGBA8Crunched",
            TextureFormat::PvrtcRgb2 => "PVRTC_RGB2",
            TextureFormat::PvrtcRgb4 => "PVRTC_RGB4",
            TextureFormat::PvrtcRgba2 => "PVRTC_RGBA2",
            TextureFormat::PvrtcRgba4 => "PVRTC_RGBA4",
            TextureFormat::Dxt1 => "DXT1",
            TextureFormat::Dxt1Crunched => "DXT1Crunched",
            TextureFormat::Dxt5 => "DXT5",
            TextureFormat::Dxt5Crunched => "DXT5Crunched",
            TextureFormat::Alpha8 => "Alpha8",
            TextureFormat::Rgb24 => "RGB24",
            TextureFormat::Rgba16 => "RGBA16",
            TextureFormat::Rgba32 => "RGBA32",
        };
        f.write_str(s)
    }
}

impl FromStr for TextureFormat {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match norm.as_str() {
            "automatic" | "auto" => Ok(Self::Automatic),
            "astc4x4" => Ok(Self::Astc4x4),
            "astc5x5" => Ok(Self::Astc5x5),
            "astc6x6" => Ok(Self::Astc6x6),
            "astc8x8" => Ok(Self::Astc8x8),
            "astc10x10" => Ok(Self::Astc10x10),
            "astc12x12" => Ok(Self::Astc12x12),
            "etcrgb4" => Ok(Self::EtcRgb4),
            "etcrgb4crunched" => Ok(Self::EtcRgb4Crunched),
            "etc2rgb4" => Ok(Self::Etc2Rgb4),
            "etc2rgba8" => Ok(Self::Etc2Rgba8),
            "etc2rgba8crunched" => Ok(Self::Etc2Rgba8Crunched),
            "pvrtcrgb2" => Ok(Self::PvrtcRgb2),
            "pvrtcrgb4" => Ok(Self::PvrtcRgb4),
            "pvrtcrgba2" => Ok(Self::PvrtcRgba2),
            "pvrtcrgba4" => Ok(Self::PvrtcRgba4),
            "dxt1" => Ok(Self::Dxt1),
            "dxt1crunched" => Ok(Self::Dxt1Crunched),
            "dxt5" => Ok(Self::Dxt5),
            "dxt5crunched" => Ok(Self::Dxt5Crunched),
            "alpha8" => Ok(Self::Alpha8),
            "rgb24" => Ok(Self::Rgb24),
            "rgba16" => Ok(Self::Rgba16),
            "rgba32" => Ok(Self::Rgba32),
            _ => Err(()),
        }
    }
}
