use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Size of a generated image.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageSize {
    /// 256x256 pixels.
    #[serde(rename = "256x256")]
    Small,

    /// 512x512 pixels.
    #[serde(rename = "512x512")]
    Medium,

    /// 1024x1024 pixels.
    #[serde(rename = "1024x1024")]
    Large,
}

impl ImageSize {
    /// The `WIDTHxHEIGHT` token the images endpoint expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Small => "256x256",
            ImageSize::Medium => "512x512",
            ImageSize::Large => "1024x1024",
        }
    }

    /// Maps a menu choice (`1`, `2` or `3`) to a size.
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice {
            "1" => Some(ImageSize::Small),
            "2" => Some(ImageSize::Medium),
            "3" => Some(ImageSize::Large),
            _ => None,
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "256x256" | "small" => Ok(ImageSize::Small),
            "512x512" | "medium" => Ok(ImageSize::Medium),
            "1024x1024" | "large" => Ok(ImageSize::Large),
            _ => Err(format!(
                "Invalid image size: {}. Valid options: 256x256, 512x512, 1024x1024",
                s
            )),
        }
    }
}
