use serde::{Deserialize, Serialize};

use crate::types::ImageSize;

/// Request body for the image generation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageGenerateParams {
    /// Text description of the desired image.
    pub prompt: String,

    /// Number of images to generate.
    pub n: u32,

    /// Size of the generated image.
    pub size: ImageSize,
}

impl ImageGenerateParams {
    /// Create parameters for a single image.
    pub fn new(prompt: impl Into<String>, size: ImageSize) -> Self {
        Self {
            prompt: prompt.into(),
            n: 1,
            size,
        }
    }
}

/// Response body of the image generation endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImagesResponse {
    /// Creation time as a unix timestamp.
    #[serde(default)]
    pub created: Option<u64>,

    /// The generated images.
    pub data: Vec<Image>,
}

/// A generated image reference.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Image {
    /// URL of the image, when requested as a URL.
    #[serde(default)]
    pub url: Option<String>,

    /// The prompt after any rewriting done by the service.
    #[serde(default)]
    pub revised_prompt: Option<String>,
}

impl ImagesResponse {
    /// Returns the URL of the first image, if there is one.
    pub fn first_url(&self) -> Option<&str> {
        self.data.first().and_then(|image| image.url.as_deref())
    }
}
