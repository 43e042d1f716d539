// Public modules
pub mod chat_completion;
pub mod image_generation;
pub mod image_size;
pub mod message;
pub mod model;

// Re-exports
pub use chat_completion::{ChatCompletion, ChatCompletionParams, Choice, ChoiceMessage};
pub use image_generation::{Image, ImageGenerateParams, ImagesResponse};
pub use image_size::ImageSize;
pub use message::{Message, Role};
pub use model::{KnownModel, Model};
