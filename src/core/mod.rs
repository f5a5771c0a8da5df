pub mod engine;
pub mod layers;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod render;

pub use crate::domain::model::{FeedOutcome, FeedPayload};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
