//! Image label detection web service.
//!
//! Serves an upload form, forwards the uploaded image to a hosted vision
//! service for label detection and renders the labels next to the image.

pub mod config;
pub mod error;
pub mod server;
pub mod upload;
pub mod views;
pub mod vision;

pub use config::{Config, VisionConfig};
pub use error::{AppError, Result};
pub use server::{create_app, serve, AppState};
pub use upload::UploadedImage;
pub use vision::{CloudVisionClient, LabelDetector, LabelResult};
