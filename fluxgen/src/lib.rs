use crate::image_model::Inference;

pub mod cli;
pub mod config;
pub mod generator;
pub mod image_model;

pub use generator::ImageGenerator;
pub use image_model::Model;

pub type InferenceBox = Box<dyn Inference + Send + Sync>;
