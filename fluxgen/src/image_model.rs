use std::{pin::Pin, str::FromStr};

use color_eyre::Result;
use nonempty::NonEmpty;
use serde::Serialize;
use strum::{Display, EnumIter, IntoEnumIterator};
use thiserror::Error;

pub mod replicate;
pub use replicate::ReplicateClient;

pub const SAFETY_TOLERANCE: u8 = 5;
pub const NUM_INFERENCE_STEPS: u8 = 4;
pub const OUTPUT_FORMAT: &str = "jpg";

#[derive(Debug, Clone, Copy, Display, clap::ValueEnum, PartialEq, Eq, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Model {
    /// Flux 1.1 Pro Ultra, one image per prediction
    Pro,
    /// Flux Schnell, may return several images per prediction
    Schnell,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid model '{0}'. Choose 'pro' or 'schnell'.")]
pub struct InvalidModel(pub String);

impl FromStr for Model {
    type Err = InvalidModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Model::iter()
            .find(|m| m.to_string() == s)
            .ok_or_else(|| InvalidModel(s.to_string()))
    }
}

impl Model {
    /// `owner/name` of the model on Replicate
    pub fn replicate_id(&self) -> &'static str {
        match self {
            Model::Pro => "black-forest-labs/flux-1.1-pro-ultra",
            Model::Schnell => "black-forest-labs/flux-schnell",
        }
    }

    /// Schnell has no aspect ratio input, so `aspect_ratio` is dropped for it.
    pub fn build_request(&self, prompt: &str, aspect_ratio: &str, seed: u64) -> GenerationRequest {
        match self {
            Model::Pro => GenerationRequest::Pro(ProInput {
                prompt: prompt.to_string(),
                aspect_ratio: aspect_ratio.to_string(),
                safety_tolerance: SAFETY_TOLERANCE,
                seed,
                output_format: OUTPUT_FORMAT,
            }),
            Model::Schnell => GenerationRequest::Schnell(SchnellInput {
                prompt: prompt.to_string(),
                num_inference_steps: NUM_INFERENCE_STEPS,
                seed,
                output_format: OUTPUT_FORMAT,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum GenerationRequest {
    Pro(ProInput),
    Schnell(SchnellInput),
}

impl GenerationRequest {
    pub fn model(&self) -> Model {
        match self {
            GenerationRequest::Pro(_) => Model::Pro,
            GenerationRequest::Schnell(_) => Model::Schnell,
        }
    }

    pub fn seed(&self) -> u64 {
        match self {
            GenerationRequest::Pro(input) => input.seed,
            GenerationRequest::Schnell(input) => input.seed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProInput {
    pub prompt: String,
    pub aspect_ratio: String,
    pub safety_tolerance: u8,
    pub seed: u64,
    pub output_format: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchnellInput {
    pub prompt: String,
    pub num_inference_steps: u8,
    pub seed: u64,
    pub output_format: &'static str,
}

/// Image URLs produced by one inference call, in the order the service returned them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult(pub NonEmpty<String>);

impl GenerationResult {
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

pub trait Inference {
    fn run<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<GenerationResult>> + Send + 'a>>;
}

#[cfg(test)]
mod test {
    use expect_test::expect;

    use super::*;

    #[test]
    fn pro_request_serialization() {
        let req = Model::Pro.build_request("a red fox", "16:9", 3);
        let expect = expect![[r#"{"prompt":"a red fox","aspect_ratio":"16:9","safety_tolerance":5,"seed":3,"output_format":"jpg"}"#]];
        expect.assert_eq(&serde_json::to_string(&req).unwrap());
    }

    #[test]
    fn schnell_request_drops_aspect_ratio() {
        let req = Model::Schnell.build_request("a red fox", "16:9", 0);
        let expect = expect![[r#"{"prompt":"a red fox","num_inference_steps":4,"seed":0,"output_format":"jpg"}"#]];
        expect.assert_eq(&serde_json::to_string(&req).unwrap());
    }

    #[test]
    fn request_seed() {
        assert_eq!(Model::Pro.build_request("p", "1:1", 7).seed(), 7);
        assert_eq!(Model::Schnell.build_request("p", "1:1", 9).seed(), 9);
    }

    #[test]
    fn request_knows_its_model() {
        for model in Model::iter() {
            assert_eq!(model.build_request("p", "1:1", 0).model(), model);
        }
    }

    #[test]
    fn parse_model_names() {
        assert_eq!("pro".parse::<Model>(), Ok(Model::Pro));
        assert_eq!("schnell".parse::<Model>(), Ok(Model::Schnell));
        assert_eq!(
            "dev".parse::<Model>(),
            Err(InvalidModel("dev".to_string()))
        );
        assert_eq!(
            InvalidModel("Pro".into()).to_string(),
            "Invalid model 'Pro'. Choose 'pro' or 'schnell'."
        );
    }

    #[test]
    fn display_matches_parse() {
        for model in Model::iter() {
            assert_eq!(model.to_string().parse::<Model>(), Ok(model));
        }
    }
}
