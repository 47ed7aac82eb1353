use std::path::PathBuf;

use crate::{
    config::DEFAULT_ENV_FILE,
    generator::{DEFAULT_ASPECT_RATIO, DEFAULT_OUTPUT_ROOT},
    image_model::Model,
};

/// Generate images using Flux models.
#[derive(Debug, clap::Parser)]
#[command(name = "generate")]
pub struct Cli {
    /// The prompt for image generation
    pub prompt: String,

    /// The model to use
    #[arg(long, value_enum, default_value_t = Model::Pro)]
    pub model: Model,

    /// Aspect ratio of image, only used by the pro model
    #[arg(long = "aspect_ratio", default_value = DEFAULT_ASPECT_RATIO)]
    pub aspect_ratio: String,

    /// Number of images to generate
    #[arg(long = "num_images", default_value_t = 1)]
    pub num_images: u64,

    /// Directory the timestamped run directories are created in
    #[arg(long = "output_root", default_value = DEFAULT_OUTPUT_ROOT)]
    pub output_root: PathBuf,

    /// File with REPLICATE_API_TOKEN and friends, may be absent
    #[arg(long = "env_file", default_value = DEFAULT_ENV_FILE)]
    pub env_file: PathBuf,
}

#[cfg(test)]
mod test {
    use clap::{CommandFactory, Parser};

    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["generate", "a cat in space"]).unwrap();
        assert_eq!(cli.prompt, "a cat in space");
        assert_eq!(cli.model, Model::Pro);
        assert_eq!(cli.aspect_ratio, "1:1");
        assert_eq!(cli.num_images, 1);
        assert_eq!(cli.output_root, PathBuf::from("outputs"));
        assert_eq!(cli.env_file, PathBuf::from(".env"));
    }

    #[test]
    fn all_flags() {
        let cli = Cli::try_parse_from([
            "generate",
            "a cat",
            "--model",
            "schnell",
            "--aspect_ratio",
            "16:9",
            "--num_images",
            "4",
        ])
        .unwrap();
        assert_eq!(cli.model, Model::Schnell);
        assert_eq!(cli.aspect_ratio, "16:9");
        assert_eq!(cli.num_images, 4);
    }

    #[test]
    fn rejects_unknown_model() {
        assert!(Cli::try_parse_from(["generate", "a cat", "--model", "dev"]).is_err());
    }

    #[test]
    fn prompt_is_required() {
        assert!(Cli::try_parse_from(["generate"]).is_err());
    }
}
