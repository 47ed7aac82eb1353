use clap::Parser;
use color_eyre::Result;
use fluxgen::{
    cli::Cli,
    config::Config,
    generator::ImageGenerator,
    image_model::ReplicateClient,
};
use log::{LevelFilter, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    pretty_env_logger::formatted_builder()
        .filter_level(LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();
    color_eyre::install()?;
    let Cli {
        prompt,
        model,
        aspect_ratio,
        num_images,
        output_root,
        env_file,
    } = Cli::parse();

    let config = Config::load(&env_file)?;
    let client = ReplicateClient::new(&config);
    let generator = ImageGenerator::with_output_root(prompt, model, Box::new(client), &output_root)?;

    let report = generator.generate_images(&aspect_ratio, num_images).await?;
    info!(
        "Saved {} image(s) to {}, {} failed to download",
        report.saved.len(),
        generator.output_dir().display(),
        report.failed.len()
    );

    Ok(())
}
