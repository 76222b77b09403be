use anyhow::{Context, Result};
use clap::Parser;
use facemood_core::annotate::load_font;
use facemood_core::{Annotator, FaceDetector, MoodScorer, ScoringMode, VisionClient, DEFAULT_MAX_RESULTS};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "facemood", about = "Detects faces in the given image.")]
struct Cli {
    /// The image you'd like to detect faces in
    input_image: PathBuf,

    /// The name of the output file
    #[arg(long = "out", default_value = "out.jpg")]
    output: PathBuf,

    /// The max results of face detection
    #[arg(long, default_value_t = DEFAULT_MAX_RESULTS)]
    max_results: u32,

    /// Also print a GOOD/FAIR/BAD mood rating for the detected faces
    #[arg(long)]
    mood: bool,

    /// Score VERY_LIKELY as 0 and use the historical band edges
    #[arg(long, requires = "mood")]
    legacy_scoring: bool,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn found_summary(count: usize) -> String {
    format!("Found {count} face{}", if count == 1 { "" } else { "s" })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;

    // Read once; detection and annotation both borrow the same buffer.
    let image = std::fs::read(&cli.input_image)
        .with_context(|| format!("reading {}", cli.input_image.display()))?;

    let client = VisionClient::new(config.vision()).context("building Vision API client")?;
    let faces = client
        .detect(&image, cli.max_results)
        .context("face detection failed")?;

    println!("{}", found_summary(faces.len()));
    println!("Writing to file {}", cli.output.display());

    let font = load_font(config.font_path.as_deref())?;
    let annotator = Annotator::new(font).with_label_scale(config.label_scale);
    tracing::debug!(labels = annotator.has_font(), "annotator ready");
    annotator
        .write(&image, &faces, &cli.output)
        .with_context(|| format!("writing {}", cli.output.display()))?;

    if cli.mood {
        let mode = if cli.legacy_scoring {
            ScoringMode::Legacy
        } else {
            ScoringMode::Corrected
        };
        let scorer = MoodScorer::new(mode);
        tracing::debug!(mode = ?scorer.mode(), "rating mood");
        println!("Mood: {}", scorer.rate(&faces));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["facemood", "photo.jpg"]).unwrap();
        assert_eq!(cli.input_image, PathBuf::from("photo.jpg"));
        assert_eq!(cli.output, PathBuf::from("out.jpg"));
        assert_eq!(cli.max_results, 4);
        assert!(!cli.mood);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "facemood", "in.png", "--out", "result.png", "--max-results", "10", "--mood", "--legacy-scoring",
        ])
        .unwrap();
        assert_eq!(cli.output, PathBuf::from("result.png"));
        assert_eq!(cli.max_results, 10);
        assert!(cli.mood && cli.legacy_scoring);
    }

    #[test]
    fn test_input_required() {
        assert!(Cli::try_parse_from(["facemood"]).is_err());
    }

    #[test]
    fn test_found_summary_plural() {
        assert_eq!(found_summary(0), "Found 0 faces");
        assert_eq!(found_summary(1), "Found 1 face");
        assert_eq!(found_summary(3), "Found 3 faces");
    }
}
