//! facemood-core — Face detection, mood scoring and image annotation.
//!
//! Faces come from the Google Cloud Vision API; the mood scorer reduces
//! their emotion likelihoods to a GOOD/FAIR/BAD rating, and the annotator
//! outlines each face on a copy of the image.

pub mod annotate;
pub mod detector;
pub mod scoring;
pub mod types;

pub use annotate::{AnnotateError, Annotator};
pub use detector::{DetectorError, FaceDetector, VisionClient, VisionConfig, DEFAULT_MAX_RESULTS};
pub use scoring::{rate_image, MoodScorer, ScoringMode};
pub use types::{FaceRecord, Likelihood, Rating, Vertex};
