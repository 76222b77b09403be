//! Mood scoring — reduces per-face emotion likelihoods to one image rating.
//!
//! Every face contributes an anger, joy and surprise weight to a single
//! running score for the whole image. The score is bucketed into a band
//! value, and the band selects GOOD, FAIR or BAD.

use crate::detector::{DetectorError, FaceDetector};
use crate::types::{FaceRecord, Likelihood, Rating};

// Weights indexed by `Likelihood::index()`:
// [UNKNOWN, VERY_UNLIKELY, UNLIKELY, POSSIBLE, LIKELY, VERY_LIKELY]
const ANGER_WEIGHTS: [i32; 6] = [0, 4, 2, 0, -2, -4];
const JOY_WEIGHTS: [i32; 6] = [0, -4, -2, 0, 2, 4];
const SURPRISE_WEIGHTS: [i32; 6] = [0, -2, -1, 0, 1, 2];

const BAND_LIMIT: i32 = 8;

/// Which weight and band tables to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoringMode {
    /// VERY_LIKELY carries its full weight; band limits are inclusive (±8).
    #[default]
    Corrected,
    /// Historical behavior: VERY_LIKELY never matched and scored 0, and a
    /// score of exactly ±8 fell through every band (band 0).
    Legacy,
}

/// Pure reduction from face records to a [`Rating`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MoodScorer {
    mode: ScoringMode,
}

impl MoodScorer {
    pub fn new(mode: ScoringMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ScoringMode {
        self.mode
    }

    fn weight(&self, table: &[i32; 6], likelihood: Likelihood) -> i32 {
        if self.mode == ScoringMode::Legacy && likelihood == Likelihood::VeryLikely {
            return 0;
        }
        table[likelihood.index()]
    }

    /// Contribution of a single face (anger + joy + surprise).
    pub fn face_score(&self, face: &FaceRecord) -> i32 {
        self.weight(&ANGER_WEIGHTS, face.anger)
            + self.weight(&JOY_WEIGHTS, face.joy)
            + self.weight(&SURPRISE_WEIGHTS, face.surprise)
    }

    /// Sum of every face's contribution. Order of faces does not matter.
    pub fn emotion_score(&self, faces: &[FaceRecord]) -> i32 {
        faces.iter().map(|f| self.face_score(f)).sum()
    }

    /// Bucket an emotion score into a band value.
    pub fn band(&self, score: i32) -> i32 {
        match self.mode {
            ScoringMode::Corrected => match score {
                0 => 1,
                s if s <= -BAND_LIMIT => -4,
                s if s < 0 => -3,
                s if s >= BAND_LIMIT => 3,
                _ => 2,
            },
            ScoringMode::Legacy => match score {
                0 => 1,
                s if s < 0 && s > -BAND_LIMIT => -3,
                s if s < -BAND_LIMIT => -4,
                s if s > 0 && s < BAND_LIMIT => 2,
                s if s > BAND_LIMIT => 3,
                _ => 0,
            },
        }
    }

    /// Rate a set of already-detected faces.
    pub fn rate(&self, faces: &[FaceRecord]) -> Rating {
        let score = self.emotion_score(faces);
        let band = self.band(score);
        tracing::debug!(faces = faces.len(), score, band, mode = ?self.mode, "mood scored");
        rating_for_band(band)
    }
}

/// Final three-way rating: only band 2 is FAIR, anything lower is BAD.
pub fn rating_for_band(band: i32) -> Rating {
    match band {
        2 => Rating::Fair,
        b if b < 2 => Rating::Bad,
        _ => Rating::Good,
    }
}

/// Run detection on a raw image payload and rate the faces it finds.
pub fn rate_image(
    detector: &dyn FaceDetector,
    image: &[u8],
    max_results: u32,
    scorer: &MoodScorer,
) -> Result<Rating, DetectorError> {
    let faces = detector.detect(image, max_results)?;
    Ok(scorer.rate(&faces))
}
