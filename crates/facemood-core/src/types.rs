use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Categorical confidence scale the Vision API reports per emotion.
///
/// Variant order matches the service's positional encoding (0..=5).
/// Unrecognized wire names decode as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Likelihood {
    #[default]
    Unknown,
    VeryUnlikely,
    Unlikely,
    Possible,
    Likely,
    VeryLikely,
}

impl Likelihood {
    pub const ALL: [Likelihood; 6] = [
        Likelihood::Unknown,
        Likelihood::VeryUnlikely,
        Likelihood::Unlikely,
        Likelihood::Possible,
        Likelihood::Likely,
        Likelihood::VeryLikely,
    ];

    /// Map a positional index (as used by the gRPC/protobuf encoding) to a likelihood.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Parse a wire name; anything unrecognized is `Unknown`.
    pub fn from_wire(name: &str) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|l| l.as_str() == name)
            .unwrap_or(Likelihood::Unknown)
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Wire name, e.g. `VERY_LIKELY`.
    pub fn as_str(self) -> &'static str {
        match self {
            Likelihood::Unknown => "UNKNOWN",
            Likelihood::VeryUnlikely => "VERY_UNLIKELY",
            Likelihood::Unlikely => "UNLIKELY",
            Likelihood::Possible => "POSSIBLE",
            Likelihood::Likely => "LIKELY",
            Likelihood::VeryLikely => "VERY_LIKELY",
        }
    }
}

impl<'de> Deserialize<'de> for Likelihood {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&name))
    }
}

impl fmt::Display for Likelihood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A polygon vertex in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Vertex {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
}

impl Vertex {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// One face reported by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceRecord {
    /// Ordered vertices; the polygon closes back onto the first one.
    pub bounding_poly: Vec<Vertex>,
    pub detection_confidence: f32,
    pub anger: Likelihood,
    pub joy: Likelihood,
    pub surprise: Likelihood,
    pub sorrow: Likelihood,
}

impl FaceRecord {
    /// Face with the given polygon and confidence, all likelihoods `Unknown`.
    pub fn new(bounding_poly: Vec<Vertex>, detection_confidence: f32) -> Self {
        Self {
            bounding_poly,
            detection_confidence,
            anger: Likelihood::Unknown,
            joy: Likelihood::Unknown,
            surprise: Likelihood::Unknown,
            sorrow: Likelihood::Unknown,
        }
    }

    pub fn with_emotions(mut self, anger: Likelihood, joy: Likelihood, surprise: Likelihood) -> Self {
        self.anger = anger;
        self.joy = joy;
        self.surprise = surprise;
        self
    }
}

/// Overall mood of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Rating {
    Good,
    Fair,
    Bad,
}

impl Rating {
    pub fn as_str(self) -> &'static str {
        match self {
            Rating::Good => "GOOD",
            Rating::Fair => "FAIR",
            Rating::Bad => "BAD",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_likelihood_index_mapping() {
        let names = ["UNKNOWN", "VERY_UNLIKELY", "UNLIKELY", "POSSIBLE", "LIKELY", "VERY_LIKELY"];
        for (i, name) in names.iter().enumerate() {
            let l = Likelihood::from_index(i).unwrap();
            assert_eq!(l.as_str(), *name);
            assert_eq!(l.index(), i);
        }
        assert_eq!(Likelihood::from_index(6), None);
    }

    #[test]
    fn test_likelihood_wire_names() {
        let l: Likelihood = serde_json::from_str("\"VERY_LIKELY\"").unwrap();
        assert_eq!(l, Likelihood::VeryLikely);
        assert_eq!(serde_json::to_string(&Likelihood::VeryUnlikely).unwrap(), "\"VERY_UNLIKELY\"");
    }

    #[test]
    fn test_likelihood_unrecognized_is_unknown() {
        let l: Likelihood = serde_json::from_str("\"LIKELIHOOD_UNSPECIFIED\"").unwrap();
        assert_eq!(l, Likelihood::Unknown);
        // Space instead of underscore is not a wire name.
        assert_eq!(Likelihood::from_wire("VERY LIKELY"), Likelihood::Unknown);
    }

    #[test]
    fn test_likelihood_field_in_record() {
        let face: FaceRecord = serde_json::from_str(
            r#"{"bounding_poly":[{"x":1,"y":2}],"detection_confidence":0.5,
                "anger":"LIKELY","joy":"VERY_LIKELY","surprise":"bogus","sorrow":"UNKNOWN"}"#,
        )
        .unwrap();
        assert_eq!(face.anger, Likelihood::Likely);
        assert_eq!(face.joy, Likelihood::VeryLikely);
        assert_eq!(face.surprise, Likelihood::Unknown);
    }

    #[test]
    fn test_likelihood_rejects_non_string() {
        assert!(serde_json::from_str::<Likelihood>("3").is_err());
    }

    #[test]
    fn test_vertex_missing_coordinates_default_to_zero() {
        let v: Vertex = serde_json::from_str(r#"{"y": 12}"#).unwrap();
        assert_eq!(v, Vertex::new(0, 12));
    }

    #[test]
    fn test_rating_display() {
        assert_eq!(Rating::Good.to_string(), "GOOD");
        assert_eq!(Rating::Fair.to_string(), "FAIR");
        assert_eq!(Rating::Bad.to_string(), "BAD");
    }
}
