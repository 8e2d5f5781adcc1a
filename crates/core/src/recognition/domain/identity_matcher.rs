use serde::{Deserialize, Serialize};

use super::gallery::Gallery;

pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.6;

/// Distances closer than this are treated as ties; the earlier entry wins.
const TIE_EPSILON: f64 = 1e-9;

/// How embedding distance is measured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// `1 - cosine similarity`, in `[0, 2]`.
    #[default]
    Cosine,
    Euclidean,
}

impl DistanceMetric {
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f64 {
        match self {
            Self::Cosine => {
                let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
                for (x, y) in a.iter().zip(b) {
                    let (x, y) = (*x as f64, *y as f64);
                    dot += x * y;
                    na += x * x;
                    nb += y * y;
                }
                if na == 0.0 || nb == 0.0 {
                    return 1.0;
                }
                1.0 - dot / (na.sqrt() * nb.sqrt())
            }
            Self::Euclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| {
                    let d = *x as f64 - *y as f64;
                    d * d
                })
                .sum::<f64>()
                .sqrt(),
        }
    }
}

impl std::str::FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "euclidean" => Ok(Self::Euclidean),
            other => Err(format!("unknown distance metric {other:?}")),
        }
    }
}

/// Outcome of comparing one probe against the gallery.
#[derive(Clone, Debug, PartialEq)]
pub enum MatchResult {
    /// Confidence is `1 - distance`.
    Matched { name: String, confidence: f64 },
    NoMatch,
}

impl MatchResult {
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Matched { name, .. } => Some(name),
            Self::NoMatch => None,
        }
    }

    pub fn confidence(&self) -> Option<f64> {
        match self {
            Self::Matched { confidence, .. } => Some(*confidence),
            Self::NoMatch => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

/// Nearest-neighbour lookup of a probe embedding in a [`Gallery`].
///
/// The closest entry is a match when its distance is at most the threshold.
#[derive(Clone, Copy, Debug)]
pub struct IdentityMatcher {
    threshold: f64,
    metric: DistanceMetric,
}

impl IdentityMatcher {
    pub fn new(threshold: f64, metric: DistanceMetric) -> Self {
        Self { threshold, metric }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn best_match(&self, probe: &[f32], gallery: &Gallery) -> MatchResult {
        let mut best: Option<(&str, f64)> = None;
        for entry in gallery.entries() {
            if entry.embedding.len() != probe.len() {
                continue;
            }
            let d = self.metric.distance(probe, &entry.embedding);
            if !d.is_finite() {
                continue;
            }
            let closer = match best {
                Some((_, best_d)) => d < best_d - TIE_EPSILON,
                None => true,
            };
            if closer {
                best = Some((entry.name.as_str(), d));
            }
        }

        match best {
            Some((name, d)) if d <= self.threshold => MatchResult::Matched {
                name: name.to_string(),
                confidence: 1.0 - d,
            },
            _ => MatchResult::NoMatch,
        }
    }
}

impl Default for IdentityMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD, DistanceMetric::default())
    }
}
