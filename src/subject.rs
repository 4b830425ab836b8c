//! Canonical subject keys and weight maps.
//!
//! Every curriculum subject the planner knows about is a [`SubjectKey`].
//! Weights are carried in an insertion-ordered map so that plans built
//! from the same configuration always come out in the same order.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Effective weight for a subject when no layer of configuration names it.
pub const DEFAULT_SUBJECT_WEIGHT: f64 = 5.0;

/// The fixed set of subjects a lesson can be planned over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubjectKey {
    Mathematics,
    English,
    Science,
    SocialStudies,
    ComputerScience,
    CreativeArts,
    Music,
    BodyMovement,
    LifeEssentials,
    MentalWellness,
    WorldLanguages,
    GlobalGeography,
}

impl SubjectKey {
    /// All subjects in curriculum order.
    pub const ALL: [SubjectKey; 12] = [
        SubjectKey::Mathematics,
        SubjectKey::English,
        SubjectKey::Science,
        SubjectKey::SocialStudies,
        SubjectKey::ComputerScience,
        SubjectKey::CreativeArts,
        SubjectKey::Music,
        SubjectKey::BodyMovement,
        SubjectKey::LifeEssentials,
        SubjectKey::MentalWellness,
        SubjectKey::WorldLanguages,
        SubjectKey::GlobalGeography,
    ];

    /// Returns the canonical key as it appears in configuration and output.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKey::Mathematics => "Mathematics",
            SubjectKey::English => "English",
            SubjectKey::Science => "Science",
            SubjectKey::SocialStudies => "SocialStudies",
            SubjectKey::ComputerScience => "ComputerScience",
            SubjectKey::CreativeArts => "CreativeArts",
            SubjectKey::Music => "Music",
            SubjectKey::BodyMovement => "BodyMovement",
            SubjectKey::LifeEssentials => "LifeEssentials",
            SubjectKey::MentalWellness => "MentalWellness",
            SubjectKey::WorldLanguages => "WorldLanguages",
            SubjectKey::GlobalGeography => "GlobalGeography",
        }
    }
}

impl fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a string does not name a known subject.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown subject '{0}'")]
pub struct UnknownSubject(pub String);

impl FromStr for SubjectKey {
    type Err = UnknownSubject;

    /// Parses canonical keys case-insensitively, ignoring spaces, dashes and
    /// underscores, plus the short aliases used by school configuration.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();

        let key = match normalized.as_str() {
            "mathematics" | "math" | "maths" => SubjectKey::Mathematics,
            "english" | "ela" | "languagearts" => SubjectKey::English,
            "science" => SubjectKey::Science,
            "socialstudies" => SubjectKey::SocialStudies,
            "computerscience" | "cs" => SubjectKey::ComputerScience,
            "creativearts" | "art" | "arts" => SubjectKey::CreativeArts,
            "music" => SubjectKey::Music,
            "bodymovement" | "pe" | "physicaleducation" => SubjectKey::BodyMovement,
            "lifeessentials" => SubjectKey::LifeEssentials,
            "mentalwellness" | "wellness" => SubjectKey::MentalWellness,
            "worldlanguages" | "languages" => SubjectKey::WorldLanguages,
            "globalgeography" | "geography" => SubjectKey::GlobalGeography,
            _ => return Err(UnknownSubject(s.to_string())),
        };
        Ok(key)
    }
}

impl Serialize for SubjectKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SubjectKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Subject priorities for one lesson-planning request.
///
/// Iteration follows insertion order; the minute distributor relies on this
/// for its tie-break.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectWeights(IndexMap<SubjectKey, f64>);

impl SubjectWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the weight for a subject, keeping its original position if it was
    /// already present.
    pub fn with(mut self, subject: SubjectKey, weight: f64) -> Self {
        self.insert(subject, weight);
        self
    }

    pub fn insert(&mut self, subject: SubjectKey, weight: f64) {
        self.0.insert(subject, weight);
    }

    pub fn get(&self, subject: SubjectKey) -> Option<f64> {
        self.0.get(&subject).copied()
    }

    /// Weight used for allocation: negative and non-finite values count as 0.
    pub fn effective(&self, subject: SubjectKey) -> f64 {
        self.get(subject).map(sanitize_weight).unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SubjectKey, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    pub fn subjects(&self) -> impl Iterator<Item = SubjectKey> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of effective weights.
    pub fn total(&self) -> f64 {
        self.0.values().copied().map(sanitize_weight).sum()
    }

    /// True when at least one subject carries a positive weight.
    pub fn has_positive(&self) -> bool {
        self.0.values().any(|w| sanitize_weight(*w) > 0.0)
    }
}

impl FromIterator<(SubjectKey, f64)> for SubjectWeights {
    fn from_iter<I: IntoIterator<Item = (SubjectKey, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn sanitize_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}
