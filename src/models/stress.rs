use crate::models::workload::{Attribute, ATTRIBUTE_COUNT};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Workload Stress Score, always within [`Wss::MIN`, `Wss::MAX`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Wss(u8);

impl Wss {
    pub const MIN: u8 = 9;
    pub const MAX: u8 = 27;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Wss {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Wss::new(value).ok_or_else(|| {
            format!(
                "WSS {} outside [{}, {}]",
                value,
                Wss::MIN,
                Wss::MAX
            )
        })
    }
}

impl From<Wss> for u8 {
    fn from(wss: Wss) -> Self {
        wss.0
    }
}

impl std::fmt::Display for Wss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Three-level stress outcome, ordered Low < Medium < High
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
pub enum StressCategory {
    Low,
    Medium,
    High,
}

impl StressCategory {
    pub const ALL: [StressCategory; 3] =
        [StressCategory::Low, StressCategory::Medium, StressCategory::High];

    /// Class index used as the classifier label
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Per-attribute points behind a score, in canonical attribute order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    points: [u8; ATTRIBUTE_COUNT],
}

impl ScoreBreakdown {
    pub(crate) fn new(points: [u8; ATTRIBUTE_COUNT]) -> Self {
        debug_assert!(points.iter().all(|p| (1..=3).contains(p)));
        Self { points }
    }

    pub fn points(&self) -> &[u8; ATTRIBUTE_COUNT] {
        &self.points
    }

    pub fn points_for(&self, attribute: Attribute) -> u8 {
        self.points[attribute.position()]
    }

    pub fn total(&self) -> Wss {
        let sum: u8 = self.points.iter().sum();
        // nine summands in 1..=3 keep the sum within 9..=27
        Wss(sum)
    }

    /// Attributes paired with their points
    pub fn iter(&self) -> impl Iterator<Item = (Attribute, u8)> + '_ {
        Attribute::ALL.into_iter().zip(self.points.iter().copied())
    }
}
