//! # Geography classification
//!
//! ## Responsibility
//! Turn free-text Philippine locations into a [`Place`] (a known province,
//! the metro hub, or unknown) and a [`MacroRegion`].
//!
//! ## Guarantees
//! - Pure: no I/O, no shared state, same input always yields the same output
//! - Total: every string classifies, unmatched text becomes [`Place::Unknown`]
//! - Longest match wins, so `"Quezon City"` is the hub and not Quezon province,
//!   and `"Cagayan de Oro"` is Mindanao and not Cagayan
//!
//! ## NOT Responsible For
//! - Pricing (that belongs to `fallback`)

pub mod tables;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use tables::{Province, HUB_ADJACENT_PROVINCES, METRO_HUB_DISTRICTS, METRO_HUB_LABEL, PROVINCES};

/// The three island groups used for inter-island pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MacroRegion {
    /// Luzon, including the metro hub.
    Luzon,
    /// Visayas.
    Visayas,
    /// Mindanao.
    Mindanao,
}

impl MacroRegion {
    /// All regions in classification order.
    pub const ALL: [MacroRegion; 3] = [Self::Luzon, Self::Visayas, Self::Mindanao];

    /// Provinces that belong to this region.
    pub fn provinces(self) -> impl Iterator<Item = &'static Province> {
        PROVINCES.iter().filter(move |p| p.region == self)
    }

    /// Display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Luzon => "Luzon",
            Self::Visayas => "Visayas",
            Self::Mindanao => "Mindanao",
        }
    }
}

impl fmt::Display for MacroRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a location string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Place {
    /// A recognised province (matched by name or by one of its city aliases).
    Province(&'static Province),
    /// One of the metro hub districts.
    MetroHub,
    /// Nothing in the tables matched.
    Unknown,
}

impl Place {
    /// Island group, `None` for unknown places. The hub sits in Luzon.
    pub fn region(&self) -> Option<MacroRegion> {
        match self {
            Self::Province(p) => Some(p.region),
            Self::MetroHub => Some(MacroRegion::Luzon),
            Self::Unknown => None,
        }
    }

    /// Normalized province label, with the hub standing in as its own province.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::Province(p) => Some(p.name),
            Self::MetroHub => Some(METRO_HUB_LABEL),
            Self::Unknown => None,
        }
    }

    /// Whether this place is the metro hub.
    pub fn is_hub(&self) -> bool {
        matches!(self, Self::MetroHub)
    }

    /// Whether this place is one of the provinces bordering the hub.
    pub fn is_hub_adjacent(&self) -> bool {
        match self {
            Self::Province(p) => HUB_ADJACENT_PROVINCES.contains(&p.name),
            _ => false,
        }
    }

    /// Whether classification succeeded.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Fold a location into comparison form: ASCII, lowercase, single spaces.
///
/// ```
/// use shipping_fee_engine::geo::normalize;
///
/// assert_eq!(normalize("  Parañaque   City "), "paranaque city");
/// ```
pub fn normalize(s: &str) -> String {
    deunicode::deunicode(s)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Classify a free-text location.
pub fn locate(text: &str) -> Place {
    locate_normalized(&normalize(text))
}

/// Classify an already-normalized location.
pub fn locate_normalized(norm: &str) -> Place {
    if norm.is_empty() {
        return Place::Unknown;
    }

    let mut best: Option<(&'static Province, usize)> = None;
    for province in PROVINCES {
        let len = std::iter::once(&province.name)
            .chain(province.aliases.iter())
            .filter(|key| norm.contains(**key))
            .map(|key| key.len())
            .max();
        if let Some(len) = len {
            // Strictly greater keeps the earlier table entry on ties.
            if best.map_or(true, |(_, b)| len > b) {
                best = Some((province, len));
            }
        }
    }

    let hub_len = METRO_HUB_DISTRICTS
        .iter()
        .filter(|d| norm.contains(**d))
        .map(|d| d.len())
        .max();

    match (best, hub_len) {
        (Some((_, p_len)), Some(h_len)) if h_len > p_len => Place::MetroHub,
        (Some((province, _)), _) => Place::Province(province),
        (None, Some(_)) => Place::MetroHub,
        (None, None) => Place::Unknown,
    }
}

/// Macro-region of a free-text location, `None` if unrecognised.
pub fn classify_region(text: &str) -> Option<MacroRegion> {
    locate(text).region()
}
