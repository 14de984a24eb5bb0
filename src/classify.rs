// src/classify.rs
//! Season and habitat labels derived from camera-trap filename conventions.
//!
//! Filenames look like `CPW05_SPRING2021_IMG0042 (2).jpg`: the digits after
//! `CPW` identify the camera site, the second `_` segment the season.

use std::fmt;

/// Season placeholder for filenames without a second `_` segment.
pub const UNKNOWN_SEASON: &str = "Unknown";

/// Habitat type of a camera site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Habitat {
    CoastalSageScrub,
    Disturbed,
    Riparian,
    DisturbedCoastalSageScrub,
    OakWoodland,
    Missing,
}

impl Habitat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Habitat::CoastalSageScrub => "Coastal Sage Scrub",
            Habitat::Disturbed => "Disturbed",
            Habitat::Riparian => "Riparian",
            Habitat::DisturbedCoastalSageScrub => "Disturbed Coastal Sage Scrub",
            Habitat::OakWoodland => "Oak Woodland",
            Habitat::Missing => "MISSING HABITAT DATA",
        }
    }

    /// Map a two-character site code.
    pub fn from_site_code(code: &str) -> Self {
        match code {
            "01" | "05" => Habitat::CoastalSageScrub,
            "02" | "03" | "06" | "09" | "10" | "11" | "12" | "15" | "17" => Habitat::Disturbed,
            "04" | "08" | "16" | "18" => Habitat::Riparian,
            "07" | "13" => Habitat::DisturbedCoastalSageScrub,
            "19" | "20" => Habitat::OakWoodland,
            _ => Habitat::Missing,
        }
    }
}

impl fmt::Display for Habitat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Second `_`-separated segment of `filename`, cut at the first `" ("`.
pub fn extract_season(filename: &str) -> String {
    match filename.split('_').nth(1) {
        Some(part) => part.split(" (").next().unwrap_or(part).to_string(),
        None => UNKNOWN_SEASON.to_string(),
    }
}

/// Habitat for the site code that follows the first `CPW` in `filename`.
///
/// The code is the two characters after `CPW`, except that a run of exactly
/// four digits (`CPW0107`) is read as prefix `01` and site `07`.
pub fn habitat_for(filename: &str) -> Habitat {
    match filename.find("CPW") {
        Some(idx) => {
            let rest = &filename[idx + 3..];
            // four-digit ids carry a two-digit prefix before the site code
            let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
            let code: String = if digits == 4 {
                rest[2..4].to_string()
            } else {
                rest.chars().take(2).collect()
            };
            Habitat::from_site_code(&code)
        }
        None => Habitat::Missing,
    }
}

/// Label form of [`habitat_for`].
pub fn get_habitat_type(filename: &str) -> &'static str {
    habitat_for(filename).as_str()
}
