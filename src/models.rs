use serde::Serialize;
use std::fmt;

/// Origin dataset of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SourceType {
    SteelPlants,
    SteelPlantsWithBf,
    GeocodedCompanies,
    RiceMills,
}

impl SourceType {
    pub const ALL: [SourceType; 4] = [
        SourceType::SteelPlants,
        SourceType::SteelPlantsWithBf,
        SourceType::GeocodedCompanies,
        SourceType::RiceMills,
    ];

    /// Display label, also the value stored in the `source_type` column.
    pub fn label(self) -> &'static str {
        match self {
            SourceType::SteelPlants => "Steel Plants",
            SourceType::SteelPlantsWithBf => "Steel Plants with BF",
            SourceType::GeocodedCompanies => "Geocoded Companies",
            SourceType::RiceMills => "Rice Mills",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }

    pub fn is_steel(self) -> bool {
        matches!(self, SourceType::SteelPlants | SourceType::SteelPlantsWithBf)
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Typed view of one row of a normalized dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    pub source_type: SourceType,
    pub name: Option<String>,
    pub state: String,
    pub district: String,
    pub latitude: f64,
    pub longitude: f64,
    pub capacity: Option<String>,
    pub furnace_type: Option<String>,
    pub operational_status: Option<String>,
}

/// Approximate administrative label for a coordinate. Not authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionLabel {
    pub districts: Vec<String>,
    pub states: Vec<String>,
}

impl RegionLabel {
    pub const UNKNOWN_DISTRICT: &'static str = "Region Unknown";
    pub const UNKNOWN_STATE: &'static str = "State Unknown";

    pub fn new(districts: &[&str], state: &str) -> Self {
        Self {
            districts: districts.iter().map(|d| d.to_string()).collect(),
            states: vec![state.to_string()],
        }
    }

    pub fn unknown() -> Self {
        Self::new(&[Self::UNKNOWN_DISTRICT], Self::UNKNOWN_STATE)
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::unknown()
    }

    pub fn into_tuple(self) -> (Vec<String>, Vec<String>) {
        (self.districts, self.states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_roundtrip() {
        for source in SourceType::ALL {
            assert_eq!(SourceType::from_label(source.label()), Some(source));
        }
        assert_eq!(SourceType::from_label("Sugar Mills"), None);
    }

    #[test]
    fn unknown_label_tuple() {
        let (districts, states) = RegionLabel::unknown().into_tuple();
        assert_eq!(districts, vec!["Region Unknown"]);
        assert_eq!(states, vec!["State Unknown"]);
    }
}
