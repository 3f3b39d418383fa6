//! Case Schema Module
//! The fixed, typed set of columns the report reads from the CTDC export.

use polars::prelude::DataType;
use std::cmp::Ordering;
use std::fmt;

/// Reserved value the dataset uses for "not collected".
pub const SENTINEL: i64 = -99;
/// Sentinel as it appears in text columns.
pub const SENTINEL_TEXT: &str = "-99";

/// Label used for missing gender under the keep policy.
pub const UNKNOWN_GENDER: &str = "Unknown";

/// Boolean-coded labour sector flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LabourSector {
    Agriculture,
    Aquafarming,
    Begging,
    Construction,
    DomesticWork,
    Hospitality,
    Manufacturing,
    Peddling,
}

impl LabourSector {
    pub const ALL: [LabourSector; 8] = [
        LabourSector::Agriculture,
        LabourSector::Aquafarming,
        LabourSector::Begging,
        LabourSector::Construction,
        LabourSector::DomesticWork,
        LabourSector::Hospitality,
        LabourSector::Manufacturing,
        LabourSector::Peddling,
    ];

    /// CSV header name.
    pub fn column_name(self) -> &'static str {
        match self {
            LabourSector::Agriculture => "typeOfLabourAgriculture",
            LabourSector::Aquafarming => "typeOfLabourAquafarming",
            LabourSector::Begging => "typeOfLabourBegging",
            LabourSector::Construction => "typeOfLabourConstruction",
            LabourSector::DomesticWork => "typeOfLabourDomesticWork",
            LabourSector::Hospitality => "typeOfLabourHospitality",
            LabourSector::Manufacturing => "typeOfLabourManufacturing",
            LabourSector::Peddling => "typeOfLabourPeddling",
        }
    }

    /// Snake-case name, used in file names and the summary.
    pub fn slug(self) -> &'static str {
        match self {
            LabourSector::Agriculture => "agriculture",
            LabourSector::Aquafarming => "aquafarming",
            LabourSector::Begging => "begging",
            LabourSector::Construction => "construction",
            LabourSector::DomesticWork => "domestic_work",
            LabourSector::Hospitality => "hospitality",
            LabourSector::Manufacturing => "manufacturing",
            LabourSector::Peddling => "peddling",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LabourSector::Agriculture => "Agriculture",
            LabourSector::Aquafarming => "Aquafarming",
            LabourSector::Begging => "Begging",
            LabourSector::Construction => "Construction",
            LabourSector::DomesticWork => "Domestic work",
            LabourSector::Hospitality => "Hospitality",
            LabourSector::Manufacturing => "Manufacturing",
            LabourSector::Peddling => "Peddling",
        }
    }
}

/// A column of the case table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Year,
    Gender,
    AgeBand,
    Labour(LabourSector),
}

impl Field {
    /// Every column the report needs, in output order.
    pub const ALL: [Field; 11] = [
        Field::Year,
        Field::Gender,
        Field::AgeBand,
        Field::Labour(LabourSector::Agriculture),
        Field::Labour(LabourSector::Aquafarming),
        Field::Labour(LabourSector::Begging),
        Field::Labour(LabourSector::Construction),
        Field::Labour(LabourSector::DomesticWork),
        Field::Labour(LabourSector::Hospitality),
        Field::Labour(LabourSector::Manufacturing),
        Field::Labour(LabourSector::Peddling),
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Year => "yearOfRegistration",
            Field::Gender => "gender",
            Field::AgeBand => "ageBroad",
            Field::Labour(sector) => sector.column_name(),
        }
    }

    /// Declared polars dtype after loading.
    pub fn dtype(self) -> DataType {
        match self {
            Field::Year | Field::Labour(_) => DataType::Int64,
            Field::Gender | Field::AgeBand => DataType::String,
        }
    }

    pub fn is_text(self) -> bool {
        self.dtype() == DataType::String
    }

    /// Display order of two values of this field.
    ///
    /// Age bands such as "9--17" and "48+" sort by their lower bound rather
    /// than lexically.
    pub fn compare_values(self, a: &str, b: &str) -> Ordering {
        match self {
            Field::AgeBand => age_band_lower_bound(a)
                .cmp(&age_band_lower_bound(b))
                .then_with(|| a.cmp(b)),
            _ => a.cmp(b),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Leading integer of an age band label; unparseable labels sort last.
fn age_band_lower_bound(label: &str) -> u32 {
    let digits: String = label
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_are_unique() {
        let mut names: Vec<&str> = Field::ALL.iter().map(|f| f.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Field::ALL.len());
    }

    #[test]
    fn every_sector_is_a_field() {
        for sector in LabourSector::ALL {
            assert!(Field::ALL.contains(&Field::Labour(sector)));
            assert!(sector.column_name().starts_with("typeOfLabour"));
        }
    }

    #[test]
    fn age_bands_sort_by_lower_bound() {
        let mut bands = vec!["30--38", "9--17", "48+", "0--8", "18--20"];
        bands.sort_by(|a, b| Field::AgeBand.compare_values(a, b));
        assert_eq!(bands, vec!["0--8", "9--17", "18--20", "30--38", "48+"]);
    }

    #[test]
    fn text_fields() {
        assert!(Field::Gender.is_text());
        assert!(Field::AgeBand.is_text());
        assert!(!Field::Year.is_text());
        assert!(!Field::Labour(LabourSector::Begging).is_text());
    }
}
