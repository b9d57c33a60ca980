use serde::{Deserialize, Serialize};

/// Class assigned to a performance row with no roster match.
pub const NO_CLASS: &str = "TIADA KELAS";

/// Placeholder id for roster entries whose source carries no id.
pub const UNKNOWN_ID: &str = "-";

/// Report grouping order: grade 1 to 6, three sections each.
pub const CLASS_ORDER: [&str; 18] = [
    "1 BESTARI",
    "1 CEMERLANG",
    "1 GEMILANG",
    "2 BESTARI",
    "2 CEMERLANG",
    "2 GEMILANG",
    "3 BESTARI",
    "3 CEMERLANG",
    "3 GEMILANG",
    "4 BESTARI",
    "4 CEMERLANG",
    "4 GEMILANG",
    "5 BESTARI",
    "5 CEMERLANG",
    "5 GEMILANG",
    "6 BESTARI",
    "6 CEMERLANG",
    "6 GEMILANG",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub stars: u32,
    #[serde(default)]
    pub records: u32,
    #[serde(default)]
    pub points: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    #[serde(rename = "L")]
    Lelaki,
    #[serde(rename = "P")]
    Perempuan,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub name: String,
    pub class_name: String,
    pub gender: Gender,
    pub id_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedStudent {
    pub name: String,
    pub email: String,
    pub stars: u32,
    pub records: u32,
    pub points: u32,
    pub class_name: String,
    pub gender: Option<Gender>,
    pub id_number: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SortOption {
    #[default]
    PointsDesc,
    PointsAsc,
    StarsDesc,
    RecordsDesc,
    NameAsc,
}

impl SortOption {
    pub fn label(self) -> &'static str {
        match self {
            SortOption::PointsDesc => "Mata Tertinggi",
            SortOption::PointsAsc => "Mata Terendah",
            SortOption::StarsDesc => "Bintang Terbanyak",
            SortOption::RecordsDesc => "Rekod Terbanyak",
            SortOption::NameAsc => "Nama (A-Z)",
        }
    }
}

/// Join key shared by both parser modes and the roster: uppercase,
/// whitespace runs collapsed to one space, trimmed.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_and_uppercases() {
        assert_eq!(normalize_name(" Ali   bin Ahmad "), "ALI BIN AHMAD");
        assert_eq!(normalize_name("siti\tnur\n aisyah"), "SITI NUR AISYAH");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn class_order_is_grade_major() {
        assert_eq!(CLASS_ORDER.len(), 18);
        assert_eq!(CLASS_ORDER[0], "1 BESTARI");
        assert_eq!(CLASS_ORDER[3], "2 BESTARI");
        assert_eq!(CLASS_ORDER[17], "6 GEMILANG");
    }

    #[test]
    fn gender_defaults_to_lelaki() {
        assert_eq!(Gender::default(), Gender::Lelaki);
        assert_eq!(serde_json::to_string(&Gender::Perempuan).unwrap(), "\"P\"");
    }

    #[test]
    fn sort_labels_match_dashboard_wording() {
        assert_eq!(SortOption::PointsDesc.label(), "Mata Tertinggi");
        assert_eq!(SortOption::NameAsc.label(), "Nama (A-Z)");
    }
}
