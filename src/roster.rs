use std::collections::HashSet;

use serde_json::Value;
use tracing::{info, warn};

use crate::error::FetchError;
use crate::models::{normalize_name, Gender, PerformanceRecord, RosterEntry, UNKNOWN_ID};
use crate::store::StoreHandle;

pub const CLASS_DATA_PATH: &str = "config/classes/classData";
pub const PERFORMANCE_PATH: &str = "data/performance/latest";

/// The two store connections, built once by the entry point. Each is opened
/// independently, so a missing roster store never blocks performance reads.
#[derive(Clone)]
pub struct StoreHandles {
    pub roster: Option<StoreHandle>,
    pub performance: Option<StoreHandle>,
}

pub struct RosterFetcher {
    stores: StoreHandles,
}

impl RosterFetcher {
    pub fn new(stores: StoreHandles) -> Self {
        Self { stores }
    }

    /// Flattens the `{ classCode: [name, ...] }` snapshot into roster entries.
    /// An absent path, or no roster store at all, yields an empty roster
    /// rather than an error.
    pub async fn fetch_roster(&self) -> Result<Vec<RosterEntry>, FetchError> {
        let Some(store) = &self.stores.roster else {
            return Ok(Vec::new());
        };
        let Some(snapshot) = store.get(CLASS_DATA_PATH).await? else {
            info!(path = CLASS_DATA_PATH, "no class data stored");
            return Ok(Vec::new());
        };

        let Value::Object(classes) = snapshot else {
            return Err(FetchError::Decode(format!(
                "expected an object of class codes at {CLASS_DATA_PATH}"
            )));
        };

        let mut entries = Vec::new();
        for (class_code, names) in &classes {
            let class_name = class_name_from_code(class_code);
            let Some(names) = names.as_array() else {
                warn!(%class_code, "class entry is not a list of names");
                continue;
            };

            entries.extend(
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .filter(|name| !name.is_empty())
                    .map(|name| RosterEntry {
                        name: normalize_name(name),
                        class_name: class_name.clone(),
                        gender: Gender::default(),
                        id_number: UNKNOWN_ID.to_string(),
                    }),
            );
        }

        info!(classes = classes.len(), students = entries.len(), "roster fetched");
        Ok(entries)
    }

    /// Reads the last performance sheet saved to the performance store.
    pub async fn fetch_performance_snapshot(&self) -> Result<Vec<PerformanceRecord>, FetchError> {
        let Some(store) = &self.stores.performance else {
            return Ok(Vec::new());
        };
        let Some(snapshot) = store.get(PERFORMANCE_PATH).await? else {
            info!(path = PERFORMANCE_PATH, "no performance snapshot stored");
            return Ok(Vec::new());
        };

        let records: Vec<PerformanceRecord> = serde_json::from_value(snapshot)?;
        Ok(records
            .into_iter()
            .map(|record| PerformanceRecord {
                name: normalize_name(&record.name),
                ..record
            })
            .collect())
    }
}

/// `"1B"` becomes `"1 BESTARI"`; an unknown section letter is kept as is.
pub fn class_name_from_code(code: &str) -> String {
    let mut chars = code.chars();
    let grade = chars.next().map(String::from).unwrap_or_default();
    let suffix = match chars.next() {
        Some('B') => "BESTARI".to_string(),
        Some('C') => "CEMERLANG".to_string(),
        Some('G') => "GEMILANG".to_string(),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    format!("{grade} {suffix}")
}

/// Distinct class names in the order the roster lists them.
pub fn unique_classes(roster: &[RosterEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    roster
        .iter()
        .filter(|entry| seen.insert(entry.class_name.as_str()))
        .map(|entry| entry.class_name.clone())
        .collect()
}
