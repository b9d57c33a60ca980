use std::collections::HashMap;

use crate::models::{MergedStudent, PerformanceRecord, RosterEntry, NO_CLASS};

/// Attaches a class to every performance row by normalized name. Rows keep
/// their input order; roster entries with no performance row are dropped.
pub fn merge(performance: &[PerformanceRecord], roster: &[RosterEntry]) -> Vec<MergedStudent> {
    let by_name: HashMap<&str, &RosterEntry> = roster
        .iter()
        .map(|entry| (entry.name.as_str(), entry))
        .collect();

    performance
        .iter()
        .map(|record| {
            let entry = by_name.get(record.name.as_str());
            MergedStudent {
                name: record.name.clone(),
                email: record.email.clone(),
                stars: record.stars,
                records: record.records,
                points: record.points,
                class_name: entry
                    .map(|entry| entry.class_name.clone())
                    .unwrap_or_else(|| NO_CLASS.to_string()),
                gender: entry.map(|entry| entry.gender),
                id_number: entry.map(|entry| entry.id_number.clone()),
            }
        })
        .collect()
}

pub fn filter_by_class(students: &[MergedStudent], class_name: Option<&str>) -> Vec<MergedStudent> {
    match class_name {
        Some(class_name) => students
            .iter()
            .filter(|student| student.class_name == class_name)
            .cloned()
            .collect(),
        None => students.to_vec(),
    }
}
