use std::cmp::Ordering;

use crate::models::{MergedStudent, SortOption};

/// Returns a sorted copy. The sort is stable, so equal rows keep their
/// relative order between renders.
pub fn sort_by(students: &[MergedStudent], option: SortOption) -> Vec<MergedStudent> {
    let mut sorted = students.to_vec();
    sorted.sort_by(|a, b| compare(a, b, option));
    sorted
}

pub fn compare(a: &MergedStudent, b: &MergedStudent, option: SortOption) -> Ordering {
    match option {
        SortOption::PointsDesc => b.points.cmp(&a.points),
        SortOption::PointsAsc => a.points.cmp(&b.points),
        SortOption::StarsDesc => b.stars.cmp(&a.stars),
        SortOption::RecordsDesc => b.records.cmp(&a.records),
        SortOption::NameAsc => collate(&a.name, &b.name),
    }
}

/// Locale-style name order. Characters are compared case-folded in
/// position, with spacing below punctuation below digits below letters, so
/// `ALI BIN AHMAD` comes before `ALIA`. Lowercase breaks ties ahead of
/// uppercase, then raw text.
pub fn collate(a: &str, b: &str) -> Ordering {
    primary_weights(a)
        .cmp(primary_weights(b))
        .then_with(|| case_weights(a).cmp(case_weights(b)))
        .then_with(|| a.cmp(b))
}

fn primary_weights(s: &str) -> impl Iterator<Item = (u8, char)> + '_ {
    s.chars().flat_map(char::to_lowercase).map(|c| {
        if c.is_whitespace() {
            (0, ' ')
        } else if c.is_numeric() {
            (2, c)
        } else if c.is_alphabetic() {
            (3, c)
        } else {
            (1, c)
        }
    })
}

fn case_weights(s: &str) -> impl Iterator<Item = bool> + '_ {
    s.chars().map(char::is_uppercase)
}
