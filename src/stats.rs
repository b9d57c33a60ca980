use crate::models::{MergedStudent, SortOption};

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub total_students: usize,
    pub total_points: u64,
    pub average_points: String,
    pub top_student: Option<MergedStudent>,
}

impl DashboardStats {
    /// Top student is only named when the view is ranked by points, highest
    /// first.
    pub fn compute(filtered: &[MergedStudent], sorted: &[MergedStudent], option: SortOption) -> Self {
        let total_students = filtered.len();
        let total_points: u64 = filtered.iter().map(|s| u64::from(s.points)).sum();
        let average_points = if total_students > 0 {
            format!("{:.1}", total_points as f64 / total_students as f64)
        } else {
            "0".to_string()
        };
        let top_student = match option {
            SortOption::PointsDesc => sorted.first().cloned(),
            _ => None,
        };

        Self {
            total_students,
            total_points,
            average_points,
            top_student,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NO_CLASS;
    use crate::sort::sort_by;

    fn student(name: &str, points: u32) -> MergedStudent {
        MergedStudent {
            name: name.to_string(),
            email: String::new(),
            stars: 0,
            records: 0,
            points,
            class_name: NO_CLASS.to_string(),
            gender: None,
            id_number: None,
        }
    }

    #[test]
    fn totals_and_average() {
        let students = vec![student("A", 10), student("B", 25)];
        let sorted = sort_by(&students, SortOption::PointsDesc);
        let stats = DashboardStats::compute(&students, &sorted, SortOption::PointsDesc);

        assert_eq!(stats.total_students, 2);
        assert_eq!(stats.total_points, 35);
        assert_eq!(stats.average_points, "17.5");
        assert_eq!(stats.top_student.map(|s| s.name), Some("B".to_string()));
    }

    #[test]
    fn empty_set_averages_to_zero() {
        let stats = DashboardStats::compute(&[], &[], SortOption::PointsDesc);
        assert_eq!(stats.average_points, "0");
        assert_eq!(stats.top_student, None);
    }

    #[test]
    fn no_top_student_for_other_orders() {
        let students = vec![student("A", 10)];
        let stats = DashboardStats::compute(&students, &students, SortOption::NameAsc);
        assert_eq!(stats.top_student, None);
    }
}
