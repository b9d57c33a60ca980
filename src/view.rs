use std::fmt::Write;

use crate::models::{MergedStudent, SortOption};
use crate::report::TABLE_HEADERS;
use crate::stats::DashboardStats;

/// Rank marker shown beside the top three rows of a points ranking.
pub fn rank_marker(index: usize, option: SortOption) -> &'static str {
    if option != SortOption::PointsDesc {
        return "";
    }
    match index {
        0 => "👑",
        1 | 2 => "*",
        _ => "",
    }
}

pub fn render_stats(stats: &DashboardStats) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Jumlah Murid : {}", stats.total_students);
    let _ = writeln!(output, "Jumlah Mata  : {}", stats.total_points);
    let _ = writeln!(output, "Purata Mata  : {}", stats.average_points);
    match &stats.top_student {
        Some(top) => {
            let _ = writeln!(output, "Murid Terbaik: {} ({} Mata)", top.name, top.points);
        }
        None => {
            let _ = writeln!(output, "Murid Terbaik: -");
        }
    }
    output
}

pub fn render_table(students: &[MergedStudent], option: SortOption, limit: Option<usize>) -> String {
    let rows: Vec<[String; 7]> = students
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .enumerate()
        .map(|(index, student)| {
            [
                format!("{}{}", index + 1, rank_marker(index, option)),
                student.name.clone(),
                student.email.clone(),
                student.class_name.clone(),
                student.stars.to_string(),
                student.records.to_string(),
                student.points.to_string(),
            ]
        })
        .collect();

    let mut widths: Vec<usize> = TABLE_HEADERS.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let header: Vec<String> = TABLE_HEADERS.iter().map(|h| h.to_string()).collect();
    push_line(&mut output, &header, &widths);
    let _ = writeln!(output, "{}", "-".repeat(widths.iter().sum::<usize>() + 2 * widths.len()));
    for row in &rows {
        push_line(&mut output, row, &widths);
    }
    if rows.is_empty() {
        let _ = writeln!(output, "Tiada data untuk dipaparkan.");
    }
    output
}

fn push_line(output: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    let _ = writeln!(output, "{}", line.join("  ").trim_end());
}
