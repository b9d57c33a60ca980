use std::collections::BTreeSet;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::models::{MergedStudent, SortOption, CLASS_ORDER};
use crate::sort::sort_by;

pub const TABLE_HEADERS: [&str; 7] = ["No.", "Nama", "ID", "Kelas", "Bintang", "Rekod", "Mata"];
pub const GROUPED_TITLE: &str = "Laporan Prestasi Mengikut Kelas";
const GROUPED_FILE_STEM: &str = "Laporan_Mengikut_Kelas";

#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub title: String,
    pub generated_at: DateTime<Local>,
    pub sort_label: String,
}

impl ReportMeta {
    pub fn new(title: impl Into<String>, option: SortOption, generated_at: DateTime<Local>) -> Self {
        Self {
            title: title.into(),
            generated_at,
            sort_label: option.label().to_string(),
        }
    }

    pub fn flat_title(class_name: Option<&str>) -> String {
        match class_name {
            Some(class_name) => format!("Senarai Murid - {class_name}"),
            None => "Senarai Keseluruhan Murid".to_string(),
        }
    }
}

/// Vertical geometry in millimetres on an A4 page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub page_height: f64,
    pub top_margin: f64,
    pub bottom_margin: f64,
    pub content_start: f64,
    pub heading_gap: f64,
    pub row_height: f64,
    pub table_gap: f64,
    /// A class heading never starts below this line.
    pub page_capacity: f64,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            page_height: 297.0,
            top_margin: 20.0,
            bottom_margin: 10.0,
            content_start: 40.0,
            heading_gap: 5.0,
            row_height: 7.0,
            table_gap: 15.0,
            page_capacity: 250.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Text { text: String },
    Heading { text: String },
    Table { headers: Vec<String>, rows: Vec<Vec<String>> },
    PageBreak,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    pub title: String,
    pub file_stem: String,
    pub blocks: Vec<Block>,
}

impl ReportDocument {
    pub fn tables(&self) -> impl Iterator<Item = &Vec<Vec<String>>> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Table { rows, .. } => Some(rows),
            _ => None,
        })
    }

    pub fn page_count(&self) -> usize {
        1 + self
            .blocks
            .iter()
            .filter(|block| matches!(block, Block::PageBreak))
            .count()
    }
}

/// One ranked table of the given rows, in the order given.
pub fn compose_flat(sorted: &[MergedStudent], meta: &ReportMeta, layout: PageLayout) -> ReportDocument {
    let mut composer = Composer::new(meta, layout);
    composer.table(sorted);
    composer.finish(file_stem(&meta.title))
}

/// One table per class: canonical classes first, then any other class found
/// in the data in lexicographic order. Ranks restart at 1 for each class.
pub fn compose_grouped(
    students: &[MergedStudent],
    option: SortOption,
    meta: &ReportMeta,
    layout: PageLayout,
) -> ReportDocument {
    let mut composer = Composer::new(meta, layout);

    for class_name in group_order(students) {
        let members: Vec<MergedStudent> = students
            .iter()
            .filter(|student| student.class_name == class_name)
            .cloned()
            .collect();
        if members.is_empty() {
            continue;
        }

        composer.heading(&format!("KELAS: {class_name}"));
        composer.table(&sort_by(&members, option));
    }

    composer.finish(GROUPED_FILE_STEM.to_string())
}

pub fn group_order(students: &[MergedStudent]) -> Vec<String> {
    let extras: BTreeSet<&str> = students
        .iter()
        .map(|student| student.class_name.as_str())
        .filter(|class_name| !CLASS_ORDER.contains(class_name))
        .collect();

    CLASS_ORDER
        .iter()
        .copied()
        .chain(extras)
        .map(str::to_string)
        .collect()
}

/// Report title with everything but ASCII letters and digits replaced by `_`.
pub fn file_stem(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn student_row(rank: usize, student: &MergedStudent) -> Vec<String> {
    vec![
        rank.to_string(),
        student.name.clone(),
        student.email.clone(),
        student.class_name.clone(),
        student.stars.to_string(),
        student.records.to_string(),
        student.points.to_string(),
    ]
}

struct Composer {
    layout: PageLayout,
    title: String,
    cursor: f64,
    blocks: Vec<Block>,
}

impl Composer {
    fn new(meta: &ReportMeta, layout: PageLayout) -> Self {
        let blocks = vec![
            Block::Text {
                text: format!("Tarikh: {}", meta.generated_at.format("%d/%m/%Y")),
            },
            Block::Text {
                text: format!("Susunan: {}", meta.sort_label),
            },
        ];
        Self {
            layout,
            title: meta.title.clone(),
            cursor: layout.content_start,
            blocks,
        }
    }

    fn page_break(&mut self) {
        self.blocks.push(Block::PageBreak);
        self.cursor = self.layout.top_margin;
    }

    fn heading(&mut self, text: &str) {
        if self.cursor > self.layout.page_capacity {
            self.page_break();
        }
        self.blocks.push(Block::Heading {
            text: text.to_string(),
        });
        self.cursor += self.layout.heading_gap;
    }

    /// Lays the rows out from the cursor, continuing on a new page with a
    /// repeated header whenever the next row would cross the bottom margin.
    fn table(&mut self, students: &[MergedStudent]) {
        let limit = self.layout.page_height - self.layout.bottom_margin;
        let mut rows = Vec::new();
        self.cursor += self.layout.row_height;

        for (index, student) in students.iter().enumerate() {
            if self.cursor + self.layout.row_height > limit && !rows.is_empty() {
                self.push_table(std::mem::take(&mut rows));
                self.page_break();
                self.cursor += self.layout.row_height;
            }
            rows.push(student_row(index + 1, student));
            self.cursor += self.layout.row_height;
        }

        self.push_table(rows);
        self.cursor += self.layout.table_gap;
    }

    fn push_table(&mut self, rows: Vec<Vec<String>>) {
        self.blocks.push(Block::Table {
            headers: TABLE_HEADERS.iter().map(|h| h.to_string()).collect(),
            rows,
        });
    }

    fn finish(self, file_stem: String) -> ReportDocument {
        ReportDocument {
            title: self.title,
            file_stem,
            blocks: self.blocks,
        }
    }
}
