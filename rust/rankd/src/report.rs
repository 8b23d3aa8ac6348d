use chrono::NaiveDate;
use serde::Serialize;

use crate::calc::{self, ClassStats};
use crate::error::RankError;
use crate::model::{MarkEntry, Roster};
use crate::term_roster::{TermRoster, TermStudent};

pub const REPORT_TITLE: &str = "Student Ranking Report";
const UNNAMED: &str = "Unnamed";
const UNRANKED: &str = "-";
const NO_TOP_STUDENT: &str = "N/A";
const NO_ROLL_NUMBER: &str = "N/A";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentView<'a> {
    pub name: &'a str,
    pub marks: &'a [MarkEntry],
    pub additional_marks: &'a [u32],
    pub total_marks: u32,
    pub percentage: String,
    pub rank: Option<u32>,
}

/// What the entry screen renders: the roster plus derived display values.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterView<'a> {
    pub subjects: &'a [String],
    pub additional_subjects: &'a [String],
    pub total_possible_marks: u32,
    pub ranks_stale: bool,
    pub students: Vec<StudentView<'a>>,
}

pub fn roster_view(roster: &Roster) -> RosterView<'_> {
    let possible = calc::total_possible_marks(
        roster.main_subjects.len(),
        roster.additional_subjects.len(),
    );
    RosterView {
        subjects: &roster.main_subjects,
        additional_subjects: &roster.additional_subjects,
        total_possible_marks: possible,
        ranks_stale: roster.ranks_stale(),
        students: roster
            .students
            .iter()
            .map(|s| StudentView {
                name: &s.name,
                marks: &s.marks,
                additional_marks: &s.additional_marks,
                total_marks: s.total_marks,
                percentage: calc::format_percentage(calc::percentage(s.total_marks, possible)),
                rank: s.rank,
            })
            .collect(),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_students: usize,
    pub top_student: String,
    pub class_average_percent: f64,
}

/// Table handed to the PDF renderer, one row per student in roster order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingReport {
    pub title: String,
    pub generated_on: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub summary: ReportSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ClassStats>,
    pub ranks_stale: bool,
}

pub fn build_ranking_report(
    roster: &Roster,
    generated_on: NaiveDate,
) -> Result<RankingReport, RankError> {
    if roster.students.is_empty() {
        return Err(RankError::EmptyRoster);
    }

    let stats = calc::class_stats(roster);
    let possible = stats.total_possible_marks;

    let mut headers = Vec::with_capacity(roster.subject_count() + 4);
    headers.push("Name".to_string());
    headers.extend(roster.main_subjects.iter().cloned());
    headers.extend(roster.additional_subjects.iter().cloned());
    headers.extend(["Total", "Percentage", "Rank"].map(String::from));

    let rows = roster
        .students
        .iter()
        .map(|s| {
            let mut row = Vec::with_capacity(headers.len());
            row.push(display_name(&s.name));
            row.extend(s.marks.iter().map(|m| m.total.to_string()));
            row.extend(s.additional_marks.iter().map(|m| m.to_string()));
            row.push(s.total_marks.to_string());
            row.push(format!(
                "{}%",
                calc::format_percentage(calc::percentage(s.total_marks, possible))
            ));
            row.push(display_rank(s.rank));
            row
        })
        .collect();

    let top_student = top_student(roster.students.iter().map(|s| (s.rank, s.name.as_str())));

    Ok(RankingReport {
        title: REPORT_TITLE.to_string(),
        generated_on: generated_on.format("%Y-%m-%d").to_string(),
        headers,
        rows,
        summary: ReportSummary {
            total_students: roster.students.len(),
            top_student,
            class_average_percent: stats.class_average_percent,
        },
        stats: Some(stats),
        ranks_stale: roster.ranks_stale(),
    })
}

fn display_name(name: &str) -> String {
    if name.is_empty() {
        UNNAMED.to_string()
    } else {
        name.to_string()
    }
}

fn display_rank(rank: Option<u32>) -> String {
    rank.map(|r| r.to_string())
        .unwrap_or_else(|| UNRANKED.to_string())
}

fn top_student<'a>(mut ranked: impl Iterator<Item = (Option<u32>, &'a str)>) -> String {
    ranked
        .find(|(rank, _)| *rank == Some(1))
        .map(|(_, name)| name)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| NO_TOP_STUDENT.to_string())
}

/// What the term screen renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermRosterView<'a> {
    pub students: &'a [TermStudent],
    pub max_mark: f64,
    pub ranks_stale: bool,
}

pub fn term_view(roster: &TermRoster) -> TermRosterView<'_> {
    TermRosterView {
        students: &roster.students,
        max_mark: crate::validate::TERM_MARK_MAX,
        ranks_stale: roster.ranks_stale(),
    }
}

pub fn build_term_report(
    roster: &TermRoster,
    generated_on: NaiveDate,
) -> Result<RankingReport, RankError> {
    if roster.students.is_empty() {
        return Err(RankError::EmptyRoster);
    }

    let headers = [
        "Name",
        "Roll Number",
        "Half-Yearly Marks",
        "Final Marks",
        "Average Marks",
        "Percentage",
        "Rank",
    ]
    .map(String::from)
    .to_vec();

    let rows = roster
        .students
        .iter()
        .map(|s| {
            vec![
                display_name(&s.name),
                if s.roll_number.is_empty() {
                    NO_ROLL_NUMBER.to_string()
                } else {
                    s.roll_number.clone()
                },
                s.half_yearly_marks.to_string(),
                s.final_marks.to_string(),
                s.average_marks.to_string(),
                format!("{}%", calc::format_percentage(s.percentage)),
                display_rank(s.rank),
            ]
        })
        .collect();

    let n = roster.students.len();
    let average: f64 = roster.students.iter().map(|s| s.percentage).sum::<f64>() / n as f64;

    Ok(RankingReport {
        title: REPORT_TITLE.to_string(),
        generated_on: generated_on.format("%Y-%m-%d").to_string(),
        headers,
        rows,
        summary: ReportSummary {
            total_students: n,
            top_student: top_student(roster.students.iter().map(|s| (s.rank, s.name.as_str()))),
            class_average_percent: calc::round_off_2_decimals(average),
        },
        stats: None,
        ranks_stale: roster.ranks_stale(),
    })
}

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub fn report_csv(report: &RankingReport) -> String {
    let mut out = String::new();
    for line in std::iter::once(&report.headers).chain(report.rows.iter()) {
        let cells: Vec<String> = line.iter().map(|c| csv_quote(c)).collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}
