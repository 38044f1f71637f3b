use serde::Serialize;

/// Letter grades by inclusive lower bound on the percentage, highest first.
/// Anything below the last bound is an `F`.
pub const GRADE_LADDER: [(f64, &str); 6] = [
    (90.0, "A+"),
    (80.0, "A"),
    (70.0, "B+"),
    (60.0, "B"),
    (50.0, "C"),
    (40.0, "D"),
];
pub const FAIL_GRADE: &str = "F";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkPair {
    pub marks: i64,
    pub max_marks: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_marks: i64,
    pub total_max_marks: i64,
    pub percentage: f64,
    pub grade: &'static str,
}

/// Decimal rounding to 2 fractional digits, halves away from zero.
pub fn round_2_decimals(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub fn letter_grade(percentage: f64) -> &'static str {
    GRADE_LADDER
        .iter()
        .find(|(threshold, _)| percentage >= *threshold)
        .map(|(_, label)| *label)
        .unwrap_or(FAIL_GRADE)
}

pub fn compute_totals<I>(results: I) -> Totals
where
    I: IntoIterator<Item = MarkPair>,
{
    let mut total_marks: i64 = 0;
    let mut total_max_marks: i64 = 0;
    for r in results {
        total_marks += r.marks;
        total_max_marks += r.max_marks;
    }
    // An empty or all-zero sheet still needs a divisor.
    if total_max_marks == 0 {
        total_max_marks = 1;
    }

    let percentage = round_2_decimals((total_marks as f64 / total_max_marks as f64) * 100.0);
    Totals {
        total_marks,
        total_max_marks,
        percentage,
        grade: letter_grade(percentage),
    }
}
