use crate::libsimplecsv::error::{Error, Result};
use clap::ValueEnum;

/// Fractions a question bank answer may carry.
pub const VALID_GRADES: [f64; 21] = [
    1.0, 0.9, 0.8333333, 0.8, 0.75, 0.7, 0.6666667, 0.6, 0.5, 0.4, 0.3333333, 0.3, 0.25, 0.2,
    0.1666667, 0.1428571, 0.125, 0.1111111, 0.1, 0.05, 0.0,
];

const TOLERANCE: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MatchGrades {
    /// Snap to the closest valid grade.
    #[default]
    Nearest,
    /// Refuse fractions that are not already a valid grade.
    Error,
}

pub fn match_grade(fraction: f64, mode: MatchGrades) -> Result<f64> {
    let (closest, distance) = VALID_GRADES
        .iter()
        .map(|grade| (*grade, (grade - fraction).abs()))
        .fold((VALID_GRADES[0], f64::INFINITY), |best, candidate| {
            if candidate.1 < best.1 {
                candidate
            } else {
                best
            }
        });

    match mode {
        MatchGrades::Nearest => Ok(closest),
        MatchGrades::Error if distance <= TOLERANCE => Ok(closest),
        MatchGrades::Error => Err(Error::InvalidGrade(fraction)),
    }
}
