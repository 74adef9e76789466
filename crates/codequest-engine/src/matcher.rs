//! Normalization and the answer-acceptance rule.
//!
//! Acceptance is literal: a submission is correct when its normalized text
//! equals the normalized text of one of the level's solutions. No semantic
//! equivalence is attempted. The rule sits behind [`SolutionChecker`] so a
//! stricter checker can be swapped in without touching the controller.

/// Canonical form used for comparison: trimmed, lowercased, and with every
/// whitespace run collapsed to a single space.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether `input` matches any of `solutions` after normalization.
///
/// Empty or blank input never matches.
pub fn is_accepted<S: AsRef<str>>(input: &str, solutions: &[S]) -> bool {
    let candidate = normalize(input);
    if candidate.is_empty() {
        return false;
    }
    solutions
        .iter()
        .any(|s| normalize(s.as_ref()) == candidate)
}

/// Decides whether a submission solves a level.
pub trait SolutionChecker: Send + Sync {
    /// Return `true` when `input` is an accepted answer.
    fn check(&self, input: &str, solutions: &[String]) -> bool;
}

/// The default checker: normalized literal comparison.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralChecker;

impl SolutionChecker for LiteralChecker {
    fn check(&self, input: &str, solutions: &[String]) -> bool {
        is_accepted(input, solutions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_case_and_whitespace() {
        assert_eq!(
            normalize("  select   *\tFROM\n employees "),
            "select * from employees"
        );
    }

    #[test]
    fn normalize_is_idempotent() {
        for s in ["", "  A  b ", "docker run -d --name web", "H1 {  color: Purple; }"] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn irregular_spacing_and_case_are_accepted() {
        let solutions = ["SELECT * FROM employees"];
        assert!(is_accepted("select   *   from   employees", &solutions));
        assert!(!is_accepted("SELECT name FROM employees", &solutions));
    }

    #[test]
    fn blank_input_is_rejected() {
        assert!(!is_accepted("", &["ls"]));
        assert!(!is_accepted("   ", &["ls"]));
    }

    #[test]
    fn any_listed_solution_is_enough() {
        let solutions = vec!["ls".to_owned(), "ls -la".to_owned()];
        assert!(LiteralChecker.check("LS -LA", &solutions));
        assert!(!LiteralChecker.check("ls -l", &solutions));
    }

    #[test]
    fn punctuation_is_significant() {
        assert!(!is_accepted("h1 { color: purple }", &["h1 { color: purple; }"]));
    }
}
