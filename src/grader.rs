//! Static grading for code-editor exercises.
//!
//! Submissions are never executed. Each `expect(code).toContain("...")`
//! assertion in an exercise's test cases becomes a substring check, so a
//! pass means the expected tokens are present, not that the code works.

use itertools::Itertools;
use regex::Regex;
use serde::{Deserialize, Serialize};

use std::sync::LazyLock;

pub const PASS_MESSAGE: &str = "Great job! Your code passes every check.";
pub const FAIL_MESSAGE: &str = "Not quite yet. Check the missing pieces and try again.";

static ASSERTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"expect\(\s*code\s*\)\s*(\.\s*not\s*)?\.\s*toContain\(\s*(?:"((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)'|`([^`]*)`)\s*\)"#,
    )
    .expect("assertion pattern is valid")
});

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub code: String,
    #[serde(default)]
    pub starter_code: String,
    #[serde(default)]
    pub test_cases: String,
}

/// One `toContain` assertion pulled out of an exercise's test cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    pub expected: String,
    /// `expect(code).not.toContain(...)`: the text must be absent.
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub expected: String,
    pub negated: bool,
    pub satisfied: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeReport {
    pub passed: bool,
    pub message: String,
    pub checks: Vec<CheckResult>,
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Extracts every `toContain` assertion from `test_cases`, in order.
pub fn parse_assertions(test_cases: &str) -> Vec<Assertion> {
    ASSERTION
        .captures_iter(test_cases)
        .filter_map(|caps| {
            let negated = caps.get(1).is_some();
            let expected = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| unescape(m.as_str()))
                .or_else(|| caps.get(4).map(|m| m.as_str().to_string()))?;
            Some(Assertion { expected, negated })
        })
        .collect()
}

/// Grades a submission against the assertions in its test cases.
///
/// Test cases without any recognizable assertion fall back to the
/// editor's original heuristic: the code must contain `return` and be
/// longer than the starter code.
pub fn grade(submission: &Submission) -> GradeReport {
    let assertions = parse_assertions(&submission.test_cases);

    if assertions.is_empty() {
        let passed = submission.code.contains("return")
            && submission.code.len() > submission.starter_code.len();
        log::debug!("[grade] No assertions found, heuristic result: {passed}");
        return GradeReport {
            passed,
            message: String::from(if passed { PASS_MESSAGE } else { FAIL_MESSAGE }),
            checks: Vec::new(),
        };
    }

    let checks: Vec<CheckResult> = assertions
        .into_iter()
        .map(|assertion| CheckResult {
            satisfied: submission.code.contains(&assertion.expected) != assertion.negated,
            expected: assertion.expected,
            negated: assertion.negated,
        })
        .collect();

    let failing = checks.iter().filter(|check| !check.satisfied).collect::<Vec<_>>();
    let passed = failing.is_empty();
    let message = if passed {
        String::from(PASS_MESSAGE)
    } else {
        format!(
            "{FAIL_MESSAGE} ({})",
            failing
                .iter()
                .map(|check| {
                    if check.negated {
                        format!("remove `{}`", check.expected)
                    } else {
                        format!("missing `{}`", check.expected)
                    }
                })
                .join(", ")
        )
    };

    log::debug!(
        "[grade] {} of {} checks satisfied",
        checks.len() - failing.len(),
        checks.len()
    );

    GradeReport { passed, message, checks }
}
