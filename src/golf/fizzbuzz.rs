use thiserror::Error;

/// Solutions print 1 through this number
pub const LIMIT: u32 = 100;

/// Why a solution's output was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OutputMismatch {
    #[error("line {line}: expected '{expected}', found '{found}'")]
    WrongLine {
        line: usize,
        expected: String,
        found: String,
    },

    #[error("output stops after {found} lines, expected {expected}")]
    TooShort { found: usize, expected: usize },

    #[error("unexpected extra output at line {line}: '{text}'")]
    TooLong { line: usize, text: String },
}

pub fn fizzbuzz_line(n: u32) -> String {
    match (n % 3, n % 5) {
        (0, 0) => "FizzBuzz".to_string(),
        (0, _) => "Fizz".to_string(),
        (_, 0) => "Buzz".to_string(),
        _ => n.to_string(),
    }
}

pub fn expected_output() -> Vec<String> {
    (1..=LIMIT).map(fizzbuzz_line).collect()
}

/// Check a solution's captured stdout line by line.
/// Surrounding whitespace on each line and trailing blank lines are ignored.
pub fn verify_output(output: &str) -> Result<(), OutputMismatch> {
    let expected = expected_output();
    let mut lines: Vec<&str> = output.lines().map(str::trim).collect();
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    for (idx, want) in expected.iter().enumerate() {
        match lines.get(idx) {
            Some(got) if got == want => {}
            Some(got) => {
                return Err(OutputMismatch::WrongLine {
                    line: idx + 1,
                    expected: want.clone(),
                    found: got.to_string(),
                })
            }
            None => {
                return Err(OutputMismatch::TooShort {
                    found: lines.len(),
                    expected: expected.len(),
                })
            }
        }
    }

    match lines.get(expected.len()) {
        Some(extra) => Err(OutputMismatch::TooLong {
            line: expected.len() + 1,
            text: extra.to_string(),
        }),
        None => Ok(()),
    }
}

/// Length of a solution in characters. Trailing newlines an editor adds do not count.
pub fn character_count(code: &str) -> u32 {
    code.trim_end_matches(['\n', '\r']).chars().count() as u32
}
