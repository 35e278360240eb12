//! Plain-text instance files.
//!
//! ```text
//! 3 2          <- jobs, stages
//! 2 1          <- machines per stage
//! # Stage 1
//! 5 6          <- job 1, one column per machine
//! 4 2
//! 7 3
//! # Stage 2
//! 3
//! 8
//! 1
//! ```
//!
//! The layout is line oriented: the header, the machine counts and every
//! job row each occupy exactly one line, so a row's width is checked
//! against its stage. Lines starting with `#` and blank lines are ignored
//! anywhere. Instance files carry no due dates; every job receives the one
//! passed in.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::Problem;

/// Reads an instance file, giving every job `due_date`.
///
/// # Errors
/// [`Error::Open`] if the file cannot be read, otherwise the errors of
/// [`parse_instance`].
pub fn read_instance(path: impl AsRef<Path>, due_date: u32) -> Result<Problem> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse_instance(&text, due_date)
}

/// Parses the instance layout from a string.
///
/// ```
/// use u_flowshop::io::parse_instance;
///
/// let text = "2 1\n1\n# Stage 1\n5\n3\n";
/// let problem = parse_instance(text, 100).unwrap();
/// assert_eq!(problem.num_jobs(), 2);
/// assert_eq!(problem.job(2).processing_time(1, 1), 3);
/// ```
///
/// # Errors
/// [`Error::Parse`] with the 1-based line number for malformed or missing
/// numbers, [`Error::InvalidInstance`] if the topology is rejected.
pub fn parse_instance(text: &str, due_date: u32) -> Result<Problem> {
    let mut lines = Lines::new(text);

    let header = lines.next_row("header")?;
    let [n_jobs, n_stages] = header.values[..] else {
        return Err(Error::parse(
            header.line,
            format!("expected 'jobs stages', got {} values", header.values.len()),
        ));
    };
    let (n_jobs, n_stages) = (n_jobs as usize, n_stages as usize);

    let machines = lines.next_row("machines per stage")?;
    if machines.values.len() != n_stages {
        return Err(Error::parse(
            machines.line,
            format!(
                "expected {n_stages} machine counts, got {}",
                machines.values.len()
            ),
        ));
    }
    let machines_per_stage: Vec<usize> = machines.values.iter().map(|&h| h as usize).collect();

    // Grown as rows arrive, so a bogus header fails at end of file instead
    // of allocating up front.
    let mut times: Vec<Vec<Vec<u32>>> = Vec::new();
    for (stage, &h) in machines_per_stage.iter().enumerate() {
        for job in 0..n_jobs {
            let row = lines.next_row("processing times")?;
            if row.values.len() != h {
                return Err(Error::parse(
                    row.line,
                    format!(
                        "stage {} expects {h} processing times, got {}",
                        stage + 1,
                        row.values.len()
                    ),
                ));
            }
            if stage == 0 {
                times.push(vec![row.values]);
            } else {
                times[job].push(row.values);
            }
        }
    }

    let mut builder = Problem::builder(machines_per_stage);
    for row in times {
        builder.push_job(due_date, row);
    }
    builder.build()
}

/// Writes `problem` in the layout [`read_instance`] accepts.
pub fn write_instance(path: impl AsRef<Path>, problem: &Problem) -> Result<()> {
    fs::write(path, format_instance(problem))?;
    Ok(())
}

pub(crate) fn format_instance(problem: &Problem) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", problem.num_jobs(), problem.num_stages());
    let _ = writeln!(out, "{}", join(problem.machines_per_stage()));
    for stage in 1..=problem.num_stages() {
        let _ = writeln!(out, "# Stage {stage}");
        for job in problem.jobs() {
            let _ = writeln!(out, "{}", join(job.stage_times(stage)));
        }
    }
    out
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

struct Row {
    line: usize,
    values: Vec<u32>,
}

/// Numeric rows of a text, skipping comments and blank lines.
struct Lines<'a> {
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
    last_line: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.lines().enumerate(),
            last_line: 0,
        }
    }

    fn next_row(&mut self, what: &str) -> Result<Row> {
        for (i, raw) in self.inner.by_ref() {
            let line = i + 1;
            self.last_line = line;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let values = trimmed
                .split_whitespace()
                .map(|tok| {
                    tok.parse::<u32>()
                        .map_err(|_| Error::parse(line, format!("'{tok}' is not a non-negative integer")))
                })
                .collect::<Result<Vec<_>>>()?;
            return Ok(Row { line, values });
        }
        Err(Error::parse(
            self.last_line + 1,
            format!("unexpected end of file, expected {what}"),
        ))
    }
}
