//! Seed permutation files.
//!
//! A permutation file holds whitespace-separated 0-based job indices. They
//! are shifted to the 1-based job ids the decoder and runners use.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Reads a 0-based permutation file and returns 1-based job ids.
///
/// The result is not checked against an instance; pass it to
/// `run_with_seed`, which validates it.
pub fn read_permutation(path: impl AsRef<Path>) -> Result<Vec<usize>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse_permutation(&text)
}

/// Parses whitespace-separated 0-based indices into 1-based job ids.
///
/// ```
/// use u_flowshop::io::parse_permutation;
///
/// assert_eq!(parse_permutation("2 0\n1").unwrap(), vec![3, 1, 2]);
/// ```
pub fn parse_permutation(text: &str) -> Result<Vec<usize>> {
    let mut ids = Vec::new();
    for (i, line) in text.lines().enumerate() {
        for tok in line.split_whitespace() {
            let index: usize = tok
                .parse()
                .map_err(|_| Error::parse(i + 1, format!("'{tok}' is not a job index")))?;
            let id = index
                .checked_add(1)
                .ok_or_else(|| Error::parse(i + 1, format!("job index {tok} out of range")))?;
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Writes 1-based job ids as a 0-based permutation file.
pub fn write_permutation(path: impl AsRef<Path>, permutation: &[usize]) -> Result<()> {
    fs::write(path, format_permutation(permutation) + "\n")?;
    Ok(())
}

/// Formats 1-based job ids back into the 0-based file layout.
pub fn format_permutation(permutation: &[usize]) -> String {
    permutation
        .iter()
        .map(|id| id.saturating_sub(1).to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_to_one_based() {
        assert_eq!(parse_permutation("0 1 2 3").unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_mixed_whitespace() {
        assert_eq!(parse_permutation("  4\t0\n\n2 1  3\n").unwrap(), vec![5, 1, 3, 2, 4]);
    }

    #[test]
    fn test_empty_file() {
        assert!(parse_permutation("").unwrap().is_empty());
    }

    #[test]
    fn test_negative_index_rejected() {
        match parse_permutation("0 1\n-1") {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_index_at_usize_max_rejected() {
        let text = format!("0\n{}", usize::MAX);
        match parse_permutation(&text) {
            Err(Error::Parse { line, message }) => {
                assert_eq!(line, 2);
                assert!(message.contains("out of range"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_format_is_inverse() {
        let ids = vec![3, 1, 2];
        assert_eq!(parse_permutation(&format_permutation(&ids)).unwrap(), ids);
    }
}
