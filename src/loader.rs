//! Augmented-matrix text loader.
//!
//! # Format
//!
//! ```text
//! # comment to end of line
//! 2  1  11      (one row per line is conventional)
//! 5, 7, 13      (commas and whitespace both separate)
//! ```
//!
//! All numbers are flattened in reading order. Shape is checked by the
//! solvers, not here.

use nom::number::complete::double;
use nom::IResult;

use crate::error::{Result, RowReduceError};

/// Parse a whole matrix file into a flat value list.
pub fn parse(input: &str) -> Result<Vec<f64>> {
    let mut values = Vec::new();
    for (line_num, raw_line) in input.lines().enumerate() {
        let line = raw_line.split('#').next().unwrap_or_default();
        parse_line(line, &mut values).map_err(|e| {
            RowReduceError::Parse(format!("line {}: {}: '{}'", line_num + 1, e, raw_line.trim()))
        })?;
    }
    Ok(values)
}

/// Read a matrix file from disk.
pub fn load(path: &std::path::Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)?;
    parse(&text)
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == ','
}

fn parse_line(line: &str, values: &mut Vec<f64>) -> std::result::Result<(), String> {
    let mut rest = line.trim_start_matches(is_separator);
    while !rest.is_empty() {
        let parsed: IResult<&str, f64> = double(rest);
        let (next, value) = parsed.map_err(|_| {
            let token = rest.split(is_separator).next().unwrap_or(rest);
            format!("expected number, found '{token}'")
        })?;
        if next.chars().next().is_some_and(|c| !is_separator(c)) {
            let token = rest.split(is_separator).next().unwrap_or(rest);
            return Err(format!("malformed number '{token}'"));
        }
        if !value.is_finite() {
            return Err(format!("non-finite value {value}"));
        }
        values.push(value);
        rest = next.trim_start_matches(is_separator);
    }
    Ok(())
}
