//! Results output formatting (CSV).

use crate::error::Result;
use std::io::Write;

/// Write a solution vector as CSV.
///
/// Format:
/// ```csv
/// Unknown,Value
/// x0,-3.5
/// x1,4
/// ```
pub fn write_solution_csv<W: Write>(solution: &[f64], writer: &mut W) -> Result<()> {
    writeln!(writer, "Unknown,Value")?;
    for (i, value) in solution.iter().enumerate() {
        writeln!(writer, "x{},{}", i, value)?;
    }
    Ok(())
}
