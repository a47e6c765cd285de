//! Dense linear system solver using Gauss-Jordan elimination with partial
//! pivoting, in a sequential form and a row-distributed SPMD form.

pub mod error;
pub mod loader;
pub mod matrix;
pub mod output;
pub mod solver;
pub mod stats;
