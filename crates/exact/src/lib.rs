//! Exact integer arithmetic for algebraic topology computations.
//!
//! This crate provides the scalar and matrix kernel that everything else is
//! built on: [`Integer`], an arbitrary-precision signed integer; [`MatrixInt`],
//! a dense matrix of integers with in-place row and column operations; and
//! [`smith_normal_form`], which reduces a matrix to its Smith normal form
//! using unimodular row and column operations.
//!
//! All arithmetic is exact. There is no floating point anywhere, and no
//! fixed-width overflow: intermediate values grow as large as they need to.

mod integer;
mod matrix;
mod snf;

pub use integer::Integer;
pub use matrix::MatrixInt;
pub use snf::{rank, smith_normal_form};
