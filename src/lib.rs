//! Regression trees and gradient boosting, written from first principles.
//!
//! [`RegressionTree`] grows a binary tree of axis-aligned splits by exhaustive search of the
//! threshold minimising the sum of squared residuals. [`GradientBoostedEnsemble`] chains such
//! trees, each one fitted on the residuals of the shrunk cumulative prediction of the previous
//! ones.

#[macro_use]
extern crate serde_derive;

mod data;
mod error;
mod gbt;
mod math;
mod matrix;
mod split;
mod tree;

#[cfg(test)]
mod testing;

pub use crate::data::*;
pub use crate::error::*;
pub use crate::gbt::*;
pub use crate::math::*;
pub use crate::matrix::*;
pub use crate::tree::*;

pub(crate) static DEFAULT_MAX_DEPTH: usize = 3;
pub(crate) static DEFAULT_N_ESTIMATORS: usize = 100;
pub(crate) static DEFAULT_SHRINKAGE: f64 = 0.1;
