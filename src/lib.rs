//! A feedforward neural network trained by backpropagation, with immutable
//! per-batch training metrics for live inspection of the learning process.

extern crate itertools;
extern crate ndarray;
extern crate rand;
extern crate rand_distr;
#[macro_use]
extern crate serde_derive;

pub mod activator;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod feed_forward;
pub mod history;
pub mod init;
pub mod learning_rate;
pub mod metric;
pub mod trainer;

mod layer;
