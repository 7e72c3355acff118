//! Batch renderer for captioned card images.
//!
//! Reads `text,fontSize` rows from a CSV file and renders one numbered JPEG
//! per row by running an ImageMagick-compatible `convert` program on a
//! bounded pool of workers.

pub mod cli;
pub mod csv_handler;
pub mod engine;
pub mod errors;
pub mod models;
pub mod naming;
pub mod progress;
pub mod renderer;
