//! Output generation: rendering the Atom document and delivering it.
//!
//! # Submodules
//!
//! - [`atom`]: Serializes envelope metadata and entries into Atom XML
//! - [`file`]: Writes the finished document to disk under a fixed name
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── itchio.atom            # overwritten every run
//! └── .itchio_lastrun.json   # day-of-week of the last successful run
//! ```

pub mod atom;
pub mod file;
