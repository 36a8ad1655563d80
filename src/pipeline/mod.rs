//! Pipeline stages for first/last page extraction.
//!
//! ```text
//! render ──▶ encode ──▶ compose
//! (pdfium)   (JPEG)     (lopdf)
//! ```
//!
//! 1. [`render`]: parse the input and rasterise page 1 and page N
//! 2. [`encode`]: JPEG-encode each raster, then drop it
//! 3. [`compose`]: place each JPEG on its own page of a new document
//!
//! [`extract`] ties the stages together and handles the fewer-than-two-pages
//! passthrough.

pub mod compose;
pub mod encode;
pub mod extract;
pub mod render;
