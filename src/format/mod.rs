//! File format decoding.
//!
//! Only TIFF-family containers are handled: classic TIFF and BigTIFF.

pub mod tiff;
