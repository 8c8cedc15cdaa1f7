//! Pipeline stages for vector-file conversion.
//!
//! Each submodule implements exactly one transformation step, so each is
//! independently testable and a backend can be swapped without touching the
//! others.
//!
//! ## Data Flow
//!
//! ```text
//!            ┌─▶ input (markup check) ─────────────┐
//! input ─────┤                                     ├─▶ canonical ─▶ rasterize ─▶ encode / pdf
//! (classify) └─▶ render (decoder, page by page) ───┘                (resvg)      (image / pdf-writer)
//! ```
//!
//! 1. [`input`]     — classify by extension, read files, validate markup
//! 2. [`render`]    — rasterise the leading PDF pages through the injected
//!    decoder; runs in `spawn_blocking`
//! 3. [`rasterize`] — draw SVG markup onto a fresh RGBA surface
//! 4. [`encode`]    — PNG / JPEG encoding and white compositing
//! 5. [`pdf`]       — wrap a surface in a one-page PDF

pub mod encode;
pub mod input;
pub mod pdf;
pub mod rasterize;
pub mod render;
