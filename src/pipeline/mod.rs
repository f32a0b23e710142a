//! Pipeline stages for Markdown-to-PDF conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and keeps the
//! degrade-or-report decision in a single place ([`crate::convert`]).
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ normalize ──▶ transcode ──▶ classify ──▶ layout ──▶ serialize
//! (bytes)    (UTF-8)       (Latin-1)     (blocks)     (canvas)    (lopdf)
//! ```
//!
//! 1. [`normalize`]: decode bytes, detect missing / whitespace-only input
//! 2. [`transcode`]: keep only characters the 8-bit font encoding can show
//! 3. [`classify`] : split into lines and map each to a heading, bullet,
//!    paragraph or blank block
//! 4. [`layout`]   : greedy word wrap onto fixed-size pages, using the
//!    glyph metrics in [`fonts`]
//! 5. [`serialize`]: write the canvas as PDF objects; falls back to a
//!    hard-coded one-page document when that fails

pub mod classify;
pub mod fonts;
pub mod layout;
pub mod normalize;
pub mod serialize;
pub mod transcode;
