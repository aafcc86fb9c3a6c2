//! Pipeline stages for folder-to-PDF conversion.
//!
//! Each submodule implements exactly one step of what happens to a
//! directory. [`crate::convert`] drives them.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ classify ──▶ normalize ──▶ layout + compose ──▶ cleanup
//! (path)    (suffix)     (HEIC→PNG)    (lopdf page/img)     (opt-in)
//! ```
//!
//! 1. [`input`]: normalise the user-supplied path and check it is a
//!    readable directory
//! 2. [`classify`]: decide by extension which entries are images
//! 3. [`normalize`]: bridge HEIC sources to PNG siblings, or skip them
//! 4. [`layout`]: fit each image onto the page, centred
//! 5. [`compose`]: build and atomically save the PDF
//! 6. [`cleanup`]: remove bridge files and originals, only when asked

pub mod classify;
pub mod cleanup;
pub mod compose;
pub mod input;
pub mod layout;
pub mod normalize;
