//! Pipeline stages for LaTeX flattening.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. plug in another parser) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ resolve ──▶ strip ──▶ render ──▶ postprocess
//! (path/dir/-) (splice)  (passes)  (tree→text) (cleanup)
//! ```
//!
//! 1. [`input`]   — turn the user-supplied argument into a file or stdin text
//! 2. [`resolve`] — parse the document and splice every included file in,
//!    reading through a [`source::ContentSource`] and parsing with
//!    [`parse::LatexSyntax`]
//! 3. [`strip`]   — comment, whitespace, clutter and narrowing passes, each a
//!    decision function for the [`walk`]er
//! 4. [`render`]  — tree back to LaTeX text
//! 5. [`postprocess`] — deterministic text cleanup (line endings, blank lines)

pub mod input;
pub mod parse;
pub mod postprocess;
pub mod render;
pub mod resolve;
pub mod source;
pub mod strip;
pub mod walk;
