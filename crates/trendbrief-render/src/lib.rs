//! Output-side rendering of a [`Brief`](trendbrief_core::Brief).
//!
//! Two consumers sit downstream of the pipeline: an LLM call that turns the
//! brief into content instructions, and an email sender. This crate produces
//! the text both consume — the prompt string and the HTML document — and
//! nothing else. No API calls, no delivery; those collaborators live outside
//! the repository.

pub mod html;
pub mod prompt;

pub use html::render_html;
pub use prompt::build_content_prompt;
