//! Grounded answer generation and cosmetic post-processing

pub mod answerer;
pub mod prompt;
pub mod style;

pub use answerer::{GroundedAnswerer, NO_CONTEXT_FALLBACK, GROUNDED_FALLBACK};
pub use prompt::PromptBuilder;
pub use style::{extract_styled_section, strip_emphasis};
