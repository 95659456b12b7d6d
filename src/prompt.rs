//! Prompt construction for label suggestion, concept extraction and
//! content-type classification.

mod builder;
mod categorize;

pub use builder::{
    Prompt, build_concept_prompt, build_content_type_prompt, build_suggestion_prompt,
    render_catalog,
};
pub use categorize::categorize;
