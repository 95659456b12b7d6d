use std::fmt::{self, Write};

use crate::models::{CategorizedCatalog, ContentType};

/// Opening line of the label suggestion prompt.
const SUGGESTION_PREAMBLE: &str =
    "You are a content tagging expert for a content management system.";

/// Catalog constraint, placed directly above the rendered catalog.
const CATALOG_HEADER: &str = "AVAILABLE TAGS (you MUST return tag IDs from this list ONLY):";

const SUGGESTION_INSTRUCTIONS: &str = r#"INSTRUCTIONS:
1. Analyze the content below
2. Select ONLY the most relevant tag IDs from the available tags list above
3. Return ONLY tag IDs, comma-separated, on a single line, nothing else
4. Do NOT invent new tags - use ONLY tags from the list
5. Select 3-8 tags that best describe the content
6. Prioritize content-type, topic, and audience tags"#;

const CONTENT_BEGIN: &str = "=== BEGIN CONTENT ===";
const CONTENT_END: &str = "=== END CONTENT ===";

const SUGGESTION_FORMAT: &str = "Return format: tagid1,tagid2,tagid3";

/// Prompt template for free-text concept extraction. No catalog constraint.
const CONCEPT_TEMPLATE: &str = "Analyze the following content and extract key concepts, topics, and themes. \
Return ONLY a comma-separated list of concepts, no explanations:";

/// A fully rendered prompt. Built once per request and never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Prompt {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Renders the catalog category by category as `  - LABEL_ID (Title)` lines.
pub fn render_catalog(catalog: &CategorizedCatalog) -> String {
    let mut rendered = String::new();
    let _ = writeln!(rendered, "{CATALOG_HEADER}\n");

    for category in catalog.categories() {
        let _ = writeln!(rendered, "{}:", category.heading());
        for (id, title) in &category.labels {
            let _ = writeln!(rendered, "  - {id} ({title})");
        }
        rendered.push('\n');
    }

    rendered
}

/// Builds the prompt asking the model to pick labels from `catalog` for `content`.
///
/// The output is fully determined by the inputs.
///
/// # Examples
///
/// ```
/// use labelsmith::models::LabelCatalog;
/// use labelsmith::prompt::{build_suggestion_prompt, categorize};
///
/// let catalog: LabelCatalog = [("ns:topic/automotive", "Automotive")].into_iter().collect();
/// let prompt = build_suggestion_prompt("New electric SUV", &categorize(&catalog));
///
/// assert!(prompt.as_str().contains("TOPIC:\n  - ns:topic/automotive (Automotive)"));
/// assert!(prompt.as_str().contains("New electric SUV"));
/// ```
pub fn build_suggestion_prompt(content: &str, catalog: &CategorizedCatalog) -> Prompt {
    let catalog = render_catalog(catalog);
    Prompt(format!(
        "{SUGGESTION_PREAMBLE}\n\n{catalog}{SUGGESTION_INSTRUCTIONS}\n\n\
         CONTENT TO ANALYZE:\n{CONTENT_BEGIN}\n{content}\n{CONTENT_END}\n\n{SUGGESTION_FORMAT}"
    ))
}

/// Builds the free-text concept extraction prompt.
pub fn build_concept_prompt(content: &str) -> Prompt {
    Prompt(format!("{CONCEPT_TEMPLATE}\n\n{content}"))
}

/// Builds the single-label content-type classification prompt.
pub fn build_content_type_prompt(content: &str) -> Prompt {
    let types = ContentType::ALL
        .iter()
        .map(|ct| ct.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    Prompt(format!(
        "Classify this content into ONE of these types: {types}. \
         Return ONLY the type name, nothing else:\n\n{content}"
    ))
}
