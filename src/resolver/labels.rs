use crate::models::{ContentType, LabelCatalog, ResolvedLabels, UnknownContentType};

/// Characters models like to wrap answers in. Removed before splitting.
const QUOTE_CHARS: [char; 7] = ['`', '"', '\'', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}'];

/// Resolves a raw model answer into catalog-validated label IDs.
///
/// Formatting artifacts (code fences, backticks, straight and curly quotes)
/// are stripped, the rest is split on commas, and every token must be an
/// exact catalog key to survive. Unknown tokens are logged and dropped; they
/// are never corrected. The result keeps first-occurrence order without
/// duplicates, and is empty for a blank answer.
///
/// # Examples
///
/// ```
/// use labelsmith::models::LabelCatalog;
/// use labelsmith::resolver::resolve_labels;
///
/// let catalog: LabelCatalog = [("tagA", "A")].into_iter().collect();
/// let labels = resolve_labels("`tagA`, tagA, tagZ", &catalog);
///
/// assert_eq!(labels.to_strings(), vec!["tagA"]);
/// ```
pub fn resolve_labels(raw_response: &str, catalog: &LabelCatalog) -> ResolvedLabels {
    let mut labels = ResolvedLabels::new();

    if raw_response.trim().is_empty() {
        tracing::warn!("empty response from model");
        return labels;
    }

    let cleaned = strip_formatting(raw_response, catalog);

    for token in split_list(&cleaned) {
        match catalog.get_id(token) {
            Some(id) => {
                labels.push(id.clone());
            }
            None => tracing::warn!(label = token, "model suggested non-existent label"),
        }
    }

    if labels.is_empty() {
        tracing::warn!(response = raw_response, "model returned no valid labels");
    } else {
        tracing::info!(
            count = labels.len(),
            labels = ?labels.to_strings(),
            "model suggested valid labels"
        );
    }

    labels
}

/// Splits a free-text concept answer into trimmed, non-empty concepts.
pub fn parse_concepts(raw_response: &str) -> Vec<String> {
    if raw_response.trim().is_empty() {
        return Vec::new();
    }

    split_list(raw_response).map(String::from).collect()
}

/// Parses a single content-type answer such as `"Tutorial."` or `` `faq` ``.
pub fn parse_content_type(raw_response: &str) -> Result<ContentType, UnknownContentType> {
    let normalized = raw_response
        .trim()
        .to_lowercase()
        .trim_matches(|c: char| QUOTE_CHARS.contains(&c) || c == '.' || c.is_whitespace())
        .to_string();

    normalized.parse()
}

fn split_list(text: &str) -> impl Iterator<Item = &str> {
    text.split(',').map(str::trim).filter(|token| !token.is_empty())
}

/// Removes code fences (including a language tag on the opening fence) and
/// quote characters. A word after a fence that names a catalog label is kept.
fn strip_formatting(response: &str, catalog: &LabelCatalog) -> String {
    let without_fences = response
        .lines()
        .filter(|line| !is_fence_line(line, catalog))
        .collect::<Vec<_>>()
        .join("\n")
        .replace("```", "");

    without_fences
        .chars()
        .filter(|c| !QUOTE_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// A line that holds only a fence marker, optionally followed by a language tag.
fn is_fence_line(line: &str, catalog: &LabelCatalog) -> bool {
    line.trim().strip_prefix("```").is_some_and(|rest| {
        rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') && !catalog.contains(rest)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(ids: &[&str]) -> LabelCatalog {
        ids.iter().map(|id| (*id, id.to_uppercase())).collect()
    }

    #[test]
    fn fence_stripped_duplicates_removed_unknown_dropped() {
        let labels = resolve_labels("`tagA`, tagA, tagZ", &catalog(&["tagA"]));
        assert_eq!(labels.to_strings(), vec!["tagA"]);
    }

    #[test]
    fn catalog_ids_joined_resolve_to_themselves() {
        let ids = ["ns:topic/x", "ns:topic/y", "ns:audience/z"];
        let catalog = catalog(&ids);
        let joined = catalog
            .ids()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(",");

        let labels = resolve_labels(&joined, &catalog);
        assert_eq!(labels.to_strings(), ids);
    }

    #[test]
    fn repeated_ids_keep_first_occurrence_order() {
        let catalog = catalog(&["a:1", "a:2", "a:3"]);
        let labels = resolve_labels("a:3, a:1, a:3, a:2, a:1", &catalog);
        assert_eq!(labels.to_strings(), vec!["a:3", "a:1", "a:2"]);
    }

    #[test]
    fn blank_response_resolves_to_nothing() {
        let catalog = catalog(&["a:1"]);
        assert!(resolve_labels("", &catalog).is_empty());
        assert!(resolve_labels("   \n\t", &catalog).is_empty());
    }

    #[test]
    fn multi_line_code_fence_with_language_tag() {
        let catalog = catalog(&["ns:topic/automotive", "ns:audience/families"]);
        let response = "```text\nns:topic/automotive, ns:audience/families\n```";

        let labels = resolve_labels(response, &catalog);
        assert_eq!(
            labels.to_strings(),
            vec!["ns:topic/automotive", "ns:audience/families"]
        );
    }

    #[test]
    fn fence_word_that_is_a_catalog_label_is_kept() {
        let catalog = catalog(&["article", "ns:topic/suv"]);

        assert_eq!(resolve_labels("```article\n```", &catalog).to_strings(), vec!["article"]);
        assert_eq!(
            resolve_labels("```json\nns:topic/suv\n```", &catalog).to_strings(),
            vec!["ns:topic/suv"]
        );
    }

    #[test]
    fn straight_and_curly_quotes_are_removed() {
        let catalog = catalog(&["ns:topic/suv", "ns:feature/autopilot"]);
        let response = "\u{201C}ns:topic/suv\u{201D}, 'ns:feature/autopilot'";

        let labels = resolve_labels(response, &catalog);
        assert_eq!(labels.to_strings(), vec!["ns:topic/suv", "ns:feature/autopilot"]);
    }

    #[test]
    fn near_misses_are_not_corrected() {
        let catalog = catalog(&["ns:topic/automotive"]);
        let labels = resolve_labels("NS:TOPIC/AUTOMOTIVE, ns:topic/automotives, automotive", &catalog);
        assert!(labels.is_empty());
    }

    #[test]
    fn prose_answer_yields_no_labels() {
        let catalog = catalog(&["ns:topic/automotive"]);
        let labels = resolve_labels("I think this page is about cars", &catalog);
        assert!(labels.is_empty());
    }

    #[test]
    fn parse_concepts_trims_and_drops_empty_items() {
        assert_eq!(
            parse_concepts(" electric vehicles, ,SUV ,\nfamilies,"),
            vec!["electric vehicles", "SUV", "families"]
        );
        assert!(parse_concepts("  ").is_empty());
    }

    #[test]
    fn parse_content_type_tolerates_case_quotes_and_period() {
        assert_eq!(parse_content_type(" Tutorial.\n"), Ok(ContentType::Tutorial));
        assert_eq!(parse_content_type("\"blog-post\""), Ok(ContentType::BlogPost));
        assert_eq!(parse_content_type("`FAQ`"), Ok(ContentType::Faq));
        assert!(parse_content_type("a newsletter").is_err());
    }
}
