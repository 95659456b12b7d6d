//! End-to-end checks of the suggestion pipeline against a recorded page,
//! with a scripted model in place of a real one.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use labelsmith::config::TaggingConfig;
use labelsmith::extract::{JsonResource, extract_tree, flatten_text};
use labelsmith::llm::{GenerationSettings, LlmClientTrait, LlmError};
use labelsmith::models::{ContentNode, LabelCatalog, NodeEntry};
use labelsmith::prompt::{build_suggestion_prompt, categorize};
use labelsmith::resolver::{ConceptMapper, resolve_labels};
use labelsmith::{FailureKind, LabelSuggesterBuilder};
use serde_json::{Value, json};

struct ScriptedClient {
    response: String,
    calls: AtomicUsize,
    seen_settings: std::sync::Mutex<Option<GenerationSettings>>,
}

impl ScriptedClient {
    fn new(response: &str) -> Arc<Self> {
        Arc::new(Self {
            response: response.to_string(),
            calls: AtomicUsize::new(0),
            seen_settings: std::sync::Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LlmClientTrait for ScriptedClient {
    fn generate(&self, _prompt: &str, settings: &GenerationSettings) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.seen_settings.lock().unwrap() = Some(settings.clone());
        Ok(self.response.clone())
    }
}

fn fixture(path: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(path);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()))
}

fn page() -> Value {
    serde_json::from_str(&fixture("content/site/en/electric-suv.json")).unwrap()
}

fn catalog() -> LabelCatalog {
    serde_json::from_str(&fixture("catalog.json")).unwrap()
}

fn keys_in(node: &ContentNode, out: &mut Vec<String>) {
    for (key, entry) in node.iter() {
        out.push(key.to_string());
        if let NodeEntry::Child(child) = entry {
            keys_in(child, out);
        }
    }
}

#[test]
fn extracted_tree_never_contains_excluded_keys() {
    let config = TaggingConfig::default();
    let doc = page();

    let tree = extract_tree(
        Some(&JsonResource::new("electric-suv", &doc)),
        &config.excluded_keys,
        config.max_depth,
    );

    let mut keys = Vec::new();
    keys_in(&tree, &mut keys);
    assert!(keys.iter().all(|k| !config.excluded_keys.contains(k)));
    assert!(keys.contains(&"sling:resourceType".to_string()));
    assert!(keys.contains(&"hideInNav".to_string()));
}

#[test]
fn depth_bound_cuts_deeper_subtrees() {
    let doc = json!({
        "text": "level 0",
        "a": {"text": "level 1", "b": {"text": "level 2", "c": {"text": "level 3"}}}
    });

    let tree = extract_tree(Some(&JsonResource::new("deep", &doc)), &HashSet::new(), 2);

    assert_eq!(tree.depth(), 2);
    let text = flatten_text(&tree, &HashSet::from(["text".to_string()]));
    assert_eq!(text, "level 0 level 1 level 2");
}

#[test]
fn all_excluded_leaf_is_omitted_from_parent() {
    let doc = json!({
        "title": "Kept",
        "meta": {"jcr:uuid": "1", "jcr:created": "2024-01-01"}
    });
    let excluded: HashSet<String> = ["jcr:uuid", "jcr:created"].map(String::from).into();

    let tree = extract_tree(Some(&JsonResource::new("page", &doc)), &excluded, 10);

    assert_eq!(tree.len(), 1);
    assert!(!tree.contains_key("meta"));
}

#[test]
fn flattened_fixture_follows_tree_order() {
    let config = TaggingConfig::default();
    let doc = page();
    let tree = extract_tree(
        Some(&JsonResource::new("electric-suv", &doc)),
        &config.excluded_keys,
        config.max_depth,
    );

    let text = flatten_text(&tree, &config.text_keys);

    assert!(text.starts_with("Meet the all-electric family SUV Seven seats, 500 km of range"));
    assert!(text.ends_with("Long range Up to 500 km on a single charge."));
    assert!(!text.contains("replication-service"));
    assert!(!text.contains("/content/dam"));
}

#[test]
fn catalog_ids_round_trip_through_resolver() {
    let catalog = catalog();
    let ids: Vec<&str> = catalog.ids().map(|id| id.as_str()).collect();
    let mut answer = ids.join(", ");
    answer.push_str(", ");
    answer.push_str(ids[0]);

    let resolved = resolve_labels(&answer, &catalog);

    assert_eq!(resolved.to_strings(), ids);
}

#[test]
fn categorized_prompt_groups_catalog_in_first_seen_order() {
    let catalog = catalog();
    let categorized = categorize(&catalog);

    let names: Vec<&str> = categorized.categories().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["content-type", "topic", "audience", "feature", "intent"]);

    let prompt = build_suggestion_prompt("Some text", &categorized);
    let content_type = prompt.as_str().find("CONTENT TYPE:").unwrap();
    let topic = prompt.as_str().find("TOPIC:").unwrap();
    assert!(content_type < topic);
}

#[test]
fn default_concept_table_maps_exact_and_fuzzy_concepts() {
    let mapper = ConceptMapper::new(TaggingConfig::default().concept_table);

    let exact = mapper.map_concepts(&["automotive"]);
    let fuzzy = mapper.map_concepts(&["automotive-news"]);

    assert_eq!(exact.to_strings(), vec!["myaemproject:topic/automotive"]);
    assert_eq!(fuzzy, exact);
}

#[test]
fn suggester_returns_validated_labels_for_fixture() {
    let client = ScriptedClient::new(
        "```\nmyaemproject:topic/automotive/electric-vehicles, myaemproject:audience/families, \
         myaemproject:feature/fast-charging, myaemproject:topic/automotive/electric-vehicles, \
         myaemproject:feature/teleportation\n```",
    );
    let suggester = LabelSuggesterBuilder::new()
        .client(client.clone())
        .settings(GenerationSettings::with_model("llama3.2"))
        .build();

    let labels = suggester
        .suggest_labels(&JsonResource::new("electric-suv", &page()), &catalog())
        .unwrap();

    assert_eq!(
        labels.to_strings(),
        vec![
            "myaemproject:topic/automotive/electric-vehicles",
            "myaemproject:audience/families",
            "myaemproject:feature/fast-charging"
        ]
    );
    assert_eq!(client.calls(), 1);
    let settings = client.seen_settings.lock().unwrap().clone().unwrap();
    assert_eq!(settings.model, "llama3.2");
}

#[test]
fn metadata_only_document_short_circuits_before_the_model() {
    let client = ScriptedClient::new("myaemproject:topic/automotive");
    let suggester = LabelSuggesterBuilder::new().client(client.clone()).build();
    let doc = json!({
        "jcr:createdBy": "admin",
        "jcr:content": {"cq:lastModified": "2024-05-01", "metrics": {"seats": 7}}
    });

    let error = suggester
        .suggest_labels(&JsonResource::new("metrics-only", &doc), &catalog())
        .unwrap_err();

    assert_eq!(error.kind(), FailureKind::EmptyContent);
    assert_eq!(client.calls(), 0);
}
