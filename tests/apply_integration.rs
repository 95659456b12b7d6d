use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use labelsmith::llm::{GenerationSettings, LlmClientTrait, LlmError};
use labelsmith::models::LabelCatalog;
use labelsmith::store::{CatalogSource, DocumentStore};
use labelsmith::{
    FailureKind, JsonDocumentStore, LabelStore, LabelSuggesterBuilder, ServiceError, SuggestionMode,
    TaggingService,
};
use tempfile::TempDir;

struct FixedClient(String);

impl LlmClientTrait for FixedClient {
    fn generate(&self, _prompt: &str, _settings: &GenerationSettings) -> Result<String, LlmError> {
        Ok(self.0.clone())
    }
}

struct UnreachableClient;

impl LlmClientTrait for UnreachableClient {
    fn generate(&self, _prompt: &str, _settings: &GenerationSettings) -> Result<String, LlmError> {
        Err(LlmError::Http { status: 503 })
    }
}

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Opens a file-backed label store seeded with the fixture catalog.
fn seeded_store(dir: &Path) -> Result<LabelStore> {
    let store = LabelStore::open(dir.join("labels.db"))?;
    let catalog: LabelCatalog =
        serde_json::from_str(&std::fs::read_to_string(fixtures().join("catalog.json"))?)?;
    store.import_catalog(&catalog)?;
    Ok(store)
}

#[test]
fn test_apply_suggested_labels_to_stored_document() -> Result<()> {
    // Arrange
    let dir = TempDir::new()?;
    let labels = seeded_store(dir.path())?;
    let documents = JsonDocumentStore::new(fixtures());
    let suggester = LabelSuggesterBuilder::new()
        .client(Arc::new(FixedClient(
            "myaemproject:topic/automotive/suv, myaemproject:feature/long-range-battery, ns:made-up"
                .to_string(),
        )))
        .build();
    let service = TaggingService::new(&suggester, &documents, &labels, &labels);

    // Act
    let report = service.process("/content/site/en/electric-suv")?;

    // Assert
    assert_eq!(report.applied, 2);
    let stored = labels.assignments("/content/site/en/electric-suv")?;
    let titles: Vec<&str> = stored.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["SUV", "Long Range Battery"]);

    Ok(())
}

#[test]
fn test_reprocessing_replaces_previous_labels() -> Result<()> {
    let dir = TempDir::new()?;
    let labels = seeded_store(dir.path())?;
    let documents = JsonDocumentStore::new(fixtures());

    let first = LabelSuggesterBuilder::new()
        .client(Arc::new(FixedClient("myaemproject:topic/automotive".to_string())))
        .build();
    TaggingService::new(&first, &documents, &labels, &labels).process("/content/site/en/electric-suv")?;

    let second = LabelSuggesterBuilder::new()
        .client(Arc::new(FixedClient("myaemproject:audience/families".to_string())))
        .build();
    TaggingService::new(&second, &documents, &labels, &labels).process("/content/site/en/electric-suv")?;

    let stored = labels.assignments("/content/site/en/electric-suv")?;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].label.as_str(), "myaemproject:audience/families");

    Ok(())
}

#[test]
fn test_concept_mode_against_stored_catalog() -> Result<()> {
    let dir = TempDir::new()?;
    let labels = seeded_store(dir.path())?;
    let documents = JsonDocumentStore::new(fixtures());
    let suggester = LabelSuggesterBuilder::new()
        .client(Arc::new(FixedClient(
            "Electric-Vehicles, Autopilot, clean energy, families".to_string(),
        )))
        .build();
    let service = TaggingService::new(&suggester, &documents, &labels, &labels)
        .with_mode(SuggestionMode::Concepts);

    let report = service.process("/content/site/en/electric-suv")?;

    // "clean energy" has no exact or fuzzy match in the default table.
    assert_eq!(
        report.suggested.to_strings(),
        vec![
            "myaemproject:topic/automotive/electric-vehicles",
            "myaemproject:feature/autopilot",
            "myaemproject:audience/families"
        ]
    );
    Ok(())
}

#[test]
fn test_transport_failure_leaves_labels_untouched() -> Result<()> {
    let dir = TempDir::new()?;
    let labels = seeded_store(dir.path())?;
    let documents = JsonDocumentStore::new(fixtures());
    let suggester = LabelSuggesterBuilder::new()
        .client(Arc::new(UnreachableClient))
        .build();
    let service = TaggingService::new(&suggester, &documents, &labels, &labels);

    let error = service.process("/content/site/en/electric-suv").unwrap_err();

    assert!(matches!(
        error,
        ServiceError::Tagging(ref e) if e.kind() == FailureKind::TransportFailure
    ));
    assert!(labels.assignments("/content/site/en/electric-suv")?.is_empty());
    Ok(())
}

#[test]
fn test_empty_catalog_is_reported_before_model_call() -> Result<()> {
    let dir = TempDir::new()?;
    let labels = LabelStore::open(dir.path().join("empty.db"))?;
    let documents = JsonDocumentStore::new(fixtures());
    let suggester = LabelSuggesterBuilder::new()
        .client(Arc::new(UnreachableClient))
        .build();
    let service = TaggingService::new(&suggester, &documents, &labels, &labels);

    assert!(labels.all_available_labels()?.is_empty());
    let error = service.process("/content/site/en/electric-suv").unwrap_err();

    assert!(matches!(
        error,
        ServiceError::Tagging(ref e) if e.kind() == FailureKind::EmptyCatalog
    ));
    Ok(())
}

#[test]
fn test_document_store_rejects_escaping_references() -> Result<()> {
    let documents = JsonDocumentStore::new(fixtures());

    assert!(documents.fetch("/content/../../Cargo.toml").is_err());
    assert!(documents.fetch("/content/site/en/unknown-page")?.is_none());
    Ok(())
}
