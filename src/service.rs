use thiserror::Error;

use crate::extract::JsonResource;
use crate::models::ResolvedLabels;
use crate::store::{CatalogSource, DocumentStore, LabelSink, StoreError, document_name};
use crate::tagger::{LabelSuggester, TaggingError, log_failure};


/// How the service asks the model for labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuggestionMode {
    /// The model picks label IDs from the catalog.
    #[default]
    Catalog,
    /// The model answers with free-form concepts, mapped through the concept table.
    Concepts,
}

/// Errors from one workflow step.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Tagging(#[from] TaggingError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a workflow step did to one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggingReport {
    /// Reference of the processed document.
    pub document: String,
    /// Labels suggested by the model, after catalog validation.
    pub suggested: ResolvedLabels,
    /// How many of them the sink applied.
    pub applied: usize,
}

/// One workflow step: fetch a document, suggest labels, apply them.
///
/// The service borrows its collaborators, so one store can act as both
/// catalog source and label sink.
///
/// # Examples
///
/// ```no_run
/// use labelsmith::llm::LlmClientBuilder;
/// use labelsmith::service::TaggingService;
/// use labelsmith::store::{JsonDocumentStore, LabelStore};
/// use labelsmith::tagger::LabelSuggesterBuilder;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let suggester = LabelSuggesterBuilder::new()
///     .client(LlmClientBuilder::new().build()?)
///     .build();
/// let documents = JsonDocumentStore::new("/srv/content");
/// let labels = LabelStore::open("labels.db")?;
///
/// let service = TaggingService::new(&suggester, &documents, &labels, &labels);
/// let report = service.process("/content/site/en/electric-suv")?;
/// println!("applied {} labels", report.applied);
/// # Ok(())
/// # }
/// ```
pub struct TaggingService<'a> {
    suggester: &'a LabelSuggester,
    documents: &'a dyn DocumentStore,
    catalog: &'a dyn CatalogSource,
    sink: &'a dyn LabelSink,
    mode: SuggestionMode,
}

impl<'a> TaggingService<'a> {
    pub fn new(
        suggester: &'a LabelSuggester,
        documents: &'a dyn DocumentStore,
        catalog: &'a dyn CatalogSource,
        sink: &'a dyn LabelSink,
    ) -> Self {
        Self {
            suggester,
            documents,
            catalog,
            sink,
            mode: SuggestionMode::default(),
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: SuggestionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> SuggestionMode {
        self.mode
    }

    /// Suggests labels for the document at `reference` without applying them.
    ///
    /// A missing document is `InputAbsent`. The catalog is read fresh on
    /// every call.
    pub fn suggest(&self, reference: &str) -> Result<ResolvedLabels, ServiceError> {
        let Some(document) = self.documents.fetch(reference)? else {
            let error = TaggingError::InputAbsent(reference.to_string());
            log_failure(reference, &error);
            return Err(error.into());
        };

        let catalog = self.catalog.all_available_labels()?;
        let resource = JsonResource::new(document_name(reference), &document);

        let result = match self.mode {
            SuggestionMode::Catalog => self.suggester.suggest_labels(&resource, &catalog),
            SuggestionMode::Concepts => self.suggester.suggest_from_concepts(&resource, &catalog),
        };

        result.map_err(|e| {
            log_failure(reference, &e);
            ServiceError::from(e)
        })
    }

    /// Suggests labels for the document at `reference` and applies them.
    pub fn process(&self, reference: &str) -> Result<TaggingReport, ServiceError> {
        let suggested = self.suggest(reference)?;
        let applied = self.sink.apply_labels(reference, suggested.as_slice())?;

        Ok(TaggingReport {
            document: reference.to_string(),
            suggested,
            applied,
        })
    }
}
