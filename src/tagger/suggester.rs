use std::sync::Arc;

use crate::config::TaggingConfig;
use crate::extract::{DocumentHeader, ResourceNode, extract_tree, flatten_text};
use crate::llm::{GenerationSettings, LlmClientTrait};
use crate::models::{ContentNode, ContentType, LabelCatalog, ResolvedLabels};
use crate::prompt::{
    Prompt, build_concept_prompt, build_content_type_prompt, build_suggestion_prompt, categorize,
};
use crate::resolver::{ConceptMapper, parse_concepts, parse_content_type, resolve_labels};

use super::error::{FailureKind, TaggingError};

/// A document after extraction, ready to be prompted with.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedDocument {
    pub header: DocumentHeader,
    /// The cleaned tree, without excluded keys.
    pub tree: ContentNode,
    /// Flattened text of `tree`; empty when there is nothing to classify.
    pub text: String,
}

impl PreparedDocument {
    /// Header and text, as sent to the model.
    pub fn content(&self) -> String {
        self.header.compose(&self.text)
    }

    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }
}

/// Builder for constructing `LabelSuggester` instances.
///
/// # Examples
///
/// ```no_run
/// use labelsmith::llm::LlmClientBuilder;
/// use labelsmith::models::LabelCatalog;
/// use labelsmith::extract::JsonResource;
/// use labelsmith::tagger::LabelSuggesterBuilder;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let suggester = LabelSuggesterBuilder::new()
///     .client(LlmClientBuilder::new().build()?)
///     .build();
///
/// let doc = serde_json::json!({"jcr:title": "Electric SUVs"});
/// let catalog: LabelCatalog = [("ns:topic/automotive", "Automotive")].into_iter().collect();
/// let labels = suggester.suggest_labels(&JsonResource::new("electric-suvs", &doc), &catalog)?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct LabelSuggesterBuilder {
    client: Option<Arc<dyn LlmClientTrait>>,
    settings: Option<GenerationSettings>,
    config: Option<TaggingConfig>,
}

impl LabelSuggesterBuilder {
    /// Creates a new `LabelSuggesterBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the model client used for every model call.
    pub fn client(mut self, client: Arc<dyn LlmClientTrait>) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets model, temperature and output cap (default: [`GenerationSettings::default`]).
    pub fn settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Sets the extraction rules and concept table (default: [`TaggingConfig::default`]).
    pub fn config(mut self, config: TaggingConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the `LabelSuggester`.
    ///
    /// # Panics
    ///
    /// Panics if `client()` was not called before `build()`.
    #[must_use]
    pub fn build(self) -> LabelSuggester {
        let config = self.config.unwrap_or_default();
        let mapper = ConceptMapper::new(config.concept_table.clone());

        LabelSuggester {
            client: self.client.expect("client must be set via client() method"),
            settings: self.settings.unwrap_or_default(),
            config,
            mapper,
        }
    }
}

/// Runs the suggestion pipeline for one document at a time.
///
/// Every call works on request-local data only; one suggester can serve
/// concurrent requests as long as each brings its own catalog snapshot.
pub struct LabelSuggester {
    client: Arc<dyn LlmClientTrait>,
    settings: GenerationSettings,
    config: TaggingConfig,
    mapper: ConceptMapper,
}

impl LabelSuggester {
    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn config(&self) -> &TaggingConfig {
        &self.config
    }

    /// Extracts the clean tree, its flattened text and the header.
    ///
    /// Never calls the model.
    pub fn prepare<N: ResourceNode>(&self, document: &N) -> PreparedDocument {
        let tree = extract_tree(Some(document), &self.config.excluded_keys, self.config.max_depth);
        let text = flatten_text(&tree, &self.config.text_keys);
        let header = DocumentHeader::from_tree(
            document.name(),
            &tree,
            self.config.content_child.as_deref(),
        );

        tracing::debug!(
            document = document.name(),
            chars = text.len(),
            "extracted document text"
        );

        PreparedDocument { header, tree, text }
    }

    /// Builds the label suggestion prompt without sending it.
    pub fn suggestion_prompt<N: ResourceNode>(
        &self,
        document: &N,
        catalog: &LabelCatalog,
    ) -> Result<Prompt, TaggingError> {
        let prepared = self.prepared_with_text(document)?;
        ensure_catalog(catalog)?;
        Ok(build_suggestion_prompt(&prepared.content(), &categorize(catalog)))
    }

    /// Suggests catalog labels for `document`.
    ///
    /// Returns `EmptyContent` or `EmptyCatalog` before any model call when
    /// there is nothing to classify or nothing to choose from. A blank model
    /// answer is `MalformedResponse`; one that names no catalog label is
    /// `NoValidLabels`.
    pub fn suggest_labels<N: ResourceNode>(
        &self,
        document: &N,
        catalog: &LabelCatalog,
    ) -> Result<ResolvedLabels, TaggingError> {
        let prompt = self.suggestion_prompt(document, catalog)?;

        tracing::info!(
            document = document.name(),
            catalog_size = catalog.len(),
            model = %self.settings.model,
            "requesting label suggestions"
        );

        let raw_response = self.generate(&prompt)?;
        if raw_response.trim().is_empty() {
            return Err(TaggingError::MalformedResponse(
                "response was blank".to_string(),
            ));
        }
        let labels = resolve_labels(&raw_response, catalog);

        if labels.is_empty() {
            return Err(TaggingError::NoValidLabels { raw_response });
        }
        Ok(labels)
    }

    /// Like [`suggest_labels`](Self::suggest_labels), but logs the failure
    /// and returns an empty set instead.
    pub fn suggest_labels_or_empty<N: ResourceNode>(
        &self,
        document: &N,
        catalog: &LabelCatalog,
    ) -> ResolvedLabels {
        self.suggest_labels(document, catalog).unwrap_or_else(|e| {
            log_failure(document.name(), &e);
            ResolvedLabels::new()
        })
    }

    /// Asks the model for free-form concepts describing `document`.
    pub fn extract_concepts<N: ResourceNode>(&self, document: &N) -> Result<Vec<String>, TaggingError> {
        let prepared = self.prepared_with_text(document)?;
        let (concepts, _) = self.request_concepts(&prepared)?;
        Ok(concepts)
    }

    /// Suggests labels through the concept flow: free-form concepts mapped
    /// with the concept table, then restricted to `catalog`.
    pub fn suggest_from_concepts<N: ResourceNode>(
        &self,
        document: &N,
        catalog: &LabelCatalog,
    ) -> Result<ResolvedLabels, TaggingError> {
        let prepared = self.prepared_with_text(document)?;
        ensure_catalog(catalog)?;

        let (concepts, raw_response) = self.request_concepts(&prepared)?;
        let mut labels = self.mapper.map_concepts(&concepts);
        labels.retain(|id| {
            let known = catalog.contains(id.as_str());
            if !known {
                tracing::warn!(label = %id, "mapped label is not in the catalog");
            }
            known
        });

        if labels.is_empty() {
            return Err(TaggingError::NoValidLabels { raw_response });
        }
        Ok(labels)
    }

    /// Classifies `document` into one [`ContentType`].
    pub fn classify_content_type<N: ResourceNode>(&self, document: &N) -> Result<ContentType, TaggingError> {
        let prepared = self.prepared_with_text(document)?;
        let raw_response = self.generate(&build_content_type_prompt(&prepared.content()))?;

        parse_content_type(&raw_response).map_err(|e| {
            tracing::warn!(response = %raw_response, "model answered with an unknown content type");
            TaggingError::MalformedResponse(e.to_string())
        })
    }

    fn prepared_with_text<N: ResourceNode>(&self, document: &N) -> Result<PreparedDocument, TaggingError> {
        let prepared = self.prepare(document);
        if !prepared.has_text() {
            return Err(TaggingError::EmptyContent(document.name().to_string()));
        }
        Ok(prepared)
    }

    fn request_concepts(&self, prepared: &PreparedDocument) -> Result<(Vec<String>, String), TaggingError> {
        let raw_response = self.generate(&build_concept_prompt(&prepared.content()))?;
        let concepts = parse_concepts(&raw_response);

        if concepts.is_empty() {
            return Err(TaggingError::MalformedResponse(
                "response contained no concepts".to_string(),
            ));
        }
        tracing::debug!(?concepts, "model suggested concepts");
        Ok((concepts, raw_response))
    }

    fn generate(&self, prompt: &Prompt) -> Result<String, TaggingError> {
        self.client
            .generate(prompt.as_str(), &self.settings)
            .map_err(|e| {
                tracing::error!(error = %e, "model call failed");
                TaggingError::from(e)
            })
    }
}

fn ensure_catalog(catalog: &LabelCatalog) -> Result<(), TaggingError> {
    if catalog.is_empty() {
        tracing::warn!("no labels available in the catalog");
        return Err(TaggingError::EmptyCatalog);
    }
    Ok(())
}

/// Logs a pipeline failure at the level its kind deserves.
pub(crate) fn log_failure(document: &str, error: &TaggingError) {
    match error.kind() {
        FailureKind::EmptyContent | FailureKind::InputAbsent => {
            tracing::info!(document, reason = %error.kind(), "nothing to tag")
        }
        FailureKind::TransportFailure => {
            tracing::error!(document, error = %error, "label suggestion failed")
        }
        _ => tracing::warn!(document, error = %error, "no labels suggested"),
    }
}
