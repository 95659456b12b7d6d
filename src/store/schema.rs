/// Schema for the label store.
///
/// `labels` keeps catalog order in `position`; `document_labels` holds the
/// current label set of each document.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS labels (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    position INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS document_labels (
    document TEXT NOT NULL,
    label_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    applied_at INTEGER NOT NULL,
    PRIMARY KEY (document, label_id),
    FOREIGN KEY (label_id) REFERENCES labels(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_labels_position ON labels(position);
CREATE INDEX IF NOT EXISTS idx_document_labels_label ON document_labels(label_id);
"#;
