use std::path::Path;

use lesson_core::model::{LessonCatalog, LessonDocument};

use crate::error::CatalogLoadError;

async fn read(path: &Path) -> Result<String, CatalogLoadError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CatalogLoadError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Read and validate a catalog JSON file.
///
/// # Errors
///
/// Returns `CatalogLoadError` if the file cannot be read or is not a valid catalog.
pub async fn load_catalog(path: impl AsRef<Path>) -> Result<LessonCatalog, CatalogLoadError> {
    let path = path.as_ref();
    let catalog = LessonCatalog::from_json(&read(path).await?)?;
    tracing::info!(
        path = %path.display(),
        courses = catalog.courses().len(),
        lessons = catalog.lessons().len(),
        "catalog loaded"
    );
    Ok(catalog)
}

/// Read a lesson content document.
///
/// # Errors
///
/// Returns `CatalogLoadError` if the file cannot be read or parsed.
pub async fn load_lesson_document(
    path: impl AsRef<Path>,
) -> Result<LessonDocument, CatalogLoadError> {
    let path = path.as_ref();
    let document = LessonDocument::from_json(&read(path).await?)?;
    tracing::debug!(
        path = %path.display(),
        sections = document.sections.len(),
        "lesson document loaded"
    );
    Ok(document)
}
