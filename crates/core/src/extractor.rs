use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// 1-based page number, `None` when the text could not be attributed to a page.
    pub page: Option<u32>,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub path: PathBuf,
    pub pages: Vec<PageText>,
}

/// Outcome of loading a documents folder; failures are kept for reporting.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub found: usize,
    pub documents: Vec<LoadedDocument>,
    pub failures: Vec<(PathBuf, String)>,
}

/// PDF files directly inside `dir`, sorted by path.
pub fn discover_pdfs(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        warn!("documents folder {:?} not found", dir);
        return Vec::new();
    }
    let mut found: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && is_pdf(e.path()))
        .map(|e| e.into_path())
        .collect();
    found.sort();
    found
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Loads every PDF in `dir`. Unreadable files are logged and skipped.
pub fn load_documents(dir: &Path) -> LoadOutcome {
    let paths = discover_pdfs(dir);
    let mut outcome = LoadOutcome {
        found: paths.len(),
        ..LoadOutcome::default()
    };
    for path in paths {
        match extract_pages(&path) {
            Ok(pages) => {
                info!("loaded {:?} ({} pages)", path, pages.len());
                outcome.documents.push(LoadedDocument { path, pages });
            }
            Err(e) => {
                warn!("failed to load {:?}: {:#}", path, e);
                outcome.failures.push((path, format!("{:#}", e)));
            }
        }
    }
    outcome
}

pub fn extract_pages(path: &Path) -> anyhow::Result<Vec<PageText>> {
    pdf_pages(path).with_context(|| format!("extracting text from {:?}", path))
}

#[cfg(feature = "pdf")]
fn pdf_pages(path: &Path) -> anyhow::Result<Vec<PageText>> {
    let doc = lopdf::Document::load(path)?;
    let mut pages = Vec::new();
    for page_number in doc.get_pages().keys().copied() {
        // A page whose content stream cannot be decoded is treated as empty.
        let text = doc.extract_text(&[page_number]).unwrap_or_default();
        pages.push(PageText {
            page: Some(page_number),
            text,
        });
    }
    if pages.iter().all(|p| p.text.trim().is_empty()) {
        // lopdf misses text in some font encodings; pdf-extract copes with more.
        let text = pdf_extract::extract_text(path)?;
        return Ok(vec![PageText { page: None, text }]);
    }
    Ok(pages)
}

#[cfg(not(feature = "pdf"))]
fn pdf_pages(_path: &Path) -> anyhow::Result<Vec<PageText>> {
    anyhow::bail!("built without the `pdf` feature")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn discovers_only_top_level_pdfs_in_order() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("b.pdf"), b"x").unwrap();
        fs::write(temp.path().join("A.PDF"), b"x").unwrap();
        fs::write(temp.path().join("notes.txt"), b"x").unwrap();
        fs::create_dir_all(temp.path().join("nested")).unwrap();
        fs::write(temp.path().join("nested/c.pdf"), b"x").unwrap();

        let found = discover_pdfs(temp.path());
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["A.PDF", "b.pdf"]);
    }

    #[test]
    fn missing_folder_yields_nothing() {
        let temp = tempdir().unwrap();
        assert!(discover_pdfs(&temp.path().join("absent")).is_empty());
    }

    #[test]
    fn unreadable_pdf_is_skipped_and_reported() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("broken.pdf"), b"definitely not a pdf").unwrap();

        let outcome = load_documents(temp.path());
        assert_eq!(outcome.found, 1);
        assert!(outcome.documents.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].0.ends_with("broken.pdf"));
    }
}
