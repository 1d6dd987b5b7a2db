//! Recursive character text splitting with fixed size and overlap.
//!
//! Text is split on the coarsest separator that occurs in it (paragraph,
//! line, word, then single characters). Pieces are merged greedily into
//! chunks of at most `chunk_size` characters, and each new chunk starts
//! with up to `chunk_overlap` characters carried over from the previous
//! one. Pieces that are still too large are split again with the next
//! finer separator. Lengths are counted in `char`s, and the output is a
//! pure function of the input text and the two parameters.

use crate::extractor::PageText;
use crate::models::{ChunkSource, DocumentChunk};
use std::path::Path;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> anyhow::Result<Self> {
        anyhow::ensure!(chunk_size > 0, "chunk size must be positive");
        anyhow::ensure!(
            chunk_overlap < chunk_size,
            "chunk overlap ({chunk_overlap}) must be smaller than chunk size ({chunk_size})"
        );
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &SEPARATORS)
    }

    /// Splits every page independently, keeping the page as chunk source.
    pub fn split_pages(&self, path: &Path, pages: &[PageText]) -> Vec<DocumentChunk> {
        let mut chunks = Vec::new();
        for page in pages {
            for (index, text) in self.split_text(&page.text).into_iter().enumerate() {
                let source = ChunkSource {
                    path: path.to_path_buf(),
                    page: page.page,
                };
                chunks.push(DocumentChunk::new(text, source, index));
            }
        }
        chunks
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        // First separator present in the text; "" always matches.
        let (pos, separator) = separators
            .iter()
            .enumerate()
            .find(|(_, sep)| sep.is_empty() || text.contains(**sep))
            .map(|(i, sep)| (i, *sep))
            .unwrap_or((separators.len(), ""));
        let finer = separators.get(pos + 1..).unwrap_or(&[]);

        let pieces: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        };

        let mut out = Vec::new();
        let mut small: Vec<String> = Vec::new();
        for piece in pieces {
            if char_len(&piece) < self.chunk_size {
                small.push(piece);
                continue;
            }
            if !small.is_empty() {
                out.extend(self.merge(&small, separator));
                small.clear();
            }
            if finer.is_empty() {
                out.push(piece);
            } else {
                out.extend(self.split_recursive(&piece, finer));
            }
        }
        if !small.is_empty() {
            out.extend(self.merge(&small, separator));
        }
        out
    }

    fn merge(&self, pieces: &[String], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut window: std::collections::VecDeque<&str> = std::collections::VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            let joined_len = |window_len: usize| if window_len > 0 { sep_len } else { 0 };

            if total + len + joined_len(window.len()) > self.chunk_size && !window.is_empty() {
                push_chunk(&mut chunks, &window, separator);
                // Drop from the front until the carried-over tail fits the overlap
                // and leaves room for the next piece.
                while total > self.chunk_overlap
                    || (total + len + joined_len(window.len()) > self.chunk_size && total > 0)
                {
                    let Some(first) = window.pop_front() else {
                        break;
                    };
                    total -= char_len(first) + if window.is_empty() { 0 } else { sep_len };
                }
            }
            total += len + joined_len(window.len());
            window.push_back(piece);
        }
        push_chunk(&mut chunks, &window, separator);
        chunks
    }
}

fn push_chunk(chunks: &mut Vec<String>, window: &std::collections::VecDeque<&str>, separator: &str) {
    let joined = window.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy_text() -> String {
        let mut text = String::new();
        for i in 0..12 {
            text.push_str(&format!(
                "Section {i}. Employees working from home may request reimbursement of internet costs \
                 up to the monthly limit, provided the invoice is attached to the request.\n\n"
            ));
        }
        text
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        assert!(TextSplitter::new(10, 10).is_err());
        assert!(TextSplitter::new(0, 0).is_err());
        assert!(TextSplitter::new(10, 9).is_ok());
    }

    #[test]
    fn chunks_never_exceed_size() {
        let splitter = TextSplitter::new(300, 30).unwrap();
        let chunks = splitter.split_text(&policy_text());
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(char_len(c) <= 300, "chunk too long: {}", char_len(c));
            assert!(!c.is_empty());
            assert_eq!(c.trim(), c);
        }
    }

    #[test]
    fn short_text_is_one_chunk() {
        let splitter = TextSplitter::new(300, 30).unwrap();
        assert_eq!(
            splitter.split_text("  Meal policy applies on trips.  "),
            vec!["Meal policy applies on trips.".to_string()]
        );
        assert!(splitter.split_text("   \n\n  ").is_empty());
    }

    #[test]
    fn consecutive_word_chunks_overlap() {
        let splitter = TextSplitter::new(20, 8).unwrap();
        let chunks = splitter.split_text("alpha beta gamma delta epsilon zeta eta theta");
        assert_eq!(
            chunks,
            vec![
                "alpha beta gamma".to_string(),
                "gamma delta epsilon".to_string(),
                "epsilon zeta eta".to_string(),
                "zeta eta theta".to_string(),
            ]
        );
    }

    #[test]
    fn paragraphs_are_preferred_boundaries() {
        let splitter = TextSplitter::new(30, 5).unwrap();
        let chunks = splitter.split_text("First paragraph here.\n\nSecond paragraph here.");
        assert_eq!(
            chunks,
            vec![
                "First paragraph here.".to_string(),
                "Second paragraph here.".to_string()
            ]
        );
    }

    #[test]
    fn unbroken_text_falls_back_to_characters() {
        let splitter = TextSplitter::new(4, 1).unwrap();
        let chunks = splitter.split_text("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn multibyte_text_is_counted_in_chars() {
        let splitter = TextSplitter::new(5, 0).unwrap();
        let chunks = splitter.split_text("ãéíõúçãéíõ");
        assert_eq!(chunks, vec!["ãéíõú", "çãéíõ"]);
    }

    #[test]
    fn splitting_is_deterministic() {
        let splitter = TextSplitter::new(300, 30).unwrap();
        let pages = vec![
            PageText {
                page: Some(1),
                text: policy_text(),
            },
            PageText {
                page: Some(2),
                text: "Travel meals are covered.".into(),
            },
        ];
        let first = splitter.split_pages(Path::new("docs/policy.pdf"), &pages);
        let second = splitter.split_pages(Path::new("docs/policy.pdf"), &pages);
        assert_eq!(first, second);
        assert_eq!(first.last().unwrap().source.page, Some(2));
        assert_eq!(first.last().unwrap().index, 0);
    }
}
