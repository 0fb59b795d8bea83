//! Tesseract TSV output parsing
//!
//! Columns: `level page_num block_num par_num line_num word_num left top
//! width height conf text`. Rows at level 5 are words.

use super::types::{EngineBox, OcrError, RecognitionResult, RecognizedWord};

const WORD_LEVEL: u32 = 5;
const COLUMNS: usize = 12;

/// Position of a word in the page layout tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineKey {
    page: u32,
    block: u32,
    par: u32,
    line: u32,
}

impl LineKey {
    fn same_paragraph(&self, other: &LineKey) -> bool {
        (self.page, self.block, self.par) == (other.page, other.block, other.par)
    }
}

/// Parse TSV into words plus reconstructed full text
///
/// Words on one line are joined by a space, lines by a newline, and
/// paragraphs by a blank line.
pub fn parse(tsv: &str) -> Result<RecognitionResult, OcrError> {
    let mut result = RecognitionResult::default();
    let mut last_line: Option<LineKey> = None;

    for (index, row) in tsv.lines().enumerate() {
        if row.is_empty() || row.starts_with("level") {
            continue;
        }

        let cols: Vec<&str> = row.splitn(COLUMNS, '\t').collect();
        if cols.len() < COLUMNS - 1 {
            return Err(OcrError::InvalidOutput(format!(
                "row {} has {} columns",
                index + 1,
                cols.len()
            )));
        }

        let level: u32 = number(&cols, 0, index)?;
        if level != WORD_LEVEL {
            continue;
        }

        let text = cols.get(11).map(|t| t.trim()).unwrap_or("");
        if text.is_empty() {
            tracing::debug!(row = index + 1, "Skipping word row with blank text");
            continue;
        }

        let key = LineKey {
            page: number(&cols, 1, index)?,
            block: number(&cols, 2, index)?,
            par: number(&cols, 3, index)?,
            line: number(&cols, 4, index)?,
        };
        let left: u32 = number(&cols, 6, index)?;
        let top: u32 = number(&cols, 7, index)?;
        let width: u32 = number(&cols, 8, index)?;
        let height: u32 = number(&cols, 9, index)?;
        let confidence: f32 = number(&cols, 10, index)?;

        match last_line {
            None => {}
            Some(prev) if prev == key => result.text.push(' '),
            Some(prev) if prev.same_paragraph(&key) => result.text.push('\n'),
            Some(_) => result.text.push_str("\n\n"),
        }
        result.text.push_str(text);
        last_line = Some(key);

        result.words.push(RecognizedWord {
            text: text.to_string(),
            confidence,
            bbox: EngineBox {
                x0: left,
                y0: top,
                x1: left.saturating_add(width),
                y1: top.saturating_add(height),
            },
        });
    }

    if !result.text.is_empty() {
        result.text.push('\n');
    }

    Ok(result)
}

fn number<T: std::str::FromStr>(cols: &[&str], col: usize, row: usize) -> Result<T, OcrError> {
    let raw = cols.get(col).copied().unwrap_or("").trim();
    raw.parse().map_err(|_| {
        OcrError::InvalidOutput(format!("row {} column {}: {:?} is not a number", row + 1, col + 1, raw))
    })
}
