//! Result projection
//!
//! Maps engine-native output onto the public word shape, one word per
//! engine word and in engine order.

use crate::error::{PipelineError, Result};
use crate::ocr::{EngineBox, RecognitionResult};

use super::response::{Border, Projection, Word};

impl From<EngineBox> for Border {
    fn from(bbox: EngineBox) -> Self {
        Border {
            min_x: bbox.x0,
            min_y: bbox.y0,
            max_x: bbox.x1,
            max_y: bbox.y1,
        }
    }
}

/// Project a recognition result, or fail when it holds no text
pub fn project(result: RecognitionResult) -> Result<Projection> {
    if result.text.trim().is_empty() {
        return Err(PipelineError::NoTextFound);
    }

    let words = result
        .words
        .into_iter()
        .map(|word| Word {
            text: word.text,
            border: word.bbox.into(),
        })
        .collect();

    Ok(Projection {
        extracted_text: result.text,
        words,
    })
}
