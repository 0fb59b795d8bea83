//! Public response shapes

use serde::{Deserialize, Serialize};

/// Word bounding box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Border {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

/// Recognized word with its box
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub border: Border,
}

/// Successful projection of a recognition result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub extracted_text: String,
    pub words: Vec<Word>,
}

/// Uniform JSON envelope for every response
///
/// Either `extractedText` + `textCoordinates` or `error` is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_coordinates: Option<Vec<Word>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    pub fn success(projection: Projection) -> Self {
        Self {
            success: true,
            extracted_text: Some(projection.extracted_text),
            text_coordinates: Some(projection.words),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            extracted_text: None,
            text_coordinates: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let envelope = ResponseEnvelope::success(Projection {
            extracted_text: "Hi\n".to_string(),
            words: vec![Word {
                text: "Hi".to_string(),
                border: Border { min_x: 1, min_y: 2, max_x: 3, max_y: 4 },
            }],
        });

        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "success": true,
                "extractedText": "Hi\n",
                "textCoordinates": [
                    {"text": "Hi", "border": {"minX": 1, "minY": 2, "maxX": 3, "maxY": 4}}
                ]
            })
        );
    }

    #[test]
    fn test_failure_shape() {
        assert_eq!(
            serde_json::to_value(ResponseEnvelope::failure("nope")).unwrap(),
            json!({"success": false, "error": "nope"})
        );
    }
}
