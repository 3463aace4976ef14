use crate::catalog::Step;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Text,
    Image,
}

/// A stored submission. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingRecord {
    pub id: u64,
    pub user_id: Option<u64>,
    pub prompt: Option<String>,
    pub input_type: InputType,
    pub input_image_url: Option<String>,
    pub output_image_url: Option<String>,
    pub steps: Vec<Step>,
    pub created_at: DateTime<Utc>,
}

/// Everything the caller supplies; the store fills in `id` and `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDrawing {
    pub user_id: Option<u64>,
    pub prompt: Option<String>,
    pub input_type: InputType,
    pub input_image_url: Option<String>,
    pub output_image_url: Option<String>,
    pub steps: Vec<Step>,
}

impl NewDrawing {
    pub fn into_record(self, id: u64, created_at: DateTime<Utc>) -> DrawingRecord {
        DrawingRecord {
            id,
            user_id: self.user_id,
            prompt: self.prompt,
            input_type: self.input_type,
            input_image_url: self.input_image_url,
            output_image_url: self.output_image_url,
            steps: self.steps,
            created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDrawingRequest {
    pub prompt: String,
    #[serde(default)]
    pub user_id: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDrawingResponse {
    pub drawing_id: u64,
    pub steps: Vec<Step>,
    pub final_image_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDrawingResponse {
    pub drawing_id: u64,
    pub description: String,
    pub subject: String,
    pub steps: Vec<Step>,
    pub final_image_url: String,
    pub input_image_url: String,
}
