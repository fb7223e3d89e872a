use serde::{Deserialize, Serialize};

use db::models::note::Note;

#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    pub content: String,
}

/// List payload with the caller's quota baked in, so the client can
/// disable its editor without a second round trip.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesPage {
    pub notes: Vec<Note>,
    pub max_number_of_notes: Option<i32>,
    pub is_notes_threshold_reached: bool,
}
