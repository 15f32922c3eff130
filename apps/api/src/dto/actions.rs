use serde::Deserialize;

/// Incoming payload for roast and deploy actions.
#[derive(Debug, Deserialize)]
pub struct ActionRequestBody {
    #[serde(default)]
    pub username: String,
}
