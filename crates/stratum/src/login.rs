use super::*;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Login {
    pub login: String,
    pub pass: String,
    pub agent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rigid: Option<String>,
}

/// Result of a successful login: the session id used in every later request,
/// the first job, and the extensions the pool supports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResult {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<JobParams>,
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl LoginResult {
    /// Extensions the client understands; unknown names are skipped.
    pub fn known_extensions(&self) -> impl Iterator<Item = Extension> + '_ {
        self.extensions
            .iter()
            .filter_map(|name| name.parse::<Extension>().ok())
    }
}
