use super::*;

/// Job template as sent by the pool, either inside the login reply or as the
/// params of a `job` notification. Fields are kept as received; validation
/// happens when the miner turns this into a job it can hash.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobParams {
    #[serde(default)]
    pub job_id: String,
    #[serde(default)]
    pub blob: String,
    #[serde(default)]
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algo: Option<String>,
    #[serde(default)]
    pub height: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_hash: Option<String>,
}
