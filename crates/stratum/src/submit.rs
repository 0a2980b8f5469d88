use super::*;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Submit {
    /// Session id from the login reply.
    pub id: String,
    pub job_id: String,
    /// Little-endian nonce bytes, hex encoded.
    pub nonce: String,
    /// Digest, hex encoded.
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algo: Option<String>,
}
