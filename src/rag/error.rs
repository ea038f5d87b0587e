//! RAG gateway error taxonomy.

use thiserror::Error;

/// Why a question produced no answer.
///
/// Never leaves the gateway: [`super::RagClient::ask`] converts every
/// variant to `None` after logging. The ledger row ends up `failed` on
/// all variants except `Submission`, where no row exists yet.
#[derive(Debug, Error)]
pub enum RagError {
    /// The create-request call returned no usable request identifier.
    #[error("submission failed: {0}")]
    Submission(String),

    /// A status poll failed at the transport/HTTP level.
    #[error("poll transport failed: {0}")]
    PollTransport(String),

    /// The backend reported the request as failed, or completed it
    /// without an answer text.
    #[error("backend reported failure")]
    RemoteFailed,

    /// No terminal status within the attempt budget.
    #[error("no terminal status after {attempts} poll attempts")]
    Timeout { attempts: u32 },
}
