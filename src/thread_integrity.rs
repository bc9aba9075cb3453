// ============================================================================
// Thread Integrity
// ============================================================================
//
// Only the sender who opened a thread may continue it. Threads opened
// anonymously can be continued by anyone holding the thread id. An unknown
// thread id places no constraint.
//
// ============================================================================

use uuid::Uuid;

use crate::repository::MessageRepository;
use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadVerdict {
    Allow,
    Deny,
}

#[derive(Clone)]
pub struct ThreadIntegrityVerifier {
    repository: MessageRepository,
}

impl ThreadIntegrityVerifier {
    pub fn new(repository: MessageRepository) -> Self {
        Self { repository }
    }

    /// Root lookup errors are returned to the caller, which decides how to fail
    pub async fn verify(
        &self,
        thread_id: Uuid,
        claimed_sender: Option<Uuid>,
    ) -> Result<ThreadVerdict, StoreError> {
        let root = self.repository.thread_root(thread_id).await?;

        let verdict = match root.and_then(|r| r.sender_id) {
            None => ThreadVerdict::Allow,
            Some(original) if claimed_sender == Some(original) => ThreadVerdict::Allow,
            Some(_) => ThreadVerdict::Deny,
        };
        Ok(verdict)
    }
}
