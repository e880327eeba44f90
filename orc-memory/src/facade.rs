//! [`Memory`] — the bundled artifact/semantic/session handle for one
//! agent group.

use crate::error::MemoryError;
use orc_artifacts::ArtifactStore;
use orc_core::SessionId;
use orc_semantic::SemanticStore;
use orc_session::{SessionLog, SessionManager};
use orc_workspace::Workspace;
use std::sync::Arc;

/// Bundles a group's view of the artifact store, its (optional)
/// semantic store, and the workspace-wide session log/manager.
///
/// One [`Memory`] is built per agent group: artifacts and the session
/// log are workspace-wide (group is carried per-row/per-turn), while
/// the semantic store is genuinely per-group — its vector collection
/// lives under `semantic_root(group)` and is constructed by the
/// embedder, not by this crate (§1: the vector index is out of scope
/// here).
pub struct Memory {
    group: String,
    artifacts: Arc<ArtifactStore>,
    semantic: Option<Arc<SemanticStore>>,
    session_log: Arc<SessionLog>,
    session_manager: Arc<SessionManager>,
}

impl Memory {
    /// Open the artifact store and session log rooted at `workspace`,
    /// bundling them with an already-constructed `semantic` store (or
    /// `None` if the embedder declined to wire one up) for `group`.
    pub async fn open(
        workspace: &Workspace,
        group: impl Into<String>,
        semantic: Option<Arc<SemanticStore>>,
    ) -> Result<Self, MemoryError> {
        let artifacts = Arc::new(ArtifactStore::open(workspace).await?);
        let session_log = Arc::new(SessionLog::new(workspace.conversations_log_path()));
        let session_manager = Arc::new(SessionManager::new(Arc::clone(&session_log)));
        Ok(Self { group: group.into(), artifacts, semantic, session_log, session_manager })
    }

    /// Build directly from already-constructed parts, e.g. when a
    /// caller shares one [`ArtifactStore`]/[`SessionLog`] across several
    /// groups' façades.
    pub fn new(
        group: impl Into<String>,
        artifacts: Arc<ArtifactStore>,
        semantic: Option<Arc<SemanticStore>>,
        session_log: Arc<SessionLog>,
        session_manager: Arc<SessionManager>,
    ) -> Self {
        Self { group: group.into(), artifacts, semantic, session_log, session_manager }
    }

    /// The group this façade is scoped to.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// The shared artifact store.
    pub fn artifacts(&self) -> &Arc<ArtifactStore> {
        &self.artifacts
    }

    /// This group's semantic store, if the embedder wired one up.
    pub fn semantic(&self) -> Option<&Arc<SemanticStore>> {
        self.semantic.as_ref()
    }

    /// The shared append-only session log.
    pub fn session_log(&self) -> &Arc<SessionLog> {
        &self.session_log
    }

    /// The session identity/rollover manager over [`Self::session_log`].
    pub fn session_manager(&self) -> &Arc<SessionManager> {
        &self.session_manager
    }

    /// Archive `session_id` into this group's semantic store, if one is
    /// configured. A façade with no semantic store silently skips
    /// archival — there is nowhere to put the summary.
    pub async fn archive_session(&self, session_id: &SessionId, user_id: &str) -> Result<(), MemoryError> {
        let Some(semantic) = &self.semantic else {
            tracing::warn!(
                group = %self.group,
                session_id = %session_id.as_str(),
                "skipping session archival: no semantic store configured for this group"
            );
            return Ok(());
        };
        self.session_manager.archive_session(session_id, user_id, semantic).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn open_builds_artifact_store_and_session_log() {
        let tmp = TempDir::new().unwrap();
        let workspace = Workspace::new(tmp.path()).unwrap();
        let memory = Memory::open(&workspace, "group-a", None).await.unwrap();
        assert_eq!(memory.group(), "group-a");
        assert!(memory.semantic().is_none());

        let id = memory
            .artifacts()
            .save(b"hi".to_vec(), "note".to_string(), "agent-a".to_string(), "group-a".to_string(), vec![], None)
            .await
            .unwrap();
        let fetched = memory.artifacts().get(id).await.unwrap();
        assert!(fetched.is_some());
    }

    #[tokio::test]
    async fn archive_session_without_semantic_store_is_a_noop() {
        let tmp = TempDir::new().unwrap();
        let workspace = Workspace::new(tmp.path()).unwrap();
        let memory = Memory::open(&workspace, "group-a", None).await.unwrap();
        let session_id = SessionId::build("alice", "2026-02-27", 0);
        memory.archive_session(&session_id, "alice").await.unwrap();
    }
}
