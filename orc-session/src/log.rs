//! [`SessionLog`] — the append-only, line-delimited JSON record of every
//! turn the engine has ever completed.

use crate::error::SessionError;
use orc_core::{ConversationTurn, Message, SessionId};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;

/// The append-only conversation log: one JSON object per line, one line
/// per completed turn, across every session and every user.
///
/// Appends are serialized through an internal lock so concurrent turns
/// never interleave partial lines; reads take no lock and tolerate a
/// line being appended mid-read since each write is a single buffered
/// `write_all` of a complete, newline-terminated record.
pub struct SessionLog {
    path: PathBuf,
    append_lock: Arc<Mutex<()>>,
}

impl SessionLog {
    /// Open the log at the workspace's fixed conversations path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            append_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Append one completed turn to the log.
    pub async fn save_turn(&self, turn: &ConversationTurn) -> Result<(), SessionError> {
        let mut line = serde_json::to_string(turn).map_err(|e| {
            SessionError::Other(Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
        })?;
        line.push('\n');

        let _guard = self.append_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Every turn ever recorded for `session_id`, in ascending turn order.
    /// Malformed lines are skipped (logged at `warn`), never fatal.
    pub async fn get_turns(&self, session_id: &SessionId) -> Result<Vec<ConversationTurn>, SessionError> {
        let mut turns: Vec<ConversationTurn> = self
            .read_all_turns()
            .await?
            .into_iter()
            .filter(|t| t.session_id == *session_id)
            .collect();
        turns.sort_by_key(|t| t.turn);
        Ok(turns)
    }

    /// Reconstruct the last `limit` turns of `session_id` as an
    /// alternating user/assistant message history, oldest-first, for
    /// context assembly.
    pub async fn get_history(
        &self,
        session_id: &SessionId,
        limit: usize,
    ) -> Result<Vec<Message>, SessionError> {
        let mut turns = self.get_turns(session_id).await?;
        if turns.len() > limit {
            let drop = turns.len() - limit;
            turns.drain(0..drop);
        }

        let mut messages = Vec::with_capacity(turns.len() * 2);
        for turn in &turns {
            messages.push(Message::user(turn.user_message.clone()));
            let mut assistant = Message::assistant(turn.assistant_response.clone());
            if let Some(reasoning) = &turn.assistant_thinking {
                assistant = assistant.with_reasoning(reasoning.clone());
            }
            messages.push(assistant);
        }
        Ok(messages)
    }

    /// Every distinct session id ever recorded for `user_id`, in
    /// first-appearance order.
    pub async fn get_sessions_by_user(&self, user_id: &str) -> Result<Vec<SessionId>, SessionError> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for turn in self.read_all_turns().await? {
            let parts = SessionId::parse(turn.session_id.as_str())?;
            if parts.user_id == user_id && seen.insert(turn.session_id.as_str().to_string()) {
                out.push(turn.session_id.clone());
            }
        }
        Ok(out)
    }

    /// Render every turn of `session_id` as plain `User: ...` /
    /// `AI: ...` text blocks, separated by `---`, for summarization and
    /// archival.
    pub async fn get_session_turns_text(&self, session_id: &SessionId) -> Result<String, SessionError> {
        let turns = self.get_turns(session_id).await?;
        let blocks: Vec<String> = turns
            .iter()
            .map(|t| format!("User: {}\nAI: {}", t.user_message, t.assistant_response))
            .collect();
        Ok(blocks.join("\n---\n"))
    }

    /// Remove every line belonging to `session_id` from the log. Rewrites
    /// the file via a temp-file-then-rename so a reader never observes a
    /// partially-truncated log.
    pub async fn clear_session(&self, session_id: &SessionId) -> Result<(), SessionError> {
        let _guard = self.append_lock.lock().await;
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let mut kept = String::with_capacity(raw.len());
        for line in raw.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ConversationTurn>(line) {
                Ok(turn) if turn.session_id == *session_id => continue,
                _ => {
                    kept.push_str(line);
                    kept.push('\n');
                }
            }
        }

        let tmp_path = self.path.with_extension("jsonl.tmp");
        let mut tmp = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)
            .await?;
        tmp.write_all(kept.as_bytes()).await?;
        tmp.flush().await?;
        drop(tmp);
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }

    async fn read_all_turns(&self) -> Result<Vec<ConversationTurn>, SessionError> {
        let mut raw = String::new();
        let mut file = match tokio::fs::File::open(&self.path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        file.read_to_string(&mut raw).await?;

        let mut turns = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ConversationTurn>(line) {
                Ok(turn) => turns.push(turn),
                Err(e) => {
                    tracing::warn!(line = idx, error = %e, "skipping malformed session log line");
                }
            }
        }
        Ok(turns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orc_core::{DurationMs, TokenUsage, TurnStatus};
    use tempfile::TempDir;

    fn turn(session_id: &SessionId, n: u64, user: &str, assistant: &str) -> ConversationTurn {
        ConversationTurn {
            session_id: session_id.clone(),
            turn: n,
            timestamp: chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
            entry_agent: "leader".into(),
            user_id: Some("alice".into()),
            user_message: user.into(),
            assistant_response: assistant.into(),
            assistant_thinking: None,
            tool_calls: vec![],
            skill_calls: vec![],
            delegation_chain: vec!["leader".into()],
            token_usage: TokenUsage::default(),
            duration_ms: DurationMs::from_millis(5),
            status: TurnStatus::Completed,
        }
    }

    #[tokio::test]
    async fn save_and_read_back_in_order() {
        let tmp = TempDir::new().unwrap();
        let log = SessionLog::new(tmp.path().join("conversations.jsonl"));
        let sid = SessionId::build("alice", "2026-02-27", 0);
        log.save_turn(&turn(&sid, 1, "hi", "hello")).await.unwrap();
        log.save_turn(&turn(&sid, 2, "bye", "goodbye")).await.unwrap();

        let turns = log.get_turns(&sid).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].turn, 1);
        assert_eq!(turns[1].turn, 2);
    }

    #[tokio::test]
    async fn history_alternates_user_assistant_oldest_first() {
        let tmp = TempDir::new().unwrap();
        let log = SessionLog::new(tmp.path().join("conversations.jsonl"));
        let sid = SessionId::build("alice", "2026-02-27", 0);
        for i in 1..=3 {
            log.save_turn(&turn(&sid, i, &format!("q{i}"), &format!("a{i}")))
                .await
                .unwrap();
        }
        let history = log.get_history(&sid, 2).await.unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].text(), "q2");
        assert_eq!(history[1].text(), "a2");
        assert_eq!(history[2].text(), "q3");
        assert_eq!(history[3].text(), "a3");
    }

    #[tokio::test]
    async fn malformed_lines_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("conversations.jsonl");
        let log = SessionLog::new(path.clone());
        let sid = SessionId::build("alice", "2026-02-27", 0);
        log.save_turn(&turn(&sid, 1, "hi", "hello")).await.unwrap();

        let mut file = OpenOptions::new().append(true).open(&path).await.unwrap();
        file.write_all(b"not json at all\n").await.unwrap();
        file.flush().await.unwrap();

        let turns = log.get_turns(&sid).await.unwrap();
        assert_eq!(turns.len(), 1);
    }

    #[tokio::test]
    async fn clear_session_removes_only_matching_lines() {
        let tmp = TempDir::new().unwrap();
        let log = SessionLog::new(tmp.path().join("conversations.jsonl"));
        let sid_a = SessionId::build("alice", "2026-02-27", 0);
        let sid_b = SessionId::build("alice", "2026-02-27", 1);
        log.save_turn(&turn(&sid_a, 1, "hi", "hello")).await.unwrap();
        log.save_turn(&turn(&sid_b, 1, "yo", "hey")).await.unwrap();

        log.clear_session(&sid_a).await.unwrap();

        assert!(log.get_turns(&sid_a).await.unwrap().is_empty());
        assert_eq!(log.get_turns(&sid_b).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sessions_by_user_are_deduped_in_first_seen_order() {
        let tmp = TempDir::new().unwrap();
        let log = SessionLog::new(tmp.path().join("conversations.jsonl"));
        let sid_a = SessionId::build("alice", "2026-02-27", 0);
        let sid_b = SessionId::build("alice", "2026-02-27", 1);
        log.save_turn(&turn(&sid_a, 1, "hi", "hello")).await.unwrap();
        log.save_turn(&turn(&sid_b, 1, "yo", "hey")).await.unwrap();
        log.save_turn(&turn(&sid_a, 2, "again", "again back"))
            .await
            .unwrap();

        let sessions = log.get_sessions_by_user("alice").await.unwrap();
        assert_eq!(sessions, vec![sid_a, sid_b]);
    }
}
