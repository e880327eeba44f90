//! Built-in tool primitives sandboxed to a [`Workspace`](orc_workspace::Workspace):
//! `bash`, `read_file`, `write_file`, `grep`, `glob`, `web_fetch`.

use crate::approval::WriteApprover;
use crate::{ToolDyn, ToolError};
use orc_workspace::Workspace;
use regex::Regex;
use serde_json::{json, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Default wall-clock budget for a `bash` invocation.
const BASH_TIMEOUT: Duration = Duration::from_secs(120);
/// Default wall-clock budget for a `web_fetch` invocation, per the
/// concurrency model's default.
const WEB_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
/// Cap on how much of a `web_fetch` response body is returned.
const WEB_FETCH_MAX_BODY: usize = 200_000;

fn arg_str<'a>(input: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    input
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidInput(format!("missing string field '{key}'")))
}

/// Executes a shell command with the workspace root as its working
/// directory.
pub struct BashTool {
    workspace: Arc<Workspace>,
}

impl BashTool {
    /// Build the tool over a sandboxed workspace.
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }
}

impl ToolDyn for BashTool {
    fn name(&self) -> &str {
        "bash"
    }

    fn description(&self) -> &str {
        "Run a shell command in the workspace directory and return its stdout, stderr, and exit code."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "command": { "type": "string" } },
            "required": ["command"]
        })
    }

    fn call(
        &self,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let command = arg_str(&input, "command")?.to_string();
            let root = self.workspace.root().to_path_buf();

            let run = tokio::process::Command::new("sh")
                .arg("-c")
                .arg(&command)
                .current_dir(&root)
                .output();

            match tokio::time::timeout(BASH_TIMEOUT, run).await {
                Ok(Ok(output)) => Ok(json!({
                    "stdout": String::from_utf8_lossy(&output.stdout),
                    "stderr": String::from_utf8_lossy(&output.stderr),
                    "exit_code": output.status.code(),
                })),
                Ok(Err(e)) => Err(ToolError::ExecutionFailed(format!("failed to spawn command: {e}"))),
                Err(_) => Err(ToolError::ExecutionFailed(format!(
                    "command timed out after {:.0}s",
                    BASH_TIMEOUT.as_secs_f64()
                ))),
            }
        })
    }
}

/// Reads a sandboxed file's contents as UTF-8 (lossily).
pub struct ReadFileTool {
    workspace: Arc<Workspace>,
}

impl ReadFileTool {
    /// Build the tool over a sandboxed workspace.
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }
}

impl ToolDyn for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file within the workspace."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "path": { "type": "string" } },
            "required": ["path"]
        })
    }

    fn call(
        &self,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let path = arg_str(&input, "path")?;
            let resolved = self
                .workspace
                .resolve(path)
                .map_err(|e| ToolError::PermissionDenied(e.to_string()))?;
            let bytes = tokio::fs::read(&resolved)
                .await
                .map_err(|e| ToolError::ExecutionFailed(format!("failed to read '{path}': {e}")))?;
            Ok(json!({ "content": String::from_utf8_lossy(&bytes) }))
        })
    }
}

/// Writes a sandboxed file's contents, gated behind [`WriteApprover`].
pub struct WriteFileTool {
    workspace: Arc<Workspace>,
    approver: Arc<dyn WriteApprover>,
}

impl WriteFileTool {
    /// Build the tool over a sandboxed workspace and approval gate.
    pub fn new(workspace: Arc<Workspace>, approver: Arc<dyn WriteApprover>) -> Self {
        Self { workspace, approver }
    }
}

impl ToolDyn for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file within the workspace. Requires write-action approval."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string" },
                "content": { "type": "string" }
            },
            "required": ["path", "content"]
        })
    }

    fn call(
        &self,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let path = arg_str(&input, "path")?;
            let content = arg_str(&input, "content")?;

            let preview: String = content.chars().take(500).collect();
            if !self.approver.approve(path, &preview).await {
                return Err(ToolError::PermissionDenied(format!(
                    "write to '{path}' was not approved"
                )));
            }

            let resolved = self
                .workspace
                .resolve(path)
                .map_err(|e| ToolError::PermissionDenied(e.to_string()))?;
            if let Some(parent) = resolved.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&resolved, content.as_bytes())
                .await
                .map_err(|e| ToolError::ExecutionFailed(format!("failed to write '{path}': {e}")))?;
            Ok(json!({ "written": true, "path": path, "bytes": content.len() }))
        })
    }
}

/// Searches file contents within the workspace for a regular expression.
pub struct GrepTool {
    workspace: Arc<Workspace>,
}

impl GrepTool {
    /// Build the tool over a sandboxed workspace.
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }
}

impl ToolDyn for GrepTool {
    fn name(&self) -> &str {
        "grep"
    }

    fn description(&self) -> &str {
        "Search file contents under a workspace path for a regular expression pattern."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": { "type": "string" },
                "path": { "type": "string" },
                "max_results": { "type": "integer" }
            },
            "required": ["pattern"]
        })
    }

    fn call(
        &self,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let pattern = arg_str(&input, "pattern")?.to_string();
            let path = input.get("path").and_then(Value::as_str).unwrap_or(".").to_string();
            let max_results = input
                .get("max_results")
                .and_then(Value::as_u64)
                .unwrap_or(200) as usize;

            let root = self
                .workspace
                .resolve(&path)
                .map_err(|e| ToolError::PermissionDenied(e.to_string()))?;
            let workspace_root = self.workspace.root().to_path_buf();

            let matches = tokio::task::spawn_blocking(move || -> Result<Vec<Value>, ToolError> {
                let regex = Regex::new(&pattern)
                    .map_err(|e| ToolError::InvalidInput(format!("invalid pattern: {e}")))?;
                let mut matches = Vec::new();
                walk_files(&root, &mut |file| {
                    if matches.len() >= max_results {
                        return;
                    }
                    let Ok(text) = std::fs::read_to_string(file) else { return };
                    for (idx, line) in text.lines().enumerate() {
                        if matches.len() >= max_results {
                            break;
                        }
                        if regex.is_match(line) {
                            matches.push(json!({
                                "file": file.strip_prefix(&workspace_root).unwrap_or(file).display().to_string(),
                                "line_number": idx + 1,
                                "line": line,
                            }));
                        }
                    }
                });
                Ok(matches)
            })
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))??;

            Ok(json!({ "matches": matches }))
        })
    }
}

/// Matches workspace-relative file paths against a glob pattern
/// (`*`, `?`, `**` supported).
pub struct GlobTool {
    workspace: Arc<Workspace>,
}

impl GlobTool {
    /// Build the tool over a sandboxed workspace.
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }
}

impl ToolDyn for GlobTool {
    fn name(&self) -> &str {
        "glob"
    }

    fn description(&self) -> &str {
        "List workspace-relative file paths matching a glob pattern."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": { "type": "string" },
                "path": { "type": "string" }
            },
            "required": ["pattern"]
        })
    }

    fn call(
        &self,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let pattern = arg_str(&input, "pattern")?.to_string();
            let path = input.get("path").and_then(Value::as_str).unwrap_or(".").to_string();

            let root = self
                .workspace
                .resolve(&path)
                .map_err(|e| ToolError::PermissionDenied(e.to_string()))?;
            let workspace_root = self.workspace.root().to_path_buf();

            let matches = tokio::task::spawn_blocking(move || -> Result<Vec<String>, ToolError> {
                let regex = glob_to_regex(&pattern)
                    .map_err(|e| ToolError::InvalidInput(format!("invalid glob pattern: {e}")))?;
                let mut matches = Vec::new();
                walk_files(&root, &mut |file| {
                    let rel = file.strip_prefix(&workspace_root).unwrap_or(file);
                    let rel_str = rel.display().to_string();
                    if regex.is_match(&rel_str) {
                        matches.push(rel_str);
                    }
                });
                matches.sort();
                Ok(matches)
            })
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))??;

            Ok(json!({ "matches": matches }))
        })
    }
}

/// Fetches a URL over HTTP(S).
pub struct WebFetchTool {
    client: reqwest::Client,
}

impl WebFetchTool {
    /// Build the tool with a fresh HTTP client.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(WEB_FETCH_TIMEOUT)
                .build()
                .expect("reqwest client builds with default TLS config"),
        }
    }
}

impl Default for WebFetchTool {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolDyn for WebFetchTool {
    fn name(&self) -> &str {
        "web_fetch"
    }

    fn description(&self) -> &str {
        "Fetch a URL over HTTP(S) and return its status and body, truncated to a safe size."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "url": { "type": "string" } },
            "required": ["url"]
        })
    }

    fn call(
        &self,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let url = arg_str(&input, "url")?;
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| ToolError::ExecutionFailed(format!("request failed: {e}")))?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| ToolError::ExecutionFailed(format!("failed to read body: {e}")))?;
            let truncated = body.len() > WEB_FETCH_MAX_BODY;
            let body: String = body.chars().take(WEB_FETCH_MAX_BODY).collect();
            Ok(json!({ "status": status, "body": body, "truncated": truncated }))
        })
    }
}

/// Recursively visit every regular file under `root`, skipping
/// unreadable directories rather than failing the whole walk.
fn walk_files(root: &std::path::Path, visit: &mut dyn FnMut(&std::path::Path)) {
    let Ok(entries) = std::fs::read_dir(root) else { return };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk_files(&path, visit);
        } else if path.is_file() {
            visit(&path);
        }
    }
}

/// Translate a limited glob syntax (`*`, `?`, `**`) into an anchored regex.
fn glob_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut out = String::from("(?s)^");
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    out.push_str(".*");
                } else {
                    out.push_str("[^/]*");
                }
            }
            '?' => out.push_str("[^/]"),
            '.' | '+' | '(' | ')' | '|' | '^' | '$' | '[' | ']' | '{' | '}' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            other => out.push(other),
        }
    }
    out.push('$');
    Regex::new(&out)
}
