//! Skill files: on-disk `SKILL.md` definitions, loaded and hydrated
//! into a one-shot synthesised agent's system prompt.

use crate::error::RegistryError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Shell directives inside a skill body time out after this long.
const SHELL_TIMEOUT: Duration = Duration::from_secs(30);

/// Frontmatter parsed from a `SKILL.md` file.
#[derive(Debug, Clone, Deserialize)]
struct Frontmatter {
    name: String,
    description: String,
    #[serde(default)]
    allowed_tools: Vec<String>,
}

/// A loaded, not-yet-hydrated skill.
#[derive(Debug, Clone)]
pub struct SkillDef {
    /// The skill's declared name.
    pub name: String,
    /// A short human-readable description, used as the skill proxy
    /// tool's description.
    pub description: String,
    /// Tools the synthesised agent is permitted to use.
    pub allowed_tools: Vec<String>,
    /// The raw body template, before `$ARGUMENTS` substitution and
    /// shell-directive execution.
    pub body: String,
    /// Directory the skill file was loaded from, used to run its shell
    /// directives with the skill's own directory as the working directory.
    pub dir: PathBuf,
}

/// Search `search_dirs` in order for `<dir>/<name>/SKILL.md` and load
/// the first match.
pub async fn load_skill(search_dirs: &[PathBuf], name: &str) -> Result<SkillDef, RegistryError> {
    for dir in search_dirs {
        let skill_dir = dir.join(name);
        let path = skill_dir.join("SKILL.md");
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => return parse_skill_file(&raw, skill_dir, &path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(RegistryError::SkillNotFound(name.to_string()))
}

fn parse_skill_file(raw: &str, dir: PathBuf, path: &Path) -> Result<SkillDef, RegistryError> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut parts = raw.splitn(3, "---");
    // A well-formed file is "" , frontmatter, body (the first "---" starts the file).
    let (frontmatter_src, body) = match (parts.next(), parts.next(), parts.next()) {
        (Some(""), Some(fm), Some(rest)) => (fm, rest),
        _ => {
            return Err(RegistryError::MalformedSkill {
                path: path.display().to_string(),
                reason: "missing `---` frontmatter delimiters".to_string(),
            })
        }
    };

    let frontmatter: Frontmatter =
        serde_yaml::from_str(frontmatter_src).map_err(|source| RegistryError::MalformedSkill {
            path: path.display().to_string(),
            reason: source.to_string(),
        })?;

    Ok(SkillDef {
        name: frontmatter.name,
        description: frontmatter.description,
        allowed_tools: frontmatter.allowed_tools,
        body: body.trim_start_matches('\n').to_string(),
        dir,
    })
}

impl SkillDef {
    /// Replace `$ARGUMENTS` with `args`, then execute every line
    /// starting with `!` as a shell command (in the skill's directory,
    /// 30 s timeout) and substitute its stdout. A failing or timed-out
    /// command substitutes a bracketed error marker rather than
    /// aborting hydration of the rest of the body.
    pub async fn hydrate(&self, args: &str) -> String {
        let substituted = self.body.replace("$ARGUMENTS", args);

        let mut lines = Vec::with_capacity(substituted.lines().count());
        for line in substituted.lines() {
            if let Some(command) = line.strip_prefix('!') {
                lines.push(self.run_shell_line(command.trim()).await);
            } else {
                lines.push(line.to_string());
            }
        }
        lines.join("\n")
    }

    async fn run_shell_line(&self, command: &str) -> String {
        let run = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&self.dir)
            .output();

        match tokio::time::timeout(SHELL_TIMEOUT, run).await {
            Ok(Ok(output)) if output.status.success() => {
                String::from_utf8_lossy(&output.stdout).trim_end().to_string()
            }
            Ok(Ok(output)) => format!(
                "[error: command '{command}' exited with {}]",
                output.status
            ),
            Ok(Err(e)) => format!("[error: command '{command}' failed to run: {e}]"),
            Err(_) => format!("[error: command '{command}' timed out]"),
        }
    }
}
