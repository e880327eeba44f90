//! Errors produced by the registry and skill loader.

/// Errors resolving agents, checking delegation permission, or loading
/// skills.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No agent matched the requested name under any resolution rule.
    #[error("no agent found matching '{0}'")]
    NotFound(String),

    /// The caller is not permitted to delegate to the target.
    #[error("delegation from '{caller}' to '{target}' is not permitted: {reason}")]
    PermissionDenied {
        /// The delegating agent's node id.
        caller: String,
        /// The attempted target's node id.
        target: String,
        /// Why the delegation was refused.
        reason: String,
    },

    /// A skill file could not be found in any search directory.
    #[error("skill '{0}' not found")]
    SkillNotFound(String),

    /// A skill file's frontmatter failed to parse or was missing its
    /// `---` delimiters.
    #[error("malformed skill frontmatter in '{path}': {reason}")]
    MalformedSkill {
        /// The skill file's path.
        path: String,
        /// What was wrong with it.
        reason: String,
    },

    /// An I/O error reading a skill file or executing its shell directives.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors outside the above categories.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl From<RegistryError> for orc_core::OrchError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(name) => {
                orc_core::OrchError::PermissionDenied(orc_core::RegistryError::NotFound(name))
            }
            RegistryError::PermissionDenied { caller, target, reason } => {
                orc_core::OrchError::PermissionDenied(orc_core::RegistryError::PermissionDenied(
                    format!("{caller} -> {target}: {reason}"),
                ))
            }
            other => orc_core::OrchError::PermissionDenied(orc_core::RegistryError::Other(
                Box::new(other),
            )),
        }
    }
}
