use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Literal token each template must contain; it is replaced with the active
/// log context before the template is sent as a user instruction.
pub const CONTEXT_PLACEHOLDER: &str = "[LOG_CONTEXT]";

/// The five templates the analysis pipeline depends on, by file stem.
pub const REQUIRED_TEMPLATES: [&str; 5] = [
    "pre_summary",
    "summary",
    "root_cause",
    "impact_scope",
    "actions",
];

/// Named prompt templates loaded once per invocation.
///
/// A missing template file is a configuration error surfaced at load time,
/// before any completion call is made.
#[derive(Debug)]
pub struct PromptStore {
    templates: HashMap<String, String>,
}

impl PromptStore {
    pub fn load(dir: &Path) -> Result<Self> {
        let mut templates = HashMap::new();
        for name in REQUIRED_TEMPLATES {
            let path = dir.join(format!("{}.txt", name));
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Prompt template not found at {}", path.display()))?;
            debug!("Loaded prompt template '{}' ({} bytes)", name, content.len());
            templates.insert(name.to_string(), content);
        }
        Ok(Self { templates })
    }

    pub fn from_templates(templates: HashMap<String, String>) -> Self {
        Self { templates }
    }

    /// Substitute the active context into the named template.
    pub fn render(&self, name: &str, context: &str) -> Result<String> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| anyhow!("Unknown prompt template: {}", name))?;
        Ok(template.replace(CONTEXT_PLACEHOLDER, context))
    }
}
