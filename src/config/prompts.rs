//! Prompt templates for cuerag.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// All prompt templates, plus user variables available to each.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub rag: RagPrompts,
    pub query: QueryPrompts,
    /// Prompts for LLM transcript cleanup.
    pub cleanup: CleanupPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for answering from retrieved context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub system: String,
    pub user: String,
    /// Answer returned when retrieval finds nothing.
    pub no_context: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a helpful assistant that answers questions about the user's documents.
Use only the context you are given. If the context does not contain the answer, say so."#
                .to_string(),

            user: r#"Answer the question based ONLY on the following context:
{{context}}
Question: {{question}}
"#
            .to_string(),

            no_context: "I couldn't find any relevant information in the collection for this question."
                .to_string(),
        }
    }
}

/// Prompts for multi-query expansion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryPrompts {
    pub user: String,
}

impl Default for QueryPrompts {
    fn default() -> Self {
        Self {
            user: r#"You are an AI language model assistant. Your task is to generate {{count}}
different versions of the given user question to retrieve relevant documents from
a vector database. By generating multiple perspectives on the user question, your
goal is to help the user overcome some of the limitations of the distance-based
similarity search. Provide these alternative questions separated by newlines.
Original question: {{question}}"#
                .to_string(),
        }
    }
}

/// Prompts for transcript cleanup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupPrompts {
    pub user: String,
}

impl Default for CleanupPrompts {
    fn default() -> Self {
        Self {
            user: r#"<INSTRUCTION>
Following is a TEXT transcription of an online meeting.
The main speaker of the meeting was {{speaker}}.
Your task is to clean the transcript. There might be wrongly transcribed words.
Infer the correct words from the surrounding context.
You must not hallucinate.
Work through the text sentence by sentence.
Generate cleansed output for each sentence and each paragraph.
Keep the original length and all level of detail.
</INSTRUCTION>

<TEXT>
{{text}}
</TEXT>
"#
            .to_string(),
        }
    }
}

impl Prompts {
    /// Build prompts from defaults, overridden per file by `rag.toml`,
    /// `query.toml` and `cleanup.toml` found in `custom_dir`.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts {
            variables: custom_variables.cloned().unwrap_or_default(),
            ..Prompts::default()
        };

        if let Some(dir) = custom_dir {
            let dir = PathBuf::from(shellexpand::tilde(dir).to_string());
            if let Some(rag) = read_override(&dir, "rag.toml")? {
                prompts.rag = rag;
            }
            if let Some(query) = read_override(&dir, "query.toml")? {
                prompts.query = query;
            }
            if let Some(cleanup) = read_override(&dir, "cleanup.toml")? {
                prompts.cleanup = cleanup;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are filled in a single pass over the template, so a
    /// `{{name}}` inside an inserted value is left as written. Unknown
    /// placeholders stay in place.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let Some(re) = placeholder() else {
            return template.to_string();
        };
        re.replace_all(template, |caps: &Captures<'_>| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

fn placeholder() -> Option<&'static Regex> {
    static PLACEHOLDER: OnceLock<Option<Regex>> = OnceLock::new();
    PLACEHOLDER
        .get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").ok())
        .as_ref()
}

fn read_override<T: serde::de::DeserializeOwned>(
    dir: &Path,
    file: &str,
) -> crate::error::Result<Option<T>> {
    let path = dir.join(file);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .map_err(|e| crate::error::CueragError::file_access(&path, e))?;
    Ok(Some(toml::from_str(&content)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.rag.user.contains("{{context}}"));
        assert!(prompts.query.user.contains("{{question}}"));
        assert!(prompts.cleanup.user.contains("{{text}}"));
    }

    #[test]
    fn test_render_fills_every_occurrence() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "why?".to_string());

        let out = Prompts::render("{{question}} / {{question}} / {{missing}}", &vars);
        assert_eq!(out, "why? / why? / {{missing}}");
    }

    #[test]
    fn test_inserted_values_are_not_rendered_again() {
        let mut vars = HashMap::new();
        vars.insert("text".to_string(), "we write {{speaker}} in helm charts".to_string());
        vars.insert("speaker".to_string(), "Kai".to_string());
        vars.insert("question".to_string(), "what is {{text}}?".to_string());

        for _ in 0..20 {
            let out = Prompts::render("{{speaker}}: {{text}} | {{question}}", &vars);
            assert_eq!(out, "Kai: we write {{speaker}} in helm charts | what is {{text}}?");
        }
    }

    #[test]
    fn test_provided_vars_override_custom() {
        let mut custom = HashMap::new();
        custom.insert("speaker".to_string(), "Nobody".to_string());
        custom.insert("team".to_string(), "Platform".to_string());
        let prompts = Prompts::load(None, Some(&custom)).unwrap();

        let mut vars = HashMap::new();
        vars.insert("speaker".to_string(), "Kai Merklein".to_string());

        let out = prompts.render_with_custom("{{speaker}} of {{team}}", &vars);
        assert_eq!(out, "Kai Merklein of Platform");
    }

    #[test]
    fn test_custom_dir_overrides_rag_prompt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("rag.toml"),
            "user = \"Q: {{question}}\\nC: {{context}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.rag.user, "Q: {{question}}\nC: {{context}}");
        // Unspecified fields fall back to defaults.
        assert!(!prompts.rag.system.is_empty());
        assert!(prompts.cleanup.user.contains("<INSTRUCTION>"));
    }
}
