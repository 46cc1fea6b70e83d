use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectConfig,
    pub source: SourceConfig,
    pub output: OutputConfig,
    pub llm: LlmConfig,
    pub prompt: PromptConfig,
}

/// Project metadata used in the introduction block
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub name: String,
    pub package: String,
    pub description: String,
    /// Namespace used in class skeletons when the class declares none
    pub namespace: String,
}

/// Source discovery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub root: PathBuf,
    pub extension: String,
    pub exclude: Vec<String>,
    pub follow_links: bool,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
}

/// Completion backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub command: String,
    /// Arguments placed before the prompt; `{model}` is substituted
    pub args: Vec<String>,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub retries: u32,
    pub retry_delay_ms: u64,
    pub max_tokens: u32,
    pub on_failure: FailurePolicy,
}

/// Prompt settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Embed real method bodies instead of empty skeletons
    pub include_source: bool,
}

/// Completion backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// External CLI process, `ollama run <model> <prompt>` by default
    #[default]
    Command,
    Ollama,
    OpenAI,
    /// Returns the prompt unchanged
    Echo,
}

/// What to do when a prompt still fails after all retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    #[default]
    Placeholder,
    Abort,
}

impl LlmProvider {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "command" | "cli" => Some(Self::Command),
            "ollama" => Some(Self::Ollama),
            "openai" => Some(Self::OpenAI),
            "echo" => Some(Self::Echo),
            _ => None,
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "YourPackage".to_string(),
            package: "yourvendor/yourpackage".to_string(),
            description: "This package provides essential tools and utilities to enhance your Laravel applications.".to_string(),
            namespace: "YourPackage".to_string(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("src"),
            extension: "php".to_string(),
            exclude: vec![],
            follow_links: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("DOCUMENTATION.md"),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: "phi4:latest".to_string(),
            command: "ollama".to_string(),
            args: vec!["run".to_string(), "{model}".to_string()],
            api_url: None,
            api_key: None,
            timeout_secs: 300,
            retries: 1,
            retry_delay_ms: 1000,
            max_tokens: 1024,
            on_failure: FailurePolicy::default(),
        }
    }
}

/// CLI overrides, applied on top of the file config
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub root: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub exclude: Vec<String>,
    pub include_source: bool,
    pub fail_fast: bool,
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }


    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(&mut self, cli: CliOverrides) -> Result<()> {
        if let Some(root) = cli.root {
            self.source.root = root;
        }

        if let Some(out) = cli.output {
            self.output.path = out;
        }

        if let Some(name) = cli.provider {
            self.llm.provider = LlmProvider::parse(&name)
                .ok_or_else(|| Error::config_validation(format!("unknown provider: {}", name)))?;
        }

        if let Some(model) = cli.model {
            self.llm.model = model;
        }

        if !cli.exclude.is_empty() {
            self.source.exclude.extend(cli.exclude);
        }

        if cli.include_source {
            self.prompt.include_source = true;
        }

        if cli.fail_fast {
            self.llm.on_failure = FailurePolicy::Abort;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.source.extension.trim().is_empty() {
            return Err(Error::config_validation("source extension must not be empty"));
        }

        if self.llm.model.trim().is_empty() {
            return Err(Error::config_validation("llm model must not be empty"));
        }

        if self.llm.provider == LlmProvider::Command && self.llm.command.trim().is_empty() {
            return Err(Error::config_validation(
                "llm command must not be empty for the command provider",
            ));
        }

        if self.llm.timeout_secs == 0 {
            return Err(Error::config_validation("llm timeout_secs must be at least 1"));
        }

        if self.llm.retries > 10 {
            return Err(Error::config_validation("llm retries cannot exceed 10"));
        }

        for pattern in &self.source.exclude {
            glob::Pattern::new(pattern)?;
        }

        Ok(())
    }
}
