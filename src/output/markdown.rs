// Markdown document assembly

use crate::config::{Config, FailurePolicy, ProjectConfig};
use crate::error::Result;
use crate::llm::{build_prompt, CompletionClient, SegmentKind};
use crate::parser::{ClassRecord, MethodRecord};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// Counts for a finished document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyReport {
    pub classes: usize,
    pub methods: usize,
    /// Prompts that failed after all retries
    pub failures: usize,
}

impl AssemblyReport {
    pub fn summary(&self) -> String {
        format!(
            "Documented {} class{} and {} method{} ({} backend failure{})",
            self.classes,
            if self.classes == 1 { "" } else { "es" },
            self.methods,
            if self.methods == 1 { "" } else { "s" },
            self.failures,
            if self.failures == 1 { "" } else { "s" }
        )
    }
}

/// A generated document, not yet written
#[derive(Debug, Clone)]
pub struct Document {
    pub markdown: String,
    pub report: AssemblyReport,
}

/// Settings that shape the document
#[derive(Debug, Clone)]
pub struct DocumentSettings {
    pub project: ProjectConfig,
    pub include_source: bool,
    pub on_failure: FailurePolicy,
}

impl DocumentSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            project: config.project.clone(),
            include_source: config.prompt.include_source,
            on_failure: config.llm.on_failure,
        }
    }
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Turns extracted classes into one Markdown document
pub struct DocumentAssembler<'a> {
    client: &'a CompletionClient,
    settings: DocumentSettings,
    progress: bool,
}

impl<'a> DocumentAssembler<'a> {
    pub fn new(client: &'a CompletionClient, settings: DocumentSettings) -> Self {
        Self {
            client,
            settings,
            progress: false,
        }
    }

    /// Show a progress bar over prompts
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Request documentation for every class and method, in order.
    ///
    /// Fails on the first backend error only under [`FailurePolicy::Abort`].
    pub fn assemble(&self, classes: &[ClassRecord]) -> Result<Document> {
        let mut report = AssemblyReport::default();
        let mut body = String::new();

        let total: usize = classes.iter().map(|c| 1 + c.methods.len()).sum();
        let progress = if self.progress {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        for class in classes {
            info!("Generating documentation for class: {}", class.name);
            if let Some(ref pb) = progress {
                pb.set_message(class.name.clone());
            }

            let code = class_skeleton(class, &self.settings.project.namespace);
            let prompt = build_prompt(&code, SegmentKind::Class, &class.name);
            let text = self.request(&prompt, &mut report)?;
            body.push_str(&format!("## Class `{}`\n\n{}\n\n", class.name, text));
            report.classes += 1;
            if let Some(ref pb) = progress {
                pb.inc(1);
            }

            for method in &class.methods {
                info!("Generating documentation for method: {}()", method.name);

                let code = if self.settings.include_source {
                    method_source(method)
                } else {
                    method_skeleton(method)
                };
                let prompt = build_prompt(&code, SegmentKind::Method, &method.name);
                let text = self.request(&prompt, &mut report)?;
                body.push_str(&format!("### Method `{}()`\n\n{}\n\n", method.name, text));
                report.methods += 1;
                if let Some(ref pb) = progress {
                    pb.inc(1);
                }
            }
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        let mut markdown = introduction(&self.settings.project);
        markdown.push_str("\n\n");
        markdown.push_str(&table_of_contents(&self.settings.project));
        markdown.push_str(&body);

        Ok(Document { markdown, report })
    }

    fn request(&self, prompt: &str, report: &mut AssemblyReport) -> Result<String> {
        match self.client.complete(prompt) {
            Ok(text) => Ok(text),
            Err(err) => match self.settings.on_failure {
                FailurePolicy::Abort => Err(err.into()),
                FailurePolicy::Placeholder => {
                    warn!("Documentation request failed: {}", err);
                    report.failures += 1;
                    Ok(format!("_Documentation could not be generated: {}_", err))
                }
            },
        }
    }
}

/// Class doc-comment over an empty body. Method bodies are left out.
pub fn class_skeleton(class: &ClassRecord, default_namespace: &str) -> String {
    let namespace = class.namespace.as_deref().unwrap_or(default_namespace);
    format!(
        "<?php\nnamespace {};\n\n{}\nclass {} {{\n // ... \n}}",
        namespace, class.doc_comment, class.name
    )
}

/// Method doc-comment over an empty body
pub fn method_skeleton(method: &MethodRecord) -> String {
    format!(
        "<?php\n{}\npublic function {}() {{\n // ... \n}}",
        method.doc_comment, method.name
    )
}

/// Method doc-comment followed by the real source lines
pub fn method_source(method: &MethodRecord) -> String {
    format!("<?php\n{}\n{}", method.doc_comment, method.body.trim_end())
}

/// Static introduction and installation block
pub fn introduction(project: &ProjectConfig) -> String {
    format!(
        "## Introduction\n\n\
        Welcome to the `{name}` documentation. {description}\n\n\
        ## Installation\n\n\
        To install the `{name}` Composer package, follow these steps:\n\n\
        1. **Require the Package via Composer:**\n\n   \
        Open your terminal, navigate to your project's root directory, and run the following command:\n\n   \
        ```bash\n   \
        composer require {package}\n   \
        ```",
        name = project.name,
        description = project.description,
        package = project.package,
    )
}

/// Document title and table-of-contents stub
pub fn table_of_contents(project: &ProjectConfig) -> String {
    format!(
        "# {} Documentation\n\n\
        ## Table of Contents\n\n\
        - [Introduction](#introduction)\n\
        - [Installation](#installation)\n\
        - [Usage](#usage)\n\
        - [API Reference](#api-reference)\n\n",
        project.name
    )
}

/// Write the document in one go, replacing any previous file
pub fn write_document(path: &Path, markdown: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, markdown)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::llm::{CompletionBackend, EchoBackend, RetryPolicy};
    use tempfile::TempDir;

    struct Failing;

    impl CompletionBackend for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn complete(&self, _prompt: &str) -> std::result::Result<String, BackendError> {
            Err(BackendError::EmptyResponse)
        }
    }

    fn echo_client() -> CompletionClient {
        CompletionClient::new(Box::new(EchoBackend), RetryPolicy::none())
    }

    fn sample_classes() -> Vec<ClassRecord> {
        let mut foo = ClassRecord::new("Foo", 3);
        foo.doc_comment = "/** Foo class */".to_string();
        let mut bar = MethodRecord::new("bar", 5);
        bar.doc_comment = "/** does bar */".to_string();
        bar.body = "    public function bar() {\n        return 1;\n    }\n".to_string();
        foo.methods.push(bar);
        foo.methods.push(MethodRecord::new("baz", 9));

        let mut qux = ClassRecord::new("Qux", 1);
        qux.namespace = Some("App\\Util".to_string());

        vec![foo, qux]
    }

    #[test]
    fn test_class_skeleton() {
        let classes = sample_classes();
        assert_eq!(
            class_skeleton(&classes[0], "YourPackage"),
            "<?php\nnamespace YourPackage;\n\n/** Foo class */\nclass Foo {\n // ... \n}"
        );
        assert!(class_skeleton(&classes[1], "YourPackage").contains("namespace App\\Util;"));
    }

    #[test]
    fn test_method_skeleton_omits_body() {
        let classes = sample_classes();
        let skeleton = method_skeleton(&classes[0].methods[0]);
        assert_eq!(
            skeleton,
            "<?php\n/** does bar */\npublic function bar() {\n // ... \n}"
        );
        assert!(!skeleton.contains("return 1"));
    }

    #[test]
    fn test_method_source_includes_body() {
        let classes = sample_classes();
        let code = method_source(&classes[0].methods[0]);
        assert!(code.contains("return 1;"));
        assert!(code.starts_with("<?php\n/** does bar */\n"));
    }

    #[test]
    fn test_assemble_headings_in_order() {
        let client = echo_client();
        let assembler = DocumentAssembler::new(&client, DocumentSettings::default());
        let doc = assembler.assemble(&sample_classes()).unwrap();

        let md = &doc.markdown;
        assert_eq!(md.matches("## Class `").count(), 2);
        assert_eq!(md.matches("### Method `").count(), 2);

        let foo = md.find("## Class `Foo`").unwrap();
        let bar = md.find("### Method `bar()`").unwrap();
        let baz = md.find("### Method `baz()`").unwrap();
        let qux = md.find("## Class `Qux`").unwrap();
        assert!(foo < bar && bar < baz && baz < qux);

        assert_eq!(
            doc.report,
            AssemblyReport {
                classes: 2,
                methods: 2,
                failures: 0
            }
        );
    }

    #[test]
    fn test_assemble_echo_text_follows_heading() {
        let client = echo_client();
        let assembler = DocumentAssembler::new(&client, DocumentSettings::default());
        let doc = assembler.assemble(&sample_classes()).unwrap();

        assert!(doc.markdown.contains(
            "## Class `Foo`\n\nGenerate detailed documentation for the following PHP class named `Foo`"
        ));
        assert!(doc.markdown.contains(
            "### Method `bar()`\n\nGenerate detailed documentation for the following PHP method named `bar`"
        ));
    }

    #[test]
    fn test_assemble_empty_is_boilerplate_only() {
        let client = echo_client();
        let settings = DocumentSettings::default();
        let expected = format!(
            "{}\n\n{}",
            introduction(&settings.project),
            table_of_contents(&settings.project)
        );

        let doc = DocumentAssembler::new(&client, settings).assemble(&[]).unwrap();
        assert_eq!(doc.markdown, expected);
        assert!(!doc.markdown.contains("## Class"));
        assert_eq!(doc.report, AssemblyReport::default());
    }

    #[test]
    fn test_include_source_embeds_body() {
        let client = echo_client();
        let settings = DocumentSettings {
            include_source: true,
            ..Default::default()
        };
        let doc = DocumentAssembler::new(&client, settings)
            .assemble(&sample_classes())
            .unwrap();
        assert!(doc.markdown.contains("return 1;"));
    }

    #[test]
    fn test_placeholder_on_failure() {
        let client = CompletionClient::new(Box::new(Failing), RetryPolicy::none());
        let doc = DocumentAssembler::new(&client, DocumentSettings::default())
            .assemble(&sample_classes())
            .unwrap();

        assert_eq!(doc.report.failures, 4);
        assert!(doc
            .markdown
            .contains("## Class `Foo`\n\n_Documentation could not be generated: empty response_"));
    }

    #[test]
    fn test_abort_on_failure() {
        let client = CompletionClient::new(Box::new(Failing), RetryPolicy::none());
        let settings = DocumentSettings {
            on_failure: FailurePolicy::Abort,
            ..Default::default()
        };
        let result = DocumentAssembler::new(&client, settings).assemble(&sample_classes());
        assert!(matches!(result, Err(crate::error::Error::Backend(_))));
    }

    #[test]
    fn test_introduction_uses_project() {
        let project = ProjectConfig {
            name: "Acme".to_string(),
            package: "acme/toolkit".to_string(),
            ..Default::default()
        };
        let intro = introduction(&project);
        assert!(intro.starts_with("## Introduction\n\nWelcome to the `Acme` documentation."));
        assert!(intro.contains("composer require acme/toolkit"));
        // install fence is closed
        assert_eq!(intro.matches("```").count(), 2);
    }

    #[test]
    fn test_report_summary() {
        let report = AssemblyReport {
            classes: 1,
            methods: 3,
            failures: 0,
        };
        assert_eq!(
            report.summary(),
            "Documented 1 class and 3 methods (0 backend failures)"
        );
    }

    #[test]
    fn test_write_document_creates_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docs").join("API.md");
        write_document(&path, "# one").unwrap();
        write_document(&path, "# two").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# two");
    }
}
