// Analysis module: source discovery and class extraction

use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::parser::{ClassParser, ClassRecord, ParseFailure, PhpParser};
use glob::Pattern;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Classes found across a source tree
#[derive(Debug, Default, Serialize)]
pub struct Extraction {
    /// Classes in discovery order, then declaration order
    pub classes: Vec<ClassRecord>,
    /// Files that contributed nothing because they failed to read or parse
    pub parse_failures: Vec<ParseFailure>,
    /// Number of source files inspected
    pub files: usize,
}

impl Extraction {
    pub fn method_count(&self) -> usize {
        self.classes.iter().map(|c| c.methods.len()).sum()
    }
}

/// Find every file under `root` with the configured extension.
///
/// A missing root yields an empty list. Unreadable entries are skipped.
pub fn discover_files(root: &Path, config: &SourceConfig) -> Result<Vec<PathBuf>> {
    let excludes = config
        .exclude
        .iter()
        .map(|p| Pattern::new(p))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if !root.exists() {
        warn!("Source directory {} does not exist", root.display());
        return Ok(Vec::new());
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(config.follow_links)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!("Skipping unreadable entry: {}", err);
                None
            }
        })
    {
        // Skip directories
        if entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        let matches_ext = path
            .extension()
            .map_or(false, |ext| ext == config.extension.as_str());
        if !matches_ext {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        if excludes.iter().any(|p| p.matches_path(relative)) {
            debug!("Excluded {}", relative.display());
            continue;
        }

        files.push(path.to_path_buf());
    }

    Ok(files)
}

/// Drives discovery and parsing over a source tree
pub struct Extractor {
    config: SourceConfig,
    parser: Box<dyn ClassParser>,
    progress: bool,
}

impl Extractor {
    /// Create an extractor backed by the PHP parser
    pub fn new(config: SourceConfig) -> Result<Self> {
        Self::with_parser(config, Box::new(PhpParser::new()?))
    }

    /// Create an extractor with a custom parser.
    ///
    /// Fails if the parser does not handle `config.extension`, since discovery
    /// would otherwise hand it files it cannot read.
    pub fn with_parser(config: SourceConfig, parser: Box<dyn ClassParser>) -> Result<Self> {
        let supported = parser.extensions();
        if !supported.contains(&config.extension.as_str()) {
            return Err(Error::config_validation(format!(
                "source.extension `{}` is not supported by the parser (expected one of: {})",
                config.extension,
                supported.join(", ")
            )));
        }

        Ok(Self {
            config,
            parser,
            progress: false,
        })
    }

    /// Show a progress bar while parsing
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Discover and parse every source file under the configured root
    pub fn extract(&mut self) -> Result<Extraction> {
        let root = self.config.root.clone();
        self.extract_dir(&root)
    }

    /// Discover and parse every source file under `root`
    pub fn extract_dir(&mut self, root: &Path) -> Result<Extraction> {
        let files = discover_files(root, &self.config)?;
        let mut extraction = Extraction {
            files: files.len(),
            ..Default::default()
        };

        let progress = if self.progress {
            let pb = ProgressBar::new(files.len() as u64);
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

        for path in &files {
            if let Some(ref pb) = progress {
                pb.set_message(path.file_name().unwrap_or_default().to_string_lossy().to_string());
                pb.inc(1);
            }

            info!("Processing file: {}", path.display());
            match self.extract_file(path) {
                Ok(classes) => extraction.classes.extend(classes),
                Err(Error::Parse { path, message }) => {
                    warn!("Parse error in file {}: {}", path.display(), message);
                    extraction.parse_failures.push(ParseFailure { path, message });
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(pb) = progress {
            pb.finish_with_message("Parsing complete");
        }

        Ok(extraction)
    }

    /// Parse one file. Read and syntax failures are reported as `Error::Parse`.
    pub fn extract_file(&mut self, path: &Path) -> Result<Vec<ClassRecord>> {
        let bytes = std::fs::read(path).map_err(|e| Error::parse(path, e.to_string()))?;
        let source = String::from_utf8_lossy(&bytes);

        let mut classes = Vec::new();
        self.parser
            .for_each_class(&source, &mut |mut class| {
                class.file = path.to_path_buf();
                classes.push(class);
            })
            .map_err(|e| match e {
                Error::Parser(message) => Error::parse(path, message),
                other => Error::parse(path, other.to_string()),
            })?;

        Ok(classes)
    }
}
