//! End-to-end cut of one entry file
//!
//! Load the compilation unit, compute the closure, render the retained
//! declarations, normalize imports and write the result.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::closure::{Closure, ClosureBuilder};
use crate::config::{Config, ConfigError, ConfigResult, load_config_or_default_with_warnings};
use crate::emit::{EmitError, emit, write_output};
use crate::imports::{ImportError, ImportNormalizer, ImportPool};
use crate::loader::{LoadError, Package, load_package};
use crate::report::CutReport;
use crate::semantic::SemanticModel;

#[derive(Debug, thiserror::Error)]
pub enum CutError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Emit(#[from] EmitError),
    #[error(transparent)]
    Imports(#[from] ImportError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A loaded unit together with its resolution and closure.
pub struct Analysis {
    pub package: Package,
    pub model: SemanticModel,
    pub closure: Closure,
}

#[derive(Debug)]
pub struct CutOutcome {
    pub text: String,
    pub path: PathBuf,
    pub report: CutReport,
}

#[derive(Debug, Default)]
pub struct Cutter {
    config: Config,
    warnings: Vec<String>,
}

impl Cutter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            warnings: Vec::new(),
        }
    }

    /// Config warnings end up in the report of every run.
    pub fn from_config_result(result: ConfigResult) -> Self {
        if let Some(path) = &result.path {
            info!(path = %path.display(), "using config file");
        }
        Self {
            config: result.config,
            warnings: result.warnings,
        }
    }

    /// Uses the `gocut.toml` closest to the entry file, if any.
    pub fn discover(entry: &Path) -> Result<Self, CutError> {
        let start = entry
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let result = load_config_or_default_with_warnings(start)?;
        Ok(Self::from_config_result(result))
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    #[instrument(skip(self), fields(entry = %entry.display()))]
    pub fn analyze(&self, entry: &Path) -> Result<Analysis, CutError> {
        let package = load_package(entry)?;
        let model = package.resolve();
        let closure = ClosureBuilder::new(&package, &model).build();

        info!(
            used = closure.used.len(),
            retained = closure.retained.len(),
            "computed closure"
        );
        Ok(Analysis {
            package,
            model,
            closure,
        })
    }

    /// Cuts `entry` and writes `output_dir/<entry file name>`.
    #[instrument(skip(self), fields(entry = %entry.display(), output = %output_dir.display()))]
    pub fn run(&self, entry: &Path, output_dir: &Path) -> Result<CutOutcome, CutError> {
        let analysis = self.analyze(entry)?;
        let mut report = CutReport::new(entry.to_path_buf(), &analysis.package, &analysis.closure);
        report.warnings.extend(self.warnings.iter().cloned());

        let mut text = emit(
            &analysis.package,
            &analysis.closure.retained,
            &self.config.emit,
        );

        if self.config.imports.normalize {
            let pool = ImportPool::for_retained(
                &analysis.model,
                &analysis.package,
                &analysis.closure.retained,
            );
            debug!(known = pool.len(), "normalizing imports");
            let normalizer = ImportNormalizer::new(pool);
            match normalizer.normalize(&text) {
                Ok(normalized) => {
                    report.imports_added = normalized.added;
                    report.imports_removed = normalized.removed;
                    report.unresolved_qualifiers = normalized.unresolved;
                    text = normalized.text;
                }
                Err(err) if self.config.imports.strict => return Err(err.into()),
                Err(err) => {
                    warn!(error = %err, "leaving imports unnormalized");
                    report.warnings.push(format!("imports not normalized: {err}"));
                }
            }
        }

        let file_name = entry
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "main.go".to_string());
        let path = write_output(output_dir, &file_name, &text)?;
        report.output = Some(path.clone());

        Ok(CutOutcome { text, path, report })
    }
}
