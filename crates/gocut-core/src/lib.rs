//! Reachability-based dead-code elimination for Go packages
//!
//! [`pipeline::Cutter`] loads the package around an entry file, computes the
//! set of declarations reachable from it and writes a copy of the entry file
//! holding exactly those declarations.

pub mod ast;
pub mod closure;
pub mod config;
pub mod constraint;
pub mod emit;
pub mod imports;
pub mod loader;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod semantic;
pub mod visitor;

pub use closure::{Closure, ClosureBuilder, DeclRef};
pub use config::{Config, ConfigResult};
pub use constraint::BuildTarget;
pub use loader::{LoadError, Package, load_package, load_package_for};
pub use pipeline::{Analysis, CutError, CutOutcome, Cutter};
pub use report::CutReport;
