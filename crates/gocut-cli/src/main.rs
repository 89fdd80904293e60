//! gocut - cut a Go source file down to the declarations it reaches
//!
//! Loads the package around the entry file, computes the reachability
//! closure of the file's declarations and writes the minimal file.

mod cli;
mod logging;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use gocut_core::config::load_config_with_warnings;
use gocut_core::pipeline::Cutter;
use tracing::error;

use cli::{Cli, OutputFormat};

fn main() -> Result<()> {
    let cli = Cli::parse_from(cli::normalize_args(std::env::args()));
    configure_colors(&cli);
    let _guard = logging::init_logging(&cli);

    run(&cli).inspect_err(|err| error!(error = %err, "cut failed"))
}

fn configure_colors(cli: &Cli) {
    let no_color_env = std::env::var("NO_COLOR").is_ok();
    if cli.no_color || no_color_env {
        colored::control::set_override(false);
    }
}

fn cutter_for(cli: &Cli) -> Result<Cutter> {
    let mut cutter = match &cli.config {
        Some(path) => {
            let result = load_config_with_warnings(path)?;
            Cutter::from_config_result(result)
        }
        None => Cutter::discover(&cli.input)?,
    };

    let config = cutter.config_mut();
    if cli.no_normalize {
        config.imports.normalize = false;
    }
    if cli.strict_imports {
        config.imports.strict = true;
    }
    if let Some(output) = &cli.output {
        config.output = output.clone();
    }
    Ok(cutter)
}

fn run(cli: &Cli) -> Result<()> {
    let cutter = cutter_for(cli)?;
    let output_dir = cutter.config().output.clone();

    let outcome = cutter
        .run(&cli.input, &output_dir)
        .with_context(|| format!("cutting {}", cli.input.display()))?;

    match cli.format {
        OutputFormat::Text => print!("{}", output::render_text(&outcome.report)),
        OutputFormat::Json => println!("{}", outcome.report.to_json()?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::fs;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(cli::normalize_args(args.iter().map(|a| a.to_string()))).unwrap()
    }

    #[test]
    fn cli_version_is_set() {
        let cmd = Cli::command();
        assert_eq!(cmd.get_version(), Some("0.1.0"));
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("custom.toml");
        fs::write(&config, "output = \"from-config\"\n\n[imports]\nnormalize = true\n").unwrap();
        let config_arg = config.to_string_lossy().into_owned();

        let cli = parse(&[
            "gocut",
            "-input",
            "main.go",
            "-config",
            &config_arg,
            "-output",
            "from-flag",
            "-no-normalize",
            "-strict-imports",
        ]);
        let cutter = cutter_for(&cli).unwrap();

        assert_eq!(cutter.config().output.to_str(), Some("from-flag"));
        assert!(!cutter.config().imports.normalize);
        assert!(cutter.config().imports.strict);
    }

    #[test]
    fn config_output_is_used_without_flag() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("gocut.toml"), "output = \"dist\"\n").unwrap();
        let entry = dir.path().join("main.go");
        let entry_arg = entry.to_string_lossy().into_owned();

        let cutter = cutter_for(&parse(&["gocut", "-input", &entry_arg])).unwrap();

        assert_eq!(cutter.config().output.to_str(), Some("dist"));
    }

    #[test]
    fn run_writes_the_cut_file() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("main.go");
        fs::write(&entry, "package main\n\nfunc main() { helper() }\n").unwrap();
        fs::write(
            dir.path().join("util.go"),
            "package main\n\nfunc helper() {}\n\nfunc other() {}\n",
        )
        .unwrap();
        let out = dir.path().join("out");
        let entry_arg = entry.to_string_lossy().into_owned();
        let out_arg = out.to_string_lossy().into_owned();

        run(&parse(&["gocut", "-input", &entry_arg, "-output", &out_arg, "--format", "json"]))
            .unwrap();

        let written = fs::read_to_string(out.join("main.go")).unwrap();
        assert!(written.contains("func helper() {}"));
        assert!(!written.contains("other"));
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let cli = parse(&["gocut", "-input", "main.go", "--config", "/nonexistent/gocut.toml"]);
        assert!(cutter_for(&cli).is_err());
    }
}
