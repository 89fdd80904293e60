//! Report formatting for the terminal

use std::fmt::Write;

use colored::Colorize;
use gocut_core::report::CutReport;

pub fn render_text(report: &CutReport) -> String {
    let mut out = String::new();

    let target = report
        .output
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "(not written)".to_string());
    let _ = writeln!(
        out,
        "{} {} {}",
        "✓".green().bold(),
        "Wrote".bold(),
        target.cyan()
    );
    let _ = writeln!(
        out,
        "  package {} ({} files): kept {} declarations, {} symbols",
        report.package,
        report.files,
        report.retained.len(),
        report.used.len()
    );

    for decl in &report.retained {
        let location = format!("{}:{}", decl.file, decl.line);
        let _ = writeln!(out, "    {} {}", location.dimmed(), decl.names.join(", "));
    }

    for path in &report.imports_added {
        let _ = writeln!(out, "  {} import {:?}", "+".green(), path);
    }
    for path in &report.imports_removed {
        let _ = writeln!(out, "  {} import {:?}", "-".red(), path);
    }
    for name in &report.unresolved_qualifiers {
        let _ = writeln!(
            out,
            "{} no import found for qualifier '{}'",
            "warning:".yellow().bold(),
            name
        );
    }
    for warning in &report.warnings {
        let _ = writeln!(out, "{} {}", "warning:".yellow().bold(), warning);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use gocut_core::report::RetainedDecl;
    use std::path::PathBuf;

    fn sample() -> CutReport {
        CutReport {
            entry: PathBuf::from("pkg/main.go"),
            output: Some(PathBuf::from("output/main.go")),
            package: "main".to_string(),
            files: 3,
            used: vec!["helper".to_string(), "main".to_string()],
            retained: vec![
                RetainedDecl {
                    file: "main.go".to_string(),
                    line: 5,
                    names: vec!["main".to_string()],
                },
                RetainedDecl {
                    file: "util.go".to_string(),
                    line: 3,
                    names: vec!["helper".to_string()],
                },
            ],
            visited: 4,
            imports_added: vec!["strings".to_string()],
            imports_removed: Vec::new(),
            unresolved_qualifiers: vec!["yaml".to_string()],
            warnings: vec!["Unknown config option: 'x'".to_string()],
        }
    }

    #[test]
    fn text_lists_retained_declarations() {
        colored::control::set_override(false);
        let text = render_text(&sample());

        assert!(text.contains("Wrote output/main.go"));
        assert!(text.contains("package main (3 files): kept 2 declarations, 2 symbols"));
        assert!(text.contains("util.go:3 helper"));
        assert!(text.contains("+ import \"strings\""));
        assert!(text.contains("no import found for qualifier 'yaml'"));
        assert!(text.contains("Unknown config option: 'x'"));
    }

    #[test]
    fn json_report_skips_empty_lists() {
        let json: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();

        assert_eq!(json["package"], "main");
        assert_eq!(json["used"][0], "helper");
        assert_eq!(json["retained"][1]["file"], "util.go");
        assert!(json.get("imports_removed").is_none());
    }
}
