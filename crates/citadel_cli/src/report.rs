//! Terminal progress reporting and end-of-pass diagnostic rendering.

use crate::{GlobalArgs, ReportFormat};
use citadel_build::{BuildObserver, PassReport, Phase, UnitOutcome, UnitRef};
use citadel_diagnostics::{DiagnosticRenderer, Severity, TerminalRenderer};

/// Build observer printing progress lines to stderr.
///
/// One of potentially several observers on a session; an IDE surface or a
/// log collector would attach alongside it.
pub struct TerminalReporter {
    quiet: bool,
}

impl TerminalReporter {
    /// Creates a reporter honoring the global quiet flag.
    pub fn new(global: &GlobalArgs) -> Self {
        Self {
            quiet: global.quiet,
        }
    }
}

impl BuildObserver for TerminalReporter {
    fn unit_started(&self, unit: &UnitRef, index: usize, total: usize) {
        if !self.quiet {
            eprintln!("  ({index}/{total}) Compiling {unit}");
        }
    }

    fn unit_finished(&self, unit: &UnitRef, outcome: &UnitOutcome) {
        if !self.quiet {
            if let UnitOutcome::Failed { .. } = outcome {
                eprintln!("          failed: {unit}");
            }
        }
    }

    fn phase_changed(&self, phase: Phase) {
        if self.quiet {
            return;
        }
        match phase {
            Phase::Preflight => eprintln!("   Examining source files"),
            Phase::Compiling => {}
            Phase::Linking => eprintln!("   Linking"),
            Phase::ResourceMerge => eprintln!("   Merging resources"),
            Phase::PostBuild => {}
        }
    }
}

/// Renders the finished pass's diagnostics and summary.
pub fn render_report(report: &PassReport, format: ReportFormat, global: &GlobalArgs) {
    match format {
        ReportFormat::Text => {
            let renderer = TerminalRenderer::new(global.color);
            for diag in &report.diagnostics {
                eprint!("{}", renderer.render(diag));
            }
            if !global.quiet {
                let errors = report.error_count();
                let warnings = report
                    .diagnostics
                    .iter()
                    .filter(|d| d.severity == Severity::Warning)
                    .count();
                if errors + warnings > 0 {
                    eprintln!("   Result: {errors} error(s), {warnings} warning(s)");
                }
            }
        }
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string());
            println!("{json}");
        }
    }
}
