//! Display formatting for CLI output
//!
//! Provides structured display for:
//! - Pipeline progress (steps, executed commands, mirrored images)
//! - The final bundle summary with the deployment command
//! - Fatal errors with captured command output

use std::collections::BTreeSet;
use std::path::Path;

use chartlift_core::{
    BundleSummary, ChartRef, CommandResult, CommandRunner, ImageReference, MirrorOutcome, Reporter,
    Step, command_line,
};
use console::style;

use crate::error::CliError;

const STEP_COUNT: usize = 6;

fn step_number(step: Step) -> usize {
    match step {
        Step::RefreshRepositories => 1,
        Step::DiscoverImages => 2,
        Step::MirrorImages => 3,
        Step::CreateBundleDir => 4,
        Step::GenerateValues => 5,
        Step::FetchChart => 6,
    }
}

/// Prints pipeline progress to the terminal
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn step(&mut self, step: Step) {
        println!();
        println!(
            "  {} {}",
            style(format!("[{}/{}]", step_number(step), STEP_COUNT)).dim(),
            style(step).bold()
        );
    }

    fn images_found(&mut self, images: &BTreeSet<ImageReference>) {
        println!(
            "  {} Found {} unique image{}",
            style("✓").green(),
            images.len(),
            if images.len() == 1 { "" } else { "s" }
        );
        for image in images {
            println!("    - {}", image);
        }
    }

    fn image_started(&mut self, image: &ImageReference, target: &ImageReference) {
        println!();
        println!(
            "  {} {} {} {}",
            style("→").blue(),
            style(image).cyan(),
            style("→").dim(),
            style(target).green()
        );
    }

    fn image_finished(&mut self, _image: &ImageReference, target: &ImageReference, outcome: MirrorOutcome) {
        match outcome {
            MirrorOutcome::Pushed => {
                println!("  {} Pushed {}", style("✓").green(), target);
            }
            MirrorOutcome::AlreadyPresent => {
                println!(
                    "  {} {} {}",
                    style("⚠").yellow(),
                    target,
                    style("already present (immutable tag), skipped").dim()
                );
            }
        }
    }

    fn bundle_dir_created(&mut self, dir: &Path) {
        println!("  {} Created {}", style("✓").green(), style(dir.display()).cyan());
    }

    fn values_written(&mut self, path: &Path) {
        println!("  {} Wrote {}", style("✓").green(), style(path.display()).cyan());
    }

    fn archive_fetched(&mut self, archive: &Path) {
        let name = archive
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| archive.display().to_string());
        println!("  {} Downloaded {}", style("✓").green(), style(name).cyan());
    }

    fn warning(&mut self, message: &str) {
        println!("  {} {}", style("⚠").yellow(), message);
    }
}

/// Runner decorator that echoes every command before executing it
pub struct EchoingRunner<R> {
    inner: R,
}

impl<R> EchoingRunner<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: CommandRunner> CommandRunner for EchoingRunner<R> {
    fn run(&self, program: &str, args: &[String]) -> chartlift_core::Result<CommandResult> {
        println!(
            "    {} {}",
            style("$").dim(),
            style(command_line(program, args)).dim()
        );
        self.inner.run(program, args)
    }
}

pub fn print_header(chart: &ChartRef, registry: &str) {
    println!();
    println!(
        "  {} {} {}",
        style("Chartlift").bold().cyan(),
        style("─").dim(),
        style("Helm chart → offline bundle").dim()
    );
    println!();
    println!("  {} {}", style("Chart:   ").dim(), style(chart).cyan());
    println!("  {} {}", style("Registry:").dim(), style(registry).green());
}

pub fn print_no_images(chart: &ChartRef) {
    println!(
        "  {} No container images found in chart '{}'",
        style("⚠").yellow(),
        chart
    );
    println!();
    println!("  Nothing to mirror, exiting.");
}

pub fn print_summary(summary: &BundleSummary) {
    let pushed = summary
        .mirrored
        .iter()
        .filter(|(_, outcome)| *outcome == MirrorOutcome::Pushed)
        .count();
    let skipped = summary.mirrored.len() - pushed;

    println!();
    println!("  {}", style("Bundle Ready").bold().green());
    println!("  {}", style("────────────").dim());
    println!(
        "  {} image{} pushed to the private registry{}",
        style(format!("{:>3}", pushed)).green().bold(),
        if pushed == 1 { "" } else { "s" },
        if skipped > 0 {
            format!(", {} already present", skipped)
        } else {
            String::new()
        }
    );
    println!();
    println!("  All files needed for deployment are in:");
    println!("    {}", style(format!("{}/", summary.bundle_dir.display())).yellow());
    println!();
    println!("  {}", style("Next Steps").bold());
    println!("  {}", style("──────────").dim());
    println!(
        "  Copy the directory into the offline environment, then run:"
    );
    println!();
    println!("    {}", style(format!("cd {}", summary.bundle_dir.display())).cyan());
    for line in summary.deploy_command().lines() {
        println!("    {}", style(line).cyan());
    }
    println!();
}

/// Print a fatal error with its captured output and hint
pub fn print_error(err: &CliError) {
    eprintln!();
    eprintln!("  {} {}", style("✗").red().bold(), style(err).red());

    if let Some(output) = err.output() {
        eprintln!("    {}", style("error output:").dim());
        for line in output.lines() {
            eprintln!("      {}", line);
        }
    }

    if let Some(hint) = err.hint() {
        eprintln!("    {} {}", style("hint:").blue(), hint);
    }
}
