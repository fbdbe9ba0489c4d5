mod cli;

#[allow(unused_imports)]
use log::{debug, info, warn, error};

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use clap::Parser;
use rayon::prelude::*;

use insect_thorax::build_info::BuildInfo;
use insect_thorax::config::AnalysisConfig;
use insect_thorax::file_io;
use insect_thorax::logging;
use insect_thorax::pipeline::{Analyzer, BandReport};
use insect_thorax::settings::UserSettings;
use insect_thorax::taxonomy::LabelHierarchy;
use insect_thorax::utils::timing::TimingStats;

use cli::{Cli, Commands};

const APP_NAME: &str = "insect-thorax";

fn load_taxonomy(path: &Path) -> Result<LabelHierarchy, String> {
    let mut hierarchy = LabelHierarchy::from_file(path)?;
    let (removed, warnings) = hierarchy.validate_and_clean();
    for warning in &warnings {
        warn!("{}: {}", path.display(), warning);
    }
    if removed > 0 {
        warn!("Dropped {} invalid taxonomy entries from {}", removed, path.display());
    }
    if hierarchy.is_empty() {
        return Err(format!("Taxonomy {} names no regions", path.display()));
    }
    info!("Loaded {} taxonomy entries from {}", hierarchy.len(), path.display());
    Ok(hierarchy)
}

fn analysis_config(cli: &Cli) -> AnalysisConfig {
    let mut settings = UserSettings::load(cli.settings.as_deref());
    if let Some(policy) = cli.policy {
        settings.attachment_policy = policy.as_str().to_string();
    }
    if cli.render_other {
        settings.render_other = true;
    }
    settings.analysis_config()
}

/// Analyze one grid and write the requested outputs
fn analyze_file(
    analyzer: &Analyzer,
    grid_path: &Path,
    overlay_path: Option<&Path>,
    report_path: Option<&Path>,
) -> Result<BandReport, file_io::Error> {
    let grid = file_io::load_label_grid(grid_path)?;
    let analysis = analyzer.analyze(&grid);
    let report = analysis.report(analyzer.config().landmarks.policy);

    if let Some(path) = overlay_path {
        file_io::save_overlay(path, &analysis.overlay)?;
    }
    if let Some(path) = report_path {
        file_io::write_report(path, &report)?;
    }
    Ok(report)
}

fn run_analyze(
    cli: &Cli,
    grid: &Path,
    taxonomy: &Path,
    overlay: Option<&Path>,
    report: Option<&Path>,
) -> Result<(), String> {
    let hierarchy = load_taxonomy(taxonomy)?;
    let analyzer = Analyzer::new(&hierarchy, analysis_config(cli));

    let result = analyze_file(&analyzer, grid, overlay, report)
        .map_err(|e| format!("{}: {}", grid.display(), e))?;
    println!(
        "{}\tthorax_top={}\tthorax_bottom={}",
        grid.display(),
        result.thorax_top,
        result.thorax_bottom
    );
    Ok(())
}

/// Output prefix for a grid file. The extension is kept so `grid1.json` and
/// `grid1.png` in the same directory never write to the same outputs.
fn output_stem(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().replace('.', "_"))
        .unwrap_or_else(|| "grid".to_string())
}

fn run_batch(cli: &Cli, dir: &Path, taxonomy: &Path, out: &Path) -> Result<(), String> {
    if !file_io::is_directory(dir) {
        return Err(format!("{} is not a directory", dir.display()));
    }
    let hierarchy = load_taxonomy(taxonomy)?;
    let analyzer = Analyzer::new(&hierarchy, analysis_config(cli));
    let grids = file_io::list_label_grids(dir).map_err(|e| e.to_string())?;
    info!("Found {} label grids in {}", grids.len(), dir.display());

    // Each grid is independent; one failure never aborts the others
    let results: Vec<(PathBuf, Result<BandReport, file_io::Error>, std::time::Duration)> = grids
        .par_iter()
        .map(|grid_path| {
            let start = Instant::now();
            let stem = output_stem(grid_path);
            let overlay_path = out.join(format!("{stem}_overlay.png"));
            let report_path = out.join(format!("{stem}_report.json"));
            let result = analyze_file(&analyzer, grid_path, Some(&overlay_path), Some(&report_path));
            (grid_path.clone(), result, start.elapsed())
        })
        .collect();

    let mut stats = TimingStats::new("Grid analysis");
    let mut failures = 0;
    for (path, result, elapsed) in &results {
        stats.add_measurement(*elapsed);
        match result {
            Ok(report) => println!(
                "{}\tthorax_top={}\tthorax_bottom={}",
                path.display(),
                report.thorax_top,
                report.thorax_bottom
            ),
            Err(e) => {
                failures += 1;
                error!("Failed to analyze {}: {}", path.display(), e);
                eprintln!("{}\terror: {}", path.display(), e);
            }
        }
    }
    stats.log_summary();

    if failures > 0 {
        Err(format!("{} of {} grids failed", failures, results.len()))
    } else {
        Ok(())
    }
}

fn run_init_settings(path: Option<&Path>) -> Result<(), String> {
    let written = UserSettings::default().save(path)?;
    println!("Settings written to {}", written.display());
    Ok(())
}

fn run(cli: &Cli) -> Result<(), String> {
    match &cli.command {
        Some(Commands::Analyze { grid, taxonomy, overlay, report }) => {
            run_analyze(cli, grid, taxonomy, overlay.as_deref(), report.as_deref())
        }
        Some(Commands::Batch { dir, taxonomy, out }) => run_batch(cli, dir, taxonomy, out),
        Some(Commands::InitSettings { path }) => run_init_settings(path.as_deref()),
        None => Err("no command given (try --help)".to_string()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.show_version {
        println!("{}", BuildInfo::detailed_info());
        return ExitCode::SUCCESS;
    }

    let shared_log_buffer = logging::setup_logger(cli.verbose);
    logging::setup_panic_hook(APP_NAME, shared_log_buffer.clone());
    debug!("{} {} ({})", APP_NAME, BuildInfo::version(), BuildInfo::git_hash_short());

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {e}");
            if cli.verbose {
                match logging::export_debug_logs(APP_NAME, &shared_log_buffer) {
                    Ok(path) => eprintln!("Debug log written to {}", path.display()),
                    Err(export_err) => eprintln!("Failed to export debug logs: {export_err}"),
                }
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_stem_keeps_extension() {
        let json = output_stem(Path::new("grids/grid1.json"));
        let png = output_stem(Path::new("grids/grid1.png"));
        assert_eq!(json, "grid1_json");
        assert_eq!(png, "grid1_png");
        assert_ne!(json, png);
    }
}
