//! CLI subcommand handlers.

use crate::{Commands, ConfigAction};
use aidsteps_core::{AidstepsConfig, SplitConfig};
use aidsteps_ml::data::quality::QualityReport;
use aidsteps_ml::data::{
    DatasetSplit, SplitLabel, SplitPaths, TrainingExample, check_file, distribution, expand,
    load_catalog, load_examples, save_examples, split_examples,
};
use aidsteps_ml::eval::{parse_generated, score_relevance, validate_structure_with};
use aidsteps_ml::inference::{GenerationOptions, InferenceClient, OllamaClient};
use aidsteps_ml::MlError;
use aidsteps_ml::llm::{EvaluationRun, Evaluator, export_sharegpt};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Number of sample evaluations echoed after a run.
const SAMPLES_SHOWN: usize = 3;

/// Handle a CLI subcommand.
pub async fn handle_command(
    command: Commands,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    if let Commands::Config { action } = command {
        return handle_config(action, workspace, config_file);
    }

    let config = aidsteps_core::load_config_with(Some(workspace), config_file, None)
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    match command {
        Commands::Config { .. } => Ok(()),
        Commands::Expand { catalog } => handle_expand(&config, workspace, catalog).map(|_| ()),
        Commands::Split { input, seed } => {
            let input = input.unwrap_or_else(|| expanded_path(&config, workspace));
            let examples = load_examples(&input)?;
            println!("Loaded {} examples from {}", examples.len(), input.display());
            handle_split(&config, workspace, examples, seed).map(|_| ())
        }
        Commands::Build { catalog, seed } => {
            let examples = handle_expand(&config, workspace, catalog)?;
            handle_split(&config, workspace, examples, seed).map(|_| ())
        }
        Commands::Check { path } => {
            let path = path.unwrap_or_else(|| expanded_path(&config, workspace));
            handle_check(&config, &path)
        }
        Commands::Analyze => handle_analyze(&config, workspace),
        Commands::ExportSharegpt { input, output } => {
            let input = input.unwrap_or_else(|| expanded_path(&config, workspace));
            let output = output
                .unwrap_or_else(|| config.data.processed(workspace, &config.data.sharegpt_file));
            let written = export_sharegpt(&input, &output)?;
            println!("Wrote {} conversations to {}", written, output.display());
            Ok(())
        }
        Commands::ValidateOutput { file, input } => {
            let text = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            if text.trim().is_empty() {
                return Err(MlError::invalid_input("no generated text to validate").into());
            }
            let report = validate_output(&config, &text, input.as_deref());
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Evaluate {
            model,
            base_url,
            limit,
        } => handle_evaluate(config, workspace, model, base_url, limit).await,
    }
}

fn handle_config(
    action: ConfigAction,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = aidsteps_core::config::workspace_config_path(workspace);
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let toml_str = aidsteps_core::config::to_toml(&AidstepsConfig::default())?;
            aidsteps_core::persistence::atomic_write(&config_path, toml_str.as_bytes())?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = aidsteps_core::load_config_with(Some(workspace), config_file, None)
                .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
            if config_file.is_none() && !aidsteps_core::config_exists(Some(workspace)) {
                println!("# No configuration file found; showing defaults and environment\n");
            }
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{}", toml_str);
            Ok(())
        }
    }
}

fn expanded_path(config: &AidstepsConfig, workspace: &Path) -> PathBuf {
    config.data.processed(workspace, &config.data.expanded_file)
}

fn split_paths(config: &AidstepsConfig, workspace: &Path) -> SplitPaths {
    let data = &config.data;
    SplitPaths {
        train: data.processed(workspace, &data.train_file),
        validation: data.processed(workspace, &data.validation_file),
        test: data.processed(workspace, &data.test_file),
    }
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

fn target_ratios(split: &SplitConfig) -> String {
    format!(
        "target: train {:.1}%, validation {:.1}%, test {:.1}%",
        split.train_ratio * 100.0,
        split.validation_ratio * 100.0,
        split.test_ratio() * 100.0
    )
}

fn handle_expand(
    config: &AidstepsConfig,
    workspace: &Path,
    catalog: Option<PathBuf>,
) -> anyhow::Result<Vec<TrainingExample>> {
    let catalog_path = catalog.unwrap_or_else(|| config.data.catalog(workspace));
    let load = load_catalog(&catalog_path)?;

    println!(
        "Catalog {}: {} categories, {} phrases",
        catalog_path.display(),
        load.catalog.len(),
        load.catalog.pattern_count()
    );
    for entry in load.catalog.summary() {
        println!(
            "  {:<28} {:>2} steps, {:>3} phrases",
            entry.category, entry.steps, entry.patterns
        );
    }
    if !load.skipped.is_empty() {
        println!("Skipped {} malformed record(s):", load.skipped.len());
        for skipped in &load.skipped {
            println!(
                "  #{} {}: {}",
                skipped.index,
                skipped.category.as_deref().unwrap_or("<unnamed>"),
                skipped.reason
            );
        }
    }

    let examples = expand(&load.catalog);
    let output = expanded_path(config, workspace);
    let written = save_examples(&output, &examples)?;
    println!("Wrote {} examples to {}", written, output.display());
    Ok(examples)
}

fn handle_split(
    config: &AidstepsConfig,
    workspace: &Path,
    examples: Vec<TrainingExample>,
    seed: Option<u64>,
) -> anyhow::Result<DatasetSplit> {
    let mut split_config = config.split;
    if let Some(seed) = seed {
        split_config.seed = seed;
    }

    let split = split_examples(examples, &split_config);
    let paths = split_paths(config, workspace);
    split.write_to(&paths)?;

    let total = split.total();
    println!("Split {} examples (seed {}):", total, split_config.seed);
    println!("  {}", target_ratios(&split_config));
    for label in SplitLabel::ALL {
        let count = split.get(label).len();
        println!(
            "  {:<10} {:>5} ({:>5.1}%) -> {}",
            label.to_string(),
            count,
            percent(count, total),
            paths.get(label).display()
        );
    }

    let overlap = split.overlap();
    if overlap.is_clean() {
        println!("No input phrase appears in more than one split");
    } else {
        tracing::warn!(?overlap, "Splits share input phrases");
        println!(
            "Overlap: train/validation {}, train/test {}, validation/test {}",
            overlap.train_validation, overlap.train_test, overlap.validation_test
        );
    }
    Ok(split)
}

fn print_quality(report: &QualityReport, max_reported: usize) {
    println!("Total examples:       {}", report.total_examples);
    println!("Structurally valid:   {}", report.structurally_valid);
    println!("Issues:               {}", report.issues.len());
    for issue in report.first_issues(max_reported) {
        println!("  - {issue}");
    }
    if report.issues.len() > max_reported {
        println!("  ... and {} more", report.issues.len() - max_reported);
    }

    if let Some(stats) = report.steps_per_example {
        println!("Steps per example:    {stats}");
    }
    if let Some(stats) = report.title_length {
        println!("Title length:         {stats}");
    }
    if let Some(stats) = report.description_length {
        println!("Description length:   {stats}");
    }
    println!("Unique inputs:        {}", report.unique_inputs);
    println!(
        "Emergency types:      {} ({})",
        report.emergency_types.len(),
        report
            .emergency_types
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    );

    if report.ready_for_fine_tuning() {
        println!("Dataset is ready for fine-tuning");
    } else if report.is_valid() {
        println!("Dataset is valid but covers too few emergency types");
    } else {
        println!("Dataset needs fixes before fine-tuning");
    }
}

fn handle_check(config: &AidstepsConfig, path: &Path) -> anyhow::Result<()> {
    let report = check_file(path, &config.quality)?;
    println!("Quality report for {}", path.display());
    print_quality(&report, config.quality.max_reported_errors);
    Ok(())
}

fn handle_analyze(config: &AidstepsConfig, workspace: &Path) -> anyhow::Result<()> {
    let split = DatasetSplit::read_from(&split_paths(config, workspace))?;
    let report = distribution(&split);

    println!(
        "{:<20} {:>7} {:>11} {:>6}",
        "type", "train", "validation", "test"
    );
    for kind in &report.all_types {
        let count = |label: SplitLabel| {
            report
                .per_split
                .get(&label.to_string())
                .and_then(|counts| counts.get(kind))
                .copied()
                .unwrap_or(0)
        };
        println!(
            "{:<20} {:>7} {:>11} {:>6}",
            kind,
            count(SplitLabel::Train),
            count(SplitLabel::Validation),
            count(SplitLabel::Test)
        );
    }

    for label in [SplitLabel::Validation, SplitLabel::Test] {
        let missing = report.missing_from(label);
        if !missing.is_empty() {
            println!("Missing from {label}: {}", missing.join(", "));
        }
    }
    Ok(())
}

fn validate_output(
    config: &AidstepsConfig,
    text: &str,
    input: Option<&str>,
) -> serde_json::Value {
    let parsed = parse_generated(text);
    let checks = parsed.json.as_ref().map(|json| {
        validate_structure_with(
            json,
            config.quality.min_step_count,
            config.quality.max_step_count,
        )
    });
    let relevance = match (input, parsed.json.as_ref().and_then(|j| j.get("steps"))) {
        (Some(input), Some(steps)) => Some(score_relevance(
            input,
            steps.as_array().map(Vec::as_slice).unwrap_or(&[]),
        )),
        _ => None,
    };

    serde_json::json!({
        "is_valid_json": parsed.is_valid_json,
        "all_checks_passed": checks.is_some_and(|c| c.all_passed()),
        "validation_results": checks,
        "relevance_results": relevance,
        "parsed_json": parsed.json,
    })
}

fn print_run(run: &EvaluationRun, results_path: &Path) {
    let summary = &run.summary;
    println!("Model:            {} ({})", run.model, run.backend);
    println!("Examples:         {}", summary.total_examples);
    println!(
        "Valid JSON:       {}/{} ({:.1}%)",
        summary.valid_json,
        summary.total_examples,
        summary.valid_json_rate * 100.0
    );
    if summary.inference_errors > 0 {
        println!("Inference errors: {}", summary.inference_errors);
    }
    for check in &summary.checks {
        println!(
            "  {:<32} {}/{}",
            check.name, check.passed, summary.valid_json
        );
    }
    let show = |value: Option<f64>| value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}"));
    println!("Specific relevance: {}", show(summary.mean_specific_relevance));
    println!("General relevance:  {}", show(summary.mean_general_relevance));
    println!("Overall relevance:  {}", show(summary.mean_overall_relevance));

    for (i, result) in run.results.iter().take(SAMPLES_SHOWN).enumerate() {
        println!("\nSample {}: {}", i + 1, result.input);
        match &result.error {
            Some(error) => println!("  error: {error}"),
            None => println!("  {}", result.generated_response.replace('\n', "\n  ")),
        }
    }

    println!("\nDetailed results saved to {}", results_path.display());
    if summary.passed {
        println!("Model meets the quality thresholds");
    } else {
        println!("Model is below the quality thresholds");
    }
}

async fn handle_evaluate(
    config: AidstepsConfig,
    workspace: &Path,
    model: Option<String>,
    base_url: Option<String>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let mut eval_config = config.evaluation.clone();
    if let Some(model) = model {
        eval_config.model = model;
    }
    if let Some(base_url) = base_url {
        eval_config.base_url = base_url;
    }
    if limit.is_some() {
        eval_config.sample_limit = limit;
    }

    let client = OllamaClient::from_config(&eval_config)?;
    if !client.is_available().await {
        anyhow::bail!(
            "Model '{}' is not available at {}",
            eval_config.model,
            eval_config.base_url
        );
    }

    let test_path = config.data.processed(workspace, &config.data.test_file);
    let mut examples = load_examples(&test_path)?;
    if let Some(limit) = eval_config.sample_limit {
        examples.truncate(limit);
    }
    if examples.is_empty() {
        return Err(MlError::evaluation(format!(
            "no test examples to evaluate in {}",
            test_path.display()
        ))
        .into());
    }
    println!(
        "Evaluating {} examples from {}",
        examples.len(),
        test_path.display()
    );

    let evaluator = Evaluator::new(&client, GenerationOptions::from(&eval_config))
        .with_step_bounds(config.quality.min_step_count, config.quality.max_step_count);
    let run = evaluator.run(client.model(), &examples, &eval_config).await;

    let results_path = config
        .data
        .processed(workspace, &config.data.evaluation_results_file);
    run.save(&results_path)?;
    print_run(&run, &results_path);
    Ok(())
}
