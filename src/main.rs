//! Command-line front end for the training control panel.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use trainpanel::config::{ConfigEditor, ConfigStore, SaveOutcome};
use trainpanel::logging;
use trainpanel::prediction::{self, DirListing, ModelSelection, PredictionResults};
use trainpanel::selection::{SplitCounts, Summary};
use trainpanel::session::{RegistryLoader, SessionContext, SessionSnapshot};
use trainpanel::settings::{self, Settings};
use trainpanel::training::{LogConsumer, SseReader, Terminal};

const REGISTRY_TIMEOUT: Duration = Duration::from_secs(30);

enum Command {
    Summary(PathBuf),
    Payload(PathBuf),
    ConfigShow,
    ConfigReset,
    ConfigSave(PathBuf),
    SettingsInit,
    Logs,
    Compare {
        results: PathBuf,
        models: Vec<String>,
    },
    Runs {
        listing: PathBuf,
        base_url: String,
    },
}

fn main() {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let Some(command) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    match command {
        Command::Summary(path) => {
            let session = open_session(&path)?;
            print_summary(session.summary());
            Ok(())
        }
        Command::Payload(path) => {
            let session = open_session(&path)?;
            let payload = session.build_payload(&open_store());
            let text = serde_json::to_string_pretty(&payload).map_err(|err| err.to_string())?;
            println!("{text}");
            Ok(())
        }
        Command::ConfigShow => {
            let config = open_store().load();
            println!("{}", config.to_pretty_json());
            Ok(())
        }
        Command::ConfigReset => {
            let config = open_store().reset();
            println!("Configuration reset to defaults ({} keys)", config.len());
            Ok(())
        }
        Command::ConfigSave(path) => save_config(&path),
        Command::SettingsInit => init_settings(),
        Command::Logs => follow_stdin_logs(),
        Command::Compare { results, models } => compare(&results, models),
        Command::Runs { listing, base_url } => {
            let html = read_text(&listing)?;
            let listing = DirListing::parse(&html, &base_url).map_err(|err| err.to_string())?;
            for run in listing.prediction_runs() {
                println!("{run}");
            }
            Ok(())
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<Option<Command>, String> {
    let mut rest = args.into_iter();
    let Some(first) = rest.next() else {
        println!("{}", help_text());
        return Ok(None);
    };
    let command = match first.as_str() {
        "-h" | "--help" => {
            println!("{}", help_text());
            return Ok(None);
        }
        "summary" => Command::Summary(next_path(&mut rest, "summary")?),
        "payload" => Command::Payload(next_path(&mut rest, "payload")?),
        "config" => match rest.next().as_deref() {
            Some("show") => Command::ConfigShow,
            Some("reset") => Command::ConfigReset,
            Some("save") => Command::ConfigSave(next_path(&mut rest, "config save")?),
            Some(other) => return Err(format!("Unknown config action: {other}")),
            None => return Err("config requires show, reset or save".to_string()),
        },
        "settings" => match rest.next().as_deref() {
            Some("init") => Command::SettingsInit,
            Some(other) => return Err(format!("Unknown settings action: {other}")),
            None => return Err("settings requires init".to_string()),
        },
        "logs" => Command::Logs,
        "compare" => {
            let results = next_path(&mut rest, "compare")?;
            Command::Compare {
                results,
                models: rest.by_ref().collect(),
            }
        }
        "runs" => {
            let listing = next_path(&mut rest, "runs")?;
            let base_url = rest
                .next()
                .ok_or_else(|| "runs requires a base URL".to_string())?;
            Command::Runs { listing, base_url }
        }
        unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
    };
    if let Some(extra) = rest.next() {
        return Err(format!("Unexpected argument: {extra}"));
    }
    Ok(Some(command))
}

fn next_path(rest: &mut impl Iterator<Item = String>, name: &str) -> Result<PathBuf, String> {
    rest.next()
        .map(PathBuf::from)
        .ok_or_else(|| format!("{name} requires a file path"))
}

fn help_text() -> String {
    [
        "trainpanel",
        "",
        "Assemble training payloads and inspect training output.",
        "",
        "Usage:",
        "  trainpanel summary <session.json>",
        "  trainpanel payload <session.json>",
        "  trainpanel config show|reset|save <file.json>",
        "  trainpanel settings init",
        "  trainpanel logs < stream.txt",
        "  trainpanel compare <results.json> [model ...]",
        "  trainpanel runs <listing.html> <base-url>",
    ]
    .join("\n")
}

fn read_text(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|err| format!("Failed to read {}: {err}", path.display()))
}

fn load_settings() -> Settings {
    match settings::load_or_default() {
        Ok(settings) => settings,
        Err(err) => {
            tracing::warn!("Using default settings: {err}");
            Settings::default()
        }
    }
}

fn open_store() -> ConfigStore {
    match ConfigStore::open_default() {
        Ok(store) => store,
        Err(err) => {
            tracing::warn!("Config storage unavailable, keeping changes in memory: {err}");
            ConfigStore::in_memory()
        }
    }
}

/// Restore a session. Settings fill in whatever the session file leaves out,
/// including the registry, which is then loaded from the configured source.
fn open_session(path: &Path) -> Result<SessionContext, String> {
    let text = read_text(path)?;
    let snapshot: SessionSnapshot = serde_json::from_str(&text)
        .map_err(|err| format!("Invalid session file {}: {err}", path.display()))?;
    let settings = load_settings();
    let mut snapshot = settings.seed_snapshot(snapshot);
    if snapshot.registry.is_none() {
        let mut loader = RegistryLoader::new(settings.registry_source());
        loader.request();
        let registry = loader
            .wait(REGISTRY_TIMEOUT)
            .ok_or_else(|| "Timed out loading line counts".to_string())?;
        snapshot.registry = Some(registry);
    }
    Ok(SessionContext::from_snapshot(snapshot))
}

/// Write the current settings back to the app root so they can be edited.
fn init_settings() -> Result<(), String> {
    let path = settings::settings_path().map_err(|err| err.to_string())?;
    let settings = settings::load_from(&path).map_err(|err| err.to_string())?;
    settings::save_to_path(&settings, &path).map_err(|err| err.to_string())?;
    println!("Settings written to {}", path.display());
    Ok(())
}

fn print_summary(summary: &Summary) {
    for entry in &summary.types {
        let state = if entry.enabled { "on" } else { "off" };
        println!(
            "{:<24} {:<3} {:<6} {:>4} lines {:>8}",
            entry.name,
            state,
            entry.mode.label(),
            entry.lines_count,
            entry.total
        );
    }
    println!("Positives: {}", summary.total_positives);
    println!("Negatives: {}", summary.total_negatives);
    println!("Total:     {}", summary.total_all);
    println!("Positive split: {}", split_line(&summary.positive_split));
    println!("Negative split: {}", split_line(&summary.negative_split));
    println!("Combined split: {}", split_line(&summary.combined_split));
}

fn split_line(counts: &SplitCounts) -> String {
    format!("{} / {} / {}", counts.train, counts.val, counts.test)
}

/// Merge a JSON file into the stored configuration, like the inline editor.
fn save_config(path: &Path) -> Result<(), String> {
    let store = open_store();
    let mut current = store.load();
    let mut editor = ConfigEditor::open(&current);
    editor.set_text(read_text(path)?);
    let outcome = editor
        .commit(&store, &mut current)
        .map_err(|err| format!("Configuration not saved: {err}"))?;
    match outcome {
        SaveOutcome::Primary => println!("Configuration saved"),
        SaveOutcome::Session => {
            println!("Configuration saved for this session only; persistent storage is unavailable")
        }
        SaveOutcome::Failed => println!("Configuration applied but could not be stored"),
    }
    Ok(())
}

fn follow_stdin_logs() -> Result<(), String> {
    let stdin = std::io::stdin();
    let mut consumer = LogConsumer::new();
    let mut stdout = std::io::stdout().lock();
    for event in SseReader::new(stdin.lock()) {
        let event = event.map_err(|err| format!("Log stream failed: {err}"))?;
        if !event.is_message() {
            continue;
        }
        let terminal = consumer.push(&event.data);
        writeln!(stdout, "{}", event.data).map_err(|err| err.to_string())?;
        if let Some(terminal) = terminal {
            return finish_logs(terminal);
        }
    }
    Err("Log stream ended without a final status".to_string())
}

fn finish_logs(terminal: Terminal) -> Result<(), String> {
    match terminal {
        Terminal::Failed => Err("Training failed".to_string()),
        other => {
            eprintln!("Training {}", other.label());
            Ok(())
        }
    }
}

fn compare(path: &Path, models: Vec<String>) -> Result<(), String> {
    let results: PredictionResults = serde_json::from_str(&read_text(path)?)
        .map_err(|err| format!("Invalid prediction results {}: {err}", path.display()))?;
    let models = if models.is_empty() {
        let remembered = ModelSelection::open_default()
            .map(|selection| selection.load())
            .unwrap_or_default();
        if remembered.is_empty() {
            results.results_summary.keys().cloned().collect()
        } else {
            remembered
        }
    } else {
        models
    };
    for group in prediction::group_for_comparison(&models, &results) {
        println!("{} ({} columns)", group.image_key, group.columns());
        for entry in &group.entries {
            println!("  {:<24} {}", entry.model, entry.url);
        }
    }
    Ok(())
}
