//! Interactive dashboard session: a line-oriented command loop over stdin.

use evaldash_core::{CascadeController, DashboardConfig, FilterCatalog, FilterKey, RefreshScheduler};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Commands:
  status                                   cascade state, catalog and dataset summary
  list <metrics|versions|corpora|topics|groups>
  select|deselect|toggle metric NAME
  select|deselect|toggle version NAME
  select|deselect|toggle corpus NAME
  select|deselect|toggle topic CORPUS TOPIC
  select|deselect|toggle group CORPUS TOPIC NAME
  request                                  print the active filter request
  apply                                    re-issue the active filter now
  reload                                   re-fetch the catalog (merge only)
  help
  quit";

/// Which collection `list` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListTarget {
    Metrics,
    Versions,
    Corpora,
    Topics,
    Groups,
}

/// A parsed session command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Status,
    List(ListTarget),
    Select(FilterKey),
    Deselect(FilterKey),
    Toggle(FilterKey),
    Request,
    Apply,
    Reload,
    Help,
    Quit,
}

/// Parse one input line. Blank lines are `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&cmd, args)) = words.split_first() else {
        return Ok(None);
    };

    let command = match cmd {
        "status" => Command::Status,
        "list" | "ls" => Command::List(parse_list_target(args)?),
        "select" => Command::Select(parse_key(args)?),
        "deselect" => Command::Deselect(parse_key(args)?),
        "toggle" => Command::Toggle(parse_key(args)?),
        "request" => Command::Request,
        "apply" => Command::Apply,
        "reload" => Command::Reload,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("Unknown command '{other}'. Type 'help' for commands.")),
    };
    Ok(Some(command))
}

fn parse_list_target(args: &[&str]) -> Result<ListTarget, String> {
    match args {
        ["metrics"] => Ok(ListTarget::Metrics),
        ["versions"] => Ok(ListTarget::Versions),
        ["corpora"] => Ok(ListTarget::Corpora),
        ["topics"] => Ok(ListTarget::Topics),
        ["groups"] => Ok(ListTarget::Groups),
        _ => Err("Usage: list <metrics|versions|corpora|topics|groups>".to_string()),
    }
}

fn parse_key(args: &[&str]) -> Result<FilterKey, String> {
    match args {
        ["metric", name] => Ok(FilterKey::Metric(name.to_string())),
        ["version", name] => Ok(FilterKey::Version(name.to_string())),
        ["corpus", name] => Ok(FilterKey::Corpus(name.to_string())),
        ["topic", corpus, topic] => Ok(FilterKey::Topic {
            corpus: corpus.to_string(),
            topic: topic.to_string(),
        }),
        ["group", corpus, topic, name] => Ok(FilterKey::QueryGroup {
            corpus: corpus.to_string(),
            topic: topic.to_string(),
            name: name.to_string(),
        }),
        _ => Err(
            "Usage: <select|deselect|toggle> metric|version|corpus NAME, \
             topic CORPUS TOPIC, or group CORPUS TOPIC NAME"
                .to_string(),
        ),
    }
}

fn mark(selected: bool, disabled: bool) -> &'static str {
    match (selected, disabled) {
        (true, false) => "[x]",
        (true, true) => "[-]",
        (false, _) => "[ ]",
    }
}

/// Render one collection of the catalog, one item per line.
pub fn render_list(catalog: &FilterCatalog, target: ListTarget) -> String {
    let lines: Vec<String> = match target {
        ListTarget::Metrics => catalog
            .metrics()
            .iter()
            .map(|m| format!("{} {}", mark(m.is_selected(), false), m.name()))
            .collect(),
        ListTarget::Versions => catalog
            .versions()
            .iter()
            .map(|v| format!("{} {}", mark(v.is_selected(), false), v.name()))
            .collect(),
        ListTarget::Corpora => catalog
            .corpora()
            .iter()
            .map(|c| format!("{} {}", mark(c.is_selected(), false), c.name()))
            .collect(),
        ListTarget::Topics => catalog
            .topics()
            .iter()
            .map(|t| {
                format!(
                    "{} {} {}",
                    mark(t.is_selected(), t.is_disabled()),
                    t.corpus(),
                    t.name()
                )
            })
            .collect(),
        ListTarget::Groups => catalog
            .query_groups()
            .iter()
            .map(|g| {
                format!(
                    "{} {} {} {}",
                    mark(g.is_selected(), g.is_disabled()),
                    g.corpus(),
                    g.topic(),
                    g.name()
                )
            })
            .collect(),
    };
    if lines.is_empty() {
        "(none)".to_string()
    } else {
        lines.join("\n")
    }
}

async fn render_status(controller: &CascadeController) -> String {
    let state = controller.state().await;
    let counts = {
        let catalog = controller.catalog();
        let catalog = catalog.lock().await;
        if catalog.is_empty() {
            "empty".to_string()
        } else {
            format!(
                "{} metrics, {} versions, {} corpora, {} topics, {} query groups",
                catalog.metrics().len(),
                catalog.versions().len(),
                catalog.corpora().len(),
                catalog.topics().len(),
                catalog.query_groups().len()
            )
        }
    };
    let dataset = controller.dataset();
    let view = dataset.read().await;
    let updated = view
        .updated_at()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());
    format!(
        "State: {state}\nCatalog: {counts}\nDataset: revision {}, {} metrics, updated {updated}",
        view.revision(),
        view.metrics_count()
    )
}

/// Run one command against the controller. Returns `false` on quit.
pub async fn execute(controller: &CascadeController, command: Command) -> anyhow::Result<bool> {
    match command {
        Command::Status => println!("{}", render_status(controller).await),
        Command::List(target) => {
            let catalog = controller.catalog();
            let catalog = catalog.lock().await;
            println!("{}", render_list(&catalog, target));
        }
        Command::Select(key) => set_and_report(controller, &key, Some(true)).await,
        Command::Deselect(key) => set_and_report(controller, &key, Some(false)).await,
        Command::Toggle(key) => set_and_report(controller, &key, None).await,
        Command::Request => {
            let request = controller.active_request().await;
            println!("{}", serde_json::to_string_pretty(&request)?);
        }
        Command::Apply => match controller.apply_filter().await {
            Ok(()) => {
                let revision = controller.dataset().read().await.revision();
                println!("Dataset updated (revision {revision}).");
            }
            Err(e) => println!("Filter failed, keeping previous dataset: {e}"),
        },
        Command::Reload => {
            controller.refresh_catalog().await;
            println!("Catalog reloaded.");
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

async fn set_and_report(controller: &CascadeController, key: &FilterKey, selected: Option<bool>) {
    let outcome = match selected {
        Some(selected) => controller.set_selection(key, selected).await.map(|()| selected),
        None => controller.toggle(key).await,
    };
    match outcome {
        Ok(true) => println!("Selected {key}."),
        Ok(false) => println!("Deselected {key}."),
        Err(e) => println!("{e}"),
    }
}

/// Activate the cascade, start the refresh timer, and serve commands until
/// `quit` or end of input.
pub async fn run_interactive(
    controller: CascadeController,
    config: DashboardConfig,
) -> anyhow::Result<()> {
    println!("  evaldash | backend: {}", config.gateway.base_url);
    println!("  Loading filters...");
    controller.activate().await;
    println!("{}", render_status(&controller).await);
    println!("  Type 'help' for commands, 'quit' to exit\n");

    let refresh = config
        .refresh
        .enabled
        .then(|| RefreshScheduler::new(controller.clone(), &config.refresh).spawn());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match parse_command(&line) {
            Ok(Some(command)) => {
                if !execute(&controller, command).await? {
                    break;
                }
            }
            Ok(None) => continue,
            Err(message) => println!("{message}"),
        }
    }

    if let Some(handle) = refresh {
        handle.shutdown().await;
    }
    println!("Goodbye!");
    Ok(())
}
