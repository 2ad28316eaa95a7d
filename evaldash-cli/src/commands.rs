//! Subcommand handlers.

use crate::ConfigAction;
use evaldash_core::{CascadeController, DashboardConfig};
use serde_json::{Value, json};

pub fn handle_config(action: ConfigAction, config: &DashboardConfig) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(config)?;
            println!("{}", toml_str);
            Ok(())
        }
        ConfigAction::Validate => {
            let problems = config.validate();
            if problems.is_empty() {
                println!("Configuration is valid.");
                return Ok(());
            }
            for problem in &problems {
                println!("  - {problem}");
            }
            anyhow::bail!("{} configuration problem(s) found", problems.len())
        }
    }
}

pub async fn print_snapshot(controller: &CascadeController) -> anyhow::Result<()> {
    let snapshot = snapshot(controller).await;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

/// Activate once and describe the catalog, the active request, and the
/// dataset that was loaded.
pub async fn snapshot(controller: &CascadeController) -> Value {
    controller.activate().await;

    let catalog = {
        let catalog = controller.catalog();
        let catalog = catalog.lock().await;
        json!({
            "metrics": catalog.metrics(),
            "versions": catalog.versions(),
            "corpora": catalog.corpora(),
            "topics": catalog.topics(),
            "queryGroups": catalog.query_groups(),
        })
    };
    let state = controller.state().await;
    let request = controller.active_request().await;
    let dataset = controller.dataset();
    let view = dataset.read().await;

    json!({
        "state": state,
        "catalog": catalog,
        "request": request,
        "dataset": {
            "revision": view.revision(),
            "updatedAt": view.updated_at(),
            "metrics": view.metrics_count(),
            "name": view.data().and_then(|d| d.name.clone()),
        },
    })
}
