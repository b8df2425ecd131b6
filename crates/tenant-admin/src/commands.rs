//! Subcommand execution.

use helios_tenant_closure::backends::sqlite::SqliteBackend;
use helios_tenant_closure::core::{Backend, RepairReport};
use helios_tenant_closure::tenant::TenantNodeId;
use serde_json::{Value, json};
use tracing::info;

use crate::config::Command;

/// Result of a subcommand, rendered as text or JSON by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    pub json: Value,
    pub text: String,
    /// `false` makes the process exit with a non-zero status.
    pub success: bool,
}

impl CommandOutput {
    fn ok(json: Value, text: impl Into<String>) -> Self {
        Self {
            json,
            text: text.into(),
            success: true,
        }
    }

    /// Renders the output the way the user asked for it.
    pub fn render(&self, as_json: bool) -> String {
        if as_json {
            self.json.to_string()
        } else {
            self.text.clone()
        }
    }
}

/// Runs a subcommand against an opened backend.
pub async fn run(
    backend: &SqliteBackend,
    command: &Command,
    verbose: bool,
) -> anyhow::Result<CommandOutput> {
    let output = match command {
        Command::Init => {
            backend.initialize().await?;
            CommandOutput::ok(json!({ "initialized": true }), "schema is up to date")
        }
        Command::Insert { tenant, parent } => {
            backend.insert_tenant(*parent, *tenant)?;
            info!(tenant_id = %tenant, parent_id = %parent, "Inserted tenant");
            let text = if parent.is_root() {
                format!("inserted root tenant {}", tenant)
            } else {
                format!("inserted tenant {} under {}", tenant, parent)
            };
            CommandOutput::ok(json!({ "tenant_id": tenant, "parent_id": parent }), text)
        }
        Command::Move { tenant, to } => {
            backend.move_tenant(*tenant, *to, verbose)?;
            info!(tenant_id = %tenant, new_parent_id = %to, "Moved tenant");
            let text = if to.is_root() {
                format!("detached tenant {} into a root", tenant)
            } else {
                format!("moved tenant {} under {}", tenant, to)
            };
            CommandOutput::ok(json!({ "tenant_id": tenant, "new_parent_id": to }), text)
        }
        Command::IsDescendant {
            ancestor,
            descendant,
        } => {
            let depth = backend.is_descendant(*ancestor, *descendant)?;
            let text = match depth {
                Some(depth) => format!("yes, depth {}", depth),
                None => "no".to_string(),
            };
            CommandOutput {
                json: json!({ "found": depth.is_some(), "depth": depth }),
                text,
                success: depth.is_some(),
            }
        }
        Command::Parent { tenant } => {
            let parent = backend.parent_of(*tenant)?;
            let text = parent.map_or_else(|| "none".to_string(), |p| p.to_string());
            CommandOutput::ok(json!({ "tenant_id": tenant, "parent_id": parent }), text)
        }
        Command::Ancestors { tenant } => depth_list(backend.ancestors(*tenant)?),
        Command::Descendants { tenant } => depth_list(backend.descendants(*tenant)?),
        Command::DetectCycles => {
            let nodes = backend.detect_circular_references()?;
            let text = if nodes.is_empty() {
                "no circular references".to_string()
            } else {
                format!(
                    "circular references involve tenants {}",
                    nodes
                        .iter()
                        .map(TenantNodeId::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            };
            CommandOutput {
                json: json!({ "nodes": nodes }),
                text,
                success: nodes.is_empty(),
            }
        }
        Command::Repair => repair_output(backend.repair_all()?)?,
        Command::RepairPair { tenant, parent } => {
            repair_output(backend.repair_pair(*tenant, *parent)?)?
        }
        Command::Dump => {
            let edges = backend.edges()?;
            let text = edges
                .iter()
                .map(|e| format!("{}\t{}\t{}", e.ancestor, e.descendant, e.depth))
                .collect::<Vec<_>>()
                .join("\n");
            CommandOutput::ok(serde_json::to_value(&edges)?, text)
        }
    };
    Ok(output)
}

fn depth_list(nodes: Vec<(TenantNodeId, u32)>) -> CommandOutput {
    let json = nodes
        .iter()
        .map(|(id, depth)| json!({ "tenant_id": id, "depth": depth }))
        .collect();
    let text = nodes
        .iter()
        .map(|(id, depth)| format!("{}\t{}", id, depth))
        .collect::<Vec<_>>()
        .join("\n");
    CommandOutput::ok(Value::Array(json), text)
}

fn repair_output(report: RepairReport) -> anyhow::Result<CommandOutput> {
    let text = if report.is_noop() {
        "closure table already consistent".to_string()
    } else {
        format!(
            "inserted {} self edges and {} transitive edges, lowered {} depths in {} passes",
            report.self_edges_inserted,
            report.transitive_edges_inserted,
            report.depths_lowered,
            report.passes
        )
    };
    Ok(CommandOutput::ok(serde_json::to_value(report)?, text))
}
