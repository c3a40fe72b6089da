mod cli;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use folio_config::Config;
use folio_engine::commands::ListWrapPlan;
use folio_engine::{
    Command as _, Editor, EditorAction, ListAttrs, ListKind, TextSelection, WrapInList,
    document_to_html,
};
use log::{debug, info};

use crate::cli::{Cli, Command, ListArgs, Target};

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let mut editor = Editor::new(config.editor_options()?)?;

    let output = run(&mut editor, &config, &cli.command)?;
    println!("{output}");
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let loaded = match path {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    match loaded {
        Some(config) => Ok(config),
        None => {
            info!(
                "No config file found at {}; using defaults",
                path.map_or_else(Config::config_path, Path::to_path_buf).display()
            );
            Ok(Config::default())
        }
    }
}

fn run(editor: &mut Editor, config: &Config, command: &Command) -> Result<String> {
    match command {
        Command::Render { target } => {
            open(editor, config, target)?;
            Ok(document_to_html(editor.doc()))
        }
        Command::Probe { target, list } => {
            open(editor, config, target)?;
            Ok(probe(editor, list))
        }
        Command::Wrap { target, list, json } => {
            open(editor, config, target)?;
            let action = EditorAction::WrapInList(list_command(editor, list)?);
            if !editor.run(&action) {
                bail!("Cannot wrap the selection in a {}", ListKind::from(list.kind).node_name());
            }
            if *json {
                Ok(editor.doc().to_json_string()?)
            } else {
                Ok(document_to_html(editor.doc()))
            }
        }
        Command::Type { target, text } => {
            open(editor, config, target)?;
            for ch in text.chars() {
                editor.type_text(ch.encode_utf8(&mut [0; 4]))?;
            }
            Ok(document_to_html(editor.doc()))
        }
        Command::Menu { target } => {
            open(editor, config, target)?;
            let lines: Vec<String> = editor
                .menu_view()
                .into_iter()
                .map(|item| {
                    let mark = if item.enabled { "x" } else { " " };
                    format!("[{mark}] {:<28} {}", item.id, item.label)
                })
                .collect();
            Ok(lines.join("\n"))
        }
    }
}

/// Load the target document into `editor` and select the target range.
fn open(editor: &mut Editor, config: &Config, target: &Target) -> Result<()> {
    let path = document_path(config, target)?;
    let source = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let doc = editor
        .schema()
        .node_from_json_str(&source)
        .with_context(|| format!("Failed to load document {}", path.display()))?;
    editor.set_document(doc)?;

    let size = editor.doc().content_size();
    let from = target.from.unwrap_or_else(|| TextSelection::at_start(editor.doc()).from());
    let to = target.to.unwrap_or(from);
    if from > to || to > size {
        bail!("Selection {from}..{to} is outside the document (size {size})");
    }
    editor.set_selection(TextSelection::new(from, to));
    debug!("Opened {} with selection {from}..{to}", path.display());
    Ok(())
}

fn document_path(config: &Config, target: &Target) -> Result<PathBuf> {
    target
        .document
        .clone()
        .or_else(|| config.default_document.clone())
        .ok_or_else(|| {
            anyhow!(
                "No document given and no default_document in {}",
                Config::config_path().display()
            )
        })
}

fn list_command(editor: &Editor, list: &ListArgs) -> Result<WrapInList> {
    let kind = ListKind::from(list.kind);
    let list_type = editor
        .schema()
        .node_type(kind.node_name())
        .ok_or_else(|| anyhow!("Schema has no {} type", kind.node_name()))?;
    let style = list.style.unwrap_or_else(|| editor.options().default_style(kind));
    let attrs = ListAttrs::new(kind, list.start, style).to_attrs();
    Ok(WrapInList::new(list_type, Some(attrs)))
}

fn probe(editor: &Editor, list: &ListArgs) -> String {
    let command = match list_command(editor, list) {
        Ok(command) => command,
        Err(err) => return format!("not applicable: {err}"),
    };
    let state = editor.state();
    if !command.can_execute(state) {
        return "not applicable".to_string();
    }
    let selection = state.selection();
    let plan = ListWrapPlan::new(
        state.doc(),
        selection.from(),
        selection.to(),
        command.list_type(),
        command.attrs(),
    );
    match plan {
        Some(plan) => {
            let wrappers: Vec<&str> = plan.wrappers.iter().map(|w| w.node_type.name()).collect();
            format!(
                "applicable: wrap blocks {}..{} in {}{}",
                plan.target.range.start(),
                plan.target.range.end(),
                wrappers.join(" > "),
                if plan.target.join_with_previous {
                    " (nested into the previous item)"
                } else {
                    ""
                }
            )
        }
        None => "not applicable".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_engine::EditorOptions;
    use pretty_assertions::assert_eq;

    const TWO_PARAGRAPHS: &str = r#"{"type": "doc", "content": [
        {"type": "paragraph", "content": [{"type": "text", "text": "one"}]},
        {"type": "paragraph", "content": [{"type": "text", "text": "two"}]}
    ]}"#;

    fn editor_with(source: &str) -> Editor {
        let mut editor = Editor::new(EditorOptions::default()).unwrap();
        let doc = editor.schema().node_from_json_str(source).unwrap();
        editor.set_document(doc).unwrap();
        editor
    }

    fn list_args(kind: cli::KindArg) -> ListArgs {
        ListArgs {
            kind,
            style: None,
            start: 1,
        }
    }

    #[test]
    fn test_probe_reports_plan_without_editing() {
        let mut editor = editor_with(TWO_PARAGRAPHS);
        editor.set_selection(TextSelection::new(1, 8));
        let before = editor.doc().clone();

        let report = probe(&editor, &list_args(cli::KindArg::Ordered));

        assert_eq!(report, "applicable: wrap blocks 0..10 in ordered_list > list_item");
        assert_eq!(editor.doc(), &before);
    }

    #[test]
    fn test_list_command_uses_configured_bullet_style() {
        let options = EditorOptions {
            default_bullet_style: folio_engine::ListStyle::Square,
            ..EditorOptions::default()
        };
        let editor = Editor::new(options).unwrap();

        let command = list_command(&editor, &list_args(cli::KindArg::Bullet)).unwrap();

        let style = command
            .attrs()
            .and_then(|attrs| attrs.get("style"))
            .and_then(|value| value.as_str());
        assert_eq!(style, Some("square"));
    }

    #[test]
    fn test_document_path_falls_back_to_config() {
        let config = Config {
            default_document: Some(PathBuf::from("/docs/today.json")),
            ..Config::default()
        };
        let target = Target {
            document: None,
            from: None,
            to: None,
        };
        assert_eq!(document_path(&config, &target).unwrap(), PathBuf::from("/docs/today.json"));
        assert!(document_path(&Config::default(), &target).is_err());
    }
}
