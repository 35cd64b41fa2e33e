use std::path::Path;

use crate::auth::authorizer::{Authorizer, RestoreError};
use crate::auth::oauth::GoogleAuthorizer;
use crate::auth::session::{interactive_sign_in, restore_session};
use crate::auth::store::{CredentialStore, FileCredentialStore};
use crate::cli::commands::{Cli, Commands, InitArgs, ListArgs};
use crate::cli::output::{self, StatusJson};
use crate::io::config_io;
use crate::model::config::AppConfig;
use crate::model::task::TaskNode;
use crate::model::tree::build_tree;
use crate::remote::tasks_api::{GoogleTasksSource, RemoteTaskSource};

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;
    let dir = config_io::config_dir(cli.config_dir.as_deref().map(Path::new))?;

    match cli.command {
        Some(Commands::Signin) => cmd_signin(&dir),
        Some(Commands::Signout) => cmd_signout(&dir),
        Some(Commands::Status) => cmd_status(&dir, json),
        Some(Commands::List(args)) => cmd_list(&dir, args, json),
        // Init and the bare TUI launch are handled in main.rs
        Some(Commands::Init(_)) | None => Ok(()),
    }
}

pub fn cmd_init(
    dir_override: Option<&Path>,
    args: InitArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = config_io::config_dir(dir_override)?;
    let path = config_io::init_config(&dir, args.force)?;
    println!("Wrote {}", path.display());
    println!("Fill in [google] client_id and client_secret, then run `sg signin`.");
    Ok(())
}

// ---------------------------------------------------------------------------
// Session commands
// ---------------------------------------------------------------------------

fn cmd_signin(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = require_configured(dir)?;
    let store = FileCredentialStore::new(config_io::credential_path(dir));
    let authorizer = GoogleAuthorizer::new(config.google);

    println!("Opening the Google consent screen in your browser...");
    let credential = interactive_sign_in(&authorizer, &store)?;
    match credential.expires_at {
        Some(at) => println!("Signed in. Access token valid until {}.", at.format("%H:%M")),
        None => println!("Signed in."),
    }
    Ok(())
}

fn cmd_signout(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileCredentialStore::new(config_io::credential_path(dir));
    let stored = store.load().ok().flatten();
    store.clear()?;
    match stored {
        Some(credential) => {
            // best-effort remote revoke; local clearing already happened
            if let Ok(config) = config_io::load_config(dir) {
                GoogleAuthorizer::new(config.google).sign_out(&credential);
            }
            println!("Signed out.");
        }
        None => println!("No session to clear."),
    }
    Ok(())
}

fn cmd_status(dir: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config_io::config_path(dir);
    let config = config_io::load_config(dir).ok();
    let configured = config
        .as_ref()
        .map(|c| c.google.is_configured())
        .unwrap_or(false);
    let store = FileCredentialStore::new(config_io::credential_path(dir));
    let credential = store.load().ok().flatten();

    if json {
        let status = StatusJson {
            config_path: config_path.display().to_string(),
            configured,
            signed_in: credential.is_some(),
            access_token_expires_at: credential
                .as_ref()
                .and_then(|c| c.expires_at)
                .map(|at| at.to_rfc3339()),
        };
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    match &config {
        Some(_) if configured => println!("Config:  {} (ok)", config_path.display()),
        Some(_) => println!(
            "Config:  {} (client_id/client_secret missing)",
            config_path.display()
        ),
        None => println!("Config:  {} (missing; run `sg init`)", config_path.display()),
    }
    match credential {
        Some(credential) => match credential.expires_at {
            Some(at) => println!("Session: signed in (access token until {})", at.format("%H:%M")),
            None => println!("Session: signed in"),
        },
        None => println!("Session: signed out"),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

fn cmd_list(dir: &Path, args: ListArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = require_configured(dir)?;
    let store = FileCredentialStore::new(config_io::credential_path(dir));
    let authorizer = GoogleAuthorizer::new(config.google.clone());

    let credential = restore_session(&authorizer, &store).map_err(|e| match e {
        RestoreError::NoSession => "not signed in (run `sg signin`)".to_string(),
        other => other.to_string(),
    })?;

    let source = GoogleTasksSource::new(config.google.tasklist);
    let records = source.list(&credential.access_token)?;
    let mut roots = build_tree(records);
    if args.pending {
        retain_pending(&mut roots);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&output::tree_to_json(&roots))?);
    } else {
        output::print_tree(&roots);
    }
    Ok(())
}

/// Drop completed tasks; a completed parent takes its subtasks with it.
fn retain_pending(nodes: &mut Vec<TaskNode>) {
    nodes.retain(|node| !node.is_completed());
    for node in nodes.iter_mut() {
        retain_pending(&mut node.children);
    }
}

fn require_configured(dir: &Path) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = config_io::load_config(dir)?;
    if !config.google.is_configured() {
        return Err(format!(
            "[google] client_id/client_secret missing in {}",
            config_io::config_path(dir).display()
        )
        .into());
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskRecord;

    #[test]
    fn retain_pending_drops_completed_subtrees() {
        let mut roots = build_tree(vec![
            TaskRecord {
                position: Some("a".into()),
                ..TaskRecord::new("open")
            },
            TaskRecord {
                status: Some("completed".into()),
                position: Some("b".into()),
                ..TaskRecord::new("done")
            },
            TaskRecord {
                parent: Some("done".into()),
                ..TaskRecord::new("orphaned-by-filter")
            },
            TaskRecord {
                status: Some("completed".into()),
                parent: Some("open".into()),
                ..TaskRecord::new("done-child")
            },
        ]);
        retain_pending(&mut roots);

        let ids: Vec<&str> = roots.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["open"]);
        assert!(roots[0].children.is_empty());
    }
}
