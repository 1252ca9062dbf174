//! Bastion authorization checker
//!
//! Loads a service config and a JSON state fixture into an in-memory store,
//! then answers one authorization question.

use anyhow::{bail, Context, Result};
use bastion::{AuthApi, CallerContext, Config, MemoryStore, ProxyGate, Statement};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "bastion-check")]
#[command(about = "Answer authorization questions against a Bastion state fixture")]
struct Args {
    /// Path to the TOML service config
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Path to the JSON state fixture (users, groups, policies)
    #[arg(short = 's', long)]
    state: PathBuf,

    /// External identifier of the caller
    #[arg(short = 'u', long = "as")]
    caller: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Filter resource URNs by an action
    Resources {
        #[arg(short = 'a', long)]
        action: String,

        /// Resource URNs to check
        #[arg(required = true)]
        resources: Vec<String>,
    },

    /// Decide a proxied HTTP request
    Proxy {
        #[arg(short = 'm', long)]
        method: String,

        path: String,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct State {
    users: Vec<UserEntry>,
    groups: Vec<GroupEntry>,
    policies: Vec<PolicyEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserEntry {
    external_id: String,
    #[serde(default = "root_path")]
    path: String,
}

#[derive(Debug, Deserialize)]
struct GroupEntry {
    org: String,
    name: String,
    #[serde(default = "root_path")]
    path: String,
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    policies: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PolicyEntry {
    org: String,
    name: String,
    #[serde(default = "root_path")]
    path: String,
    statements: Vec<Statement>,
}

fn root_path() -> String {
    "/".to_string()
}

/// Populate the store through the management API so every record is validated
fn load_state(api: &AuthApi, path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading state fixture {}", path.display()))?;
    let state: State = serde_json::from_str(&raw)
        .with_context(|| format!("parsing state fixture {}", path.display()))?;

    let loader = CallerContext::admin("bastion-check");

    for user in &state.users {
        api.add_user(&loader, &user.external_id, &user.path)
            .with_context(|| format!("adding user {}", user.external_id))?;
    }
    for policy in state.policies {
        api.add_policy(&loader, &policy.org, &policy.name, &policy.path, policy.statements)
            .with_context(|| format!("adding policy {}/{}", policy.org, policy.name))?;
    }
    for group in &state.groups {
        api.add_group(&loader, &group.org, &group.name, &group.path)
            .with_context(|| format!("adding group {}/{}", group.org, group.name))?;
        for member in &group.members {
            api.add_member(&loader, member, &group.name, &group.org)
                .with_context(|| format!("adding {} to {}/{}", member, group.org, group.name))?;
        }
        for policy in &group.policies {
            api.attach_policy_to_group(&loader, &group.org, &group.name, policy)
                .with_context(|| format!("attaching {} to {}/{}", policy, group.org, group.name))?;
        }
    }

    info!(
        users = state.users.len(),
        groups = state.groups.len(),
        "state fixture loaded"
    );
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };

    let api = AuthApi::new(Arc::new(MemoryStore::new()));
    load_state(&api, &args.state)?;

    let caller = config.caller_for(&args.caller);

    match args.command {
        Command::Resources { action, resources } => {
            let allowed = api.authorized_external_resources(&caller, &action, resources)?;
            for urn in &allowed {
                println!("{}", urn);
            }
        }
        Command::Proxy { method, path } => {
            let gate = ProxyGate::new(api.engine().clone(), &config.proxy);
            let decision = gate.check(&caller, &method, &path);
            println!("{:?}", decision);
            if !decision.is_allowed() {
                bail!("request denied with status {}", decision.status_code());
            }
        }
    }

    Ok(())
}
