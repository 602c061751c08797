//! MedTech admin console
//!
//! Line-oriented client for the clinic REST API: authenticates, persists the
//! session between invocations, and exposes one thin command per resource.
//! All request plumbing — token attachment, the single-flight refresh, the
//! one-shot replay, the logout cascade — lives in `medtech-client`; this
//! binary is just the shell around it.

mod config;

use anyhow::{Context, Result, bail};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use common::Secret;
use medtech_auth::{Role, SessionFile};
use medtech_client::api::appointments::ListAppointments;
use medtech_client::api::patients::ListPatients;
use medtech_client::api::records::ListRecords;
use medtech_client::api::users::ListUsers;
use medtech_client::{ApiClient, Redirect};

use crate::config::Config;

/// Console rendition of the login redirect. There is no router to push, so
/// "navigating to the unauthenticated entry point" is a message telling the
/// operator how to get back in.
struct LoginNotice;

impl Redirect for LoginNotice {
    fn to_login(&self) {
        eprintln!("session expired — run `medtech-console login <email>` to sign in again");
    }
}

/// Split CLI args into the optional `--config <path>` pair and the
/// positional command words.
fn parse_cli(args: &[String]) -> (Option<String>, Vec<String>) {
    let mut config_path = None;
    let mut positional = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            config_path = iter.next().cloned();
        } else {
            positional.push(arg.clone());
        }
    }
    (config_path, positional)
}

/// Value of `--<name> <value>` among the command words, if present.
fn flag(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn flag_u32(args: &[String], name: &str) -> Option<u32> {
    flag(args, name).and_then(|v| v.parse().ok())
}

fn usage() -> &'static str {
    "usage: medtech-console [--config <path>] <command>\n\
     commands:\n\
       login <email>                      password via MEDTECH_PASSWORD\n\
       whoami\n\
       patients [--search q] [--page n] [--limit n] [--gender g]\n\
       users [--search q]                 admin only\n\
       appointments [--patient id] [--doctor id] [--status s] [--from d] [--to d]\n\
       records <patient-id> [--limit n] [--offset n]\n\
       logout"
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (cli_config_path, command) = parse_cli(&args);

    let config_path = Config::resolve_path(cli_config_path.as_deref());
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let client = ApiClient::new(config.client_config(), Box::new(LoginNotice))?;
    let session_file = SessionFile::new(config.session.dir.clone());

    // Restore a persisted session; failing that, try one silent refresh.
    if let Some(credential) = session_file.load().await? {
        client
            .store()
            .set(credential.access_token, credential.identity)
            .await;
    } else if client.bootstrap().await {
        debug!("session restored via silent refresh");
    }

    let outcome = run_command(&client, &command).await;

    // Persist whatever session state the command left behind.
    match client.store().get().await {
        Some(credential) => session_file.save(&credential).await?,
        None => session_file.remove().await?,
    }

    outcome
}

async fn run_command(client: &ApiClient, args: &[String]) -> Result<()> {
    let Some(command) = args.first() else {
        bail!("{}", usage());
    };

    match command.as_str() {
        "login" => {
            let email = args.get(1).with_context(|| usage().to_string())?;
            let password = std::env::var("MEDTECH_PASSWORD")
                .context("set MEDTECH_PASSWORD to log in")?;
            let identity = client.login(email, &Secret::new(password)).await?;
            println!(
                "logged in as {} ({}) — landing at {}",
                identity.email,
                identity.role.label(),
                identity.role.landing_path()
            );
        }
        "whoami" => {
            let Some(identity) = client.store().identity().await else {
                bail!("not logged in");
            };
            println!("{}", serde_json::to_string_pretty(&identity)?);
        }
        "patients" => {
            require_role(client, &[Role::Admin, Role::Doctor, Role::Reception]).await?;
            let params = ListPatients {
                page: flag_u32(args, "--page"),
                limit: flag_u32(args, "--limit"),
                search: flag(args, "--search"),
                gender: flag(args, "--gender"),
                ..Default::default()
            };
            let page = client.patients().list(&params).await?;
            println!("{}", serde_json::to_string_pretty(&page.items)?);
            eprintln!("{} of {} patients", page.items.len(), page.total);
        }
        "users" => {
            require_role(client, &[Role::Admin]).await?;
            let params = ListUsers {
                search: flag(args, "--search"),
                ..Default::default()
            };
            let page = client.users().list(&params).await?;
            println!("{}", serde_json::to_string_pretty(&page.items)?);
            eprintln!("{} of {} users", page.items.len(), page.total);
        }
        "appointments" => {
            require_role(client, &[Role::Admin, Role::Doctor, Role::Reception]).await?;
            let params = ListAppointments {
                page: flag_u32(args, "--page"),
                limit: flag_u32(args, "--limit"),
                patient_id: flag(args, "--patient"),
                doctor_id: flag(args, "--doctor"),
                status: flag(args, "--status"),
                start_date: flag(args, "--from"),
                end_date: flag(args, "--to"),
                ..Default::default()
            };
            let page = client.appointments().list(&params).await?;
            println!("{}", serde_json::to_string_pretty(&page.items)?);
            eprintln!("{} of {} appointments", page.items.len(), page.total);
        }
        "records" => {
            require_role(client, &[Role::Admin, Role::Doctor]).await?;
            let patient_id = args.get(1).with_context(|| usage().to_string())?;
            let params = ListRecords {
                limit: flag_u32(args, "--limit"),
                offset: flag_u32(args, "--offset"),
            };
            let page = client.records().list(patient_id, &params).await?;
            println!("{}", serde_json::to_string_pretty(&page.items)?);
        }
        "logout" => {
            client.logout().await;
            println!("logged out");
        }
        other => bail!("unknown command: {other}\n{}", usage()),
    }
    Ok(())
}

/// Command-level route guard: a predicate over the identity in the store.
async fn require_role(client: &ApiClient, allowed: &[Role]) -> Result<()> {
    let Some(identity) = client.store().identity().await else {
        bail!("not logged in");
    };
    if !identity.permitted(allowed) {
        bail!(
            "the {} role may not use this command",
            identity.role.label()
        );
    }
    Ok(())
}
