//! amdash: command-line and IPC front end for the account-manager dashboard.
//!
//! Usage:
//!   amdash migrate                      [--db dashboard.db]
//!   amdash seed   --seed 42 --months 3 --last 2025-12
//!   amdash import rows.json
//!   amdash sign-in --email a@b.com --name "A B"
//!   amdash metrics --email a@b.com [--id 3 | --ids 1,2] [--start 2025-10] [--end 2025-12]
//!   amdash --ipc-mode                   (JSON lines on stdin/stdout)

use amdash_core::{
    config::{DashConfig, ManagementAllowList},
    dashboard::{home_route, Dashboard, MetricsQuery},
    error::AccessError,
    identity::{IdentityAssertion, IdentityResolver},
    import,
    month::{Month, MonthRange},
    policy::RequestedScope,
    seed,
    store::DashStore,
    types::AccountManagerId,
};
use anyhow::{bail, Result};
use chrono::{Datelike, Utc};
use std::env;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    SignIn {
        assertion: IdentityAssertion,
    },
    Refresh {
        email: String,
        #[serde(default)]
        name: Option<String>,
    },
    GetMetrics {
        email: Option<String>,
        #[serde(default)]
        query: MetricsQuery,
    },
    AmView {
        email: Option<String>,
        selected: Option<AccountManagerId>,
        #[serde(default)]
        range: MonthRange,
    },
    ManagementView {
        email: Option<String>,
        #[serde(default)]
        selected: Vec<AccountManagerId>,
        #[serde(default)]
        range: MonthRange,
    },
    ReloadAllowList,
    Quit,
}

struct App {
    store: DashStore,
    allow_list: Arc<ManagementAllowList>,
    data_dir: String,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let data_dir = flag_value(&args, "--data-dir").unwrap_or("./data").to_string();
    let config = match DashConfig::load(&data_dir) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("{e}; falling back to defaults with an empty allow-list");
            DashConfig {
                database: "dashboard.db".into(),
                management_emails: Vec::new(),
            }
        }
    };
    let db = flag_value(&args, "--db").unwrap_or(&config.database).to_string();

    let store = DashStore::open(&db)?;
    store.migrate()?;
    let app = App {
        store,
        allow_list: Arc::new(ManagementAllowList::from_config(&config)),
        data_dir,
    };

    if args.iter().any(|a| a == "--ipc-mode") {
        return run_ipc_loop(&app);
    }

    match args.get(1).map(String::as_str) {
        Some("migrate") => println!("Migrations applied to {db}"),
        Some("seed") => run_seed(&app, &args)?,
        Some("import") => {
            let Some(path) = args.get(2) else {
                bail!("Usage: amdash import ./path/to/rows.json");
            };
            let summary = import::import_file(&app.store, path)?;
            println!(
                "Imported {} rows from {path} ({} skipped)",
                summary.imported, summary.skipped
            );
        }
        Some("sign-in") => {
            let assertion = IdentityAssertion {
                email: flag_value(&args, "--email").map(str::to_string),
                name: flag_value(&args, "--name").map(str::to_string),
                ..IdentityAssertion::default()
            };
            let principal = app.resolver().sign_in(&assertion)?;
            println!("{}", serde_json::to_string_pretty(&principal)?);
            println!("route: {:?}", home_route(Some(&principal)));
        }
        Some("metrics") => run_metrics(&app, &args)?,
        _ => {
            println!("amdash: account-manager dashboard");
            println!("  commands: migrate | seed | import <file> | sign-in | metrics | --ipc-mode");
        }
    }
    Ok(())
}

impl App {
    fn resolver(&self) -> IdentityResolver<'_> {
        IdentityResolver::new(&self.store, Arc::clone(&self.allow_list))
    }

    fn dashboard(&self) -> Dashboard<'_> {
        Dashboard::new(&self.store)
    }
}

fn run_seed(app: &App, args: &[String]) -> Result<()> {
    let seed_value = parse_arg(args, "--seed", 42u64);
    let months = parse_arg(args, "--months", 3usize);
    let last = match flag_value(args, "--last") {
        Some(raw) => raw.parse::<Month>()?,
        None => {
            let today = Utc::now().date_naive();
            Month::new(today.year(), today.month())?.pred()
        }
    };
    let summary = seed::seed_demo_data(&app.store, seed_value, last, months)?;
    println!(
        "Seeded {} account managers, {} metric rows (last month {last})",
        summary.account_managers, summary.rows
    );
    Ok(())
}

fn run_metrics(app: &App, args: &[String]) -> Result<()> {
    let principal = match flag_value(args, "--email") {
        Some(email) => Some(app.resolver().materialize(email)?),
        None => None,
    };
    let scope = RequestedScope::from_params(flag_value(args, "--id"), flag_value(args, "--ids"));
    let query = MetricsQuery {
        scope,
        range: parse_range(args)?,
    };
    match app.dashboard().aggregate_metrics(principal.as_ref(), &query) {
        Ok((response, aggregation)) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            println!("{}", serde_json::to_string_pretty(&aggregation)?);
        }
        Err(e) => {
            log_access_error(&e);
            println!("{}", error_json(&e));
        }
    }
    Ok(())
}

fn run_ipc_loop(app: &App) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string(), "status": 400 });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        if matches!(cmd, IpcCommand::Quit) {
            break;
        }
        let reply = handle_command(app, cmd)?;
        writeln!(stdout, "{reply}")?;
        stdout.flush()?;
    }
    Ok(())
}

/// Access failures become error payloads; only I/O and serialization
/// failures abort the loop.
fn handle_command(app: &App, cmd: IpcCommand) -> Result<serde_json::Value> {
    let reply = match cmd {
        IpcCommand::SignIn { assertion } => match app.resolver().sign_in(&assertion) {
            Ok(principal) => serde_json::json!({
                "principal": principal,
                "route": home_route(Some(&principal)),
            }),
            Err(e) => serde_json::json!({ "error": e.to_string(), "status": 401 }),
        },
        IpcCommand::Refresh { email, name } => {
            match app.resolver().refresh_session(&email, name.as_deref()) {
                Ok(claims) => serde_json::to_value(claims)?,
                Err(e) => error_json(&e),
            }
        }
        IpcCommand::GetMetrics { email, query } => {
            respond(with_principal(app, email.as_deref()).and_then(|p| {
                app.dashboard().get_metrics(p.as_ref(), &query)
            }))?
        }
        IpcCommand::AmView { email, selected, range } => {
            respond(with_principal(app, email.as_deref()).and_then(|p| {
                app.dashboard().account_manager_view(p.as_ref(), selected, range)
            }))?
        }
        IpcCommand::ManagementView { email, selected, range } => {
            respond(with_principal(app, email.as_deref()).and_then(|p| {
                app.dashboard().management_view(p.as_ref(), &selected, range)
            }))?
        }
        IpcCommand::ReloadAllowList => match app.allow_list.reload(&app.data_dir) {
            Ok(count) => serde_json::json!({ "reloaded": count }),
            Err(e) => serde_json::json!({ "error": e.to_string(), "status": 500 }),
        },
        IpcCommand::Quit => serde_json::Value::Null,
    };
    Ok(reply)
}

/// Materialize the session principal, if the caller has one.
fn with_principal(
    app: &App,
    email: Option<&str>,
) -> Result<Option<amdash_core::principal::Principal>, AccessError> {
    email.map(|e| app.resolver().materialize(e)).transpose()
}

fn respond<T: serde::Serialize>(result: Result<T, AccessError>) -> Result<serde_json::Value> {
    match result {
        Ok(value) => Ok(serde_json::to_value(value)?),
        Err(e) => {
            log_access_error(&e);
            Ok(error_json(&e))
        }
    }
}

fn error_json(e: &AccessError) -> serde_json::Value {
    serde_json::json!({ "error": e.to_string(), "status": e.status_code() })
}

fn log_access_error(e: &AccessError) {
    match e {
        AccessError::Forbidden { .. } => log::error!("Access refused: {e}"),
        AccessError::Internal(inner) => log::error!("Error fetching metrics: {inner}"),
        _ => log::warn!("Access refused: {e}"),
    }
}

fn parse_range(args: &[String]) -> Result<MonthRange> {
    let start = flag_value(args, "--start").map(str::parse::<Month>).transpose()?;
    let end = flag_value(args, "--end").map(str::parse::<Month>).transpose()?;
    Ok(MonthRange { start, end })
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    flag_value(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
