use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use roster_core::fields::list_columns;
use roster_core::{Employee, EmployeeId, SortDirection, SortKey, Status, StatusFilter, ViewMode};
use roster_forms::{submit_create, submit_update, EmployeeForm, SimulatedLatency, SubmitError};
use roster_persist::{default_db_path, MemoryStorage, SnapshotStorage, SqliteStorage};
use roster_store::{HydrateSource, RosterConfig, RosterStore};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "rosterctl", version, about = "Employee roster CLI")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    /// Snapshot database path (overrides ROSTER_DB_PATH)
    #[arg(long = "db", global = true)]
    db: Option<String>,

    /// Keep everything in memory; nothing is written to disk
    #[arg(long = "ephemeral", global = true, action = ArgAction::SetTrue)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(Subcommand, Debug)]
enum Commands {
    /// List one page of employees after filtering and sorting
    Ls {
        /// Free-text search over names, email, department and position
        #[arg(short = 's', long = "search", default_value = "")]
        search: String,
        /// Exact department
        #[arg(long = "dept")]
        department: Option<String>,
        /// all | active | inactive
        #[arg(long = "status", default_value = "all")]
        status: StatusFilter,
        /// Sort key, e.g. lastName or date_of_birth
        #[arg(long = "sort")]
        sort: Option<SortKey>,
        /// Sort descending
        #[arg(long = "desc", action = ArgAction::SetTrue)]
        desc: bool,
        /// 1-based page number; clamped to the last page
        #[arg(long = "page", default_value_t = 1)]
        page: usize,
        /// Override the view's page size
        #[arg(long = "per-page")]
        per_page: Option<usize>,
        /// list | grid
        #[arg(long = "view", default_value = "list")]
        view: ViewMode,
    },
    /// Add an employee
    Add(FormArgs),
    /// Edit an employee; omitted fields keep their current value
    Edit {
        id: EmployeeId,
        #[command(flatten)]
        form: FormArgs,
    },
    /// Delete employees by id
    Rm {
        #[arg(required = true)]
        ids: Vec<EmployeeId>,
    },
    /// Set the status of several employees
    Status {
        status: Status,
        #[arg(required = true)]
        ids: Vec<EmployeeId>,
    },
    /// Headcount, status split and average salary
    Stats,
    /// Search suggestions for a partial term
    Suggest {
        term: String,
    },
    /// Distinct departments and positions
    Facets,
    /// Drop all changes and restore the seed records
    Reset,
}

#[derive(Args, Debug, Default)]
struct FormArgs {
    #[arg(long = "first-name")]
    first_name: Option<String>,
    #[arg(long = "last-name")]
    last_name: Option<String>,
    /// YYYY-MM-DD
    #[arg(long = "employed")]
    date_of_employment: Option<String>,
    /// YYYY-MM-DD
    #[arg(long = "born")]
    date_of_birth: Option<String>,
    #[arg(long = "phone")]
    phone: Option<String>,
    #[arg(long = "email")]
    email: Option<String>,
    #[arg(long = "dept")]
    department: Option<String>,
    #[arg(long = "position")]
    position: Option<String>,
    #[arg(long = "salary")]
    salary: Option<String>,
    #[arg(long = "address")]
    address: Option<String>,
}

impl FormArgs {
    fn apply(self, form: &mut EmployeeForm) {
        let set = |slot: &mut String, v: Option<String>| {
            if let Some(v) = v {
                *slot = v;
            }
        };
        set(&mut form.first_name, self.first_name);
        set(&mut form.last_name, self.last_name);
        set(&mut form.date_of_employment, self.date_of_employment);
        set(&mut form.date_of_birth, self.date_of_birth);
        set(&mut form.phone, self.phone);
        set(&mut form.email, self.email);
        set(&mut form.department, self.department);
        set(&mut form.position, self.position);
        set(&mut form.salary, self.salary);
        set(&mut form.address, self.address);
    }
}

fn init_tracing() {
    let env = std::env::var("ROSTER_LOG").unwrap_or_else(|_| "warn".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("ROSTER_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid ROSTER_METRICS_ADDR; expected host:port");
        }
    }
}

fn open_storage(cli: &Cli, cfg: &RosterConfig) -> Result<Arc<dyn SnapshotStorage>> {
    if cli.ephemeral {
        return Ok(Arc::new(MemoryStorage::new()));
    }
    let path = cli.db.clone().or_else(|| cfg.db_path.clone()).unwrap_or_else(default_db_path);
    let storage = SqliteStorage::open(&path).with_context(|| format!("opening roster db {}", path))?;
    Ok(Arc::new(storage))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();
    let cfg = RosterConfig::from_env();

    let storage = open_storage(&cli, &cfg)?;
    let (mut store, source) = RosterStore::open(storage, cfg.page_sizes);
    match source {
        HydrateSource::Snapshot { records } => info!(records, "roster loaded from snapshot"),
        HydrateSource::Seed(reason) => info!(reason = ?reason, "roster seeded"),
    }

    let today = chrono::Local::now().date_naive();
    let latency = SimulatedLatency::new(cfg.submit_delay);
    let output = cli.output;

    match cli.command {
        Commands::Ls { search, department, status, sort, desc, page, per_page, view } => {
            info!(search = %search, dept = ?department, page, "ls invoked");
            store.set_view_mode(view);
            store.set_search(&search);
            store.set_department_filter(department.as_deref());
            store.set_status_filter(status);
            if let Some(key) = sort {
                let dir = if desc { SortDirection::Desc } else { SortDirection::Asc };
                store.set_sort_explicit(key, dir);
            }
            if let Some(n) = per_page {
                store.set_items_per_page(n);
            }
            store.set_page(page);
            let slice = store.visible_slice();
            match output {
                Output::Human => {
                    print_table(&slice.records);
                    println!(
                        "page {}/{} • {} of {} employees",
                        slice.current_page,
                        slice.total_pages,
                        slice.records.len(),
                        slice.total_count
                    );
                }
                Output::Json => println!("{}", serde_json::to_string_pretty(&slice)?),
            }
        }
        Commands::Add(args) => {
            let mut form = EmployeeForm::default();
            args.apply(&mut form);
            let done = report(submit_create(&mut store, &form, &latency, today).await)?;
            print_saved(output, &done.employee, done.navigate.path())?;
        }
        Commands::Edit { id, form: args } => {
            let mut form = match store.get(id) {
                Some(e) => EmployeeForm::from_employee(e),
                None => bail!("employee {} not found", id),
            };
            args.apply(&mut form);
            let done = report(submit_update(&mut store, id, &form, &latency, today).await)?;
            print_saved(output, &done.employee, done.navigate.path())?;
        }
        Commands::Rm { ids } => {
            let removed = store.delete_many(&ids);
            if removed < ids.len() {
                warn!(requested = ids.len(), removed, "some ids did not match a record");
            }
            match output {
                Output::Human => println!("removed {} employee(s)", removed),
                Output::Json => println!("{}", serde_json::json!({ "removed": removed })),
            }
        }
        Commands::Status { status, ids } => {
            let changed = store.set_status_many(&ids, status);
            match output {
                Output::Human => println!("{} employee(s) now {}", changed, status.as_str()),
                Output::Json => println!("{}", serde_json::json!({ "changed": changed, "status": status })),
            }
        }
        Commands::Stats => {
            let stats = store.stats();
            match output {
                Output::Human => {
                    println!("total     {}", stats.total);
                    println!("active    {}", stats.active);
                    println!("inactive  {}", stats.inactive);
                    println!("avg pay   {}", stats.average_salary);
                    for (dept, n) in &stats.by_department {
                        println!("  {:<16} {}", dept, n);
                    }
                }
                Output::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
            }
        }
        Commands::Suggest { term } => {
            let hits = store.suggestions(&term);
            match output {
                Output::Human => hits.iter().for_each(|s| println!("{}", s)),
                Output::Json => println!("{}", serde_json::to_string(&hits)?),
            }
        }
        Commands::Facets => {
            let departments = store.departments();
            let positions = store.positions();
            match output {
                Output::Human => {
                    println!("departments: {}", departments.join(", "));
                    println!("positions:   {}", positions.join(", "));
                }
                Output::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({ "departments": departments, "positions": positions }))?
                ),
            }
        }
        Commands::Reset => {
            store.reset_to_seed();
            match output {
                Output::Human => println!("restored {} seed employee(s)", store.records().len()),
                Output::Json => println!("{}", serde_json::json!({ "records": store.records().len() })),
            }
        }
    }

    if let Some(err) = store.last_persist_error() {
        warn!(error = %err, "changes were not saved");
        eprintln!("warning: changes were not saved: {}", err);
    }
    Ok(())
}

fn report<T>(res: std::result::Result<T, SubmitError>) -> Result<T> {
    match res {
        Ok(v) => Ok(v),
        Err(SubmitError::Invalid(errs)) => {
            for e in errs.iter() {
                eprintln!("  {}", e);
            }
            bail!("form rejected with {} error(s)", errs.len())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_saved(output: Output, e: &Employee, next: String) -> Result<()> {
    match output {
        Output::Human => println!("saved #{} {} → {}", e.id, e.full_name(), next),
        Output::Json => println!("{}", serde_json::to_string_pretty(e)?),
    }
    Ok(())
}

fn print_table(rows: &[Employee]) {
    let cols = list_columns();
    let header: Vec<String> = cols.iter().map(|c| format!("{:<w$}", c.label.to_uppercase(), w = c.width)).collect();
    println!("{}", header.join(" ").trim_end());
    for e in rows {
        let line: Vec<String> = cols
            .iter()
            .map(|c| format!("{:<w$}", clip(&c.key.value(e).render(), c.width), w = c.width))
            .collect();
        println!("{}", line.join(" ").trim_end());
    }
}

fn clip(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}
