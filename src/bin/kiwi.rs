//! kiwi: run injection-safe statements from the shell.
//!
//! # Usage
//!
//! ```bash
//! # Fetch rows
//! kiwi select accounts -c account_id,login -w "login = 'bob123'"
//!
//! # Show the statement only
//! kiwi --dry-run update sessions "last_activity={CURRENT_TIMESTAMP}" -w "session_id = 4"
//!
//! # Compile a condition expression
//! kiwi explain "a <= 10 & b !% 'aaaa' | c IS NULL"
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use kiwi::prelude::*;
use kiwi::transpiler::Statement;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kiwi")]
#[command(version)]
#[command(about = "🥝 Injection-safe statements for MySQL and SQLite", long_about = None)]
#[command(after_help = "EXAMPLES:
    kiwi select accounts -c login,email -w \"login = 'bob123'\"
    kiwi insert accounts \"login=bob123, email='b@x.com'\"
    kiwi --dry-run delete sessions -w \"expires < 1700000000\"
    kiwi explain \"seats >= 40 | number % '1%'\"")]
struct Cli {
    /// Path to kiwi.toml (default: ./kiwi.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database connection URL, overrides the [database] section
    #[arg(long, env = "KIWI_DATABASE_URL", global = true)]
    database_url: Option<String>,

    /// Don't execute, just show the generated SQL
    #[arg(short, long, global = true)]
    dry_run: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch matching rows
    Select {
        table: String,
        /// Columns to fetch
        #[arg(short, long, value_delimiter = ',', required = true)]
        columns: Vec<String>,
        /// Condition expression
        #[arg(short = 'w', long = "where")]
        conditions: Option<String>,
        /// Only the first matching row
        #[arg(long)]
        one: bool,
    },
    /// Insert one row from a `col=value, ...` list
    Insert { table: String, fields: String },
    /// Update matching rows
    Update {
        table: String,
        fields: String,
        #[arg(short = 'w', long = "where", required = true)]
        conditions: String,
    },
    /// Delete matching rows
    Delete {
        table: String,
        #[arg(short = 'w', long = "where", required = true)]
        conditions: String,
    },
    /// Compile a condition expression without connecting
    Explain { conditions: String },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "kiwi=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::discover()?,
    };

    if let Commands::Explain { conditions } = &cli.command {
        return explain(conditions);
    }

    let statement = build(&cli.command, &config)?;
    if cli.verbose || cli.dry_run {
        print_statement(&statement);
    }
    if cli.dry_run {
        return Ok(());
    }

    let options = match &cli.database_url {
        Some(url) => ConnectOptions::url(url),
        None => config.database.options(),
    };
    if cli.verbose {
        println!("{} {}", "Connecting to:".dimmed(), options);
    }

    let mut db = Database::new()?;
    db.connect_with(options).context("could not connect")?;
    execute(&mut db, &cli.command, &config, &cli.format)?;
    db.disconnect()?;
    Ok(())
}

/// Compile the subcommand to its statement, for display.
fn build(command: &Commands, config: &Config) -> KiwiResult<Statement> {
    let tables = &config.tables;
    match command {
        Commands::Select {
            table,
            columns,
            conditions,
            one,
        } => {
            let cond = parse_conditions(conditions.as_deref().unwrap_or(""))?;
            if *one {
                select_one_sql(tables.resolve(table), columns, &cond)
            } else {
                select_sql(tables.resolve(table), columns, &cond)
            }
        }
        Commands::Insert { table, fields } => insert_sql(tables.resolve(table), &parse_fields(fields)?),
        Commands::Update {
            table,
            fields,
            conditions,
        } => update_sql(
            tables.resolve(table),
            &parse_fields(fields)?,
            &parse_conditions(conditions)?,
        ),
        Commands::Delete { table, conditions } => {
            delete_sql(tables.resolve(table), &parse_conditions(conditions)?)
        }
        Commands::Explain { .. } => Err(KiwiError::invalid("explain has no statement")),
    }
}

fn execute(
    db: &mut Database,
    command: &Commands,
    config: &Config,
    format: &OutputFormat,
) -> KiwiResult<()> {
    let tables = &config.tables;
    match command {
        Commands::Select {
            table,
            columns,
            conditions,
            one,
        } => {
            let cond = parse_conditions(conditions.as_deref().unwrap_or(""))?;
            let rows = if *one {
                db.select_one(tables.resolve(table), columns, &cond)?
                    .into_iter()
                    .collect()
            } else {
                db.select(tables.resolve(table), columns, &cond)?
            };
            format_output(&rows, columns, format);
        }
        Commands::Insert { table, fields } => {
            match db.insert(tables.resolve(table), &parse_fields(fields)?)? {
                Some(id) => println!("{} inserted row {}", "✓".green(), id.to_string().cyan()),
                None => println!("{} nothing inserted (duplicate key)", "!".yellow()),
            }
        }
        Commands::Update {
            table,
            fields,
            conditions,
        } => {
            let affected = db.update(
                tables.resolve(table),
                &parse_fields(fields)?,
                &parse_conditions(conditions)?,
            )?;
            println!("{} {} rows affected", "✓".green(), affected);
        }
        Commands::Delete { table, conditions } => {
            let affected = db.delete(tables.resolve(table), &parse_conditions(conditions)?)?;
            println!("{} {} rows affected", "✓".green(), affected);
        }
        Commands::Explain { .. } => {}
    }
    Ok(())
}

fn print_statement(statement: &Statement) {
    println!("{}", "Generated SQL:".green().bold());
    println!("  {}", statement.sql.white());
    if !statement.params.is_empty() {
        println!("{}", "Bindings:".cyan());
        for (i, param) in statement.params.iter().enumerate() {
            println!(
                "  {} {} = {}",
                format!("#{}", i + 1).dimmed(),
                param.format_code().to_string().dimmed(),
                param.to_string().yellow()
            );
        }
    }
    println!();
}

fn explain(expression: &str) -> anyhow::Result<()> {
    println!("{}", "🥝 Condition Explanation".cyan().bold());
    println!();
    println!("{} {}", "Expression:".dimmed(), expression.yellow());
    println!();

    let condition = parse_conditions(expression)?;
    println!("{}", "Parsed Tree:".green().bold());
    print_tree(&condition, 1);

    let fragment = compile_conditions(&condition)?;
    println!();
    println!("{}", "Generated WHERE:".green().bold());
    if fragment.is_empty() {
        println!("  {}", "(none)".dimmed());
    } else {
        println!("  {}", fragment.sql.white());
    }
    println!("{} {}", "Format:".dimmed(), fragment.format().cyan());
    Ok(())
}

fn print_tree(condition: &Condition, depth: usize) {
    let indent = "  ".repeat(depth);
    match condition {
        Condition::Compare { column, op, value } => println!(
            "{}• {} {} {}",
            indent,
            column.white(),
            op.to_string().cyan(),
            value.to_string().yellow()
        ),
        Condition::IsNull(column) => {
            println!("{}• {} {}", indent, column.white(), "IS NULL".cyan())
        }
        Condition::And(children) | Condition::Or(children) => {
            let label = if matches!(condition, Condition::And(_)) {
                "AND"
            } else {
                "OR"
            };
            println!("{}{}", indent, label.magenta().bold());
            for child in children {
                print_tree(child, depth + 1);
            }
        }
    }
}

fn format_output(rows: &[Row], columns: &[String], format: &OutputFormat) {
    if rows.is_empty() {
        println!("{}", "(no results)".dimmed());
        return;
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(rows).unwrap_or_default());
        }
        OutputFormat::Table => {
            // Requested column order, not hash order
            let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
            for row in rows {
                for (w, col) in widths.iter_mut().zip(columns) {
                    let len = row.get(col).map(val_to_string).unwrap_or_default().len();
                    *w = (*w).max(len);
                }
            }

            let header: Vec<String> = columns
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:width$}", c, width = *w))
                .collect();
            println!("{}", header.join(" │ ").white().bold());

            let sep: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
            println!("{}", sep.join("─┼─").dimmed());

            for row in rows {
                let cells: Vec<String> = columns
                    .iter()
                    .zip(&widths)
                    .map(|(c, w)| {
                        let val = row.get(c).map(val_to_string).unwrap_or_default();
                        format!("{:width$}", val, width = *w)
                    })
                    .collect();
                println!("{}", cells.join(" │ "));
            }

            println!();
            println!("{} row(s) returned", rows.len().to_string().cyan());
        }
    }
}

fn val_to_string(val: &serde_json::Value) -> String {
    match val {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.clone(),
        _ => val.to_string(),
    }
}
