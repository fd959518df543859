mod argument_parser;

use argument_parser::{Cli, Command, ScalarKind};
use chrono::{NaiveDate, NaiveDateTime};
use clap::Parser;
use dotenv::dotenv;
use log::{error, info};
use rust_decimal::Decimal;
use sqlite_helper::errors::Error;
use sqlite_helper::{SqliteConfig, SqliteHelper};
use std::fs;
use std::process::ExitCode;

fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let config = cli.apply_to(SqliteConfig::from_env()?);
    let mut helper = SqliteHelper::new(config)?;
    info!("Using `{}`", helper.connection_string());

    match cli.command {
        Command::Init {
            sql,
            file,
            drop_sql,
        } => {
            let sql = match (sql, file) {
                (Some(sql), _) => sql,
                (None, Some(file)) => fs::read_to_string(file)?,
                (None, None) => {
                    return Err(Error::invalid_arguments(
                        "init needs schema statements or --file",
                    ));
                }
            };
            helper.initialize_schema(&sql, drop_sql.as_deref())?;
            info!("Schema initialized");
        }
        Command::Exec { sql } => {
            let changed = helper.execute(&sql)?;
            info!("{changed} row(s) changed");
        }
        Command::Scalar { sql, kind } => {
            println!("{}", render_scalar(&mut helper, &sql, kind)?);
        }
        Command::Table { sql, name, pretty } => {
            let table = helper.query_table(&sql, &name)?;
            let json = if pretty {
                serde_json::to_string_pretty(&table)?
            } else {
                serde_json::to_string(&table)?
            };
            println!("{json}");
        }
    }
    Ok(())
}

fn render_scalar(helper: &mut SqliteHelper, sql: &str, kind: ScalarKind) -> Result<String, Error> {
    Ok(match kind {
        ScalarKind::Value => helper
            .query_value(sql)?
            .map(|v| v.to_string())
            .unwrap_or_default(),
        ScalarKind::Int => helper.query_scalar::<i32>(sql)?.to_string(),
        ScalarKind::Long => helper.query_scalar::<i64>(sql)?.to_string(),
        ScalarKind::Float => helper.query_scalar::<f32>(sql)?.to_string(),
        ScalarKind::Double => helper.query_scalar::<f64>(sql)?.to_string(),
        ScalarKind::Decimal => helper.query_scalar::<Decimal>(sql)?.to_string(),
        ScalarKind::Bool => helper.query_scalar::<bool>(sql)?.to_string(),
        ScalarKind::String => helper.query_scalar::<String>(sql)?,
        ScalarKind::Date => helper.query_scalar::<NaiveDate>(sql)?.to_string(),
        ScalarKind::DateTime => helper.query_scalar::<NaiveDateTime>(sql)?.to_string(),
    })
}
