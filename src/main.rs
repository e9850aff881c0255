use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sqlstencil::driver::{row_to_json, Rows, SqliteDriver};
use sqlstencil::settings::{Settings, DEFAULT_CONFIG_FILE};
use sqlstencil::template::Binding;
use sqlstencil::{Result, Session, Substitutions, Template};

const USAGE: &str = "\
usage: sqlstencil [--config <file>] <command>

commands:
    tables                          list tables
    columns <table>                 list the columns of a table
    select <table> [column ...]     print rows of a table
    run <template.sql> [key=value ...]
                                    compile and run a template; repeating a
                                    key binds it to a list
    script <file.sql>               run a schema script";

enum Command {
    Tables,
    Columns(String),
    Select(String, Vec<String>),
    Run(PathBuf, Vec<(String, String)>),
    Script(PathBuf),
}

fn parse_arguments(mut args: Vec<String>) -> Option<(PathBuf, Command)> {
    let mut config = PathBuf::from(DEFAULT_CONFIG_FILE);
    if args.first().map(String::as_str) == Some("--config") {
        if args.len() < 2 {
            return None;
        }
        config = PathBuf::from(args.remove(1));
        args.remove(0);
    }
    let mut args = args.into_iter();
    let command = match args.next()?.as_str() {
        "tables" => Command::Tables,
        "columns" => Command::Columns(args.next()?),
        "select" => Command::Select(args.next()?, args.collect()),
        "run" => {
            let path = PathBuf::from(args.next()?);
            let mut pairs = Vec::new();
            for arg in args {
                let (key, value) = arg.split_once('=')?;
                pairs.push((key.to_string(), value.to_string()));
            }
            Command::Run(path, pairs)
        }
        "script" => Command::Script(PathBuf::from(args.next()?)),
        _ => return None,
    };
    Some((config, command))
}

fn substitutions(pairs: Vec<(String, String)>) -> Substitutions {
    let mut request = Substitutions::new();
    for (key, value) in pairs {
        let binding = match request.get(&key) {
            None => Binding::Single(value),
            Some(existing) => {
                let mut items = existing.items().to_vec();
                items.push(value);
                Binding::List(items)
            }
        };
        request.insert(key, binding);
    }
    request
}

fn print_rows(rows: &Rows) -> Result<()> {
    for row in rows {
        println!("{}", row_to_json(row)?);
    }
    Ok(())
}

fn run(session: &mut Session<SqliteDriver>, command: Command) -> Result<()> {
    match command {
        Command::Tables => {
            for table in session.catalog().list_tables()? {
                println!("{table}");
            }
        }
        Command::Columns(table) => {
            for column in session.catalog().list_columns(&table)? {
                println!("{column}");
            }
        }
        Command::Select(table, columns) => {
            let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
            let columns = if columns.is_empty() { None } else { Some(columns.as_slice()) };
            print_rows(&session.catalog().select(&table, columns)?)?;
        }
        Command::Run(path, pairs) => {
            let template = Template::from_file(&path)?;
            match session.execute(&template, &substitutions(pairs))? {
                Some(rows) => print_rows(&rows)?,
                None => info!(template = %path.display(), "statement executed"),
            }
        }
        Command::Script(path) => {
            let script = std::fs::read_to_string(&path)?;
            session.catalog().create_tables(&script)?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let Some((config, command)) = parse_arguments(std::env::args().skip(1).collect()) else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };
    let settings = match Settings::load(&config) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log.filter)))
        .with_writer(std::io::stderr)
        .init();

    let result = settings.open_session().and_then(|mut session| run(&mut session, command));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            if e.is_composition() { ExitCode::from(2) } else { ExitCode::FAILURE }
        }
    }
}
