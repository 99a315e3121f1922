use cxxref_engine::diagnostic::Diagnostic;
use cxxref_engine::location::SourceSpan;
use cxxref_engine::query::MemberPath;
use cxxref_engine::symbols::{LError, Options, SymbolTable};
use cxxref_engine::syntax::TranslationUnit;
use cxxref_engine::{actions, finder, identifier};
use log::{info, LevelFilter};
use serde::de::DeserializeOwned;
use serde::Serialize;
use simple_logger::SimpleLogger;

const USAGE: &str = "usage: cxxref [--options <options.json>] <unit.json> <command>

commands:
    refs <Class::member[(params)] [const]>     references to a member
    name-range <Class::member[(params)] [const]>  name ranges of a member
    highlights                                 highlight ranges of the whole unit
    outside <line:col-line:col>                names in a selection declared outside of it
    unresolved                                 expressions that do not resolve
    dump                                       the syntax tree";

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{}", USAGE)]
    Usage,
    #[error("cannot read `{path}`: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("cannot parse `{path}`: {source}")]
    Parse { path: String, source: serde_json::Error },
    #[error("{0}")]
    Selection(String),
    #[error("cannot write result: {0}")]
    Write(#[from] serde_json::Error),
    #[error("{}", .0.locatee)]
    Engine(LError),
}

impl From<LError> for CliError {
    fn from(error: LError) -> Self {
        Self::Engine(error)
    }
}

struct Args {
    options: Option<String>,
    unit: String,
    command: String,
    target: Option<String>,
}

impl Args {
    fn parse() -> Result<Self, CliError> {
        let mut options = None;
        let mut positional = Vec::new();
        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            if arg == "--options" {
                options = Some(args.next().ok_or(CliError::Usage)?);
            } else {
                positional.push(arg);
            }
        }
        let mut positional = positional.into_iter();
        let unit = positional.next().ok_or(CliError::Usage)?;
        let command = positional.next().ok_or(CliError::Usage)?;
        let target = positional.next();
        if positional.next().is_some() {
            return Err(CliError::Usage);
        }
        Ok(Self { options, unit, command, target })
    }

    fn target(&self) -> Result<MemberPath, CliError> {
        let target = self.target.as_deref().ok_or(CliError::Usage)?;
        Ok(target.parse()?)
    }

    fn selection(&self) -> Result<SourceSpan, CliError> {
        let selection = self.target.as_deref().ok_or(CliError::Usage)?;
        selection.parse().map_err(CliError::Selection)
    }
}

fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, CliError> {
    let input = std::fs::read_to_string(path)
        .map_err(|source| CliError::Read { path: path.to_string(), source })?;
    serde_json::from_str(&input)
        .map_err(|source| CliError::Parse { path: path.to_string(), source })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn report(unit: &TranslationUnit, diagnostic: &Diagnostic) {
    match &unit.source {
        Some(source) => eprintln!("{}\n{}", "-".repeat(50), diagnostic.layout(source)),
        None => eprintln!("{}:{}", unit.file, diagnostic),
    }
}

fn execute(args: &Args, unit: &TranslationUnit, options: &Options) -> Result<(), CliError> {
    if args.command == "dump" {
        println!("{:?}", unit);
        return Ok(());
    }
    let table = SymbolTable::build_with(unit, options)?;
    match args.command.as_str() {
        "refs" => {
            let member = table.lookup_target(&args.target()?)?;
            for reference in finder::find_member_references(&table, member) {
                print_json(&serde_json::json!({
                    "span": reference.span,
                    "function": table.func_name(reference.function),
                    "access": reference.access,
                }))?;
            }
        }
        "name-range" => {
            let member = table.lookup_target(&args.target()?)?;
            for span in identifier::member_name_ranges(&table, member)? {
                print_json(&span)?;
            }
        }
        "highlights" => print_json(&actions::highlights(&table)?)?,
        "outside" => {
            let selection = args.selection()?;
            for reference in actions::references_outside_of_selection(&table, selection)? {
                print_json(&reference)?;
            }
        }
        "unresolved" => {
            for func in table.func_ids() {
                for unresolved in &table.resolve(func).unresolved {
                    print_json(&Diagnostic::from(unresolved))?;
                }
            }
        }
        _ => return Err(CliError::Usage),
    }
    Ok(())
}

fn run() -> Result<bool, CliError> {
    let args = Args::parse()?;
    let options = match &args.options {
        Some(path) => read_json(path)?,
        None => Options::default(),
    };
    let unit: TranslationUnit = read_json(&args.unit)?;
    info!("{}: {} declarations, {} tokens", unit.file, unit.decls.len(), unit.tokens.len());
    match execute(&args, &unit, &options) {
        Ok(()) => Ok(true),
        Err(CliError::Engine(error)) => {
            report(&unit, &Diagnostic::from(&error));
            Ok(false)
        }
        Err(error) => Err(error),
    }
}

fn main() {
    if let Err(error) = SimpleLogger::new().with_level(LevelFilter::Warn).env().init() {
        eprintln!("Cannot install logger: {}", error);
    }
    match run() {
        Ok(true) => {}
        Ok(false) => {
            eprintln!("\nThere were errors.");
            std::process::exit(1);
        }
        Err(error) => {
            eprintln!("Error: {}", error);
            std::process::exit(1);
        }
    }
}
