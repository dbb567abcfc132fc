use std::fs;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_geneset_resolver::config::{ConfigLoader, ResolvedConfig};
use kira_geneset_resolver::error::KiraError;
use kira_geneset_resolver::identifier::{Identifier, Scopes};
use kira_geneset_resolver::lookup::GeneLookup;
use kira_geneset_resolver::mygene::MyGeneHttpClient;
use kira_geneset_resolver::output::{ConversionReport, JsonOutput};
use kira_geneset_resolver::species::Species;

#[derive(Parser)]
#[command(name = "kira-gsr")]
#[command(about = "Resolve gene identifiers against mygene.info and convert them across species")]
#[command(version, author)]
struct Cli {
    /// Path to kira-gsr.json (defaults to ./kira-gsr.json when present)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Resolve identifiers to canonical genes")]
    Resolve(ResolveArgs),
    #[command(about = "Convert identifiers to their orthologs in another species")]
    Convert(ConvertArgs),
}

#[derive(Args)]
struct InputArgs {
    /// Identifiers; fallback columns are separated by '|'
    ids: Vec<String>,

    /// File with one identifier per line
    #[arg(long)]
    input: Option<Utf8PathBuf>,

    /// Scope per fallback column, in order of authority
    #[arg(long = "scopes")]
    scopes: Vec<String>,
}

#[derive(Args)]
struct ResolveArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Taxid, common name or comma-separated taxids
    #[arg(long)]
    species: Option<String>,
}

#[derive(Args)]
struct ConvertArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Target species (exactly one)
    #[arg(long)]
    to: String,

    /// Source species
    #[arg(long, default_value = "all")]
    from: String,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(kira) = report.downcast_ref::<KiraError>() {
            return ExitCode::from(map_exit_code(kira));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &KiraError) -> u8 {
    match error {
        _ if error.is_invalid_input() => 2,
        KiraError::ProviderHttp(_) | KiraError::ProviderStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let client = MyGeneHttpClient::with_settings(&config.provider)?;

    match cli.command {
        Commands::Resolve(args) => {
            let ids = read_identifiers(&args.input)?;
            let scopes = resolve_scopes(&args.input, &config)?;
            let species = match args.species.as_deref() {
                Some(value) => value.parse::<Species>()?,
                None => config.species.clone(),
            };
            let mut lookup = GeneLookup::new(client, species).with_fields(config.field_set());
            lookup.resolve(&ids, &scopes)?;
            let result = lookup.results(&ids)?;
            JsonOutput::print_result(&result).into_diagnostic()?;
        }
        Commands::Convert(args) => {
            let ids = read_identifiers(&args.input)?;
            let scopes = resolve_scopes(&args.input, &config)?;
            let target = args.to.parse::<Species>()?;
            let source = args.from.parse::<Species>()?;
            let mut lookup =
                GeneLookup::new(client, source.clone()).with_fields(config.field_set());
            let mappings = lookup.convert(&ids, &scopes, &target, &source)?;
            let result = lookup.results(&ids)?;
            JsonOutput::print_conversion(&ConversionReport::new(&mappings, &result))
                .into_diagnostic()?;
        }
    }
    Ok(())
}

fn read_identifiers(args: &InputArgs) -> Result<Vec<Identifier>, KiraError> {
    let mut lines = args.ids.clone();
    if let Some(path) = &args.input {
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|err| KiraError::Filesystem(format!("read {path}: {err}")))?;
        lines.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string),
        );
    }
    lines.iter().map(|line| line.parse()).collect()
}

fn resolve_scopes(args: &InputArgs, config: &ResolvedConfig) -> Result<Scopes, KiraError> {
    if !args.scopes.is_empty() {
        return Scopes::from_list(args.scopes.clone());
    }
    config.scopes.clone().ok_or_else(|| {
        KiraError::InvalidIdentifiers(
            "no scopes given (use --scopes or set scopes in kira-gsr.json)".to_string(),
        )
    })
}
