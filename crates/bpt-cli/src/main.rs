use anyhow::Context;
use bpt_cli::{BptConfig, Mode, Pipeline, Report};
use bpt_model::Process;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn process_arg() -> Arg {
    Arg::new("process")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Process description (.json, .yaml or .yml)")
}

fn cli() -> Command {
    Command::new("bpt")
        .version(bpt_cli::VERSION)
        .about("Scenario tests for event-sourced applications")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file (default: ./bpt.toml if present)"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print the report as JSON"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .global(true)
                .default_value("text")
                .value_parser(["text", "json"])
                .help("Log line format on stderr"),
        )
        .subcommand(
            Command::new("validate")
                .about("Check the process description itself")
                .arg(process_arg()),
        )
        .subcommand(
            Command::new("gather")
                .about("Print the gathered assertions as JSON")
                .arg(process_arg()),
        )
        .subcommand(
            Command::new("static")
                .about("Confirm the application sources")
                .arg(process_arg()),
        )
        .subcommand(
            Command::new("dynamic")
                .about("Run the scenarios against the live application")
                .arg(process_arg()),
        )
        .subcommand(
            Command::new("check")
                .about("Static and dynamic confirmation")
                .arg(process_arg()),
        )
}

fn init_tracing(format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn print_report(report: &Report, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", report.render_json()?);
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}

/// `Ok(true)` when every stage that ran passed
async fn run(matches: &ArgMatches) -> anyhow::Result<bool> {
    let json = matches.get_flag("json");
    let (name, args) = matches.subcommand().context("no subcommand given")?;
    let process_path = args
        .get_one::<PathBuf>("process")
        .context("no process file given")?;

    let config = BptConfig::discover(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))
        .context("loading configuration")?;
    let process = Process::load(process_path)
        .with_context(|| format!("loading {}", process_path.display()))?;
    let pipeline = Pipeline::new(config);

    let mode = match name {
        "validate" => Mode::Validate,
        "static" => Mode::Static,
        "dynamic" => Mode::Dynamic,
        "check" => Mode::Check,
        "gather" => {
            return match pipeline.assertions(&process) {
                Ok(assertions) => {
                    println!("{}", serde_json::to_string_pretty(&assertions)?);
                    Ok(true)
                }
                Err(report) => {
                    print_report(&report, json)?;
                    Ok(false)
                }
            };
        }
        other => anyhow::bail!("unknown subcommand {other}"),
    };

    let report = pipeline.run(&process, mode).await?;
    print_report(&report, json)?;
    Ok(report.valid)
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    let log_format = matches
        .get_one::<String>("log-format")
        .map_or("text", String::as_str);
    init_tracing(log_format);

    match run(&matches).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let matches = cli()
            .try_get_matches_from(["bpt", "static", "order.yaml", "--json", "-c", "bpt.toml"])
            .unwrap();
        assert!(matches.get_flag("json"));
        assert_eq!(
            matches.get_one::<PathBuf>("config").unwrap(),
            &PathBuf::from("bpt.toml")
        );
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "static");
        assert_eq!(
            args.get_one::<PathBuf>("process").unwrap(),
            &PathBuf::from("order.yaml")
        );
    }

    #[test]
    fn subcommand_is_required() {
        assert!(cli().try_get_matches_from(["bpt"]).is_err());
    }
}
