//! Command-line surface of the `syslab` binary
//!
//! Every subcommand except `serve` becomes a [`ToolCall`] so the CLI and
//! the tool loop share one dispatch path.

use crate::tools::ToolCall;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde_json::{json, Map, Value};

/// What the binary should do after argument parsing
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Run a single tool call and print its result
    Tool(ToolCall),
    /// Answer tool calls on stdin until EOF
    Serve,
}

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// `--request` is not valid JSON
    #[error("--request is not valid JSON: {0}")]
    InvalidRequest(#[source] serde_json::Error),

    /// `--request` parsed but is not an object
    #[error("--request must be a JSON object")]
    RequestNotObject,

    /// No subcommand given
    #[error("no subcommand given")]
    MissingSubcommand,
}

/// Build the clap command tree
#[must_use]
pub fn command() -> Command {
    Command::new("syslab")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Systems Lab artifact store and tool server")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("catalog").about("List every stored artifact"))
        .subcommand(
            Command::new("read")
                .about("Print a stored artifact or the catalog")
                .arg(
                    Arg::new("uri")
                        .required(true)
                        .help("syslab:// URI, or syslab://catalog"),
                ),
        )
        .subcommand(
            Command::new("simulate")
                .about("Run a system-dynamics simulation")
                .arg(
                    Arg::new("model")
                        .long("model")
                        .default_value("logistic")
                        .value_parser(["logistic", "bass"])
                        .help("Model to run"),
                )
                .arg(
                    Arg::new("param")
                        .long("param")
                        .action(ArgAction::Append)
                        .value_parser(parse_param)
                        .help("Model parameter as NAME=VALUE (repeatable)"),
                )
                .arg(
                    Arg::new("horizon-steps")
                        .long("horizon-steps")
                        .default_value("20")
                        .value_parser(value_parser!(u32))
                        .help("Number of integration steps"),
                )
                .arg(
                    Arg::new("dt")
                        .long("dt")
                        .default_value("1.0")
                        .value_parser(value_parser!(f64))
                        .help("Step size"),
                ),
        )
        .subcommand(
            Command::new("optimize")
                .about("Formulate, solve and trace a policy optimization job")
                .arg(
                    Arg::new("request")
                        .long("request")
                        .default_value("{}")
                        .help("Job request as a JSON object"),
                )
                .arg(
                    Arg::new("steps-max")
                        .long("steps-max")
                        .value_parser(value_parser!(u32))
                        .help("Maximum number of trace steps"),
                )
                .arg(
                    Arg::new("explain")
                        .long("explain")
                        .action(ArgAction::SetTrue)
                        .help("Write milestone summaries as sentences"),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export stored artifacts into an HTML notebook")
                .arg(Arg::new("title").long("title").required(true).help("Page title"))
                .arg(
                    Arg::new("section")
                        .long("section")
                        .action(ArgAction::Append)
                        .help("Artifact URI to include (repeatable)"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .default_value("html")
                        .help("Output format"),
                ),
        )
        .subcommand(Command::new("serve").about("Answer JSON tool calls on stdin, one per line"))
}

/// Parse `NAME=VALUE` into a named number
///
/// # Errors
/// Returns a message if the `=` is missing, the name is empty or the value
/// is not a number
pub fn parse_param(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty parameter name in '{raw}'"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("parameter {name} is not a number: '{value}'"))?;
    Ok((name.to_string(), value))
}

/// Turn parsed arguments into an [`Action`]
///
/// # Errors
/// Returns error if `--request` is not a JSON object or no subcommand was
/// given
pub fn action(matches: &ArgMatches) -> Result<Action, CliError> {
    let (tool, arguments) = match matches.subcommand() {
        Some(("serve", _)) => return Ok(Action::Serve),
        Some(("catalog", _)) => ("syslab.catalog", json!({})),
        Some(("read", args)) => ("syslab.read", json!({ "uri": string(args, "uri") })),
        Some(("simulate", args)) => {
            let params: Map<String, Value> = args
                .get_many::<(String, f64)>("param")
                .into_iter()
                .flatten()
                .map(|(name, value)| (name.clone(), json!(value)))
                .collect();
            let arguments = json!({
                "model": string(args, "model"),
                "params": params,
                "horizon_steps": args.get_one::<u32>("horizon-steps").copied().unwrap_or(20),
                "dt": args.get_one::<f64>("dt").copied().unwrap_or(1.0),
            });
            ("sd.run_simulation", arguments)
        }
        Some(("optimize", args)) => {
            let raw = string(args, "request");
            let mut request: Value = serde_json::from_str(&raw).map_err(CliError::InvalidRequest)?;
            let object = request.as_object_mut().ok_or(CliError::RequestNotObject)?;
            if let Some(steps) = args.get_one::<u32>("steps-max") {
                object.insert("stepsMax".to_string(), json!(steps));
            }
            if args.get_flag("explain") {
                object.insert("explainForHumans".to_string(), json!(true));
            }
            ("or.optimize_policy_seq", request)
        }
        Some(("export", args)) => {
            let sections: Vec<String> = args
                .get_many::<String>("section")
                .into_iter()
                .flatten()
                .cloned()
                .collect();
            let arguments = json!({
                "title": string(args, "title"),
                "sections": sections,
                "format": string(args, "format"),
            });
            ("pack.export_notebook", arguments)
        }
        _ => return Err(CliError::MissingSubcommand),
    };
    Ok(Action::Tool(ToolCall {
        tool: tool.to_string(),
        arguments,
    }))
}

fn string(args: &ArgMatches, id: &str) -> String {
    args.get_one::<String>(id).cloned().unwrap_or_default()
}
