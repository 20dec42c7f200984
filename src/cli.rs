use std::path::PathBuf;

use clap::{ArgAction, ArgGroup, Parser};

/// Render a Jinja2 template with variables from JSON files, inline
/// assignments, S3 objects and SSM parameters.
#[derive(Debug, Parser)]
#[command(version, about, arg_required_else_help = true, disable_version_flag = true)]
#[command(group(
    ArgGroup::new("variables")
        .required(true)
        .multiple(true)
        .args(["variables_from", "vars"]),
))]
pub struct Command {
    /// Template to render: a local path, s3://bucket/key or ssm://name
    #[arg(short, long, value_name = "REF")]
    pub template_from: String,
    /// JSON object(s) to take variables from, later files overwrite earlier keys
    #[arg(short, long, value_name = "REF", num_args = 1..)]
    pub variables_from: Vec<String>,
    /// Inline variable, applied after all files; `@REF` reads the value, `@@` escapes
    #[arg(short = 'V', long = "var", value_name = "NAME=VALUE")]
    pub vars: Vec<String>,
    /// Output file, if not set the result is printed to stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Log progress to stderr
    #[arg(long)]
    pub verbose: bool,
    /// Print version
    #[arg(long, action = ArgAction::Version)]
    #[allow(dead_code)]
    version: Option<bool>,
    /// Custom arguments, only accepted after `--`
    #[arg(last = true)]
    pub extra: Vec<String>,
}

impl Command {
    // to avoid importing clap::Parser in main file
    pub fn clap_parse() -> Self {
        Command::parse()
    }
}
