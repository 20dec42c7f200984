use super::cli::Command;

use anyhow::{Context, Result};

use std::io::{self, Write};

pub mod error;

mod collect;
mod filters;
mod remote;
mod render;
mod source;

use collect::Collector;
use remote::{AwsRemote, RemoteStores};
use source::SourceReader;

pub struct Renderer {
    command: Command,
}

impl Renderer {
    pub fn run_command(command: Command) -> Result<()> {
        let renderer = Renderer { command };
        renderer.run().context("Failed to render template")?;
        Ok(())
    }

    pub fn run(&self) -> Result<()> {
        let command = &self.command;
        if !command.extra.is_empty() && command.verbose {
            log::info!("Ignoring custom arguments: {:?}", command.extra);
        }

        let collector = Collector::new(&command.template_from, &command.variables_from, &command.vars)?;

        let remote = if collector.needs_remote() {
            if command.verbose {
                log::info!("Remote sources in use, loading AWS configuration");
            }
            Some(AwsRemote::connect().context("Failed to set up AWS clients")?)
        } else {
            None
        };
        let reader = SourceReader::new(remote.as_ref().map(|remote| remote as &dyn RemoteStores));

        let (template, variables) = collector.collect(&reader)?;
        if command.verbose {
            log::info!("Collected {} variable(s), rendering {}", variables.len(), command.template_from);
        }

        let result = render::render(&template, &variables)?;
        self.write_output(&result)
    }

    fn write_output(&self, result: &str) -> Result<()> {
        match &self.command.output {
            Some(path) => {
                std::fs::write(path, result).context(format!("Failed to write output: {}", path.display()))?;
                if self.command.verbose {
                    log::info!("Wrote {}", path.display());
                }
            }
            None => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(result.as_bytes()).context("Failed to write to stdout")?;
                stdout.flush()?;
            }
        }
        Ok(())
    }
}
