use std::{env, path::PathBuf};

use anyhow::{Result, anyhow};

use crate::{config::DEFAULT_CONFIG_FILE, session::FlowKind};

const USAGE: &str = "usage: kote-survey [--config <path>] [--flow survey|quick]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub config_path: PathBuf,
    /// Overrides `survey.flow` from the config file.
    pub flow: Option<FlowKind>,
}

pub fn args_from_env() -> Result<CliArgs> {
    parse_args(env::args().skip(1))
}

pub fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs> {
    let mut args = args.into_iter();
    let mut config_path = None;
    let mut flow = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("missing value for --config"))?;
                config_path = Some(PathBuf::from(value));
            }
            "--flow" => {
                let value = args.next().ok_or_else(|| anyhow!("missing value for --flow"))?;
                flow = Some(match value.as_str() {
                    "survey" => FlowKind::Survey,
                    "quick" => FlowKind::Quick,
                    other => return Err(anyhow!("unknown flow '{other}'. {USAGE}")),
                });
            }
            other => return Err(anyhow!("unknown argument: {other}. {USAGE}")),
        }
    }

    Ok(CliArgs {
        config_path: config_path.unwrap_or_else(|| PathBuf::from(format!("./{DEFAULT_CONFIG_FILE}"))),
        flow,
    })
}
