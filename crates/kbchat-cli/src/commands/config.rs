//! Config command

use crate::app::{ConfigArgs, OutputFormat};
use anyhow::Result;
use kbchat_core::Config;

pub async fn run(args: ConfigArgs, config: &Config, format: OutputFormat) -> Result<()> {
    if args.validate {
        config.validate()?;
    }

    let redacted = config.redacted();
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&redacted)?);
        }
        OutputFormat::Md => {
            println!("# Configuration\n");
            println!("Source: `{}`\n", Config::default_path().display());
            println!("```yaml\n{}```", serde_yaml::to_string(&redacted)?);
        }
        OutputFormat::Cli => {
            println!("# {}", Config::default_path().display());
            print!("{}", serde_yaml::to_string(&redacted)?);
        }
    }

    if args.validate {
        eprintln!("Configuration is valid");
    }
    Ok(())
}
