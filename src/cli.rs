//! Minimal CLI parsing.

use std::env;

use anyhow::{Context, Result, anyhow};

pub const USAGE: &str = "\
Usage:
  indexarr list                              List available indexers
  indexarr caps <indexer>                    Print the Torznab capabilities document
  indexarr resolve <indexer> [cats] [--exact]
                                             Tracker categories sent for Torznab categories
  indexarr lookup <indexer> <token-or-label> Torznab categories for a tracker category";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Caps {
        indexer: String,
    },
    Resolve {
        indexer: String,
        categories: Vec<i32>,
        /// Skip parent -> subcategory expansion
        exact: bool,
    },
    Lookup {
        indexer: String,
        value: String,
    },
    Help,
}

#[derive(Debug)]
pub struct CliOptions {
    pub command: Command,
}

impl CliOptions {
    pub fn from_args() -> Result<Self> {
        Self::parse(env::args().skip(1))
    }

    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut args = args.into_iter();

        let command = match args.next().as_deref() {
            None | Some("help") | Some("--help") | Some("-h") => Command::Help,
            Some("list") => Command::List,
            Some("caps") => Command::Caps {
                indexer: next_indexer(&mut args)?,
            },
            Some("resolve") => {
                let indexer = next_indexer(&mut args)?;
                let mut categories = Vec::new();
                let mut exact = false;
                for arg in args {
                    if arg == "--exact" {
                        exact = true;
                        continue;
                    }
                    for value in arg.split(',').map(str::trim).filter(|v| !v.is_empty()) {
                        categories.push(
                            value
                                .parse::<i32>()
                                .with_context(|| format!("Invalid category id: {}", value))?,
                        );
                    }
                }
                Command::Resolve {
                    indexer,
                    categories,
                    exact,
                }
            }
            Some("lookup") => {
                let indexer = next_indexer(&mut args)?;
                let value: Vec<String> = args.collect();
                if value.is_empty() {
                    return Err(anyhow!("Missing token or label\n\n{}", USAGE));
                }
                Command::Lookup {
                    indexer,
                    value: value.join(" "),
                }
            }
            Some(other) => return Err(anyhow!("Unknown command: {}\n\n{}", other, USAGE)),
        };

        Ok(Self { command })
    }
}

fn next_indexer(args: &mut impl Iterator<Item = String>) -> Result<String> {
    args.next()
        .ok_or_else(|| anyhow!("Missing indexer id\n\n{}", USAGE))
}
