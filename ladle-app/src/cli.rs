use anyhow::{Context, Result, bail};
use clap::Parser;
use ladle_common::OutputFormat;
use ladle_config::LadleConfig;
use ladle_dom::Selector;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Fetch a page (or read a file), select nodes with CSS selectors, print their text.
#[derive(Debug, Parser)]
#[command(name = "ladle", version)]
pub struct Cli {
    /// YAML config file; defaults to ladle.yaml in the user config dir and the working dir.
    #[arg(long, env = "LADLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Page to fetch. Overrides `target.url` from the config.
    #[arg(long, conflicts_with = "file")]
    pub url: Option<String>,

    /// Read markup from a local file instead of fetching.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Extra request header, `Name: value`. Repeatable.
    #[arg(short = 'H', long = "header", value_name = "NAME: VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    #[arg(long, value_name = "N")]
    pub timeout_secs: Option<u64>,

    /// Selector to run. Repeatable; replaces the config's queries.
    #[arg(short = 's', long = "select", value_name = "SELECTOR")]
    pub selectors: Vec<String>,

    /// Print each match's attributes.
    #[arg(long)]
    pub attrs: bool,

    /// Print text content untrimmed.
    #[arg(long)]
    pub raw: bool,

    #[arg(long, value_name = "text|json")]
    pub format: Option<OutputFormat>,

    /// Debug logging, mirrored to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected `Name: value`, got {raw:?}")),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    File(PathBuf),
}

#[derive(Debug)]
pub struct Query {
    pub selector: Selector,
    pub attributes: bool,
}

/// Everything one run needs, after CLI flags are layered over the config.
#[derive(Debug)]
pub struct Job {
    pub source: Source,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
    pub queries: Vec<Query>,
    pub raw: bool,
    pub format: OutputFormat,
}

impl Job {
    /// Merge `cli` over `cfg`. Selectors are compiled here so a bad one fails
    /// before any request goes out.
    pub fn resolve(cli: &Cli, cfg: &LadleConfig) -> Result<Self> {
        let target = cfg.target.as_ref();

        let source = match (&cli.file, &cli.url, target) {
            (Some(path), _, _) => Source::File(path.clone()),
            (None, Some(url), _) => Source::Url(url.clone()),
            (None, None, Some(t)) => Source::Url(t.url.clone()),
            (None, None, None) => {
                bail!("nothing to read: pass --url or --file, or set target.url in ladle.yaml")
            }
        };

        // Header names are case-insensitive; flags win over config.
        let mut merged: BTreeMap<String, (String, String)> = BTreeMap::new();
        let from_config = target.into_iter().flat_map(|t| t.headers.iter());
        for (name, value) in from_config.chain(cli.headers.iter().map(|(n, v)| (n, v))) {
            merged.insert(name.to_ascii_lowercase(), (name.clone(), value.clone()));
        }
        let headers = merged.into_values().collect();

        let timeout = cli
            .timeout_secs
            .or_else(|| target.and_then(|t| t.timeout_secs))
            .map(Duration::from_secs);

        let requested: Vec<(&str, bool)> = if cli.selectors.is_empty() {
            cfg.queries
                .iter()
                .map(|q| (q.selector.as_str(), q.attributes || cli.attrs))
                .collect()
        } else {
            cli.selectors.iter().map(|s| (s.as_str(), cli.attrs)).collect()
        };
        if requested.is_empty() {
            bail!("no selectors: pass --select or add queries to ladle.yaml");
        }
        let queries = requested
            .into_iter()
            .map(|(sel, attributes)| {
                Ok(Query {
                    selector: Selector::parse(sel)
                        .with_context(|| format!("bad selector {sel:?}"))?,
                    attributes,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            source,
            headers,
            timeout,
            queries,
            raw: cli.raw,
            format: cli.format.unwrap_or(cfg.output),
        })
    }
}
