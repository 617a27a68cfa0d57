use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Job, Source};
use ladle_common::OutputFormat;
use ladle_common::observability::{LogConfig, init_logging};
use ladle_common::text::snippet;
use ladle_config::{LadleConfig, LadleConfigLoader};
use ladle_dom::Document;
use ladle_http::{FetchOpts, Fetcher, header_map};
use std::io::Write;

mod cli;
mod report;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let loader = match &cli.config {
        Some(path) => LadleConfigLoader::new().with_file(path),
        None => LadleConfigLoader::new().with_default_locations(),
    };
    let cfg: LadleConfig = loader.load().context("loading ladle config")?;

    // 2) Logging from the config's `logging` section; -v forces debug to stderr
    let log_path = init_logging(LogConfig {
        emit_stderr: cfg.logging.stderr || cli.verbose,
        format: cfg.logging.format,
        default_filter: if cli.verbose {
            "debug".to_string()
        } else {
            cfg.logging.filter.clone()
        },
        ..LogConfig::default()
    })?;
    tracing::debug!(log = %log_path.display(), "ladle.start");

    let job = Job::resolve(&cli, &cfg)?;
    let doc = load_document(&job)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for query in &job.queries {
        let found = report::collect(&doc, query, job.raw)?;
        match job.format {
            OutputFormat::Text => report::write_text(&mut out, &found)?,
            OutputFormat::Json => report::write_json(&mut out, &found)?,
        }
    }
    out.flush()?;
    Ok(())
}

fn load_document(job: &Job) -> Result<Document> {
    let markup = match &job.source {
        Source::File(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        Source::Url(url) => {
            let fetcher = Fetcher::new()?;
            let opts = FetchOpts {
                timeout: job.timeout,
                headers: Some(header_map(job.headers.iter().map(|(n, v)| (n, v)))?),
            };
            let page = fetcher
                .fetch_with(url, opts)
                .with_context(|| format!("fetching {url}"))?;
            tracing::info!(
                url = %page.url,
                status = page.status.as_u16(),
                bytes = page.body.len(),
                "ladle.fetched"
            );
            tracing::trace!(preview = %snippet(&page.body, 200), "ladle.fetched.body");
            page.body
        }
    };
    Ok(ladle_dom::parse(&markup))
}
