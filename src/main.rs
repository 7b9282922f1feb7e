use anyhow::{Context, Result};
use clap::Parser;
use drape_guide::config::UpstreamConfig;
use drape_guide::tables::{load_tables, tables_stub};
use drape_guide::upstream::{ImagePayload, MessagesClient};
use drape_guide::{Pipeline, PipelineTables, Reply};
use serde_json::json;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;
use cli::{AnalyzeArgs, Command, ExtractArgs, RootArgs};

const LOG_ENV: &str = "DRAPE_LOG";

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = RootArgs::parse();
    match args.command {
        Command::Extract(args) => run_extract(args),
        Command::Analyze(args) => run_analyze(args),
        Command::Tables(_) => {
            println!("{}", tables_stub()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn pipeline_for(tables: Option<&Path>) -> Result<Pipeline> {
    let tables = match tables {
        Some(path) => load_tables(path)?,
        None => PipelineTables::default(),
    };
    Ok(Pipeline::new(tables))
}

fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) if path != Path::new("-") => {
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
        }
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("read model output from stdin")?;
            Ok(text)
        }
    }
}

fn run_extract(args: ExtractArgs) -> Result<ExitCode> {
    let pipeline = pipeline_for(args.tables.as_deref())?;
    let raw = read_input(args.input.as_deref())?;

    match pipeline.run(&raw) {
        Ok(extraction) => {
            let text = if args.report {
                serde_json::to_string_pretty(&extraction)
            } else {
                serde_json::to_string_pretty(&extraction.document)
            }
            .context("serialize extraction")?;
            println!("{text}");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            tracing::warn!(code = err.code(), "extraction failed");
            emit(&Reply::pipeline_failure(&err), false)
        }
    }
}

fn run_analyze(args: AnalyzeArgs) -> Result<ExitCode> {
    let pipeline = pipeline_for(args.tables.as_deref())?;
    let config = UpstreamConfig::from_env()?;
    let Some(api_key) = config.api_key.clone() else {
        return emit(&Reply::missing_credential(), args.envelope);
    };
    let image = ImagePayload::from_file(&args.image, args.media_type.as_deref())?;
    let client = MessagesClient::new(config, api_key);

    let output = match client.generate(&image) {
        Ok(output) => output,
        Err(err) => return emit(&Reply::upstream_failure(&err), args.envelope),
    };
    if let Some(path) = args.raw_out.as_deref() {
        fs::write(path, &output.text).with_context(|| format!("write {}", path.display()))?;
    }

    let reply = match pipeline.run(&output.text) {
        Ok(extraction) => Reply::success(&extraction),
        Err(err) => Reply::pipeline_failure(&err),
    };
    emit(&reply, args.envelope)
}

fn emit(reply: &Reply, envelope: bool) -> Result<ExitCode> {
    let value = if envelope {
        json!({
            "status": reply.status,
            "headers": reply.headers,
            "body": reply.body,
        })
    } else {
        reply.body.clone()
    };
    let text = serde_json::to_string_pretty(&value).context("serialize reply")?;
    println!("{text}");
    Ok(if reply.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
