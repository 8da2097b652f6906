//! `replicator` command-line entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use replicator::core::{checksum_reader_with_chunk_size, CoreError};
use replicator::transfer::{EndpointId, GlobusClient, TaskId, Transferer};
use replicator::{
    load_file_list, ChecksumAlgorithm, Config, DefaultOpener, Pfn, Registrar, SourceOpener,
};

const DEFAULT_CONFIG: &str = "replicator.toml";
const DEFAULT_FAILURE_LOG: &str = "registerlog.json";
const DEFAULT_LABEL: &str = "replicator";

#[derive(Debug, PartialEq)]
struct Cli {
    config: Option<PathBuf>,
    command: Command,
}

#[derive(Debug, PartialEq)]
enum Command {
    Register {
        file_list: PathBuf,
        rse: String,
        failure_log: PathBuf,
        trust_precomputed: bool,
    },
    Checksum {
        algorithm: Option<ChecksumAlgorithm>,
        chunk_size: Option<usize>,
        pfns: Vec<String>,
    },
    TransferSubmit {
        source_endpoint: String,
        destination_endpoint: String,
        source_path: String,
        destination_path: String,
        label: String,
        recursive: bool,
    },
    TransferStatus {
        task_ids: Vec<String>,
    },
    Help,
}

fn usage() {
    eprintln!(
        "usage:
  replicator [--config PATH] register <FILELIST.json> <RSE> [--failure-log PATH] [--trust-precomputed]
  replicator [--config PATH] checksum [--algorithm adler32|crc32] [--chunk-size N] <PFN>...
  replicator [--config PATH] transfer submit <SRC_EP> <DST_EP> <SRC_PATH> <DST_PATH> [--label L] [--recursive]
  replicator [--config PATH] transfer status <TASK_ID>..."
    );
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Cli, String> {
    let mut it = args.into_iter();
    let mut config = None;

    let command = loop {
        match it.next().as_deref() {
            Some("--config") => {
                config = Some(PathBuf::from(value_for("--config", it.next())?));
            }
            Some("-h" | "--help") | None => return Ok(Cli { config, command: Command::Help }),
            Some(command) => break command.to_string(),
        }
    };

    let command = match command.as_str() {
        "register" => parse_register(it)?,
        "checksum" => parse_checksum(it)?,
        "transfer" => match it.next().as_deref() {
            Some("submit") => parse_transfer_submit(it)?,
            Some("status") => {
                let task_ids: Vec<String> = it.collect();
                if task_ids.is_empty() {
                    return Err("transfer status needs at least one task id".into());
                }
                Command::TransferStatus { task_ids }
            }
            Some(other) => return Err(format!("unknown transfer command: {other}")),
            None => return Err("transfer needs `submit` or `status`".into()),
        },
        other => return Err(format!("unknown command: {other}")),
    };

    Ok(Cli { config, command })
}

fn value_for(flag: &str, value: Option<String>) -> Result<String, String> {
    value.ok_or_else(|| format!("{flag} needs a value"))
}

fn parse_register(mut it: impl Iterator<Item = String>) -> Result<Command, String> {
    let mut positional = Vec::new();
    let mut failure_log = PathBuf::from(DEFAULT_FAILURE_LOG);
    let mut trust_precomputed = false;

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--failure-log" => failure_log = PathBuf::from(value_for(&arg, it.next())?),
            "--trust-precomputed" => trust_precomputed = true,
            flag if flag.starts_with("--") => return Err(format!("unknown flag: {flag}")),
            _ => positional.push(arg),
        }
    }

    let [file_list, rse]: [String; 2] = positional
        .try_into()
        .map_err(|_| "register needs <FILELIST.json> <RSE>".to_string())?;

    Ok(Command::Register {
        file_list: PathBuf::from(file_list),
        rse,
        failure_log,
        trust_precomputed,
    })
}

fn parse_checksum(mut it: impl Iterator<Item = String>) -> Result<Command, String> {
    let mut algorithm = None;
    let mut chunk_size = None;
    let mut pfns = Vec::new();

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--algorithm" => {
                let value = value_for(&arg, it.next())?;
                algorithm = Some(value.parse().map_err(|e: CoreError| e.to_string())?);
            }
            "--chunk-size" => {
                let value = value_for(&arg, it.next())?;
                let size: usize = value
                    .parse()
                    .map_err(|_| format!("invalid --chunk-size: {value}"))?;
                if size == 0 {
                    return Err("--chunk-size must be at least 1".into());
                }
                chunk_size = Some(size);
            }
            flag if flag.starts_with("--") => return Err(format!("unknown flag: {flag}")),
            _ => pfns.push(arg),
        }
    }

    if pfns.is_empty() {
        return Err("checksum needs at least one pfn".into());
    }
    Ok(Command::Checksum {
        algorithm,
        chunk_size,
        pfns,
    })
}

fn parse_transfer_submit(mut it: impl Iterator<Item = String>) -> Result<Command, String> {
    let mut positional = Vec::new();
    let mut label = DEFAULT_LABEL.to_string();
    let mut recursive = false;

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--label" => label = value_for(&arg, it.next())?,
            "--recursive" => recursive = true,
            flag if flag.starts_with("--") => return Err(format!("unknown flag: {flag}")),
            _ => positional.push(arg),
        }
    }

    let [source_endpoint, destination_endpoint, source_path, destination_path]: [String; 4] =
        positional.try_into().map_err(|_| {
            "transfer submit needs <SRC_EP> <DST_EP> <SRC_PATH> <DST_PATH>".to_string()
        })?;

    Ok(Command::TransferSubmit {
        source_endpoint,
        destination_endpoint,
        source_path,
        destination_path,
        label,
        recursive,
    })
}

fn main() -> ExitCode {
    let cli = match parse_args(std::env::args().skip(1)) {
        Ok(cli) => cli,
        Err(msg) => {
            eprintln!("{msg}");
            usage();
            return ExitCode::from(2);
        }
    };

    if cli.command == Command::Help {
        usage();
        return ExitCode::SUCCESS;
    }

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("replicator: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(DEFAULT_CONFIG)?,
    };

    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "starting replicator");

    match cli.command {
        // Runs outside the async runtime: sources are read with blocking I/O.
        Command::Checksum {
            algorithm,
            chunk_size,
            pfns,
        } => Ok(checksum(&config, algorithm, chunk_size, &pfns)),
        command => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_async(config, command))
        }
    }
}

async fn run_async(mut config: Config, command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Register {
            file_list,
            rse,
            failure_log,
            trust_precomputed,
        } => {
            if trust_precomputed {
                config.registration.trust_precomputed = true;
            }
            let specs = load_file_list(&file_list)
                .with_context(|| format!("loading file list {}", file_list.display()))?;

            let catalog = config.catalog()?.connect().await?;
            let opener = DefaultOpener::new().with_http_timeout(config.http_timeout());
            let registrar = Registrar::new(catalog, opener, config.registrar_config());

            let report = registrar.register_files(&rse, &specs).await;
            report
                .write_failure_log(&failure_log)
                .with_context(|| format!("writing failure log {}", failure_log.display()))?;

            println!(
                "registered {} of {} files on {rse}",
                report.success_count(),
                report.outcomes.len()
            );
            if report.is_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                eprintln!(
                    "{} files failed, see {}",
                    report.failure_count(),
                    failure_log.display()
                );
                Ok(ExitCode::FAILURE)
            }
        }
        Command::TransferSubmit {
            source_endpoint,
            destination_endpoint,
            source_path,
            destination_path,
            label,
            recursive,
        } => {
            let transferer = Transferer::new(GlobusClient::new(config.globus()?)?);
            let task_id = transferer
                .submit_xfer(
                    &EndpointId::from(source_endpoint),
                    &EndpointId::from(destination_endpoint),
                    &source_path,
                    &destination_path,
                    &label,
                    recursive,
                )
                .await?;
            println!("{task_id}");
            Ok(ExitCode::SUCCESS)
        }
        Command::TransferStatus { task_ids } => {
            let transferer = Transferer::new(GlobusClient::new(config.globus()?)?);
            let task_ids: Vec<TaskId> = task_ids.into_iter().map(TaskId::from).collect();

            let mut failed = false;
            for (task_id, status) in transferer.bulk_check_xfers(&task_ids).await {
                match status {
                    Ok(status) => println!("{task_id}  {status}"),
                    Err(e) => {
                        failed = true;
                        eprintln!("{task_id}  error: {e}");
                    }
                }
            }
            Ok(if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Command::Checksum { .. } | Command::Help => Ok(ExitCode::SUCCESS),
    }
}

fn checksum(
    config: &Config,
    algorithm: Option<ChecksumAlgorithm>,
    chunk_size: Option<usize>,
    pfns: &[String],
) -> ExitCode {
    let algorithm = algorithm.unwrap_or(config.registration.algorithm);
    let chunk_size = chunk_size.unwrap_or(config.registration.chunk_size);
    let opener = DefaultOpener::new().with_http_timeout(config.http_timeout());

    let mut failed = false;
    for raw in pfns {
        let result = Pfn::parse(raw).and_then(|pfn| {
            let reader = opener.open(&pfn).map_err(CoreError::StreamUnavailable)?;
            checksum_reader_with_chunk_size(reader, algorithm, chunk_size)
        });
        match result {
            Ok(digest) => println!("{}  {}  {raw}", digest.digest(), digest.length),
            Err(e) => {
                failed = true;
                tracing::error!(pfn = %raw, error = %e, "checksum failed");
                eprintln!("{raw}: {e}");
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
