use clap::{Parser, Subcommand};
use dnseye_application::use_cases::{CompareSubject, TraceRequest};
use dnseye_domain::config::CliOverrides;
use dnseye_domain::{Domain, ResolverSelector, TraceStatus};
use std::process::ExitCode;
use tracing::{error, info};

mod bootstrap;
mod di;
mod output;

use output::{GraphFormat, ReportFormat, TraceFormat};

#[derive(Parser)]
#[command(name = "dnseye")]
#[command(version)]
#[command(about = "DNS By Eye - trace and inspect DNS delegation chains")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Per-query timeout in milliseconds
    #[arg(long, value_name = "MS", global = true)]
    query_timeout: Option<u64>,

    /// Also query nameservers over IPv6
    #[arg(long, global = true)]
    ipv6: bool,

    /// Default resolver for nameserver lookups: "system", IP or IP:port
    #[arg(long, value_name = "ADDR", global = true)]
    resolver: Option<ResolverSelector>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Trace the delegation chain of a domain from the root
    Trace {
        #[arg(value_parser = Domain::parse)]
        domain: Domain,

        /// Resolver for nameserver lookups: "system", IP or IP:port
        #[arg(short, long)]
        server: Option<ResolverSelector>,

        /// Keep raw glue records on every layer
        #[arg(short, long)]
        verbose: bool,

        /// Skip glue validation
        #[arg(long)]
        no_glue: bool,

        /// csv exports the whole analysis, NS references included
        #[arg(short, long, value_enum, default_value = "text")]
        format: TraceFormat,
    },

    /// Trace several domains or resolvers and compare their final nameservers
    Compare {
        #[arg(value_parser = Domain::parse, required = true)]
        domains: Vec<Domain>,

        /// Repeat to compare resolvers; every domain is traced via each one
        #[arg(short, long)]
        server: Vec<ResolverSelector>,

        /// Include the full traces in JSON output
        #[arg(long)]
        traces: bool,

        #[arg(short, long, value_enum, default_value = "text")]
        format: ReportFormat,
    },

    /// Emit the delegation graph of a domain
    Graph {
        #[arg(value_parser = Domain::parse)]
        domain: Domain,

        #[arg(short, long)]
        server: Option<ResolverSelector>,

        #[arg(short, long, value_enum, default_value = "json")]
        format: GraphFormat,
    },

    /// Ask each final nameserver which nameservers it lists for the domain
    References {
        #[arg(value_parser = Domain::parse)]
        domain: Domain,

        #[arg(short, long)]
        server: Option<ResolverSelector>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: ReportFormat,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Write it to this file instead of stdout
        #[arg(long, value_name = "FILE")]
        write: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let overrides = CliOverrides {
        log_level: cli.log_level.clone(),
        resolver: cli.resolver,
        query_timeout_ms: cli.query_timeout,
        use_ipv6: cli.ipv6,
    };

    let config = match bootstrap::load_config(cli.config.as_deref(), overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(1);
        }
    };

    bootstrap::init_logging(&config);
    info!("DNS By Eye v{}", env!("CARGO_PKG_VERSION"));

    match run(cli.command, &config).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(command: Command, config: &dnseye_domain::Config) -> anyhow::Result<ExitCode> {
    let use_cases = di::UseCases::new(config);

    match command {
        Command::Trace {
            domain,
            server,
            verbose,
            no_glue,
            format,
        } => {
            let mut request = TraceRequest::new(domain);
            request.resolver = server;
            request.verbose = verbose;
            if no_glue {
                request.check_glue = Some(false);
            }
            let trace = use_cases.trace.execute(request).await;
            let rendered = match format {
                TraceFormat::Json => output::to_json(&trace)?,
                TraceFormat::Text => output::render_trace(&trace),
                TraceFormat::Csv => {
                    let references = use_cases.references.execute(&trace).await;
                    output::render_trace_csv(&trace, Some(&references))?
                }
            };
            print!("{}", with_newline(rendered));
            Ok(exit_code(trace.status))
        }

        Command::Compare {
            domains,
            server,
            traces,
            format,
        } => {
            let subjects = compare_subjects(domains, server);
            let report = use_cases.compare.execute(subjects, traces).await?;
            let rendered = match format {
                ReportFormat::Json => output::to_json(&report)?,
                ReportFormat::Text => output::render_comparison(&report),
            };
            print!("{}", with_newline(rendered));
            let worst = report
                .summaries
                .iter()
                .map(|s| s.status)
                .max_by_key(|s| status_code(*s))
                .unwrap_or(TraceStatus::Complete);
            Ok(exit_code(worst))
        }

        Command::Graph {
            domain,
            server,
            format,
        } => {
            let mut request = TraceRequest::new(domain);
            request.resolver = server;
            let trace = use_cases.trace.execute(request).await;
            let graph = use_cases.graph.build(&trace);
            let rendered = match format {
                GraphFormat::Json => output::to_json(&graph)?,
                GraphFormat::Dot => output::render_dot(&graph),
            };
            print!("{}", with_newline(rendered));
            Ok(exit_code(trace.status))
        }

        Command::References {
            domain,
            server,
            format,
        } => {
            let mut request = TraceRequest::new(domain);
            request.resolver = server;
            request.check_glue = Some(false);
            let trace = use_cases.trace.execute(request).await;
            let report = use_cases.references.execute(&trace).await;
            let rendered = match format {
                ReportFormat::Json => output::to_json(&report)?,
                ReportFormat::Text => output::render_references(&report),
            };
            print!("{}", with_newline(rendered));
            Ok(exit_code(trace.status))
        }

        Command::Config { write } => {
            match write {
                Some(path) => {
                    config.save(&path)?;
                    info!(path = %path, "Configuration written");
                }
                None => print!("{}", with_newline(config.to_toml()?)),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Every domain via every resolver; no resolvers means the configured default.
fn compare_subjects(domains: Vec<Domain>, servers: Vec<ResolverSelector>) -> Vec<CompareSubject> {
    let resolvers: Vec<Option<ResolverSelector>> = if servers.is_empty() {
        vec![None]
    } else {
        servers.into_iter().map(Some).collect()
    };

    domains
        .iter()
        .flat_map(|domain| {
            resolvers.iter().map(move |resolver| CompareSubject {
                domain: domain.clone(),
                resolver: *resolver,
            })
        })
        .collect()
}

fn exit_code(status: TraceStatus) -> ExitCode {
    ExitCode::from(status_code(status))
}

fn status_code(status: TraceStatus) -> u8 {
    match status {
        TraceStatus::Complete => 0,
        TraceStatus::Partial => 2,
        TraceStatus::Failed => 3,
    }
}

fn with_newline(mut s: String) -> String {
    if !s.ends_with('\n') {
        s.push('\n');
    }
    s
}
