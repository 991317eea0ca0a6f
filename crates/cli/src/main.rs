//! Service Proxy CLI
//!
//! Command-line interface for validating API Gateway service proxies and
//! compiling them into a CloudFormation template.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use service_proxy_common::{ProxyDeclaration, Template, ValidatedSet};
use service_proxy_compiler::{display, resolve_endpoint, ProxyCompiler, StaticHostContext};
use service_proxy_parser::{validate, ServiceConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_STAGE: &str = "dev";
const DEFAULT_REGION: &str = "us-east-1";

#[derive(Parser)]
#[command(name = "service-proxy")]
#[command(version, about = "Compile API Gateway service proxies into CloudFormation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the service proxies of a service configuration
    #[command(after_help = "EXAMPLES:\n  \
        service-proxy validate --config serverless.yml")]
    Validate {
        /// Path to the service configuration (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Compile the service proxies into a CloudFormation template
    #[command(after_help = "EXAMPLES:\n  \
        # Compile into a new template\n  \
        service-proxy compile --config serverless.yml --output template.json\n\n  \
        # Add proxies to an existing template\n  \
        service-proxy compile \\\n    \
        --config serverless.yml \\\n    \
        --template cloudformation-template-update-stack.json \\\n    \
        --stage prod\n\n  \
        # Merge into the config's resources block for local emulation\n  \
        service-proxy compile --config serverless.yml --offline")]
    Compile {
        /// Path to the service configuration (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Existing CloudFormation template to compile into
        #[arg(short, long, conflicts_with = "offline")]
        template: Option<PathBuf>,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Merge a fresh compilation into the config's resources block
        #[arg(long)]
        offline: bool,

        /// Deployment stage (defaults to provider.stage, then "dev")
        #[arg(long)]
        stage: Option<String>,

        /// AWS region (defaults to provider.region, then "us-east-1")
        #[arg(long)]
        region: Option<String>,

        /// Deployment instance id (defaults to the current time in milliseconds)
        #[arg(long)]
        deployment_id: Option<String>,
    },

    /// Print the endpoints of the service proxies
    #[command(after_help = "EXAMPLES:\n  \
        # Endpoint of a deployed stage\n  \
        service-proxy display \\\n    \
        --config serverless.yml \\\n    \
        --endpoint https://abc123.execute-api.us-east-1.amazonaws.com/dev\n\n  \
        # Derive the endpoint from provider.apiGateway.restApiId\n  \
        service-proxy display --config serverless.yml")]
    Display {
        /// Path to the service configuration (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Base URL of the deployed stage
        #[arg(short, long)]
        endpoint: Option<String>,

        /// Deployment stage (defaults to provider.stage, then "dev")
        #[arg(long)]
        stage: Option<String>,

        /// AWS region (defaults to provider.region, then "us-east-1")
        #[arg(long)]
        region: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Validate { config } => {
            validate_command(config.as_path(), cli.verbose)?;
        }
        Commands::Compile {
            config,
            template,
            output,
            offline,
            stage,
            region,
            deployment_id,
        } => {
            compile_command(CompileOptions {
                config: config.as_path(),
                template: template.as_deref(),
                output: output.as_deref(),
                offline,
                stage,
                region,
                deployment_id,
            })?;
        }
        Commands::Display {
            config,
            endpoint,
            stage,
            region,
        } => {
            display_command(config.as_path(), endpoint, stage, region)?;
        }
    }

    Ok(())
}

/// Log to stderr so compiled templates on stdout stay clean
fn setup_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn load_config(path: &Path) -> Result<ServiceConfig> {
    eprintln!("{} Loading configuration: {}", "→".cyan(), path.display());
    ServiceConfig::from_file(path)
        .with_context(|| format!("Failed to load service configuration {}", path.display()))
}

fn validate_command(config_path: &Path, verbose: bool) -> Result<()> {
    let config = load_config(config_path)?;

    if !config.has_proxies() {
        println!("{} No service proxies declared", "!".yellow());
        return Ok(());
    }

    let validated = validate(&config.proxies).context("Service proxy validation failed")?;

    println!("\n{}", "✓ Validation successful!".green().bold());
    println!("  Service: {}", config.service.yellow());
    println!("  Proxies: {}", validated.len());
    println!("  Families: {}", family_list(&validated));

    if verbose {
        println!("\n{}", "Proxies:".bold());
        for proxy in validated.iter() {
            print_proxy(proxy);
        }
    }

    Ok(())
}

fn family_list(validated: &ValidatedSet) -> String {
    validated
        .families()
        .iter()
        .map(|family| family.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_proxy(proxy: &ProxyDeclaration) {
    println!(
        "  • {} {} ({})",
        proxy.method.to_string().cyan(),
        proxy.normalized_path(),
        proxy.family()
    );
    if proxy.cors.is_some() {
        println!("    CORS: enabled");
    }
    if proxy.role_arn.is_some() {
        println!("    Role: caller-supplied");
    }
}

struct CompileOptions<'a> {
    config: &'a Path,
    template: Option<&'a Path>,
    output: Option<&'a Path>,
    offline: bool,
    stage: Option<String>,
    region: Option<String>,
    deployment_id: Option<String>,
}

fn compile_command(options: CompileOptions) -> Result<()> {
    let config = load_config(options.config)?;
    let host = host_context(
        &config,
        options.stage,
        options.region,
        options.deployment_id,
    )?;
    let compiler = ProxyCompiler::new().context("Failed to initialize compiler")?;

    let (document, report) = if options.offline {
        eprintln!("{} Compiling for local emulation", "→".cyan());
        let mut resources = config.resources.clone();
        let report = compiler
            .compile_for_offline(&mut resources, &config.proxies, &host)
            .context("Failed to compile service proxies")?;
        (resources, report)
    } else {
        let mut template = match options.template {
            Some(path) => {
                eprintln!("{} Loading template: {}", "→".cyan(), path.display());
                let json = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read template {}", path.display()))?;
                Template::from_json(&json)
                    .with_context(|| format!("Failed to parse template {}", path.display()))?
            }
            None => Template::default(),
        };
        let report = compiler
            .compile_proxies(&mut template, &config.proxies, &host)
            .context("Failed to compile service proxies")?;
        (template, report)
    };

    let rendered = document
        .to_json_pretty()
        .context("Failed to serialize template")?;

    match options.output {
        Some(path) => {
            fs::write(path, format!("{}\n", rendered))
                .with_context(|| format!("Failed to write template {}", path.display()))?;
            eprintln!("\n{}", "✓ Compilation successful!".green().bold());
            eprintln!("  Methods: {}", report.method_ids.len());
            eprintln!("  CORS preflights: {}", report.options_method_ids.len());
            eprintln!("  Roles: {}", report.role_ids.len());
            if let Some(deployment_id) = &report.deployment_id {
                eprintln!("  Deployment: {}", deployment_id.yellow());
            }
            eprintln!("  Output: {}", path.display().to_string().cyan());
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

fn display_command(
    config_path: &Path,
    endpoint: Option<String>,
    stage: Option<String>,
    region: Option<String>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let validated = validate(&config.proxies).context("Service proxy validation failed")?;

    let endpoint = match endpoint {
        Some(endpoint) => endpoint,
        None => {
            let host = host_context(&config, stage, region, None)?;
            resolve_endpoint(&host).context("Pass --endpoint to display the proxies")?
        }
    };

    print!("{}", display(validated.proxies(), endpoint.trim_end_matches('/')));
    Ok(())
}

/// Resolve host settings: CLI flags first, then the provider section, then defaults
fn host_context(
    config: &ServiceConfig,
    stage: Option<String>,
    region: Option<String>,
    deployment_id: Option<String>,
) -> Result<StaticHostContext> {
    let provider = &config.provider;
    let stage = stage
        .or_else(|| provider.stage.clone())
        .unwrap_or_else(|| DEFAULT_STAGE.to_string());
    let region = region
        .or_else(|| provider.region.clone())
        .unwrap_or_else(|| DEFAULT_REGION.to_string());
    let deployment_id =
        deployment_id.unwrap_or_else(|| chrono::Utc::now().timestamp_millis().to_string());

    debug!(
        service = %config.service,
        stage = %stage,
        region = %region,
        deployment_id = %deployment_id,
        "Resolved host settings"
    );

    let mut host = StaticHostContext::new(config.service.clone())
        .with_stage(stage)
        .with_region(region)
        .with_deployment_instance_id(deployment_id);

    let api_gateway = &provider.api_gateway;
    match (&api_gateway.rest_api_id, &api_gateway.rest_api_root_resource_id) {
        (Some(rest_api_id), Some(root_resource_id)) => {
            host = host.with_rest_api(rest_api_id.clone(), root_resource_id.clone());
        }
        (Some(_), None) => {
            bail!("provider.apiGateway.restApiId requires restApiRootResourceId")
        }
        (None, Some(_)) => {
            bail!("provider.apiGateway.restApiRootResourceId requires restApiId")
        }
        (None, None) => {}
    }

    Ok(host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use service_proxy_compiler::HostContext;

    #[test]
    fn test_host_context_precedence() {
        let config = ServiceConfig::from_yaml(
            "service: orders\nprovider:\n  stage: prod\n  region: eu-west-1\n",
        )
        .unwrap();

        let host = host_context(&config, Some("qa".to_string()), None, Some("7".to_string()))
            .unwrap();
        assert_eq!(host.service_name(), "orders");
        assert_eq!(host.stage().as_deref(), Some("qa"));
        assert_eq!(host.region().as_deref(), Some("eu-west-1"));
        assert_eq!(host.deployment_instance_id(), "7");
        assert!(host.rest_api().is_none());
    }

    #[test]
    fn test_host_context_defaults() {
        let config = ServiceConfig::from_yaml("service: orders\n").unwrap();
        let host = host_context(&config, None, None, None).unwrap();

        assert_eq!(host.stage().as_deref(), Some(DEFAULT_STAGE));
        assert_eq!(host.region().as_deref(), Some(DEFAULT_REGION));
        assert!(host.deployment_instance_id().parse::<i64>().is_ok());
    }

    #[test]
    fn test_rest_api_needs_root_resource() {
        let config = ServiceConfig::from_yaml(
            "service: orders\nprovider:\n  apiGateway:\n    restApiId: abc123\n",
        )
        .unwrap();
        assert!(host_context(&config, None, None, None).is_err());
    }

    #[test]
    fn test_compile_command_writes_template() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("serverless.yml");
        let output_path = dir.path().join("template.json");
        fs::write(
            &config_path,
            r#"
service: orders
custom:
  apiGatewayServiceProxies:
    - sqs:
        path: /orders
        method: post
        queueName: inbox
"#,
        )
        .unwrap();

        compile_command(CompileOptions {
            config: &config_path,
            template: None,
            output: Some(&output_path),
            offline: false,
            stage: None,
            region: None,
            deployment_id: Some("1".to_string()),
        })
        .unwrap();

        let template = Template::from_json(&fs::read_to_string(&output_path).unwrap()).unwrap();
        assert!(template.contains("ApiGatewayMethodOrdersPost"));
        assert!(template.contains("ApiGatewayDeployment1"));
    }

    #[test]
    fn test_failed_compile_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("serverless.yml");
        let output_path = dir.path().join("template.json");
        fs::write(
            &config_path,
            "custom:\n  apiGatewayServiceProxies:\n    - sqs:\n        path: /orders\n",
        )
        .unwrap();

        let result = compile_command(CompileOptions {
            config: &config_path,
            template: None,
            output: Some(&output_path),
            offline: false,
            stage: None,
            region: None,
            deployment_id: None,
        });

        assert!(result.is_err());
        assert!(!output_path.exists());
    }

    #[test]
    fn test_family_list_is_sorted_and_distinct() {
        let config = ServiceConfig::from_yaml(
            r#"
custom:
  apiGatewayServiceProxies:
    - sns:
        path: /notify
        method: post
        topicName: alerts
    - sqs:
        path: /orders
        method: post
        queueName: inbox
    - sqs:
        path: /returns
        method: post
        queueName: returns
"#,
        )
        .unwrap();
        let validated = validate(&config.proxies).unwrap();

        assert_eq!(family_list(&validated), "sqs, sns");
    }

    #[test]
    fn test_cli_parses_compile_flags() {
        let cli = Cli::parse_from([
            "service-proxy",
            "compile",
            "--config",
            "serverless.yml",
            "--offline",
            "--deployment-id",
            "42",
        ]);
        match cli.command {
            Commands::Compile {
                offline,
                deployment_id,
                template,
                ..
            } => {
                assert!(offline);
                assert_eq!(deployment_id.as_deref(), Some("42"));
                assert!(template.is_none());
            }
            _ => panic!("expected compile command"),
        }
    }
}
