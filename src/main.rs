use aws_vpc_topology::aws::{AwsCliZones, CachedZones, StaticZones, ZoneProvider};
use aws_vpc_topology::output::{print_exports, print_issues, print_summary, write_plan, Plan};
use aws_vpc_topology::processing::{check_layout, log_layout_issues, resolve_network};
use aws_vpc_topology::{load_network_config, plan_network};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use std::error::Error;
use std::path::Path;

const LOG_CONFIG_FILE: &str = "log4rs.yml";

/// Declare an AWS VPC topology as a dependency-ordered plan.
#[derive(Parser, Debug)]
#[command(name = "vpc-topology", version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Stack configuration file
    #[arg(short, long, global = true, env = "VPC_TOPOLOGY_CONFIG", default_value = "stack.json")]
    config: String,

    /// JSON array of zone names to use instead of querying the AWS CLI
    #[arg(long, global = true)]
    zones_file: Option<String>,

    /// Zone cache file (default: az_cache_<region>_<date>.json)
    #[arg(long, global = true)]
    zone_cache: Option<String>,

    /// AWS CLI profile for the zone query
    #[arg(long, global = true, env = "AWS_PROFILE")]
    profile: Option<String>,

    /// Log more (-v debug, -vv trace); ignored when log4rs.yml exists
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the plan summary and write the plan file
    Plan {
        /// Plan output file
        #[arg(short, long, default_value = "plan.json")]
        output: String,
    },
    /// Print the stack exports
    Exports,
    /// Check the CIDR layout; exits non-zero on issues
    Check,
}

fn init_logging(verbose: u8) -> Result<(), Box<dyn Error>> {
    if Path::new(LOG_CONFIG_FILE).exists() {
        log4rs::init_file(LOG_CONFIG_FILE, Default::default())?;
        return Ok(());
    }
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let stderr = ConsoleAppender::builder()
        .target(log4rs::append::console::Target::Stderr)
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))?;
    log4rs::init_config(config)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    log::info!("#Start main() {:?}", cli.command);

    let cfg = load_network_config(&cli.config)?;

    let provider: Box<dyn ZoneProvider> = match &cli.zones_file {
        Some(file) => Box::new(StaticZones::from_file(file)?),
        None => Box::new(CachedZones {
            inner: AwsCliZones {
                profile: cli.profile.clone(),
            },
            cache_file: cli.zone_cache.clone(),
        }),
    };

    match &cli.command {
        Command::Plan { output } => {
            let (net, topology) = plan_network(&cfg, provider.as_ref())?;
            let plan = Plan::new(&net, &topology);
            print_summary(&plan);
            write_plan(output, &plan)?;
        }
        Command::Exports => {
            let (_net, topology) = plan_network(&cfg, provider.as_ref())?;
            print_exports(&topology.exports)?;
        }
        Command::Check => {
            let net = resolve_network(&cfg, provider.as_ref())?;
            let issues = check_layout(&net);
            log_layout_issues(&issues);
            if print_issues(&issues) > 0 {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
