use std::collections::HashMap;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;

use nsisim::dds::DdsClient;
use nsisim::peers;
use nsisim::resolver;
use nsisim::writer::ConfigWriter;

/// Configuration generator for simulated NSI network federations
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URL of the NSI-DDS discovery service
    #[arg(long)]
    dds: String,

    /// Database user identifier shared by the simulated services
    #[arg(long)]
    user: String,

    /// Database password shared by the simulated services
    #[arg(long)]
    password: String,

    /// Location of the provider database schema file
    #[arg(long, default_value = "resources/schema.sql")]
    schema: PathBuf,

    /// Resource-manager configuration template
    #[arg(long, default_value = "resources/sense-rm.yaml")]
    rm: PathBuf,

    /// Resource-manager log configuration template
    #[arg(long, default_value = "resources/logback.xml")]
    log_template: PathBuf,

    /// Optional peers overlay with hand-authored port definitions
    #[arg(long)]
    peers: Option<PathBuf>,

    /// Directory to write generated files
    #[arg(short, long, default_value = "sim_output")]
    out: PathBuf,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Starting nsisim configuration generator");
    info!("DDS service: {}", args.dds);
    info!("Output directory: {:?}", args.out);

    // Pull the current federation state from the discovery service.
    let dds = DdsClient::new(&args.dds);
    let nsas = dds
        .get_nsa_documents()
        .wrap_err("failed to fetch NSA documents from the DDS")?;
    info!("Discovered {} NSA documents", nsas.len());

    let topologies = dds
        .get_topology_documents(&nsas)
        .wrap_err("failed to fetch topology documents from the DDS")?;
    info!("Retrieved {} topology documents", topologies.len());

    // Resolve every topology into simulated port descriptors.
    let ports = resolver::resolve(&topologies);
    info!("Resolved {} port descriptors", ports.len());

    // Optional hand-authored extra ports.
    let peers = match &args.peers {
        Some(path) => peers::load_peers(path)?,
        None => HashMap::new(),
    };

    // Render the per-participant configuration files.
    let writer = ConfigWriter {
        user_id: args.user,
        password: args.password,
        schema_file: args.schema,
        rm_template_file: args.rm,
        log_template_file: args.log_template,
        out_dir: args.out,
    };
    writer.write(&nsas, &ports, &peers)?;

    info!("Configuration generation completed successfully");
    Ok(())
}
