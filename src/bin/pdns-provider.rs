use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pdns_provider::validation::{normalize_fqdn, validate_masters, validate_record_contents};
use pdns_provider::{
    ClientConfig, PowerDnsClient, ResourceRecordSet, ZoneInfo, ZoneKind, ZoneMetadata,
};
use serde::Serialize;
use serde_json::json;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, rename_all = "kebab-case")]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ConnectionArgs {
    /// Location of the PowerDNS server
    #[arg(long, env = "PDNS_SERVER_URL", value_name = "URL")]
    server_url: String,
    /// REST API authentication key
    #[arg(long, env = "PDNS_API_KEY", value_name = "KEY", hide_env_values = true)]
    api_key: String,
    /// PowerDNS server ID
    #[arg(long, env = "PDNS_SERVER_ID", value_name = "ID", default_value = "localhost")]
    server_id: String,
    /// Disable verification of the PowerDNS server's TLS certificate
    #[arg(long, env = "PDNS_INSECURE_HTTPS")]
    insecure_https: bool,
    /// Content or path of a Root CA used to verify the server's certificate
    #[arg(long, env = "PDNS_CACERT", value_name = "PEM|PATH")]
    ca_certificate: Option<String>,
    /// Cache zone lookups made while listing records
    #[arg(long, env = "PDNS_CACHE_REQUESTS")]
    cache_requests: bool,
    /// Cache size in MB
    #[arg(long, env = "PDNS_CACHE_MEM_SIZE", value_name = "MB", default_value_t = 10)]
    cache_mem_size: usize,
    /// Cache entry lifetime in seconds
    #[arg(long, env = "PDNS_CACHE_TTL", value_name = "SECONDS", default_value_t = 30)]
    cache_ttl: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the server description and the API version in use
    Server,
    /// List all zones (without records)
    Zones,
    /// Inspect or change a zone
    #[command(subcommand)]
    Zone(ZoneCommand),
    /// List the records of a zone, optionally narrowed to one record set
    Records {
        zone: String,
        /// Record name (FQDN)
        #[arg(long, requires = "rtype")]
        name: Option<String>,
        /// Record type
        #[arg(long = "type", requires = "name")]
        rtype: Option<String>,
        /// Record set ID (`name:::type`)
        #[arg(long, conflicts_with_all = ["name", "rtype"])]
        id: Option<String>,
    },
    /// Write or remove a record set
    #[command(subcommand)]
    Record(RecordCommand),
    /// Manage zone metadata
    #[command(subcommand)]
    Metadata(MetadataCommand),
}

#[derive(Subcommand, Debug)]
enum ZoneCommand {
    /// Zone settings with apex NS and SOA values
    Show { name: String },
    Create {
        name: String,
        #[arg(long, default_value = "Native")]
        kind: String,
        /// Nameserver FQDN (repeat for multiple values)
        #[arg(long = "nameserver", value_name = "FQDN")]
        nameservers: Vec<String>,
        /// Master as <ip>[:port], Slave zones only (repeat for multiple values)
        #[arg(long = "master", value_name = "IP[:PORT]")]
        masters: Vec<String>,
        #[arg(long)]
        soa_edit_api: Option<String>,
        #[arg(long)]
        account: Option<String>,
    },
    /// Change the kind of a zone
    Update {
        name: String,
        #[arg(long)]
        kind: String,
    },
    Delete { name: String },
    Exists { name: String },
}

#[derive(Subcommand, Debug)]
enum RecordCommand {
    /// Create or replace the record set for (name, type)
    Set {
        zone: String,
        name: String,
        #[arg(long = "type")]
        rtype: String,
        #[arg(long)]
        ttl: u32,
        /// Record value (repeat for multiple values)
        #[arg(long = "content", required = true)]
        contents: Vec<String>,
        /// For A and AAAA records, create the matching PTR
        #[arg(long)]
        set_ptr: bool,
    },
    /// Delete a record set by ID (`name:::type`)
    Delete { zone: String, id: String },
    Exists { zone: String, id: String },
}

#[derive(Subcommand, Debug)]
enum MetadataCommand {
    /// Show a metadata entry by ID (`zone:::kind`)
    Get { id: String },
    /// Replace all values of one metadata kind
    Set {
        zone: String,
        kind: String,
        /// Metadata value (repeat for multiple values)
        #[arg(long = "value", required = true)]
        values: Vec<String>,
    },
    Delete { id: String },
    Exists { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = build_client_config(&cli.connection);
    let client =
        PowerDnsClient::from_config(&config).context("error setting up PowerDNS client")?;

    run(&client, cli.command).await
}

fn build_client_config(args: &ConnectionArgs) -> ClientConfig {
    ClientConfig {
        server_url: args.server_url.clone(),
        api_key: args.api_key.clone(),
        server_id: args.server_id.clone(),
        insecure_https: args.insecure_https,
        ca_certificate: args.ca_certificate.clone(),
        cache_enable: args.cache_requests,
        cache_mem_size: args.cache_mem_size,
        cache_ttl: args.cache_ttl,
    }
}

async fn run(client: &PowerDnsClient, command: Command) -> Result<()> {
    match command {
        Command::Server => {
            let server = client
                .server_info()
                .await
                .context("couldn't fetch PowerDNS server info")?;
            let api_version = client.api_version().await;
            print_json(&json!({ "api_version": api_version.0, "server": server }))
        }
        Command::Zones => {
            let zones = client.list_zones().await.context("couldn't list PowerDNS zones")?;
            print_json(&zones)
        }
        Command::Zone(cmd) => run_zone(client, cmd).await,
        Command::Records {
            zone,
            name,
            rtype,
            id,
        } => {
            let records = match (id, name, rtype) {
                (Some(id), _, _) => client.list_records_by_id(&zone, &id).await,
                (None, Some(name), Some(rtype)) => {
                    client.list_records_in_rrset(&zone, &name, &rtype).await
                }
                _ => client.list_records(&zone).await,
            }
            .with_context(|| format!("couldn't fetch PowerDNS records of zone {zone}"))?;
            print_json(&records)
        }
        Command::Record(cmd) => run_record(client, cmd).await,
        Command::Metadata(cmd) => run_metadata(client, cmd).await,
    }
}

async fn run_zone(client: &PowerDnsClient, cmd: ZoneCommand) -> Result<()> {
    match cmd {
        ZoneCommand::Show { name } => {
            let summary = client
                .zone_summary(&name)
                .await
                .with_context(|| format!("couldn't fetch PowerDNS zone {name}"))?;
            print_json(&summary)
        }
        ZoneCommand::Create {
            name,
            kind,
            nameservers,
            masters,
            soa_edit_api,
            account,
        } => {
            let kind = ZoneKind::from(kind);
            validate_masters(&kind, &masters)?;
            let nameservers = nameservers
                .iter()
                .map(|ns| normalize_fqdn(ns).with_context(|| format!("invalid nameserver '{ns}'")))
                .collect::<Result<Vec<_>>>()?;

            let zone = ZoneInfo {
                name: normalize_fqdn(&name)?,
                kind: Some(kind),
                nameservers,
                masters,
                soa_edit_api: soa_edit_api.unwrap_or_default(),
                account: account.unwrap_or_default(),
                ..Default::default()
            };
            let created = client
                .create_zone(&zone)
                .await
                .with_context(|| format!("failed to create PowerDNS zone {}", zone.name))?;
            info!("created PowerDNS zone with ID: {}", created.id);
            print_json(&created)
        }
        ZoneCommand::Update { name, kind } => {
            let zone = ZoneInfo {
                kind: Some(ZoneKind::from(kind)),
                ..Default::default()
            };
            client
                .update_zone(&name, &zone)
                .await
                .with_context(|| format!("failed to update PowerDNS zone {name}"))?;
            print_json(&json!({ "ok": true }))
        }
        ZoneCommand::Delete { name } => {
            client
                .delete_zone(&name)
                .await
                .with_context(|| format!("error deleting PowerDNS zone {name}"))?;
            print_json(&json!({ "ok": true }))
        }
        ZoneCommand::Exists { name } => {
            let exists = client
                .zone_exists(&name)
                .await
                .with_context(|| format!("error checking PowerDNS zone {name}"))?;
            print_json(&json!({ "exists": exists }))
        }
    }
}

async fn run_record(client: &PowerDnsClient, cmd: RecordCommand) -> Result<()> {
    match cmd {
        RecordCommand::Set {
            zone,
            name,
            rtype,
            ttl,
            contents,
            set_ptr,
        } => {
            validate_record_contents(&contents)?;
            let rrset = ResourceRecordSet::new(name, rtype, ttl, contents).with_set_ptr(set_ptr);
            let id = client
                .replace_record_set(&zone, rrset)
                .await
                .context("failed to create PowerDNS record")?;
            info!("created PowerDNS record with ID: {id}");
            print_json(&json!({ "id": id }))
        }
        RecordCommand::Delete { zone, id } => {
            client
                .delete_record_set_by_id(&zone, &id)
                .await
                .with_context(|| format!("error deleting PowerDNS record {id}"))?;
            print_json(&json!({ "ok": true }))
        }
        RecordCommand::Exists { zone, id } => {
            let exists = client
                .record_exists_by_id(&zone, &id)
                .await
                .with_context(|| format!("error checking PowerDNS record {id}"))?;
            print_json(&json!({ "exists": exists }))
        }
    }
}

async fn run_metadata(client: &PowerDnsClient, cmd: MetadataCommand) -> Result<()> {
    match cmd {
        MetadataCommand::Get { id } => {
            let metadata = client
                .get_zone_metadata(&id)
                .await
                .with_context(|| format!("couldn't fetch PowerDNS zone metadata {id}"))?;
            print_json(&metadata)
        }
        MetadataCommand::Set { zone, kind, values } => {
            let metadata = ZoneMetadata {
                kind,
                metadata: values,
            };
            let id = client
                .update_zone_metadata(&zone, &metadata)
                .await
                .context("failed to create PowerDNS zone metadata")?;
            print_json(&json!({ "id": id }))
        }
        MetadataCommand::Delete { id } => {
            client
                .delete_zone_metadata(&id)
                .await
                .with_context(|| format!("error deleting PowerDNS zone metadata {id}"))?;
            print_json(&json!({ "ok": true }))
        }
        MetadataCommand::Exists { id } => {
            let exists = client
                .zone_metadata_exists(&id)
                .await
                .with_context(|| format!("error checking PowerDNS zone metadata {id}"))?;
            print_json(&json!({ "exists": exists }))
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
