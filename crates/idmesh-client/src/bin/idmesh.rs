//! `idmesh` command line client

use std::process::ExitCode;

use clap::{ArgGroup, Parser};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use idmesh_api::model::ListKind;
use idmesh_client::{DirectoryClient, PeerClientConfig};

#[derive(Parser, Debug)]
#[command(name = "idmesh", version, about = "Login name directory client")]
#[command(group(
    ArgGroup::new("action")
        .required(true)
        .args(["create", "lookup", "reverse_lookup", "modify", "delete", "get"])
))]
struct Cli {
    /// Create a user with this login name
    #[arg(short = 'c', long, value_name = "LOGIN")]
    create: Option<String>,

    /// Look up a user by login name
    #[arg(short = 'l', long, value_name = "LOGIN")]
    lookup: Option<String>,

    /// Look up a user by identifier
    #[arg(short = 'r', long, value_name = "UUID")]
    reverse_lookup: Option<Uuid>,

    /// Rename a user
    #[arg(short = 'm', long, num_args = 2, value_names = ["OLD", "NEW"])]
    modify: Option<Vec<String>>,

    /// Delete a user
    #[arg(short = 'd', long, value_name = "LOGIN")]
    delete: Option<String>,

    /// List users, uuids or all
    #[arg(short = 'g', long, value_name = "KIND")]
    get: Option<ListKind>,

    /// Password, hashed before it is sent
    #[arg(short = 'p', long, default_value = "")]
    password: String,

    /// Display name for --create (defaults to $USER)
    #[arg(long)]
    real_name: Option<String>,

    /// Comma separated server addresses
    #[arg(
        short = 's',
        long,
        value_delimiter = ',',
        default_value = "127.0.0.1:5181",
        env = "IDMESH_SERVERS"
    )]
    servers: Vec<String>,
}

async fn run(cli: Cli) -> idmesh_client::Result<()> {
    let client = DirectoryClient::new(cli.servers.clone(), PeerClientConfig::default())?;

    if let Some(login_name) = cli.create {
        let real_name = cli
            .real_name
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_else(|| login_name.clone());
        let identifier = client.create(&login_name, &real_name, &cli.password).await?;
        println!("Created {} with UUID {}", login_name, identifier);
    } else if let Some(login_name) = cli.lookup {
        println!("{}", client.lookup(&login_name).await?);
    } else if let Some(identifier) = cli.reverse_lookup {
        println!("{}", client.reverse_lookup(&identifier).await?);
    } else if let Some(names) = cli.modify {
        let (old, new) = (&names[0], &names[1]);
        if client.modify(old, new, &cli.password).await? {
            println!("Renamed {} to {}", old, new);
        } else {
            println!("Unable to rename {}: unknown user or wrong password", old);
        }
    } else if let Some(login_name) = cli.delete {
        if client.delete(&login_name, &cli.password).await? {
            println!("Deleted {}", login_name);
        } else {
            println!("Unable to delete {}: unknown user or wrong password", login_name);
        }
    } else if let Some(kind) = cli.get {
        println!("{}", client.get(kind).await?);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
