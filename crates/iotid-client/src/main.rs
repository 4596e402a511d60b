/*!
 * iotid operator client
 *
 * Drives the iotid admin and enrollment APIs:
 * 1. Create organizations
 * 2. Pre-register devices and manage their status
 * 3. Submit enrollment assertions on behalf of a device
 * 4. Bootstrap a development platform CA
 *
 * Usage:
 *   iotid org create Acme --country US
 *   iotid device register --org Acme --brand acme --model drone-1000 --serial SN-001
 *   iotid enroll ./assertions.txt
 *   iotid device status Acme SN-001 disabled
 */

mod commands;
mod types;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::ApiClient;

// CLI structure
#[derive(Parser)]
#[command(name = "iotid")]
#[command(about = "Operator client for the iotid device identity service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Admin API URL
    #[arg(short, long, env = "IOTID_SERVER", default_value = "http://127.0.0.1:8040")]
    server: String,

    /// Enrollment API URL
    #[arg(long, env = "IOTID_ENROLL_SERVER", default_value = "http://127.0.0.1:8041")]
    enroll_server: String,

    /// Bearer token for the admin API
    #[arg(short, long, env = "IOTID_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage organizations
    #[command(subcommand)]
    Org(OrgCommands),
    /// Manage devices
    #[command(subcommand)]
    Device(DeviceCommands),
    /// Enroll a device from a file holding its model and serial assertions
    Enroll {
        /// Assertions file
        file: PathBuf,

        /// Print the issued certificate and private key
        #[arg(long)]
        show_credentials: bool,
    },
    /// Write a self-signed platform CA (ca.crt, ca.key) for development
    CaInit {
        /// Target directory
        dir: PathBuf,

        /// CA common name
        #[arg(long, default_value = "iotid Platform CA")]
        common_name: String,

        /// Replace an existing CA
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum OrgCommands {
    /// Create an organization
    Create {
        name: String,

        /// Country code placed in the server certificate
        #[arg(short, long, default_value = "")]
        country: String,
    },
    /// List organizations
    List,
    /// Show an organization by id or name
    Show {
        org: String,

        /// Print the server certificate
        #[arg(long)]
        cert: bool,
    },
}

#[derive(Subcommand)]
enum DeviceCommands {
    /// Pre-register a device
    Register {
        /// Organization id or name
        #[arg(short, long)]
        org: String,

        #[arg(short, long)]
        brand: String,

        #[arg(short, long)]
        model: String,

        #[arg(short, long)]
        serial: String,

        /// Free-form device data
        #[arg(short, long, default_value = "")]
        data: String,
    },
    /// List the devices of an organization
    List { org: String },
    /// Show a device by id or serial number
    Show {
        org: String,
        device: String,

        /// Print the issued certificate and private key
        #[arg(long)]
        show_credentials: bool,
    },
    /// Set a device's status (waiting or disabled) and/or device data
    Status {
        org: String,
        device: String,

        /// waiting, disabled, or the numeric status
        status: Option<String>,

        /// Replace the device data
        #[arg(short, long)]
        data: Option<String>,
    },
    /// Delete a device by id
    Delete { device_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let admin = ApiClient::new(&cli.server, cli.token.as_deref());

    match cli.command {
        Commands::Org(OrgCommands::Create { name, country }) => {
            commands::org::create_organization(&admin, &name, &country).await?
        }

        Commands::Org(OrgCommands::List) => commands::org::list_organizations(&admin).await?,

        Commands::Org(OrgCommands::Show { org, cert }) => {
            commands::org::show_organization(&admin, &org, cert).await?
        }

        Commands::Device(DeviceCommands::Register {
            org,
            brand,
            model,
            serial,
            data,
        }) => {
            commands::device::register_device(
                &admin,
                commands::device::NewDevice {
                    organization: &org,
                    brand: &brand,
                    model: &model,
                    serial_number: &serial,
                    device_data: &data,
                },
            )
            .await?
        }

        Commands::Device(DeviceCommands::List { org }) => {
            commands::device::list_devices(&admin, &org).await?
        }

        Commands::Device(DeviceCommands::Show {
            org,
            device,
            show_credentials,
        }) => commands::device::show_device(&admin, &org, &device, show_credentials).await?,

        Commands::Device(DeviceCommands::Status {
            org,
            device,
            status,
            data,
        }) => {
            if status.is_none() && data.is_none() {
                anyhow::bail!("Nothing to update: give a status and/or --data");
            }
            let status = status
                .as_deref()
                .map(commands::device::parse_status)
                .transpose()?;
            commands::device::update_device(
                &admin,
                &org,
                &device,
                types::UpdateDeviceRequest {
                    status,
                    device_data: data,
                },
            )
            .await?
        }

        Commands::Device(DeviceCommands::Delete { device_id }) => {
            commands::device::delete_device(&admin, &device_id).await?
        }

        Commands::Enroll {
            file,
            show_credentials,
        } => {
            let enroll = ApiClient::new(&cli.enroll_server, None);
            commands::enroll::enroll(&enroll, &file, show_credentials).await?
        }

        Commands::CaInit {
            dir,
            common_name,
            force,
        } => commands::ca::init_ca(&dir, &common_name, force)?,
    }

    Ok(())
}
