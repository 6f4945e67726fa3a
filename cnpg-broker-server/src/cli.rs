use clap::{Parser, Subcommand};

/// CNPG Broker - Open Service Broker for CloudNativePG PostgreSQL clusters
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Broker URL for client commands
    #[arg(long, global = true, env = "BROKER_API_URL", default_value = "http://localhost:8080")]
    pub url: String,

    /// Output format for client commands (table or json)
    #[arg(short, long, global = true, default_value = "table")]
    pub output: String,

    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Subcommand, Debug)]
pub enum Mode {
    /// Run the broker server
    Serve {
        /// API port (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List offered services and plans
    Catalog,

    /// Provision a PostgreSQL instance
    Provision {
        /// Instance id (lowercase UUID v4)
        instance_id: String,

        /// Service offering id
        #[arg(long)]
        service: String,

        /// Plan id
        #[arg(long)]
        plan: String,
    },

    /// Show the status of an instance
    Status {
        instance_id: String,
    },

    /// Move an instance to another plan
    Update {
        instance_id: String,

        #[arg(long)]
        service: String,

        #[arg(long)]
        plan: String,
    },

    /// Delete an instance and all its resources
    Deprovision {
        instance_id: String,
    },

    /// Create a binding and print its credentials
    Bind {
        instance_id: String,
        binding_id: String,
    },

    /// Remove a binding
    Unbind {
        instance_id: String,
        binding_id: String,
    },
}
