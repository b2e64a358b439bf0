use crate::payments::PaymentMethod;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "visionsave")]
#[command(about = "Hover-to-download image saver with a daily free quota")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("VISIONSAVE_GIT_SHA"), ")"))]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG is honoured)
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the user record as the popup renders it
    Status,

    /// Ask the coordinator to download an image URL directly
    Download { url: String },

    /// Simulate hovering over an image element
    Hover {
        /// Image source of the hovered element
        url: String,

        /// Class attribute of the hovered element
        #[arg(long)]
        class: Option<String>,

        /// Id attribute of the hovered element
        #[arg(long)]
        id: Option<String>,

        /// Leave the element after this many milliseconds (default: stay)
        #[arg(long)]
        hold_ms: Option<u64>,
    },

    /// Submit a manual payment for Premium
    Pay {
        /// Mobile number used to send the payment
        #[arg(long)]
        phone: String,

        /// bkash or nagad
        #[arg(long, value_parser = parse_method)]
        method: PaymentMethod,
    },

    /// List payment requests
    Requests,

    /// Approve a pending payment request
    Approve { id: String },

    /// Reject a pending payment request
    Reject { id: String },

    /// Payment totals and estimated revenue
    Stats,

    /// Handle one protocol request given as JSON and print the response
    Protocol { json: String },

    /// Keep one coordinator running and answer JSON requests line by line
    Serve {
        /// Listen on the visionsave socket instead of stdin/stdout
        #[arg(long)]
        socket: bool,
    },
}

fn parse_method(value: &str) -> Result<PaymentMethod, String> {
    value.parse()
}
