use chrono::NaiveDate;
use clap::Subcommand;

use crate::client::WisdomClient;
use crate::output::{self, OutputConfig};

/// Commands that move wisdom through the 21/21 cycle
#[derive(Subcommand, Debug)]
pub enum CycleCommands {
    /// Start the 21-day cycle of a wisdom (restarts a completed one)
    Activate {
        /// The wisdom ID
        id: String,
    },
    /// Take a wisdom out of its cycle and back to the end of its queue
    Deactivate {
        /// The wisdom ID
        id: String,
    },
    /// Record that a wisdom was shown once
    Expose {
        /// The wisdom ID
        id: String,
    },
    /// Activate the wisdom at the front of the queue
    NextQueued {
        /// Only take from this category's queue
        #[clap(long)]
        category: Option<String>,
    },
    /// Apply the daily rollover
    Rollover {
        /// The day to roll over as YYYY-MM-DD, not after today (default: today on the server)
        #[clap(long)]
        day: Option<NaiveDate>,
    },
    /// List all active wisdom
    Active,
}

/// Executes a cycle command
pub async fn execute(
    client: &WisdomClient,
    cmd: CycleCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        CycleCommands::Activate { id } => {
            let wisdom = client.activate(&id).await?;
            output::print_wisdom(&wisdom, config);
        }
        CycleCommands::Deactivate { id } => {
            let wisdom = client.deactivate(&id).await?;
            output::print_wisdom(&wisdom, config);
        }
        CycleCommands::Expose { id } => {
            let result = client.record_exposure(&id).await?;
            output::print_exposure(&result, config);
        }
        CycleCommands::NextQueued { category } => {
            match client.activate_next(category.as_deref()).await? {
                Some(wisdom) => output::print_wisdom(&wisdom, config),
                None => output::print_success("Queue is empty, nothing activated", config),
            }
        }
        CycleCommands::Rollover { day } => {
            let result = client.rollover(day).await?;
            output::print_rollover(&result, config);
        }
        CycleCommands::Active => {
            let active = client.list_active().await?;
            output::print_wisdom_list(&active, config);
        }
    }
    Ok(())
}
