use clap::Subcommand;

use crate::client::WisdomClient;
use crate::output::{self, OutputConfig};

/// Category management commands
#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// List categories with queued, active and completed counts
    List,
    /// Rename a category, merging it if the new name already exists
    Rename {
        /// Current name
        name: String,
        /// New name
        new_name: String,
    },
    /// Delete a category, moving its wisdom to the default category
    Delete {
        /// Category name
        name: String,
    },
}

/// Executes a category command
pub async fn execute(
    client: &WisdomClient,
    cmd: CategoryCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        CategoryCommands::List => {
            let categories = client.list_categories().await?;
            output::print_categories(&categories, config);
        }
        CategoryCommands::Rename { name, new_name } => {
            let result = client.rename_category(&name, new_name.clone()).await?;
            output::print_success(
                &format!("Renamed {} to {} ({} wisdom moved)", name, new_name, result.affected),
                config,
            );
        }
        CategoryCommands::Delete { name } => {
            let result = client.delete_category(&name).await?;
            output::print_success(
                &format!("Deleted category {} ({} wisdom moved)", name, result.affected),
                config,
            );
        }
    }
    Ok(())
}
