use clap::Subcommand;
use wisdom21::dto::{SortOrder, UpdateWisdomDto, WisdomQueryDto};
use wisdom21::models::CycleState;

use crate::client::WisdomClient;
use crate::output::{self, OutputConfig};

/// Sort order accepted on the command line
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum SortArg {
    /// By category, then queue position
    Queue,
    /// Newest first
    Created,
    /// Alphabetically by text
    Text,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Queue => SortOrder::Queue,
            SortArg::Created => SortOrder::Created,
            SortArg::Text => SortOrder::Text,
        }
    }
}

/// Wisdom management commands
#[derive(Subcommand, Debug)]
pub enum WisdomCommands {
    /// List wisdom, optionally filtered
    List {
        /// Only wisdom in this state (queued, active, completed)
        #[clap(long)]
        state: Option<CycleState>,
        /// Only wisdom in this category
        #[clap(long)]
        category: Option<String>,
        /// Only favorites
        #[clap(long)]
        favorites: bool,
        /// Case-insensitive text or source search
        #[clap(long)]
        search: Option<String>,
        /// Result ordering
        #[clap(long, value_enum, default_value_t = SortArg::Queue)]
        sort: SortArg,
    },
    /// Add a new wisdom
    Add {
        /// The text of the wisdom
        text: String,
        /// Who said or wrote it
        #[clap(long)]
        source: Option<String>,
        /// Category to file it under (default: the server's default category)
        #[clap(long)]
        category: Option<String>,
    },
    /// Show a specific wisdom
    Get {
        /// The wisdom ID
        id: String,
    },
    /// Edit the text, source or category of a wisdom
    Edit {
        /// The wisdom ID
        id: String,
        /// New text
        #[clap(long)]
        text: Option<String>,
        /// New source; an empty string removes it
        #[clap(long)]
        source: Option<String>,
        /// New category
        #[clap(long)]
        category: Option<String>,
    },
    /// Delete a wisdom
    Delete {
        /// The wisdom ID
        id: String,
    },
    /// Mark a wisdom as favorite
    Favorite {
        /// The wisdom ID
        id: String,
    },
    /// Remove the favorite mark from a wisdom
    Unfavorite {
        /// The wisdom ID
        id: String,
    },
}

/// Executes a wisdom command
pub async fn execute(
    client: &WisdomClient,
    cmd: WisdomCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        WisdomCommands::List { state, category, favorites, search, sort } => {
            let query = WisdomQueryDto {
                state,
                category,
                favorite: favorites.then_some(true),
                search,
                sort: sort.into(),
            };
            let wisdom = client.list_wisdom(&query).await?;
            output::print_wisdom_list(&wisdom, config);
        }
        WisdomCommands::Add { text, source, category } => {
            let wisdom = client.create_wisdom(text, source, category).await?;
            output::print_wisdom(&wisdom, config);
        }
        WisdomCommands::Get { id } => {
            match client.get_wisdom(&id).await? {
                Some(wisdom) => output::print_wisdom(&wisdom, config),
                None => return Err(format!("Wisdom not found: {}", id).into()),
            }
        }
        WisdomCommands::Edit { id, text, source, category } => {
            let update = UpdateWisdomDto { text, source, category };
            let wisdom = client.update_wisdom(&id, update).await?;
            output::print_wisdom(&wisdom, config);
        }
        WisdomCommands::Delete { id } => {
            client.delete_wisdom(&id).await?;
            output::print_success(&format!("Deleted wisdom {}", id), config);
        }
        WisdomCommands::Favorite { id } => {
            let wisdom = client.set_favorite(&id, true).await?;
            output::print_wisdom(&wisdom, config);
        }
        WisdomCommands::Unfavorite { id } => {
            let wisdom = client.set_favorite(&id, false).await?;
            output::print_wisdom(&wisdom, config);
        }
    }
    Ok(())
}
