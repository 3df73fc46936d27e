mod config;
mod database;
mod entities;
mod error;
mod limits;
mod logging;
mod projection;
mod services;
#[cfg(test)]
mod test_utils;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use clap::{Args as ClapArgs, Parser, Subcommand};
use color_eyre::{Result, eyre::Context, eyre::eyre};
use serde::Serialize;

use crate::{
    config::Config,
    database::Database,
    logging::init_tracing,
    projection::START_TIME_FORMAT,
    services::{
        artist::{ArtistChanges, ArtistService, NewArtist},
        show::ShowService,
        venue::{NewVenue, VenueChanges, VenueService},
    },
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "BOOKING_DIRECTORY_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter, overrides the config file (e.g. "debug", "booking_directory=trace")
    #[arg(long, global = true, env = "LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(subcommand)]
    Config(ConfigCommands),
    #[command(flatten)]
    Directory(DirectoryCommands),
}

/// Commands that work against the database
#[derive(Subcommand, Debug)]
enum DirectoryCommands {
    #[command(subcommand)]
    Venue(VenueCommands),
    #[command(subcommand)]
    Artist(ArtistCommands),
    #[command(subcommand)]
    Show(ShowCommands),
}

/// Which shows to list relative to the current time
#[derive(ClapArgs, Debug)]
struct ShowWindow {
    /// Only shows that have not started yet
    #[arg(long, conflicts_with = "past")]
    upcoming: bool,

    /// Only shows that have already started
    #[arg(long)]
    past: bool,
}

#[derive(Subcommand, Debug)]
enum VenueCommands {
    /// Add a venue to the directory
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        image_link: Option<String>,
        #[arg(long)]
        facebook_link: Option<String>,
        /// The venue is looking for artists to book
        #[arg(long)]
        seeking_talent: bool,
        /// Genre tag, may be repeated
        #[arg(long = "genre")]
        genres: Vec<String>,
        #[arg(long)]
        seeking_description: Option<String>,
    },
    /// Change fields of a venue, pass "" to clear a text field
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        image_link: Option<String>,
        #[arg(long)]
        facebook_link: Option<String>,
        #[arg(long)]
        seeking_talent: Option<bool>,
        /// Replaces all genres, may be repeated
        #[arg(long = "genre")]
        genres: Option<Vec<String>>,
        #[arg(long)]
        seeking_description: Option<String>,
    },
    /// Print a venue
    Get { id: i64 },
    /// List all venues
    List,
    /// Delete a venue and all of its shows
    Delete { id: i64 },
    /// List the shows at a venue
    Shows {
        id: i64,
        #[command(flatten)]
        window: ShowWindow,
    },
    /// List the artists who have played or will play at a venue
    Artists { id: i64 },
}

#[derive(Subcommand, Debug)]
enum ArtistCommands {
    /// Add an artist to the directory
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        image_link: Option<String>,
        #[arg(long)]
        facebook_link: Option<String>,
        /// The artist is looking for venues to play
        #[arg(long)]
        seeking_venue: bool,
        /// Genre tag, may be repeated
        #[arg(long = "genre")]
        genres: Vec<String>,
        #[arg(long)]
        seeking_description: Option<String>,
    },
    /// Change fields of an artist, pass "" to clear a text field
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        image_link: Option<String>,
        #[arg(long)]
        facebook_link: Option<String>,
        #[arg(long)]
        seeking_venue: Option<bool>,
        /// Replaces all genres, may be repeated
        #[arg(long = "genre")]
        genres: Option<Vec<String>>,
        #[arg(long)]
        seeking_description: Option<String>,
    },
    /// Print an artist
    Get { id: i64 },
    /// List all artists
    List,
    /// Delete an artist and all of their shows
    Delete { id: i64 },
    /// List the shows of an artist
    Shows {
        id: i64,
        #[command(flatten)]
        window: ShowWindow,
    },
    /// List the venues an artist has played or will play at
    Venues { id: i64 },
}

#[derive(Subcommand, Debug)]
enum ShowCommands {
    /// Book an artist at a venue
    Schedule {
        #[arg(long)]
        artist_id: i64,
        #[arg(long)]
        venue_id: i64,
        /// Start time in UTC, "YYYY-MM-DD HH:MM:SS"
        #[arg(long, value_parser = parse_start_time)]
        start_time: DateTime<Utc>,
    },
    /// Move a show to a new start time
    Reschedule {
        id: i64,
        #[arg(long, value_parser = parse_start_time)]
        start_time: DateTime<Utc>,
    },
    /// Point a show at a different artist and venue
    Reassign {
        id: i64,
        #[arg(long)]
        artist_id: i64,
        #[arg(long)]
        venue_id: i64,
    },
    /// Cancel a show
    Cancel { id: i64 },
    /// List all shows
    List,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

fn parse_start_time(s: &str) -> Result<DateTime<Utc>, String> {
    NaiveDateTime::parse_from_str(s, START_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("`{}` is not a \"YYYY-MM-DD HH:MM:SS\" time: {}", s, e))
}

/// An empty value given to `update` clears the column
fn clearable(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| if v.is_empty() { None } else { Some(v) })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    let command = match args.command {
        Commands::Config(command) => return run_config_command(command, args.config),
        Commands::Directory(command) => command,
    };

    let config = match &args.config {
        Some(path) => Config::from_file(path),
        None => Config::load(),
    }
    .with_context(|| "Failed to load booking-directory config")?;

    let log_level = args.log_level.as_deref().unwrap_or(&config.log_level);
    let telemetry = init_tracing(log_level, config.otlp_endpoint.as_deref())?;

    let database_path = config.database_path()?;
    log::debug!("Opening database at: {}", database_path.display());
    let database = Arc::new(Database::open(&database_path).await?);

    let result = run(command, &config, database).await;

    telemetry.shutdown()?;
    result
}

fn run_config_command(command: ConfigCommands, config: Option<PathBuf>) -> Result<()> {
    let path = match config {
        Some(path) => path,
        None => Config::config_path().ok_or(eyre!("Could not find a config directory"))?,
    };
    match command {
        ConfigCommands::CreateDefault => {
            if Config::create_default(&path)? {
                println!("Created config file at: {}", path.display());
            } else {
                println!("Config file already exists at: {}", path.display());
            }
        }
        ConfigCommands::Path => println!("{}", path.display()),
    }
    Ok(())
}

async fn run(command: DirectoryCommands, config: &Config, database: Arc<Database>) -> Result<()> {
    let venues = VenueService::new(database.clone(), config.length_policy);
    let artists = ArtistService::new(database.clone(), config.length_policy);
    let shows = ShowService::new(database);

    match command {
        DirectoryCommands::Venue(command) => match command {
            VenueCommands::Add {
                name,
                city,
                state,
                address,
                phone,
                image_link,
                facebook_link,
                seeking_talent,
                genres,
                seeking_description,
            } => {
                let venue = venues
                    .create(NewVenue {
                        name,
                        city,
                        state,
                        address,
                        phone,
                        image_link,
                        facebook_link,
                        seeking_talent: Some(seeking_talent),
                        genres,
                        seeking_description,
                    })
                    .await
                    .wrap_err("Failed to add venue")?;
                print_json(&venue)?;
            }
            VenueCommands::Update {
                id,
                name,
                city,
                state,
                address,
                phone,
                image_link,
                facebook_link,
                seeking_talent,
                genres,
                seeking_description,
            } => {
                let venue = venues
                    .update(
                        id,
                        VenueChanges {
                            name,
                            city: clearable(city),
                            state: clearable(state),
                            address: clearable(address),
                            phone: clearable(phone),
                            image_link: clearable(image_link),
                            facebook_link: clearable(facebook_link),
                            seeking_talent,
                            genres,
                            seeking_description: clearable(seeking_description),
                        },
                    )
                    .await
                    .wrap_err("Failed to update venue")?;
                print_json(&venue)?;
            }
            VenueCommands::Get { id } => print_json(&venues.get(id).await?)?,
            VenueCommands::List => print_json(&venues.list().await?)?,
            VenueCommands::Delete { id } => {
                venues.delete(id).await?;
                println!("Deleted venue {id}");
            }
            VenueCommands::Shows { id, window } => {
                let now = Utc::now();
                let listed = if window.upcoming {
                    venues.upcoming_shows(id, now).await?
                } else if window.past {
                    venues.past_shows(id, now).await?
                } else {
                    venues.shows(id).await?
                };
                print_json(&listed)?;
            }
            VenueCommands::Artists { id } => print_json(&venues.artists(id).await?)?,
        },
        DirectoryCommands::Artist(command) => match command {
            ArtistCommands::Add {
                name,
                city,
                state,
                phone,
                image_link,
                facebook_link,
                seeking_venue,
                genres,
                seeking_description,
            } => {
                let artist = artists
                    .create(NewArtist {
                        name,
                        city,
                        state,
                        phone,
                        image_link,
                        facebook_link,
                        seeking_venue: Some(seeking_venue),
                        genres,
                        seeking_description,
                    })
                    .await
                    .wrap_err("Failed to add artist")?;
                print_json(&artist)?;
            }
            ArtistCommands::Update {
                id,
                name,
                city,
                state,
                phone,
                image_link,
                facebook_link,
                seeking_venue,
                genres,
                seeking_description,
            } => {
                let artist = artists
                    .update(
                        id,
                        ArtistChanges {
                            name,
                            city: clearable(city),
                            state: clearable(state),
                            phone: clearable(phone),
                            image_link: clearable(image_link),
                            facebook_link: clearable(facebook_link),
                            seeking_venue,
                            genres,
                            seeking_description: clearable(seeking_description),
                        },
                    )
                    .await
                    .wrap_err("Failed to update artist")?;
                print_json(&artist)?;
            }
            ArtistCommands::Get { id } => print_json(&artists.get(id).await?)?,
            ArtistCommands::List => print_json(&artists.list().await?)?,
            ArtistCommands::Delete { id } => {
                artists.delete(id).await?;
                println!("Deleted artist {id}");
            }
            ArtistCommands::Shows { id, window } => {
                let now = Utc::now();
                let listed = if window.upcoming {
                    artists.upcoming_shows(id, now).await?
                } else if window.past {
                    artists.past_shows(id, now).await?
                } else {
                    artists.shows(id).await?
                };
                print_json(&listed)?;
            }
            ArtistCommands::Venues { id } => print_json(&artists.venues(id).await?)?,
        },
        DirectoryCommands::Show(command) => match command {
            ShowCommands::Schedule {
                artist_id,
                venue_id,
                start_time,
            } => {
                let show = shows
                    .schedule(artist_id, venue_id, start_time)
                    .await
                    .map_err(|e| {
                        if e.is_referential_integrity() {
                            eyre!("Artist {artist_id} or venue {venue_id} does not exist: {e}")
                        } else {
                            eyre!(e).wrap_err("Failed to schedule show")
                        }
                    })?;
                print_json(&shows.show_artist(&show).await?)?;
            }
            ShowCommands::Reschedule { id, start_time } => {
                print_json(&shows.reschedule(id, start_time).await?)?
            }
            ShowCommands::Reassign {
                id,
                artist_id,
                venue_id,
            } => print_json(&shows.reassign(id, artist_id, venue_id).await?)?,
            ShowCommands::Cancel { id } => {
                shows.cancel(id).await?;
                println!("Cancelled show {id}");
            }
            ShowCommands::List => print_json(&shows.list().await?)?,
        },
    }

    Ok(())
}
