use std::path::{Path, PathBuf};

use eyre::{Context, Result, bail};
use spheremenu::MenuItem;
use spheremenu_photos::PhotoStore;

use crate::config::{PhotoStoreConfig, ViewerConfig};

/// Spherical photo menu
///
/// If no subcommand is specified, then the menu is opened in a window.
#[derive(Debug, clap::Parser)]
#[command(version)]
pub(crate) struct Args {
    #[command(subcommand)]
    pub subcommand: Option<Subcommand>,

    /// YAML or JSON file containing a list of menu items.
    #[arg(long)]
    pub items: Option<PathBuf>,
    /// Zoom factor. Overrides the configuration file.
    #[arg(long)]
    pub scale: Option<f32>,
    /// Extra configuration file, read after the user configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum Subcommand {
    /// Manage photos in the photo store.
    Photos {
        #[command(subcommand)]
        command: PhotosCommand,
    },
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum PhotosCommand {
    /// Print all photos as JSON, newest first.
    List,
    /// Upload an image and add it to the menu.
    Upload {
        /// Image file to upload.
        file: PathBuf,
        /// Month name (such as `March`).
        #[arg(long)]
        month: String,
        /// Year.
        #[arg(long)]
        year: i32,
    },
    /// Delete a photo and its image.
    Delete {
        /// Photo ID.
        id: String,
        /// Public URL of the image.
        url: String,
    },
}

pub(crate) fn exec(subcommand: Subcommand, config: &ViewerConfig) -> Result<()> {
    match subcommand {
        Subcommand::Photos { command } => {
            let store = photo_store(&config.photo_store)?;
            match command {
                PhotosCommand::List => {
                    let photos = store.list()?;
                    println!("{}", serde_json::to_string_pretty(&photos)?);
                }
                PhotosCommand::Upload { file, month, year } => {
                    let photo = store
                        .upload_photo(&file, &month, year)
                        .wrap_err_with(|| format!("error uploading {}", file.display()))?;
                    println!("{}", serde_json::to_string_pretty(&photo)?);
                }
                PhotosCommand::Delete { id, url } => store.delete(&id, &url)?,
            }
            Ok(())
        }
    }
}

fn photo_store(config: &PhotoStoreConfig) -> Result<PhotoStore> {
    if !config.is_configured() {
        bail!(
            "photo store is not configured; set SPHEREMENU_PHOTO_STORE__URL and \
             SPHEREMENU_PHOTO_STORE__API_KEY",
        );
    }
    Ok(PhotoStore::new(&config.url, &config.api_key))
}

/// Returns the items to show: from `items_file` if given, else from the
/// photo store if configured, else the placeholder item.
pub(crate) fn load_items(items_file: Option<&Path>, config: &ViewerConfig) -> Result<Vec<MenuItem>> {
    let items = match items_file {
        Some(path) => read_items_file(path)
            .wrap_err_with(|| format!("error reading items from {}", path.display()))?,
        None if config.photo_store.is_configured() => {
            let store = photo_store(&config.photo_store)?;
            match store.list() {
                Ok(photos) => spheremenu_photos::menu_items(&photos),
                Err(e) => {
                    log::warn!("error loading photos: {e}");
                    spheremenu_photos::sample_items()
                }
            }
        }
        None => vec![],
    };

    if items.is_empty() {
        log::info!("no items; showing placeholder");
        return Ok(vec![MenuItem::placeholder()]);
    }
    Ok(items)
}

fn read_items_file(path: &Path) -> Result<Vec<MenuItem>> {
    let contents = std::fs::read_to_string(path)?;
    parse_items(&contents, path.extension().and_then(|ext| ext.to_str()))
}

fn parse_items(contents: &str, extension: Option<&str>) -> Result<Vec<MenuItem>> {
    Ok(match extension {
        Some(ext) if ext.eq_ignore_ascii_case("json") => serde_json::from_str(contents)?,
        _ => serde_norway::from_str(contents)?,
    })
}
