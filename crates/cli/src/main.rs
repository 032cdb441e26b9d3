//! CLI tool for filling Google Slides templates and managing Drive files.

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use slides_core::{PredefinedLayout, PresentationEditor, Replacement};
use slides_google::auth::DEFAULT_SCOPES;
use slides_google::drive::{self, DriveApi};
use slides_google::{AccessToken, ApiClient, DriveClient, ServiceAccountKey, SlidesClient};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Edit Google Slides presentations and their Drive folders.
#[derive(Parser, Debug)]
#[command(name = "slides-edit")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// OAuth access token with drive and presentations scopes
    #[arg(long, env = "GOOGLE_OAUTH_ACCESS_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Service-account JSON key file to mint the access token from (overrides --token)
    #[arg(long, value_name = "KEY_FILE", global = true)]
    service_account: Option<PathBuf>,

    /// Obtain the access token from `gcloud auth print-access-token` (overrides --token)
    #[arg(long, global = true, conflicts_with = "service_account")]
    gcloud: bool,

    /// Service account to impersonate when using --gcloud
    #[arg(long, global = true, requires = "gcloud")]
    impersonate: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30", global = true)]
    timeout: u64,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace a placeholder in every slide and speaker-notes shape
    ReplaceText(ReplaceTextArgs),

    /// Replace every shape containing a placeholder with an image
    ReplaceImage {
        /// Presentation id
        presentation: String,
        /// Placeholder text to look for
        placeholder: String,
        /// Publicly reachable image URL
        image_url: String,
    },

    /// Insert a new slide
    CreateSlide {
        /// Presentation id
        presentation: String,
        /// Predefined layout (e.g. BLANK, TITLE_AND_BODY)
        #[arg(short, long, default_value = "BLANK")]
        layout: PredefinedLayout,
        /// Zero-based position of the new slide (default: end)
        #[arg(short, long)]
        index: Option<usize>,
        /// Object id to give the slide
        #[arg(long)]
        id: Option<String>,
    },

    /// Delete a slide
    DeleteSlide {
        /// Presentation id
        presentation: String,
        /// Slide object id
        slide: String,
    },

    /// Change the layout of an existing slide (not supported by the API)
    UpdateLayout {
        /// Presentation id
        presentation: String,
        /// Slide object id
        slide: String,
        /// Predefined layout
        layout: PredefinedLayout,
    },

    /// Print the text of every shape
    Inspect {
        /// Presentation id
        presentation: String,
    },

    /// Drive folder and file operations
    #[command(subcommand)]
    Drive(DriveCommand),
}

#[derive(ClapArgs, Debug)]
struct ReplaceTextArgs {
    /// Presentation id
    presentation: String,

    /// Placeholder text to replace
    placeholder: String,

    /// Replacement text (supports `1. `, `- ` lists and **bold**)
    #[arg(short, long, conflicts_with = "text_file", required_unless_present = "text_file")]
    text: Option<String>,

    /// Read the replacement text from a file (`-` for stdin)
    #[arg(short = 'f', long)]
    text_file: Option<PathBuf>,

    /// Bold title line inserted above the text
    #[arg(long)]
    title: Option<String>,

    /// Link the inserted text to this URL
    #[arg(long)]
    link: Option<String>,

    /// Font size in points
    #[arg(long)]
    font_size: Option<f64>,

    /// Space above each inserted paragraph, in points
    #[arg(long)]
    spacing: Option<f64>,
}

#[derive(Subcommand, Debug)]
enum DriveCommand {
    /// Print the id of the first folder with this name
    FindFolder {
        name: String,
        /// Parent folder id
        #[arg(short, long)]
        parent: Option<String>,
        /// Print every matching folder
        #[arg(short, long)]
        all: bool,
    },

    /// Print the id of the first file with this name
    FindFile {
        name: String,
        /// Parent folder id
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Create a folder unless one with this name already exists
    CreateFolder {
        name: String,
        /// Parent folder id
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Find a folder, creating it or merging duplicates as needed
    FindOrCreateFolder {
        name: String,
        /// Parent folder id
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Copy a presentation
    Copy {
        /// Template file id
        template: String,
        /// Name of the copy
        name: String,
        /// Destination folder id (repeatable)
        #[arg(short, long = "parent", required = true)]
        parents: Vec<String>,
        /// Delete same-named files in the destination first
        #[arg(long)]
        overwrite: bool,
    },

    /// Move a file to another folder
    Move {
        file: String,
        /// Destination folder id
        to: String,
        /// Folder id to remove the file from
        #[arg(long)]
        from: Option<String>,
    },

    /// Rename a file
    Rename { file: String, name: String },

    /// Delete a file
    Delete { file: String },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let http = api_client(&args)?;
    let slides = SlidesClient::new(http.clone());
    let drive = DriveClient::new(http);

    run(&args.command, &slides, &drive)
}

/// Build the authenticated HTTP client from the global options.
fn api_client(args: &Args) -> Result<ApiClient> {
    let token = if let Some(key_file) = &args.service_account {
        ServiceAccountKey::from_file(key_file)
            .and_then(|key| {
                AccessToken::from_service_account(
                    &key,
                    DEFAULT_SCOPES,
                    Duration::from_secs(args.timeout),
                )
            })
            .with_context(|| {
                format!(
                    "Failed to get an access token for service account key {}",
                    key_file.display()
                )
            })?
    } else if args.gcloud {
        AccessToken::from_gcloud(args.impersonate.as_deref())
            .context("Failed to get an access token from gcloud")?
    } else {
        let raw = args.token.as_deref().context(
            "No access token: pass --service-account or --token, set GOOGLE_OAUTH_ACCESS_TOKEN, or use --gcloud",
        )?;
        AccessToken::new(raw)?
    };

    ApiClient::new(token)?
        .with_timeout(Duration::from_secs(args.timeout))
        .context("Failed to create HTTP client")
}

/// Run one subcommand.
fn run(command: &Command, slides: &SlidesClient, drive: &DriveClient) -> Result<()> {
    match command {
        Command::ReplaceText(replace) => {
            let editor = PresentationEditor::new(slides, &replace.presentation);
            let replacement = build_replacement(replace)?;
            let matched = editor
                .replace_text(&replacement)
                .with_context(|| format!("Failed to replace {:?}", replace.placeholder))?;

            if matched == 0 {
                eprintln!("Placeholder {:?} not found", replace.placeholder);
            } else {
                println!("Replaced {:?} in {} shape(s)", replace.placeholder, matched);
            }
        }
        Command::ReplaceImage {
            presentation,
            placeholder,
            image_url,
        } => {
            PresentationEditor::new(slides, presentation)
                .replace_image(placeholder, image_url)
                .with_context(|| format!("Failed to replace {:?} with an image", placeholder))?;
        }
        Command::CreateSlide {
            presentation,
            layout,
            index,
            id,
        } => {
            let created = PresentationEditor::new(slides, presentation)
                .create_slide(*layout, *index, id.as_deref())
                .context("Failed to create slide")?;
            match created {
                Some(id) => println!("{}", id),
                None => log::warn!("Slide created but the server did not report its id"),
            }
        }
        Command::DeleteSlide {
            presentation,
            slide,
        } => {
            PresentationEditor::new(slides, presentation)
                .delete_slide(slide)
                .with_context(|| format!("Failed to delete slide {}", slide))?;
        }
        Command::UpdateLayout {
            presentation,
            slide,
            layout,
        } => {
            PresentationEditor::new(slides, presentation).update_slide_layout(slide, *layout)?;
        }
        Command::Inspect { presentation } => {
            let shapes = PresentationEditor::new(slides, presentation)
                .shape_texts()
                .with_context(|| format!("Failed to fetch presentation {}", presentation))?;
            for shape in shapes {
                let surface = if shape.is_notes { "notes" } else { "slide" };
                println!(
                    "[{} {}] {}: {:?}",
                    surface, shape.page_id, shape.object_id, shape.text
                );
            }
        }
        Command::Drive(command) => run_drive(drive, command)?,
    }

    Ok(())
}

/// Assemble the replacement from the command-line options.
fn build_replacement(args: &ReplaceTextArgs) -> Result<Replacement> {
    let body = match (&args.text, &args.text_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => read_text(path)?,
        (None, None) => anyhow::bail!("Either --text or --text-file is required"),
    };

    let mut replacement = Replacement::new(&args.placeholder, body);
    if let Some(title) = &args.title {
        replacement = replacement.with_title(title);
    }
    if let Some(link) = &args.link {
        replacement = replacement.with_hyperlink(link);
    }
    if let Some(size) = args.font_size {
        replacement = replacement.with_font_size(size);
    }
    if let Some(spacing) = args.spacing {
        replacement = replacement.with_paragraph_spacing(spacing);
    }

    Ok(replacement)
}

/// Read replacement text from a file, or stdin for `-`.
fn read_text(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read replacement text from stdin")?;
        return Ok(text);
    }

    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Run a Drive subcommand.
fn run_drive(drive: &DriveClient, command: &DriveCommand) -> Result<()> {
    match command {
        DriveCommand::FindFolder { name, parent, all } => {
            if *all {
                for folder in drive::find_folders(drive, name, parent.as_deref())? {
                    println!("{}\t{}", folder.id, folder.name);
                }
            } else {
                print_found(drive::find_folder(drive, name, parent.as_deref())?, name);
            }
        }
        DriveCommand::FindFile { name, parent } => {
            print_found(drive::find_file(drive, name, parent.as_deref())?, name);
        }
        DriveCommand::CreateFolder { name, parent } => {
            let folder = drive::ensure_folder(drive, name, parent.as_deref())
                .with_context(|| format!("Failed to create folder {:?}", name))?;
            println!("{}", folder.id);
        }
        DriveCommand::FindOrCreateFolder { name, parent } => {
            let folder = drive::find_or_create_folder(drive, name, parent.as_deref())
                .with_context(|| format!("Failed to find or create folder {:?}", name))?;
            println!("{}", folder.id);
        }
        DriveCommand::Copy {
            template,
            name,
            parents,
            overwrite,
        } => {
            let copy = drive::copy_presentation(drive, template, name, parents, *overwrite)
                .with_context(|| format!("Failed to copy {} as {:?}", template, name))?;
            println!("{}", copy.id);
        }
        DriveCommand::Move { file, to, from } => {
            drive
                .move_file(file, to, from.as_deref())
                .with_context(|| format!("Failed to move {}", file))?;
        }
        DriveCommand::Rename { file, name } => {
            drive
                .rename(file, name)
                .with_context(|| format!("Failed to rename {}", file))?;
        }
        DriveCommand::Delete { file } => {
            drive
                .delete(file)
                .with_context(|| format!("Failed to delete {}", file))?;
        }
    }

    Ok(())
}

/// Print a looked-up id, or report that nothing matched.
fn print_found(id: Option<String>, name: &str) {
    match id {
        Some(id) => println!("{}", id),
        None => eprintln!("No match for {:?}", name),
    }
}
