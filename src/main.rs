// src/main.rs

use anyhow::Result;
use cartridge::db::models::{Container, ContentMigration, StoredIssue};
use cartridge::{
    CartridgeConfig, CartridgeConverter, ConversionOptions, ImportOptions, MigrationIssue,
    SelectionFilter,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "cartridge")]
#[command(author, version, about = "IMS Common Cartridge importer", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a course store
    Init {
        /// Database path
        #[arg(short, long, default_value = "cartridge.db")]
        db: String,
    },
    /// Convert a cartridge and write the intermediate representation
    Convert {
        /// Path to the .imscc/.zip archive
        archive: PathBuf,
        /// Output directory for course.json, overview.json and all_files.zip
        #[arg(short, long)]
        output: PathBuf,
        /// Turn HTML files referenced by module items into pages
        #[arg(long)]
        html_to_page: bool,
    },
    /// Convert a cartridge and import it into a course
    Import {
        /// Path to the .imscc/.zip archive
        archive: PathBuf,
        /// Database path
        #[arg(short, long, default_value = "cartridge.db")]
        db: String,
        /// Course name; created when missing
        #[arg(long)]
        course: String,
        /// Selection copy map as JSON, e.g. '{"copy":{"all_wiki_pages":"1"}}'
        #[arg(short, long)]
        selection: Option<String>,
        /// Turn HTML files referenced by module items into pages
        #[arg(long)]
        html_to_page: bool,
    },
    /// Show past import runs for a course
    History {
        /// Database path
        #[arg(short, long, default_value = "cartridge.db")]
        db: String,
        /// Course name
        #[arg(long)]
        course: String,
    },
}

fn load_config(path: Option<&Path>) -> Result<CartridgeConfig> {
    match path {
        Some(path) => Ok(CartridgeConfig::load(path)?),
        None => Ok(CartridgeConfig::default()),
    }
}

fn conversion_options(config: &CartridgeConfig, html_to_page: bool) -> ConversionOptions {
    let mut options = ConversionOptions::from(&config.convert);
    options.html_to_page |= html_to_page;
    options
}

fn print_issues(issues: &[MigrationIssue]) {
    for issue in issues {
        match &issue.content {
            Some(content) => println!(
                "  [{}] {} ({} {})",
                issue.severity, issue.description, content.category, content.migration_id
            ),
            None => println!("  [{}] {}", issue.severity, issue.description),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Init { db }) => {
            info!("Initializing course store at: {}", db);
            cartridge::db::init(&db)?;
            println!("Course store initialized at: {}", db);
            Ok(())
        }
        Some(Commands::Convert {
            archive,
            output,
            html_to_page,
        }) => {
            let mut options = conversion_options(&config, html_to_page);
            options.output_dir = Some(output.clone());

            let result = CartridgeConverter::new(options).convert(&archive)?;

            println!("Converted {}", archive.display());
            for (category, count) in &result.overview.counts {
                println!("  {}: {}", category, count);
            }
            print_issues(&result.course.issues);
            println!("Output written to {}", output.display());
            Ok(())
        }
        Some(Commands::Import {
            archive,
            db,
            course,
            selection,
            html_to_page,
        }) => {
            let filter = match &selection {
                Some(json) => SelectionFilter::from_json(json)?,
                None => SelectionFilter::everything(),
            };

            let converter = CartridgeConverter::new(conversion_options(&config, html_to_page));
            let converted = converter.convert(&archive)?;

            cartridge::db::init(&db)?;
            let mut conn = cartridge::db::open(&db)?;
            let mut options = ImportOptions::from(&config.import);
            options.source = Some(archive.display().to_string());
            if options.lock_dir.is_none() {
                options.lock_dir = Some(cartridge::db::paths::lock_dir(&db));
            }

            let report =
                cartridge::import_into(&mut conn, &course, &converted.course, &filter, &options)?;

            println!(
                "Imported {} objects into '{}' (run {})",
                report.imported_count(),
                course,
                report.content_migration_id
            );
            for (category, count) in &report.counts {
                println!("  {}: {}", category, count);
            }
            print_issues(&report.issues);
            Ok(())
        }
        Some(Commands::History { db, course }) => {
            let conn = cartridge::db::open(&db)?;
            let Some(container) = Container::find_by_name(&conn, &course)? else {
                return Err(anyhow::anyhow!("Course not found: {}", course));
            };

            let runs = ContentMigration::list_for_container(&conn, container.id.unwrap_or_default())?;
            if runs.is_empty() {
                println!("No imports recorded for '{}'", course);
            }
            for run in runs {
                let run_id = run.id.unwrap_or_default();
                println!(
                    "Run {}: {} ({} objects) from {}",
                    run_id,
                    run.state,
                    run.imported_count,
                    run.source.as_deref().unwrap_or("unknown source")
                );
                let issues: Vec<_> = StoredIssue::list_for_migration(&conn, run_id)?
                    .into_iter()
                    .map(|stored| stored.issue)
                    .collect();
                print_issues(&issues);
            }
            Ok(())
        }
        None => {
            println!("Cartridge importer v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'cartridge --help' for usage information");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_import_command() {
        let cli = Cli::try_parse_from([
            "cartridge",
            "import",
            "course.imscc",
            "--db",
            "/tmp/store.db",
            "--course",
            "Biology",
            "--selection",
            r#"{"copy":{"everything":"0"}}"#,
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Import {
                archive,
                db,
                course,
                selection,
                html_to_page,
            }) => {
                assert_eq!(archive, PathBuf::from("course.imscc"));
                assert_eq!(db, "/tmp/store.db");
                assert_eq!(course, "Biology");
                assert!(selection.is_some());
                assert!(!html_to_page);
            }
            _ => panic!("expected import command"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from([
            "cartridge",
            "convert",
            "a.zip",
            "--output",
            "out",
            "--config",
            "cartridge.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("cartridge.toml")));
    }

    #[test]
    fn test_flag_overrides_config() {
        let config = CartridgeConfig::parse("[convert]\nhtml_to_page = false\n").unwrap();
        assert!(conversion_options(&config, true).html_to_page);
        assert!(!conversion_options(&config, false).html_to_page);

        let config = CartridgeConfig::parse("[convert]\nhtml_to_page = true\n").unwrap();
        assert!(conversion_options(&config, false).html_to_page);
    }
}
