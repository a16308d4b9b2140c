use clap::{Parser, ValueEnum};
use kaiwa::document::FlowBundle;
use kaiwa::prelude::*;
use std::fs;

/// A CLI tool to compose individual service flows into one master bot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the template catalog JSON file
    #[arg(default_value = "templates/catalog.json")]
    catalog: String,

    /// Template ids to include (defaults to every template in the catalog)
    #[arg(short, long, value_delimiter = ',')]
    select: Vec<String>,

    /// How the main menu organizes the merged services
    #[arg(long, value_enum, default_value_t = StyleCli::Category)]
    style: StyleCli,

    /// Display name of the composed bot
    #[arg(long, default_value = "Assistant")]
    name: String,

    /// Welcome message spoken by the main menu
    #[arg(long, default_value = "Welcome! How can I help you today?")]
    welcome: String,

    /// Leave out the synthesized support contact screen
    #[arg(long)]
    no_support: bool,

    /// The path to write the merged flow document JSON to
    #[arg(short, long, default_value = "master_bot.json")]
    output: String,

    /// Optional path to also write a deployable binary bundle to
    #[arg(short, long)]
    bundle: Option<String>,

    /// List the catalog's templates and exit
    #[arg(long)]
    list: bool,
}

/// Define a CLI-specific enum for clap to parse.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum StyleCli {
    Category,
    Flat,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let catalog = TemplateCatalog::from_file(&cli.catalog)?;

    if cli.list {
        println!("Templates in '{}':", cli.catalog);
        for entry in catalog.entries() {
            println!("  {:<24} {} [{}]", entry.id, entry.label, entry.category);
        }
        return Ok(());
    }

    let sub_flows = if cli.select.is_empty() {
        catalog.load_all()?
    } else {
        catalog.load_sub_flows(&cli.select)?
    };
    println!(
        "Loaded {} sub-flow(s) from '{}'.",
        sub_flows.len(),
        cli.catalog
    );

    let config = BotConfig {
        name: cli.name.clone(),
        welcome_message: cli.welcome.clone(),
        menu_style: match cli.style {
            StyleCli::Category => MenuStyle::Category,
            StyleCli::Flat => MenuStyle::Flat,
        },
        include_support: !cli.no_support,
    };

    println!("Merging with a {:?}-style main menu...", cli.style);
    let merger = Merger::builder(config).build();
    let document = merger.merge(&sub_flows)?;

    let json_output = document.to_json_pretty()?;
    fs::write(&cli.output, json_output)?;
    println!(
        "Successfully merged and saved the master flow to '{}'",
        cli.output
    );

    if let Some(bundle_path) = &cli.bundle {
        let bundle = FlowBundle::new(&cli.name, &document)?;
        bundle.save(bundle_path)?;
        println!("Saved deployable bundle to '{}'", bundle_path);
    }

    println!("\n--- Merge Summary ---");
    println!("Sub-flows Merged:  {}", sub_flows.len());
    println!("Total Screens:     {}", document.screens.len());
    println!("Start Screen:      {}", document.start_screen_id);

    Ok(())
}
