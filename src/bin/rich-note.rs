use clap::{Parser, Subcommand, ValueEnum};
use rich_note::sanitize::{Profile, sanitize};
use rich_note::chip::extract_chip_references;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cleans an HTML fragment through an allow-list profile
    Sanitize {
        /// Sanitization profile to apply
        #[arg(long, value_enum, default_value_t = ProfileArg::Save)]
        profile: ProfileArg,
        /// Input HTML file
        file: PathBuf,
    },
    /// Lists the chip references contained in an HTML fragment
    Refs {
        /// Input HTML file
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ProfileArg {
    /// Profile applied before persisting content
    Save,
    /// Stricter profile applied to external clipboard content
    External,
}

fn main() {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Sanitize { profile, file } => sanitize_command(*profile, file),
        Commands::Refs { file, json } => refs_command(file, *json),
    }
}

fn read_input(file: &PathBuf) -> String {
    match fs::read_to_string(file) {
        Ok(html) => html,
        Err(err) => {
            eprintln!("Error: {}: {err}", file.display());
            std::process::exit(1);
        }
    }
}

fn sanitize_command(profile: ProfileArg, file: &PathBuf) {
    let html = read_input(file);
    let profile = match profile {
        ProfileArg::Save => Profile::save(),
        ProfileArg::External => Profile::external_paste(),
    };
    println!("{}", sanitize(&html, &profile));
}

fn refs_command(file: &PathBuf, json: bool) {
    let html = read_input(file);
    let references = extract_chip_references(&html);

    if json {
        match serde_json::to_string_pretty(&references) {
            Ok(output) => println!("{output}"),
            Err(err) => {
                eprintln!("Error: {err}");
                std::process::exit(1);
            }
        }
        return;
    }

    if references.is_empty() {
        println!("No chip references.");
        return;
    }
    for reference in references {
        println!("{}\t{}", reference.kind.as_str(), reference.source_id);
    }
}
