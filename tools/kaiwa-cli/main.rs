use clap::Parser;
use kaiwa::document::FlowBundle;
use kaiwa::prelude::*;
use kaiwa::runtime::TranscriptEntry;
use std::io::{self, Write};
use std::time::{Duration, Instant};

/// An interactive conversation runner for chatbot flow documents
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the flow document JSON file (or a `.bundle` file)
    flow_path: Option<String>,

    /// Path to a JSON fixture file mapping API URLs to canned responses
    #[arg(short, long)]
    fixtures: Option<String>,

    /// Simulated API latency in milliseconds
    #[arg(short, long)]
    latency: Option<u64>,

    /// Comma-separated 1-based choices to play automatically (e.g. "1,2,1")
    #[arg(short, long)]
    script: Option<String>,

    /// Run in interactive mode to be prompted for inputs
    #[arg(short = 'i', long, help = "Run in interactive 'human' mode")]
    human: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.human {
        run_interactive();
    } else {
        run_non_interactive(cli);
    }
}

/// Runs the CLI in non-interactive mode, taking all arguments from the command line.
fn run_non_interactive(cli: Cli) {
    let flow_path = cli.flow_path.unwrap_or_else(|| {
        exit_with_error("Flow path is required in non-interactive mode.");
    });
    let script = cli.script.as_deref().map(parse_script);

    run_conversation(flow_path, cli.fixtures, cli.latency, script);
}

/// Runs the CLI in an interactive, human-friendly mode with prompts.
fn run_interactive() {
    println!("--- Kaiwa Interactive Mode ---");

    let flow_path = prompt_for_input("Enter flow document path", Some("flows/master_bot.json"));
    let fixtures_path_str = prompt_for_input("Enter fixtures path (optional)", None);

    let fixtures_path = if fixtures_path_str.is_empty() {
        None
    } else {
        Some(fixtures_path_str)
    };

    run_conversation(flow_path, fixtures_path, None, None);
}

fn run_conversation(
    flow_path: String,
    fixtures_path: Option<String>,
    latency_ms: Option<u64>,
    script: Option<Vec<usize>>,
) {
    let total_start = Instant::now();

    // --- 1. Document Loading ---
    let load_start = Instant::now();
    let document = if flow_path.ends_with(".bundle") {
        let bundle = FlowBundle::from_file(&flow_path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to load bundle '{}': {}", &flow_path, e))
        });
        println!("Loaded bundle: {}", bundle.name);
        bundle.document().unwrap_or_else(|e| {
            exit_with_error(&format!("Bundle '{}' is not usable: {}", &flow_path, e))
        })
    } else {
        let (document, warnings) = FlowDocument::from_json_file(&flow_path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to load flow '{}': {}", &flow_path, e))
        });
        for warning in &warnings {
            println!("  warning: {}", warning);
        }
        document
    };
    let load_duration = load_start.elapsed();

    let fixtures = match fixtures_path {
        Some(path) => FixtureSet::from_file(&path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to load fixtures '{}': {}", &path, e))
        }),
        None => FixtureSet::new(),
    };

    let mut builder = ChatSession::builder(document).with_fixtures(fixtures);
    if let Some(ms) = latency_ms {
        builder = builder.with_api_latency(Duration::from_millis(ms));
    }
    let mut session = builder.build();

    // --- 2. Conversation ---
    println!(
        "\nStarting conversation ({} screens)...\n",
        session.document().screens.len()
    );
    let chat_start = Instant::now();
    let mut step = session.start();
    print_entries(&step.entries);

    let mut scripted = script.map(|plays| plays.into_iter());
    let mut turns = 0usize;
    while step.state == SessionState::AwaitingChoice {
        println!("\n{}", TranscriptFormatter::format_choices(&step.choices));
        let available = step.choices.len();

        let pick = match &mut scripted {
            Some(plays) => match plays.next() {
                Some(n) if n >= 1 && n <= available => {
                    println!("> {}", n);
                    n
                }
                Some(n) => exit_with_error(&format!(
                    "Scripted choice {} is out of range (1..={})",
                    n, available
                )),
                None => {
                    println!("(script exhausted; leaving the conversation open)");
                    break;
                }
            },
            None => loop {
                let line = prompt_for_input("Enter choice", None);
                match line.parse::<usize>() {
                    Ok(n) if n >= 1 && n <= available => break n,
                    _ => println!(
                        "Invalid choice. Please enter a number between 1 and {}.",
                        available
                    ),
                }
            },
        };

        step = session
            .choose(pick - 1)
            .unwrap_or_else(|e| exit_with_error(&format!("Choice failed: {}", e)));
        print_entries(&step.entries);
        turns += 1;
    }
    let chat_duration = chat_start.elapsed();

    match session.state() {
        SessionState::Finished => println!("\nConversation finished."),
        SessionState::Idle => println!("\nConversation halted (nothing further to show)."),
        SessionState::AwaitingChoice => {}
    }

    // --- 3. Summary ---
    let total_duration = total_start.elapsed();
    println!("\n--- Session Summary ---");
    println!("Screens:            {}", session.document().screens.len());
    println!("Turns Taken:        {}", turns);
    println!("Variables Set:      {}", session.variables().len());
    println!("Transcript Lines:   {}", session.history().len());

    println!("\n--- Performance Summary ---");
    println!("Document Loading:   {:?}", load_duration);
    println!("Conversation:       {:?}", chat_duration);
    println!("---------------------------");
    println!("Total Execution:    {:?}", total_duration);
    println!();
}

fn print_entries(entries: &[TranscriptEntry]) {
    for entry in entries {
        println!("{}", entry);
    }
}

/// Parses a comma-separated list of 1-based choice numbers.
fn parse_script(raw: &str) -> Vec<usize> {
    raw.split(',')
        .map(|token| {
            token.trim().parse::<usize>().unwrap_or_else(|_| {
                exit_with_error(&format!(
                    "Invalid script entry '{}'; expected a 1-based choice number",
                    token
                ))
            })
        })
        .collect()
}

/// A helper function to prompt the user and read a line of input.
fn prompt_for_input(prompt_text: &str, default: Option<&str>) -> String {
    let mut line = String::new();
    let default_prompt = default.map_or("".to_string(), |d| format!(" [default: {}]", d));

    print!("> {}{}: ", prompt_text, default_prompt);
    io::stdout().flush().unwrap();

    io::stdin()
        .read_line(&mut line)
        .expect("Failed to read line");
    let trimmed = line.trim().to_string();

    if trimmed.is_empty() {
        default.unwrap_or("").to_string()
    } else {
        trimmed
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
