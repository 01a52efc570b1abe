use clap::Parser;
use kumiki::artifact::CompiledGraph;
use kumiki::export::StaticResolver;
use kumiki::graph::DisplayGraph;
use kumiki::prelude::*;
use std::fs;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Lowers a reflected class into an interactivity node graph
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the reflected class JSON file
    class_path: String,

    /// Optional compiler options JSON file
    #[arg(short, long)]
    options: Option<String>,

    /// Optional JSON table of host object target ids
    #[arg(short, long)]
    resolver: Option<String>,

    /// Write the compiled graph in binary form to this path
    #[arg(long)]
    out: Option<String>,

    /// Write the compiled graph as pretty JSON to this path
    #[arg(long)]
    json: Option<String>,

    /// Print the graph as a tree
    #[arg(short, long)]
    print: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    run(cli);
}

fn run(cli: Cli) {
    let total_start = Instant::now();

    // --- 1. File Loading ---
    let load_start = Instant::now();
    let class_json = fs::read_to_string(&cli.class_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read class file '{}': {}",
            &cli.class_path, e
        ))
    });
    let class = ClassInfo::from_json(&class_json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load class: {}", e)));

    let options = match &cli.options {
        Some(path) => load_json::<CompilerOptions>(path, "options"),
        None => CompilerOptions::default(),
    };
    let resolver = match &cli.resolver {
        Some(path) => load_json::<StaticResolver>(path, "resolver"),
        None => StaticResolver::new(),
    };
    let load_duration = load_start.elapsed();

    // --- 2. Compilation ---
    println!("\nCompiling class '{}'...", class.name);
    let compile_start = Instant::now();
    let compiler = Compiler::builder(class)
        .with_options(options)
        .with_resolver(resolver)
        .build();
    let artifacts = compiler
        .compile()
        .unwrap_or_else(|e| exit_with_error(&format!("Compilation failed: {}", e)));
    let compile_duration = compile_start.elapsed();

    println!(
        "Compilation finished: {} nodes, {} variables, {} events in {:?}",
        artifacts.graph.nodes.len(),
        artifacts.graph.variables.len(),
        artifacts.graph.events.len(),
        compile_duration
    );

    // --- 3. Report ---
    if artifacts.diagnostics.is_empty() {
        println!("\nNo diagnostics.");
    } else {
        println!("\n{} diagnostic(s):", artifacts.diagnostics.len());
        for diagnostic in &artifacts.diagnostics {
            println!("  {}", diagnostic);
        }
    }
    println!("\n{}", artifacts.validation);

    if cli.print {
        println!("{}", DisplayGraph::new(&artifacts.graph));
    }

    // --- 4. Output ---
    let output_start = Instant::now();
    let compiled = CompiledGraph::from(artifacts);
    if let Some(path) = &cli.out {
        compiled
            .save(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to save graph: {}", e)));
        println!("Saved binary graph to '{}'", path);
    }
    if let Some(path) = &cli.json {
        let json = compiled
            .to_json_pretty()
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to encode graph: {}", e)));
        fs::write(path, json).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to write '{}': {}", path, e))
        });
        println!("Saved JSON graph to '{}'", path);
    }
    let output_duration = output_start.elapsed();

    // --- 5. Summary ---
    let total_duration = total_start.elapsed();
    println!("\n--- Performance Summary ---");
    println!("File Loading:         {:?}", load_duration);
    println!("Compilation:          {:?}", compile_duration);
    println!("Output:               {:?}", output_duration);
    println!("-----------------------------");
    println!("Total Execution:      {:?}", total_duration);
    println!();
}

fn load_json<T: serde::de::DeserializeOwned>(path: &str, what: &str) -> T {
    let json = fs::read_to_string(path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read {} file '{}': {}", what, path, e))
    });
    serde_json::from_str(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse {} JSON: {}", what, e)))
}

/// A helper function to print an error message and exit the process.
fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
