use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

use lazyarr::diag::{line_col, Diagnostic};

#[derive(Debug, Clone, clap::ValueEnum)]
enum EmitStage {
    Graph,
    Dot,
    Json,
    BuildInfo,
}

#[derive(Parser, Debug)]
#[command(
    name = "lazyarr",
    version,
    about = "Builds a lazy symbolic array graph from an array script"
)]
struct Cli {
    /// Input script file
    source: PathBuf,

    /// Output file path (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output form
    #[arg(long, value_enum, default_value_t = EmitStage::Graph)]
    emit: EmitStage,

    /// Print phases and timing
    #[arg(long)]
    verbose: bool,
}

fn report(path: &str, source: &str, diag: &Diagnostic) {
    let (line, col) = line_col(source, diag.span.start);
    eprintln!("lazyarr: {}:{}:{}: {}", path, line, col, diag);
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        eprintln!("lazyarr: source = {}", cli.source.display());
        match &cli.output {
            Some(path) => eprintln!("lazyarr: output = {}", path.display()),
            None => eprintln!("lazyarr: output = <stdout>"),
        }
        eprintln!("lazyarr: emit   = {:?}", cli.emit);
    }

    // ── Read source ──
    let source = match std::fs::read_to_string(&cli.source) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("lazyarr: error: {}: {}", cli.source.display(), e);
            std::process::exit(2);
        }
    };
    let path = cli.source.display().to_string();

    // ── Parse and evaluate ──
    let result = lazyarr::pipeline::run(&source, cli.verbose, |_, diags| {
        for diag in diags {
            report(&path, &source, diag);
        }
    });
    if result.has_errors() {
        std::process::exit(1);
    }
    let graph = &result.session.graph;

    // ── Emit ──
    let rendered = match cli.emit {
        EmitStage::Graph => Ok(graph.to_string()),
        EmitStage::Dot => Ok(lazyarr::dot::emit_dot(graph)),
        EmitStage::Json => lazyarr::export::to_json(graph).map(|json| json + "\n"),
        EmitStage::BuildInfo => {
            lazyarr::export::compute_provenance(&source, graph).map(|p| p.to_json())
        }
    };
    let rendered = match rendered {
        Ok(text) => text,
        Err(e) => {
            eprintln!("lazyarr: error: serialization failed: {}", e);
            std::process::exit(2);
        }
    };

    let written = match &cli.output {
        Some(path) => std::fs::write(path, rendered.as_bytes()),
        None => std::io::stdout().write_all(rendered.as_bytes()),
    };
    if let Err(e) = written {
        eprintln!("lazyarr: error: write failed: {}", e);
        std::process::exit(2);
    }
    if cli.verbose {
        eprintln!("lazyarr: wrote {} bytes", rendered.len());
    }
}
