use clap::{Args, Parser, Subcommand};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tbmin_minify::{EmbeddedPolicy, Language, Minified, MinifyConfig};

#[derive(Parser)]
#[command(name = "tbmin")]
#[command(about = "tbminifier: HTML, CSS and JavaScript minifier")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Minify an HTML document, including embedded <script> and <style>
    Html(MinifyArgs),

    /// Minify a JavaScript file
    Js(MinifyArgs),

    /// Minify a stylesheet
    Css(MinifyArgs),

    /// Report constructs that would be passed through unminified
    Check {
        /// Input .html, .css or .js file
        path: String,
    },
}

#[derive(Args)]
struct MinifyArgs {
    /// Input file, or `-` for stdin
    path: String,

    /// Write output here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep comments
    #[arg(long)]
    keep_comments: bool,

    /// Leave whitespace untouched
    #[arg(long)]
    no_collapse: bool,

    /// Keep a line break where collapsed whitespace had one
    #[arg(long)]
    preserve_line_breaks: bool,

    /// Do not minify <script> bodies
    #[arg(long)]
    no_embedded_js: bool,

    /// Do not minify <style> bodies
    #[arg(long)]
    no_embedded_css: bool,

    /// Drop the `;` before `}` in CSS
    #[arg(long)]
    strip_trailing_semicolons: bool,

    /// Print size savings to stderr
    #[arg(long)]
    stats: bool,
}

impl MinifyArgs {
    fn config(&self) -> MinifyConfig {
        MinifyConfig::default()
            .with_remove_comments(!self.keep_comments)
            .with_collapse_whitespace(!self.no_collapse)
            .with_preserve_line_breaks(self.preserve_line_breaks)
            .with_minify_embedded_js(!self.no_embedded_js)
            .with_minify_embedded_css(!self.no_embedded_css)
            .with_strip_trailing_semicolons(self.strip_trailing_semicolons)
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Html(args) => cmd_minify(Language::Html, &args),
        Command::Js(args) => cmd_minify(Language::Js, &args),
        Command::Css(args) => cmd_minify(Language::Css, &args),
        Command::Check { path } => cmd_check(&path),
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .init();
}

fn read_source(path: &str) -> String {
    if path == "-" {
        let mut source = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut source) {
            eprintln!("Error reading stdin: {e}");
            std::process::exit(1);
        }
        return source;
    }

    let p = Path::new(path);
    if !p.exists() {
        eprintln!("Error: file not found: {path}");
        std::process::exit(1);
    }
    match std::fs::read_to_string(p) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading {path}: {e}");
            std::process::exit(1);
        }
    }
}

fn run(language: Language, source: &str, config: &MinifyConfig) -> Minified {
    match tbmin_minify::try_minify(language, source, EmbeddedPolicy::ALL, config) {
        Ok(minified) => minified,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("Minify error: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_minify(language: Language, args: &MinifyArgs) {
    let source = read_source(&args.path);
    let minified = run(language, &source, &args.config());

    for diagnostic in &minified.diagnostics {
        tracing::warn!(path = %args.path, "{diagnostic}; passed through verbatim");
    }

    match &args.output {
        Some(out) => {
            if let Err(e) = std::fs::write(out, &minified.output) {
                eprintln!("Error writing {}: {e}", out.display());
                std::process::exit(1);
            }
        }
        None => print!("{}", minified.output),
    }

    if args.stats {
        eprintln!("{}", stats_line(source.len(), minified.output.len()));
    }
}

fn cmd_check(path: &str) {
    let Some(language) = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(Language::from_extension)
    else {
        eprintln!("Error: cannot tell the language of {path}; use a .html, .css or .js file");
        std::process::exit(1);
    };

    let source = read_source(path);
    let minified = run(language, &source, &MinifyConfig::default());

    if !minified.is_clean() {
        for diagnostic in &minified.diagnostics {
            eprintln!("{path}: {diagnostic}");
        }
        std::process::exit(1);
    }

    eprintln!("OK: {path}");
}

fn stats_line(before: usize, after: usize) -> String {
    let saved = before.saturating_sub(after);
    let percent = if before == 0 {
        0.0
    } else {
        saved as f64 * 100.0 / before as f64
    };
    format!("{before} -> {after} bytes ({percent:.1}% saved)")
}
