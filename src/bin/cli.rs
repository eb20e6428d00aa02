use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::process;

use clap::{CommandFactory, Parser as ClapParser};

use httpwire::{
    collect_message_with, format_debug, format_headers_only, format_json, Mode, ParserOptions,
};

/// httpsm — strict, dual-mode HTTP/1.1 message parser CLI.
///
/// Reads a raw HTTP request or response from a file, --raw string, or stdin
/// and outputs a structured representation in the chosen format.
///
/// Escape sequences (\r, \n, \t, \\) in the --raw value are interpreted so
/// you can pass a full HTTP message as a single shell argument.
#[derive(ClapParser)]
#[command(name = "httpsm", version, about, long_about = None)]
struct Cli {
    /// Path to a file containing a raw HTTP message.
    /// Reads from stdin when neither FILE nor --raw is given.
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Raw HTTP message string (escape sequences \r \n \t \\ are expanded).
    #[arg(long)]
    raw: Option<String>,

    /// Output format.
    #[arg(short, long, default_value = "json", value_enum)]
    format: OutputFormat,

    /// Pretty-print JSON output (ignored for other formats).
    #[arg(short, long)]
    pretty: bool,

    /// Which start-line grammar to attempt.
    #[arg(long, default_value = "auto", value_enum)]
    mode: CliMode,

    /// Maximum allowed length, in bytes, of the request-line or status-line.
    #[arg(long, default_value = "4096")]
    max_line_length: u32,

    /// Maximum number of leading empty (CRLF) lines tolerated before the start line.
    #[arg(long, default_value = "10")]
    max_empty_lines: u32,

    /// Enable tracing output (respects RUST_LOG; implies "debug" if unset).
    #[arg(short, long)]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable debug output
    Debug,
    /// Start-line + headers only
    Headers,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum CliMode {
    Auto,
    Request,
    Response,
}

impl From<CliMode> for Mode {
    fn from(m: CliMode) -> Self {
        match m {
            CliMode::Auto => Mode::Auto,
            CliMode::Request => Mode::Request,
            CliMode::Response => Mode::Response,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // When no input source is provided and stdin is a terminal (not piped),
    // show help instead of blocking.
    if cli.file.is_none() && cli.raw.is_none() && std::io::stdin().is_terminal() {
        Cli::command().print_help().ok();
        println!();
        process::exit(0);
    }

    let data = match read_input(&cli) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error reading input: {e}");
            process::exit(1);
        }
    };

    if data.is_empty() {
        eprintln!("Error: empty input");
        process::exit(1);
    }

    let options = ParserOptions {
        mode: cli.mode.into(),
        max_line_length: cli.max_line_length,
        max_empty_lines: cli.max_empty_lines,
    };

    let message = match collect_message_with(options, &data) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Parse error: {e}");
            process::exit(2);
        }
    };

    let output = match cli.format {
        OutputFormat::Json => format_json(&message, cli.pretty),
        OutputFormat::Debug => format_debug(&message),
        OutputFormat::Headers => format_headers_only(&message),
    };

    print!("{output}");
}

/// Read raw HTTP bytes from --raw, a file, or stdin.
fn read_input(cli: &Cli) -> Result<Vec<u8>, std::io::Error> {
    if let Some(raw) = &cli.raw {
        return Ok(unescape(raw).into_bytes());
    }
    match &cli.file {
        Some(path) => std::fs::read(path),
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Expand C-style escape sequences (`\r`, `\n`, `\t`, `\\`) in a string.
///
/// Any other `\X` sequence is kept as-is (both the backslash and `X`).
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('r') => out.push('\r'),
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescape_expands_known_sequences() {
        assert_eq!(unescape(r"a\r\nb\tc"), "a\r\nb\tc");
    }

    #[test]
    fn unescape_preserves_unknown_sequences() {
        assert_eq!(unescape(r"a\zb"), r"a\zb");
    }

    #[test]
    fn unescape_trailing_backslash_is_kept() {
        assert_eq!(unescape(r"a\"), r"a\");
    }

    #[test]
    fn cli_mode_converts_to_parser_mode() {
        assert_eq!(Mode::from(CliMode::Auto), Mode::Auto);
        assert_eq!(Mode::from(CliMode::Request), Mode::Request);
        assert_eq!(Mode::from(CliMode::Response), Mode::Response);
    }
}
