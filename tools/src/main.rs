use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glob::Pattern;
use schema::layout_fingerprint;
use tools::{decode_frame_json, format_decode_pretty, format_inspect, inspect_frame, load_layout};

#[derive(Parser)]
#[command(
    name = "statepack-tools",
    version,
    about = "statepack frame inspection and decoding tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect frame structure and sizes.
    Inspect {
        /// Path to a frame file or a directory of frames.
        frame_path: PathBuf,
        /// Layout JSON the frames were produced with.
        #[arg(long)]
        layout: PathBuf,
        /// Optional glob filter when inspecting a directory.
        #[arg(long)]
        glob: Option<String>,
        /// Sort inspected frames.
        #[arg(long, value_enum)]
        sort: Option<InspectSort>,
        /// Limit the number of inspected frames (after sorting).
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Decode a frame into structured output.
    Decode {
        /// Path to the frame bytes.
        frame_file: PathBuf,
        /// Layout JSON describing the frame contents.
        #[arg(long)]
        layout: PathBuf,
        /// Output format.
        #[arg(long, value_enum, default_value_t = DecodeFormat::Json)]
        format: DecodeFormat,
    },
    /// Print a layout's fingerprint.
    Fingerprint {
        /// Layout JSON files to fingerprint.
        #[arg(required = true)]
        layouts: Vec<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InspectSort {
    Size,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DecodeFormat {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Inspect {
            frame_path,
            layout,
            glob,
            sort,
            limit,
        } => {
            let layout = load_layout(&layout).context("load layout")?;
            let limits = wire::Limits::default();
            if frame_path.is_dir() {
                let entries = collect_frame_entries(&frame_path, glob.as_deref())?;
                let mut entries = maybe_sort_entries(entries, sort);
                let limit = limit.or(sort.map(|InspectSort::Size| 10));
                if let Some(limit) = limit {
                    entries.truncate(limit);
                }
                tracing::debug!(frames = entries.len(), "inspecting directory");
                for entry in entries {
                    let bytes = fs::read(&entry.path)
                        .with_context(|| format!("read frame {}", entry.path.display()))?;
                    println!("== {} ({} bytes) ==", entry.path.display(), entry.size);
                    match inspect_frame(&bytes, &layout, &limits) {
                        Ok(report) => print!("{}", format_inspect(&report)),
                        Err(err) => println!("  malformed: {err}"),
                    }
                }
            } else {
                let bytes = fs::read(&frame_path)
                    .with_context(|| format!("read frame {}", frame_path.display()))?;
                let report = inspect_frame(&bytes, &layout, &limits)
                    .with_context(|| format!("inspect {}", frame_path.display()))?;
                print!("{}", format_inspect(&report));
            }
        }
        Command::Decode {
            frame_file,
            layout,
            format,
        } => {
            let bytes = fs::read(&frame_file)
                .with_context(|| format!("read frame {}", frame_file.display()))?;
            let layout = load_layout(&layout).context("load layout")?;
            let output = decode_frame_json(&bytes, &layout, &wire::Limits::default())
                .with_context(|| format!("decode {}", frame_file.display()))?;
            match format {
                DecodeFormat::Json => {
                    let json = serde_json::to_string_pretty(&output).context("serialize json")?;
                    println!("{json}");
                }
                DecodeFormat::Pretty => {
                    print!("{}", format_decode_pretty(&output));
                }
            }
        }
        Command::Fingerprint { layouts } => {
            for path in layouts {
                let layout = load_layout(&path)?;
                println!(
                    "0x{:016x}  {} ({})",
                    layout_fingerprint(&layout),
                    layout.name,
                    path.display()
                );
            }
        }
    }
    Ok(())
}

struct FrameEntry {
    path: PathBuf,
    size: u64,
}

fn collect_frame_entries(dir: &Path, glob: Option<&str>) -> Result<Vec<FrameEntry>> {
    let mut entries = Vec::new();
    let pattern = match glob {
        Some(value) => Some(Pattern::new(value).context("invalid glob pattern")?),
        None => None,
    };

    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(pattern) = &pattern {
            let matches_path = pattern.matches_path(&path);
            let matches_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| pattern.matches(name));
            if !matches_path && !matches_name {
                continue;
            }
        }
        let size = entry.metadata()?.len();
        entries.push(FrameEntry { path, size });
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

fn maybe_sort_entries(mut entries: Vec<FrameEntry>, sort: Option<InspectSort>) -> Vec<FrameEntry> {
    match sort {
        Some(InspectSort::Size) => {
            entries.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
        }
        None => {}
    }
    entries
}
