use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, ValueEnum};

use crate::config::load_config;
use crate::render::{render_svg, write_output};
use crate::resolver::EdgeRouter;
use crate::snapshot::DiagramSnapshot;

#[derive(Parser, Debug)]
#[command(
    name = "smartstep",
    version,
    about = "Resolve and route edges of a nested diagram snapshot"
)]
pub struct Args {
    /// Input snapshot (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for JSON/SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "json")]
    pub output_format: OutputFormat,

    /// Config JSON5 file of router overrides
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Svg,
    #[cfg(feature = "png")]
    Png,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    let input = read_input(args.input.as_deref())?;
    let snapshot = DiagramSnapshot::from_json(&input)?;

    let mut router = EdgeRouter::new(config.clone());
    let edges = router.resolve_all(&snapshot);

    match args.output_format {
        OutputFormat::Json => {
            let report: Vec<_> = edges
                .iter()
                .map(|(spec, geometry)| {
                    serde_json::json!({
                        "source": spec.source,
                        "target": spec.target,
                        "geometry": geometry.as_ref(),
                    })
                })
                .collect();
            let body = serde_json::to_string_pretty(&report)?;
            write_output(&body, args.output.as_deref())?;
        }
        OutputFormat::Svg => {
            let svg = render_svg(&snapshot, &edges, &config);
            write_output(&svg, args.output.as_deref())?;
        }
        #[cfg(feature = "png")]
        OutputFormat::Png => {
            let svg = render_svg(&snapshot, &edges, &config);
            let output = args
                .output
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("Output path required for png output"))?;
            crate::render::write_output_png(&svg, output)?;
        }
    }

    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok(buf);
        }
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
