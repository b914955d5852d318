use crate::config::load_config;
use crate::document::synthesize;
use crate::layout::compute_layout;
use crate::normalize::normalize;
use crate::parser::parse_plan;
use crate::plan::LayoutMode;
use crate::render::{render_svg, write_output_svg};
use crate::validate::validate;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "apr", version, about = "Architecture plan to diagram compiler")]
pub struct Args {
    /// Plan JSON (or raw model output) file, '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Goal text the plan answers; drives title defaulting and validation
    #[arg(short = 'g', long = "goal", default_value = "")]
    pub goal: String,

    /// Layout strategy
    #[arg(short = 'm', long = "mode", value_enum, default_value = "swimlane")]
    pub mode: Mode,

    /// Output file. Defaults to stdout for svg/xml if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file (palette and keyword-table overrides)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Print the validation report as JSON to stderr and fail when not ok
    #[arg(long = "check")]
    pub check: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum Mode {
    Swimlane,
    Flow,
}

impl From<Mode> for LayoutMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Swimlane => LayoutMode::Swimlane,
            Mode::Flow => LayoutMode::Flow,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
    Xml,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    let input = read_input(args.input.as_deref())?;
    let raw = parse_plan(&input).context("could not recover a plan from the input")?;
    let plan = normalize(raw, &args.goal, args.mode.into(), &config.layout);
    let layout = compute_layout(&plan, &config.layout);
    let document = synthesize(&plan, &layout, &config.palette, &config.layout);
    let xml = document.to_xml();

    let report = validate(&xml, &args.goal);
    if args.check {
        eprintln!("{}", serde_json::to_string_pretty(&report)?);
    }

    match args.output_format {
        OutputFormat::Xml => {
            write_output_svg(&xml, args.output.as_deref())?;
        }
        OutputFormat::Svg => {
            let svg = render_svg(&xml, &config.render);
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            render_png(&xml, &args, &config)?;
        }
    }

    if args.check && !report.ok {
        anyhow::bail!("validation reported {} issue(s)", report.issues.len());
    }
    Ok(())
}

#[cfg(feature = "png")]
fn render_png(xml: &str, args: &Args, config: &crate::config::Config) -> Result<()> {
    let output = args
        .output
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("Output path required for png output"))?;
    let svg = render_svg(xml, &config.render);
    crate::render::write_output_png(&svg, output)
}

#[cfg(not(feature = "png"))]
fn render_png(_xml: &str, _args: &Args, _config: &crate::config::Config) -> Result<()> {
    Err(anyhow::anyhow!(
        "png output requires building with the `png` feature"
    ))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
