use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use log::info;

use crystal_shade::{print_summary, render_scene, Scene};

const USAGE: &str =
    "Usage: crystal-shade <scene.xml> [--output <file.png>] [--size <W>x<H>] [--summary-only]";

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;
    let xml = fs::read_to_string(&options.path)
        .with_context(|| format!("failed to read scene {}", options.path.display()))?;
    let scene = Scene::from_xml(&xml).context("failed to parse scene XML")?;
    print_summary(&scene);

    if options.summary_only {
        return Ok(());
    }

    let (width, height) = options.size;
    info!("rendering {width}x{height}");
    let target = render_scene(&scene, width, height)?;
    target.save_png(&options.output)?;
    println!(
        "Wrote {width}x{height} image to {}",
        options.output.display()
    );
    Ok(())
}

#[derive(Debug, PartialEq)]
struct CliOptions {
    path: PathBuf,
    output: PathBuf,
    size: (u32, u32),
    summary_only: bool,
}

impl CliOptions {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut args = args.into_iter();
        let Some(path) = args.next().map(PathBuf::from) else {
            return Err(anyhow!(USAGE));
        };
        let mut output = None;
        let mut size = (640, 480);
        let mut summary_only = false;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--summary-only" => summary_only = true,
                "--output" => {
                    let value = args.next().ok_or_else(|| anyhow!("--output needs a path"))?;
                    output = Some(PathBuf::from(value));
                }
                "--size" => {
                    let value = args.next().ok_or_else(|| anyhow!("--size needs <W>x<H>"))?;
                    size = parse_size(&value)?;
                }
                other => {
                    return Err(anyhow!("Unknown argument: {other}. {USAGE}"));
                }
            }
        }
        let output = output.unwrap_or_else(|| path.with_extension("png"));
        Ok(Self {
            path,
            output,
            size,
            summary_only,
        })
    }
}

fn parse_size(value: &str) -> Result<(u32, u32)> {
    let (width, height) = value
        .split_once('x')
        .ok_or_else(|| anyhow!("size must look like 640x480, got {value}"))?;
    let width: u32 = width.parse().with_context(|| format!("bad width in {value}"))?;
    let height: u32 = height.parse().with_context(|| format!("bad height in {value}"))?;
    if width == 0 || height == 0 {
        return Err(anyhow!("size must be non-zero, got {value}"));
    }
    Ok((width, height))
}
