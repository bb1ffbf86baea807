use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "firtree", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a kernel and print its signature.
    Compile(CompileArgs),
    /// Render a kernel over a rectangle to a PNG.
    Render(RenderArgs),
    /// Run a `__reduce` kernel and print the emitted records as JSON.
    Reduce(ReduceArgs),
}

#[derive(Parser, Debug)]
struct CompileArgs {
    /// Kernel source file.
    file: PathBuf,

    /// Print the compiled bytecode.
    #[arg(long)]
    dump_ir: bool,

    /// Print the signature as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct Bindings {
    /// Kernel source file.
    file: PathBuf,

    /// Bind a non-sampler argument: `name=<json>`, e.g. `radius=4.5` or `dir=[1,0]`.
    #[arg(long = "arg", value_parser = parse_binding)]
    args: Vec<(String, String)>,

    /// Bind a sampler argument to a decoded image: `name=path.png`.
    #[arg(long = "input", value_parser = parse_binding)]
    inputs: Vec<(String, String)>,

    /// Rectangle in kernel space as `x,y,w,h`. Defaults to `0,0,width,height`.
    #[arg(long, value_parser = parse_rect, allow_hyphen_values = true)]
    rect: Option<[f64; 4]>,

    /// Output width in pixels.
    #[arg(long)]
    width: u32,

    /// Output height in pixels.
    #[arg(long)]
    height: u32,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    bind: Bindings,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ReduceArgs {
    #[command(flatten)]
    bind: Bindings,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Compile(args) => cmd_compile(args),
        Command::Render(args) => cmd_render(args),
        Command::Reduce(args) => cmd_reduce(args),
    }
}

fn parse_binding(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{s}'"))?;
    if name.is_empty() {
        return Err(format!("missing argument name in '{s}'"));
    }
    Ok((name.to_owned(), value.to_owned()))
}

fn parse_rect(s: &str) -> Result<[f64; 4], String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|e| format!("bad number '{p}': {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    <[f64; 4]>::try_from(parts).map_err(|p| format!("expected x,y,w,h, got {} values", p.len()))
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read kernel '{}'", path.display()))
}

fn cmd_compile(args: CompileArgs) -> anyhow::Result<()> {
    let source = read_source(&args.file)?;
    let program = firtree::compile_source(&source)
        .with_context(|| format!("compile '{}'", args.file.display()))?;

    if args.json {
        let sig = serde_json::json!({
            "kernel": program.kernel_name(),
            "target": program.target(),
            "arguments": program.arguments(),
        });
        println!("{}", serde_json::to_string_pretty(&sig)?);
    } else {
        let params = program
            .arguments()
            .iter()
            .map(|a| {
                let q = if a.is_static { "static " } else { "" };
                format!("{q}{} {}", a.ty, a.name)
            })
            .collect::<Vec<_>>()
            .join(", ");
        let target = match program.target() {
            firtree::KernelTarget::Normal => "vec4",
            firtree::KernelTarget::Reduce => "__reduce void",
        };
        println!("kernel {target} {}({params})", program.kernel_name());
    }

    if args.dump_ir {
        println!("{program}");
    }
    Ok(())
}

fn build_kernel(bind: &Bindings) -> anyhow::Result<(firtree::Kernel, firtree::Rect)> {
    let source = read_source(&bind.file)?;
    let kernel = firtree::Kernel::new();
    kernel
        .compile_from_source(&source)
        .with_context(|| format!("compile '{}'", bind.file.display()))?;

    for (name, raw) in &bind.args {
        let value: serde_json::Value =
            serde_json::from_str(raw).with_context(|| format!("parse --arg {name}={raw}"))?;
        kernel.set_argument_json(name, &value)?;
    }
    for (name, path) in &bind.inputs {
        let image = firtree::load_image(path)?;
        kernel.set_argument(name, firtree::Sampler::from_buffer(image))?;
    }
    kernel.validate()?;

    let [x, y, w, h] = bind
        .rect
        .unwrap_or([0.0, 0.0, f64::from(bind.width), f64::from(bind.height)]);
    Ok((kernel, firtree::rect_xywh(x, y, w, h)))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let (kernel, rect) = build_kernel(&args.bind)?;
    let sampler = firtree::Sampler::from_kernel(&kernel)?;
    let img = firtree::CpuRenderer::new(sampler).render_to_image(rect, args.bind.width, args.bind.height)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        img.as_raw(),
        img.width(),
        img.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_reduce(args: ReduceArgs) -> anyhow::Result<()> {
    let (kernel, rect) = build_kernel(&args.bind)?;
    let records = firtree::reduce(&kernel, rect, args.bind.width, args.bind.height)?;
    println!("{}", serde_json::to_string(&records)?);
    eprintln!("{} records", records.len());
    Ok(())
}
