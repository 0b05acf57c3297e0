use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lumina::{
    DefaultFetcher, DirectorySource, ExportFormat, FsKeyValueStore, ImageSource, LayerFactory,
    LoadState, MemoryKeyValueStore, PicsumSource, Preset, PresetLibrary, Stack, StudioOpts,
    StudioSession, now_ms,
};

#[derive(Parser, Debug)]
#[command(name = "lumina", version)]
struct Cli {
    /// Options JSON (canvas, preview size, export format, ...).
    #[arg(long, global = true)]
    opts: Option<PathBuf>,

    /// Fixed RNG seed, overriding the options file.
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a fresh stack.
    New(NewArgs),
    /// Redraw blend modes and opacities.
    Remix(EditArgs),
    /// New images and parameters for every layer.
    Reload(EditArgs),
    /// Set every layer to average at 1/n.
    Equalize(EditArgs),
    /// Grow or shrink the stack.
    Resize(ResizeArgs),
    /// Composite a stack and write the image.
    Export(ExportArgs),
    /// Manage saved presets.
    #[command(subcommand)]
    Preset(PresetCommand),
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Pick images from this directory instead of picsum.photos.
    #[arg(long)]
    images: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct NewArgs {
    /// Output stack JSON.
    #[arg(long)]
    out: PathBuf,

    /// Number of layers (defaults to the options file).
    #[arg(long)]
    layers: Option<usize>,

    #[command(flatten)]
    source: SourceArgs,
}

#[derive(Args, Debug)]
struct EditArgs {
    /// Stack JSON, rewritten in place unless `--out` is given.
    #[arg(long)]
    stack: PathBuf,

    /// Output stack JSON.
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    source: SourceArgs,
}

#[derive(Args, Debug)]
struct ResizeArgs {
    #[command(flatten)]
    edit: EditArgs,

    /// Target layer count.
    #[arg(long)]
    layers: usize,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Stack JSON to render.
    #[arg(long)]
    stack: PathBuf,

    /// Output directory.
    #[arg(long)]
    dir: PathBuf,

    /// Root for relative image paths (defaults to the stack file's directory).
    #[arg(long)]
    root: Option<PathBuf>,

    /// Write JPEG at this quality instead of PNG.
    #[arg(long)]
    jpeg_quality: Option<u8>,
}

#[derive(Subcommand, Debug)]
enum PresetCommand {
    /// Save a stack under a name.
    Save {
        /// Stack JSON to save.
        #[arg(long)]
        stack: PathBuf,
        /// Preset name.
        #[arg(long)]
        name: String,
        /// Preset store directory.
        #[arg(long)]
        store: PathBuf,
    },
    /// List saved presets.
    List {
        /// Preset store directory.
        #[arg(long)]
        store: PathBuf,
    },
    /// Write a preset's stack to a file.
    Load {
        /// Preset id.
        #[arg(long)]
        id: String,
        /// Preset store directory.
        #[arg(long)]
        store: PathBuf,
        /// Output stack JSON.
        #[arg(long)]
        out: PathBuf,
    },
    /// Delete a preset.
    Delete {
        /// Preset id.
        #[arg(long)]
        id: String,
        /// Preset store directory.
        #[arg(long)]
        store: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut opts = match &cli.opts {
        Some(path) => StudioOpts::from_path(path)?,
        None => StudioOpts::default(),
    };
    if cli.seed.is_some() {
        opts.seed = cli.seed;
    }

    match cli.cmd {
        Command::New(args) => cmd_new(&opts, args),
        Command::Remix(args) => cmd_edit(&opts, args, lumina::remix),
        Command::Reload(args) => cmd_edit(&opts, args, lumina::reload_images),
        Command::Equalize(args) => cmd_edit(&opts, args, |stack, _| lumina::equalize(stack)),
        Command::Resize(args) => {
            let layers = args.layers;
            cmd_edit(&opts, args.edit, move |stack, factory| {
                lumina::resize(stack, layers, factory)
            })
        }
        Command::Export(args) => cmd_export(opts, args),
        Command::Preset(cmd) => cmd_preset(&opts, cmd),
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lumina=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_new(opts: &StudioOpts, args: NewArgs) -> anyhow::Result<()> {
    let count = args.layers.unwrap_or(opts.initial_layers);
    let mut factory = layer_factory(opts, &args.source)?;
    let stack = lumina::initial_stack(count, &mut factory);
    write_stack(&args.out, &stack)
}

fn cmd_edit(
    opts: &StudioOpts,
    args: EditArgs,
    edit: impl FnOnce(&Stack, &mut LayerFactory) -> Stack,
) -> anyhow::Result<()> {
    let stack = read_stack(&args.stack)?;
    let mut factory = layer_factory(opts, &args.source)?;
    let next = edit(&stack, &mut factory);
    write_stack(args.out.as_ref().unwrap_or(&args.stack), &next)
}

fn cmd_export(mut opts: StudioOpts, args: ExportArgs) -> anyhow::Result<()> {
    if let Some(quality) = args.jpeg_quality {
        opts.export_format = ExportFormat::Jpeg { quality };
    }
    let stack = read_stack(&args.stack)?;
    let root = args.root.clone().unwrap_or_else(|| stack_root(&args.stack));
    let images = image_source(&opts, &SourceArgs { images: None })?;
    let fetcher = Arc::new(DefaultFetcher::new(&root)?);
    let store = Box::new(MemoryKeyValueStore::new());
    let mut session = StudioSession::with_stack(opts, stack, images, fetcher, store)?;

    let path = session.export(&args.dir)?;
    for layer in session.stack().iter() {
        if layer.is_visible && layer.load_state == LoadState::Failed {
            eprintln!("skipped layer {} ({})", layer.id, layer.source);
        }
    }
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn cmd_preset(opts: &StudioOpts, cmd: PresetCommand) -> anyhow::Result<()> {
    match cmd {
        PresetCommand::Save { stack, name, store } => {
            let stack = read_stack(&stack)?;
            let mut factory = layer_factory(opts, &SourceArgs { images: None })?;
            let preset = Preset::named(factory.next_preset_id(), &name, now_ms(), &stack)?;
            let mut kv = FsKeyValueStore::new(store);
            let mut library = PresetLibrary::load(&kv, &opts.presets_key);
            library.insert(preset.clone());
            library.save(&mut kv, &opts.presets_key)?;
            println!("{}", preset.id);
        }
        PresetCommand::List { store } => {
            let kv = FsKeyValueStore::new(store);
            for preset in PresetLibrary::load(&kv, &opts.presets_key).presets() {
                println!(
                    "{}\t{}\t{}\t{} layers",
                    preset.id,
                    preset.name,
                    preset.timestamp_ms,
                    preset.layers.len()
                );
            }
        }
        PresetCommand::Load { id, store, out } => {
            let kv = FsKeyValueStore::new(store);
            let library = PresetLibrary::load(&kv, &opts.presets_key);
            let preset = library
                .get(&id)
                .with_context(|| format!("no preset with id '{id}'"))?;
            write_stack(&out, &preset.instantiate())?;
        }
        PresetCommand::Delete { id, store } => {
            let mut kv = FsKeyValueStore::new(store);
            let mut library = PresetLibrary::load(&kv, &opts.presets_key);
            if !library.remove(&id) {
                anyhow::bail!("no preset with id '{id}'");
            }
            library.save(&mut kv, &opts.presets_key)?;
        }
    }
    Ok(())
}

fn image_source(opts: &StudioOpts, source: &SourceArgs) -> anyhow::Result<Arc<dyn ImageSource>> {
    Ok(match &source.images {
        Some(dir) => Arc::new(
            DirectorySource::scan(dir)
                .with_context(|| format!("scan image dir '{}'", dir.display()))?,
        ),
        None => Arc::new(PicsumSource {
            width: opts.canvas.width,
            height: opts.canvas.height,
        }),
    })
}

fn layer_factory(opts: &StudioOpts, source: &SourceArgs) -> anyhow::Result<LayerFactory> {
    let images = image_source(opts, source)?;
    Ok(match opts.seed {
        Some(seed) => LayerFactory::new(seed, images),
        None => LayerFactory::from_entropy(images),
    })
}

fn stack_root(stack_path: &Path) -> PathBuf {
    stack_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf()
}

fn read_stack(path: &Path) -> anyhow::Result<Stack> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read stack '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse stack '{}'", path.display()))
}

fn write_stack(path: &Path, stack: &Stack) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(stack)?;
    std::fs::write(path, json).with_context(|| format!("write stack '{}'", path.display()))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}
