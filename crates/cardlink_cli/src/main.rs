mod pgm;

use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgGroup, Args, Parser, Subcommand};
use cardlink_core::error::{CoreError, CoreErrorKind, CoreResult};
use cardlink_core::gfx::{self, Bitmap};
use cardlink_core::linker;
use cardlink_core::manifest::{CardsManifest, GraphicsEntry, GraphicsManifest, PatchesManifest};
use cardlink_core::packer;
use cardlink_core::patch::{self, PatchOptions};
use cardlink_core::save::{BaseMode, SaveImage};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Extract graphics from the save image, or pack them back in
    Gfx(GfxArgs),
    /// Apply language-selected byte patches
    Patch(PatchArgs),
    /// Relink the card name and pointer tables for a language
    Names(NamesArgs),
    /// Show title metadata and image geometry
    Info(InfoArgs),
}

/// Offset-base selection, mutually exclusive. Manifests are authored in
/// raw (headerless) terms; these flags say what the target file carries.
#[derive(Debug, Args)]
struct BaseArgs {
    /// Raw save, no wrapper header
    #[arg(long, conflicts_with_all = ["mcs", "offset"])]
    raw: bool,
    /// Single-save container with its 0x80-byte wrapper header
    #[arg(long, conflicts_with = "offset")]
    mcs: bool,
    /// Custom header size (decimal or 0x-hex)
    #[arg(short = 'o', long, value_parser = parse_int)]
    offset: Option<u64>,
}

impl BaseArgs {
    fn mode(&self) -> BaseMode {
        if self.mcs {
            BaseMode::Mcs
        } else if let Some(delta) = self.offset {
            BaseMode::Custom(delta)
        } else {
            BaseMode::Raw
        }
    }
}

#[derive(Debug, Args)]
#[command(group = ArgGroup::new("gfx_mode").required(true).args(["extract", "pack"]))]
struct GfxArgs {
    /// Save image file path
    #[arg(short = 'f', long)]
    file: PathBuf,
    /// Graphics manifest JSON path
    #[arg(short = 'm', long)]
    manifest: PathBuf,
    /// Extract graphics from the save image into PGM files
    #[arg(short = 'e', long)]
    extract: bool,
    /// Pack PGM files back into the save image
    #[arg(short = 'p', long)]
    pack: bool,
    /// Directory the manifest's image paths are relative to
    #[arg(short = 'd', long, default_value = ".")]
    directory: PathBuf,
    /// Only process the asset with this name
    #[arg(long)]
    only: Option<String>,
    /// Include assets marked inactive in the manifest
    #[arg(long)]
    include_inactive: bool,
    #[command(flatten)]
    base: BaseArgs,
}

#[derive(Debug, Args)]
struct PatchArgs {
    /// Save image file path
    #[arg(short = 'f', long)]
    file: PathBuf,
    /// Patches manifest JSON path
    #[arg(short = 'm', long)]
    manifest: PathBuf,
    /// Manifest language key (e.g. english, european, spanish)
    #[arg(short = 'l', long)]
    language: String,
    /// Show planned patches without modifying the file
    #[arg(long)]
    dry_run: bool,
    /// Only apply the patch with this name
    #[arg(long)]
    only: Option<String>,
    /// Include patches marked inactive in the manifest
    #[arg(long)]
    include_inactive: bool,
    /// Emit the report as JSON
    #[arg(long)]
    json: bool,
    /// Print one line per write
    #[arg(short = 'v', long)]
    verbose: bool,
    #[command(flatten)]
    base: BaseArgs,
}

#[derive(Debug, Args)]
struct NamesArgs {
    /// Save image file path
    #[arg(short = 'f', long)]
    file: PathBuf,
    /// Cards manifest JSON path
    #[arg(short = 'm', long)]
    manifest: PathBuf,
    /// Manifest language key
    #[arg(short = 'l', long)]
    language: String,
    /// Compute the full link without modifying the file
    #[arg(long)]
    dry_run: bool,
    /// Emit the result as JSON
    #[arg(long)]
    json: bool,
    #[command(flatten)]
    base: BaseArgs,
}

#[derive(Debug, Args)]
struct InfoArgs {
    /// Save image file path
    #[arg(short = 'f', long)]
    file: PathBuf,
    /// Emit the metadata as JSON
    #[arg(long)]
    json: bool,
    #[command(flatten)]
    base: BaseArgs,
}

fn parse_int(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map_err(|e| e.to_string())
    } else {
        s.parse().map_err(|e: std::num::ParseIntError| e.to_string())
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> CoreResult<()> {
    match cli.command {
        Command::Gfx(args) => run_gfx(args),
        Command::Patch(args) => run_patch(args),
        Command::Names(args) => run_names(args),
        Command::Info(args) => run_info(args),
    }
}

/// Path of one frame's PGM file. Single-frame assets use the manifest
/// path as-is; sequences insert the frame index before the extension.
fn frame_path(dir: &Path, entry: &GraphicsEntry, frame: usize) -> PathBuf {
    let image = dir.join(&entry.image);
    if entry.frame_count() == 1 {
        return image;
    }
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| entry.name.clone());
    let ext = image
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pgm".to_string());
    image.with_file_name(format!("{stem}_{frame:03}.{ext}"))
}

fn run_gfx(args: GfxArgs) -> CoreResult<()> {
    let manifest = GraphicsManifest::load(&args.manifest)?;
    let entries = manifest.select(args.only.as_deref(), args.include_inactive);
    if entries.is_empty() {
        println!("no assets to process after filters");
        return Ok(());
    }

    let mut image = SaveImage::load(&args.file, args.base.mode())?;

    if args.extract {
        let mut files = 0usize;
        for entry in &entries {
            for frame in 0..entry.frame_count() {
                let packed = packer::read_frame(&image, entry, frame)?;
                let bitmap = gfx::extract(&packed, entry.width, entry.height, entry.mode)?;
                let path = frame_path(&args.directory, entry, frame);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        CoreError::new(CoreErrorKind::Io, format!("{}: {e}", parent.display()))
                    })?;
                }
                pgm::write(&path, bitmap.width, bitmap.height, &bitmap.to_luma())
                    .map_err(|e| CoreError::new(CoreErrorKind::Io, e.to_string()))?;
                files += 1;
            }
            println!("extracted {}: {} frame(s)", entry.name, entry.frame_count());
        }
        println!("done, {files} file(s) written");
        return Ok(());
    }

    // Pack: stage every write in memory, persist once at the end.
    let mut total = 0usize;
    for entry in &entries {
        let mut entry_bytes = 0usize;
        for frame in 0..entry.frame_count() {
            let path = frame_path(&args.directory, entry, frame);
            let (width, height, luma) = pgm::read(&path)
                .map_err(|e| CoreError::new(CoreErrorKind::Io, e.to_string()))?;
            if (width, height) != (entry.width, entry.height) {
                return Err(CoreError::capacity(format!(
                    "{}: image is {width}x{height}, manifest declares {}x{} for '{}'",
                    path.display(),
                    entry.width,
                    entry.height,
                    entry.name
                )));
            }
            let bitmap = Bitmap::from_luma(width, height, &luma)?;
            let packed = gfx::pack(&bitmap, entry.mode)?;
            entry_bytes += packer::embed_frame(&mut image, entry, frame, &packed)?;
        }
        println!("packed {}: {entry_bytes} bytes", entry.name);
        total += entry_bytes;
    }
    image.store(&args.file)?;
    println!("done, wrote {total} bytes into {}", args.file.display());
    Ok(())
}

fn run_patch(args: PatchArgs) -> CoreResult<()> {
    let manifest = PatchesManifest::load(&args.manifest)?;
    let mut image = SaveImage::load(&args.file, args.base.mode())?;

    let options = PatchOptions {
        dry_run: args.dry_run,
        only: args.only.clone(),
        include_inactive: args.include_inactive,
    };
    let report = patch::apply(&mut image, &manifest, &args.language, &options)?;

    if !report.dry_run {
        image.store(&args.file)?;
    }

    if args.json {
        println!("{}", cardlink_render::patch_report_json(&report));
    } else {
        print!("{}", cardlink_render::patch_report_text(&report, args.verbose));
    }
    Ok(())
}

fn run_names(args: NamesArgs) -> CoreResult<()> {
    let manifest = CardsManifest::load(&args.manifest)?;
    let mut image = SaveImage::load(&args.file, args.base.mode())?;

    let result = linker::relink(&mut image, &manifest, &args.language, args.dry_run)?;

    if !result.dry_run {
        image.store(&args.file)?;
    }

    if args.json {
        println!("{}", cardlink_render::link_result_json(&result));
    } else {
        print!("{}", cardlink_render::link_result_text(&result));
    }
    Ok(())
}

fn run_info(args: InfoArgs) -> CoreResult<()> {
    let image = SaveImage::load(&args.file, args.base.mode())?;
    let title = image.title()?;

    if args.json {
        println!("{}", cardlink_render::info_json(&image, &title));
    } else {
        print!("{}", cardlink_render::info_text(&image, &title));
    }
    Ok(())
}
