// Mon Oct 19 2026 - Alex

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use memmap2::MmapMut;
use setup_unlock::{
    config::Config,
    engine::{BatchReport, ModuleReport, PatchEngine},
    image::ModuleImage,
    output::{text_report, JsonSerializer, PatchReport},
    utils::{LogSink, LoggingUtils},
    vendor::VendorProfile,
};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author = "Alex")]
#[command(version)]
#[command(about = "Unlocks hidden setup screen options in extracted firmware modules", long_about = None)]
struct Args {
    /// Extracted module images (setup form modules, setup utility drivers)
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// family-a, family-b or generic
    #[arg(long)]
    vendor: Option<VendorProfile>,

    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Plan and count without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Pass name to skip, repeatable
    #[arg(long = "disable")]
    disable: Vec<String>,

    #[arg(short, long)]
    report: Option<PathBuf>,

    #[arg(long)]
    text_report: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(long)]
    log_file: Option<PathBuf>,
}

enum Backing {
    Owned(Vec<u8>),
    Mapped(MmapMut),
}

impl Backing {
    fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            Backing::Owned(v) => v.as_mut_slice(),
            Backing::Mapped(m) => &mut m[..],
        }
    }
}

struct Loaded {
    name: String,
    output: Option<PathBuf>,
    backing: Backing,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = LoggingUtils::init(args.verbose, args.log_file.as_deref()) {
        eprintln!("{} Failed to open log file: {}", "[!]".red(), e);
    }

    if let Err(e) = run(args) {
        eprintln!("{} {:#}", "[!]".red(), e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(profile) = args.vendor {
        config = config.with_profile(profile);
    }
    if args.dry_run {
        config = config.with_dry_run(true);
    }
    for name in &args.disable {
        config = config.disable_pass(name);
    }

    println!("{}", "Setup Unlock".cyan().bold());
    println!("{}", "=".repeat(50).cyan());
    println!("{} Profile: {}", "[*]".blue(), config.profile);
    if config.dry_run {
        println!("{} Dry run, images are not written", "[*]".blue());
    }
    println!();

    let start_time = Instant::now();
    let sink = LogSink::default();
    let engine = PatchEngine::new(config.clone(), &sink).context("building patch engine")?;

    let mut loaded = Vec::new();
    let mut load_failures = Vec::new();

    for path in &args.images {
        let name = module_name(path);
        match load_image(path, &config) {
            Ok((output, backing)) => {
                println!("{} Loaded {}", "[+]".green(), path.display());
                loaded.push(Loaded { name, output, backing });
            }
            Err(e) => {
                eprintln!("{} Failed to load {}: {:#}", "[!]".red(), path.display(), e);
                load_failures.push(ModuleReport::failed(&name, 0, 0, &format!("{:#}", e)));
            }
        }
    }

    let images = loaded
        .iter_mut()
        .map(|l| ModuleImage::new(&l.name, 0, l.backing.as_mut_slice()));
    let mut batch = engine.run_batch(images);
    for failure in load_failures {
        batch.push(failure);
    }

    for l in &loaded {
        if let (Backing::Mapped(map), Some(output)) = (&l.backing, &l.output) {
            map.flush().with_context(|| format!("flushing {}", output.display()))?;
            println!("{} Wrote {}", "[+]".green(), output.display());
        }
    }

    println!();
    print_summary(&batch);

    let report = PatchReport::new(batch);

    if let Some(path) = &args.report {
        JsonSerializer::new()
            .serialize_to_file(&report, path)
            .with_context(|| format!("writing report {}", path.display()))?;
        println!("{} Report saved to: {}", "[+]".green(), path.display());
    }

    if let Some(path) = &args.text_report {
        fs::write(path, text_report(&report.batch))
            .with_context(|| format!("writing text report {}", path.display()))?;
        println!("{} Text report saved to: {}", "[+]".green(), path.display());
    }

    println!();
    println!("{}", "=".repeat(50).cyan());
    println!("{} Done in {:.2}s", "[+]".green(), start_time.elapsed().as_secs_f64());

    Ok(())
}

fn module_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Dry runs read into memory. Otherwise the image is copied next to the
/// input and the copy is mapped writable, so the input is never touched.
fn load_image(path: &Path, config: &Config) -> Result<(Option<PathBuf>, Backing)> {
    if config.dry_run {
        let bytes = fs::read(path)?;
        return Ok((None, Backing::Owned(bytes)));
    }

    let mut output = path.as_os_str().to_owned();
    output.push(".");
    output.push(&config.output_suffix);
    let output = PathBuf::from(output);

    fs::copy(path, &output).with_context(|| format!("copying to {}", output.display()))?;
    let file = OpenOptions::new().read(true).write(true).open(&output)?;
    if file.metadata()?.len() == 0 {
        return Ok((None, Backing::Owned(Vec::new())));
    }

    let map = unsafe { MmapMut::map_mut(&file)? };
    Ok((Some(output), Backing::Mapped(map)))
}

fn print_summary(batch: &BatchReport) {
    println!("{}", "Results Summary".cyan().bold());
    println!("{}", "-".repeat(40).cyan());

    for module in &batch.modules {
        if let Some(ref error) = module.error {
            println!("  {} {}", module.name.yellow(), format!("skipped: {}", error).red());
            continue;
        }

        let changes = module.total_changes();
        let count = if changes > 0 {
            changes.to_string().green()
        } else {
            changes.to_string().yellow()
        };
        println!("  {}: {} change(s)", module.name.bold(), count);
        println!(
            "    protection-skip {}, return-check {}, flags {}, planned {}, applied {}, rejected {}",
            module.machine.protection_skips,
            module.machine.return_checks,
            module.flags_unlocked,
            module.outcome.planned,
            module.outcome.applied,
            module.outcome.rejected
        );
        if module.machine.wide_compares > 0 {
            println!(
                "    {} imm32 compare(s) found, left unpatched",
                module.machine.wide_compares.to_string().yellow()
            );
        }
    }

    println!();
    println!("{} Modules patched: {}", "[+]".green(), batch.patched_count());
    if batch.failed_count() > 0 {
        println!("{} Modules failed: {}", "[!]".red(), batch.failed_count());
    }
    println!("{} Total changes: {}", "[+]".green(), batch.total_changes());
}
