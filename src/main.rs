//! Curve To Texture — headless baker.
//! - `bake`: sample the project's curves and save the 32x1 PNG under `Assets/`
//! - `preview`: print the samples without writing anything
//! - `init`: write a default project (JSON or TOML)
//! - `inspect`: decode a baked strip and print its texels

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use curve_to_texture::asset::{AssetImporter, SidecarImporter};
use curve_to_texture::bake::{decode_png, sample_position, PixelBuffer, HEIGHT, WIDTH};
use curve_to_texture::logging;
use curve_to_texture::project::{load_project, save_project, BakeProject, BakeSession, Channel};
use curve_to_texture::{BakeError, ImportSettings};

// ------------------------- CLI -------------------------

#[derive(Parser)]
#[command(name = "curve-to-texture")]
#[command(about = "Bake RGBA curves into a 32x1 lookup PNG")]
struct Args {
    /// Project file to load (.json / .toml / .c2t)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Bake the curves and save the PNG
    Bake {
        /// Asset path to save to instead of the project's save path
        #[arg(short, long)]
        out: Option<String>,
        /// Project root holding the Assets/ folder
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
        /// Do not write the .import.toml sidecar
        #[arg(long)]
        no_import: bool,
    },
    /// Print the baked samples without writing anything
    Preview,
    /// Write a default project file
    Init {
        path: PathBuf,
        #[arg(long)]
        force: bool,
    },
    /// Print the texels of a baked PNG
    Inspect { png: PathBuf },
}

// ------------------------- Entry -------------------------

fn main() -> ExitCode {
    if let Err(err) = logging::init("info") {
        eprintln!("logging disabled: {err}");
    }
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), BakeError> {
    match args.cmd.unwrap_or(Cmd::Preview) {
        Cmd::Bake {
            out,
            root,
            no_import,
        } => {
            let mut session = BakeSession::new(open_project(args.project.as_deref())?);
            if let Some(out) = out {
                session.set_save_path(out);
            }
            let mut sidecar = SidecarImporter;
            let importer: Option<&mut dyn AssetImporter> = if no_import {
                None
            } else {
                Some(&mut sidecar)
            };
            let report = session.generate_and_save(&root, importer)?;
            info!(file = %report.file.display(), "saved {}", report.asset);
            Ok(())
        }
        Cmd::Preview => {
            let mut session = BakeSession::new(open_project(args.project.as_deref())?);
            if !session.can_save() {
                warn!(
                    "save path {:?} must start with 'Assets/' and name a .png",
                    session.project().save_path
                );
            }
            println!(
                "{}x{} PNG  •  {}",
                WIDTH,
                HEIGHT,
                ImportSettings::LOOKUP.summary()
            );
            print_strip(session.preview());
            Ok(())
        }
        Cmd::Init { path, force } => {
            if path.exists() && !force {
                return Err(BakeError::Io(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} exists (use --force)", path.display()),
                )));
            }
            save_project(&BakeProject::default(), &path)?;
            info!(path = %path.display(), "wrote default project");
            Ok(())
        }
        Cmd::Inspect { png } => {
            let buf = decode_png(&std::fs::read(&png)?)?;
            match SidecarImporter::read_if_present(&png) {
                Ok(Some(settings)) => println!("{}  •  {}", png.display(), settings.summary()),
                Ok(None) => println!("{}  •  no import sidecar", png.display()),
                Err(err) => {
                    warn!("unreadable import sidecar: {err}");
                    println!("{}  •  unreadable import sidecar", png.display());
                }
            }
            print_strip(&buf);
            Ok(())
        }
    }
}

fn open_project(path: Option<&Path>) -> Result<BakeProject, BakeError> {
    match path {
        Some(path) => load_project(path),
        None => Ok(BakeProject::default()),
    }
}

fn print_strip(buf: &PixelBuffer) {
    let labels: Vec<String> = Channel::ALL
        .iter()
        .map(|c| format!("{:>3}", c.label()))
        .collect();
    println!(" x       t   {}", labels.join("  "));
    for (x, px) in buf.pixels().enumerate() {
        let t = sample_position(x as u32, buf.width());
        println!(
            "{:>2}  {:.4}  {:>3}  {:>3}  {:>3}  {:>3}",
            x, t, px[0], px[1], px[2], px[3]
        );
    }
}
