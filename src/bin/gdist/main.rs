//! gdist CLI - exact geodesic distances on triangle meshes.
//!
//! Usage: gdist <COMMAND> [OPTIONS] <INPUT>
//!
//! Run `gdist --help` for available commands.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};

use gdist::algo::geodesic::{DistanceQuery, LocalMatrixBuilder, DEFAULT_MAX_DISTANCE};
use gdist::algo::progress::Progress;
use gdist::io::{self, text, Format};
use gdist::mesh::GeodesicMesh;

#[derive(Parser)]
#[command(name = "gdist")]
#[command(author, version, about = "Exact geodesic distances on triangle meshes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        #[command(flatten)]
        mesh: MeshArgs,
    },

    /// Distances from source vertices to target vertices
    Distance {
        #[command(flatten)]
        mesh: MeshArgs,

        /// Source vertex index (repeatable)
        #[arg(short, long = "source", required = true, num_args = 1..)]
        sources: Vec<usize>,

        /// Target vertex index (repeatable, default: every vertex)
        #[arg(short, long = "target", num_args = 1..)]
        targets: Vec<usize>,

        /// Stop propagating beyond this distance
        #[arg(short, long, default_value_t = DEFAULT_MAX_DISTANCE)]
        max_distance: f64,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// All vertex pairs within a geodesic radius
    Matrix {
        #[command(flatten)]
        mesh: MeshArgs,

        /// Geodesic radius
        #[arg(short, long)]
        max_distance: f64,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },
}

#[derive(Args)]
struct MeshArgs {
    /// Input mesh file, or vertex file when --triangles is given
    input: PathBuf,

    /// Triangle file paired with a vertex file
    #[arg(long)]
    triangles: Option<PathBuf>,

    /// Input format (default: from file extension)
    #[arg(short, long, value_enum)]
    format: Option<MeshFormat>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum MeshFormat {
    /// Stanford polygon file
    Ply,
    /// Stereolithography file
    Stl,
    /// Text file with a vertex/triangle count header
    Text,
}

impl From<MeshFormat> for Format {
    fn from(format: MeshFormat) -> Self {
        match format {
            MeshFormat::Ply => Format::Ply,
            MeshFormat::Stl => Format::Stl,
            MeshFormat::Text => Format::Text,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { mesh } => {
            cmd_info(&mesh)?;
        }

        Commands::Distance {
            mesh,
            sources,
            targets,
            max_distance,
            output,
        } => {
            cmd_distance(&mesh, &sources, &targets, max_distance, output.as_deref())?;
        }

        Commands::Matrix {
            mesh,
            max_distance,
            output,
            sequential,
        } => {
            cmd_matrix(&mesh, max_distance, output.as_deref(), sequential)?;
        }
    }

    Ok(())
}

fn load_mesh(args: &MeshArgs) -> Result<GeodesicMesh, Box<dyn std::error::Error>> {
    let mesh = match (&args.triangles, args.format) {
        (Some(triangles), _) => text::load_pair(&args.input, triangles)?,
        (None, Some(format)) => io::load_as(&args.input, format.into())?,
        (None, None) => io::load(&args.input)?,
    };
    if !mesh.degenerate_faces().is_empty() {
        log::warn!("skipped {} degenerate triangles", mesh.degenerate_faces().len());
    }
    Ok(mesh)
}

/// Stdout unless a path is given.
fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    })
}

/// Create a progress reporter that displays a progress bar on the terminal.
fn create_progress() -> Progress {
    let max_percent = Arc::new(AtomicUsize::new(0));

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }

        let raw_percent = if current >= total {
            100
        } else {
            ((current * 100) + (total / 2)) / total
        };

        // Rows finish out of order across threads; only ever move forward
        let previous = max_percent.fetch_max(raw_percent, Ordering::Relaxed);
        if raw_percent <= previous && raw_percent != 100 {
            return;
        }
        let percent = raw_percent.max(previous);

        let bar_width = 30;
        let filled = (percent * bar_width) / 100;
        let bar = "=".repeat(filled);
        let space = " ".repeat(bar_width - filled);

        eprint!("\r[{}{}] {:3}% {}", bar, space, percent, message);
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

fn cmd_info(args: &MeshArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = load_mesh(args)?;

    println!("File: {}", args.input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());
    println!("Edges: {}", mesh.num_edges());
    println!("Degenerate triangles skipped: {}", mesh.degenerate_faces().len());

    let mut min_area = f64::MAX;
    let mut max_area = 0.0_f64;
    for fid in mesh.face_ids() {
        let area = mesh.face_area(fid);
        min_area = min_area.min(area);
        max_area = max_area.max(area);
    }
    println!("Surface area: {:.6}", mesh.surface_area());
    println!("Face area range: [{:.6}, {:.6}]", min_area, max_area);

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        let diag = max - min;
        println!("Dimensions: {:.3} x {:.3} x {:.3}", diag.x, diag.y, diag.z);
    }

    println!("Average edge length: {:.6}", mesh.average_edge_length());

    let boundary_edges = mesh.num_boundary_edges();
    if boundary_edges == 0 {
        println!("Topology: Closed (no boundary)");
    } else {
        println!("Topology: Open ({} boundary edges)", boundary_edges);
    }
    println!("Saddle or boundary vertices: {}", mesh.num_saddle_or_boundary());

    Ok(())
}

fn cmd_distance(
    args: &MeshArgs,
    sources: &[usize],
    targets: &[usize],
    max_distance: f64,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = load_mesh(args)?;
    log::info!("loaded {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());

    let all: Vec<usize>;
    let targets = if targets.is_empty() {
        all = (0..mesh.num_vertices()).collect();
        &all
    } else {
        targets
    };

    let start = Instant::now();
    let mut query = DistanceQuery::new(&mesh);
    let distances = query.query(sources, targets, max_distance)?;
    let elapsed = start.elapsed();
    let stats = query.stats();
    log::info!(
        "{} windows created, {} propagated in {:.2?}",
        stats.windows_created,
        stats.windows_propagated,
        elapsed
    );

    let mut writer = open_output(output)?;
    text::write_distances(&mut writer, targets, &distances)?;
    writer.flush()?;

    Ok(())
}

fn cmd_matrix(
    args: &MeshArgs,
    max_distance: f64,
    output: Option<&Path>,
    sequential: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = load_mesh(args)?;

    eprintln!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());
    let mode = if sequential { "sequential" } else { "parallel" };
    eprintln!("Computing local distances within {} ({})...", max_distance, mode);

    let start = Instant::now();
    let matrix = LocalMatrixBuilder::new(&mesh)
        .with_max_distance(max_distance)
        .with_parallel(!sequential)
        .with_progress(create_progress())
        .build()?;
    let elapsed = start.elapsed();
    eprintln!("Result: {} entries ({:.2?})", matrix.len(), elapsed);

    let mut writer = open_output(output)?;
    text::write_matrix(&mut writer, &matrix)?;
    writer.flush()?;

    Ok(())
}
