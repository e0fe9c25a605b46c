use std::path::PathBuf;
use std::process::exit;

use terrain_tools::landmarks::snap_landmark_heights;
use terrain_tools::terrain::export::TerrainExportOptions;
use terrain_tools::terrain::heightfield::{Heightfield, LoadOptions};
use terrain_tools::terrain::preview::write_preview_png;
use terrain_tools::terrain::procedural::{generate_random_heightmap, RandomHeightmapOptions};
use terrain_tools::terrain::{generate_terrain, TerrainExportResult};

fn usage() -> ! {
    eprintln!("Usage:");
    eprintln!("  terrain-cli terrain <heightmap.csv> -o <out.glb> [--texture <uri>] [--name <name>] [--threshold <m>]");
    eprintln!("  terrain-cli landmarks <heightmap.csv> <landmarks.csv> -o <out.csv> [--offset <m>] [--threshold <m>]");
    eprintln!("  terrain-cli preview <heightmap.csv> -o <out.png> [--size <px>]");
    eprintln!("  terrain-cli random -o <out.csv> [--rows <n>] [--cols <n>] [--seed <n>]");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  terrain-cli terrain DTM_ver2.csv -o models/terrain.glb --texture texture.png");
    eprintln!("  terrain-cli landmarks Heightmap.csv Landmarks.csv -o Landmarks_fixed.csv --offset 0.1");
    eprintln!("  terrain-cli preview Heightmap.csv -o terrain.png --size 129");
    exit(1);
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<&String>) -> T {
    match value.map(|v| v.parse::<T>()) {
        Some(Ok(v)) => v,
        _ => {
            eprintln!("{} requires a valid value", flag);
            exit(1);
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        usage();
    }

    match args[1].as_str() {
        "terrain" => run_terrain(&args[2..]),
        "landmarks" => run_landmarks(&args[2..]),
        "preview" => run_preview(&args[2..]),
        "random" => run_random(&args[2..]),
        other => {
            eprintln!("Unknown mode '{}'", other);
            usage();
        }
    }
}

fn run_terrain(args: &[String]) {
    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut load_options = LoadOptions::default();
    let mut export_options = TerrainExportOptions::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-o" | "--output" => {
                output = args.get(i + 1).map(PathBuf::from);
                i += 2;
            }
            "--texture" => {
                export_options.texture_uri = args.get(i + 1).cloned();
                i += 2;
            }
            "--name" => {
                export_options.name = parse_value("--name", args.get(i + 1));
                i += 2;
            }
            "--threshold" => {
                load_options.invalid_threshold = parse_value("--threshold", args.get(i + 1));
                i += 2;
            }
            _ => {
                if input.is_some() {
                    eprintln!("Unexpected argument '{}'", args[i]);
                    usage();
                }
                input = Some(PathBuf::from(&args[i]));
                i += 1;
            }
        }
    }

    let (Some(input), Some(output)) = (input, output) else {
        usage();
    };

    eprintln!("Generating terrain ...");
    eprintln!("  Heightmap: {}", input.display());
    eprintln!("  Output: {}", output.display());

    match generate_terrain(&input, &output, &load_options, &export_options) {
        Ok(TerrainExportResult {
            rows,
            cols,
            vertex_count,
            triangle_count,
            ..
        }) => {
            eprintln!("Terrain export complete!");
            eprintln!("  Grid: {} x {} nodes", cols, rows);
            eprintln!("  Vertices: {}", vertex_count);
            eprintln!("  Triangles: {}", triangle_count);
        }
        Err(e) => {
            eprintln!("Terrain export failed: {:?}", e);
            exit(1);
        }
    }
}

fn run_landmarks(args: &[String]) {
    let mut inputs: Vec<PathBuf> = Vec::new();
    let mut output: Option<PathBuf> = None;
    let mut offset = 0.0f32;
    let mut load_options = LoadOptions::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-o" | "--output" => {
                output = args.get(i + 1).map(PathBuf::from);
                i += 2;
            }
            "--offset" | "-s" => {
                offset = parse_value("--offset", args.get(i + 1));
                i += 2;
            }
            "--threshold" => {
                load_options.invalid_threshold = parse_value("--threshold", args.get(i + 1));
                i += 2;
            }
            _ => {
                inputs.push(PathBuf::from(&args[i]));
                i += 1;
            }
        }
    }

    if inputs.len() != 2 {
        usage();
    }
    let Some(output) = output else {
        usage();
    };

    eprintln!("Snapping landmarks to terrain ...");
    eprintln!("  Heightmap: {}", inputs[0].display());
    eprintln!("  Landmarks: {}", inputs[1].display());

    match snap_landmark_heights(&inputs[0], &inputs[1], &output, offset, &load_options) {
        Ok(count) => {
            eprintln!("Landmark snap complete!");
            eprintln!("  Landmarks: {}", count);
            eprintln!("  Output: {}", output.display());
        }
        Err(e) => {
            eprintln!("Landmark snap failed: {:?}", e);
            exit(1);
        }
    }
}

fn run_preview(args: &[String]) {
    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut size: Option<u32> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-o" | "--output" => {
                output = args.get(i + 1).map(PathBuf::from);
                i += 2;
            }
            "--size" => {
                size = Some(parse_value("--size", args.get(i + 1)));
                i += 2;
            }
            _ => {
                input = Some(PathBuf::from(&args[i]));
                i += 1;
            }
        }
    }

    let (Some(input), Some(output)) = (input, output) else {
        usage();
    };

    let result = Heightfield::from_csv(&input, &LoadOptions::default())
        .map_err(anyhow::Error::from)
        .and_then(|hf| write_preview_png(&hf, &output, size));

    match result {
        Ok(()) => eprintln!("Preview written to {}", output.display()),
        Err(e) => {
            eprintln!("Preview failed: {:?}", e);
            exit(1);
        }
    }
}

fn run_random(args: &[String]) {
    let mut output: Option<PathBuf> = None;
    let mut options = RandomHeightmapOptions::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-o" | "--output" => {
                output = args.get(i + 1).map(PathBuf::from);
                i += 2;
            }
            "--rows" => {
                options.rows = parse_value("--rows", args.get(i + 1));
                i += 2;
            }
            "--cols" => {
                options.cols = parse_value("--cols", args.get(i + 1));
                i += 2;
            }
            "--seed" => {
                options.seed = parse_value("--seed", args.get(i + 1));
                i += 2;
            }
            other => {
                eprintln!("Unexpected argument '{}'", other);
                usage();
            }
        }
    }

    let Some(output) = output else {
        usage();
    };

    match generate_random_heightmap(&output, &options) {
        Ok(()) => {
            eprintln!("Random heightmap written to {}", output.display());
            eprintln!("  Grid: {} x {} nodes (seed {})", options.cols, options.rows, options.seed);
        }
        Err(e) => {
            eprintln!("Random heightmap failed: {:?}", e);
            exit(1);
        }
    }
}
