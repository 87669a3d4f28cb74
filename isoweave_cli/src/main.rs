// CLI entry point: generate a level, print its projections, optionally
// auto-play it.
//
// Walking plants every cell of a level by following inter-perspective
// routes, rotating the camera whenever the next waypoint needs it, until
// the grid advances to the next level.
//
// Logging goes through `env_logger`; set `RUST_LOG=debug` to see overlap
// decisions, `trace` for every rejected placement.
//
// Usage:
//   isoweave [OPTIONS]
//     --seed <N>             RNG seed (default: 0)
//     --perspective <P>      se, sw, nw, ne or all (default: all)
//     --config <PATH>        GridConfig JSON (default: built-in defaults)
//     --walk <N>             Auto-play N levels after generating (default: 0)
//     --save <PATH>          Write a JSON snapshot when done
//     --help                 Print this help

use isoweave_core::ascii::render_projection;
use isoweave_core::config::GridConfig;
use isoweave_core::event::GridEvent;
use isoweave_core::geometry::Perspective;
use isoweave_core::grid::Grid;
use log::{info, warn};

const USAGE: &str = "usage: isoweave [--seed N] [--perspective se|sw|nw|ne|all] \
[--config PATH] [--walk N] [--save PATH]";

struct Options {
    seed: u64,
    /// `None` prints all four.
    perspective: Option<Perspective>,
    config_path: Option<String>,
    walk_levels: u32,
    save_path: Option<String>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let options = parse_args();

    let config = match &options.config_path {
        Some(path) => load_config(path),
        None => GridConfig::default(),
    };
    let mut grid = Grid::generate(config, options.seed).unwrap_or_else(|e| {
        eprintln!("Invalid config: {e}");
        std::process::exit(1);
    });
    info!("generated level 0 with seed {}", options.seed);
    print_level(&grid, options.perspective);

    for _ in 0..options.walk_levels {
        let events = walk_level(&mut grid);
        for event in &events {
            if !matches!(event, GridEvent::CellStateChanged { .. }) {
                println!("  {event}");
            }
        }
        print_level(&grid, options.perspective);
    }

    if let Some(path) = &options.save_path {
        let json = grid.to_json().unwrap_or_else(|e| {
            eprintln!("Failed to serialize grid: {e}");
            std::process::exit(1);
        });
        if let Err(e) = std::fs::write(path, json) {
            eprintln!("Failed to write {path}: {e}");
            std::process::exit(1);
        }
        println!("Snapshot written to {path}");
    }
}

fn parse_args() -> Options {
    let mut options = Options {
        seed: 0,
        perspective: None,
        config_path: None,
        walk_levels: 0,
        save_path: None,
    };
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--seed" => {
                i += 1;
                options.seed = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--seed requires an unsigned integer");
                    std::process::exit(1);
                });
            }
            "--perspective" => {
                i += 1;
                options.perspective = match args.get(i).map(String::as_str) {
                    Some("all") => None,
                    Some(name) => Some(Perspective::from_short_name(name).unwrap_or_else(|| {
                        eprintln!("--perspective must be one of se, sw, nw, ne, all");
                        std::process::exit(1);
                    })),
                    None => {
                        eprintln!("--perspective requires a value");
                        std::process::exit(1);
                    }
                };
            }
            "--config" => {
                i += 1;
                options.config_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--config requires a path");
                    std::process::exit(1);
                }));
            }
            "--walk" => {
                i += 1;
                options.walk_levels =
                    args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                        eprintln!("--walk requires a level count");
                        std::process::exit(1);
                    });
            }
            "--save" => {
                i += 1;
                options.save_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--save requires a path");
                    std::process::exit(1);
                }));
            }
            "--help" | "-h" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}\n{USAGE}");
                std::process::exit(1);
            }
        }
        i += 1;
    }

    options
}

fn load_config(path: &str) -> GridConfig {
    let json = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Failed to read {path}: {e}");
        std::process::exit(1);
    });
    GridConfig::from_json(&json).unwrap_or_else(|e| {
        eprintln!("{path}: {e}");
        std::process::exit(1);
    })
}

fn print_level(grid: &Grid, only: Option<Perspective>) {
    println!(
        "Level {}: {} cells, {} planted, facing {}",
        grid.level(),
        grid.cell_count(),
        grid.planted_count(),
        grid.perspective(),
    );
    let perspectives: Vec<Perspective> = match only {
        Some(p) => vec![p],
        None => Perspective::ALL.to_vec(),
    };
    for p in perspectives {
        println!("[{p}]");
        print!("{}", render_projection(grid, p));
    }
}

/// Plant every cell of the current level. Stops early if a cell turns out
/// to be unreachable.
fn walk_level(grid: &mut Grid) -> Vec<GridEvent> {
    let start_level = grid.level();
    let mut events = Vec::new();

    while grid.level() == start_level {
        let Some(goal) = grid.cells().find(|c| !c.is_planted()).map(|c| c.id()) else {
            break;
        };
        let Some(route) =
            grid.plan_inter_perspective_route(grid.current_cell(), grid.perspective(), goal)
        else {
            warn!("{goal} is unreachable from {}", grid.current_cell());
            break;
        };
        for waypoint in route {
            events.extend(grid.set_perspective(waypoint.perspective));
            events.extend(grid.set_current_cell(waypoint.cell));
            if grid.level() != start_level {
                break;
            }
        }
    }

    events
}
