mod options;

use anyhow::Error as AnyError;
use clap::Parser;
use log::debug;
use options::{Cli, Command as CliCmd};
use serde::Serialize;
use terrain::{CoverEngine, ElevationEngine};

fn main() -> Result<(), AnyError> {
    env_logger::init();
    let Cli { dir, json, cmd } = Cli::parse();

    match cmd {
        CliCmd::Elevation {
            lon,
            lat,
            resolution,
            tier,
        } => {
            let engine = ElevationEngine::new(&dir)?;
            let elevation = match (resolution, tier) {
                (Some(resolution), _) => engine.elevation_at_resolution(lon, lat, resolution)?,
                (None, Some(tier)) => engine.elevation_for_tier(lon, lat, tier)?,
                (None, None) => engine.elevation(lon, lat)?,
            };
            debug!("elevation ({lon}, {lat}) = {elevation}");
            if json {
                #[derive(Serialize)]
                struct JsonEntry {
                    location: [f64; 2],
                    elevation: Option<f64>,
                }
                print_json(&JsonEntry {
                    location: [lon, lat],
                    elevation: (!elevation.is_nan()).then_some(elevation),
                })
            } else {
                println!("{elevation}");
                Ok(())
            }
        }
        CliCmd::Cover { lon, lat } => {
            let engine = CoverEngine::new(&dir)?;
            let cover_type = engine.cover_type(lon, lat)?;
            if json {
                #[derive(Serialize)]
                struct JsonEntry {
                    location: [f64; 2],
                    cover: String,
                    code: i16,
                    open_water: bool,
                }
                print_json(&JsonEntry {
                    location: [lon, lat],
                    cover: cover_type.to_string(),
                    code: cover_type.code(),
                    open_water: CoverEngine::is_open_water(cover_type),
                })
            } else {
                println!("{cover_type} ({})", cover_type.code());
                Ok(())
            }
        }
        CliCmd::Tiers => {
            let engine = ElevationEngine::new(&dir)?;
            let tiers: Vec<_> = engine
                .tiers()
                .filter_map(|tier| {
                    let matrix = engine.matrix(tier)?;
                    Some((tier.to_string(), matrix.len(), matrix.dimension()?))
                })
                .collect();
            if json {
                print_json(&tiers)
            } else {
                for (tier, tiles, dimension) in tiers {
                    println!("{tier:12} {tiles:6} tiles {dimension:5}x{dimension}");
                }
                Ok(())
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AnyError> {
    let json = serde_json::to_string(value)?;
    println!("{json}");
    Ok(())
}
