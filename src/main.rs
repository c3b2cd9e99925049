use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use proximity_alert::audio::AssetAudioOutput;
use proximity_alert::location::{densify_route, SimulatedLocationProvider};
use proximity_alert::{EngineConfig, ProximityEngine};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::time::{interval, sleep, Duration, MissedTickBehavior};

/// Spacing used to interpolate between route waypoints (meters)
const ROUTE_SPACING_M: f64 = 25.0;

#[derive(Parser, Debug)]
#[command(name = "proximity_alert")]
#[command(about = "Background proximity alerts against a remote status endpoint", long_about = None)]
struct Args {
    /// Status endpoint URL (overrides the config file)
    #[arg(long)]
    endpoint: Option<String>,

    /// Device identifier sent with every report (overrides the config file)
    #[arg(long)]
    device_id: Option<String>,

    /// JSON config file
    #[arg(long, value_name = "FILE")]
    config: Option<String>,

    /// Ping interval in seconds
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Directory holding the cue sound files
    #[arg(long, default_value = "assets/sounds")]
    assets: String,

    /// Sound file extension
    #[arg(long, default_value = "mp3")]
    asset_ext: String,

    /// Simulated route, "lat,lng;lat,lng;..."
    #[arg(long)]
    route: String,

    /// Seconds between simulated location updates
    #[arg(long, default_value = "5")]
    step_secs: u64,

    /// Duration in seconds (0 = until Ctrl-C)
    #[arg(long, default_value = "0")]
    duration: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(endpoint) = &args.endpoint {
        config.endpoint_url = endpoint.clone();
    }
    if let Some(device_id) = &args.device_id {
        config.device_id = device_id.clone();
    }
    if let Some(secs) = args.interval_secs {
        config.ping_interval = Duration::from_secs(secs);
    }

    let waypoints = parse_route(&args.route)?;
    let route = densify_route(&waypoints, ROUTE_SPACING_M);

    println!("[{}] Proximity Alert Starting", ts_now());
    println!("  Endpoint: {}", config.endpoint_url);
    println!("  Device: {}", config.device_id);
    println!("  Ping Interval: {:?}", config.ping_interval);
    println!("  Route: {} waypoints ({} after densify)", waypoints.len(), route.len());
    println!("  Duration: {} seconds (0=continuous)", args.duration);

    let runtime = Handle::current();
    let location = Arc::new(SimulatedLocationProvider::new(
        &route,
        Duration::from_secs(args.step_secs.max(1)),
        runtime.clone(),
    ));

    let audio = Arc::new(AssetAudioOutput::new(&args.assets, &args.asset_ext));
    let missing = audio.missing_cues();
    if !missing.is_empty() {
        log::warn!("[audio] missing cue assets in {}: {:?}", args.assets, missing);
    }

    let status_every = config.ping_interval;
    let engine = ProximityEngine::with_http(config, location, audio, runtime)
        .context("engine setup failed")?;
    engine.handle_command("startService")?;

    let deadline = sleep(if args.duration == 0 {
        Duration::MAX
    } else {
        Duration::from_secs(args.duration)
    });
    tokio::pin!(deadline);

    let mut report = interval(status_every);
    report.set_missed_tick_behavior(MissedTickBehavior::Delay);
    report.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("[{}] Ctrl-C received, stopping...", ts_now());
                break;
            }
            _ = &mut deadline => {
                println!("[{}] Duration reached, stopping...", ts_now());
                break;
            }
            _ = report.tick() => {
                println!("[{}] {}", ts_now(), engine.status().to_json()?);
            }
        }
    }

    engine.handle_command("stopService")?;
    println!("[{}] Final status: {}", ts_now(), engine.status().to_json()?);
    Ok(())
}

/// Parse `"lat,lng;lat,lng"` into waypoints
fn parse_route(spec: &str) -> Result<Vec<(f64, f64)>> {
    let mut waypoints = Vec::new();
    for pair in spec.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((lat, lng)) = pair.split_once(',') else {
            bail!("route point '{}' is not lat,lng", pair);
        };
        let lat: f64 = lat.trim().parse().with_context(|| format!("bad latitude in '{}'", pair))?;
        let lng: f64 = lng.trim().parse().with_context(|| format!("bad longitude in '{}'", pair))?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            bail!("route point '{}' is out of range", pair);
        }
        waypoints.push((lat, lng));
    }
    if waypoints.is_empty() {
        bail!("route needs at least one lat,lng point");
    }
    Ok(waypoints)
}

fn ts_now() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_route() {
        let route = parse_route("36.0,127.0; 36.001, 127.002 ;").unwrap();
        assert_eq!(route, vec![(36.0, 127.0), (36.001, 127.002)]);
    }

    #[test]
    fn test_parse_route_rejects_garbage() {
        assert!(parse_route("").is_err());
        assert!(parse_route("36.0").is_err());
        assert!(parse_route("north,127.0").is_err());
        assert!(parse_route("95.0,127.0").is_err());
    }
}
