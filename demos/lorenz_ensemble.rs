//! Sample one of the attractor scenes and print how quickly its trajectories separate.
//!
//! ```sh
//! RUST_LOG=lorenzsol=debug cargo run --release --example lorenz_ensemble -- classical
//! ```
use lorenzsol::{trajectory::DEFAULT_TIME_TRACED, LorenzsolError, SceneConfig};
use tracing_subscriber::EnvFilter;

fn scene(name: &str) -> Option<SceneConfig> {
    match name {
        "lorenz" => Some(SceneConfig::lorenz_attractor()),
        "long" => Some(SceneConfig::lorenz_attractor_long()),
        "classical" => Some(SceneConfig::classical_lorenz_attractor()),
        "twin" => Some(SceneConfig::twin_lorenz_attractor()),
        _ => None,
    }
}

fn main() -> Result<(), LorenzsolError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let name = std::env::args().nth(1).unwrap_or_else(|| "twin".to_string());
    let Some(config) = scene(&name) else {
        eprintln!("unknown scene {name}, expected one of lorenz, long, classical, twin");
        std::process::exit(2);
    };

    let ensemble = config.sample()?;
    println!(
        "{name}: {} trajectories of {} samples (rho = {}, dt = {})",
        ensemble.len(),
        ensemble.nsamples(),
        config.parameters.rho,
        config.dt
    );
    for threshold in [1e-3, 1e-1, 1.0, 10.0] {
        match ensemble.divergence_time(threshold) {
            Some(t) => println!("  spread > {threshold:>6}: t = {t:.2}"),
            None => println!("  spread > {threshold:>6}: never"),
        }
    }
    for elapsed in [0.0, 10.0, 20.0] {
        let positions = ensemble.positions_at(elapsed);
        let first = positions[0];
        println!(
            "  t = {elapsed:>4}: first point at ({:.3}, {:.3}, {:.3})",
            first.x, first.y, first.z
        );
    }
    let tail = ensemble.trajectories()[0].tail(20.0, DEFAULT_TIME_TRACED);
    println!("  traced path at t = 20 has {} points", tail.len());
    Ok(())
}
