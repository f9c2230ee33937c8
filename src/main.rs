use std::error::Error;
use std::fs;
use std::path::Path;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use arplay::interaction::features::{HitOptions, HitPolicy};
use arplay::interaction::overlay::Overlay;
use arplay::interaction::parser::SessionParser;
use arplay::interaction::replay::Replay;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// the ray is an infinite line, features behind the camera can be hit
    Line,
    /// only features in front of the camera can be hit
    ForwardRay,
}

impl From<PolicyArg> for HitPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Line => HitPolicy::Line,
            PolicyArg::ForwardRay => HitPolicy::ForwardRay,
        }
    }
}

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// the session script to replay
    session: String,
    /// which feature points a touch ray can hit
    #[arg(short, long, value_enum, default_value_t = PolicyArg::Line)]
    policy: PolicyArg,
    /// scan the feature cloud in parallel
    #[arg(long, default_value = "false")]
    parallel: bool,
    /// save a debug image of the session to this path
    #[arg(short, long)]
    overlay: Option<String>,
    /// view points per overlay pixel
    #[arg(long, default_value_t = 2)]
    overlay_scale: u32,
    /// increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let content = fs::read_to_string(&args.session)?;
    let base_dir = Path::new(&args.session)
        .parent()
        .unwrap_or_else(|| Path::new("."));
    let mut parser = SessionParser::new(&content).with_base_dir(base_dir);
    let session = match parser.parse_session() {
        Ok(session) => session,
        Err(parser_error) => {
            eprintln!("{}", parser_error.location(&content));
            return Err(Box::from(format!("parser error {}", parser_error.message)));
        }
    };
    info!(?session, "session loaded");

    let options = HitOptions::new(args.policy.into(), args.parallel);
    let mut replay = Replay::new(options);

    let start = Instant::now();
    for (i, event) in session.events.iter().enumerate() {
        let outcome = replay.step(&session, event);
        println!("[{}] {}", i, outcome);
    }
    let total_time = start.elapsed();
    println!(
        "Replayed {} events over {} feature points in {:?}",
        session.events.len(),
        session.cloud.len(),
        total_time
    );

    if let Some(path) = &args.overlay {
        let mut overlay = Overlay::new(&session.camera, args.overlay_scale);
        overlay.draw_cloud(&session.camera, &session.cloud);
        for hit in replay.hits() {
            overlay.draw_hit(&session.camera, hit.position);
        }
        for object in replay.placement().objects() {
            overlay.draw_object(&session.camera, object.position);
        }
        overlay.save(path)?;
        info!(path = %path, "overlay saved");
    }
    Ok(())
}
