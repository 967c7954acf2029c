use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec3;
use stagecraft_common::{PixelSize, Transform};
use stagecraft_config::{Config, Extent, Options};
use stagecraft_kernel::{Element, QueuedFramePort, SceneNode, TimerDriver, World};
use stagecraft_physics::{BodyDesc, RapierScene};
use stagecraft_render::{HeadlessRenderer, PassComposer};
use stagecraft_tools::WorldInspector;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stagecraft-cli", about = "CLI tool for stagecraft worlds")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Resolve options against the defaults and print the result as YAML
    Config {
        /// Options file (.yaml, .yml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Host viewport width
        #[arg(long, default_value = "1280")]
        width: f64,
        /// Host viewport height
        #[arg(long, default_value = "720")]
        height: f64,
    },
    /// Run a headless world with falling bodies
    Run {
        /// Options file (.yaml, .yml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of frames to run
        #[arg(short, long, default_value = "120")]
        frames: u64,
        /// Frame rate; 0 runs without waiting between frames
        #[arg(long, default_value = "60")]
        fps: f64,
        /// Number of bodies dropped onto the ground
        #[arg(short, long, default_value = "3")]
        bodies: usize,
        /// Render through a post-processing composer
        #[arg(long)]
        composer: bool,
    },
}

const HOST: Extent = Extent {
    width: 1280.0,
    height: 720.0,
};

fn load_options(path: Option<&PathBuf>) -> anyhow::Result<Options> {
    match path {
        Some(path) => Options::load(path)
            .with_context(|| format!("failed to load options from {}", path.display())),
        None => Ok(Options::new()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("stagecraft-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("config: {}", stagecraft_config::crate_info());
            println!("kernel: {}", stagecraft_kernel::crate_info());
            println!("physics: {}", stagecraft_physics::crate_info());
            println!("render: {}", stagecraft_render::crate_info());
            println!("tools: {}", stagecraft_tools::crate_info());
        }
        Commands::Config {
            config,
            width,
            height,
        } => {
            let options = load_options(config.as_ref())?;
            let resolved = options.resolve(Extent::new(width, height));
            print!("{}", resolved.to_yaml()?);
        }
        Commands::Run {
            config,
            frames,
            fps,
            bodies,
            composer,
        } => {
            let mut options = load_options(config.as_ref())?;
            options.gravity.y.get_or_insert(-9.81);
            run(options.resolve(HOST), frames, fps, bodies, composer)?;
        }
    }

    Ok(())
}

fn run(config: Config, frames: u64, fps: f64, bodies: usize, composer: bool) -> anyhow::Result<()> {
    let mut physics = RapierScene::new();
    physics.add_ground(0.0);
    let nodes: Vec<SceneNode> = (0..bodies)
        .map(|i| {
            let position = Vec3::new(i as f32 * 1.5, 4.0 + i as f32, 0.0);
            let node = SceneNode::mesh(format!("body-{i}"), Transform::from_position(position));
            physics.attach(node.id, position, BodyDesc::ball(0.5));
            node
        })
        .collect();

    let (port, requests) = QueuedFramePort::new();
    let mut world = World::builder(config)
        .physics(physics)
        .renderer(HeadlessRenderer::new())
        .frame_port(port)
        .build();
    let ids: Vec<_> = nodes.into_iter().map(|node| world.add(node)).collect();

    let screen = Element::shared("screen");
    if composer {
        let size = world
            .renderer()
            .map(|r| r.size())
            .unwrap_or_else(PixelSize::default);
        let mut passes = PassComposer::new(Rc::clone(&screen), size, world.config().background);
        passes.add_pass("footer", |buf| {
            buf.push_str("-- composed --\n");
            Ok(())
        });
        world.set_composer(passes);
    }

    world.start()?;
    let mut driver = TimerDriver::new(requests).with_limit(frames);
    if fps > 0.0 {
        driver = driver.with_interval(Duration::from_secs_f64(1.0 / fps));
    } else {
        driver = driver.with_pacer(|_| {});
    }
    let ran = driver.run(&mut world);
    world.stop();

    println!("Ran {ran} frames in {:.1} ms", world.elapsed_ms());
    println!("{}", WorldInspector::summary(&world));
    for id in ids {
        if let Some(info) = WorldInspector::inspect_node(&world, id) {
            println!("  {info}");
        }
    }
    if let Some(overlay) = world.overlay() {
        println!("Overlay ({}): {}", overlay.mode(), overlay.element().borrow().text());
    }
    if composer {
        print!("{}", screen.borrow().text());
    }
    for warning in world.warnings() {
        println!("warning: {warning}");
    }
    Ok(())
}
