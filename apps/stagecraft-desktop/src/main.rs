use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;
use stagecraft_common::Transform;
use stagecraft_config::{Extent, HelperOption, Options};
use stagecraft_kernel::{FramePort, SceneNode, World};
use stagecraft_physics::{BodyDesc, RapierScene};
use stagecraft_render_wgpu::WgpuRenderer;
use stagecraft_tools::WorldInspector;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "stagecraft-desktop", about = "Stagecraft desktop host")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Options file (.yaml, .yml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of bodies dropped onto the ground
    #[arg(short, long, default_value = "8")]
    bodies: usize,
}

/// Frame port backed by winit redraw requests.
struct RedrawPort(Arc<Window>);

impl FramePort for RedrawPort {
    fn request_frame(&mut self) {
        self.0.request_redraw();
    }
}

struct DesktopApp {
    options: Options,
    bodies: usize,
    window: Option<Arc<Window>>,
    world: Option<World>,
}

impl DesktopApp {
    fn new(options: Options, bodies: usize) -> Self {
        Self {
            options,
            bodies,
            window: None,
            world: None,
        }
    }

    fn build_world(&self, window: Arc<Window>) -> Result<World> {
        let size = window.inner_size();
        let config = self
            .options
            .resolve(Extent::new(size.width as f64, size.height as f64));

        let renderer = WgpuRenderer::new(Arc::clone(&window), size.width, size.height)?;

        let mut physics = RapierScene::new();
        physics.add_ground(0.0);
        let nodes: Vec<SceneNode> = (0..self.bodies)
            .map(|i| {
                let position = Vec3::new((i % 4) as f32 * 1.5 - 2.25, 3.0 + i as f32, 0.0);
                let node =
                    SceneNode::mesh(format!("body-{i}"), Transform::from_position(position));
                physics.attach(node.id, position, BodyDesc::cuboid(Vec3::splat(0.5)));
                node
            })
            .collect();

        let mut world = World::builder(config)
            .physics(physics)
            .renderer(renderer)
            .frame_port(RedrawPort(window))
            .build();
        for node in nodes {
            world.add(node);
        }
        world.start()?;
        Ok(world)
    }
}

impl ApplicationHandler for DesktopApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Stagecraft")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                tracing::error!(error = %err, "failed to create window");
                event_loop.exit();
                return;
            }
        };

        match self.build_world(Arc::clone(&window)) {
            Ok(world) => {
                tracing::info!("{}", WorldInspector::summary(&world));
                self.world = Some(world);
                self.window = Some(window);
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to start world");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(world) = &mut self.world else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                world.stop();
                tracing::info!("{}", WorldInspector::summary(world));
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Err(err) = world.handle_viewport_resize(size.width as f64, size.height as f64)
                {
                    tracing::warn!(error = %err, "resize ignored");
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => match code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::Space => {
                    let simulate = !world.is_simulating();
                    world.set_simulate(simulate);
                    tracing::info!(simulate, "simulation toggled");
                }
                _ => {}
            },
            WindowEvent::RedrawRequested => {
                let timestamp = world.elapsed_ms();
                if let Err(err) = world.frame(timestamp) {
                    tracing::error!(error = %err, "frame failed");
                }
            }
            _ => {}
        }
    }
}

/// Fill options the desktop scene needs when the file leaves them unset.
fn desktop_defaults(options: &mut Options) {
    options.auto_resize.get_or_insert(true);
    options.gravity.y.get_or_insert(-9.81);
    options.camera.y.get_or_insert(6.0);
    options.camera.z.get_or_insert(14.0);
    options.helpers.grid.get_or_insert(HelperOption::Flag(true));
    options.helpers.axis.get_or_insert(HelperOption::Flag(true));
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("stagecraft-desktop starting");

    let mut options = match &cli.config {
        Some(path) => Options::load(path)
            .with_context(|| format!("failed to load options from {}", path.display()))?,
        None => Options::new(),
    };
    desktop_defaults(&mut options);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = DesktopApp::new(options, cli.bodies);
    event_loop.run_app(&mut app)?;

    Ok(())
}
