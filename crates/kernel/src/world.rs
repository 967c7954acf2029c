use std::any::Any;
use std::fmt;
use std::rc::Rc;

use stagecraft_common::{NodeId, PixelSize};
use stagecraft_config::Config;

use crate::camera::{Camera, downcast_camera};
use crate::clock::TimeSource;
use crate::collab::{Composer, Controls, Renderer};
use crate::diagnostics::DiagnosticsOverlay;
use crate::error::{StartError, TickError, WorldError};
use crate::factory::{BuildWarning, WorldBuilder};
use crate::loops::LoopRegistry;
use crate::scene::{Scene, SceneNode};
use crate::scheduler::{FramePort, FrameScheduler, SchedulerState, TickOutcome};
use crate::surface::ElementRef;

pub(crate) struct Parts {
    pub config: Config,
    pub scene: Scene,
    pub camera: Box<dyn Camera>,
    pub renderer: Option<Box<dyn Renderer>>,
    pub overlay: Option<Box<dyn DiagnosticsOverlay>>,
    pub mount: ElementRef,
    pub container: ElementRef,
    pub children: Vec<NodeId>,
    pub simulate: bool,
    pub frame_port: Option<Box<dyn FramePort>>,
    pub time: Rc<dyn TimeSource>,
    pub warnings: Vec<BuildWarning>,
}

/// Root aggregate tying scene, camera, renderer and the frame loop together.
///
/// Built by [`WorldBuilder`]. Nothing runs until [`World::start`]; after that the
/// host calls [`World::frame`] once per requested frame.
pub struct World {
    config: Config,
    scene: Scene,
    camera: Option<Box<dyn Camera>>,
    renderer: Option<Box<dyn Renderer>>,
    composer: Option<Box<dyn Composer>>,
    controls: Option<Box<dyn Controls>>,
    overlay: Option<Box<dyn DiagnosticsOverlay>>,
    mount: ElementRef,
    container: ElementRef,
    children: Vec<NodeId>,
    simulate: bool,
    render: bool,
    loops: LoopRegistry,
    scheduler: FrameScheduler,
    time: Rc<dyn TimeSource>,
    controls_last_ms: f64,
    warnings: Vec<BuildWarning>,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("scene", &self.scene)
            .field("has_camera", &self.camera.is_some())
            .field("has_renderer", &self.renderer.is_some())
            .field("has_composer", &self.composer.is_some())
            .field("has_controls", &self.controls.is_some())
            .field("has_overlay", &self.overlay.is_some())
            .field("children", &self.children.len())
            .field("simulate", &self.simulate)
            .field("render", &self.render)
            .field("loops", &self.loops)
            .field("scheduler", &self.scheduler)
            .field("warnings", &self.warnings)
            .finish()
    }
}

impl World {
    /// Start assembling a world from a resolved configuration.
    pub fn builder(config: Config) -> WorldBuilder {
        WorldBuilder::new(config)
    }

    pub(crate) fn assemble(parts: Parts) -> Self {
        let render = parts.renderer.is_some();
        Self {
            config: parts.config,
            scene: parts.scene,
            camera: Some(parts.camera),
            renderer: parts.renderer,
            composer: None,
            controls: None,
            overlay: parts.overlay,
            mount: parts.mount,
            container: parts.container,
            children: parts.children,
            simulate: parts.simulate,
            render,
            loops: LoopRegistry::new(Rc::clone(&parts.time)),
            scheduler: FrameScheduler::new(parts.frame_port),
            time: parts.time,
            controls_last_ms: 0.0,
            warnings: parts.warnings,
        }
    }

    /// Effective configuration, fixed at build time.
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Replace the scene and return the previous one. Direct children recorded
    /// against the previous scene are forgotten.
    pub fn set_scene(&mut self, scene: Scene) -> Scene {
        self.children.clear();
        std::mem::replace(&mut self.scene, scene)
    }

    pub fn camera(&self) -> Option<&dyn Camera> {
        self.camera.as_deref()
    }

    pub fn camera_mut(&mut self) -> Option<&mut (dyn Camera + 'static)> {
        self.camera.as_deref_mut()
    }

    pub fn set_camera<C: Camera>(&mut self, camera: C) {
        self.camera = Some(Box::new(camera));
    }

    /// Assign an untyped value as the camera. Values that are not a known camera
    /// type are rejected and the current camera is kept.
    pub fn try_set_camera(&mut self, candidate: Box<dyn Any>) -> Result<(), WorldError> {
        match downcast_camera(candidate) {
            Ok(camera) => {
                self.camera = Some(camera);
                Ok(())
            }
            Err(_) => {
                tracing::error!("rejected camera assignment: value is not a camera");
                Err(WorldError::NotACamera)
            }
        }
    }

    pub fn renderer(&self) -> Option<&dyn Renderer> {
        self.renderer.as_deref()
    }

    pub fn renderer_mut(&mut self) -> Option<&mut (dyn Renderer + 'static)> {
        self.renderer.as_deref_mut()
    }

    /// Install a renderer and turn rendering on.
    pub fn set_renderer(&mut self, renderer: impl Renderer + 'static) {
        self.renderer = Some(Box::new(renderer));
        self.render = true;
    }

    /// Present frames through a post-processing composer instead of the plain renderer.
    pub fn set_composer(&mut self, composer: impl Composer + 'static) {
        self.composer = Some(Box::new(composer));
    }

    pub fn has_composer(&self) -> bool {
        self.composer.is_some()
    }

    pub fn set_controls(&mut self, controls: impl Controls + 'static) {
        self.controls = Some(Box::new(controls));
    }

    /// Add a node to the scene and record it as a direct child of the world.
    pub fn add(&mut self, node: SceneNode) -> NodeId {
        let id = self.scene.add(node);
        self.children.push(id);
        id
    }

    pub fn remove(&mut self, id: NodeId) -> Option<SceneNode> {
        self.children.retain(|c| *c != id);
        self.scene.graph_mut().remove(id)
    }

    /// Direct children, in insertion order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_simulating(&self) -> bool {
        self.simulate
    }

    pub fn set_simulate(&mut self, simulate: bool) {
        self.simulate = simulate;
    }

    pub fn is_rendering(&self) -> bool {
        self.render
    }

    pub fn set_render(&mut self, render: bool) {
        self.render = render;
    }

    /// Handle to this world's loop registry.
    pub fn loops(&self) -> LoopRegistry {
        self.loops.clone()
    }

    pub fn overlay(&self) -> Option<&dyn DiagnosticsOverlay> {
        self.overlay.as_deref()
    }

    pub fn overlay_mut(&mut self) -> Option<&mut (dyn DiagnosticsOverlay + 'static)> {
        self.overlay.as_deref_mut()
    }

    /// Element this world mounted its container into.
    pub fn mount(&self) -> ElementRef {
        Rc::clone(&self.mount)
    }

    /// Container holding the renderer output and the overlay panel.
    pub fn container(&self) -> ElementRef {
        Rc::clone(&self.container)
    }

    pub fn warnings(&self) -> &[BuildWarning] {
        &self.warnings
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// Ticks executed since the world was built.
    pub fn frames(&self) -> u64 {
        self.scheduler.frames()
    }

    /// Milliseconds on this world's time source.
    pub fn elapsed_ms(&self) -> f64 {
        self.time.now().as_secs_f64() * 1000.0
    }

    /// Begin the frame loop and request the first frame.
    pub fn start(&mut self) -> Result<(), StartError> {
        if self.scheduler.is_running() {
            tracing::warn!("start called on a running world");
            return Err(StartError::AlreadyRunning);
        }
        if self.camera.is_none() {
            return Err(StartError::MissingCamera);
        }
        if self.renderer.is_none() {
            return Err(StartError::MissingRenderer);
        }

        let now = self.time.now();
        self.scheduler.start(now)?;
        self.loops.restart_clocks();
        self.controls_last_ms = now.as_secs_f64() * 1000.0;
        if !self.scheduler.request_frame() {
            tracing::debug!("no frame port; waiting for the host to call frame()");
        }
        tracing::info!(loops = self.loops.len(), "world started");
        Ok(())
    }

    /// Stop the frame loop. Frames delivered afterwards do nothing.
    pub fn stop(&mut self) {
        self.scheduler.stop();
        tracing::info!(frames = self.scheduler.frames(), "world stopped");
    }

    /// Run one tick. `timestamp` is the host's frame time in milliseconds.
    ///
    /// The next frame is requested before any work, so a failing tick still
    /// keeps the loop alive. An error aborts the remaining steps of this tick.
    pub fn frame(&mut self, timestamp: f64) -> Result<TickOutcome, TickError> {
        if !self.scheduler.is_running() {
            tracing::trace!(timestamp, "frame while not running");
            return Ok(TickOutcome::Halted);
        }
        let _span = tracing::info_span!("frame", index = self.scheduler.frames()).entered();

        self.scheduler.request_frame();

        if let Some(overlay) = self.overlay.as_mut() {
            overlay.begin();
        }

        let now = self.time.now();
        let frame = self.scheduler.next_frame(timestamp, now);
        let graph = self.scene.graph_mut();
        for id in &self.children {
            if let Some(node) = graph.get_mut(*id).filter(|n| n.is_morph()) {
                node.advance_animation(frame.delta);
            }
        }

        if self.simulate {
            self.scene.simulate().map_err(TickError::Physics)?;
        }

        if let Some(controls) = self.controls.as_mut() {
            let now_ms = now.as_secs_f64() * 1000.0;
            controls.update(now_ms - self.controls_last_ms);
            self.controls_last_ms = now_ms;
        }

        if let Some(composer) = self.composer.as_mut() {
            composer.reset();
            if self.render {
                let camera = self.camera.as_deref().ok_or(TickError::MissingCamera)?;
                composer
                    .render(&self.scene, camera)
                    .map_err(TickError::Composer)?;
            }
            composer.pass().map_err(TickError::Composer)?;
            composer.to_screen().map_err(TickError::Composer)?;
        } else if self.render {
            let camera = self.camera.as_deref().ok_or(TickError::MissingCamera)?;
            let renderer = self
                .renderer
                .as_mut()
                .ok_or(TickError::MissingRenderer)?;
            renderer
                .render(&self.scene, camera)
                .map_err(TickError::Render)?;
        }

        self.loops.run(timestamp)?;

        if let Some(overlay) = self.overlay.as_mut() {
            overlay.end();
        }
        Ok(TickOutcome::Ran(frame))
    }

    /// Match camera aspect and renderer size to a new viewport.
    ///
    /// The renderer receives the viewport multiplied by `render_scale`, rounded
    /// to whole pixels.
    pub fn set_size(&mut self, width: f64, height: f64) -> Result<(), WorldError> {
        let camera = self.camera.as_mut().ok_or(WorldError::MissingCamera)?;
        let renderer = self.renderer.as_mut().ok_or(WorldError::MissingRenderer)?;

        camera.set_aspect((width / height) as f32);
        camera.update_projection_matrix();

        let scale = &self.config.render_scale;
        let size = PixelSize::scaled(width, height, scale.width, scale.height);
        renderer.set_size(size.width, size.height);
        tracing::debug!(width, height, %size, "resized");
        Ok(())
    }

    /// Apply a host viewport change when `auto_resize` is enabled.
    /// Returns whether the resize was applied.
    pub fn handle_viewport_resize(&mut self, width: f64, height: f64) -> Result<bool, WorldError> {
        if !self.config.auto_resize {
            return Ok(false);
        }
        self.set_size(width, height)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{OrthographicCamera, PerspectiveCamera};
    use crate::clock::ManualClock;
    use crate::scheduler::{FrameRequests, QueuedFramePort, TimerDriver};
    use crate::testing::*;
    use glam::Vec3;
    use stagecraft_common::Transform;
    use stagecraft_config::{Diagnostics, Extent, Options};

    struct Harness {
        world: World,
        journal: Journal,
        requests: FrameRequests,
        clock: ManualClock,
    }

    fn config() -> Config {
        Config::defaults(Extent::new(800.0, 600.0))
    }

    fn harness(config: Config) -> Harness {
        let journal = journal();
        let clock = ManualClock::new();
        let (port, requests) = QueuedFramePort::new();
        let world = World::builder(config)
            .physics(RecordingPhysics::new(&journal))
            .renderer(RecordingRenderer::new(&journal))
            .frame_port(port)
            .time_source(Rc::new(clock.clone()))
            .build();
        journal.borrow_mut().clear();
        Harness {
            world,
            journal,
            requests,
            clock,
        }
    }

    fn entries(journal: &Journal) -> Vec<String> {
        journal.borrow().clone()
    }

    #[test]
    fn tick_runs_steps_in_order() {
        let mut h = harness(config());
        h.world.overlay = Some(Box::new(RecordingOverlay::new(&h.journal)));
        h.world.add(SceneNode::morph(
            "flag",
            Transform::default(),
            Box::new(RecordingMixer(h.journal.clone())),
        ));
        h.world.set_controls(RecordingControls(h.journal.clone()));
        let log = h.journal.clone();
        h.world.loops().register("after", move |_, _| {
            record(&log, "loop.after");
            Ok(())
        });

        h.world.start().unwrap();
        h.clock.advance_ms(16);
        h.world.frame(16.0).unwrap();

        assert_eq!(
            entries(&h.journal),
            vec![
                "overlay.begin",
                "mixer.update",
                "physics.simulate",
                "controls.update 16",
                "renderer.render",
                "loop.after",
                "overlay.end",
            ]
        );
    }

    #[test]
    fn composer_replaces_plain_render() {
        let mut h = harness(config());
        h.world.set_composer(RecordingComposer(h.journal.clone()));
        h.world.set_simulate(false);
        h.world.start().unwrap();
        h.world.frame(0.0).unwrap();

        assert_eq!(
            entries(&h.journal),
            vec![
                "composer.reset",
                "composer.render",
                "composer.pass",
                "composer.to_screen"
            ]
        );
    }

    #[test]
    fn composer_skips_scene_render_when_rendering_disabled() {
        let mut h = harness(config());
        h.world.set_composer(RecordingComposer(h.journal.clone()));
        h.world.set_simulate(false);
        h.world.set_render(false);
        h.world.start().unwrap();
        h.world.frame(0.0).unwrap();

        assert_eq!(
            entries(&h.journal),
            vec!["composer.reset", "composer.pass", "composer.to_screen"]
        );
    }

    #[test]
    fn disabled_flags_skip_physics_and_render() {
        let mut h = harness(config());
        h.world.set_simulate(false);
        h.world.set_render(false);
        h.world.start().unwrap();
        h.world.frame(0.0).unwrap();
        assert!(entries(&h.journal).is_empty());
        assert!(!h.world.is_simulating());
        assert!(!h.world.is_rendering());
    }

    #[test]
    fn loops_fire_once_each_in_registration_order() {
        let mut h = harness(config());
        for name in ["A", "B"] {
            let log = h.journal.clone();
            h.world.loops().register(name, move |_, _| {
                record(&log, name);
                Ok(())
            });
        }
        h.world.start().unwrap();
        h.world.frame(0.0).unwrap();

        let loops: Vec<String> = entries(&h.journal)
            .into_iter()
            .filter(|e| e == "A" || e == "B")
            .collect();
        assert_eq!(loops, vec!["A", "B"]);
    }

    #[test]
    fn re_enabled_loop_fires_from_next_tick() {
        let mut h = harness(config());
        let log = h.journal.clone();
        let handle = h.world.loops().register("spin", move |_, _| {
            record(&log, "spin");
            Ok(())
        });
        h.world.set_simulate(false);
        h.world.set_render(false);
        h.world.start().unwrap();

        handle.disable();
        h.world.frame(0.0).unwrap();
        assert!(entries(&h.journal).is_empty());

        handle.enable();
        h.world.frame(16.0).unwrap();
        assert_eq!(entries(&h.journal), vec!["spin"]);
    }

    #[test]
    fn only_direct_morph_children_animate() {
        let mut h = harness(config());
        h.world.add(SceneNode::morph(
            "child",
            Transform::default(),
            Box::new(RecordingMixer(h.journal.clone())),
        ));
        h.world.scene_mut().add(SceneNode::morph(
            "detached",
            Transform::default(),
            Box::new(RecordingMixer(h.journal.clone())),
        ));
        h.world.set_simulate(false);
        h.world.set_render(false);
        h.world.start().unwrap();
        h.world.frame(0.0).unwrap();

        assert_eq!(entries(&h.journal), vec!["mixer.update"]);
    }

    #[test]
    fn start_twice_is_rejected_with_one_pending_request() {
        let mut h = harness(config());
        assert_eq!(h.world.state(), SchedulerState::Idle);
        h.world.start().unwrap();
        assert_eq!(h.world.start(), Err(StartError::AlreadyRunning));
        assert_eq!(h.requests.pending(), 1);
        assert_eq!(h.world.state(), SchedulerState::Running);
    }

    #[test]
    fn start_requires_renderer_and_camera() {
        let mut world = World::builder(config())
            .time_source(Rc::new(ManualClock::new()))
            .build();
        assert_eq!(world.start(), Err(StartError::MissingRenderer));

        world.camera = None;
        assert_eq!(world.start(), Err(StartError::MissingCamera));
        assert_eq!(world.state(), SchedulerState::Idle);
    }

    #[test]
    fn each_tick_requests_the_next_frame() {
        let mut h = harness(config());
        h.world.start().unwrap();
        assert!(h.requests.take());
        h.world.frame(0.0).unwrap();
        assert_eq!(h.requests.pending(), 1);
        assert_eq!(h.world.frames(), 1);
    }

    #[test]
    fn stopped_world_halts_without_rescheduling() {
        let mut h = harness(config());
        assert_eq!(h.world.frame(0.0).unwrap(), TickOutcome::Halted);

        h.world.start().unwrap();
        h.world.stop();
        h.requests.clear();
        assert_eq!(h.world.frame(0.0).unwrap(), TickOutcome::Halted);
        assert_eq!(h.requests.pending(), 0);
        assert_eq!(h.world.state(), SchedulerState::Stopped);

        h.world.start().unwrap();
        assert!(matches!(h.world.frame(0.0), Ok(TickOutcome::Ran(_))));
    }

    #[test]
    fn failing_loop_aborts_tick_after_requesting_next_frame() {
        let mut h = harness(config());
        h.world.overlay = Some(Box::new(RecordingOverlay::new(&h.journal)));
        h.world.loops().register("broken", |_, _| Err("bad state".into()));
        h.world.start().unwrap();
        h.requests.clear();

        let err = h.world.frame(0.0).unwrap_err();
        assert!(matches!(err, TickError::Loop { ref name, .. } if name == "broken"));
        assert_eq!(h.requests.pending(), 1);
        assert!(!entries(&h.journal).contains(&"overlay.end".to_string()));
    }

    #[test]
    fn physics_failure_skips_render() {
        let journal = journal();
        let mut physics = RecordingPhysics::new(&journal);
        physics.fail = true;
        let (port, _requests) = QueuedFramePort::new();
        let mut world = World::builder(config())
            .physics(physics)
            .renderer(RecordingRenderer::new(&journal))
            .frame_port(port)
            .time_source(Rc::new(ManualClock::new()))
            .build();
        journal.borrow_mut().clear();

        world.start().unwrap();
        assert!(matches!(world.frame(0.0), Err(TickError::Physics(_))));
        assert_eq!(entries(&journal), vec!["physics.simulate"]);
    }

    #[test]
    fn render_failure_is_reported() {
        let journal = journal();
        let mut renderer = RecordingRenderer::new(&journal);
        renderer.fail = true;
        let mut world = World::builder(config())
            .renderer(renderer)
            .time_source(Rc::new(ManualClock::new()))
            .build();
        assert!(
            world
                .warnings()
                .iter()
                .any(|w| matches!(w, BuildWarning::InitialRenderFailed(_)))
        );

        world.start().unwrap();
        assert!(matches!(world.frame(0.0), Err(TickError::Render(_))));
    }

    #[test]
    fn set_size_applies_render_scale() {
        let mut cfg = config();
        cfg.render_scale = Extent::new(0.5, 0.5);
        let mut h = harness(cfg);

        h.world.set_size(800.0, 600.0).unwrap();
        assert_eq!(
            h.world.renderer().unwrap().size(),
            PixelSize::new(400, 300)
        );
        let aspect = h.world.camera().unwrap().aspect();
        assert!((aspect - 800.0 / 600.0).abs() < 1e-6);

        let projection = h.world.camera().unwrap().projection_matrix();
        h.world.set_size(800.0, 600.0).unwrap();
        assert_eq!(h.world.camera().unwrap().projection_matrix(), projection);
        assert_eq!(
            h.world.renderer().unwrap().size(),
            PixelSize::new(400, 300)
        );
    }

    #[test]
    fn set_size_without_collaborators_errors() {
        let mut world = World::builder(config())
            .time_source(Rc::new(ManualClock::new()))
            .build();
        assert!(matches!(
            world.set_size(10.0, 10.0),
            Err(WorldError::MissingRenderer)
        ));
        world.camera = None;
        assert!(matches!(
            world.set_size(10.0, 10.0),
            Err(WorldError::MissingCamera)
        ));
    }

    #[test]
    fn viewport_resize_respects_auto_resize() {
        let mut h = harness(config());
        assert!(!h.world.handle_viewport_resize(1024.0, 768.0).unwrap());
        assert_eq!(
            h.world.renderer().unwrap().size(),
            PixelSize::new(800, 600)
        );

        let mut cfg = config();
        cfg.auto_resize = true;
        let mut h = harness(cfg);
        assert!(h.world.handle_viewport_resize(1024.0, 768.0).unwrap());
        assert_eq!(
            h.world.renderer().unwrap().size(),
            PixelSize::new(1024, 768)
        );
    }

    #[test]
    fn non_camera_assignment_keeps_previous_camera() {
        let mut h = harness(config());
        let before = h.world.camera().unwrap().projection_matrix();

        let result = h.world.try_set_camera(Box::new(String::from("mesh")));
        assert!(matches!(result, Err(WorldError::NotACamera)));
        assert_eq!(h.world.camera().unwrap().projection_matrix(), before);

        h.world.camera = None;
        assert!(h.world.try_set_camera(Box::new(7_i32)).is_err());
        assert!(h.world.camera().is_none());

        h.world
            .try_set_camera(Box::new(OrthographicCamera::new(10.0, 2.0, 0.1, 50.0)))
            .unwrap();
        assert_eq!(h.world.camera().unwrap().aspect(), 2.0);

        h.world.set_camera(PerspectiveCamera::new(50.0, 1.5, 0.1, 10.0));
        assert_eq!(h.world.camera().unwrap().aspect(), 1.5);
    }

    #[test]
    fn controls_receive_wall_clock_delta() {
        let mut h = harness(config());
        h.world.set_controls(RecordingControls(h.journal.clone()));
        h.world.set_simulate(false);
        h.world.set_render(false);
        h.clock.advance_ms(1000);
        h.world.start().unwrap();

        h.clock.advance_ms(20);
        h.world.frame(20.0).unwrap();
        h.clock.advance_ms(30);
        h.world.frame(50.0).unwrap();
        assert_eq!(
            entries(&h.journal),
            vec!["controls.update 20", "controls.update 30"]
        );
    }

    #[test]
    fn frame_reports_delta_in_seconds() {
        let mut h = harness(config());
        h.world.start().unwrap();
        h.clock.advance_ms(500);
        let TickOutcome::Ran(frame) = h.world.frame(500.0).unwrap() else {
            panic!("world should be running");
        };
        assert_eq!(frame.index, 0);
        assert_eq!(frame.timestamp, 500.0);
        assert!((frame.delta - 0.5).abs() < 1e-9);
    }

    #[test]
    fn add_and_remove_track_direct_children() {
        let mut h = harness(config());
        let camera_marker = h.world.children()[0];
        let id = h.world.add(SceneNode::mesh("crate", Transform::default()));
        assert_eq!(h.world.children(), &[camera_marker, id]);

        assert!(h.world.remove(id).is_some());
        assert_eq!(h.world.children(), &[camera_marker]);

        h.world.set_scene(Scene::empty());
        assert!(h.world.children().is_empty());
    }

    #[test]
    fn timer_driver_runs_until_limit() {
        let mut h = harness(config());
        let clock = h.clock.clone();
        let mut driver = TimerDriver::new(h.requests.clone())
            .with_limit(5)
            .with_pacer(move |interval| clock.advance(interval));
        h.world.start().unwrap();

        assert_eq!(driver.run(&mut h.world), 5);
        assert_eq!(h.world.frames(), 5);
        assert_eq!(h.requests.pending(), 1);
    }

    #[test]
    fn timer_driver_keeps_going_after_tick_errors() {
        let mut h = harness(config());
        h.world.loops().register("flaky", |_, _| Err("nope".into()));
        let clock = h.clock.clone();
        let mut driver = TimerDriver::new(h.requests.clone())
            .with_limit(3)
            .with_pacer(move |interval| clock.advance(interval));
        h.world.start().unwrap();
        assert_eq!(driver.run(&mut h.world), 3);
    }

    #[test]
    fn timer_driver_stops_when_world_halts() {
        let mut h = harness(config());
        let mut driver = TimerDriver::new(h.requests.clone()).with_pacer(|_| {});
        h.world.start().unwrap();
        h.world.stop();
        assert_eq!(driver.run(&mut h.world), 0);
    }

    #[test]
    fn unrecognized_diagnostics_fall_back_to_fps() {
        let mut cfg = config();
        cfg.diagnostics = Diagnostics::Unrecognized("bogus".into());
        let h = harness(cfg);
        assert_eq!(
            h.world.overlay().map(|o| o.mode()),
            Some(crate::diagnostics::OverlayMode::Fps)
        );
        assert!(
            h.world
                .warnings()
                .contains(&BuildWarning::UnrecognizedDiagnosticsMode("bogus".into()))
        );
    }

    #[test]
    fn gravity_and_viewport_reach_scene_and_renderer() {
        let mut cfg = Config::defaults(Extent::new(1024.0, 768.0));
        cfg.gravity = Vec3::new(0.0, -9.8, 0.0);
        let h = harness(cfg);
        assert_eq!(h.world.scene().gravity(), Vec3::new(0.0, -9.8, 0.0));
        assert_eq!(
            h.world.scene().physics().map(|p| p.gravity()),
            Some(Vec3::new(0.0, -9.8, 0.0))
        );
        assert_eq!(
            h.world.renderer().unwrap().size(),
            PixelSize::new(1024, 768)
        );
        assert!(h.world.is_simulating());
    }

    #[test]
    fn late_renderer_is_used_by_the_loop() {
        let journal = journal();
        let (port, _requests) = QueuedFramePort::new();
        let mut world = World::builder(config())
            .frame_port(port)
            .time_source(Rc::new(ManualClock::new()))
            .build();
        assert!(!world.is_rendering());

        world.set_renderer(RecordingRenderer::new(&journal));
        assert!(world.is_rendering());
        journal.borrow_mut().clear();

        world.start().unwrap();
        for frame in 0..3 {
            world.frame(frame as f64 * 16.0).unwrap();
        }
        let renders = entries(&journal)
            .iter()
            .filter(|e| *e == "renderer.render")
            .count();
        assert_eq!(renders, 3);
    }

    #[test]
    fn yaml_options_flow_into_built_world() {
        let options = Options::from_yaml_str("gravity:\n  y: -9.8\nauto_resize: false\n").unwrap();
        let cfg = options.resolve(Extent::new(800.0, 600.0));
        let journal = journal();
        let mut world = World::builder(cfg)
            .physics(RecordingPhysics::new(&journal))
            .renderer(RecordingRenderer::new(&journal))
            .time_source(Rc::new(ManualClock::new()))
            .build();

        assert_eq!(world.scene().gravity(), Vec3::new(0.0, -9.8, 0.0));
        assert_eq!(
            world.scene().physics().map(|p| p.gravity()),
            Some(Vec3::new(0.0, -9.8, 0.0))
        );
        assert_eq!(world.renderer().unwrap().size(), PixelSize::new(800, 600));
        assert!(!world.handle_viewport_resize(1024.0, 768.0).unwrap());
        assert_eq!(world.renderer().unwrap().size(), PixelSize::new(800, 600));
    }
}
