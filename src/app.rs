use std::sync::Arc;

use chrono::{DateTime, Local};
use glam::Vec2;
use instant::Instant;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId, WindowLevel};

use crate::bubble::{self, Mood};
use crate::chat::worker::ChatWorker;
use crate::chat::ChatContext;
use crate::companion::Companion;
use crate::config::PetKind;
use crate::input::{ButtonEdge, Pointer, PointerEvent, Steering};
use crate::pet::Screen;
#[cfg(windows)]
use crate::platform;
use crate::props::PropView;
use crate::render::instance::{self, SpriteInstance};
use crate::render::GpuState;
use crate::store;
use crate::tray::{MenuState, TrayCommand, TrayIcon};
use crate::ui::{Overlay, UiCommand, UiView};

/// Target simulation tick rate (seconds per tick).
const TICK_RATE: f64 = 1.0 / 60.0;
/// Max accumulated time before we clamp (prevents spiral of death).
const MAX_ACCUMULATOR: f64 = 0.25;
/// How often to log FPS (seconds).
const FPS_LOG_INTERVAL: f64 = 30.0;
/// Screen assumed until the window exists.
const FALLBACK_SCREEN: Screen = Screen { w: 1920.0, h: 1080.0 };
const THINKING_MS: u32 = 30_000;

// ---------------------------------------------------------------------------
// Frame timing
// ---------------------------------------------------------------------------

struct FrameStats {
    frame_count: u64,
    last_log_time: Instant,
    frame_time_sum: f64,
    frame_time_max: f64,
    frames_since_log: u32,
}

impl FrameStats {
    fn new() -> Self {
        Self {
            frame_count: 0,
            last_log_time: Instant::now(),
            frame_time_sum: 0.0,
            frame_time_max: 0.0,
            frames_since_log: 0,
        }
    }

    fn record_frame(&mut self, dt: f64) {
        self.frame_count += 1;
        self.frames_since_log += 1;
        self.frame_time_sum += dt;
        self.frame_time_max = self.frame_time_max.max(dt);

        let elapsed = self.last_log_time.elapsed().as_secs_f64();
        if elapsed >= FPS_LOG_INTERVAL {
            let avg_ms = (self.frame_time_sum / self.frames_since_log as f64) * 1000.0;
            let fps = self.frames_since_log as f64 / elapsed;
            log::debug!(
                "FPS: {:.0} | avg: {:.2}ms | max: {:.2}ms | total frames: {}",
                fps,
                avg_ms,
                self.frame_time_max * 1000.0,
                self.frame_count,
            );
            self.last_log_time = Instant::now();
            self.frame_time_sum = 0.0;
            self.frame_time_max = 0.0;
            self.frames_since_log = 0;
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Top-level application state.
struct App {
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    overlay: Option<Overlay>,
    tray: Option<TrayIcon>,

    companion: Companion,
    chat: Option<ChatWorker>,

    // Input
    pointer: Pointer,
    steering: Steering,
    jump_key: ButtonEdge,
    slide_key: ButtonEdge,
    /// Cursor and left button from winit, where global polling is unavailable.
    cursor: Vec2,
    left_down: bool,

    // Window mode
    visible: bool,
    hittest: bool,
    focusable: bool,

    // Fixed timestep
    last_frame_time: Option<Instant>,
    accumulator: f64,
    tick_count: u64,

    // Frame timing
    frame_stats: FrameStats,

    // Screen dimensions
    screen_w: u32,
    screen_h: u32,

    // Reusable buffers (avoid per-frame allocation)
    instance_buf: Vec<SpriteInstance>,
    prop_views: Vec<PropView>,
}

impl App {
    fn new(companion: Companion, chat: Option<ChatWorker>) -> Self {
        Self {
            window: None,
            gpu: None,
            overlay: None,
            tray: None,
            companion,
            chat,
            pointer: Pointer::new(),
            steering: Steering::default(),
            jump_key: ButtonEdge::default(),
            slide_key: ButtonEdge::default(),
            cursor: Vec2::ZERO,
            left_down: false,
            visible: true,
            hittest: false,
            focusable: false,
            last_frame_time: None,
            accumulator: 0.0,
            tick_count: 0,
            frame_stats: FrameStats::new(),
            screen_w: 0,
            screen_h: 0,
            instance_buf: Vec::with_capacity(32),
            prop_views: Vec::with_capacity(32),
        }
    }

    /// Run fixed-timestep simulation ticks.
    fn run_fixed_update(&mut self, dt: f64) {
        self.accumulator += dt;

        if self.accumulator > MAX_ACCUMULATOR {
            self.accumulator = MAX_ACCUMULATOR;
        }

        while self.accumulator >= TICK_RATE {
            self.companion.sim.tick(TICK_RATE as f32);
            self.accumulator -= TICK_RATE;
            self.tick_count += 1;
        }
    }

    /// Interpolation alpha for rendering between ticks.
    fn interpolation_alpha(&self) -> f32 {
        (self.accumulator / TICK_RATE) as f32
    }

    fn menu_state(&self) -> MenuState {
        MenuState {
            visible: self.visible,
            quiet: self.companion.sim.pet.quiet,
            dog: self.companion.settings().pet_kind == PetKind::Dog,
        }
    }

    fn set_visible(&mut self, visible: bool) {
        if self.visible == visible {
            return;
        }
        self.visible = visible;
        if visible {
            self.companion.sim.on_shown();
        }
        log::info!("Pet {}", if visible { "shown" } else { "hidden" });
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// Current cursor position in screen pixels and left button state.
    fn sample_pointer(&self) -> (Vec2, bool) {
        #[cfg(windows)]
        {
            let (x, y) = platform::win32::get_mouse_pos();
            (Vec2::new(x, y), platform::win32::is_left_button_down())
        }
        #[cfg(not(windows))]
        {
            (self.cursor, self.left_down)
        }
    }

    fn poll_pointer(&mut self) {
        let (pos, down) = self.sample_pointer();
        let over_panel = self.overlay.as_ref().is_some_and(|o| o.is_over_panel(pos));
        let blocked = over_panel || !self.visible;

        let sim = &mut self.companion.sim;
        match self.pointer.update(pos, down, blocked) {
            Some(PointerEvent::Down(p)) => {
                if let Some(grab) = sim.pointer_down(p) {
                    log::debug!("Grabbed {grab:?}");
                }
            }
            Some(PointerEvent::Move(p)) => sim.pointer_move(p),
            Some(PointerEvent::Up(p)) => sim.pointer_up(p),
            None => {}
        }
    }

    /// Steering from the remote's pad and, while no text field has focus,
    /// the arrow keys, Space (jump) and Shift (slide).
    fn poll_remote(&mut self) {
        let Some(overlay) = &self.overlay else {
            return;
        };
        if !overlay.is_remote_open() {
            return;
        }
        let pad = overlay.remote_dir();

        // Arrow keys win over the on-screen pad
        #[cfg(windows)]
        let dir = if overlay.wants_keyboard() {
            pad
        } else {
            use crate::input::direction;
            use platform::win32::{is_key_down, VK_DOWN, VK_LEFT, VK_RIGHT, VK_SHIFT, VK_SPACE, VK_UP};
            if self.jump_key.pressed(is_key_down(VK_SPACE)) {
                self.companion.sim.manual_jump();
            }
            if self.slide_key.pressed(is_key_down(VK_SHIFT)) {
                self.companion.sim.manual_slide();
            }
            let keys = direction(
                is_key_down(VK_LEFT),
                is_key_down(VK_RIGHT),
                is_key_down(VK_UP),
                is_key_down(VK_DOWN),
            );
            if keys != Vec2::ZERO {
                keys
            } else {
                pad
            }
        };
        #[cfg(not(windows))]
        let dir = pad;

        if let Some(d) = self.steering.update(dir) {
            if d == Vec2::ZERO {
                self.companion.sim.manual_stop();
            } else {
                let unit = d.normalize_or_zero();
                self.companion.sim.manual_move(unit.x, unit.y);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Returns false when the app should quit.
    fn handle_tray(&mut self) -> bool {
        let Some(tray) = &mut self.tray else {
            return true;
        };
        let command = tray.poll();
        if command == TrayCommand::None {
            return true;
        }
        log::debug!("Tray command {command:?}");

        match command {
            TrayCommand::None => {}
            TrayCommand::ToggleVisible => self.set_visible(!self.visible),
            TrayCommand::Remote => {
                self.set_visible(true);
                self.companion.sim.open_remote();
                if let Some(o) = &mut self.overlay {
                    o.open_remote();
                }
            }
            TrayCommand::Chat => {
                self.set_visible(true);
                if let Some(o) = &mut self.overlay {
                    o.open_chat();
                }
            }
            TrayCommand::AddFood => self.companion.sim.add_food(),
            TrayCommand::ClearFood => self.companion.sim.clear_food(),
            TrayCommand::AddWaste => self.companion.sim.add_waste(),
            TrayCommand::CleanWaste => self.companion.sim.clean_waste(),
            TrayCommand::Revive => self.companion.sim.revive(),
            TrayCommand::SetKind(kind) => self.companion.set_pet_kind(kind),
            TrayCommand::ToggleQuiet => self.companion.sim.toggle_quiet(),
            TrayCommand::Settings => {
                if let Some(o) = &mut self.overlay {
                    o.open_settings(self.companion.settings());
                }
            }
            TrayCommand::Notes => self.companion.show_notes(),
            TrayCommand::Quit => return false,
        }

        let state = self.menu_state();
        if let Some(tray) = &self.tray {
            tray.set_state(state);
        }
        true
    }

    fn handle_ui_commands(&mut self, now: DateTime<Local>) {
        let Some(overlay) = &mut self.overlay else {
            return;
        };
        let commands: Vec<UiCommand> = overlay.drain_commands().collect();

        for command in commands {
            match command {
                UiCommand::SendChat(text) => self.send_chat(&text, now),
                UiCommand::RemoteStop => self.companion.sim.manual_stop(),
                UiCommand::RemoteJump => self.companion.sim.manual_jump(),
                UiCommand::RemoteSlide => self.companion.sim.manual_slide(),
                UiCommand::RemoteClosed => {
                    self.steering.reset();
                    self.companion.sim.close_remote();
                }
                UiCommand::SaveSettings(settings) => {
                    if self.companion.save_settings(settings) {
                        if let Some(chat) = &self.chat {
                            chat.reconfigure(self.companion.settings());
                        }
                        let state = self.menu_state();
                        if let Some(tray) = &self.tray {
                            tray.set_state(state);
                        }
                    }
                }
            }
        }
    }

    fn send_chat(&mut self, text: &str, now: DateTime<Local>) {
        if let Some(o) = &mut self.overlay {
            o.push_history(true, text);
        }
        let Some(chat) = &mut self.chat else {
            self.companion.say("I can't talk right now...", Mood::Alert, 3000);
            return;
        };
        let ctx = ChatContext::from_settings(self.companion.settings(), now);
        chat.send(text, ctx);
        self.companion.say("Hmm...", Mood::Normal, THINKING_MS);
    }

    fn poll_chat(&mut self, now: DateTime<Local>) {
        let Some(chat) = &mut self.chat else {
            return;
        };
        while let Some(reply) = chat.try_recv() {
            if !reply.text.is_empty() {
                if let Some(o) = &mut self.overlay {
                    o.push_history(false, &reply.text);
                }
            }
            self.companion.apply_reply(reply, now);
        }
    }

    // -----------------------------------------------------------------------
    // Frame
    // -----------------------------------------------------------------------

    /// Build instance buffer from the sim for rendering.
    fn build_instances(&mut self) {
        self.instance_buf.clear();
        if !self.visible {
            return;
        }
        let alpha = self.interpolation_alpha();
        let sim = &self.companion.sim;

        sim.props.views(&mut self.prop_views);
        let pet = SpriteInstance::pet(&sim.pet, sim.settings.pet_kind, alpha);
        instance::frame_instances(&mut self.instance_buf, &self.prop_views, pet);
    }

    fn render(&mut self, dt: f32) {
        let (Some(window), Some(gpu), Some(overlay)) =
            (&self.window, &mut self.gpu, &mut self.overlay)
        else {
            return;
        };

        gpu.update_instances(&self.instance_buf);
        let Some(mut frame) = gpu.begin_frame() else {
            return;
        };
        gpu.draw_sprites(&mut frame.encoder, &frame.view);

        let pet_pos = self.companion.sim.pet.pos;
        let bubble = self
            .companion
            .bubble
            .current()
            .filter(|_| self.visible)
            .map(|m| {
                let anchor = bubble::anchor(pet_pos, self.screen_w as f32);
                (m.text.as_str(), m.mood, anchor)
            });
        let settings = self.companion.settings();
        let view = UiView {
            bubble,
            pet_pos,
            pet_name: &settings.pet_name,
            user_name: &settings.user_name,
        };

        let (primitives, textures_delta, screen_descriptor) =
            overlay.run_frame(window, self.screen_w, self.screen_h, &view, dt);
        let egui_cmds = overlay.prepare_egui(
            &gpu.device,
            &gpu.queue,
            &mut frame.encoder,
            &primitives,
            &textures_delta,
            &screen_descriptor,
        );
        {
            let mut pass = GpuState::begin_egui_pass(&mut frame.encoder, &frame.view);
            overlay.render_egui(&mut pass, &primitives, &screen_descriptor);
        }

        gpu.finish_frame(frame.encoder, frame.output, egui_cmds);
        overlay.free_textures(&textures_delta);
    }

    /// Take clicks only over the pet, a prop or a panel, and take keyboard
    /// focus only while a text field is open.
    #[cfg(windows)]
    fn update_window_mode(&mut self) {
        let (Some(window), Some(overlay)) = (&self.window, &self.overlay) else {
            return;
        };
        let pos = self.pointer.pos();
        let sim = &self.companion.sim;
        let over_world = self.visible
            && (sim.grab().is_some()
                || sim.pet.contains(pos)
                || sim.props.hit_test(pos).is_some());
        let hit = over_world || overlay.is_over_panel(pos);
        if hit != self.hittest {
            if let Err(e) = window.set_cursor_hittest(hit) {
                log::warn!("set_cursor_hittest failed: {e}");
            }
            self.hittest = hit;
        }

        let focusable = overlay.wants_keyboard();
        if focusable != self.focusable {
            platform::win32::set_focusable(window, focusable);
            self.focusable = focusable;
        }
    }

    #[cfg(not(windows))]
    fn update_window_mode(&mut self) {}

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        // --- Timing ---
        let now = Instant::now();
        let mut dt = 0.0;
        if let Some(last) = self.last_frame_time {
            dt = now.duration_since(last).as_secs_f64();
            self.frame_stats.record_frame(dt);
        }
        self.last_frame_time = Some(now);

        if !self.handle_tray() {
            log::info!("Quit from tray");
            event_loop.exit();
            return;
        }

        // --- Input ---
        self.poll_pointer();
        self.poll_remote();

        // --- Fixed timestep sim ---
        self.run_fixed_update(dt);

        // --- Events, chat replies and the bubble ---
        let wall = Local::now();
        if self.companion.pump_events(wall) > 0 {
            self.set_visible(true);
        }
        self.poll_chat(wall);
        self.companion.bubble.update(dt as f32);

        // --- Render ---
        self.build_instances();
        self.render(dt as f32);
        self.handle_ui_commands(wall);
        self.update_window_mode();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        // Create fullscreen-sized borderless transparent window
        let Some(monitor) = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
        else {
            log::error!("No monitor found");
            event_loop.exit();
            return;
        };
        let screen_size = monitor.size();

        // No with_transparent(true) - that sets WS_EX_LAYERED which creates
        // a GDI backing surface that conflicts with DirectComposition.
        // Transparency comes from wgpu's DxgiFromVisual + PreMultiplied alpha.
        // Start hidden so DWM doesn't cache stale frame state before our
        // overlay style changes take effect.
        let attrs = WindowAttributes::default()
            .with_title("deskpet")
            .with_decorations(false)
            .with_visible(false)
            .with_window_level(WindowLevel::AlwaysOnTop)
            .with_inner_size(screen_size)
            .with_position(winit::dpi::PhysicalPosition::new(0, 0));

        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        #[cfg(windows)]
        platform::win32::setup_overlay(&window);

        let size = window.inner_size();
        self.screen_w = size.width;
        self.screen_h = size.height;

        log::info!(
            "Overlay window created: {}x{} on {:?}",
            size.width,
            size.height,
            monitor.name().unwrap_or_default()
        );

        // Initialize wgpu + pipeline
        let gpu = match GpuState::new(window.clone()) {
            Ok(gpu) => gpu,
            Err(e) => {
                log::error!("GPU init failed: {e}");
                event_loop.exit();
                return;
            }
        };
        log::info!("wgpu + sprite pipeline initialized");

        self.overlay = Some(Overlay::new(&window, &gpu));
        self.gpu = Some(gpu);

        self.tray = TrayIcon::new("deskpet");
        let state = self.menu_state();
        if let Some(tray) = &self.tray {
            tray.set_state(state);
        }

        self.companion
            .sim
            .resize(Screen::new(size.width as f32, size.height as f32));
        self.companion.start();

        // Continuous game loop
        event_loop.set_control_flow(ControlFlow::Poll);

        // Show window now that all styles and GPU resources are ready.
        // This prevents DWM from caching stale frame state (the "white box").
        window.set_visible(true);

        self.window = Some(window);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(w) = &self.window {
            w.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(window), Some(overlay)) = (&self.window, &mut self.overlay) {
            overlay.on_window_event(window, &event);
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                    self.screen_w = new_size.width;
                    self.screen_h = new_size.height;
                    self.companion.sim.resize(Screen::new(
                        new_size.width as f32,
                        new_size.height as f32,
                    ));
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == winit::event::MouseButton::Left {
                    self.left_down = state.is_pressed();
                }
            }
            WindowEvent::RedrawRequested => self.frame(event_loop),
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        log::info!("Shutting down after {} ticks", self.tick_count);
    }
}

/// Entry point - load state, create event loop and run.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let dir = store::data_dir();
    log::info!("Data directory: {}", dir.display());

    let companion = Companion::open(&dir, FALLBACK_SCREEN, fastrand::Rng::new());
    let chat = match ChatWorker::spawn(companion.settings()) {
        Ok(worker) => Some(worker),
        Err(e) => {
            log::error!("Failed to start chat worker: {e}");
            None
        }
    };

    let event_loop = EventLoop::new()?;
    let mut app = App::new(companion, chat);
    event_loop.run_app(&mut app)?;
    Ok(())
}
