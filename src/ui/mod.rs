pub mod ring;

use glam::Vec2;
use winit::window::Window;

use self::ring::RingBuffer;
use crate::bubble::{Mood, BUBBLE_W};
use crate::config::{PetKind, Personality, Settings};
use crate::input;
use crate::pet::SPRITE_SIZE;
use crate::render::GpuState;

/// Chat lines kept for the chat box.
const HISTORY_LEN: usize = 20;
/// Chat lines shown above the input.
const HISTORY_SHOWN: usize = 6;
/// The chat box hides after this long without typing.
const CHAT_AUTO_HIDE: f32 = 5.0;
/// Delay before the chat box hides after sending.
const CHAT_CLOSE_AFTER_SEND: f32 = 0.5;
const CHAT_W: f32 = 300.0;

/// Something the user did in a panel, for the app to carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    SendChat(String),
    RemoteStop,
    RemoteJump,
    RemoteSlide,
    RemoteClosed,
    SaveSettings(Settings),
}

/// Per-frame inputs for drawing.
pub struct UiView<'a> {
    /// Bubble text, mood and top-left in screen pixels.
    pub bubble: Option<(&'a str, Mood, Vec2)>,
    /// Pet top-left in screen pixels.
    pub pet_pos: Vec2,
    pub pet_name: &'a str,
    pub user_name: &'a str,
}

#[derive(Debug, Clone)]
struct ChatLine {
    from_user: bool,
    text: String,
}

/// Panel state, kept apart from the egui plumbing so the draw closure can
/// borrow it mutably.
struct Panels {
    chat_open: bool,
    chat_text: String,
    chat_focus_pending: bool,
    chat_idle: f32,
    chat_close_in: Option<f32>,
    history: RingBuffer<ChatLine>,

    remote_open: bool,
    remote_dir: Vec2,

    settings_draft: Option<Settings>,

    commands: Vec<UiCommand>,
    /// Screen rects (points) of the interactive panels drawn last frame.
    rects: Vec<egui::Rect>,
}

/// egui overlay: speech bubble, chat box, remote control and settings.
pub struct Overlay {
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    panels: Panels,
}

impl Overlay {
    pub fn new(window: &Window, gpu: &GpuState) -> Self {
        let egui_ctx = egui::Context::default();

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            Some(gpu.device.limits().max_texture_dimension_2d as usize),
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.surface_config.format,
            egui_wgpu::RendererOptions {
                depth_stencil_format: None,
                msaa_samples: 1,
                dithering: true,
                predictable_texture_filtering: false,
            },
        );

        Self {
            egui_ctx,
            egui_state,
            egui_renderer,
            panels: Panels {
                chat_open: false,
                chat_text: String::new(),
                chat_focus_pending: false,
                chat_idle: 0.0,
                chat_close_in: None,
                history: RingBuffer::new(HISTORY_LEN),
                remote_open: false,
                remote_dir: Vec2::ZERO,
                settings_draft: None,
                commands: Vec::new(),
                rects: Vec::new(),
            },
        }
    }

    pub fn open_chat(&mut self) {
        let p = &mut self.panels;
        p.chat_open = true;
        p.chat_focus_pending = true;
        p.chat_idle = 0.0;
        p.chat_close_in = None;
    }

    pub fn open_remote(&mut self) {
        self.panels.remote_open = true;
    }

    pub fn is_remote_open(&self) -> bool {
        self.panels.remote_open
    }

    pub fn open_settings(&mut self, current: &Settings) {
        self.panels.settings_draft = Some(current.clone());
    }

    pub fn push_history(&mut self, from_user: bool, text: &str) {
        self.panels.history.push(ChatLine {
            from_user,
            text: text.to_string(),
        });
    }

    /// A text field may be showing and the window should accept focus.
    pub fn wants_keyboard(&self) -> bool {
        self.panels.chat_open || self.panels.settings_draft.is_some()
    }

    /// Direction held on the remote's pad.
    pub fn remote_dir(&self) -> Vec2 {
        self.panels.remote_dir
    }

    /// Whether screen pixel `pos` is over an interactive panel.
    pub fn is_over_panel(&self, pos: Vec2) -> bool {
        let ppp = self.egui_ctx.pixels_per_point();
        let p = egui::pos2(pos.x / ppp, pos.y / ppp);
        self.panels.rects.iter().any(|r| r.contains(p))
    }

    pub fn drain_commands(&mut self) -> std::vec::Drain<'_, UiCommand> {
        self.panels.commands.drain(..)
    }

    /// Forward a winit event to egui. Returns true if egui consumed it.
    pub fn on_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_state.on_window_event(window, event);
        response.consumed
    }

    /// Run the egui frame and produce paint output.
    /// Returns (clipped_primitives, textures_delta, screen_descriptor).
    pub fn run_frame(
        &mut self,
        window: &Window,
        screen_w: u32,
        screen_h: u32,
        view: &UiView<'_>,
        dt: f32,
    ) -> (
        Vec<egui::epaint::ClippedPrimitive>,
        egui::TexturesDelta,
        egui_wgpu::ScreenDescriptor,
    ) {
        let raw_input = self.egui_state.take_egui_input(window);

        let panels = &mut self.panels;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            panels.rects.clear();
            draw_bubble(ctx, view);
            panels.draw_chat(ctx, view, dt);
            panels.draw_remote(ctx);
            panels.draw_settings(ctx);
        });

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let pixels_per_point = full_output.pixels_per_point;
        let clipped_primitives = self.egui_ctx.tessellate(full_output.shapes, pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [screen_w, screen_h],
            pixels_per_point,
        };

        (clipped_primitives, full_output.textures_delta, screen_descriptor)
    }

    /// Upload egui textures and buffers. Call before the egui render pass.
    pub fn prepare_egui(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::epaint::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) -> Vec<wgpu::CommandBuffer> {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor)
    }

    /// Render egui into the given render pass.
    pub fn render_egui(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::epaint::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    /// Free textures after present.
    pub fn free_textures(&mut self, textures_delta: &egui::TexturesDelta) {
        for &id in &textures_delta.free {
            self.egui_renderer.free_texture(&id);
        }
    }
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

/// Fill and border for a bubble mood.
fn mood_colors(mood: Mood) -> (egui::Color32, egui::Color32) {
    match mood {
        Mood::Normal => (
            egui::Color32::from_rgb(250, 250, 250),
            egui::Color32::from_rgb(190, 190, 190),
        ),
        Mood::Love => (
            egui::Color32::from_rgb(255, 228, 236),
            egui::Color32::from_rgb(255, 105, 150),
        ),
        Mood::Alert => (
            egui::Color32::from_rgb(255, 236, 210),
            egui::Color32::from_rgb(230, 120, 40),
        ),
        Mood::Info => (
            egui::Color32::from_rgb(225, 240, 255),
            egui::Color32::from_rgb(70, 150, 230),
        ),
    }
}

fn panel_frame() -> egui::Frame {
    egui::Frame::NONE
        .fill(egui::Color32::from_rgba_unmultiplied(26, 26, 46, 235))
        .stroke(egui::Stroke::new(2.0, egui::Color32::from_rgb(0, 212, 255)))
        .corner_radius(12.0)
        .inner_margin(10.0)
}

fn to_points(ctx: &egui::Context, px: Vec2) -> egui::Pos2 {
    let ppp = ctx.pixels_per_point();
    egui::pos2(px.x / ppp, px.y / ppp)
}

fn draw_bubble(ctx: &egui::Context, view: &UiView<'_>) {
    let Some((text, mood, anchor)) = view.bubble else {
        return;
    };
    let (fill, border) = mood_colors(mood);
    let frame = egui::Frame::NONE
        .fill(fill)
        .stroke(egui::Stroke::new(2.0, border))
        .corner_radius(15.0)
        .inner_margin(10.0);

    egui::Area::new(egui::Id::new("speech_bubble"))
        .fixed_pos(to_points(ctx, anchor))
        .interactable(false)
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            frame.show(ui, |ui| {
                ui.set_max_width(BUBBLE_W - 20.0);
                ui.label(
                    egui::RichText::new(text)
                        .color(egui::Color32::from_rgb(30, 30, 30))
                        .size(13.0),
                );
            });
        });
}

impl Panels {
    fn draw_chat(&mut self, ctx: &egui::Context, view: &UiView<'_>, dt: f32) {
        if !self.chat_open {
            return;
        }

        if let Some(left) = self.chat_close_in.as_mut() {
            *left -= dt;
            if *left <= 0.0 {
                self.close_chat();
                return;
            }
        }

        let screen = ctx.content_rect();
        let below = to_points(ctx, view.pet_pos + Vec2::new(0.0, SPRITE_SIZE + 10.0));
        let pos = egui::pos2(
            below.x.clamp(10.0, (screen.right() - CHAT_W - 10.0).max(10.0)),
            below.y.min(screen.bottom() - 200.0).max(10.0),
        );

        let mut send = false;
        let mut escape = false;
        let mut input_focused = false;

        let shown = egui::Window::new("chat")
            .title_bar(false)
            .fixed_pos(pos)
            .resizable(false)
            .frame(panel_frame())
            .show(ctx, |ui| {
                ui.set_width(CHAT_W);
                ui.style_mut().visuals.override_text_color = Some(egui::Color32::from_gray(230));

                let skip = self.history.len().saturating_sub(HISTORY_SHOWN);
                for line in self.history.iter().skip(skip) {
                    let who = if line.from_user { view.user_name } else { view.pet_name };
                    let color = if line.from_user {
                        egui::Color32::from_rgb(0, 212, 255)
                    } else {
                        egui::Color32::from_rgb(255, 170, 200)
                    };
                    ui.horizontal_wrapped(|ui| {
                        ui.label(egui::RichText::new(format!("{who}:")).color(color).strong());
                        ui.label(&line.text);
                    });
                }

                ui.horizontal(|ui| {
                    let hint = format!("Talk to {}...", view.pet_name);
                    let input = ui.add(
                        egui::TextEdit::singleline(&mut self.chat_text)
                            .hint_text(hint)
                            .desired_width(CHAT_W - 50.0),
                    );
                    if self.chat_focus_pending {
                        input.request_focus();
                        self.chat_focus_pending = false;
                    }
                    if input.changed() {
                        self.chat_idle = 0.0;
                    }
                    input_focused = input.has_focus();
                    let enter = input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    send = enter || ui.button("💬").clicked();
                    escape = ui.input(|i| i.key_pressed(egui::Key::Escape));
                });
            });
        if let Some(r) = shown {
            self.rects.push(r.response.rect);
        }

        if escape {
            self.close_chat();
            return;
        }

        if send {
            let text = self.chat_text.trim().to_string();
            if !text.is_empty() {
                self.commands.push(UiCommand::SendChat(text));
                self.chat_text.clear();
                self.chat_close_in = Some(CHAT_CLOSE_AFTER_SEND);
            }
        }

        self.chat_idle += dt;
        if self.chat_idle > CHAT_AUTO_HIDE && self.chat_text.is_empty() && !input_focused {
            self.close_chat();
        }
    }

    fn close_chat(&mut self) {
        self.chat_open = false;
        self.chat_close_in = None;
        self.chat_idle = 0.0;
    }

    fn draw_remote(&mut self, ctx: &egui::Context) {
        if !self.remote_open {
            self.remote_dir = Vec2::ZERO;
            return;
        }

        let mut open = true;
        let mut held = [false; 4]; // left, right, up, down

        let shown = egui::Window::new("Remote control")
            .open(&mut open)
            .default_pos([40.0, 40.0])
            .resizable(false)
            .collapsible(false)
            .frame(panel_frame())
            .show(ctx, |ui| {
                ui.style_mut().visuals.override_text_color = Some(egui::Color32::from_gray(230));
                let pad = |ui: &mut egui::Ui, label: &str| {
                    ui.add_sized([40.0, 40.0], egui::Button::new(label))
                };

                ui.horizontal(|ui| {
                    ui.add_space(48.0);
                    held[2] = pad(ui, "⬆").is_pointer_button_down_on();
                });
                ui.horizontal(|ui| {
                    held[0] = pad(ui, "⬅").is_pointer_button_down_on();
                    if pad(ui, "⏹").clicked() {
                        self.commands.push(UiCommand::RemoteStop);
                    }
                    held[1] = pad(ui, "➡").is_pointer_button_down_on();
                });
                ui.horizontal(|ui| {
                    ui.add_space(48.0);
                    held[3] = pad(ui, "⬇").is_pointer_button_down_on();
                });
                ui.separator();
                ui.horizontal(|ui| {
                    if ui.add_sized([64.0, 32.0], egui::Button::new("Jump")).clicked() {
                        self.commands.push(UiCommand::RemoteJump);
                    }
                    if ui.add_sized([64.0, 32.0], egui::Button::new("Slide")).clicked() {
                        self.commands.push(UiCommand::RemoteSlide);
                    }
                });
                ui.label(egui::RichText::new("Arrows move, Space jumps, Shift slides").small());
            });
        if let Some(r) = shown {
            self.rects.push(r.response.rect);
        }

        self.remote_dir = input::direction(held[0], held[1], held[2], held[3]);
        if !open {
            self.remote_open = false;
            self.remote_dir = Vec2::ZERO;
            self.commands.push(UiCommand::RemoteClosed);
        }
    }

    fn draw_settings(&mut self, ctx: &egui::Context) {
        let Some(draft) = self.settings_draft.as_mut() else {
            return;
        };

        let mut save = false;
        let mut cancel = false;

        let shown = egui::Window::new("Settings")
            .default_pos([80.0, 80.0])
            .default_width(320.0)
            .resizable(false)
            .collapsible(false)
            .frame(panel_frame())
            .show(ctx, |ui| {
                ui.style_mut().visuals.override_text_color = Some(egui::Color32::from_gray(230));

                ui.heading("Pet");
                egui::Grid::new("settings_pet").num_columns(2).show(ui, |ui| {
                    ui.label("Kind");
                    egui::ComboBox::from_id_salt("pet_kind")
                        .selected_text(draft.pet_kind.label())
                        .show_ui(ui, |ui| {
                            for kind in [PetKind::Cat, PetKind::Dog] {
                                ui.selectable_value(&mut draft.pet_kind, kind, kind.label());
                            }
                        });
                    ui.end_row();

                    ui.label("Pet name");
                    ui.text_edit_singleline(&mut draft.pet_name);
                    ui.end_row();

                    ui.label("Your name");
                    ui.text_edit_singleline(&mut draft.user_name);
                    ui.end_row();

                    ui.label("Speed");
                    ui.add(egui::Slider::new(&mut draft.movement_speed, 1..=10));
                    ui.end_row();

                    ui.label("Frame time (ms)");
                    ui.add(egui::Slider::new(&mut draft.animation_speed_ms, 30..=300));
                    ui.end_row();
                });
                ui.add_space(4.0);

                ui.heading("Chat");
                ui.checkbox(&mut draft.ai_enabled, "Use cloud AI (Gemini)");
                ui.horizontal(|ui| {
                    ui.label("API key");
                    ui.add(egui::TextEdit::singleline(&mut draft.api_key).password(true));
                });
                ui.horizontal(|ui| {
                    ui.label("Personality");
                    egui::ComboBox::from_id_salt("personality")
                        .selected_text(draft.personality.label())
                        .show_ui(ui, |ui| {
                            for p in Personality::ALL {
                                ui.selectable_value(&mut draft.personality, p, p.label());
                            }
                        });
                });
                ui.add_space(4.0);

                ui.heading("Random messages");
                ui.checkbox(&mut draft.random_messages_enabled, "Enabled");
                ui.horizontal(|ui| {
                    ui.label("Every");
                    ui.add(egui::DragValue::new(&mut draft.random_message_interval[0]).range(30..=7200));
                    ui.label("to");
                    ui.add(egui::DragValue::new(&mut draft.random_message_interval[1]).range(30..=7200));
                    ui.label("seconds");
                });
                ui.checkbox(&mut draft.love_messages_enabled, "Sweet words");
                ui.checkbox(&mut draft.quotes_enabled, "Quotes");
                ui.checkbox(&mut draft.suggestions_enabled, "Suggestions");
                ui.add_space(6.0);

                ui.horizontal(|ui| {
                    save = ui.button("Save").clicked();
                    cancel = ui.button("Cancel").clicked();
                });
            });
        if let Some(r) = shown {
            self.rects.push(r.response.rect);
        }

        if save {
            if let Some(settings) = self.settings_draft.take() {
                self.commands.push(UiCommand::SaveSettings(settings));
            }
        } else if cancel {
            self.settings_draft = None;
        }
    }
}
