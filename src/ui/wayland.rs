use smithay_client_toolkit::{
    compositor::{CompositorHandler, CompositorState},
    delegate_compositor, delegate_keyboard, delegate_output, delegate_registry, delegate_seat,
    delegate_shm, delegate_layer,
    output::{OutputHandler, OutputState},
    registry::{ProvidesRegistryState, RegistryState},
    seat::{
        keyboard::{KeyEvent, KeyboardHandler, Modifiers},
        Capability, SeatHandler, SeatState,
    },
    shell::{
        wlr_layer::{
            LayerShell, LayerShellHandler, LayerSurface, LayerSurfaceConfigure,
        },
        WaylandSurface,
    },
    shm::{slot::SlotPool, Shm, ShmHandler},
};
use wayland_client::{
    globals::GlobalList,
    protocol::{wl_keyboard, wl_output, wl_seat, wl_shm, wl_surface},
    Connection, QueueHandle,
};
use xkbcommon::xkb::{self, keysyms};
use crate::browser;
use crate::state::AppState;
use crate::ui::blossoms::BlossomField;
use crate::ui::render::Renderer;

/// Tracks the single outstanding frame callback. `draw` runs from several
/// sources (frame callbacks, the blossom timer, channel handlers, key
/// presses); requesting a callback from each would stack them, and every
/// pending callback fires once per display refresh.
#[derive(Default)]
struct FrameGate {
    pending: bool,
}

impl FrameGate {
    /// True exactly when the caller should request a callback now.
    fn try_arm(&mut self) -> bool {
        !std::mem::replace(&mut self.pending, true)
    }

    fn disarm(&mut self) {
        self.pending = false;
    }
}

pub struct WaylandApp {
    pub registry_state: RegistryState,
    pub seat_state: SeatState,
    pub output_state: OutputState,
    pub compositor_state: CompositorState,
    pub shm_state: Shm,
    pub layer_shell_state: LayerShell,

    pub layer_surface: Option<LayerSurface>,
    pub pool: Option<SlotPool>,
    pub width: u32,
    pub height: u32,
    pub first_configure: bool,
    pub should_exit: bool,
    modifiers: Modifiers,
    frame_gate: FrameGate,

    pub state: AppState,
    pub renderer: Renderer,
    pub blossoms: BlossomField,
}

impl WaylandApp {
    pub fn new(
        _conn: &Connection,
        globals: &GlobalList,
        qh: &QueueHandle<Self>,
        state: AppState,
        renderer: Renderer,
        blossoms: BlossomField,
    ) -> Self {
        let registry_state = RegistryState::new(globals);
        let seat_state = SeatState::new(globals, qh);
        let output_state = OutputState::new(globals, qh);
        let compositor_state = CompositorState::bind(globals, qh).expect("wl_compositor not available");
        let shm_state = Shm::bind(globals, qh).expect("wl_shm not available");
        let layer_shell_state = LayerShell::bind(globals, qh).expect("zwlr_layer_shell_v1 not available");

        let width = state.config.theme.width;
        let height = state.config.theme.height;

        Self {
            registry_state,
            seat_state,
            output_state,
            compositor_state,
            shm_state,
            layer_shell_state,
            layer_surface: None,
            pool: None,
            width,
            height,
            first_configure: true,
            should_exit: false,
            modifiers: Modifiers::default(),
            frame_gate: FrameGate::default(),
            state,
            renderer,
            blossoms,
        }
    }

    pub fn draw(&mut self, _conn: &Connection, qh: &QueueHandle<Self>) {
        if let Some(layer_surface) = &self.layer_surface {
            let width = self.width;
            let height = self.height;
            if width == 0 || height == 0 { return; }

            let Some(pool) = self.pool.as_mut() else { return; };

            let (buffer, canvas) = pool
                .create_buffer(
                    width as i32,
                    height as i32,
                    (width * 4) as i32,
                    wl_shm::Format::Argb8888,
                )
                .expect("create buffer");

            if let Some(mut pixmap) = tiny_skia::PixmapMut::from_bytes(canvas, width, height) {
                self.renderer.draw(&mut pixmap, &self.state, &self.blossoms);

                for chunk in canvas.chunks_exact_mut(4) {
                    chunk.swap(0, 2);
                }

                // While petals fall, keep one frame callback pending so the
                // animation advances with the display refresh.
                if self.blossoms.active() && self.frame_gate.try_arm() {
                    layer_surface
                        .wl_surface()
                        .frame(qh, layer_surface.wl_surface().clone());
                }

                layer_surface.wl_surface().attach(Some(buffer.wl_buffer()), 0, 0);
                layer_surface.wl_surface().damage(0, 0, width as i32, height as i32);
                layer_surface.wl_surface().commit();
            }
        }
    }

    fn open_selected(&mut self) {
        if let Some(entry) = self.state.get_selected() {
            if let Err(e) = browser::open(entry, &self.state.config) {
                log::warn!("could not open {}: {e}", entry.url);
            }
        }
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        let sym = u32::from(event.keysym);

        if self.modifiers.ctrl {
            match sym {
                keysyms::KEY_t | keysyms::KEY_T => self.state.toggle_night_mode(),
                keysyms::KEY_f | keysyms::KEY_F => self.state.toggle_favorites_only(),
                keysyms::KEY_s | keysyms::KEY_S => self.state.toggle_selected_favorite(),
                keysyms::KEY_b | keysyms::KEY_B => self.blossoms.toggle(),
                keysyms::KEY_plus | keysyms::KEY_equal | keysyms::KEY_KP_Add => {
                    self.blossoms.adjust_count(1)
                }
                keysyms::KEY_minus | keysyms::KEY_KP_Subtract => self.blossoms.adjust_count(-1),
                _ => {}
            }
            return;
        }

        match sym {
            keysyms::KEY_Escape => {
                if self.state.filter.search.is_empty() {
                    self.should_exit = true;
                } else {
                    self.state.clear_search();
                }
            }
            keysyms::KEY_Return | keysyms::KEY_KP_Enter => self.open_selected(),
            keysyms::KEY_Up => self.state.move_selection(-1),
            keysyms::KEY_Down => self.state.move_selection(1),
            keysyms::KEY_Left => self.state.cycle_category(-1),
            keysyms::KEY_Right => self.state.cycle_category(1),
            keysyms::KEY_BackSpace => self.state.pop_search(),
            _ => {
                if let Some(utf8) = &event.utf8 {
                    if !utf8.chars().any(|c| c.is_control()) {
                        self.state.push_search(utf8);
                    }
                }
            }
        }
    }
}

impl LayerShellHandler for WaylandApp {
    fn closed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _layer: &LayerSurface) {
        self.should_exit = true;
    }

    fn configure(
        &mut self,
        conn: &Connection,
        qh: &QueueHandle<Self>,
        _layer: &LayerSurface,
        configure: LayerSurfaceConfigure,
        _serial: u32,
    ) {
        if configure.new_size.0 > 0 {
            self.width = configure.new_size.0;
        }
        if configure.new_size.1 > 0 {
            self.height = configure.new_size.1;
        }

        if self.first_configure {
            self.first_configure = false;
            let pool = SlotPool::new(self.width as usize * self.height as usize * 4, &self.shm_state)
                .expect("Failed to create pool");
            self.pool = Some(pool);
        }

        if let Some(pool) = &mut self.pool {
            if pool.len() < (self.width * self.height * 4) as usize {
                 pool.resize((self.width * self.height * 4) as usize).unwrap();
            }
        }

        self.draw(conn, qh);
    }
}

impl CompositorHandler for WaylandApp {
    fn scale_factor_changed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _new_factor: i32,
    ) {}

    fn frame(
        &mut self,
        conn: &Connection,
        qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _time: u32,
    ) {
        self.frame_gate.disarm();
        self.draw(conn, qh);
    }

    fn transform_changed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _new_transform: wl_output::Transform,
    ) {}

    fn surface_enter(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _output: &wl_output::WlOutput,
    ) {}

    fn surface_leave(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _output: &wl_output::WlOutput,
    ) {}
}

impl OutputHandler for WaylandApp {
    fn output_state(&mut self) -> &mut OutputState {
        &mut self.output_state
    }
    fn new_output(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _output: wl_output::WlOutput) {}
    fn update_output(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _output: wl_output::WlOutput) {}
    fn output_destroyed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _output: wl_output::WlOutput) {}
}

impl SeatHandler for WaylandApp {
    fn seat_state(&mut self) -> &mut SeatState {
        &mut self.seat_state
    }

    fn new_seat(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_seat::WlSeat) {}

    fn new_capability(
        &mut self,
        _conn: &Connection,
        qh: &QueueHandle<Self>,
        seat: wl_seat::WlSeat,
        _capability: Capability,
    ) {
        if _capability == Capability::Keyboard && self.seat_state.get_keyboard(qh, &seat, None).is_ok() {
            // Keyboard added
        }
    }

    fn remove_capability(
        &mut self,
        _conn: &Connection,
        _: &QueueHandle<Self>,
        _: wl_seat::WlSeat,
        _capability: Capability,
    ) {}

    fn remove_seat(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_seat::WlSeat) {}
}

impl KeyboardHandler for WaylandApp {
    fn enter(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_keyboard::WlKeyboard,
        _: &wl_surface::WlSurface,
        _: u32,
        _: &[u32],
        _: &[xkb::Keysym],
    ) {}

    fn leave(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_keyboard::WlKeyboard,
        _: &wl_surface::WlSurface,
        _: u32,
    ) {
        // Focus moves to the opened browser window; stay up.
    }

    fn press_key(
        &mut self,
        _conn: &Connection,
        qh: &QueueHandle<Self>,
        _keyboard: &wl_keyboard::WlKeyboard,
        _serial: u32,
        event: KeyEvent,
    ) {
        self.handle_key(&event);

        if let Some(layer_surface) = &self.layer_surface {
            // With a callback already pending, the redraw it triggers will
            // pick up the new state.
            if self.frame_gate.try_arm() {
                layer_surface.wl_surface().frame(qh, layer_surface.wl_surface().clone());
                layer_surface.wl_surface().commit();
            }
        }
    }

    fn release_key(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_keyboard::WlKeyboard,
        _: u32,
        _: KeyEvent,
    ) {}

    fn update_modifiers(
        &mut self,
        _: &Connection,
        _: &QueueHandle<Self>,
        _: &wl_keyboard::WlKeyboard,
        _serial: u32,
        modifiers: Modifiers,
        _layout: u32,
    ) {
        self.modifiers = modifiers;
    }
}


impl ShmHandler for WaylandApp {
    fn shm_state(&mut self) -> &mut Shm {
        &mut self.shm_state
    }
}

delegate_compositor!(WaylandApp);
delegate_output!(WaylandApp);
delegate_shm!(WaylandApp);
delegate_seat!(WaylandApp);
delegate_keyboard!(WaylandApp);
delegate_layer!(WaylandApp);
delegate_registry!(WaylandApp);

impl ProvidesRegistryState for WaylandApp {
    fn registry(&mut self) -> &mut RegistryState {
        &mut self.registry_state
    }

    fn runtime_add_global(&mut self, _: &Connection, _: &QueueHandle<Self>, _: u32, _: &str, _: u32) {
    }
    fn runtime_remove_global(&mut self, _: &Connection, _: &QueueHandle<Self>, _: u32, _: &str) {
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_most_one_frame_callback_outstanding() {
        let mut gate = FrameGate::default();
        assert!(gate.try_arm());
        // Timer ticks and key presses between refreshes must not stack more.
        assert!(!gate.try_arm());
        assert!(!gate.try_arm());

        gate.disarm();
        assert!(gate.try_arm());
        assert!(!gate.try_arm());
    }

    #[test]
    fn repeated_refresh_cycles_stay_balanced() {
        let mut gate = FrameGate::default();
        for _ in 0..1000 {
            // One callback fires, one replacement is requested; extra draw
            // sources in the same cycle are refused.
            gate.disarm();
            assert!(gate.try_arm());
            assert!(!gate.try_arm());
        }
    }
}
