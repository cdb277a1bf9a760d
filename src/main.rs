//! Street Racer entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;

    use street_racer::platform::{FrameClock, control_for_key};
    use street_racer::sim::{GamePhase, SimulationState, tick};
    use street_racer::{InputTracker, Tuning};

    /// Name of the optional JS callback that receives each frame report
    const FRAME_HOOK: &str = "__streetRacerFrame";

    struct Game {
        state: SimulationState,
        input: InputTracker,
        clock: FrameClock,
        /// Cached JS hook, looked up once per phase change
        frame_hook: Option<js_sys::Function>,
        last_phase: GamePhase,
    }

    impl Game {
        fn new(seed: u64) -> Self {
            Self {
                state: SimulationState::new(Tuning::default(), seed),
                input: InputTracker::new(),
                clock: FrameClock::new(),
                frame_hook: lookup_frame_hook(),
                last_phase: GamePhase::Playing,
            }
        }

        /// Run one simulation tick for this display frame
        fn update(&mut self, time: f64) {
            let dt = self.clock.advance(time);
            let input = self.input.snapshot();
            tick(&mut self.state, &input, dt);

            if self.state.phase != self.last_phase {
                if self.last_phase == GamePhase::Paused {
                    // Don't count the paused wall time as simulated time
                    self.clock.resume();
                }
                self.last_phase = self.state.phase;
                self.frame_hook = lookup_frame_hook();
            }
        }

        /// Hand the frame report to the page, if it asked for one
        fn publish(&self) {
            let Some(hook) = &self.frame_hook else {
                return;
            };
            match serde_json::to_string(&self.state.report) {
                Ok(json) => {
                    if let Err(e) = hook.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
                        log::warn!("Frame hook threw: {:?}", e);
                    }
                }
                Err(e) => log::warn!("Failed to serialize frame report: {}", e),
            }
        }

        fn restart(&mut self) {
            self.state.restart();
            self.input.release_all();
            self.clock.resume();
            self.last_phase = GamePhase::Playing;
        }

        /// Focus lost: keyups will never arrive, so drop keys and pause
        fn auto_pause(&mut self, reason: &str) {
            self.input.release_all();
            if self.state.phase == GamePhase::Playing {
                self.input.request_pause();
                log::info!("Auto-paused ({})", reason);
            }
        }
    }

    fn lookup_frame_hook() -> Option<js_sys::Function> {
        let window = web_sys::window()?;
        let value = js_sys::Reflect::get(&window, &JsValue::from_str(FRAME_HOOK)).ok()?;
        value.dyn_into::<js_sys::Function>().ok()
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialised".into());
        }

        log::info!("Street Racer starting...");

        let Some(window) = web_sys::window() else {
            log::error!("No window; cannot start");
            return;
        };

        // Hide loading indicator
        if let Some(loading) = window
            .document()
            .and_then(|d| d.get_element_by_id("loading"))
        {
            let _ = loading.set_attribute("class", "hidden");
        }

        let seed = js_sys::Date::now() as u64;
        log::info!("Game seed: {}", seed);
        let game = Rc::new(RefCell::new(Game::new(seed)));

        setup_input_handlers(game.clone());
        setup_auto_pause(game.clone());

        // Start game loop
        request_animation_frame(game);

        log::info!("Street Racer running!");
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Key down
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut g = game.borrow_mut();
                let code = event.code();
                if code == "Enter" && g.state.phase == GamePhase::Wrecked {
                    g.restart();
                    log::info!("New round started");
                    return;
                }
                if let Some(control) = control_for_key(&code) {
                    event.prevent_default();
                    g.input.key_down(control);
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Key up
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                if let Some(control) = control_for_key(&event.code()) {
                    game.borrow_mut().input.key_up(control);
                }
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            g.update(time);
            g.publish();
        }

        request_animation_frame(game);
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    game.borrow_mut().auto_pause("tab hidden");
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().auto_pause("window blur");
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Street Racer (native) starting...");
    log::info!("Native mode runs a headless scripted drive - build for wasm32 to play");

    let mut args = std::env::args().skip(1);
    let tuning = match args.next() {
        Some(path) => load_tuning(&path),
        None => street_racer::Tuning::default(),
    };
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(2024);

    headless::run(tuning, seed, 60.0);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Read a tuning file, falling back to defaults when it is missing or broken
#[cfg(not(target_arch = "wasm32"))]
fn load_tuning(path: &str) -> street_racer::Tuning {
    use street_racer::Tuning;

    match std::fs::read_to_string(path) {
        Ok(json) => match Tuning::from_json(&json) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path);
                tuning
            }
            Err(e) => {
                log::warn!("Ignoring {}: {}", path, e);
                Tuning::default()
            }
        },
        Err(e) => {
            log::warn!("Could not read {}: {}", path, e);
            Tuning::default()
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use street_racer::consts::NOMINAL_DT;
    use street_racer::sim::{GamePhase, SimulationState, tick};
    use street_racer::{InputState, Tuning};

    /// Scripted driver: full throttle, weaving between lanes, nitro in bursts
    fn scripted_input(t: f32) -> InputState {
        let weave = (t * 0.5).sin();
        InputState {
            forward: true,
            left: weave < -0.6,
            right: weave > 0.6,
            nitro: (t % 10.0) < 2.0,
            ..Default::default()
        }
    }

    pub fn run(tuning: Tuning, seed: u64, seconds: f32) {
        let mut state = SimulationState::new(tuning, seed);
        log::info!(
            "Headless run: seed {}, {} traffic cars, {:.0}s",
            seed,
            state.traffic.active_count(),
            seconds
        );

        let frames = (seconds / NOMINAL_DT) as u32;
        let mut collisions = 0usize;
        for frame in 0..frames {
            let t = frame as f32 * NOMINAL_DT;
            let report = tick(&mut state, &scripted_input(t), NOMINAL_DT);
            collisions += report.collisions.len();

            if frame % 300 == 0 {
                log::info!(
                    "t={:>4.1}s z={:>7.1} speed={:>5.1}mph gear={} damage={:>5.1} score={}",
                    t,
                    report.player.position.z,
                    report.player.speed,
                    report.player.gear,
                    report.player.damage,
                    report.score
                );
            }
            if report.phase == GamePhase::Wrecked {
                break;
            }
        }

        println!(
            "Finished: {:?}, distance {:.0}, near misses {}, collisions {}, score {}",
            state.phase, state.distance, state.total_near_misses, collisions, state.score
        );
    }
}
