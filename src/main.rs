//! Swap Lane entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Element, HtmlElement, KeyboardEvent, MouseEvent, TouchEvent};

    use swap_lane::platform::{FrameClock, InputAdapter, Key, LocalStore};
    use swap_lane::sim::{GameEvent, GameState, tick};
    use swap_lane::{HighScore, Settings, Tuning};

    // Render hand-off. The page may install `window.swapLaneRender(frame)`;
    // otherwise a plain 2D rendition is drawn on #gameCanvas.
    #[wasm_bindgen(inline_js = "
        function drawCar(ctx, car, color, camY, h) {
            const y = h / 2 - (camY - car.y);
            ctx.save();
            ctx.translate(car.x, y);
            ctx.rotate(car.tilt);
            ctx.fillStyle = color;
            ctx.fillRect(-car.width / 2, -car.height / 2, car.width, car.height);
            ctx.restore();
        }

        export function render_frame(json) {
            const frame = JSON.parse(json);
            if (typeof window.swapLaneRender === 'function') {
                window.swapLaneRender(frame);
                return;
            }
            const canvas = document.getElementById('gameCanvas');
            if (!canvas) return;
            const ctx = canvas.getContext('2d');
            const w = canvas.width, h = canvas.height;
            const camY = frame.camera.y;
            const road = frame.road;

            ctx.clearRect(0, 0, w, h);
            ctx.fillStyle = '#2d6a2d';
            ctx.fillRect(0, 0, w, h);
            ctx.fillStyle = '#444';
            ctx.fillRect(road.left, 0, road.width, h);
            ctx.fillStyle = '#fff';
            for (const segY of road.segments) {
                const y = h / 2 - (camY - segY);
                for (let lane = 1; lane < road.lane_count; lane++) {
                    ctx.fillRect(road.left + lane * road.lane_width - 2, y, 4, road.segment_length / 2);
                }
            }

            for (const agent of frame.agents) {
                const color = agent.kind === 'Bus' ? '#e0a020' : agent.kind === 'Drunk' ? '#a040c0' : '#c03030';
                drawCar(ctx, agent, color, camY, h);
                if (agent.turn_signal) {
                    const y = h / 2 - (camY - agent.y);
                    const side = agent.turn_signal === 'Left' ? -1 : 1;
                    ctx.fillStyle = '#ffb000';
                    ctx.fillRect(agent.x + side * agent.width / 2 - 4, y - agent.height / 2, 8, 8);
                }
            }
            drawCar(ctx, frame.player, frame.player.crashed ? '#777' : '#3070e0', camY, h);

            ctx.fillStyle = '#fff';
            ctx.font = '20px sans-serif';
            ctx.textAlign = 'left';
            ctx.fillText('Score: ' + frame.score, 10, 30);
            ctx.fillText('Best: ' + frame.high_score, 10, 56);
            if (frame.game_over) {
                ctx.textAlign = 'center';
                ctx.font = '40px sans-serif';
                ctx.fillText('Game Over!', w / 2, h / 2 - 20);
                ctx.font = '20px sans-serif';
                ctx.fillText('Score: ' + frame.score, w / 2, h / 2 + 20);
                ctx.fillText('Press Space or Tap to Restart', w / 2, h / 2 + 60);
            }
        }
    ")]
    extern "C" {
        fn render_frame(json: &str);
    }

    /// Game instance holding all state
    struct Game {
        state: GameState,
        input: InputAdapter,
        clock: FrameClock,
        store: Option<LocalStore>,
        high_score: HighScore,
    }

    impl Game {
        fn new(seed: u64) -> Self {
            let store = match LocalStore::open() {
                Ok(store) => Some(store),
                Err(e) => {
                    log::warn!("Persistence disabled: {e}");
                    None
                }
            };
            let (settings, high_score) = match &store {
                Some(store) => (Settings::load(store), HighScore::load(store)),
                None => (Settings::default(), HighScore::default()),
            };
            let tuning = Tuning::default();
            let max_wheel = tuning.steering.max_wheel_rotation_deg;

            Self {
                state: GameState::new(seed, tuning, high_score.best),
                input: InputAdapter::new(settings, max_wheel),
                clock: FrameClock::new(),
                store,
                high_score,
            }
        }

        /// Run simulation ticks for this frame
        fn update(&mut self, time: f64) {
            self.input.frame();

            let substeps = self.clock.advance(time);
            for _ in 0..substeps {
                let input = self.input.take_tick_input();
                tick(&mut self.state, &input);
            }

            for event in self.state.drain_events() {
                match event {
                    GameEvent::NewHighScore { score } => {
                        if self.high_score.record(score) {
                            if let Some(store) = self.store.as_mut() {
                                self.high_score.save(store);
                            }
                        }
                    }
                    GameEvent::Crashed { cause, score } => {
                        log::debug!("Crash ({:?}) at score {}", cause, score);
                    }
                    GameEvent::Restarted => self.clock.reset(),
                    GameEvent::Passed { .. } => {}
                }
            }
        }

        /// Hand the frame to the render callback
        fn render(&self) {
            match serde_json::to_string(&self.state.snapshot()) {
                Ok(json) => render_frame(&json),
                Err(e) => log::error!("Snapshot serialization failed: {e}"),
            }
            set_wheel_visual(self.input.wheel().angle_deg());
        }
    }

    fn set_wheel_visual(angle_deg: f32) {
        let Some(wheel) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("steeringWheel"))
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        else {
            return;
        };
        let _ = wheel
            .style()
            .set_property("transform", &format!("rotate({angle_deg}deg)"));
    }

    fn element_center(el: &Element) -> Vec2 {
        let rect = el.get_bounding_client_rect();
        Vec2::new(
            (rect.left() + rect.width() / 2.0) as f32,
            (rect.top() + rect.height() / 2.0) as f32,
        )
    }

    fn wheel_center() -> Vec2 {
        web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("steeringWheel"))
            .map(|el| element_center(&el))
            .unwrap_or(Vec2::ZERO)
    }

    fn first_touch(event: &TouchEvent) -> Option<Vec2> {
        event
            .touches()
            .get(0)
            .map(|t| Vec2::new(t.client_x() as f32, t.client_y() as f32))
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Swap Lane starting...");

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed)));
        log::info!("Game initialized with seed: {}", seed);

        setup_keyboard(game.clone());
        setup_pedals(game.clone());
        setup_steering_wheel(game.clone());
        setup_tap_restart(game.clone());

        request_animation_frame(game);

        log::info!("Swap Lane running!");
    }

    fn setup_keyboard(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(key) = Key::from_event(&event.code(), &event.key()) {
                    let mut g = game.borrow_mut();
                    let game_over = g.state.is_game_over();
                    g.input.key_down(key, game_over);
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(key) = Key::from_event(&event.code(), &event.key()) {
                    game.borrow_mut().input.key_up(key);
                }
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_pedals(game: Rc<RefCell<Game>>) {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .expect("no document");

        for (id, is_gas) in [("gasBtn", true), ("brakeBtn", false)] {
            let Some(btn) = document.get_element_by_id(id) else {
                log::warn!("#{} not found; pedal disabled", id);
                continue;
            };

            for (event_name, pressed) in [
                ("mousedown", true),
                ("mouseup", false),
                ("mouseleave", false),
                ("touchstart", true),
                ("touchend", false),
            ] {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
                    if event_name.starts_with("touch") {
                        event.prevent_default();
                    }
                    let mut g = game.borrow_mut();
                    if is_gas {
                        g.input.gas_pedal(pressed);
                    } else {
                        g.input.brake_pedal(pressed);
                    }
                });
                let _ = btn
                    .add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }
    }

    fn setup_steering_wheel(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");
        let Some(wheel) = document.get_element_by_id("steeringWheel") else {
            log::warn!("#steeringWheel not found; keyboard steering only");
            return;
        };

        // Grab
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                event.prevent_default();
                let pointer = Vec2::new(event.client_x() as f32, event.client_y() as f32);
                game.borrow_mut()
                    .input
                    .wheel_pointer_down(pointer, wheel_center());
            });
            let _ = wheel
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(pointer) = first_touch(&event) {
                    game.borrow_mut()
                        .input
                        .wheel_pointer_down(pointer, wheel_center());
                }
            });
            let _ = wheel
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Turn (tracked on the window so the drag survives leaving the wheel)
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                if g.input.wheel().is_dragging() {
                    event.prevent_default();
                    let pointer = Vec2::new(event.client_x() as f32, event.client_y() as f32);
                    g.input.wheel_pointer_move(pointer, wheel_center());
                }
            });
            let _ = window
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                let mut g = game.borrow_mut();
                if g.input.wheel().is_dragging() {
                    event.prevent_default();
                    if let Some(pointer) = first_touch(&event) {
                        g.input.wheel_pointer_move(pointer, wheel_center());
                    }
                }
            });
            let _ = window
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Release
        for event_name in ["mouseup", "touchend"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow_mut().input.wheel_pointer_up();
            });
            let _ = window
                .add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_tap_restart(game: Rc<RefCell<Game>>) {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .expect("no document");
        let Some(canvas) = document.get_element_by_id("gameCanvas") else {
            log::warn!("#gameCanvas not found; tap restart disabled");
            return;
        };

        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::PointerEvent| {
            let mut g = game.borrow_mut();
            let game_over = g.state.is_game_over();
            g.input.tap(game_over);
        });
        let _ = canvas
            .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
        closure.forget();
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
            g.render();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

/// Headless run: hold the throttle, weave between lanes, report the outcome.
///
/// Usage: `swap-lane [seed] [tuning.json]`
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use swap_lane::platform::{InputAdapter, Key, MemoryStore};
    use swap_lane::sim::{GameEvent, GameState, tick};
    use swap_lane::{HighScore, Settings, Tuning};

    /// Ten minutes at 60 Hz
    const MAX_TICKS: u32 = 36_000;

    env_logger::init();
    log::info!("Swap Lane (native) starting...");

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
    let tuning = match args.next() {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(json) => match Tuning::from_json(&json) {
                Ok(tuning) => tuning,
                Err(e) => {
                    log::error!("Invalid tuning in {}: {}", path, e);
                    std::process::exit(2);
                }
            },
            Err(e) => {
                log::error!("Cannot read {}: {}", path, e);
                std::process::exit(2);
            }
        },
        None => Tuning::default(),
    };

    let mut store = MemoryStore::new();
    let mut high_score = HighScore::load(&store);
    let settings = Settings::load(&store);
    let max_wheel = tuning.steering.max_wheel_rotation_deg;
    let mut state = GameState::new(seed, tuning, high_score.best);
    let mut input = InputAdapter::new(settings, max_wheel);
    input.key_down(Key::Gas, false);

    let mut passed = 0u32;
    for t in 0..MAX_TICKS {
        // Tap the wheel one way, then the other, every couple of seconds
        match t % 240 {
            0..=5 => input.key_down(Key::SteerLeft, false),
            120..=125 => input.key_down(Key::SteerRight, false),
            40 | 160 => input.key_up(Key::SteerLeft),
            _ => {}
        }
        input.frame();
        let tick_input = input.take_tick_input();
        tick(&mut state, &tick_input);

        for event in state.drain_events() {
            match event {
                GameEvent::Passed { .. } => passed += 1,
                GameEvent::NewHighScore { score } => {
                    if high_score.record(score) {
                        high_score.save(&mut store);
                    }
                }
                GameEvent::Crashed { .. } | GameEvent::Restarted => {}
            }
        }
        if state.is_game_over() {
            break;
        }
    }

    log::info!(
        "Run finished after {} ticks: score={} passed={} game_over={} best={}",
        state.time_ticks,
        state.score,
        passed,
        state.is_game_over(),
        high_score.best
    );
    println!(
        "seed={} ticks={} score={} game_over={}",
        seed,
        state.time_ticks,
        state.score,
        state.is_game_over()
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
