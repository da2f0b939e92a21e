//! Browser surface
//!
//! The host page owns the canvas, the clock and the pointer handlers. It feeds
//! frames and gestures in and reads JSON snapshots and events back out.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use wasm_bindgen::prelude::*;

use crate::sim::{
    AudioCueQueue, Categories, Lane, LogSink, Session, TapGesture, TapTarget, TickInput, tick,
};
use crate::{Settings, Viewport};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // Already installed when the host re-instantiates the module
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::debug!("Logger already initialised");
    }
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
pub struct WasmSession {
    session: Session,
    cues: Rc<RefCell<AudioCueQueue>>,
    input: TickInput,
}

#[wasm_bindgen]
impl WasmSession {
    /// Build a session from optional JSON settings and categories
    #[wasm_bindgen(constructor)]
    pub fn new(
        settings_json: Option<String>,
        categories_json: Option<String>,
    ) -> Result<WasmSession, JsValue> {
        let mut settings = match settings_json {
            Some(json) => Settings::from_json(&json).map_err(to_js)?,
            None => Settings::default(),
        };
        if settings.seed.is_none() {
            settings.seed = Some(js_sys::Date::now() as u64);
        }

        let categories = match categories_json {
            Some(json) => Categories::from_json(&json).map_err(to_js)?,
            None => Categories::default(),
        };

        let cues = Rc::new(RefCell::new(AudioCueQueue::default()));
        let session = Session::new(settings, categories)
            .with_sink(LogSink)
            .with_sink(cues.clone());

        Ok(WasmSession {
            session,
            cues,
            input: TickInput::default(),
        })
    }

    pub fn start_game(&mut self, level: usize) {
        self.input = TickInput::default();
        self.session.start_game(level);
    }

    pub fn reset_game(&mut self) {
        self.input = TickInput::default();
        self.session.reset_game();
    }

    /// Advance one animation frame; queued gestures are applied in it
    pub fn tick(&mut self, dt_ms: f64) {
        let input = std::mem::take(&mut self.input);
        tick(&mut self.session, &input, dt_ms);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.input.viewport = Some(Viewport::new(width, height));
    }

    /// Queue a tap on a falling object.
    ///
    /// `lane` names the tapping player's lane (`"left"`/`"right"`) in
    /// two-player mode; taps on the other player's objects are then ignored.
    pub fn tap_object(
        &mut self,
        id: u32,
        time_ms: f64,
        moved_px: f32,
        duration_ms: f64,
        lane: Option<String>,
    ) -> Result<(), JsValue> {
        self.queue_tap(TapTarget::Object(id), time_ms, moved_px, duration_ms, lane)
    }

    /// Queue a tap on a worm
    pub fn tap_worm(
        &mut self,
        id: u32,
        time_ms: f64,
        moved_px: f32,
        duration_ms: f64,
        lane: Option<String>,
    ) -> Result<(), JsValue> {
        self.queue_tap(TapTarget::Worm(id), time_ms, moved_px, duration_ms, lane)
    }

    pub fn set_worm_speed_multiplier(&mut self, multiplier: f32) {
        self.session.set_worm_speed_multiplier(multiplier);
    }

    pub fn is_playing(&self) -> bool {
        self.session.state().is_playing()
    }

    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.snapshot()).map_err(to_js)
    }

    pub fn drain_events_json(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.drain_events()).map_err(to_js)
    }

    pub fn drain_audio_cues_json(&mut self) -> Result<String, JsValue> {
        let cues = self.cues.borrow_mut().drain();
        serde_json::to_string(&cues).map_err(to_js)
    }
}

impl WasmSession {
    fn queue_tap(
        &mut self,
        target: TapTarget,
        time_ms: f64,
        moved_px: f32,
        duration_ms: f64,
        lane: Option<String>,
    ) -> Result<(), JsValue> {
        let lane = match lane {
            Some(name) => Some(Lane::from_str(&name).ok_or_else(|| to_js(format!("Unknown lane: {}", name)))?),
            None => None,
        };
        self.input.taps.push(TapGesture {
            lane,
            end: Vec2::new(moved_px, 0.0),
            duration_ms,
            ..TapGesture::quick(target, time_ms)
        });
        Ok(())
    }
}
