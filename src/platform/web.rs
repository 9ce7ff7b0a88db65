//! JS bindings
//!
//! The page owns layout and drawing. It creates a `WebGame` with the measured
//! grid area, forwards taps and prompt answers, calls `update` from its
//! animation loop and redraws from `snapshot()`.

use wasm_bindgen::prelude::*;

use super::{Clock, clock_seed};
use crate::ranking::{self, Identity, LocalStorageStore};
use crate::settings::Settings;
use crate::sim::{Canvas, Decision, GameEvent, GameSession, TapOutcome};

#[wasm_bindgen]
pub struct WebGame {
    session: GameSession,
    clock: Clock,
    store: LocalStorageStore,
}

#[wasm_bindgen]
impl WebGame {
    /// `user_id`/`display_name` come from the identity provider; pass
    /// `undefined` for anonymous play
    #[wasm_bindgen(constructor)]
    pub fn new(
        width: u32,
        height: u32,
        user_id: Option<String>,
        display_name: Option<String>,
    ) -> Result<WebGame, JsError> {
        let settings = Settings::load();
        let seed = clock_seed();
        let mut session = GameSession::new(&settings, Canvas::new(width, height), seed)?;
        if let Some(user_id) = user_id {
            let identity = Identity::new(user_id, display_name.unwrap_or_default());
            session = session.with_identity(identity);
        }
        Ok(WebGame {
            session,
            clock: Clock::start(),
            store: LocalStorageStore,
        })
    }

    /// Returns true for a correct tap
    pub fn tap(&mut self, index: u32) -> bool {
        self.session.tap(index) == TapOutcome::Correct
    }

    pub fn retry(&mut self) -> bool {
        self.session.choose(Decision::Retry)
    }

    pub fn exit(&mut self) -> bool {
        self.session.choose(Decision::Exit)
    }

    /// Advance timers to now. Returns pending events as a JSON array; score
    /// submissions are handled here and not returned.
    pub fn update(&mut self) -> Result<String, JsError> {
        self.session.advance_to(self.clock.elapsed_ms());
        let mut events = Vec::new();
        for event in self.session.drain_events() {
            match event {
                GameEvent::SubmitScore { entry } => {
                    ranking::submit_best_effort(&mut self.store, entry);
                }
                other => events.push(other),
            }
        }
        Ok(serde_json::to_string(&events)?)
    }

    pub fn snapshot(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(&self.session.snapshot())?)
    }

    /// `"<name> : <score>"` lines for the ranking screen
    pub fn ranking_lines(&self) -> Vec<String> {
        ranking::load_lines(&self.store)
    }
}

#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialised".into());
    }
    log::info!("Find Color starting...");
}
