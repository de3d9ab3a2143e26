//! Browser bindings
//!
//! The hosting page owns rendering, toasts and the virtual keyboard; this
//! wrapper only moves events in and signals out. Everything crosses the
//! boundary as plain strings or JSON so the page needs no generated glue
//! beyond this one class.

use wasm_bindgen::prelude::*;

use crate::config::ScaleConfig;
use crate::engine::{self, DropPayload, DropTarget, InputEvent, Relation, ScaleState};

/// The embeddable exercise engine
#[wasm_bindgen]
pub struct ScaleWidget {
    state: ScaleState,
}

#[wasm_bindgen]
impl ScaleWidget {
    /// Create an engine with a host-provided seed (e.g. Date.now())
    #[wasm_bindgen(constructor)]
    pub fn new(seed: f64) -> ScaleWidget {
        console_error_panic_hook::set_once();
        // Re-init is fine when the page embeds several widgets
        let _ = console_log::init_with_level(log::Level::Info);
        ScaleWidget {
            state: ScaleState::new(seed as u64),
        }
    }

    /// Apply a JSON configuration; returns an error message when rejected
    pub fn configure(&mut self, json: &str) -> Option<String> {
        let config: ScaleConfig = match serde_json::from_str(json) {
            Ok(config) => config,
            Err(err) => return Some(err.to_string()),
        };
        match engine::configure(&mut self.state, config) {
            Ok(()) => None,
            Err(err) => Some(err.to_string()),
        }
    }

    /// Forward one DataTransfer entry as a drop on `target`
    /// ("left", "right", "slot:N" or "answer")
    pub fn drop_payload(&mut self, target: &str, key: &str, value: &str) {
        let Some(target) = parse_target(target) else {
            log::debug!("discarding drop on unknown target {target:?}");
            return;
        };
        let payload = DropPayload::new().set(key, value);
        engine::handle_event(&mut self.state, InputEvent::Drop { target, payload });
    }

    /// Keyboard token from the page or the virtual keyboard
    pub fn inject_key(&mut self, token: &str) {
        engine::inject_key(&mut self.state, token);
    }

    /// Click on a placed token (removes it)
    pub fn click_item(&mut self, id: u32) {
        engine::handle_event(&mut self.state, InputEvent::ClickItem { id });
    }

    /// Comparison symbol button ("<", "=" or ">")
    pub fn choose_relation(&mut self, symbol: &str) {
        let Some(relation) = Relation::from_symbol(symbol) else {
            log::debug!("discarding unknown symbol {symbol:?}");
            return;
        };
        engine::handle_event(&mut self.state, InputEvent::ChooseRelation(relation));
    }

    /// Restart the current configuration with a fresh exercise
    pub fn reset(&mut self) {
        engine::handle_event(&mut self.state, InputEvent::Reset);
    }

    /// Advance engine time by `dt` seconds (call once per frame)
    pub fn advance(&mut self, dt: f32) {
        engine::advance(&mut self.state, dt);
    }

    /// Drain queued signals as a JSON array
    pub fn drain_signals(&mut self) -> String {
        let signals = self.state.drain_signals();
        serde_json::to_string(&signals).unwrap_or_else(|_| "[]".to_string())
    }

    /// Full engine state as JSON; the page renders from this
    pub fn snapshot(&self) -> String {
        serde_json::to_string(&self.state).unwrap_or_default()
    }

    /// Restore a previously captured snapshot; rejects snapshots whose
    /// fields do not fit together
    pub fn restore(&mut self, json: &str) -> bool {
        match serde_json::from_str::<ScaleState>(json) {
            Ok(state) if state.snapshot_coherent() => {
                self.state = state;
                true
            }
            Ok(_) => {
                log::warn!("snapshot rejected: fields out of range");
                false
            }
            Err(err) => {
                log::warn!("snapshot rejected: {err}");
                false
            }
        }
    }
}

fn parse_target(target: &str) -> Option<DropTarget> {
    match target {
        "left" => Some(DropTarget::LeftPan),
        "right" => Some(DropTarget::RightPan),
        "answer" => Some(DropTarget::Answer),
        _ => target
            .strip_prefix("slot:")?
            .parse()
            .ok()
            .map(DropTarget::Slot),
    }
}
