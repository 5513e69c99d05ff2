//! Idle economy: units, upgrades, prestige and artifacts over one session.
//!
//! The pure rules live in the submodules and operate on `(config, state)`.
//! `EconomyEngine` owns one session and adds the host-facing pieces: the tick
//! clock, save requests and persistence.

pub mod artifacts;
pub mod config;
pub mod cost;
pub mod error;
pub mod format;
pub mod logic;
pub mod prestige;
pub mod save;
pub mod state;

mod simulator;

use std::sync::Arc;

use log::info;

use crate::settings::EngineSettings;
use crate::time::{now_millis, TickClock};

use config::{BalanceConfig, UnitKind, UpgradeId};
use cost::{PurchaseQuote, Quantity};
use error::{ConfigError, EconomyError, StoreError};
use prestige::PrestigeOutcome;
use save::{LoadReport, PersistenceGateway, SaveReport, SaveStore};
use state::EconomyState;

pub struct EconomyEngine {
    config: Arc<BalanceConfig>,
    settings: EngineSettings,
    state: EconomyState,
    clock: TickClock,
    save_requested: bool,
    /// Ticked seconds since the last autosave request.
    autosave_elapsed: f64,
}

impl EconomyEngine {
    /// Fresh session over the embedded balance table and default settings.
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self::with_config(
            BalanceConfig::embedded()?,
            EngineSettings::default(),
        ))
    }

    pub fn with_config(config: Arc<BalanceConfig>, settings: EngineSettings) -> Self {
        let state = EconomyState::new(&config);
        let clock = TickClock::new(settings.tick_interval_ms, settings.max_frame_delta_ms);
        Self {
            config,
            settings,
            state,
            clock,
            save_requested: false,
            autosave_elapsed: 0.0,
        }
    }

    pub fn state(&self) -> &EconomyState {
        &self.state
    }

    pub fn config(&self) -> &BalanceConfig {
        &self.config
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn quote_units(&self, kind: UnitKind, quantity: Quantity) -> Result<PurchaseQuote, EconomyError> {
        logic::quote_units(&self.config, &self.state, kind, quantity)
    }

    pub fn quote_upgrade(&self, id: UpgradeId, quantity: Quantity) -> Result<PurchaseQuote, EconomyError> {
        logic::quote_upgrade(&self.config, &self.state, id, quantity)
    }

    pub fn purchase_units(
        &mut self,
        kind: UnitKind,
        quantity: Quantity,
    ) -> Result<PurchaseQuote, EconomyError> {
        let quote = logic::purchase_units(&self.config, &mut self.state, kind, quantity)?;
        self.save_requested = true;
        Ok(quote)
    }

    pub fn purchase_upgrade(
        &mut self,
        id: UpgradeId,
        quantity: Quantity,
    ) -> Result<PurchaseQuote, EconomyError> {
        let quote = logic::purchase_upgrade(&self.config, &mut self.state, id, quantity)?;
        self.save_requested = true;
        Ok(quote)
    }

    pub fn click(&mut self) -> f64 {
        logic::click(&mut self.state)
    }

    /// Credit passive income for `elapsed_seconds` and count toward autosave.
    pub fn tick_passive_income(&mut self, elapsed_seconds: f64) -> f64 {
        let earned = logic::tick_passive_income(&mut self.state, elapsed_seconds);
        self.count_autosave(elapsed_seconds);
        earned
    }

    /// Feed a wall-clock timestamp; credits income for the whole ticks elapsed.
    pub fn advance(&mut self, now_ms: f64) -> f64 {
        let ticks = self.clock.update(now_ms);
        if ticks == 0 {
            return 0.0;
        }
        let seconds = self.clock.seconds(ticks);
        self.tick_passive_income(seconds)
    }

    fn count_autosave(&mut self, elapsed_seconds: f64) {
        let interval = self.settings.autosave_interval_secs as f64;
        if interval <= 0.0 || !elapsed_seconds.is_finite() || elapsed_seconds <= 0.0 {
            return;
        }
        self.autosave_elapsed += elapsed_seconds;
        if self.autosave_elapsed >= interval {
            self.autosave_elapsed %= interval;
            self.save_requested = true;
        }
    }

    pub fn can_prestige(&self) -> bool {
        prestige::can_prestige(&self.config, &self.state)
    }

    /// Points a prestige would award right now.
    pub fn pending_prestige_award(&self) -> u64 {
        prestige::compute_prestige_award(&self.config, &self.state)
    }

    pub fn execute_prestige(&mut self) -> Result<PrestigeOutcome, EconomyError> {
        let outcome = prestige::execute_prestige(&self.config, &mut self.state)?;
        self.save_requested = true;
        Ok(outcome)
    }

    /// Rebuild artifact modifiers from the unlocked set, then the yields.
    pub fn recompute_modifiers(&mut self) -> Result<(), EconomyError> {
        self.state.modifiers =
            artifacts::recompute_modifiers(&self.config, &self.state.unlocked_artifacts)?;
        self.state.recompute_yields(&self.config);
        Ok(())
    }

    pub fn set_display_notation(&mut self, enabled: bool) {
        if self.state.display_uses_exponential_notation != enabled {
            self.state.display_uses_exponential_notation = enabled;
            self.save_requested = true;
        }
    }

    /// Render an amount in the session's chosen notation.
    pub fn format_amount(&self, amount: f64) -> String {
        format::format_amount(amount, self.state.display_uses_exponential_notation)
    }

    /// Whether a save is due. Clears the request.
    pub fn take_save_request(&mut self) -> bool {
        std::mem::take(&mut self.save_requested)
    }

    pub fn save_requested(&self) -> bool {
        self.save_requested
    }

    pub fn save<S: SaveStore>(&mut self, gateway: &PersistenceGateway<S>) -> SaveReport {
        let report = gateway.save(&self.state, now_millis());
        if report.success {
            self.save_requested = false;
            self.autosave_elapsed = 0.0;
        }
        report
    }

    /// Replace the session with the stored one, if any. Without a usable
    /// save the current state is kept.
    pub fn load<S: SaveStore>(&mut self, gateway: &PersistenceGateway<S>) -> LoadReport {
        let report = gateway.load(&self.config);
        if let Some(state) = &report.state {
            self.state = state.clone();
            info!(
                "restored session from {:?} save ({} prestiges)",
                report.source, self.state.total_prestige_count
            );
        }
        report
    }

    pub fn clear_save<S: SaveStore>(&self, gateway: &PersistenceGateway<S>) -> Result<(), StoreError> {
        gateway.clear()
    }
}
