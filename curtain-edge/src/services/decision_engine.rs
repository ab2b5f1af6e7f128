use curtain_api::clock::hh_mm;
use curtain_api::protocols::{JsonProtocol, Protocol};
use curtain_api::{CurtainAction, CurtainCommand, CurtainRule, CurtainState, EdgeStatus, ScheduleUpdate, SensorData};
use time::OffsetDateTime;

use crate::errors::MessageError;

/// Light level at or above which the curtain should be open.
pub const LIGHT_THRESHOLD: i32 = 500;

/// Wall clock used for the override window and status timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Host wall clock in the local timezone, falling back to UTC when the local
/// offset cannot be determined.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
    }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// Outcome of one processed reading: an optional command, always a status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub command: Option<CurtainCommand>,
    pub status: EdgeStatus,
}

/// Owns the curtain state and the current override rule.
///
/// Handlers take `&mut self`, so each event runs to completion before the next
/// one is looked at.
pub struct DecisionEngine<C: Clock = SystemClock> {
    curtain_state: CurtainState,
    rule: Option<CurtainRule>,
    clock: C,
}

impl DecisionEngine<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for DecisionEngine<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> DecisionEngine<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            curtain_state: CurtainState::Closed,
            rule: None,
            clock,
        }
    }

    pub fn curtain_state(&self) -> CurtainState {
        self.curtain_state
    }

    pub fn rule(&self) -> Option<&CurtainRule> {
        self.rule.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Parses a `sensor/data` payload and decides on it.
    ///
    /// Malformed payloads are logged and discarded without touching state.
    pub fn handle_sensor_payload(&mut self, payload: &[u8]) -> Option<Decision> {
        match JsonProtocol.deserialize::<SensorData>(payload).map_err(MessageError::from) {
            Ok(reading) => Some(self.handle_sensor_reading(&reading)),
            Err(e) => {
                tracing::warn!("Failed to parse sensor data: {}", e);
                None
            }
        }
    }

    pub fn handle_sensor_reading(&mut self, reading: &SensorData) -> Decision {
        tracing::info!("Received sensor data => type={}, value={}", reading.kind, reading.value);

        let now = self.clock.now();

        if self.override_active(now) {
            tracing::info!("Within override window, ignoring sensor input");

            return Decision {
                command: None,
                status: self.status(reading.value, true, now),
            };
        }

        let command = self.apply_threshold(reading.value);
        if let Some(command) = &command {
            tracing::info!("Curtain command => {} ({})", command.action, command.target);
        }

        Decision {
            command,
            status: self.status(reading.value, false, now),
        }
    }

    /// Parses a `cloud/ruleUpdate` payload and stores its rule.
    ///
    /// Returns whether the held rule was replaced.
    pub fn handle_rule_payload(&mut self, payload: &[u8]) -> bool {
        match JsonProtocol.deserialize::<ScheduleUpdate>(payload).map_err(MessageError::from) {
            Ok(update) => {
                self.handle_rule_update(update);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to parse rule update: {}", e);
                false
            }
        }
    }

    /// Replaces the held rule wholesale. Takes effect on the next reading.
    pub fn handle_rule_update(&mut self, update: ScheduleUpdate) {
        let rule = update.rule;

        tracing::info!(
            "Received rule update => id={}, window={}-{}, enabled={}",
            rule.id,
            rule.window_start,
            rule.window_end,
            rule.enabled
        );

        if rule.crosses_midnight() {
            tracing::warn!(
                "Rule {} window {}-{} crosses midnight and will never be active",
                rule.id,
                rule.window_start,
                rule.window_end
            );
        }

        self.rule = Some(rule);
        tracing::debug!("Override active now: {}", self.is_override_active());
    }

    pub fn is_override_active(&self) -> bool {
        self.override_active(self.clock.now())
    }

    fn override_active(&self, now: OffsetDateTime) -> bool {
        match &self.rule {
            Some(rule) => rule.covers(&hh_mm(now.time())),
            None => false,
        }
    }

    fn apply_threshold(&mut self, value: i32) -> Option<CurtainCommand> {
        let action = if value >= LIGHT_THRESHOLD {
            CurtainAction::Open
        } else {
            CurtainAction::Close
        };

        let desired = action.resulting_state();
        if self.curtain_state == desired {
            return None;
        }

        self.curtain_state = desired;
        Some(CurtainCommand::new(action))
    }

    fn status(&self, light_level: i32, override_active: bool, now: OffsetDateTime) -> EdgeStatus {
        EdgeStatus {
            light_level,
            curtain_state: self.curtain_state,
            override_active,
            reported_at: now,
        }
    }
}
