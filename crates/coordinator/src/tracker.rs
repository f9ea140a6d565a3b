// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-pane state, timers, and the output-driven transition engine.
//!
//! Follows the `driver/claude/screen_detect.rs` classifier shape and
//! `state.rs::SessionEntry`'s per-entry lock discipline: one tracker per
//! pane, mutated only from within [`process_pane_state`], this crate's
//! `processPaneState`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::pattern::{catalogue, strip_ansi, Category};

/// States of the per-pane recovery state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneState {
    Idle,
    RateLimited,
    AwaitingMethodSelect,
    AwaitingUrl,
    AuthPending,
    CodeReceived,
    AwaitingConfirm,
    Resuming,
    Failed,
}

impl PaneState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::RateLimited => "rate_limited",
            Self::AwaitingMethodSelect => "awaiting_method_select",
            Self::AwaitingUrl => "awaiting_url",
            Self::AuthPending => "auth_pending",
            Self::CodeReceived => "code_received",
            Self::AwaitingConfirm => "awaiting_confirm",
            Self::Resuming => "resuming",
            Self::Failed => "failed",
        }
    }

    /// Whether a tracker in this state is permitted to hold a non-empty
    /// `request_id` under normal (non-leaked) operation.
    pub fn holds_request(&self) -> bool {
        matches!(self, Self::AuthPending | Self::CodeReceived | Self::AwaitingConfirm)
    }
}

impl std::fmt::Display for PaneState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side effects requested by [`process_pane_state`]. The caller (the
/// coordinator's poll loop) executes these outside any tracker lock.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SendText { text: String, no_paste: bool },
    PublishAuthRequest { request_id: String, url: String },
    ReleaseAuthRequest { request_id: String },
}

/// Timing knobs consulted by the transition engine, derived from
/// [`crate::config::Config`].
#[derive(Debug, Clone)]
pub struct TrackerTiming {
    pub auth_timeout: Duration,
    pub state_timeout: Duration,
    pub failed_timeout: Duration,
    pub resume_cooldown: Duration,
    pub compaction_reminder_cooldown: Duration,
    pub compaction_reminder_enabled: bool,
    pub compaction_reminder_prompt: String,
    pub resume_prompt: String,
    /// Cooldown guarding the `/login\n` injection.
    pub login_cooldown: Duration,
    /// Cooldown guarding the method-selection `1\n` injection.
    pub method_select_cooldown: Duration,
}

impl Default for TrackerTiming {
    fn default() -> Self {
        Self {
            auth_timeout: Duration::from_secs(120),
            state_timeout: Duration::from_secs(60),
            failed_timeout: Duration::from_secs(30),
            resume_cooldown: Duration::from_secs(5),
            compaction_reminder_cooldown: Duration::from_secs(60),
            compaction_reminder_enabled: true,
            compaction_reminder_prompt: "Please continue where you left off.".to_owned(),
            resume_prompt: "Please continue.".to_owned(),
            login_cooldown: Duration::from_secs(2),
            method_select_cooldown: Duration::from_secs(2),
        }
    }
}

/// Per-pane tracker: current state, timers, and fields carried through
/// the re-login flow.
#[derive(Debug, Clone)]
pub struct PaneTracker {
    pub state: PaneState,
    pub state_entered: Instant,
    pub last_check: Instant,
    pub last_output: String,
    pub oauth_url: Option<String>,
    pub request_id: Option<String>,
    pub received_code: Option<String>,
    pub used_account: Option<String>,
    pub error_message: Option<String>,
    pub retry_count: u32,
    cooldowns: HashMap<String, Instant>,
}

impl PaneTracker {
    pub fn new(now: Instant) -> Self {
        Self {
            state: PaneState::Idle,
            state_entered: now,
            last_check: now,
            last_output: String::new(),
            oauth_url: None,
            request_id: None,
            received_code: None,
            used_account: None,
            error_message: None,
            retry_count: 0,
            cooldowns: HashMap::new(),
        }
    }

    fn transition(&mut self, next: PaneState, now: Instant) {
        self.state = next;
        self.state_entered = now;
    }

    /// Return a tracker to IDLE, clearing all auth-flow fields together.
    /// Cooldowns are preserved except when the transition originates from
    /// FAILED, which re-arms the login flow fresh after a failure.
    pub fn reset(&mut self, now: Instant) {
        let from_failed = self.state == PaneState::Failed;
        self.transition(PaneState::Idle, now);
        self.oauth_url = None;
        self.request_id = None;
        self.received_code = None;
        self.used_account = None;
        self.error_message = None;
        if from_failed {
            self.cooldowns.clear();
        }
    }

    fn cooldown_active(&self, name: &str, now: Instant) -> bool {
        self.cooldowns.get(name).is_some_and(|until| now < *until)
    }

    fn arm_cooldown(&mut self, name: &str, now: Instant, duration: Duration) {
        self.cooldowns.insert(name.to_owned(), now + duration);
    }

    fn residency(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.state_entered)
    }
}

/// Maximum number of cascading sub-transitions evaluated within a single
/// poll tick, guarding against runaway loops if a pattern set were ever
/// misconfigured to cycle.
const MAX_CASCADE: u8 = 6;

/// Drive one pane's state machine forward given the latest scraped text.
///
/// `raw_output` is the unstripped scrollback tail; ANSI stripping and
/// pattern classification happen internally. Returns the side effects the
/// caller must execute (pane writes, AuthRequest bookkeeping) outside any
/// lock. All state mutation happens here, serialised by the tracker's own
/// lock at the call site: transitions fire exclusively inside
/// `processPaneState`.
pub fn process_pane_state(
    tracker: &mut PaneTracker,
    raw_output: &str,
    now: Instant,
    timing: &TrackerTiming,
    request_id_fn: &dyn Fn() -> String,
) -> Vec<Action> {
    tracker.last_check = now;
    let stripped = strip_ansi(raw_output);
    let mut actions = Vec::new();

    // State-timeout check (rule 3). FAILED has its own timeout below and
    // IDLE has none.
    if tracker.state != PaneState::Idle && tracker.state != PaneState::Failed {
        let timeout = match tracker.state {
            PaneState::AuthPending | PaneState::CodeReceived | PaneState::AwaitingConfirm => {
                timing.auth_timeout
            }
            _ => timing.state_timeout,
        };
        if tracker.residency(now) >= timeout {
            let prev = tracker.state;
            tracker.error_message =
                Some(format!("{} timed out after {:?}", prev.as_str(), timeout));
            tracker.retry_count += 1;
            tracker.transition(PaneState::Failed, now);
            tracker.last_output = raw_output.to_owned();
            return actions;
        }
    }
    if tracker.state == PaneState::Failed && tracker.residency(now) >= timing.failed_timeout {
        if let Some(request_id) = tracker.request_id.take() {
            actions.push(Action::ReleaseAuthRequest { request_id });
        }
        tracker.reset(now);
        tracker.last_output = raw_output.to_owned();
        return actions;
    }

    let mut cascades = 0;
    loop {
        let progressed = step(tracker, &stripped, raw_output, now, timing, request_id_fn, &mut actions);
        cascades += 1;
        if !progressed || cascades >= MAX_CASCADE {
            break;
        }
    }

    tracker.last_output = raw_output.to_owned();
    actions
}

/// Attempt exactly one sub-transition for the tracker's *current* state.
/// Returns `true` if a transition or auxiliary action was taken, allowing
/// the caller to cascade within the same poll tick (e.g. a fresh method
/// picker with the first option already highlighted should not wait an
/// extra poll before the code is injected).
#[allow(clippy::too_many_arguments)]
fn step(
    tracker: &mut PaneTracker,
    stripped: &str,
    raw_output: &str,
    now: Instant,
    timing: &TrackerTiming,
    request_id_fn: &dyn Fn() -> String,
    actions: &mut Vec<Action>,
) -> bool {
    match tracker.state {
        PaneState::Idle => step_idle(tracker, stripped, raw_output, now, timing, actions),
        PaneState::RateLimited => step_rate_limited(tracker, stripped, now, actions),
        PaneState::AwaitingMethodSelect => {
            step_awaiting_method_select(tracker, stripped, now, timing, actions)
        }
        PaneState::AwaitingUrl => step_awaiting_url(tracker, raw_output, now, request_id_fn, actions),
        PaneState::AuthPending => step_auth_pending(tracker, now, actions),
        PaneState::CodeReceived => step_code_received(tracker, now, actions),
        PaneState::AwaitingConfirm => step_awaiting_confirm(tracker, stripped, now, timing, actions),
        PaneState::Resuming => step_resuming(tracker, now, timing, actions),
        PaneState::Failed => false,
    }
}

fn step_idle(
    tracker: &mut PaneTracker,
    stripped: &str,
    raw_output: &str,
    now: Instant,
    timing: &TrackerTiming,
    actions: &mut Vec<Action>,
) -> bool {
    let output_changed = raw_output != tracker.last_output;
    if !output_changed {
        return false;
    }

    if catalogue().matches(stripped, Category::RateLimit) {
        actions.push(Action::SendText { text: "/login\n".to_owned(), no_paste: false });
        tracker.arm_cooldown("login", now, timing.login_cooldown);
        tracker.transition(PaneState::RateLimited, now);
        return true;
    }

    if timing.compaction_reminder_enabled
        && catalogue().matches(stripped, Category::CompactingBanner)
        && !raw_output.contains(&timing.compaction_reminder_prompt)
        && !tracker.cooldown_active("compaction_reminder", now)
    {
        actions.push(Action::SendText {
            text: timing.compaction_reminder_prompt.clone(),
            no_paste: false,
        });
        tracker.arm_cooldown("compaction_reminder", now, timing.compaction_reminder_cooldown);
        return true;
    }

    false
}

fn step_rate_limited(
    tracker: &mut PaneTracker,
    stripped: &str,
    now: Instant,
    _actions: &mut [Action],
) -> bool {
    if catalogue().matches(stripped, Category::SelectMethod) {
        tracker.transition(PaneState::AwaitingMethodSelect, now);
        return true;
    }
    false
}

fn step_awaiting_method_select(
    tracker: &mut PaneTracker,
    stripped: &str,
    now: Instant,
    timing: &TrackerTiming,
    actions: &mut Vec<Action>,
) -> bool {
    if tracker.cooldown_active("method_select", now) {
        return false;
    }
    if catalogue().matches(stripped, Category::OptionOne) {
        actions.push(Action::SendText { text: "1\n".to_owned(), no_paste: false });
        tracker.arm_cooldown("method_select", now, timing.method_select_cooldown);
        tracker.transition(PaneState::AwaitingUrl, now);
        return true;
    }
    // PastePrompt forces AWAITING_URL even without a fresh method-picker
    // confirmation, covering screens that skip straight past the picker.
    if catalogue().matches(stripped, Category::PastePrompt) {
        tracker.transition(PaneState::AwaitingUrl, now);
        return true;
    }
    false
}

fn step_awaiting_url(
    tracker: &mut PaneTracker,
    raw_output: &str,
    now: Instant,
    request_id_fn: &dyn Fn() -> String,
    actions: &mut Vec<Action>,
) -> bool {
    let Some(url) = catalogue().extract_oauth_url(raw_output) else {
        return false;
    };
    tracker.oauth_url = Some(url.clone());
    let request_id = request_id_fn();
    tracker.request_id = Some(request_id.clone());
    actions.push(Action::PublishAuthRequest { request_id, url });
    tracker.transition(PaneState::AuthPending, now);
    true
}

fn step_auth_pending(tracker: &mut PaneTracker, now: Instant, _actions: &mut [Action]) -> bool {
    // Output-change gating is inverted here: the coordinator must still
    // process this state when the agent delivers a code even if the
    // scraped pane text is unchanged.
    if tracker.received_code.is_none() {
        return false;
    }
    tracker.transition(PaneState::CodeReceived, now);
    true
}

fn step_code_received(tracker: &mut PaneTracker, now: Instant, actions: &mut Vec<Action>) -> bool {
    let Some(code) = tracker.received_code.clone() else {
        return false;
    };
    actions.push(Action::SendText { text: format!("{code}\n"), no_paste: true });
    tracker.transition(PaneState::AwaitingConfirm, now);
    true
}

fn step_awaiting_confirm(
    tracker: &mut PaneTracker,
    stripped: &str,
    now: Instant,
    timing: &TrackerTiming,
    actions: &mut Vec<Action>,
) -> bool {
    if catalogue().matches(stripped, Category::LoginSuccess) {
        if !tracker.cooldown_active("resume", now) {
            actions.push(Action::SendText { text: timing.resume_prompt.clone(), no_paste: false });
            tracker.arm_cooldown("resume", now, timing.resume_cooldown);
        }
        tracker.transition(PaneState::Resuming, now);
        return true;
    }
    if catalogue().matches(stripped, Category::LoginFailed) {
        tracker.error_message = Some("login failed".to_owned());
        tracker.transition(PaneState::Failed, now);
        return true;
    }
    false
}

fn step_resuming(
    tracker: &mut PaneTracker,
    now: Instant,
    _timing: &TrackerTiming,
    actions: &mut Vec<Action>,
) -> bool {
    if tracker.cooldown_active("resume", now) {
        return false;
    }
    if let Some(request_id) = tracker.request_id.take() {
        actions.push(Action::ReleaseAuthRequest { request_id });
    }
    tracker.reset(now);
    true
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
