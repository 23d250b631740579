//! Greeting flow: the stage state machine.
//!
//! `reduce` is a pure function from the current `FlowState` and one
//! `FlowEvent` to the next state plus the timers that transition wants.
//! `GreetingFlow` wraps it with a `Scheduler` and feeds fired timers back in.
//!
//! An event whose precondition does not hold is ignored: `reduce` returns
//! `None` and nothing changes. That covers out-of-stage actions, duplicate
//! heart clicks, blank names and timers that outlived their stage.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::Timings;
use crate::game::scheduler::Scheduler;
use crate::game::typewriter::Typewriter;

/// Number of hearts on the heart-clicking screen.
pub const HEART_COUNT: u8 = 4;

/// Screens of the greeting card, in the only order they can be visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Landing,
    NameInput,
    Greeting,
    SurpriseModal,
    HeartClicking,
    BirthdaySequence,
    FinalModal,
    GiftQuestion,
    GiftResponse,
    FinalMessage,
}

impl Stage {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Landing => "landing",
            Self::NameInput => "name-input",
            Self::Greeting => "greeting",
            Self::SurpriseModal => "surprise-modal",
            Self::HeartClicking => "heart-clicking",
            Self::BirthdaySequence => "birthday-sequence",
            Self::FinalModal => "final-modal",
            Self::GiftQuestion => "gift-question",
            Self::GiftResponse => "gift-response",
            Self::FinalMessage => "final-message",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::FinalMessage)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GiftChoice {
    Yes,
    No,
}

impl GiftChoice {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            _ => None,
        }
    }
}

/// Discrete user actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowAction {
    OpenGift,
    SubmitName(String),
    ContinueFromGreeting,
    ContinueFromSurprise,
    ClickHeart(u8),
    ContinueFromBirthday,
    ContinueFromFinalModal,
    ChooseGift(GiftChoice),
    /// The memory game reported completion.
    UnlockGift,
}

/// Deferred follow-ups a transition can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowTimer {
    RevealGreetingButton,
    StartBirthday,
    TypeStep,
    LinePause,
    AutoFinalMessage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    Action(FlowAction),
    Timer(FlowTimer),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowState {
    pub stage: Stage,
    pub user_name: Option<String>,
    pub clicked_hearts: BTreeSet<u8>,
    pub typewriter: Option<Typewriter>,
    pub gift_choice: Option<GiftChoice>,
    pub greeting_button_visible: bool,
    pub birthday_continue_visible: bool,
    /// Decorative hearts float in the background from the surprise modal on.
    pub background_hearts: bool,
    /// One-shot confetti burst after the fourth heart.
    pub confetti: bool,
    pub gift_unlocked: bool,
}

impl Default for FlowState {
    fn default() -> Self {
        Self {
            stage: Stage::Landing,
            user_name: None,
            clicked_hearts: BTreeSet::new(),
            typewriter: None,
            gift_choice: None,
            greeting_button_visible: false,
            birthday_continue_visible: false,
            background_hearts: false,
            confetti: false,
            gift_unlocked: false,
        }
    }
}

impl FlowState {
    pub fn user_name(&self) -> &str {
        self.user_name.as_deref().unwrap_or("")
    }

    pub fn hearts_full(&self) -> bool {
        self.clicked_hearts.len() >= HEART_COUNT as usize
    }
}

/// The next state and the timers to arm, relative to "now".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: FlowState,
    pub timers: Vec<(u64, FlowTimer)>,
}

impl Transition {
    fn to(state: FlowState) -> Self {
        Self {
            state,
            timers: Vec::new(),
        }
    }

    fn after(mut self, delay_ms: u64, timer: FlowTimer) -> Self {
        self.timers.push((delay_ms, timer));
        self
    }
}

/// The four lines of the birthday reveal.
pub fn birthday_lines(name: &str) -> Vec<String> {
    vec![
        "Wait…".to_string(),
        "Someone has a birthday!".to_string(),
        format!("Happy Birthday, {name}!"),
        "You're getting older 🥹".to_string(),
    ]
}

/// Timer that keeps the typewriter moving from its current position.
fn typewriter_timer(tw: &Typewriter, timings: &Timings) -> (u64, FlowTimer) {
    if tw.is_line_complete() {
        (timings.line_pause_ms, FlowTimer::LinePause)
    } else {
        (timings.type_char_ms, FlowTimer::TypeStep)
    }
}

/// Apply one event. Returns `None` when the event is ignored.
pub fn reduce(state: &FlowState, event: &FlowEvent, timings: &Timings) -> Option<Transition> {
    match event {
        FlowEvent::Action(action) => reduce_action(state, action, timings),
        FlowEvent::Timer(timer) => reduce_timer(state, *timer, timings),
    }
}

fn reduce_action(state: &FlowState, action: &FlowAction, timings: &Timings) -> Option<Transition> {
    let mut next = state.clone();
    match (state.stage, action) {
        (Stage::Landing, FlowAction::OpenGift) => {
            next.stage = Stage::NameInput;
            Some(Transition::to(next))
        }
        (Stage::NameInput, FlowAction::SubmitName(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return None;
            }
            next.user_name = Some(trimmed.to_string());
            next.stage = Stage::Greeting;
            Some(
                Transition::to(next)
                    .after(timings.greeting_button_ms, FlowTimer::RevealGreetingButton),
            )
        }
        (Stage::Greeting, FlowAction::ContinueFromGreeting) if state.greeting_button_visible => {
            next.stage = Stage::SurpriseModal;
            next.background_hearts = true;
            Some(Transition::to(next))
        }
        (Stage::SurpriseModal, FlowAction::ContinueFromSurprise) => {
            next.stage = Stage::HeartClicking;
            Some(Transition::to(next))
        }
        (Stage::HeartClicking, FlowAction::ClickHeart(index)) => {
            if *index >= HEART_COUNT || state.hearts_full() || !next.clicked_hearts.insert(*index) {
                return None;
            }
            if next.hearts_full() {
                next.confetti = true;
                Some(Transition::to(next).after(timings.celebration_ms, FlowTimer::StartBirthday))
            } else {
                Some(Transition::to(next))
            }
        }
        (Stage::BirthdaySequence, FlowAction::ContinueFromBirthday)
            if state.birthday_continue_visible =>
        {
            next.stage = Stage::FinalModal;
            Some(Transition::to(next))
        }
        (Stage::FinalModal, FlowAction::ContinueFromFinalModal) => {
            next.stage = Stage::GiftQuestion;
            Some(Transition::to(next))
        }
        (Stage::GiftQuestion, FlowAction::ChooseGift(choice)) => {
            next.gift_choice = Some(*choice);
            next.stage = Stage::GiftResponse;
            Some(Transition::to(next).after(timings.gift_response_ms, FlowTimer::AutoFinalMessage))
        }
        (_, FlowAction::UnlockGift) if !state.gift_unlocked => {
            next.gift_unlocked = true;
            Some(Transition::to(next))
        }
        _ => None,
    }
}

fn reduce_timer(state: &FlowState, timer: FlowTimer, timings: &Timings) -> Option<Transition> {
    let mut next = state.clone();
    match (state.stage, timer) {
        (Stage::Greeting, FlowTimer::RevealGreetingButton) if !state.greeting_button_visible => {
            next.greeting_button_visible = true;
            Some(Transition::to(next))
        }
        (Stage::HeartClicking, FlowTimer::StartBirthday) if state.hearts_full() => {
            let tw = Typewriter::new(birthday_lines(state.user_name()));
            let (delay, follow) = typewriter_timer(&tw, timings);
            next.stage = Stage::BirthdaySequence;
            next.typewriter = Some(tw);
            Some(Transition::to(next).after(delay, follow))
        }
        (Stage::BirthdaySequence, FlowTimer::TypeStep) => {
            let tw = next.typewriter.as_mut()?;
            if tw.is_finished() || tw.is_line_complete() {
                return None;
            }
            tw.reveal_next();
            let (delay, follow) = typewriter_timer(tw, timings);
            Some(Transition::to(next).after(delay, follow))
        }
        (Stage::BirthdaySequence, FlowTimer::LinePause) => {
            let tw = next.typewriter.as_mut()?;
            if tw.is_finished() || !tw.is_line_complete() {
                return None;
            }
            if tw.advance_line() {
                let (delay, follow) = typewriter_timer(tw, timings);
                Some(Transition::to(next).after(delay, follow))
            } else {
                next.birthday_continue_visible = true;
                Some(Transition::to(next))
            }
        }
        (Stage::GiftResponse, FlowTimer::AutoFinalMessage) => {
            next.stage = Stage::FinalMessage;
            Some(Transition::to(next))
        }
        _ => None,
    }
}

/// Flow controller: current state, its timers and the delays in force.
#[derive(Debug, Clone)]
pub struct GreetingFlow {
    state: FlowState,
    timers: Scheduler<FlowTimer>,
    timings: Timings,
}

impl GreetingFlow {
    pub fn new(timings: Timings, now: u64) -> Self {
        Self {
            state: FlowState::default(),
            timers: Scheduler::starting_at(now),
            timings,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn stage(&self) -> Stage {
        self.state.stage
    }

    pub fn has_pending_timers(&self) -> bool {
        !self.timers.is_idle()
    }

    /// Apply a user action. Returns whether it changed anything.
    pub fn dispatch(&mut self, action: FlowAction) -> bool {
        let event = FlowEvent::Action(action);
        let applied = self.apply(&event);
        if !applied {
            trace!(stage = self.state.stage.as_str(), ?event, "flow action ignored");
        }
        applied
    }

    pub fn unlock_gift(&mut self) -> bool {
        self.dispatch(FlowAction::UnlockGift)
    }

    /// Fire every timer due at or before `now`, in order.
    pub fn advance_to(&mut self, now: u64) {
        while let Some(timer) = self.timers.pop_due(now) {
            trace!(?timer, at = self.timers.now(), "flow timer fired");
            self.apply(&FlowEvent::Timer(timer));
        }
        self.timers.settle(now);
    }

    fn apply(&mut self, event: &FlowEvent) -> bool {
        let Some(transition) = reduce(&self.state, event, &self.timings) else {
            return false;
        };
        if transition.state.stage != self.state.stage {
            debug!(
                from = self.state.stage.as_str(),
                to = transition.state.stage.as_str(),
                "stage changed"
            );
        }
        self.state = transition.state;
        for (delay, timer) in transition.timers {
            self.timers.schedule(delay, timer);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow() -> GreetingFlow {
        GreetingFlow::new(Timings::default(), 0)
    }

    /// Drive a fresh flow up to `target` using the happy path.
    fn flow_at(target: Stage) -> GreetingFlow {
        let mut f = flow();
        let mut now = 0;
        let steps: Vec<(Stage, FlowAction)> = vec![
            (Stage::Landing, FlowAction::OpenGift),
            (Stage::NameInput, FlowAction::SubmitName("Ada".into())),
            (Stage::Greeting, FlowAction::ContinueFromGreeting),
            (Stage::SurpriseModal, FlowAction::ContinueFromSurprise),
            (Stage::HeartClicking, FlowAction::ClickHeart(0)),
            (Stage::BirthdaySequence, FlowAction::ContinueFromBirthday),
            (Stage::FinalModal, FlowAction::ContinueFromFinalModal),
            (Stage::GiftQuestion, FlowAction::ChooseGift(GiftChoice::Yes)),
        ];
        for (stage, action) in steps {
            if f.stage() == target {
                break;
            }
            assert_eq!(f.stage(), stage);
            if stage == Stage::HeartClicking {
                for i in 0..HEART_COUNT {
                    f.dispatch(FlowAction::ClickHeart(i));
                }
            } else {
                assert!(f.dispatch(action));
            }
            if f.stage() == target {
                break;
            }
            // Long enough for any timer chain the stage kicks off.
            now += 60_000;
            f.advance_to(now);
        }
        assert_eq!(f.stage(), target);
        f
    }

    fn all_actions() -> Vec<FlowAction> {
        vec![
            FlowAction::OpenGift,
            FlowAction::SubmitName("Zed".into()),
            FlowAction::ContinueFromGreeting,
            FlowAction::ContinueFromSurprise,
            FlowAction::ClickHeart(1),
            FlowAction::ContinueFromBirthday,
            FlowAction::ContinueFromFinalModal,
            FlowAction::ChooseGift(GiftChoice::No),
        ]
    }

    fn legal(stage: Stage, action: &FlowAction) -> bool {
        matches!(
            (stage, action),
            (Stage::Landing, FlowAction::OpenGift)
                | (Stage::NameInput, FlowAction::SubmitName(_))
                | (Stage::Greeting, FlowAction::ContinueFromGreeting)
                | (Stage::SurpriseModal, FlowAction::ContinueFromSurprise)
                | (Stage::HeartClicking, FlowAction::ClickHeart(_))
                | (Stage::BirthdaySequence, FlowAction::ContinueFromBirthday)
                | (Stage::FinalModal, FlowAction::ContinueFromFinalModal)
                | (Stage::GiftQuestion, FlowAction::ChooseGift(_))
        )
    }

    #[test]
    fn out_of_stage_actions_change_nothing() {
        let stages = [
            Stage::Landing,
            Stage::NameInput,
            Stage::Greeting,
            Stage::SurpriseModal,
            Stage::HeartClicking,
            Stage::BirthdaySequence,
            Stage::FinalModal,
            Stage::GiftQuestion,
            Stage::GiftResponse,
            Stage::FinalMessage,
        ];
        for stage in stages {
            let f = flow_at(stage);
            for action in all_actions() {
                if legal(stage, &action) {
                    continue;
                }
                let event = FlowEvent::Action(action.clone());
                assert_eq!(
                    reduce(f.state(), &event, &Timings::default()),
                    None,
                    "{action:?} should be ignored in {stage:?}"
                );
            }
        }
    }

    #[test]
    fn blank_names_stay_on_name_input() {
        let mut f = flow_at(Stage::NameInput);
        assert!(!f.dispatch(FlowAction::SubmitName(String::new())));
        assert!(!f.dispatch(FlowAction::SubmitName("   ".into())));
        assert_eq!(f.stage(), Stage::NameInput);
        assert_eq!(f.state().user_name, None);
    }

    #[test]
    fn name_is_trimmed() {
        let mut f = flow_at(Stage::NameInput);
        assert!(f.dispatch(FlowAction::SubmitName("  Ada ".into())));
        assert_eq!(f.stage(), Stage::Greeting);
        assert_eq!(f.state().user_name(), "Ada");
    }

    #[test]
    fn greeting_button_appears_after_delay() {
        let mut f = flow_at(Stage::NameInput);
        let now = f.timers.now();
        f.dispatch(FlowAction::SubmitName("Ada".into()));
        assert!(!f.dispatch(FlowAction::ContinueFromGreeting));
        f.advance_to(now + 1999);
        assert!(!f.state().greeting_button_visible);
        f.advance_to(now + 2000);
        assert!(f.state().greeting_button_visible);
        assert!(f.dispatch(FlowAction::ContinueFromGreeting));
        assert_eq!(f.stage(), Stage::SurpriseModal);
        assert!(f.state().background_hearts);
    }

    #[test]
    fn duplicate_hearts_are_ignored() {
        let mut f = flow_at(Stage::HeartClicking);
        assert!(f.dispatch(FlowAction::ClickHeart(2)));
        assert!(!f.dispatch(FlowAction::ClickHeart(2)));
        assert_eq!(f.state().clicked_hearts.len(), 1);
        assert!(!f.dispatch(FlowAction::ClickHeart(4)));
        assert_eq!(f.state().clicked_hearts.len(), 1);
    }

    #[test]
    fn four_hearts_start_birthday_exactly_once() {
        let mut f = flow_at(Stage::HeartClicking);
        let now = f.timers.now();
        for i in [3, 1, 0, 2] {
            assert!(f.dispatch(FlowAction::ClickHeart(i)));
        }
        assert!(f.state().confetti);
        assert_eq!(f.timers.pending(), 1);
        // Extra clicks while the celebration runs are no-ops.
        for i in 0..HEART_COUNT {
            assert!(!f.dispatch(FlowAction::ClickHeart(i)));
        }
        assert_eq!(f.timers.pending(), 1);
        assert_eq!(f.stage(), Stage::HeartClicking);
        f.advance_to(now + 200);
        assert_eq!(f.stage(), Stage::BirthdaySequence);
        assert!(f.state().typewriter.is_some());
    }

    #[test]
    fn typewriter_reveals_lines_strictly_in_order() {
        let mut f = flow_at(Stage::HeartClicking);
        let mut now = f.timers.now();
        for i in 0..HEART_COUNT {
            f.dispatch(FlowAction::ClickHeart(i));
        }
        now += 200;
        f.advance_to(now);

        let tw = f.state().typewriter.as_ref().unwrap();
        assert_eq!(tw.line_index(), 0);
        let mut seen = vec![tw.visible_text().to_string()];
        for _ in 0.."Wait…".chars().count() {
            now += 20;
            f.advance_to(now);
            seen.push(f.state().typewriter.as_ref().unwrap().visible_text().to_string());
        }
        assert_eq!(seen, vec!["", "W", "Wa", "Wai", "Wait", "Wait…"]);

        // Line 1 must not start before the pause has elapsed.
        f.advance_to(now + 799);
        assert_eq!(f.state().typewriter.as_ref().unwrap().line_index(), 0);
        f.advance_to(now + 800);
        let tw = f.state().typewriter.as_ref().unwrap();
        assert_eq!(tw.line_index(), 1);
        assert_eq!(tw.visible_text(), "");
        assert!(!f.state().birthday_continue_visible);
    }

    #[test]
    fn typewriter_interpolates_name_and_shows_continue() {
        let mut f = flow_at(Stage::HeartClicking);
        for i in 0..HEART_COUNT {
            f.dispatch(FlowAction::ClickHeart(i));
        }
        let now = f.timers.now();
        // One coarse tick replays the whole chain.
        f.advance_to(now + 1_000_000);
        let tw = f.state().typewriter.as_ref().unwrap();
        assert!(tw.is_finished());
        assert_eq!(tw.line_index(), 3);
        assert_eq!(tw.visible_text(), "You're getting older 🥹");
        assert!(f.state().birthday_continue_visible);
        assert!(!f.has_pending_timers());
        assert_eq!(birthday_lines("Ada")[2], "Happy Birthday, Ada!");
    }

    #[test]
    fn birthday_continue_needs_finished_reveal() {
        let mut f = flow_at(Stage::HeartClicking);
        for i in 0..HEART_COUNT {
            f.dispatch(FlowAction::ClickHeart(i));
        }
        let now = f.timers.now();
        f.advance_to(now + 300);
        assert_eq!(f.stage(), Stage::BirthdaySequence);
        assert!(!f.dispatch(FlowAction::ContinueFromBirthday));
    }

    #[test]
    fn both_gift_choices_reach_final_message() {
        for choice in [GiftChoice::Yes, GiftChoice::No] {
            let mut f = flow_at(Stage::GiftQuestion);
            let now = f.timers.now();
            assert!(f.dispatch(FlowAction::ChooseGift(choice)));
            assert_eq!(f.stage(), Stage::GiftResponse);
            assert_eq!(f.state().gift_choice, Some(choice));
            f.advance_to(now + 2999);
            assert_eq!(f.stage(), Stage::GiftResponse);
            f.advance_to(now + 3000);
            assert_eq!(f.stage(), Stage::FinalMessage);
            assert_eq!(f.state().gift_choice, Some(choice));
            assert!(f.stage().is_terminal());
        }
    }

    #[test]
    fn stale_timers_are_ignored() {
        let state = FlowState::default();
        for timer in [
            FlowTimer::RevealGreetingButton,
            FlowTimer::StartBirthday,
            FlowTimer::TypeStep,
            FlowTimer::LinePause,
            FlowTimer::AutoFinalMessage,
        ] {
            assert_eq!(reduce(&state, &FlowEvent::Timer(timer), &Timings::default()), None);
        }
    }

    #[test]
    fn unlock_gift_is_idempotent_and_stage_free() {
        let mut f = flow();
        assert!(f.unlock_gift());
        assert!(!f.unlock_gift());
        assert!(f.state().gift_unlocked);
        assert_eq!(f.stage(), Stage::Landing);
    }

    #[test]
    fn stage_names_are_kebab_case() {
        assert_eq!(
            serde_json::to_string(&Stage::BirthdaySequence).unwrap(),
            r#""birthday-sequence""#
        );
        assert_eq!(Stage::GiftQuestion.as_str(), "gift-question");
        assert_eq!(GiftChoice::parse("no"), Some(GiftChoice::No));
        assert_eq!(GiftChoice::parse("maybe"), None);
    }
}
