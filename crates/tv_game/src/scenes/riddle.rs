//! Dialogue gate: a short exchange, one riddle, and no second chances.

use tv_core::{
    ChoiceList, Color, ContinuePrompt, DialogueCursor, Key, KeySnapshot, PressSettle, Rect,
    RenderSurface, RenderingSystem, Scene, SceneContext, Subscription, TimerQueue,
};

use super::{ui, Inbox};
use crate::config::RiddleConfig;
use crate::npc::Npc;
use crate::sprites::GATEKEEPER_SHEET;

#[derive(Debug, Clone, Copy, PartialEq)]
enum RiddleState {
    Transition { elapsed: f32 },
    Dialogue,
    Riddle,
    Result,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerResult {
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RiddleInput {
    Confirm,
    Up,
    Down,
    Pick(usize),
    Click(usize),
    Restart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RiddleEvent {
    Settled(usize),
}

pub struct RiddleScene {
    config: RiddleConfig,
    state: RiddleState,
    cursor: DialogueCursor,
    choices: ChoiceList,
    answer_result: Option<AnswerResult>,
    game_over: bool,
    prompt: ContinuePrompt,
    buttons: PressSettle,
    timers: TimerQueue<RiddleEvent>,
    gatekeeper: Option<Npc>,
    inbox: Inbox<RiddleInput>,
    subscriptions: Vec<Subscription>,
}

impl RiddleScene {
    pub fn new(config: RiddleConfig) -> Self {
        let cursor = DialogueCursor::new(config.intro_lines.len());
        let choices = ChoiceList::new(config.choices.len());
        Self {
            config,
            state: RiddleState::Transition { elapsed: 0.0 },
            cursor,
            choices,
            answer_result: None,
            game_over: false,
            prompt: ContinuePrompt::new(),
            buttons: PressSettle::default(),
            timers: TimerQueue::new(),
            gatekeeper: None,
            inbox: Inbox::new(),
            subscriptions: Vec::new(),
        }
    }

    pub fn answer_result(&self) -> Option<AnswerResult> {
        self.answer_result
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    fn enter(&mut self, state: RiddleState) {
        log::debug!("Riddle state {:?} -> {:?}", self.state, state);
        self.state = state;
        self.prompt.reset();
    }

    fn update_transition(&mut self, dt: f32, elapsed: f32) {
        let elapsed = elapsed + dt;
        if elapsed >= self.config.transition {
            self.enter(if self.config.intro_lines.is_empty() {
                RiddleState::Riddle
            } else {
                RiddleState::Dialogue
            });
        } else {
            self.state = RiddleState::Transition { elapsed };
        }
    }

    fn update_dialogue(&mut self, inputs: &[RiddleInput]) {
        if inputs.contains(&RiddleInput::Confirm) && self.prompt.is_ready() {
            if self.cursor.advance() {
                self.prompt.reset();
            } else {
                self.enter(RiddleState::Riddle);
            }
        }
    }

    fn update_riddle(&mut self, inputs: &[RiddleInput]) {
        for input in inputs {
            if self.buttons.is_settling() {
                break;
            }
            match *input {
                RiddleInput::Up => self.choices.up(),
                RiddleInput::Down => self.choices.down(),
                RiddleInput::Pick(i) => {
                    self.choices.select(i);
                }
                RiddleInput::Click(i) => {
                    if self.choices.select(i) {
                        self.buttons.press(i, &mut self.timers, RiddleEvent::Settled(i));
                    }
                }
                RiddleInput::Confirm => {
                    if self.prompt.is_ready() {
                        self.confirm_answer();
                        return;
                    }
                }
                RiddleInput::Restart => {}
            }
        }
    }

    fn confirm_answer(&mut self) {
        let result = if self.choices.selected() == self.config.answer {
            AnswerResult::Correct
        } else {
            AnswerResult::Incorrect
        };
        log::info!("Riddle answered: {result:?}");
        self.answer_result = Some(result);
        self.enter(RiddleState::Result);
    }

    fn update_result(&mut self, inputs: &[RiddleInput], ctx: &mut SceneContext) {
        if !(inputs.contains(&RiddleInput::Confirm) && self.prompt.is_ready()) {
            return;
        }
        match self.answer_result {
            Some(AnswerResult::Correct) => ctx.next_scene(),
            Some(AnswerResult::Incorrect) => {
                log::info!("Riddle failed");
                self.game_over = true;
            }
            None => {}
        }
    }

    fn render_riddle(&self, surface: &mut dyn RenderSurface) {
        ui::dialogue_box(surface, &self.config.speaker, &self.config.question);
        for (i, choice) in self.config.choices.iter().enumerate() {
            let rect = self.buttons.button_rect(i, ui::choice_rect(i));
            ui::button(
                surface,
                rect,
                &format!("{}. {choice}", i + 1),
                self.choices.selected() == i,
            );
        }
    }
}

impl Scene for RiddleScene {
    fn name(&self) -> &'static str {
        "riddle"
    }

    fn init(&mut self, ctx: &mut SceneContext) {
        self.state = RiddleState::Transition { elapsed: 0.0 };
        self.cursor = DialogueCursor::new(self.config.intro_lines.len());
        self.choices = ChoiceList::new(self.config.choices.len());
        self.answer_result = None;
        self.game_over = false;
        self.prompt.reset();
        self.buttons = PressSettle::default();
        self.timers.cancel_all();
        self.gatekeeper = Some(Npc::new(
            ctx.assets(),
            GATEKEEPER_SHEET,
            &self.config.speaker,
            Rect::new(500.0, 220.0, 96.0, 128.0),
            Color::hex("#8e7cc3"),
        ));

        self.inbox.clear();
        let input = ctx.input();
        let count = self.config.choices.len();
        let mut subscriptions = vec![
            self.inbox.on_key(input, Key::Enter, RiddleInput::Confirm),
            self.inbox.on_key(input, Key::Up, RiddleInput::Up),
            self.inbox.on_key(input, Key::Down, RiddleInput::Down),
            self.inbox.on_key(input, Key::R, RiddleInput::Restart),
            self.inbox
                .on_click(input, move |x, y| ui::choice_at(x, y, count).map(RiddleInput::Click)),
        ];
        for (i, key) in Key::DIGITS.iter().enumerate().take(count) {
            subscriptions.push(self.inbox.on_key(input, *key, RiddleInput::Pick(i)));
        }
        self.subscriptions = subscriptions;
    }

    fn update(&mut self, dt: f32, _keys: &KeySnapshot, ctx: &mut SceneContext) {
        for RiddleEvent::Settled(i) in self.timers.advance(dt) {
            self.buttons.settle();
            if self.state == RiddleState::Riddle && self.choices.select(i) {
                self.confirm_answer();
            }
        }
        let inputs = self.inbox.drain();
        self.prompt.update(dt);
        if let Some(npc) = &mut self.gatekeeper {
            npc.tick(dt);
        }

        if self.game_over {
            if inputs.contains(&RiddleInput::Restart) {
                log::info!("Retrying the riddle");
                ctx.reset_player_data();
                ctx.restart_scene();
            }
            return;
        }

        match self.state {
            RiddleState::Transition { elapsed } => self.update_transition(dt, elapsed),
            RiddleState::Dialogue => self.update_dialogue(&inputs),
            RiddleState::Riddle => self.update_riddle(&inputs),
            RiddleState::Result => self.update_result(&inputs, ctx),
        }
    }

    fn render(&self, surface: &mut dyn RenderSurface) {
        ui::clear(surface, Color::hex("#161a1d"));
        surface.fill_rect(Rect::new(0.0, 340.0, ui::SCREEN.w, 260.0), Color::hex("#222b22"));
        surface.fill_rect(Rect::new(470.0, 120.0, 160.0, 230.0), Color::hex("#3b2f2a"));
        if let Some(npc) = &self.gatekeeper {
            RenderingSystem::draw(surface, npc);
        }

        let speaker = self.config.speaker.as_str();
        match self.state {
            RiddleState::Transition { elapsed } => {
                ui::fade(surface, 1.0 - elapsed / self.config.transition);
            }
            RiddleState::Dialogue => {
                if let Some(line) = self.cursor.line(&self.config.intro_lines) {
                    ui::dialogue_box(surface, speaker, line);
                }
                self.prompt.render(surface, "Enter >", 670.0, 542.0);
            }
            RiddleState::Riddle => self.render_riddle(surface),
            RiddleState::Result => {
                let line = match self.answer_result {
                    Some(AnswerResult::Correct) => &self.config.correct_line,
                    _ => &self.config.incorrect_line,
                };
                ui::dialogue_box(surface, speaker, line);
                self.prompt.render(surface, "Enter >", 670.0, 542.0);
            }
        }

        if self.game_over {
            surface.fill_rect(ui::SCREEN, Color::BLACK.with_alpha(0.7));
            ui::centered_text(surface, "The thorns close in", 250.0, 32.0, Color::hex("#d9534f"));
            ui::centered_text(surface, "Press R to try again", 310.0, 18.0, ui::TEXT);
        }
    }

    fn cleanup(&mut self) {
        self.timers.cancel_all();
        self.subscriptions.clear();
        self.inbox.clear();
        self.buttons = PressSettle::default();
        self.gatekeeper = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenes::testing::Harness;
    use tv_core::SceneRequest;

    fn at_riddle() -> (RiddleScene, Harness) {
        let mut scene = RiddleScene::new(RiddleConfig::default());
        let mut h = Harness::new();
        h.init(&mut scene);
        h.run(&mut scene, 1.05, 0.05);
        assert_eq!(scene.state, RiddleState::Dialogue);
        for _ in 0..scene.config.intro_lines.len() {
            h.run(&mut scene, 0.45, 0.05);
            h.tap(&mut scene, Key::Enter);
        }
        assert_eq!(scene.state, RiddleState::Riddle);
        h.run(&mut scene, 0.45, 0.05);
        (scene, h)
    }

    #[test]
    fn dialogue_lines_advance_with_enter() {
        let mut scene = RiddleScene::new(RiddleConfig::default());
        let mut h = Harness::new();
        h.init(&mut scene);
        h.run(&mut scene, 1.05, 0.05);
        let first = scene.config.intro_lines[0].clone();
        assert!(h.render(&scene).contains_text(&first));
        h.run(&mut scene, 0.45, 0.05);
        h.tap(&mut scene, Key::Enter);
        assert_eq!(scene.cursor.index(), 1);
    }

    #[test]
    fn correct_answer_goes_to_next_scene() {
        let (mut scene, mut h) = at_riddle();
        // Default answer is the second choice.
        h.tap(&mut scene, Key::Down);
        h.tap(&mut scene, Key::Enter);
        assert_eq!(scene.answer_result(), Some(AnswerResult::Correct));
        assert_eq!(scene.state, RiddleState::Result);

        h.tap(&mut scene, Key::Enter);
        assert_eq!(scene.state, RiddleState::Result);
        h.run(&mut scene, 0.45, 0.05);
        assert_eq!(h.tap(&mut scene, Key::Enter), Some(SceneRequest::Next));
        assert!(!scene.is_game_over());
    }

    #[test]
    fn incorrect_answer_sets_game_over() {
        let (mut scene, mut h) = at_riddle();
        h.tap(&mut scene, Key::Digit3);
        h.tap(&mut scene, Key::Enter);
        assert_eq!(scene.answer_result(), Some(AnswerResult::Incorrect));
        h.run(&mut scene, 0.45, 0.05);
        assert_eq!(h.tap(&mut scene, Key::Enter), None);
        assert!(scene.is_game_over());
        assert!(h.render(&scene).contains_text("Press R"));

        // Nothing but R does anything now.
        assert_eq!(h.tap(&mut scene, Key::Enter), None);
        h.data.hp = 12.0;
        assert_eq!(h.tap(&mut scene, Key::R), Some(SceneRequest::Restart));
        assert_eq!(h.data.hp, 100.0);
    }

    #[test]
    fn click_settles_then_confirms() {
        let (mut scene, mut h) = at_riddle();
        let (x, y) = ui::choice_rect(1).center();
        h.click(x, y);
        h.update(&mut scene, 0.016);
        assert_eq!(scene.buttons.pressed(), Some(1));
        assert_eq!(scene.state, RiddleState::Riddle);
        h.update(&mut scene, 0.1);
        assert_eq!(scene.state, RiddleState::Riddle);
        h.update(&mut scene, 0.06);
        assert_eq!(scene.state, RiddleState::Result);
        assert_eq!(scene.answer_result(), Some(AnswerResult::Correct));
    }

    #[test]
    fn input_during_settle_is_ignored() {
        let (mut scene, mut h) = at_riddle();
        let (x, y) = ui::choice_rect(0).center();
        h.click(x, y);
        h.update(&mut scene, 0.016);
        h.tap(&mut scene, Key::Down);
        assert_eq!(scene.choices.selected(), 0);
    }

    #[test]
    fn selection_wraps_and_digits_pick() {
        let (mut scene, mut h) = at_riddle();
        h.tap(&mut scene, Key::Up);
        assert_eq!(scene.choices.selected(), 3);
        h.tap(&mut scene, Key::Digit1);
        assert_eq!(scene.choices.selected(), 0);
    }

    #[test]
    fn restart_clears_previous_answer() {
        let (mut scene, mut h) = at_riddle();
        h.tap(&mut scene, Key::Enter);
        scene.cleanup();
        h.init(&mut scene);
        assert_eq!(scene.answer_result(), None);
        assert!(matches!(scene.state, RiddleState::Transition { .. }));
    }
}
