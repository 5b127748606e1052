use strum::{Display, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter)]
pub enum ButtonState {
    #[default]
    Default,
    Hover,
    Pressed,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ButtonInput {
    Enter,
    Exit,
    Press,
    Release,
    Disable,
    Default,
}

/// How a transition moves the state stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Stay,
    Push(ButtonState),
    Pop,
    Reset(ButtonState),
}

pub fn step(current: ButtonState, input: ButtonInput) -> Step {
    use ButtonInput as I;
    use ButtonState as S;

    match (current, input) {
        (S::Default, I::Enter) => Step::Push(S::Hover),
        (S::Default | S::Hover, I::Press) => Step::Push(S::Pressed),
        (S::Default | S::Hover, I::Disable) => Step::Reset(S::Disabled),
        (S::Hover, I::Exit) => Step::Pop,
        (S::Pressed, I::Release | I::Enter | I::Exit | I::Default | I::Disable) => Step::Pop,
        (S::Disabled, I::Default) => Step::Reset(S::Default),
        _ => Step::Stay,
    }
}

/// Receives the visual for a state after every real transition.
pub trait ButtonRenderer {
    fn render_default(&mut self);
    fn render_hover(&mut self);
    fn render_selected(&mut self);
    fn render_disabled(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RenderAction {
    Default,
    Hover,
    Selected,
    Disabled,
}

impl RenderAction {
    pub fn apply(self, renderer: &mut dyn ButtonRenderer) {
        match self {
            RenderAction::Default => renderer.render_default(),
            RenderAction::Hover => renderer.render_hover(),
            RenderAction::Selected => renderer.render_selected(),
            RenderAction::Disabled => renderer.render_disabled(),
        }
    }
}

pub fn render_action(state: ButtonState, selected: bool) -> RenderAction {
    match state {
        ButtonState::Default if selected => RenderAction::Selected,
        ButtonState::Default => RenderAction::Default,
        ButtonState::Hover | ButtonState::Pressed => RenderAction::Hover,
        ButtonState::Disabled => RenderAction::Disabled,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub input: ButtonInput,
    pub from: ButtonState,
    pub to: ButtonState,
}

/// Stack-based button state machine. Popping returns to the state that was
/// current before the matching push, falling back to `Default`.
#[derive(Debug, Clone, Default)]
pub struct ButtonStateMachine {
    current: ButtonState,
    history: Vec<ButtonState>,
}

impl ButtonStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> ButtonState {
        self.current
    }

    pub fn previous(&self) -> Option<ButtonState> {
        self.history.last().copied()
    }

    pub fn is_disabled(&self) -> bool {
        self.current == ButtonState::Disabled
    }

    /// Feeds one input. Returns the transition only when the state changed,
    /// in which case the renderer has already been told about it.
    pub fn fire(
        &mut self,
        input: ButtonInput,
        selected: bool,
        renderer: &mut dyn ButtonRenderer,
    ) -> Option<Transition> {
        let from = self.current;
        match step(from, input) {
            Step::Stay => return None,
            Step::Push(next) => {
                self.history.push(from);
                self.current = next;
            }
            Step::Pop => {
                self.current = self.history.pop().unwrap_or_default();
            }
            Step::Reset(next) => {
                self.history.clear();
                self.current = next;
            }
        }
        if self.current == from {
            return None;
        }
        render_action(self.current, selected).apply(renderer);
        Some(Transition {
            input,
            from,
            to: self.current,
        })
    }

    /// Re-issues the visual for the current state, e.g. after the selected
    /// flag changed without a transition.
    pub fn rerender(&self, selected: bool, renderer: &mut dyn ButtonRenderer) {
        render_action(self.current, selected).apply(renderer);
    }

    pub fn reset(&mut self) {
        self.current = ButtonState::Default;
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingRenderer;
    use strum::IntoEnumIterator;

    #[test]
    fn test_transition_table() {
        use ButtonInput as I;
        use ButtonState as S;

        let cases = [
            (S::Default, I::Enter, Step::Push(S::Hover)),
            (S::Default, I::Press, Step::Push(S::Pressed)),
            (S::Default, I::Exit, Step::Stay),
            (S::Default, I::Release, Step::Stay),
            (S::Default, I::Disable, Step::Reset(S::Disabled)),
            (S::Hover, I::Exit, Step::Pop),
            (S::Hover, I::Press, Step::Push(S::Pressed)),
            (S::Hover, I::Enter, Step::Stay),
            (S::Hover, I::Disable, Step::Reset(S::Disabled)),
            (S::Pressed, I::Release, Step::Pop),
            (S::Pressed, I::Enter, Step::Pop),
            (S::Pressed, I::Exit, Step::Pop),
            (S::Pressed, I::Default, Step::Pop),
            (S::Pressed, I::Disable, Step::Pop),
            (S::Pressed, I::Press, Step::Stay),
            (S::Disabled, I::Default, Step::Reset(S::Default)),
            (S::Disabled, I::Enter, Step::Stay),
            (S::Disabled, I::Press, Step::Stay),
        ];

        for (state, input, expected) in cases {
            assert_eq!(step(state, input), expected, "{state} on {input}");
        }
    }

    #[test]
    fn test_disabled_ignores_everything_but_default() {
        for input in ButtonInput::iter().filter(|i| *i != ButtonInput::Default) {
            assert_eq!(step(ButtonState::Disabled, input), Step::Stay);
        }
    }

    #[test]
    fn test_press_from_hover_pops_back_to_hover() {
        let mut fsm = ButtonStateMachine::new();
        let mut renderer = RecordingRenderer::default();

        fsm.fire(ButtonInput::Enter, false, &mut renderer);
        fsm.fire(ButtonInput::Press, false, &mut renderer);
        assert_eq!(fsm.current(), ButtonState::Pressed);
        assert_eq!(fsm.previous(), Some(ButtonState::Hover));

        let t = fsm.fire(ButtonInput::Release, false, &mut renderer).unwrap();
        assert_eq!(t.to, ButtonState::Hover);
        let t = fsm.fire(ButtonInput::Exit, false, &mut renderer).unwrap();
        assert_eq!(t.to, ButtonState::Default);
    }

    #[test]
    fn test_pop_on_empty_stack_falls_back_to_default() {
        let mut fsm = ButtonStateMachine::new();
        let mut renderer = RecordingRenderer::default();
        fsm.fire(ButtonInput::Disable, false, &mut renderer);
        fsm.fire(ButtonInput::Default, false, &mut renderer);
        // Default -> Pressed pushes Default, so releasing returns there
        fsm.fire(ButtonInput::Press, false, &mut renderer);
        fsm.fire(ButtonInput::Release, false, &mut renderer);
        assert_eq!(fsm.current(), ButtonState::Default);
        assert_eq!(fsm.previous(), None);
    }

    #[test]
    fn test_only_real_changes_are_surfaced() {
        let mut fsm = ButtonStateMachine::new();
        let mut renderer = RecordingRenderer::default();
        assert!(fsm.fire(ButtonInput::Exit, false, &mut renderer).is_none());
        assert!(fsm.fire(ButtonInput::Release, false, &mut renderer).is_none());
        assert!(renderer.calls.is_empty());

        assert!(fsm.fire(ButtonInput::Enter, false, &mut renderer).is_some());
        assert!(fsm.fire(ButtonInput::Enter, false, &mut renderer).is_none());
        assert_eq!(renderer.calls, vec![RenderAction::Hover]);
    }

    #[test]
    fn test_render_table() {
        let cases = [
            (ButtonState::Default, false, RenderAction::Default),
            (ButtonState::Default, true, RenderAction::Selected),
            (ButtonState::Hover, true, RenderAction::Hover),
            (ButtonState::Pressed, false, RenderAction::Hover),
            (ButtonState::Disabled, true, RenderAction::Disabled),
        ];
        for (state, selected, expected) in cases {
            assert_eq!(render_action(state, selected), expected);
        }
    }

    #[test]
    fn test_exit_from_hover_renders_selected_when_selected() {
        let mut fsm = ButtonStateMachine::new();
        let mut renderer = RecordingRenderer::default();
        fsm.fire(ButtonInput::Enter, true, &mut renderer);
        fsm.fire(ButtonInput::Exit, true, &mut renderer);
        assert_eq!(
            renderer.calls,
            vec![RenderAction::Hover, RenderAction::Selected]
        );
    }
}
