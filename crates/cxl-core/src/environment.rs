//! Variable frames and the function table.

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::FunctionDefinition;
use crate::value::Complex;

/// Variable bindings of one call, or of the top level.
pub type Frame = HashMap<String, Complex>;

/// Saved top-level state, see [`Environment::snapshot`].
#[derive(Debug, Clone)]
pub struct EnvironmentState {
    globals: Frame,
    functions: HashMap<String, Rc<FunctionDefinition>>,
}

/// Runtime environment.
///
/// Functions are shared by every frame. Variables live in the active frame
/// only: a call sees its own parameters and locals, never the caller's.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    functions: HashMap<String, Rc<FunctionDefinition>>,
    globals: Frame,
    /// Frames of the calls in progress, innermost last
    calls: Vec<Frame>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or replace a function.
    pub fn define(&mut self, definition: Rc<FunctionDefinition>) {
        self.functions.insert(definition.name.clone(), definition);
    }

    pub fn function(&self, name: &str) -> Option<Rc<FunctionDefinition>> {
        self.functions.get(name).cloned()
    }

    pub fn get(&self, name: &str) -> Option<Complex> {
        self.active().get(name).copied()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Complex) {
        self.active_mut().insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<Complex> {
        self.active_mut().remove(name)
    }

    /// Make `frame` the active frame.
    pub fn push_frame(&mut self, frame: Frame) {
        self.calls.push(frame);
    }

    /// Drop the active call frame; the caller's frame becomes active again.
    pub fn pop_frame(&mut self) -> Option<Frame> {
        self.calls.pop()
    }

    /// Number of calls in progress.
    pub fn call_depth(&self) -> usize {
        self.calls.len()
    }

    pub fn snapshot(&self) -> EnvironmentState {
        EnvironmentState {
            globals: self.globals.clone(),
            functions: self.functions.clone(),
        }
    }

    /// Return to a saved state. Calls in progress are dropped.
    pub fn restore(&mut self, state: EnvironmentState) {
        self.globals = state.globals;
        self.functions = state.functions;
        self.calls.clear();
    }

    fn active(&self) -> &Frame {
        self.calls.last().unwrap_or(&self.globals)
    }

    fn active_mut(&mut self) -> &mut Frame {
        match self.calls.last_mut() {
            Some(frame) => frame,
            None => &mut self.globals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Node;

    fn number(re: f64) -> Complex {
        Complex::real(re).unwrap()
    }

    #[test]
    fn test_call_frames_are_isolated() {
        let mut env = Environment::new();
        env.set("x", number(1.0));

        let mut frame = Frame::new();
        frame.insert("p".to_string(), number(2.0));
        env.push_frame(frame);
        assert_eq!(env.get("x"), None);
        assert_eq!(env.get("p"), Some(number(2.0)));
        env.set("local", number(3.0));
        assert_eq!(env.call_depth(), 1);

        env.pop_frame();
        assert_eq!(env.get("x"), Some(number(1.0)));
        assert_eq!(env.get("local"), None);
        assert_eq!(env.call_depth(), 0);
    }

    #[test]
    fn test_functions_are_visible_from_every_frame() {
        let mut env = Environment::new();
        env.define(Rc::new(FunctionDefinition {
            name: "f".into(),
            params: Vec::new(),
            body: Node::InstructionList(Vec::new()),
        }));
        env.push_frame(Frame::new());
        assert!(env.function("f").is_some());
        assert!(env.function("g").is_none());
    }

    #[test]
    fn test_restore_undoes_bindings_and_definitions() {
        let mut env = Environment::new();
        env.set("a", number(1.0));
        let saved = env.snapshot();

        env.set("a", number(5.0));
        env.set("b", number(6.0));
        env.define(Rc::new(FunctionDefinition {
            name: "f".into(),
            params: Vec::new(),
            body: Node::NoOp,
        }));
        env.push_frame(Frame::new());

        env.restore(saved);
        assert_eq!(env.call_depth(), 0);
        assert_eq!(env.get("a"), Some(number(1.0)));
        assert_eq!(env.get("b"), None);
        assert!(env.function("f").is_none());
    }
}
