use ::rand::Rng;

use crate::agent::{Action, SensorReading};
use crate::config;
use crate::error::SimError;

/// Decision unit driving one agent: sensor reading in, action out.
pub trait Controller: Send {
    fn select_action(&mut self, reading: &SensorReading) -> Result<Action, SimError>;
}

impl<C: Controller + ?Sized> Controller for Box<C> {
    fn select_action(&mut self, reading: &SensorReading) -> Result<Action, SimError> {
        (**self).select_action(reading)
    }
}

pub const CONTROLLER_INPUTS: usize = config::NUM_SENSOR_RAYS;
pub const CONTROLLER_OUTPUTS: usize = Action::ALL.len();

/// Dense two-layer network; the strongest output neuron picks the action.
#[derive(Clone, Debug)]
pub struct FeedForwardController {
    hidden: usize,
    /// Row-major input->hidden weights, then hidden biases,
    /// then row-major hidden->output weights, then output biases.
    weights: Vec<f32>,
}

impl FeedForwardController {
    pub fn weight_count(hidden: usize) -> usize {
        hidden * CONTROLLER_INPUTS + hidden + CONTROLLER_OUTPUTS * hidden + CONTROLLER_OUTPUTS
    }

    pub fn from_weights(hidden: usize, weights: Vec<f32>) -> Result<Self, SimError> {
        let expected = Self::weight_count(hidden);
        if hidden == 0 || weights.len() != expected {
            return Err(SimError::InvalidConfig(format!(
                "controller with {hidden} hidden neurons needs {expected} weights, got {}",
                weights.len()
            )));
        }
        Ok(Self { hidden, weights })
    }

    pub fn random(hidden: usize, rng: &mut impl Rng) -> Self {
        let hidden = hidden.max(1);
        let weights = (0..Self::weight_count(hidden))
            .map(|_| rng.gen_range(-1.0..1.0))
            .collect();
        Self { hidden, weights }
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Raw output activations for a reading.
    pub fn activate(&self, reading: &SensorReading) -> [f32; CONTROLLER_OUTPUTS] {
        let n = self.hidden;
        let (w_in, rest) = self.weights.split_at(n * CONTROLLER_INPUTS);
        let (b_hidden, rest) = rest.split_at(n);
        let (w_out, b_out) = rest.split_at(CONTROLLER_OUTPUTS * n);

        let mut hidden = vec![0.0f32; n];
        for (h, value) in hidden.iter_mut().enumerate() {
            let row = &w_in[h * CONTROLLER_INPUTS..(h + 1) * CONTROLLER_INPUTS];
            let sum: f32 = row
                .iter()
                .zip(reading.iter())
                .map(|(w, r)| w * *r as f32)
                .sum();
            *value = (sum + b_hidden[h]).tanh();
        }

        let mut outputs = [0.0f32; CONTROLLER_OUTPUTS];
        for (o, value) in outputs.iter_mut().enumerate() {
            let row = &w_out[o * n..(o + 1) * n];
            let sum: f32 = row.iter().zip(hidden.iter()).map(|(w, h)| w * h).sum();
            *value = (sum + b_out[o]).tanh();
        }
        outputs
    }
}

/// Independent random controllers, one per population member.
pub fn random_population(
    count: usize,
    hidden: usize,
    rng: &mut impl Rng,
) -> Vec<FeedForwardController> {
    (0..count)
        .map(|_| FeedForwardController::random(hidden, rng))
        .collect()
}

/// Index of the largest output; ties resolve to the lowest index.
pub fn argmax(outputs: &[f32]) -> usize {
    let mut best = 0;
    for (i, v) in outputs.iter().enumerate() {
        if *v > outputs[best] {
            best = i;
        }
    }
    best
}

impl Controller for FeedForwardController {
    fn select_action(&mut self, reading: &SensorReading) -> Result<Action, SimError> {
        Action::from_index(argmax(&self.activate(reading)))
    }
}

/// Replays a fixed action list, then holds the last action.
#[derive(Clone, Debug)]
pub struct ScriptedController {
    actions: Vec<Action>,
    cursor: usize,
}

impl ScriptedController {
    pub fn new(actions: Vec<Action>) -> Result<Self, SimError> {
        if actions.is_empty() {
            return Err(SimError::InvalidConfig(
                "scripted controller needs at least one action".to_string(),
            ));
        }
        Ok(Self { actions, cursor: 0 })
    }

    pub fn constant(action: Action) -> Self {
        Self {
            actions: vec![action],
            cursor: 0,
        }
    }
}

impl Controller for ScriptedController {
    fn select_action(&mut self, _reading: &SensorReading) -> Result<Action, SimError> {
        let idx = self.cursor.min(self.actions.len() - 1);
        self.cursor = self.cursor.saturating_add(1);
        Ok(self.actions[idx])
    }
}

/// Adapts a closure that picks an output index.
pub struct FnController<F> {
    pick: F,
}

impl<F> FnController<F>
where
    F: FnMut(&SensorReading) -> usize + Send,
{
    pub fn new(pick: F) -> Self {
        Self { pick }
    }
}

impl<F> Controller for FnController<F>
where
    F: FnMut(&SensorReading) -> usize + Send,
{
    fn select_action(&mut self, reading: &SensorReading) -> Result<Action, SimError> {
        Action::from_index((self.pick)(reading))
    }
}
