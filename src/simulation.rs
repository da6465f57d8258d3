use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::agent::{Agent, AgentSnapshot};
use crate::collision;
use crate::config::SimConfig;
use crate::controller::Controller;
use crate::error::{GenerationError, SimError};
use crate::physics;
use crate::sensory;
use crate::track::TrackMap;
use crate::world::PlayArea;

/// Why a generation stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Termination {
    AllEliminated,
    TickBudget,
    Cancelled,
    /// A fatal query or controller error ended the run.
    Aborted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RunState {
    Running,
    Finished(Termination),
}

/// Cooperative cancellation flag, checked once per tick.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Population state after a completed tick.
#[derive(Clone, Debug, Serialize)]
pub struct TickSnapshot {
    pub generation: u64,
    pub tick: u32,
    pub alive: usize,
    pub agents: Vec<AgentSnapshot>,
}

/// Read-only subscriber to per-tick snapshots.
pub trait TickObserver {
    fn on_tick(&mut self, snapshot: &TickSnapshot);
}

impl<F: FnMut(&TickSnapshot)> TickObserver for F {
    fn on_tick(&mut self, snapshot: &TickSnapshot) {
        self(snapshot)
    }
}

/// Final result handed back to the optimizer.
#[derive(Clone, Debug, Serialize)]
pub struct GenerationOutcome {
    pub generation: u64,
    pub ticks: u32,
    pub termination: Termination,
    pub alive: usize,
    /// `(agent_index, final_fitness)` in population order.
    pub fitness: Vec<(usize, f32)>,
    pub agents: Vec<AgentSnapshot>,
}

impl GenerationOutcome {
    pub fn best(&self) -> Option<(usize, f32)> {
        self.fitness
            .iter()
            .copied()
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }
}

/// Shared, read-only evaluation context: track, config and stop signal.
pub struct GenerationRunner {
    track: Arc<TrackMap>,
    config: SimConfig,
    area: PlayArea,
    stop: StopSignal,
}

impl GenerationRunner {
    pub fn new(track: Arc<TrackMap>, config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let area = PlayArea::for_track(&track, &config);
        Ok(Self {
            track,
            config,
            area,
            stop: StopSignal::new(),
        })
    }

    /// Load the track image; failures surface before any agent exists.
    pub fn from_track_file(path: impl AsRef<Path>, config: SimConfig) -> Result<Self, SimError> {
        let track = TrackMap::load(path, config.border_color)?;
        info!(
            width = track.width(),
            height = track.height(),
            obstacles = track.obstacle_count(),
            "Loaded track"
        );
        Self::new(Arc::new(track), config)
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn track(&self) -> &Arc<TrackMap> {
        &self.track
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Build the per-generation state machine; one spawned agent per controller.
    pub fn start<C: Controller>(&self, generation: u64, controllers: Vec<C>) -> Generation<'_, C> {
        let agents = controllers
            .iter()
            .map(|_| Agent::spawn(&self.config))
            .collect();
        self.assemble(generation, agents, controllers)
    }

    /// Like [`start`](Self::start) but with caller-placed agents.
    pub fn start_from<C: Controller>(
        &self,
        generation: u64,
        agents: Vec<Agent>,
        controllers: Vec<C>,
    ) -> Result<Generation<'_, C>, SimError> {
        if agents.len() != controllers.len() {
            return Err(SimError::InvalidConfig(format!(
                "{} agents but {} controllers",
                agents.len(),
                controllers.len()
            )));
        }
        Ok(self.assemble(generation, agents, controllers))
    }

    fn assemble<C: Controller>(
        &self,
        generation: u64,
        agents: Vec<Agent>,
        controllers: Vec<C>,
    ) -> Generation<'_, C> {
        let alive = agents.iter().filter(|a| a.alive).count();
        Generation {
            runner: self,
            generation,
            agents,
            controllers,
            tick: 0,
            alive,
            state: RunState::Running,
        }
    }

    /// Run one generation to completion.
    ///
    /// The stop signal stays raised until [`StopSignal::reset`] is called; while
    /// it is up every generation ends as [`Termination::Cancelled`] before its
    /// first tick, so its zero fitness must not be taken as a score.
    pub fn evaluate<C: Controller>(
        &self,
        generation: u64,
        controllers: Vec<C>,
    ) -> Result<GenerationOutcome, GenerationError> {
        self.evaluate_observed(generation, controllers, &mut |_: &TickSnapshot| {})
    }

    pub fn evaluate_observed<C: Controller, O: TickObserver + ?Sized>(
        &self,
        generation: u64,
        controllers: Vec<C>,
        observer: &mut O,
    ) -> Result<GenerationOutcome, GenerationError> {
        let mut run = self.start(generation, controllers);
        while run.state == RunState::Running {
            run.step()?;
            if run.state != RunState::Finished(Termination::Cancelled) {
                observer.on_tick(&run.snapshot());
            }
        }
        Ok(run.outcome())
    }
}

/// What happened to one agent during a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AgentTick {
    Frozen,
    Survived,
    Eliminated,
}

/// Sense, decide, act, move, collide, score, for one live agent.
fn tick_agent<C: Controller>(
    agent: &mut Agent,
    controller: &mut C,
    track: &TrackMap,
    area: &PlayArea,
    config: &SimConfig,
) -> Result<AgentTick, SimError> {
    if !agent.alive {
        return Ok(AgentTick::Frozen);
    }
    let reading = sensory::sense(agent, track, config)?;
    let action = controller.select_action(&reading)?;
    physics::apply_action(agent, action, config);
    physics::advance(agent, area, config);
    if collision::check_collision(agent, track, config)? {
        agent.fitness = agent.reward(config);
        Ok(AgentTick::Survived)
    } else {
        Ok(AgentTick::Eliminated)
    }
}

/// One generation's agents and controllers, advanced tick by tick.
pub struct Generation<'a, C> {
    runner: &'a GenerationRunner,
    generation: u64,
    agents: Vec<Agent>,
    controllers: Vec<C>,
    tick: u32,
    alive: usize,
    state: RunState,
}

impl<'a, C: Controller> Generation<'a, C> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn alive_count(&self) -> usize {
        self.alive
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Advance every live agent by one tick. A finished generation is left untouched.
    pub fn step(&mut self) -> Result<RunState, GenerationError> {
        if self.state != RunState::Running {
            return Ok(self.state);
        }
        if self.runner.stop.is_raised() {
            if self.tick == 0 {
                warn!(
                    generation = self.generation,
                    "Stop signal still raised; generation cancelled before its first tick"
                );
            } else {
                warn!(
                    generation = self.generation,
                    tick = self.tick,
                    alive = self.alive,
                    "Stop requested; finishing generation early"
                );
            }
            self.state = RunState::Finished(Termination::Cancelled);
            return Ok(self.state);
        }

        let tick_no = self.tick + 1;
        let results = self.sweep();

        let mut alive = 0;
        for (idx, result) in results.into_iter().enumerate() {
            match result {
                Ok(AgentTick::Survived) => alive += 1,
                Ok(AgentTick::Eliminated) => {
                    let agent = &mut self.agents[idx];
                    agent.died_at = Some(tick_no);
                    debug!(
                        generation = self.generation,
                        tick = tick_no,
                        agent = idx,
                        fitness = agent.fitness,
                        "Agent eliminated"
                    );
                }
                Ok(AgentTick::Frozen) => {}
                Err(source) => {
                    self.state = RunState::Finished(Termination::Aborted);
                    error!(
                        generation = self.generation,
                        tick = tick_no,
                        agent = idx,
                        kind = source.kind(),
                        "Generation aborted"
                    );
                    return Err(GenerationError {
                        generation: self.generation,
                        tick: tick_no,
                        agent: Some(idx),
                        source,
                    });
                }
            }
        }

        self.tick = tick_no;
        self.alive = alive;

        if alive == 0 {
            self.finish(Termination::AllEliminated);
        } else if self.tick >= self.runner.config.tick_budget {
            self.finish(Termination::TickBudget);
        }
        Ok(self.state)
    }

    fn sweep(&mut self) -> Vec<Result<AgentTick, SimError>> {
        let runner = self.runner;
        let track = runner.track.as_ref();
        let (area, config) = (&runner.area, &runner.config);
        if config.parallel {
            self.agents
                .par_iter_mut()
                .zip(self.controllers.par_iter_mut())
                .map(|(agent, ctrl)| tick_agent(agent, ctrl, track, area, config))
                .collect()
        } else {
            self.agents
                .iter_mut()
                .zip(self.controllers.iter_mut())
                .map(|(agent, ctrl)| tick_agent(agent, ctrl, track, area, config))
                .collect()
        }
    }

    fn finish(&mut self, termination: Termination) {
        self.state = RunState::Finished(termination);
        let best = self
            .agents
            .iter()
            .map(|a| a.fitness)
            .fold(0.0f32, f32::max);
        info!(
            generation = self.generation,
            ticks = self.tick,
            alive = self.alive,
            best_fitness = best,
            termination = ?termination,
            "Generation finished"
        );
    }

    pub fn snapshot(&self) -> TickSnapshot {
        TickSnapshot {
            generation: self.generation,
            tick: self.tick,
            alive: self.alive,
            agents: self
                .agents
                .iter()
                .enumerate()
                .map(|(i, a)| a.snapshot(i))
                .collect(),
        }
    }

    /// Fitness accrued so far for every agent, alive or not.
    pub fn outcome(&self) -> GenerationOutcome {
        let termination = match self.state {
            RunState::Finished(t) => t,
            RunState::Running => Termination::Cancelled,
        };
        GenerationOutcome {
            generation: self.generation,
            ticks: self.tick,
            termination,
            alive: self.alive,
            fitness: self
                .agents
                .iter()
                .enumerate()
                .map(|(i, a)| (i, a.fitness))
                .collect(),
            agents: self
                .agents
                .iter()
                .enumerate()
                .map(|(i, a)| a.snapshot(i))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Action, SensorReading};
    use crate::controller::{FeedForwardController, FnController, ScriptedController};
    use ::rand::SeedableRng;
    use macroquad::prelude::*;
    use rand_chacha::ChaCha8Rng;

    fn runner(track: TrackMap, config: SimConfig) -> GenerationRunner {
        GenerationRunner::new(Arc::new(track), config).expect("valid config")
    }

    /// Free track with a border frame and a square island in the middle.
    fn ring_track() -> TrackMap {
        TrackMap::from_fn(1000, 1000, |x, y| {
            x < 5 || y < 5 || x > 994 || y > 994 || ((350..650).contains(&x) && (350..650).contains(&y))
        })
    }

    fn ring_config(parallel: bool) -> SimConfig {
        SimConfig {
            spawn_x: 100.0,
            spawn_y: 150.0,
            clamp_y_to_width: false,
            tick_budget: 300,
            parallel,
            ..SimConfig::default()
        }
    }

    #[test]
    fn speed_up_scenario_accumulates_expected_distance() {
        let config = SimConfig {
            tick_budget: 10,
            ..SimConfig::default()
        };
        let runner = runner(TrackMap::open(1600, 1600), config);
        let outcome = runner
            .evaluate(1, vec![ScriptedController::constant(Action::SpeedUp)])
            .unwrap();

        assert_eq!(outcome.termination, Termination::TickBudget);
        assert_eq!(outcome.ticks, 10);
        let expected: f32 = (0..10).map(|k| 20.0 + 2.0 * k as f32).sum();
        assert_eq!(expected, 290.0);
        assert_eq!(outcome.fitness, vec![(0, 290.0 / 30.0)]);
        assert_eq!(outcome.agents[0].pos, (830.0 + 290.0, 920.0));
    }

    #[test]
    fn agent_next_to_border_dies_and_freezes() {
        let config = SimConfig {
            tick_budget: 5,
            ..SimConfig::default()
        };
        // Solid border from x = 527, one unit past the front corners at x = 525.98,
        // inside a frame that keeps every ray on the raster.
        let track = TrackMap::from_fn(1000, 1000, |x, y| x >= 527 || x < 5 || y < 5 || y > 994);
        let runner = runner(track, config.clone());

        // Agent 1 drives up the screen, away from the border, and keeps the run going.
        let agents = vec![
            Agent::at(vec2(470.0, 470.0), 0.0, &config),
            Agent::at(vec2(100.0, 470.0), 90.0, &config),
        ];
        let controllers = vec![ScriptedController::constant(Action::SpeedUp); 2];
        let mut run = runner.start_from(0, agents, controllers).unwrap();
        run.step().unwrap();
        let frozen = run.agents()[0].clone();
        assert!(!frozen.alive);
        assert_eq!(frozen.died_at, Some(1));
        assert_eq!(frozen.fitness, 0.0);
        assert_eq!(run.alive_count(), 1);

        while run.state() == RunState::Running {
            run.step().unwrap();
            let now = &run.agents()[0];
            assert_eq!(now.pos, frozen.pos);
            assert_eq!(now.heading, frozen.heading);
            assert_eq!(now.speed, frozen.speed);
            assert_eq!(now.fitness, frozen.fitness);
        }
        assert_eq!(run.state(), RunState::Finished(Termination::TickBudget));
        assert!(run.agents()[1].alive);
        assert!(run.agents()[1].fitness > 0.0);
    }

    #[test]
    fn mismatched_population_is_rejected() {
        let runner = runner(ring_track(), ring_config(false));
        let agents = vec![Agent::spawn(runner.config())];
        let err = runner
            .start_from(0, agents, Vec::<ScriptedController>::new())
            .err()
            .expect("length mismatch");
        assert!(matches!(err, SimError::InvalidConfig(_)));
    }

    #[test]
    fn boxed_in_population_finishes_after_one_tick() {
        let config = SimConfig {
            spawn_x: 50.0,
            spawn_y: 50.0,
            ..SimConfig::default()
        };
        let runner = runner(TrackMap::from_fn(200, 200, |_, _| true), config);
        let controllers = vec![ScriptedController::constant(Action::SpeedUp); 3];
        let outcome = runner.evaluate(4, controllers).unwrap();

        assert_eq!(outcome.termination, Termination::AllEliminated);
        assert_eq!(outcome.ticks, 1);
        assert_eq!(outcome.alive, 0);
        assert_eq!(outcome.fitness, vec![(0, 0.0), (1, 0.0), (2, 0.0)]);
    }

    fn seeded_population(seed: u64, count: usize) -> Vec<FeedForwardController> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..count)
            .map(|_| FeedForwardController::random(6, &mut rng))
            .collect()
    }

    #[test]
    fn evaluation_is_deterministic() {
        let track = Arc::new(ring_track());
        let a = GenerationRunner::new(Arc::clone(&track), ring_config(false)).unwrap();
        let b = GenerationRunner::new(track, ring_config(false)).unwrap();

        let first = a.evaluate(0, seeded_population(11, 12)).unwrap();
        let second = b.evaluate(0, seeded_population(11, 12)).unwrap();

        assert_eq!(first.ticks, second.ticks);
        for (x, y) in first.fitness.iter().zip(&second.fitness) {
            assert_eq!(x.1.to_bits(), y.1.to_bits());
        }
        assert_eq!(first.agents, second.agents);
    }

    #[test]
    fn parallel_sweep_matches_sequential() {
        let track = Arc::new(ring_track());
        let seq = GenerationRunner::new(Arc::clone(&track), ring_config(false)).unwrap();
        let par = GenerationRunner::new(track, ring_config(true)).unwrap();

        let a = seq.evaluate(2, seeded_population(5, 16)).unwrap();
        let b = par.evaluate(2, seeded_population(5, 16)).unwrap();

        assert_eq!(a.termination, b.termination);
        assert_eq!(a.ticks, b.ticks);
        assert_eq!(a.fitness, b.fitness);
        assert_eq!(a.agents, b.agents);
    }

    #[test]
    fn fitness_never_decreases_and_readings_stay_bounded() {
        let runner = runner(ring_track(), ring_config(false));
        let mut last: Vec<f32> = vec![0.0; 10];
        let mut ticks_seen = 0;
        let mut observer = |snap: &TickSnapshot| {
            ticks_seen += 1;
            for agent in &snap.agents {
                assert!(agent.fitness >= last[agent.index]);
                last[agent.index] = agent.fitness;
                assert!(agent.reading.iter().all(|v| *v <= 10));
            }
        };
        let outcome = runner
            .evaluate_observed(0, seeded_population(99, 10), &mut observer)
            .unwrap();
        assert_eq!(ticks_seen, outcome.ticks);
    }

    #[test]
    fn raised_stop_signal_cancels_before_next_tick() {
        let runner = runner(ring_track(), ring_config(false));
        let stop = runner.stop_signal();

        let mut run = runner.start(0, vec![ScriptedController::constant(Action::TurnLeft); 2]);
        for _ in 0..3 {
            run.step().unwrap();
        }
        let before = run.outcome();
        stop.raise();
        assert_eq!(
            run.step().unwrap(),
            RunState::Finished(Termination::Cancelled)
        );
        let after = run.outcome();
        assert_eq!(after.ticks, 3);
        assert_eq!(after.fitness, before.fitness);
        assert_eq!(after.termination, Termination::Cancelled);

        // Finished runs ignore further steps.
        stop.reset();
        assert_eq!(
            run.step().unwrap(),
            RunState::Finished(Termination::Cancelled)
        );
        assert_eq!(run.tick(), 3);
    }

    #[test]
    fn invalid_action_aborts_with_location() {
        let runner = runner(ring_track(), ring_config(false));
        let controllers: Vec<Box<dyn Controller>> = vec![
            Box::new(ScriptedController::constant(Action::SpeedUp)),
            Box::new(FnController::new(|_: &SensorReading| 9)),
        ];
        let err = runner.evaluate(6, controllers).unwrap_err();
        assert_eq!(err.generation, 6);
        assert_eq!(err.tick, 1);
        assert_eq!(err.agent, Some(1));
        assert!(matches!(err.source, SimError::InvalidAction { index: 9 }));
    }

    #[test]
    fn parallel_sweep_reports_lowest_failing_agent() {
        let runner = runner(ring_track(), ring_config(true));
        for _ in 0..10 {
            let controllers: Vec<Box<dyn Controller>> = vec![
                Box::new(ScriptedController::constant(Action::SpeedUp)),
                Box::new(FnController::new(|_: &SensorReading| 7)),
                Box::new(ScriptedController::constant(Action::TurnLeft)),
                Box::new(FnController::new(|_: &SensorReading| 9)),
            ];
            let err = runner.evaluate(2, controllers).unwrap_err();
            assert_eq!(err.tick, 1);
            assert_eq!(err.agent, Some(1));
            assert!(matches!(err.source, SimError::InvalidAction { index: 7 }));
        }
    }

    #[test]
    fn raised_signal_persists_across_generations_until_reset() {
        let runner = runner(ring_track(), ring_config(false));
        let stop = runner.stop_signal();
        stop.raise();
        for generation in 0..2 {
            let outcome = runner
                .evaluate(generation, vec![ScriptedController::constant(Action::SpeedUp)])
                .unwrap();
            assert_eq!(outcome.termination, Termination::Cancelled);
            assert_eq!(outcome.ticks, 0);
            assert_eq!(outcome.fitness, vec![(0, 0.0)]);
        }

        stop.reset();
        let outcome = runner
            .evaluate(2, vec![ScriptedController::constant(Action::SpeedUp)])
            .unwrap();
        assert_ne!(outcome.termination, Termination::Cancelled);
        assert!(outcome.ticks > 0);
        assert!(outcome.fitness[0].1 > 0.0);
    }

    #[test]
    fn sensor_past_raster_is_fatal() {
        // Heading down a small open map: the side-facing sensor leaves the raster.
        let config = SimConfig {
            spawn_x: 100.0,
            spawn_y: 100.0,
            spawn_heading: -90.0,
            ..SimConfig::default()
        };
        let runner = runner(TrackMap::open(400, 300), config);
        let err = runner
            .evaluate(0, vec![ScriptedController::constant(Action::SpeedUp)])
            .unwrap_err();
        assert_eq!(err.tick, 1);
        assert!(matches!(err.source, SimError::OutOfBoundsQuery { .. }));
    }

    #[test]
    fn spawned_agents_start_at_the_same_pose() {
        let runner = runner(ring_track(), ring_config(false));
        let run = runner.start(0, seeded_population(1, 4));
        assert_eq!(run.alive_count(), 4);
        assert_eq!(run.state(), RunState::Running);
        for agent in run.agents() {
            assert_eq!(agent.pos, vec2(100.0, 150.0));
        }
    }
}
