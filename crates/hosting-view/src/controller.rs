use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::task::Waker;

use hosting_core::{
    compute_layout, AnalyticsListener, AppliedGeneration, BuildEngine, BuildError, BuildInputs,
    BuildMode, BuildResult, BuildWorker, ComponentProvider, Generation, GenerationCounter,
    GenerationState, InlineWorker, NoopListener, PredicateSet, ScopeId, ScopeRoot, SizeRange,
    SizeRangeProvider, StateUpdate, StateUpdateQueue,
};
use hosting_mount::{MountCoordinator, MountStats, ViewContainer, ViewId};
use hosting_ui_graphics::{Point, Rect, Size};
use log::{debug, error, warn};

use crate::ledger::GenerationLedger;
use crate::{HostingError, HostingOptions};

type Completed = (Generation, Result<BuildResult, BuildError>);

/// State shared with builds running on worker threads.
struct Shared {
    generations: GenerationCounter,
    applied: Arc<AppliedGeneration>,
    completed: Mutex<VecDeque<Completed>>,
    ledger: Mutex<GenerationLedger>,
    waker: Mutex<Option<Waker>>,
    listener: Arc<dyn AnalyticsListener>,
}

impl Shared {
    fn mark(&self, generation: Generation, state: GenerationState) {
        self.ledger.lock().unwrap().set(generation, state);
    }

    fn supersede(&self, generation: Generation) {
        let newest = self.generations.highest();
        warn!("discarding generation {generation}: generation {newest} was requested since");
        self.mark(generation, GenerationState::Superseded);
        self.listener.result_superseded(generation, newest);
    }

    fn fail(&self, generation: Generation, err: &BuildError) {
        error!("build {generation} failed: {err}");
        self.mark(generation, GenerationState::Superseded);
        self.listener.build_failed(generation, err);
    }

    fn complete(&self, generation: Generation, outcome: Result<BuildResult, BuildError>) {
        self.completed.lock().unwrap().push_back((generation, outcome));
        let waker = self.waker.lock().unwrap().clone();
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

/// Hosts one component hierarchy inside a view container.
///
/// Every update allocates a generation. Builds run inline or on the
/// configured [`BuildWorker`]; a finished build is mounted only while its
/// generation is still the newest one requested, so the last request wins
/// regardless of which build finishes last. Mounting and everything that
/// touches the container happens on the thread that created the controller.
pub struct HostingController<M, C, V> {
    engine: BuildEngine<M, C>,
    size_ranges: Box<dyn SizeRangeProvider>,
    worker: Arc<dyn BuildWorker>,
    options: HostingOptions,
    shared: Arc<Shared>,
    mount: MountCoordinator,
    container: V,
    model: Option<Arc<M>>,
    context: Arc<C>,
    bounds: Option<Size>,
    /// Size range of the newest build started.
    requested_range: Option<SizeRange>,
    state_updates: StateUpdateQueue,
    /// Newest request still waiting for a size to build against.
    deferred: Option<Generation>,
    empty_root: ScopeRoot,
}

impl<M, C, V> HostingController<M, C, V>
where
    M: Send + Sync + 'static,
    C: Send + Sync + 'static,
    V: ViewContainer,
{
    /// Creates a controller bound to the calling (rendering) thread.
    ///
    /// Nothing is built until the first model arrives.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        provider: impl ComponentProvider<M, C>,
        size_ranges: impl SizeRangeProvider,
        context: C,
        predicates: PredicateSet,
        listener: Option<Arc<dyn AnalyticsListener>>,
        options: HostingOptions,
        worker: Option<Arc<dyn BuildWorker>>,
        container: V,
    ) -> Self {
        let applied = Arc::new(AppliedGeneration::new());
        let shared = Arc::new(Shared {
            generations: GenerationCounter::new(),
            applied: Arc::clone(&applied),
            completed: Mutex::new(VecDeque::new()),
            ledger: Mutex::new(GenerationLedger::new()),
            waker: Mutex::new(None),
            listener: listener.unwrap_or_else(|| Arc::new(NoopListener)),
        });
        Self {
            engine: BuildEngine::new(provider, predicates, options.collision_policy),
            size_ranges: Box::new(size_ranges),
            worker: worker.unwrap_or_else(|| Arc::new(InlineWorker)),
            options,
            shared,
            mount: MountCoordinator::with_applied(applied),
            container,
            model: None,
            context: Arc::new(context),
            bounds: None,
            requested_range: None,
            state_updates: StateUpdateQueue::new(),
            deferred: None,
            empty_root: ScopeRoot::empty(),
        }
    }

    pub fn options(&self) -> &HostingOptions {
        &self.options
    }

    pub fn engine(&self) -> &BuildEngine<M, C> {
        &self.engine
    }

    pub fn model(&self) -> Option<&M> {
        self.model.as_deref()
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    /// The container the hierarchy is mounted into.
    pub fn container_view(&self) -> &V {
        &self.container
    }

    pub fn bounds(&self) -> Option<Size> {
        self.bounds
    }

    /// Replaces the model and requests a rebuild.
    pub fn update_model(&mut self, model: M, mode: BuildMode) -> Result<Generation, HostingError> {
        self.model = Some(Arc::new(model));
        self.request(mode)
    }

    /// Replaces the context and requests a rebuild. Without a model the
    /// context is kept for the first build and `NoModel` is returned.
    pub fn update_context(&mut self, context: C, mode: BuildMode) -> Result<Generation, HostingError> {
        self.context = Arc::new(context);
        self.request(mode)
    }

    /// Queues `update` against the state of `scope` and requests a rebuild.
    ///
    /// Updates stay queued until a build that consumed them is mounted, so
    /// a superseded build never loses one.
    pub fn update_state<T, F>(&mut self, scope: ScopeId, update: F, mode: BuildMode) -> Result<Generation, HostingError>
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> T + Send + Sync + 'static,
    {
        if self.model.is_none() {
            return Err(HostingError::NoModel);
        }
        let sequence = self.state_updates.push::<T, F>(scope, update);
        debug!("queued state update {sequence} for {scope}");
        self.request(mode)
    }

    /// Records the measured bounds.
    ///
    /// A request that was waiting for a size is built now, synchronously. A
    /// change of size range rebuilds the current model.
    pub fn set_bounds(&mut self, size: Size) -> Result<Option<Generation>, HostingError> {
        self.mount.render_thread().assert_current("HostingController::set_bounds");
        self.bounds = Some(size);
        if let Some(generation) = self.deferred.take() {
            if !self.shared.generations.is_latest(generation) {
                self.shared.supersede(generation);
                return Ok(None);
            }
            let model = self.model.clone().ok_or(HostingError::NoModel)?;
            self.build_sync(generation, model, size)?;
            return Ok(Some(generation));
        }
        let Some(model) = self.model.clone() else {
            return Ok(None);
        };
        if self.requested_range == Some(self.size_ranges.size_range(size)) {
            return Ok(None);
        }
        let generation = self.allocate();
        self.build_sync(generation, model, size)?;
        Ok(Some(generation))
    }

    /// Mounts the newest finished asynchronous build, if it is still the
    /// newest request. Older finished builds are discarded.
    pub fn process_completed(&mut self) -> Result<Option<MountStats>, HostingError> {
        self.mount
            .render_thread()
            .assert_current("HostingController::process_completed");
        let finished: Vec<Completed> = self.shared.completed.lock().unwrap().drain(..).collect();
        if finished.is_empty() {
            return Ok(None);
        }
        let mut winner = None;
        let mut failure = None;
        for (generation, outcome) in finished {
            let latest = self.shared.generations.is_latest(generation);
            match outcome {
                Ok(result) if latest => winner = Some(result),
                Ok(_) => self.shared.supersede(generation),
                Err(err) if latest => failure = Some(err),
                Err(_) => {}
            }
        }
        if let Some(result) = winner {
            return self.admit(result);
        }
        match failure {
            Some(err) => Err(HostingError::Build(err)),
            None => Ok(None),
        }
    }

    /// Mounts a result built elsewhere, under the same newest-wins rule as
    /// the controller's own builds. Returns `None` when it was discarded.
    ///
    /// A result whose generation this controller already knows is discarded
    /// unless it is the mounted result itself; each generation is applied at
    /// most once.
    pub fn apply_result(&mut self, result: BuildResult) -> Result<Option<MountStats>, HostingError> {
        self.mount
            .render_thread()
            .assert_current("HostingController::apply_result");
        if self.mount.current().is_some_and(|current| current.ptr_eq(&result)) {
            return self.admit(result);
        }
        let generation = result.generation();
        let known = self.shared.ledger.lock().unwrap().get(generation);
        if let Some(state) = known {
            let newest = self.shared.generations.highest();
            warn!("discarding external result for generation {generation}: already {state:?}");
            self.shared.listener.result_superseded(generation, newest);
            return Ok(None);
        }
        self.shared.generations.observe(generation);
        self.shared.mark(generation, GenerationState::Building);
        self.admit(result)
    }

    /// Size of the mounted tree laid out for `size`. Does not rebuild.
    pub fn size_that_fits(&self, size: Size) -> Size {
        let Some(current) = self.mount.current() else {
            return Size::ZERO;
        };
        let range = self.size_ranges.size_range(size);
        compute_layout(current.tree(), range.to_constraints()).size()
    }

    /// The mounted view under `point`.
    ///
    /// Points inside the container that miss every mounted view hit the
    /// container itself, unless tap passthrough is enabled.
    pub fn hit_test(&self, point: Point) -> Option<ViewId> {
        if let Some(hit) = self.mount.hit_test(point) {
            return Some(hit.view);
        }
        if self.options.allow_tap_passthrough {
            return None;
        }
        let size = self
            .bounds
            .or(self.options.initial_size)
            .or_else(|| self.mount.current().map(|current| current.layout().size()))?;
        Rect::new(Point::ZERO, size)
            .contains(point)
            .then(|| self.container.root())
    }

    /// Where `generation` is in its lifecycle. `Idle` for generations not yet
    /// requested, `None` for generations no longer tracked.
    pub fn generation_state(&self, generation: Generation) -> Option<GenerationState> {
        if generation > self.shared.generations.highest() {
            return Some(GenerationState::Idle);
        }
        self.shared.ledger.lock().unwrap().get(generation)
    }

    /// Newest generation requested or observed.
    pub fn latest_generation(&self) -> Generation {
        self.shared.generations.highest()
    }

    pub fn last_applied_generation(&self) -> Generation {
        self.shared.applied.get()
    }

    pub fn current_result(&self) -> Option<&BuildResult> {
        self.mount.current()
    }

    /// Scope root of the mounted result; the empty root before the first mount.
    pub fn applied_root(&self) -> &ScopeRoot {
        self.mount
            .current()
            .map(BuildResult::scope_root)
            .unwrap_or(&self.empty_root)
    }

    pub fn pending_state_updates(&self) -> usize {
        self.state_updates.len()
    }

    /// Woken, from the worker thread, whenever an asynchronous build finishes.
    pub fn set_render_waker(&self, waker: Waker) {
        *self.shared.waker.lock().unwrap() = Some(waker);
    }

    fn allocate(&self) -> Generation {
        let generation = self.shared.generations.next();
        self.shared.mark(generation, GenerationState::Requested);
        generation
    }

    fn bounding_size(&self) -> Option<Size> {
        self.bounds.or(self.options.initial_size)
    }

    fn request(&mut self, mode: BuildMode) -> Result<Generation, HostingError> {
        let Some(model) = self.model.clone() else {
            return Err(HostingError::NoModel);
        };
        let generation = self.allocate();
        let Some(size) = self.bounding_size() else {
            debug!("generation {generation} waits for bounds");
            if let Some(older) = self.deferred.replace(generation) {
                self.shared.supersede(older);
            }
            return Ok(generation);
        };
        match mode {
            BuildMode::Synchronous => {
                self.build_sync(generation, model, size)?;
            }
            BuildMode::Asynchronous => self.dispatch(generation, model, size),
        }
        Ok(generation)
    }

    fn build_sync(&mut self, generation: Generation, model: Arc<M>, size: Size) -> Result<Option<MountStats>, HostingError> {
        self.shared.mark(generation, GenerationState::Building);
        self.shared.listener.will_build(generation);
        let updates = self.state_updates.snapshot();
        let size_range = self.size_ranges.size_range(size);
        self.requested_range = Some(size_range);
        let outcome = self.engine.build_with(BuildInputs {
            model: &model,
            context: &self.context,
            size_range,
            previous: self.applied_root(),
            generation,
            state_updates: &updates,
        });
        match outcome {
            Ok(result) => {
                self.shared.listener.did_build(&result);
                self.admit(result)
            }
            Err(err) => {
                self.shared.fail(generation, &err);
                Err(HostingError::Build(err))
            }
        }
    }

    fn dispatch(&mut self, generation: Generation, model: Arc<M>, size: Size) {
        self.shared.mark(generation, GenerationState::Building);
        let engine = self.engine.clone();
        let shared = Arc::clone(&self.shared);
        let context = Arc::clone(&self.context);
        let previous = self.applied_root().clone();
        let updates: Arc<[StateUpdate]> = self.state_updates.snapshot();
        let size_range = self.size_ranges.size_range(size);
        self.requested_range = Some(size_range);
        debug!("dispatching build {generation} at {size}");
        self.worker.submit(Box::new(move || {
            shared.listener.will_build(generation);
            let outcome = engine.build_with(BuildInputs {
                model: &model,
                context: &context,
                size_range,
                previous: &previous,
                generation,
                state_updates: &updates,
            });
            match &outcome {
                Ok(result) => shared.listener.did_build(result),
                Err(err) => shared.fail(generation, err),
            }
            shared.complete(generation, outcome);
        }));
    }

    fn admit(&mut self, result: BuildResult) -> Result<Option<MountStats>, HostingError> {
        if self.mount.current().is_some_and(|current| current.ptr_eq(&result)) {
            return Ok(Some(self.mount.apply(&result, &mut self.container)?));
        }
        let generation = result.generation();
        if !self.shared.generations.is_latest(generation) || generation <= self.shared.applied.get() {
            self.shared.supersede(generation);
            return Ok(None);
        }
        self.shared.mark(generation, GenerationState::Ready);
        self.shared.listener.will_mount(&result);
        match self.mount.apply(&result, &mut self.container) {
            Ok(stats) => {
                self.shared.mark(generation, GenerationState::Applied);
                self.shared.listener.did_mount(&result);
                if let Some(sequence) = result.state_updates_through() {
                    self.state_updates.acknowledge(sequence);
                }
                Ok(Some(stats))
            }
            Err(err) => {
                error!("mounting generation {generation} failed: {err}");
                self.shared.mark(generation, GenerationState::Superseded);
                Err(HostingError::Mount(err))
            }
        }
    }
}

impl<M, C, V> fmt::Debug for HostingController<M, C, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostingController")
            .field("options", &self.options)
            .field("bounds", &self.bounds)
            .field("highest_generation", &self.shared.generations.highest())
            .field("last_applied", &self.shared.applied.get())
            .field("deferred", &self.deferred)
            .field("pending_state_updates", &self.state_updates.len())
            .finish()
    }
}
