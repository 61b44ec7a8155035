use std::sync::Arc;
use std::time::Duration;

use hosting_core::prelude::*;
use hosting_core::{
    AnalyticsListener, Animation, AnimationPhase, BuildWorker, CollisionPolicy, FlexibleSizeRange,
    Generation, PredicateSet,
};
use hosting_mount::{MemoryViewContainer, ViewContainer};
use hosting_runtime_std::{RenderSignal, StdBuildWorker};
use hosting_view::{HostingController, HostingError, HostingOptions};

const INITIAL_WIDTH: f32 = 320.0;
const INITIAL_HEIGHT: f32 = 480.0;
const FRAME_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone, Debug)]
struct Message {
    id: u32,
    subject: String,
}

#[derive(Clone, Debug)]
struct Inbox {
    title: String,
    messages: Vec<Message>,
}

impl Inbox {
    fn new(title: &str, subjects: &[(u32, &str)]) -> Self {
        Self {
            title: title.to_owned(),
            messages: subjects
                .iter()
                .map(|(id, subject)| Message {
                    id: *id,
                    subject: (*subject).to_owned(),
                })
                .collect(),
        }
    }
}

#[derive(Debug)]
struct Theme {
    row_height: f32,
    spacing: f32,
}

#[derive(Debug)]
struct Stack {
    spacing: f32,
}

impl Component for Stack {
    fn measure(&self, constraints: Constraints, children: &mut ChildMeasurer<'_>) -> MeasureResult {
        let child_constraints = Constraints::loose(constraints.max_width, f32::INFINITY);
        let mut placements = Vec::with_capacity(children.len());
        let mut y = 0.0;
        for i in 0..children.len() {
            placements.push(Point::new(0.0, y));
            y += children.measure(i, child_constraints).height + self.spacing;
        }
        let height = (y - self.spacing).max(0.0);
        MeasureResult::new(
            constraints.constrain_size(Size::new(constraints.max_width, height)),
            placements,
        )
    }

    fn view(&self) -> Option<ViewSpec> {
        Some(ViewSpec::new("stack"))
    }
}

#[derive(Debug)]
struct Title {
    text: String,
}

impl Component for Title {
    fn measure(&self, constraints: Constraints, _children: &mut ChildMeasurer<'_>) -> MeasureResult {
        MeasureResult::leaf(constraints.constrain_size(Size::new(constraints.max_width, 32.0)))
    }

    fn view(&self) -> Option<ViewSpec> {
        Some(ViewSpec::new("title").with("text", self.text.as_str()))
    }
}

#[derive(Debug)]
struct MessageRow {
    subject: String,
    read: bool,
    height: f32,
}

impl Component for MessageRow {
    fn measure(&self, constraints: Constraints, _children: &mut ChildMeasurer<'_>) -> MeasureResult {
        MeasureResult::leaf(constraints.constrain_size(Size::new(constraints.max_width, self.height)))
    }

    fn view(&self) -> Option<ViewSpec> {
        Some(
            ViewSpec::new("message")
                .with("subject", self.subject.as_str())
                .with("read", self.read),
        )
    }

    fn animations(&self, phase: AnimationPhase) -> Vec<Animation> {
        match phase {
            AnimationPhase::Initial => {
                Animation::parallel([Animation::alpha_from(0.0), Animation::translation_y_from(-8.0)])
                    .map(|slide_in| slide_in.ease_out(None))
                    .into_iter()
                    .collect()
            }
            AnimationPhase::Change => Vec::new(),
            AnimationPhase::Final => vec![Animation::alpha_to(0.0).ease_in(None)],
        }
    }
}

fn inbox(model: &Inbox, theme: &Theme, tree: &mut TreeBuilder<'_>) -> Result<(), ProviderError> {
    tree.child(|stack| {
        stack.children(|tree| {
            tree.leaf(Title {
                text: model.title.clone(),
            });
            for message in &model.messages {
                tree.keyed_child(&message.id, |row| {
                    let read = row.state(|| false);
                    MessageRow {
                        subject: message.subject.clone(),
                        read: *read,
                        height: theme.row_height,
                    }
                });
            }
        });
        Stack {
            spacing: theme.spacing,
        }
    });
    Ok(())
}

struct LoggingListener;

impl AnalyticsListener for LoggingListener {
    fn did_build(&self, result: &BuildResult) {
        log::info!(
            "built generation {} ({} nodes)",
            result.generation(),
            result.tree().len()
        );
    }

    fn result_superseded(&self, generation: Generation, newest: Generation) {
        log::info!("generation {generation} lost to {newest}");
    }

    fn did_mount(&self, result: &BuildResult) {
        log::info!("mounted generation {}", result.generation());
    }
}

type InboxHost = HostingController<Inbox, Theme, MemoryViewContainer>;

fn next_frame(host: &mut InboxHost, signal: &RenderSignal) -> Result<(), HostingError> {
    while host.last_applied_generation() < host.latest_generation() {
        if !signal.wait_timeout(FRAME_TIMEOUT) {
            log::warn!("no build finished within {FRAME_TIMEOUT:?}");
            break;
        }
        if let Some(stats) = host.process_completed()? {
            println!(
                "frame: generation {} created {} reused {} removed {}",
                stats.generation, stats.created, stats.reused, stats.removed
            );
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("=== View Hosting Headless Example ===");
    println!("Builds run on a background worker; the main thread plays the");
    println!("render loop and mounts whichever build is newest.");
    println!();

    let worker: Arc<dyn BuildWorker> = Arc::new(StdBuildWorker::new()?);
    let mut host: InboxHost = HostingController::new(
        inbox,
        FlexibleSizeRange::FlexibleHeight,
        Theme {
            row_height: 44.0,
            spacing: 4.0,
        },
        PredicateSet::new().with_component("messages", |component| component.is::<MessageRow>()),
        Some(Arc::new(LoggingListener) as Arc<dyn AnalyticsListener>),
        HostingOptions::default()
            .with_initial_size(Size::new(INITIAL_WIDTH, INITIAL_HEIGHT))
            .with_collision_policy(CollisionPolicy::Fail),
        Some(worker),
        MemoryViewContainer::new(),
    );
    let signal = RenderSignal::new();
    signal.register_current_thread();
    host.set_render_waker(signal.waker());

    host.update_model(
        Inbox::new("Inbox", &[(1, "Welcome"), (2, "Build report"), (3, "Lunch?")]),
        BuildMode::Asynchronous,
    )?;
    next_frame(&mut host, &signal)?;
    print!("{}", host.container_view().dump_tree());

    // Two updates in quick succession: only the second may be mounted.
    host.update_model(
        Inbox::new("Inbox", &[(1, "Welcome"), (2, "Build report"), (3, "Lunch?"), (4, "Review")]),
        BuildMode::Asynchronous,
    )?;
    host.update_model(
        Inbox::new("Inbox", &[(4, "Review"), (1, "Welcome"), (3, "Lunch?")]),
        BuildMode::Asynchronous,
    )?;
    next_frame(&mut host, &signal)?;
    print!("{}", host.container_view().dump_tree());

    let first = host
        .applied_root()
        .handles()
        .into_iter()
        .find(|handle| handle.state::<bool>().is_some())
        .map(|handle| handle.id());
    if let Some(scope) = first {
        host.update_state::<bool, _>(scope, |_| true, BuildMode::Synchronous)?;
        println!("marked {scope} as read");
    }

    if let Some(generation) = host.set_bounds(Size::new(400.0, INITIAL_HEIGHT))? {
        println!("resized; rebuilt as generation {generation}");
    }
    print!("{}", host.container_view().dump_tree());

    let fits = host.size_that_fits(Size::new(200.0, f32::INFINITY));
    println!("content needs {fits} at 200pt wide");
    match host.hit_test(Point::new(10.0, 50.0)) {
        Some(view) if view == host.container_view().root() => println!("tap hit the container"),
        Some(view) => println!("tap hit view {view}"),
        None => println!("tap passed through"),
    }
    if let Some(result) = host.current_result() {
        println!(
            "{} message rows match the `messages` predicate",
            result.matches().components_matching("messages").len()
        );
    }
    for generation in 1..=host.last_applied_generation() {
        println!("generation {generation}: {:?}", host.generation_state(generation));
    }
    Ok(())
}
