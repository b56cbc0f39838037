use std::sync::Arc;

use eframe::egui::Vec2;
use log::{debug, info, warn};

use crate::config::RefreshPolicy;
use crate::layout::{LayoutMode, effective_viewport, layout_targets};
use crate::topology::{PathOutcome, PathRequest, TopologyModel, TopologyProvider, build_model};

use super::fetch::{FetchKind, FetchPayload, FetchQueue, FetchReply, FetchRequest, Generation};
use super::graph::InteractionState;
use super::highlight::PathOverlay;
use super::physics::{DRAG_ALPHA_TARGET, FULL_ALPHA, LAYOUT_REHEAT_ALPHA, Simulation};
use super::render_utils::{Camera, Theme};
use super::schedule::{Scheduler, TaskHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum ViewKind {
    Topology,
    Path,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum ViewPhase {
    Uninitialized,
    Loaded,
    Rendering,
    Idle,
    Destroyed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct LayerOptions {
    pub(super) show_physical: bool,
    pub(super) show_bgp: bool,
    pub(super) show_labels: bool,
}

impl LayerOptions {
    pub(super) fn for_kind(kind: ViewKind) -> Self {
        Self {
            show_physical: true,
            show_bgp: kind == ViewKind::Topology,
            show_labels: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ViewTask {
    ReleasePins,
}

#[derive(Debug, Default)]
pub(super) struct PathQuery {
    pub(super) source: String,
    pub(super) target: String,
    pub(super) outcome: Option<PathOutcome>,
}

/// One live topology or path view.
///
/// Owns the model, the simulation and every deferred task or fetch issued on
/// its behalf. After [`TopologyView::destroy`] nothing it owns does any more
/// work and late replies are dropped.
pub(super) struct TopologyView {
    pub(super) kind: ViewKind,
    phase: ViewPhase,
    generation: Generation,
    refresh: RefreshPolicy,
    fetches: FetchQueue,
    pub(super) model: TopologyModel,
    pub(super) simulation: Option<Simulation>,
    scene_dirty: bool,
    pub(super) layers: LayerOptions,
    pub(super) theme: Theme,
    layout: LayoutMode,
    settle_task: Option<TaskHandle>,
    scheduler: Scheduler<ViewTask>,
    pub(super) viewport: Vec2,
    pub(super) camera: Camera,
    pub(super) interaction: InteractionState,
    pub(super) overlay: PathOverlay,
    pub(super) path_query: PathQuery,
    last_topology_request: Option<f64>,
    last_status_request: Option<f64>,
    pub(super) last_error: Option<String>,
}

impl TopologyView {
    pub(super) fn new(
        kind: ViewKind,
        provider: Arc<dyn TopologyProvider>,
        refresh: RefreshPolicy,
        theme: Theme,
    ) -> Self {
        Self {
            kind,
            phase: ViewPhase::Uninitialized,
            generation: Generation::default(),
            refresh,
            fetches: FetchQueue::new(provider),
            model: TopologyModel::default(),
            simulation: None,
            scene_dirty: false,
            layers: LayerOptions::for_kind(kind),
            theme,
            layout: LayoutMode::default(),
            settle_task: None,
            scheduler: Scheduler::default(),
            viewport: Vec2::ZERO,
            camera: Camera::default(),
            interaction: InteractionState::default(),
            overlay: PathOverlay::default(),
            path_query: PathQuery::default(),
            last_topology_request: None,
            last_status_request: None,
            last_error: None,
        }
    }

    pub(super) fn phase(&self) -> ViewPhase {
        self.phase
    }

    pub(super) fn layout(&self) -> LayoutMode {
        self.layout
    }

    pub(super) fn is_loading(&self) -> bool {
        self.fetches.is_in_flight(FetchKind::Topology)
    }

    pub(super) fn is_path_pending(&self) -> bool {
        self.fetches.is_in_flight(FetchKind::Path)
    }

    /// Seconds until the next scheduled task fires, if any.
    pub(super) fn next_task_in(&self, now: f64) -> Option<f64> {
        self.scheduler.next_due().map(|due_at| (due_at - now).max(0.0))
    }

    fn issue(&mut self, request: FetchRequest) {
        if self.phase == ViewPhase::Destroyed || self.fetches.is_in_flight(request.kind()) {
            return;
        }
        self.fetches.spawn(self.generation, request);
    }

    pub(super) fn request_reload(&mut self, now: f64) {
        self.last_topology_request = Some(now);
        self.issue(FetchRequest::Topology);
    }

    pub(super) fn find_path(&mut self) {
        let (source, target) = (&self.path_query.source, &self.path_query.target);
        if source.is_empty() || target.is_empty() {
            return;
        }
        let request = PathRequest {
            source: source.clone(),
            target: target.clone(),
        };
        self.path_query.outcome = None;
        self.issue(FetchRequest::Path(request));
    }

    pub(super) fn clear_path(&mut self) {
        self.overlay.clear();
        self.path_query.outcome = None;
    }

    /// Per-frame driver: applies replies, fires due timers, rebuilds the
    /// scene when needed and advances the simulation one tick. Returns
    /// whether the scene is still animating.
    pub(super) fn advance(&mut self, now: f64, measured_viewport: Vec2) -> bool {
        if self.phase == ViewPhase::Destroyed {
            return false;
        }

        for reply in self.fetches.drain() {
            self.accept(reply);
        }
        self.issue_due_polls(now);

        if self.scene_dirty {
            self.rebuild_scene(now, measured_viewport);
        }
        self.run_due_tasks(now);
        self.step()
    }

    fn issue_due_polls(&mut self, now: f64) {
        let due = |last: Option<f64>, every: Option<std::time::Duration>| match (last, every) {
            (None, _) => true,
            (Some(last), Some(every)) => now - last >= every.as_secs_f64(),
            (Some(_), None) => false,
        };

        if due(self.last_topology_request, self.refresh.topology_every) {
            self.request_reload(now);
        }
        if self.phase != ViewPhase::Uninitialized
            && due(self.last_status_request, self.refresh.status_every)
        {
            self.last_status_request = Some(now);
            self.issue(FetchRequest::LiveStatus);
        }
    }

    fn accept(&mut self, reply: FetchReply) {
        if self.phase == ViewPhase::Destroyed || reply.generation != self.generation {
            debug!(
                "discarding stale {:?} reply from generation {:?} (current {:?})",
                reply.kind, reply.generation, self.generation
            );
            return;
        }

        match reply.result {
            Err(error) => {
                warn!("{:?} fetch failed: {error}", reply.kind);
                if reply.kind == FetchKind::Path {
                    self.path_query.outcome = Some(PathOutcome::Failed(error.clone()));
                }
                self.last_error = Some(error);
            }
            Ok(FetchPayload::Topology(raw)) => {
                self.last_error = None;
                self.install_model(build_model(&raw));
            }
            Ok(FetchPayload::LiveStatus(report)) => {
                self.model.apply_live_status(&report);
            }
            Ok(FetchPayload::Path { request, outcome }) => {
                match &outcome {
                    PathOutcome::Found { hops, .. } => self.overlay.set(hops.clone()),
                    PathOutcome::Failed(_) => self.overlay.clear(),
                }
                debug!("path {} -> {}: {outcome:?}", request.source, request.target);
                self.path_query.outcome = Some(outcome);
            }
        }
    }

    fn install_model(&mut self, model: TopologyModel) {
        info!(
            "{:?} view loaded {} nodes and {} edges",
            self.kind,
            model.node_count(),
            model.edges.len()
        );
        self.model = model;
        self.generation = self.generation.next();
        self.scene_dirty = true;
        if self.phase == ViewPhase::Uninitialized {
            self.phase = ViewPhase::Loaded;
        }

        let ids = |index: usize| self.model.nodes.get(index).map(|node| node.id.clone());
        if self.model.index_of(&self.path_query.source).is_none() {
            self.path_query.source = ids(0).unwrap_or_default();
        }
        if self.model.index_of(&self.path_query.target).is_none() {
            let last = self.model.node_count().saturating_sub(1);
            self.path_query.target = ids(last).unwrap_or_default();
        }
    }

    /// Marks the scene for a full rebuild on the next frame: fresh
    /// simulation, no pins, viewport measured again.
    pub(super) fn invalidate_scene(&mut self) {
        if self.phase != ViewPhase::Uninitialized && self.phase != ViewPhase::Destroyed {
            self.scene_dirty = true;
        }
    }

    pub(super) fn set_layers(&mut self, layers: LayerOptions) {
        if self.layers != layers {
            self.layers = layers;
            self.invalidate_scene();
        }
    }

    pub(super) fn set_theme(&mut self, theme: Theme) {
        if self.theme != theme {
            self.theme = theme;
            self.invalidate_scene();
        }
    }

    fn rebuild_scene(&mut self, now: f64, measured_viewport: Vec2) {
        self.scene_dirty = false;
        self.viewport = effective_viewport(measured_viewport);
        if let Some(handle) = self.settle_task.take() {
            self.scheduler.cancel(handle);
        }
        self.interaction.reset();

        let mut simulation = Simulation::new(&self.model, self.viewport);
        simulation.reheat(FULL_ALPHA);
        self.simulation = Some(simulation);
        self.phase = ViewPhase::Rendering;
        debug!("rebuilt {:?} scene at {:?}", self.kind, self.viewport);

        if self.layout != LayoutMode::Free {
            self.apply_layout(self.layout, now);
        }
    }

    fn settle_duration(&self, mode: LayoutMode) -> Option<std::time::Duration> {
        mode.settle_duration()
            .map(|duration| self.refresh.settle_override.unwrap_or(duration))
    }

    /// Switches layout strategy. Any pending pin release from an earlier
    /// layout is cancelled first so it can never fire late.
    pub(super) fn apply_layout(&mut self, mode: LayoutMode, now: f64) {
        if self.phase == ViewPhase::Destroyed {
            return;
        }
        if let Some(handle) = self.settle_task.take() {
            self.scheduler.cancel(handle);
        }
        self.layout = mode;

        let settle = self.settle_duration(mode);
        let dragging = self.interaction.dragging;
        let Some(simulation) = self.simulation.as_mut() else {
            return;
        };

        match layout_targets(mode, &self.model.roles(), self.viewport) {
            None => {
                simulation.unpin_all_except(dragging);
                simulation.reheat(FULL_ALPHA);
            }
            Some(targets) => {
                for (index, target) in targets.into_iter().enumerate() {
                    if Some(index) != dragging {
                        simulation.pin(index, target);
                    }
                }
                simulation.reheat(LAYOUT_REHEAT_ALPHA);
                let due_at = now + settle.unwrap_or_default().as_secs_f64();
                self.settle_task = Some(self.scheduler.schedule(due_at, ViewTask::ReleasePins));
            }
        }
        self.phase = ViewPhase::Rendering;
    }

    fn settle_pending(&self) -> bool {
        self.settle_task
            .is_some_and(|handle| self.scheduler.is_pending(handle))
    }

    fn run_due_tasks(&mut self, now: f64) {
        for (handle, task) in self.scheduler.take_due(now) {
            match task {
                ViewTask::ReleasePins => {
                    if self.settle_task != Some(handle) {
                        continue;
                    }
                    self.settle_task = None;
                    if let Some(simulation) = self.simulation.as_mut() {
                        simulation.unpin_all_except(self.interaction.dragging);
                    }
                }
            }
        }
    }

    fn step(&mut self) -> bool {
        let Some(simulation) = self.simulation.as_mut() else {
            return false;
        };
        let active = simulation.tick();
        self.phase = if active {
            ViewPhase::Rendering
        } else {
            ViewPhase::Idle
        };
        active
    }

    pub(super) fn begin_drag(&mut self, index: usize) {
        if self.phase == ViewPhase::Destroyed || self.interaction.dragging.is_some() {
            return;
        }
        let Some(simulation) = self.simulation.as_mut() else {
            return;
        };
        let Some(position) = simulation.position(index) else {
            return;
        };

        simulation.pin(index, position);
        simulation.set_alpha_target(DRAG_ALPHA_TARGET);
        self.interaction.dragging = Some(index);
        self.phase = ViewPhase::Rendering;
    }

    pub(super) fn drag_to(&mut self, world: Vec2) {
        if let (Some(index), Some(simulation)) =
            (self.interaction.dragging, self.simulation.as_mut())
        {
            simulation.pin(index, world);
        }
    }

    /// Ends the active drag. The node stays pinned while a deterministic
    /// layout is still settling; the pending release frees it later.
    pub(super) fn end_drag(&mut self) {
        let Some(index) = self.interaction.dragging.take() else {
            return;
        };
        let settling = self.settle_pending();
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.set_alpha_target(0.0);
            if !settling {
                simulation.unpin(index);
            }
        }
    }

    pub(super) fn destroy(&mut self) {
        if self.phase == ViewPhase::Destroyed {
            return;
        }

        let cancelled = self.scheduler.cancel_all();
        self.settle_task = None;
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.stop();
        }
        self.interaction.reset();
        self.generation = self.generation.next();
        self.phase = ViewPhase::Destroyed;
        debug!("{:?} view destroyed, {cancelled} scheduled task(s) cancelled", self.kind);
    }
}

impl Drop for TopologyView {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::{Duration, Instant};

    use eframe::egui::vec2;

    use super::super::fetch::testing::StaticProvider;
    use super::super::graph::NodeDetailSink;
    use super::*;

    const SCENARIO: &str = r#"{
        "nodes": [
            {"id": "RR1", "role": "Route Reflector"},
            {"id": "PE1", "role": "PE", "loopback": "1.1.1.1", "bgp_neighbors": ["2.2.2.2"]},
            {"id": "PE2", "role": "PE", "loopback": "2.2.2.2", "bgp_neighbors": ["1.1.1.1"]}
        ],
        "links": [
            {"source": "RR1", "target": "PE1", "metric": 10},
            {"source": "RR1", "target": "PE2", "metric": 10}
        ]
    }"#;
    const VIEWPORT: Vec2 = vec2(800.0, 600.0);

    fn quiet_policy() -> RefreshPolicy {
        RefreshPolicy {
            topology_every: None,
            status_every: None,
            settle_override: None,
        }
    }

    fn view_with(provider: StaticProvider) -> TopologyView {
        TopologyView::new(
            ViewKind::Topology,
            Arc::new(provider),
            quiet_policy(),
            Theme::default(),
        )
    }

    fn loaded_view() -> TopologyView {
        let mut view = view_with(StaticProvider::new(SCENARIO));
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut now = 0.0;
        while view.simulation.is_none() {
            assert!(Instant::now() < deadline, "topology never loaded");
            view.advance(now, VIEWPORT);
            now += 1.0 / 60.0;
            thread::sleep(Duration::from_millis(2));
        }
        view
    }

    fn pinned(view: &TopologyView) -> usize {
        view.simulation
            .as_ref()
            .map_or(0, |simulation| simulation.pinned_count())
    }

    #[test]
    fn first_fetch_moves_view_from_uninitialized_to_rendering() {
        let view = view_with(StaticProvider::new(SCENARIO));
        assert_eq!(view.phase(), ViewPhase::Uninitialized);

        let view = loaded_view();
        assert_eq!(view.phase(), ViewPhase::Rendering);
        assert_eq!(view.model.node_count(), 3);
        assert_eq!(view.path_query.source, "RR1");
        assert_eq!(view.path_query.target, "PE2");
    }

    #[test]
    fn simulation_cools_to_idle_and_layout_change_wakes_it() {
        let mut view = loaded_view();
        let mut now = 1.0;
        while view.advance(now, VIEWPORT) {
            now += 1.0 / 60.0;
        }
        assert_eq!(view.phase(), ViewPhase::Idle);

        view.apply_layout(LayoutMode::Circular, now);
        assert_eq!(view.phase(), ViewPhase::Rendering);
    }

    #[test]
    fn deterministic_layout_pins_then_releases_after_settle() {
        let mut view = loaded_view();

        view.apply_layout(LayoutMode::Circular, 10.0);
        assert_eq!(pinned(&view), 3);

        view.advance(11.0, VIEWPORT);
        assert_eq!(pinned(&view), 3);

        view.advance(12.0, VIEWPORT);
        assert_eq!(pinned(&view), 0);
    }

    #[test]
    fn free_layout_before_settle_cancels_pending_release() {
        let mut view = loaded_view();

        view.apply_layout(LayoutMode::Hierarchical, 10.0);
        assert_eq!(pinned(&view), 3);
        assert!(view.settle_pending());

        view.apply_layout(LayoutMode::Free, 10.5);
        assert_eq!(pinned(&view), 0);
        assert!(!view.settle_pending());
        assert_eq!(view.scheduler.len(), 0);

        view.advance(20.0, VIEWPORT);
        assert_eq!(pinned(&view), 0);
        assert_eq!(view.layout(), LayoutMode::Free);
    }

    #[test]
    fn superseding_layout_keeps_only_the_newest_release() {
        let mut view = loaded_view();

        view.apply_layout(LayoutMode::Hierarchical, 10.0);
        view.apply_layout(LayoutMode::Circular, 12.9);
        assert_eq!(view.scheduler.len(), 1);

        view.advance(13.5, VIEWPORT);
        assert_eq!(pinned(&view), 3);
        view.advance(15.0, VIEWPORT);
        assert_eq!(pinned(&view), 0);
    }

    #[test]
    fn free_layout_twice_is_idempotent() {
        let mut view = loaded_view();
        view.apply_layout(LayoutMode::Radial, 1.0);

        view.apply_layout(LayoutMode::Free, 1.1);
        let first = (pinned(&view), view.scheduler.len(), view.layout());
        view.apply_layout(LayoutMode::Free, 1.2);
        let second = (pinned(&view), view.scheduler.len(), view.layout());

        assert_eq!(first, (0, 0, LayoutMode::Free));
        assert_eq!(first, second);
    }

    #[test]
    fn settle_override_replaces_layout_duration() {
        let mut view = loaded_view();
        view.refresh.settle_override = Some(Duration::from_millis(250));

        view.apply_layout(LayoutMode::Radial, 5.0);
        view.advance(5.3, VIEWPORT);

        assert_eq!(pinned(&view), 0);
    }

    #[test]
    fn drag_pins_node_and_release_frees_it() {
        let mut view = loaded_view();

        view.begin_drag(1);
        view.drag_to(vec2(50.0, 60.0));
        view.advance(1.0, VIEWPORT);
        assert_eq!(view.simulation.as_ref().unwrap().position(1), Some(vec2(50.0, 60.0)));

        view.end_drag();
        assert_eq!(pinned(&view), 0);
        assert!(view.interaction.dragging.is_none());
    }

    #[test]
    fn drag_release_mid_settle_keeps_pin_until_release() {
        let mut view = loaded_view();
        view.apply_layout(LayoutMode::Circular, 1.0);

        view.begin_drag(0);
        view.end_drag();
        assert_eq!(pinned(&view), 3);

        view.advance(3.5, VIEWPORT);
        assert_eq!(pinned(&view), 0);
    }

    #[test]
    fn dragged_node_survives_layout_release() {
        let mut view = loaded_view();
        view.apply_layout(LayoutMode::Circular, 1.0);
        view.begin_drag(2);

        view.advance(3.5, VIEWPORT);

        assert_eq!(pinned(&view), 1);
        assert!(view.simulation.as_ref().unwrap().bodies()[2].pin.is_some());
    }

    #[test]
    fn fetch_resolving_after_destroy_changes_nothing() {
        let mut provider = StaticProvider::new(SCENARIO);
        provider.delay = Duration::from_millis(50);
        let mut view = view_with(provider);

        view.advance(0.0, VIEWPORT);
        assert!(view.is_loading());
        view.destroy();
        thread::sleep(Duration::from_millis(300));

        assert!(!view.advance(1.0, VIEWPORT));
        assert!(view.model.is_empty());
        assert!(view.simulation.is_none());
        assert_eq!(view.phase(), ViewPhase::Destroyed);
    }

    #[test]
    fn stale_generation_reply_is_discarded() {
        let mut view = loaded_view();
        let stale = Generation::default();
        view.fetches
            .sender()
            .send(FetchReply {
                generation: stale,
                kind: FetchKind::Topology,
                result: Ok(FetchPayload::Topology(Default::default())),
            })
            .unwrap();

        view.advance(2.0, VIEWPORT);

        assert_eq!(view.model.node_count(), 3);
    }

    #[test]
    fn destroy_cancels_release_and_stops_simulation() {
        let mut view = loaded_view();
        view.apply_layout(LayoutMode::Hierarchical, 1.0);

        view.destroy();
        view.destroy();

        assert_eq!(view.scheduler.len(), 0);
        assert!(!view.simulation.as_ref().unwrap().is_active());
        assert!(!view.advance(100.0, VIEWPORT));
        assert_eq!(pinned(&view), 3);
    }

    #[test]
    fn layout_change_after_destroy_is_ignored() {
        let mut view = loaded_view();
        view.destroy();

        view.apply_layout(LayoutMode::Circular, 1.0);

        assert_eq!(view.phase(), ViewPhase::Destroyed);
        assert_eq!(view.scheduler.len(), 0);
        assert_eq!(view.layout(), LayoutMode::Free);
        assert_eq!(pinned(&view), 0);
        assert!(!view.simulation.as_ref().unwrap().is_active());
    }

    #[test]
    fn live_status_merge_keeps_the_running_simulation() {
        let mut view = loaded_view();
        view.begin_drag(0);
        let generation = view.generation;
        view.fetches
            .sender()
            .send(FetchReply {
                generation,
                kind: FetchKind::LiveStatus,
                result: Ok(FetchPayload::LiveStatus(Default::default())),
            })
            .unwrap();

        view.advance(1.0, VIEWPORT);

        assert_eq!(view.generation, generation);
        assert_eq!(view.interaction.dragging, Some(0));
        assert_eq!(pinned(&view), 1);
    }

    #[test]
    fn layer_toggle_rebuilds_scene_and_drops_pins() {
        let mut view = loaded_view();
        view.apply_layout(LayoutMode::Free, 1.0);
        view.begin_drag(0);
        view.end_drag();
        view.simulation.as_mut().unwrap().pin(1, vec2(1.0, 1.0));

        let mut layers = view.layers;
        layers.show_bgp = false;
        view.set_layers(layers);
        view.advance(2.0, vec2(0.0, 0.0));

        assert_eq!(pinned(&view), 0);
        assert_eq!(view.viewport, crate::layout::FALLBACK_VIEWPORT);
    }

    #[test]
    fn path_reply_sets_and_clear_removes_overlay() {
        let mut provider = StaticProvider::new(SCENARIO);
        provider.path = Some(vec!["PE1".into(), "RR1".into(), "PE2".into()]);
        let mut view = view_with(provider);
        let deadline = Instant::now() + Duration::from_secs(5);
        while view.simulation.is_none() {
            assert!(Instant::now() < deadline);
            view.advance(0.0, VIEWPORT);
            thread::sleep(Duration::from_millis(2));
        }

        view.find_path();
        while view.path_query.outcome.is_none() {
            assert!(Instant::now() < deadline);
            view.advance(0.1, VIEWPORT);
            thread::sleep(Duration::from_millis(2));
        }

        assert!(matches!(view.path_query.outcome, Some(PathOutcome::Found { .. })));
        assert_eq!(view.overlay.active().map(|path| path.hops().len()), Some(3));

        view.clear_path();
        assert!(view.overlay.active().is_none());
        assert_eq!(view.model.node_count(), 3);
    }

    struct RecordingSink(Vec<String>);

    impl NodeDetailSink for RecordingSink {
        fn show_node_detail(&mut self, node: &crate::topology::Node) {
            self.0.push(format!("{}:{}", node.id, node.bgp_neighbors.join(",")));
        }
    }

    #[test]
    fn click_dispatches_full_record_without_mutation() {
        let view = loaded_view();
        let before = view.model.nodes.clone();
        let mut sink = RecordingSink(Vec::new());

        view.show_detail(view.model.index_of("PE1").unwrap(), &mut sink);
        view.show_detail(99, &mut sink);

        assert_eq!(sink.0, vec!["PE1:2.2.2.2"]);
        assert_eq!(view.model.nodes, before);
    }
}
