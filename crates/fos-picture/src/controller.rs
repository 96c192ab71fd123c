//! Selection controller
//!
//! Runs selection passes over a document's image placeholders and applies
//! the result. Also owns the timers around it: resize debouncing, the
//! loading-time poll and intrinsic-size back-fill.
//!
//! Passes never overlap. Probe outcomes are queued and only applied between
//! passes, each batch followed by one more unforced pass; placeholders that
//! were waiting on the probed type are picked up there.

use std::collections::HashMap;
use std::time::Duration;

use fos_srcset::{
    DescriptorResolver, ResolvedCandidate, has_width_descriptor, normalize_length,
    parse_srcset, resolve_candidates, select_candidate, select_length,
};

use crate::config::Config;
use crate::host::{Host, NodeKind};
use crate::mime::{MimeRegistry, ProbeOutcome};
use crate::security::{MixedContentGuard, resolve_url};
use crate::source::{SourceMatch, match_source};
use crate::state::{PlaceholderState, PlaceholderTable};
use crate::timers::{Scheduler, TimerId};
use crate::PictureError;

/// Timer payloads
#[derive(Debug, Clone, PartialEq)]
enum Task<N> {
    /// Debounced resize fired
    Resize,
    /// Document may still be loading new placeholders
    ReadyStatePoll,
    /// Waiting for the chosen image to load to size the placeholder
    IntrinsicSize { node: N, url: String, resolution: f64 },
}

/// What a pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Placeholders that went through selection
    pub evaluated: usize,
    /// Placeholders put off until a type probe resolves
    pub deferred: usize,
    /// Placeholders whose resource changed
    pub swapped: usize,
    /// Swaps refused as mixed content
    pub blocked: usize,
}

impl PassReport {
    pub fn merge(&mut self, other: PassReport) {
        self.evaluated += other.evaluated;
        self.deferred += other.deferred;
        self.swapped += other.swapped;
        self.blocked += other.blocked;
    }
}

enum Outcome {
    Skipped,
    Deferred,
    Evaluated { swapped: bool, blocked: bool },
}

/// Responsive image selection controller
#[derive(Debug)]
pub struct SelectionController<H: Host> {
    config: Config,
    registry: MimeRegistry<H>,
    placeholders: PlaceholderTable<H::Node>,
    timers: Scheduler<Task<H::Node>>,
    resize_timer: Option<TimerId>,
    ready_state_timer: Option<TimerId>,
    natural_widths: HashMap<String, u32>,
}

impl<H: Host + 'static> SelectionController<H> {
    /// Controller with the built-in MIME registry
    pub fn new(config: Config) -> Self {
        Self::with_registry(config, MimeRegistry::with_defaults())
    }
}

impl<H: Host> SelectionController<H> {
    pub fn with_registry(config: Config, registry: MimeRegistry<H>) -> Self {
        Self {
            config,
            registry,
            placeholders: PlaceholderTable::new(),
            timers: Scheduler::new(),
            resize_timer: None,
            ready_state_timer: None,
            natural_widths: HashMap::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &MimeRegistry<H> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut MimeRegistry<H> {
        &mut self.registry
    }

    /// Side-table entry of a placeholder
    pub fn state(&self, node: H::Node) -> Option<&PlaceholderState> {
        self.placeholders.get(node)
    }

    /// Current logical time
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    /// Time until the next timer is due
    pub fn time_until_next(&self) -> Option<Duration> {
        self.timers.time_until_next()
    }

    /// A debounced resize pass is scheduled
    pub fn is_resize_pending(&self) -> bool {
        self.resize_timer.is_some()
    }

    /// Initial pass; keeps polling while the document is loading
    pub fn start(&mut self, host: &mut H) -> PassReport {
        let report = self.evaluate(host, None, false);
        self.poll_while_loading(host);
        report
    }

    /// Run a selection pass over `targets`, or over every placeholder.
    ///
    /// Without `force`, placeholders already evaluated are left alone.
    pub fn evaluate(&mut self, host: &mut H, targets: Option<&[H::Node]>, force: bool) -> PassReport {
        let mut report = self.run_pass(host, targets, force);
        report.merge(self.settle(host));
        report
    }

    /// Resize signal; collapses bursts into one forced pass
    pub fn notify_resize(&mut self) {
        if let Some(id) = self.resize_timer.take() {
            self.timers.cancel(id);
        }
        let delay = self.config.resize_debounce();
        self.resize_timer = Some(self.timers.schedule(delay, Task::Resize));
    }

    /// Advance the clock by `elapsed`, running every task that falls due
    pub fn advance(&mut self, host: &mut H, elapsed: Duration) -> PassReport {
        let until = self.timers.now() + elapsed;
        let mut report = PassReport::default();

        while let Some((id, task)) = self.timers.pop_due(until) {
            report.merge(self.run_task(host, id, task));
        }
        self.timers.advance_to(until);

        report.merge(self.settle(host));
        report
    }

    /// Apply probe outcomes received so far and re-run selection
    pub fn process_probe_outcomes(&mut self, host: &mut H) -> PassReport {
        self.settle(host)
    }

    /// Probe outcomes as they arrive, for hosts that await them
    pub fn probe_outcomes(&self) -> smol::channel::Receiver<ProbeOutcome> {
        self.registry.outcomes()
    }

    /// Apply an outcome obtained from [`Self::probe_outcomes`]
    pub fn apply_probe_outcome(&mut self, host: &mut H, outcome: ProbeOutcome) -> PassReport {
        self.registry.apply(&outcome);
        self.evaluate(host, None, false)
    }

    /// Forget a placeholder removed from the document
    pub fn detach(&mut self, node: H::Node) -> bool {
        let Some(state) = self.placeholders.remove(node) else {
            return false;
        };
        if let Some(id) = state.intrinsic_task {
            self.timers.cancel(id);
        }
        true
    }

    fn run_pass(&mut self, host: &mut H, targets: Option<&[H::Node]>, force: bool) -> PassReport {
        let targets = match targets {
            Some(targets) => targets.to_vec(),
            None => host.placeholders(),
        };

        let mut report = PassReport::default();
        for node in targets {
            match self.evaluate_placeholder(host, node, force) {
                Outcome::Skipped => {}
                Outcome::Deferred => report.deferred += 1,
                Outcome::Evaluated { swapped, blocked } => {
                    report.evaluated += 1;
                    report.swapped += usize::from(swapped);
                    report.blocked += usize::from(blocked);
                }
            }
        }

        tracing::debug!(
            "Selection pass (force={}): {} evaluated, {} deferred, {} swapped",
            force, report.evaluated, report.deferred, report.swapped
        );
        report
    }

    fn settle(&mut self, host: &mut H) -> PassReport {
        let mut report = PassReport::default();
        while self.registry.drain_outcomes() > 0 {
            report.merge(self.run_pass(host, None, false));
        }
        report
    }

    fn run_task(&mut self, host: &mut H, id: TimerId, task: Task<H::Node>) -> PassReport {
        match task {
            Task::Resize => {
                let report = self.evaluate(host, None, true);
                if self.resize_timer == Some(id) {
                    self.resize_timer = None;
                }
                report
            }
            Task::ReadyStatePoll => {
                self.ready_state_timer = None;
                let report = self.evaluate(host, None, false);
                self.poll_while_loading(host);
                report
            }
            Task::IntrinsicSize { node, url, resolution } => {
                self.poll_intrinsic_size(host, node, url, resolution);
                PassReport::default()
            }
        }
    }

    fn poll_while_loading(&mut self, host: &H) {
        if host.is_loading() && self.ready_state_timer.is_none() {
            let delay = self.config.ready_state_poll_interval();
            self.ready_state_timer = Some(self.timers.schedule(delay, Task::ReadyStatePoll));
        }
    }

    fn evaluate_placeholder(&mut self, host: &mut H, node: H::Node, force: bool) -> Outcome {
        if host.kind(node) != NodeKind::Image {
            return Outcome::Skipped;
        }

        let state = self.placeholders.entry(node);
        if state.evaluated && !force {
            return Outcome::Skipped;
        }
        // Stays false if this pass defers the node
        state.evaluated = false;

        let picture = host.parent(node).filter(|&p| host.kind(p) == NodeKind::Picture);
        let source = match picture {
            Some(picture) => match match_source(host, &mut self.registry, node, picture) {
                SourceMatch::Found(source) => Some(source),
                SourceMatch::NotFound => None,
                SourceMatch::Pending => return Outcome::Deferred,
            },
            None => None,
        };

        let native = host.native_support();
        let own_srcset = host.attribute(node, "srcset");
        let misread = !native.sizes && own_srcset.as_deref().is_some_and(has_width_descriptor);
        if picture.is_some() || misread {
            self.capture_srcset(host, node, own_srcset.as_deref());
        }
        let cached = self.placeholders.entry(node).cached_srcset.clone();

        let (candidates, apply) = match source {
            Some(source) => {
                let srcset = host.attribute(source, "srcset");
                let sizes = host.attribute(source, "sizes");
                (build_candidates(host, srcset.as_deref(), sizes.as_deref()), true)
            }
            None => {
                let srcset = cached.clone().or(own_srcset);
                let sizes = host.attribute(node, "sizes");
                let apply = !native.srcset || cached.is_some();
                (build_candidates(host, srcset.as_deref(), sizes.as_deref()), apply)
            }
        };

        let mut swapped = false;
        let mut blocked = false;
        if apply {
            if let Some(best) = select_candidate(candidates, host.device_pixel_ratio()) {
                match self.apply_candidate(host, node, best) {
                    Ok(changed) => swapped = changed,
                    Err(err @ PictureError::MixedContentBlocked(_)) => {
                        tracing::warn!("{}", err);
                        blocked = true;
                    }
                    Err(err) => tracing::warn!("Image {:?} left unchanged: {}", node, err),
                }
            }
        }

        self.placeholders.entry(node).evaluated = true;
        Outcome::Evaluated { swapped, blocked }
    }

    /// Take the image's srcset away from the host, once
    fn capture_srcset(&mut self, host: &mut H, node: H::Node, srcset: Option<&str>) {
        let state = self.placeholders.entry(node);
        if state.cached_srcset.is_some() {
            return;
        }
        let Some(srcset) = srcset.filter(|s| !s.is_empty()) else {
            return;
        };

        host.set_attribute(node, "srcset", "");
        if let Some(marker) = &self.config.srcset_marker {
            host.set_attribute(node, marker, srcset);
        }
        state.cached_srcset = Some(srcset.to_string());
    }

    /// Swap to `best` if it differs from what is shown; `Ok(true)` on swap
    fn apply_candidate(
        &mut self,
        host: &mut H,
        node: H::Node,
        best: ResolvedCandidate,
    ) -> Result<bool, PictureError> {
        let url = resolve_url(host.base_url().as_ref(), &best.url)?;
        if host.current_src(node).as_deref() == Some(url.as_str()) {
            return Ok(false);
        }

        MixedContentGuard::new(host.is_secure_context()).check(&url)?;

        tracing::trace!("Image {:?} -> {} ({}x)", node, url, best.resolution);
        host.set_src(node, &url);
        host.set_current_src(node, &url);

        if host.has_zoom_repaint_defect() {
            let previous = host.style(node, "zoom");
            host.set_style(node, "zoom", Some(self.config.repaint_zoom.as_str()));
            host.flush_layout(node);
            host.set_style(node, "zoom", previous.as_deref());
        }

        if self.config.intrinsic_size {
            self.backfill_intrinsic_size(host, node, url, best.resolution);
        }
        Ok(true)
    }

    fn backfill_intrinsic_size(&mut self, host: &mut H, node: H::Node, url: String, resolution: f64) {
        let state = self.placeholders.entry(node);
        if let Some(id) = state.intrinsic_task.take() {
            self.timers.cancel(id);
        }

        let explicit = *state.explicit_dimensions.get_or_insert_with(|| {
            host.attribute(node, "width").is_some() || host.attribute(node, "height").is_some()
        });
        if explicit {
            return;
        }

        if let Some(&natural) = self.natural_widths.get(&url) {
            set_intrinsic_width(host, node, natural, resolution);
            return;
        }

        let delay = self.config.intrinsic_poll_interval();
        let task = Task::IntrinsicSize { node, url, resolution };
        state.intrinsic_task = Some(self.timers.schedule(delay, task));
    }

    fn poll_intrinsic_size(&mut self, host: &mut H, node: H::Node, url: String, resolution: f64) {
        let Some(state) = self.placeholders.get_mut(node) else {
            return;
        };
        state.intrinsic_task = None;

        // A later swap owns the width now
        if host.current_src(node).as_deref() != Some(url.as_str()) {
            return;
        }

        if !host.is_complete(node) {
            let delay = self.config.intrinsic_poll_interval();
            let task = Task::IntrinsicSize { node, url, resolution };
            state.intrinsic_task = Some(self.timers.schedule(delay, task));
            return;
        }

        let natural = host.natural_width(node);
        if natural > 0 {
            self.natural_widths.insert(url, natural);
            set_intrinsic_width(host, node, natural, resolution);
        }
    }
}

/// Candidates from a srcset/sizes pair; empty without a srcset
fn build_candidates<H: Host>(host: &H, srcset: Option<&str>, sizes: Option<&str>) -> Vec<ResolvedCandidate> {
    let Some(srcset) = srcset.filter(|s| !s.trim().is_empty()) else {
        return Vec::new();
    };

    let length = select_length(sizes, |condition| host.media_matches(condition));
    let width = host.measure_length(&normalize_length(&length));

    let resolver = DescriptorResolver::new(host.native_support().sizes);
    resolve_candidates(parse_srcset(srcset), width, &resolver)
}

fn set_intrinsic_width<H: Host>(host: &mut H, node: H::Node, natural: u32, resolution: f64) {
    let width = (natural as f64 / resolution) as u64;
    if width > 0 {
        host.set_attribute(node, "width", &width.to_string());
    }
}
