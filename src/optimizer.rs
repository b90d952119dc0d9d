//! Placement engine for stacking boxes onto pallets.
//!
//! Boxes are offered in group-priority order. Each box tries every open layer
//! from the bottom up, both horizontal rotations and every grid position, and is
//! accepted at the first spot that is in bounds, collision-free and supported
//! according to the relaxing threshold ladder. If no open layer takes it, a new
//! layer is opened on top of the tallest stack. The first box that fits nowhere
//! fails the whole pallet.

use std::convert::Infallible;
use std::ops::ControlFlow;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::geometry::{fits, overlaps};
use crate::grouping::placement_sequence;
use crate::metrics::{
    PERFECT_FILL_TOLERANCE, PalletMetrics, VOLUMETRIC_DIVISOR, max_occupied_height,
};
use crate::model::{BoxSpec, BoxUnit, PalletSpec, PlacedBox, PlacementAttempt, expand_units};
use crate::search::candidate_positions;
use crate::support::first_satisfied_tier;
use crate::types::{EPSILON_GENERAL, EPSILON_HEIGHT};

/// Configuration for the placement engine.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PackingConfig {
    /// Tolerance for matching top faces to bottom faces
    pub height_epsilon: f64,
    /// Tolerance for bounds checks
    pub general_epsilon: f64,
    /// Divisor of the volumetric weight
    pub volumetric_divisor: f64,
    /// Relative tolerance of the perfect-fill check
    pub perfect_fill_tolerance: f64,
    /// Maximum candidate positions examined per pallet; `None` scans exhaustively
    pub probe_budget: Option<u64>,
    /// Run independent pallets on the rayon pool
    pub parallel_pallets: bool,
}

impl PackingConfig {
    pub const DEFAULT_HEIGHT_EPSILON: f64 = EPSILON_HEIGHT;
    pub const DEFAULT_GENERAL_EPSILON: f64 = EPSILON_GENERAL;
    pub const DEFAULT_VOLUMETRIC_DIVISOR: f64 = VOLUMETRIC_DIVISOR;
    pub const DEFAULT_PERFECT_FILL_TOLERANCE: f64 = PERFECT_FILL_TOLERANCE;
    pub const DEFAULT_PARALLEL_PALLETS: bool = true;

    pub fn builder() -> PackingConfigBuilder {
        PackingConfigBuilder::default()
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            height_epsilon: Self::DEFAULT_HEIGHT_EPSILON,
            general_epsilon: Self::DEFAULT_GENERAL_EPSILON,
            volumetric_divisor: Self::DEFAULT_VOLUMETRIC_DIVISOR,
            perfect_fill_tolerance: Self::DEFAULT_PERFECT_FILL_TOLERANCE,
            probe_budget: None,
            parallel_pallets: Self::DEFAULT_PARALLEL_PALLETS,
        }
    }
}

/// Builder for [`PackingConfig`].
#[derive(Clone, Debug, Default)]
pub struct PackingConfigBuilder {
    config: PackingConfig,
}

impl PackingConfigBuilder {
    pub fn height_epsilon(mut self, epsilon: f64) -> Self {
        self.config.height_epsilon = epsilon;
        self
    }

    pub fn general_epsilon(mut self, epsilon: f64) -> Self {
        self.config.general_epsilon = epsilon;
        self
    }

    pub fn volumetric_divisor(mut self, divisor: f64) -> Self {
        self.config.volumetric_divisor = divisor;
        self
    }

    pub fn perfect_fill_tolerance(mut self, tolerance: f64) -> Self {
        self.config.perfect_fill_tolerance = tolerance;
        self
    }

    pub fn probe_budget(mut self, budget: Option<u64>) -> Self {
        self.config.probe_budget = budget;
        self
    }

    pub fn parallel_pallets(mut self, enabled: bool) -> Self {
        self.config.parallel_pallets = enabled;
        self
    }

    pub fn build(self) -> PackingConfig {
        self.config
    }
}

/// Why a box could not be placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnplacedReason {
    /// Opening a new layer would exceed the pallet height.
    ExceedsPalletHeight,
    /// Every layer, rotation and position was rejected.
    NoSupportedPosition,
    /// The configured probe budget ran out first.
    ProbeBudgetExhausted,
}

impl UnplacedReason {
    pub fn code(&self) -> &'static str {
        match self {
            UnplacedReason::ExceedsPalletHeight => "exceeds_pallet_height",
            UnplacedReason::NoSupportedPosition => "no_supported_position",
            UnplacedReason::ProbeBudgetExhausted => "probe_budget_exhausted",
        }
    }
}

impl std::fmt::Display for UnplacedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnplacedReason::ExceedsPalletHeight => {
                write!(f, "A new layer for this box would exceed the pallet height")
            }
            UnplacedReason::NoSupportedPosition => {
                write!(f, "No in-bounds, collision-free and supported position found")
            }
            UnplacedReason::ProbeBudgetExhausted => {
                write!(f, "Search budget exhausted before a position was found")
            }
        }
    }
}

/// State of one pallet while it is being filled.
///
/// Owns the open layers and the placed boxes; nothing is shared between pallets.
#[derive(Debug)]
pub struct PalletRun<'a> {
    pallet: &'a PalletSpec,
    config: PackingConfig,
    /// Open layer heights, ascending, seeded with the floor.
    layers: Vec<f64>,
    placed: Vec<PlacedBox>,
    probes: u64,
}

impl<'a> PalletRun<'a> {
    pub fn new(pallet: &'a PalletSpec, config: PackingConfig) -> Self {
        Self {
            pallet,
            config,
            layers: vec![0.0],
            placed: Vec::new(),
            probes: 0,
        }
    }

    pub fn layers(&self) -> &[f64] {
        &self.layers
    }

    pub fn placed(&self) -> &[PlacedBox] {
        &self.placed
    }

    /// Candidate positions examined so far.
    pub fn probes(&self) -> u64 {
        self.probes
    }

    pub fn into_placed(self) -> Vec<PlacedBox> {
        self.placed
    }

    /// Finds a spot for `unit` and commits it.
    ///
    /// Existing layers are tried bottom-up first; a new layer on top of the
    /// tallest stack is the fallback.
    pub fn place(&mut self, unit: &BoxUnit) -> Result<&PlacedBox, UnplacedReason> {
        let open_layers = self.layers.clone();
        for z in open_layers {
            if let Some(placed) = self.search_layer(unit, z)? {
                return Ok(self.commit(placed));
            }
        }

        let max_height = max_occupied_height(&self.placed);
        if max_height + unit.dims.height > self.pallet.dims.height + self.config.general_epsilon {
            return Err(UnplacedReason::ExceedsPalletHeight);
        }

        match self.search_layer(unit, max_height)? {
            Some(placed) => {
                self.open_layer(max_height);
                Ok(self.commit(placed))
            }
            None => Err(UnplacedReason::NoSupportedPosition),
        }
    }

    /// Scans both rotations at layer `z`, returning the first accepted placement.
    fn search_layer(&mut self, unit: &BoxUnit, z: f64) -> Result<Option<PlacedBox>, UnplacedReason> {
        let eps = self.config.general_epsilon;
        for dims in unit.rotations() {
            for position in candidate_positions(self.pallet, dims, z, eps) {
                self.charge_probe()?;

                let attempt = PlacementAttempt::new(dims, position);
                if !fits(self.pallet, dims, position, eps) {
                    continue;
                }
                if self.placed.iter().any(|p| overlaps(p, &attempt)) {
                    continue;
                }
                if let Some(decision) =
                    first_satisfied_tier(&self.placed, &attempt, self.config.height_epsilon)
                {
                    return Ok(Some(attempt.commit(
                        unit,
                        decision.threshold,
                        decision.percent,
                    )));
                }
            }
        }
        Ok(None)
    }

    fn charge_probe(&mut self) -> Result<(), UnplacedReason> {
        if let Some(budget) = self.config.probe_budget {
            if self.probes >= budget {
                return Err(UnplacedReason::ProbeBudgetExhausted);
            }
        }
        self.probes += 1;
        Ok(())
    }

    fn open_layer(&mut self, z: f64) {
        let eps = self.config.height_epsilon;
        if self.layers.iter().any(|layer| (layer - z).abs() <= eps) {
            return;
        }
        let idx = self.layers.partition_point(|layer| *layer < z);
        self.layers.insert(idx, z);
    }

    fn commit(&mut self, placed: PlacedBox) -> &PlacedBox {
        debug!(
            pallet = self.pallet.id,
            box_id = placed.unit.id,
            name = %placed.unit.name,
            pos = ?placed.position.as_tuple(),
            dims = ?placed.dims.as_tuple(),
            threshold = placed.support_threshold,
            "placed box"
        );
        self.placed.push(placed);
        let last = self.placed.len() - 1;
        &self.placed[last]
    }
}

/// A pallet whose boxes were all placed.
#[derive(Clone, Debug)]
pub struct PalletPacking {
    pub pallet: PalletSpec,
    /// Boxes in placement order.
    pub boxes: Vec<PlacedBox>,
    /// Open layer heights at the end of the run.
    pub layers: Vec<f64>,
    pub metrics: PalletMetrics,
}

impl PalletPacking {
    pub fn volumetric_weight(&self) -> f64 {
        self.metrics.volumetric_weight
    }

    pub fn is_perfect(&self) -> bool {
        self.metrics.is_perfect
    }
}

/// A pallet abandoned at its first unplaceable box.
#[derive(Clone, Debug)]
pub struct PalletFailure {
    pub pallet: PalletSpec,
    pub box_id: usize,
    pub box_name: String,
    pub reason: UnplacedReason,
}

/// Result for one pallet. All-or-nothing: no partial placements are reported.
#[derive(Clone, Debug)]
pub enum PalletOutcome {
    Placed(PalletPacking),
    Failed(PalletFailure),
}

impl PalletOutcome {
    pub fn pallet(&self) -> &PalletSpec {
        match self {
            PalletOutcome::Placed(packing) => &packing.pallet,
            PalletOutcome::Failed(failure) => &failure.pallet,
        }
    }

    pub fn is_placed(&self) -> bool {
        matches!(self, PalletOutcome::Placed(_))
    }
}

/// Results of a multi-pallet run, in pallet order.
#[derive(Clone, Debug)]
pub struct PackingResult {
    pub outcomes: Vec<PalletOutcome>,
}

impl PackingResult {
    /// True when every pallet received all boxes.
    pub fn all_placed(&self) -> bool {
        self.outcomes.iter().all(PalletOutcome::is_placed)
    }

    pub fn pallet_count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_placed()).count()
    }
}

/// Events emitted while packing, for live visualization.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum PackEvent {
    /// A pallet run begins.
    PalletStarted {
        pallet_id: usize,
        label: Option<String>,
        dims: (f64, f64, f64),
        box_count: usize,
    },
    /// A box was accepted.
    BoxPlaced {
        pallet_id: usize,
        id: usize,
        name: String,
        pos: (f64, f64, f64),
        dims: (f64, f64, f64),
        support_threshold: u8,
        support_percent: f64,
        color: &'static str,
    },
    /// A box fit nowhere; the pallet run stops.
    BoxRejected {
        pallet_id: usize,
        id: usize,
        name: String,
        reason_code: String,
        reason_text: String,
    },
    /// A pallet run ended.
    PalletFinished {
        pallet_id: usize,
        placed: bool,
        volumetric_weight: Option<f64>,
        is_perfect: Option<bool>,
    },
    /// All pallets processed.
    Finished { pallets: usize, failed: usize },
}

/// Fills one pallet with the given units.
pub fn pack_pallet(units: &[BoxUnit], pallet: &PalletSpec, config: PackingConfig) -> PalletOutcome {
    pack_pallet_with_progress(units, pallet, config, |_| {})
}

/// Like [`pack_pallet`], reporting each step through `on_event`.
pub fn pack_pallet_with_progress(
    units: &[BoxUnit],
    pallet: &PalletSpec,
    config: PackingConfig,
    mut on_event: impl FnMut(&PackEvent),
) -> PalletOutcome {
    let flow = run_pallet(units, pallet, config, |evt| {
        on_event(evt);
        ControlFlow::<Infallible>::Continue(())
    });
    match flow {
        ControlFlow::Continue(outcome) => outcome,
        ControlFlow::Break(never) => match never {},
    }
}

/// Drives one pallet, stopping as soon as `on_event` breaks.
fn run_pallet<B>(
    units: &[BoxUnit],
    pallet: &PalletSpec,
    config: PackingConfig,
    mut on_event: impl FnMut(&PackEvent) -> ControlFlow<B>,
) -> ControlFlow<B, PalletOutcome> {
    on_event(&PackEvent::PalletStarted {
        pallet_id: pallet.id,
        label: pallet.label.clone(),
        dims: pallet.dims.as_tuple(),
        box_count: units.len(),
    })?;

    let sequence = placement_sequence(units);
    let mut run = PalletRun::new(pallet, config);

    for unit in &sequence {
        match run.place(unit) {
            Ok(placed) => on_event(&PackEvent::BoxPlaced {
                pallet_id: pallet.id,
                id: placed.unit.id,
                name: placed.unit.name.clone(),
                pos: placed.position.as_tuple(),
                dims: placed.dims.as_tuple(),
                support_threshold: placed.support_threshold,
                support_percent: placed.support_percent,
                color: placed.unit.color(),
            })?,
            Err(reason) => {
                warn!(
                    pallet = pallet.id,
                    box_id = unit.id,
                    name = %unit.name,
                    reason = reason.code(),
                    "cannot place box, abandoning pallet"
                );
                on_event(&PackEvent::BoxRejected {
                    pallet_id: pallet.id,
                    id: unit.id,
                    name: unit.name.clone(),
                    reason_code: reason.code().to_string(),
                    reason_text: reason.to_string(),
                })?;
                on_event(&PackEvent::PalletFinished {
                    pallet_id: pallet.id,
                    placed: false,
                    volumetric_weight: None,
                    is_perfect: None,
                })?;
                return ControlFlow::Continue(PalletOutcome::Failed(PalletFailure {
                    pallet: pallet.clone(),
                    box_id: unit.id,
                    box_name: unit.name.clone(),
                    reason,
                }));
            }
        }
    }

    let layers = run.layers().to_vec();
    let probes = run.probes();
    let boxes = run.into_placed();
    let metrics = PalletMetrics::compute(
        pallet,
        &boxes,
        layers.len(),
        config.volumetric_divisor,
        config.perfect_fill_tolerance,
    );
    debug!(
        pallet = pallet.id,
        boxes = boxes.len(),
        layers = layers.len(),
        probes,
        "pallet complete"
    );

    on_event(&PackEvent::PalletFinished {
        pallet_id: pallet.id,
        placed: true,
        volumetric_weight: Some(metrics.volumetric_weight),
        is_perfect: Some(metrics.is_perfect),
    })?;

    ControlFlow::Continue(PalletOutcome::Placed(PalletPacking {
        pallet: pallet.clone(),
        boxes,
        layers,
        metrics,
    }))
}

/// Fills every pallet independently with the same box multiset.
///
/// Pallets run on the rayon pool when `config.parallel_pallets` is set; the
/// outcome order always follows `pallets`.
pub fn pack_pallets(specs: &[BoxSpec], pallets: &[PalletSpec], config: PackingConfig) -> PackingResult {
    let units = expand_units(specs);
    let outcomes: Vec<PalletOutcome> = if config.parallel_pallets {
        pallets
            .par_iter()
            .map(|pallet| pack_pallet(&units, pallet, config))
            .collect()
    } else {
        pallets
            .iter()
            .map(|pallet| pack_pallet(&units, pallet, config))
            .collect()
    };

    let result = PackingResult { outcomes };
    info!(
        pallets = result.pallet_count(),
        failed = result.failed_count(),
        units = units.len(),
        "packing finished"
    );
    result
}

/// Sequential variant of [`pack_pallets`] with a live progress callback.
///
/// Returning `ControlFlow::Break` from `on_event` abandons the run; the
/// function then returns `None` and no further events are emitted.
pub fn pack_pallets_with_progress(
    specs: &[BoxSpec],
    pallets: &[PalletSpec],
    config: PackingConfig,
    mut on_event: impl FnMut(&PackEvent) -> ControlFlow<()>,
) -> Option<PackingResult> {
    let units = expand_units(specs);
    let mut outcomes = Vec::with_capacity(pallets.len());
    for pallet in pallets {
        match run_pallet(&units, pallet, config, &mut on_event) {
            ControlFlow::Continue(outcome) => outcomes.push(outcome),
            ControlFlow::Break(()) => {
                info!(
                    pallet = pallet.id,
                    completed = outcomes.len(),
                    "packing cancelled by caller"
                );
                return None;
            }
        }
    }

    let result = PackingResult { outcomes };
    if on_event(&PackEvent::Finished {
        pallets: result.pallet_count(),
        failed: result.failed_count(),
    })
    .is_break()
    {
        return None;
    }
    Some(result)
}
