use log::{debug, warn};
use std::sync::atomic::{AtomicU64, Ordering};

use super::category::{CategorySet, SortMode};
use super::error::UpdateError;
use super::ledger::MergeLedger;
use super::projection::Projection;
use crate::package::PackageRecord;
use crate::source::SourceId;

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Handle for one update transaction, returned by [`DiffSession::update_start`].
///
/// A handle is only valid for the session that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOp {
    session: u64,
    id: u64,
    mode: SortMode,
}

impl UpdateOp {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn mode(&self) -> SortMode {
        self.mode
    }
}

#[derive(Debug)]
struct OpenUpdate {
    id: u64,
    baseline: Projection,
}

/// In-memory reconciliation session.
///
/// Holds the merge ledger and one category partition per sort mode. Only the
/// partition of the active mode is kept up to date; switching modes discards
/// the other one.
///
/// ```text
/// let op = session.update_start(SortMode::ByApi);
/// session.update_source_packages(&op, None, &installed)?;
/// session.update_source_packages(&op, Some(&repo), &offered)?;
/// let changed = session.update_end(&op)?;
/// ```
#[derive(Debug)]
pub struct DiffSession {
    ledger: MergeLedger,
    by_api: CategorySet,
    by_source: CategorySet,
    mode: SortMode,
    session: u64,
    next_op: u64,
    open: Option<OpenUpdate>,
}

impl Default for DiffSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffSession {
    pub fn new() -> Self {
        Self {
            ledger: MergeLedger::new(),
            by_api: CategorySet::new(SortMode::ByApi),
            by_source: CategorySet::new(SortMode::BySource),
            mode: SortMode::ByApi,
            session: NEXT_SESSION.fetch_add(1, Ordering::Relaxed),
            next_op: 1,
            open: None,
        }
    }

    /// The active sort mode.
    pub fn mode(&self) -> SortMode {
        self.mode
    }

    pub fn ledger(&self) -> &MergeLedger {
        &self.ledger
    }

    /// Category partition for `mode`. The inactive one is empty after a switch.
    pub fn categories(&self, mode: SortMode) -> &CategorySet {
        match mode {
            SortMode::ByApi => &self.by_api,
            SortMode::BySource => &self.by_source,
        }
    }

    /// Snapshot of the active partition.
    pub fn projection(&self) -> Projection {
        let set = self.categories(self.mode);
        Projection::new(set.mode(), set.generation(), set.categories().to_vec())
    }

    /// Open a transaction grouping items by `mode`.
    ///
    /// An update still open is superseded; its handle stops working.
    pub fn update_start(&mut self, mode: SortMode) -> UpdateOp {
        let baseline = self.projection();
        let id = self.next_op;
        self.next_op += 1;

        if let Some(previous) = self.open.take() {
            warn!(
                "Update #{} was never ended, superseded by update #{}",
                previous.id, id
            );
        }

        if mode != self.mode {
            debug!("Switching sort mode from {} to {}", self.mode, mode);
            self.active_mut().clear();
            self.mode = mode;
        }
        self.rebuild();

        self.open = Some(OpenUpdate { id, baseline });
        debug!("Started update #{} sorted by {}", id, mode);
        UpdateOp {
            session: self.session,
            id,
            mode,
        }
    }

    /// Merge the full current package list of one source.
    ///
    /// `source` is `None` for the installed packages. Returns true if any
    /// merged item appeared, disappeared or changed state.
    pub fn update_source_packages(
        &mut self,
        op: &UpdateOp,
        source: Option<&SourceId>,
        packages: &[PackageRecord],
    ) -> Result<bool, UpdateError> {
        self.check(op)?;

        let changed = self.ledger.merge(source, packages);
        self.rebuild();

        debug!(
            "Update #{}: {} package(s) from {}, changed={}",
            op.id,
            packages.len(),
            source.map_or_else(|| "local".to_string(), |s| s.to_string()),
            changed
        );
        Ok(changed)
    }

    /// Close the transaction.
    ///
    /// Returns true if the projection differs from the one visible before
    /// [`DiffSession::update_start`].
    pub fn update_end(&mut self, op: &UpdateOp) -> Result<bool, UpdateError> {
        self.check(op)?;
        self.rebuild();

        let changed = match self.open.take() {
            Some(open) => self.projection() != open.baseline,
            None => return Err(UpdateError::Closed { op: op.id }),
        };

        debug!("Ended update #{}, changed={}", op.id, changed);
        Ok(changed)
    }

    fn check(&self, op: &UpdateOp) -> Result<(), UpdateError> {
        if op.session != self.session || op.id == 0 || op.id >= self.next_op {
            return Err(UpdateError::NotStarted);
        }
        match &self.open {
            Some(open) if open.id == op.id => Ok(()),
            Some(open) if op.id < open.id => Err(UpdateError::Superseded {
                op: op.id,
                current: open.id,
            }),
            _ => Err(UpdateError::Closed { op: op.id }),
        }
    }

    fn active_mut(&mut self) -> &mut CategorySet {
        match self.mode {
            SortMode::ByApi => &mut self.by_api,
            SortMode::BySource => &mut self.by_source,
        }
    }

    fn rebuild(&mut self) {
        let items = self.ledger.items();
        if self.active_mut().rebuild(&items) {
            debug!("Categories regrouped for {} item(s)", items.len());
        }
    }
}
