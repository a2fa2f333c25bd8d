//! # Transactional Store
//!
//! An in-process row store run as an actor. The actor owns every table and
//! executes one transaction at a time, so each transaction reads and writes a
//! consistent view of the data.
//!
//! Writes made through a [`Transaction`] are staged and only reach the tables
//! when the transaction commits. Dropping a transaction without committing
//! discards everything it wrote.

use std::collections::BTreeMap;
use std::fmt::{self, Debug, Display};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, instrument};

use crate::domain::{Product, PurchaseOrder, SalesOrder};

/// Identity of a row within its table. Assigned by the store on insert.
pub type RowId = u64;

// =============================================================================
// 1. THE ABSTRACTION (rows and tables)
// =============================================================================

/// A row type that lives in one of the store's tables.
///
/// Implemented for every domain row by the `tables!` invocation below.
pub trait Entity: Clone + Debug + Send + Sync + 'static {
    /// Table name, used in logs and storage errors.
    const TABLE: &'static str;

    fn id(&self) -> RowId;

    fn table(tables: &Tables) -> &Table<Self>;
    fn staged(changes: &Changes) -> &Staged<Self>;
    fn staged_mut(changes: &mut Changes) -> &mut Staged<Self>;
}

/// Committed rows of one table.
#[derive(Debug)]
pub struct Table<T: Entity> {
    rows: BTreeMap<RowId, T>,
    next_id: RowId,
}

impl<T: Entity> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T: Entity> Table<T> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: RowId) -> Option<&T> {
        self.rows.get(&id)
    }
}

/// Writes to one table staged by an open transaction. `None` marks a delete.
#[derive(Debug)]
pub struct Staged<T: Entity> {
    writes: BTreeMap<RowId, Option<T>>,
    allocated: RowId,
}

impl<T: Entity> Default for Staged<T> {
    fn default() -> Self {
        Self {
            writes: BTreeMap::new(),
            allocated: 0,
        }
    }
}

impl<T: Entity> Staged<T> {
    fn apply(self, table: &mut Table<T>) {
        for (id, write) in self.writes {
            match write {
                Some(row) => {
                    table.rows.insert(id, row);
                }
                None => {
                    table.rows.remove(&id);
                }
            }
        }
        table.next_id += self.allocated;
    }
}

macro_rules! tables {
    ($($entity:ty => $field:ident),* $(,)?) => {
        /// Committed rows of every table.
        #[derive(Debug, Default)]
        pub struct Tables {
            $(pub $field: Table<$entity>,)*
        }

        /// Every write staged by one transaction.
        #[derive(Debug, Default)]
        pub struct Changes {
            $($field: Staged<$entity>,)*
        }

        impl Changes {
            fn apply(self, tables: &mut Tables) {
                $(self.$field.apply(&mut tables.$field);)*
            }

            fn write_count(&self) -> usize {
                0 $(+ self.$field.writes.len())*
            }
        }

        $(
            impl Entity for $entity {
                const TABLE: &'static str = stringify!($field);

                fn id(&self) -> RowId {
                    self.id
                }

                fn table(tables: &Tables) -> &Table<Self> {
                    &tables.$field
                }

                fn staged(changes: &Changes) -> &Staged<Self> {
                    &changes.$field
                }

                fn staged_mut(changes: &mut Changes) -> &mut Staged<Self> {
                    &mut changes.$field
                }
            }
        )*
    };
}

tables! {
    Product => products,
    PurchaseOrder => purchase_orders,
    SalesOrder => sales_orders,
}

// =============================================================================
// 2. ERRORS AND FAIL POINTS
// =============================================================================

/// Storage operations, as named by fail points and storage errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Read,
    Insert,
    Save,
    Delete,
    Commit,
}

impl Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreOp::Read => "read",
            StoreOp::Insert => "insert",
            StoreOp::Save => "save",
            StoreOp::Delete => "delete",
            StoreOp::Commit => "commit",
        };
        f.write_str(name)
    }
}

/// Makes one storage operation fail every time it runs.
///
/// A fail point with no table matches the operation on every table; commit is
/// not table-specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailPoint {
    pub op: StoreOp,
    pub table: Option<&'static str>,
}

impl FailPoint {
    pub fn on<T: Entity>(op: StoreOp) -> Self {
        Self {
            op,
            table: Some(T::TABLE),
        }
    }

    pub fn on_commit() -> Self {
        Self {
            op: StoreOp::Commit,
            table: None,
        }
    }

    fn matches(&self, op: StoreOp, table: &str) -> bool {
        self.op == op && self.table.map_or(true, |name| name == table)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{table} row {id} does not exist")]
    MissingRow { table: &'static str, id: RowId },
    #[error("{op} failed on {table}")]
    OperationFailed { op: StoreOp, table: &'static str },
    #[error("store is closed")]
    Closed,
    #[error("store dropped the transaction")]
    Dropped,
}

// =============================================================================
// 3. THE TRANSACTION
// =============================================================================

/// A unit of work against the store.
///
/// Reads see committed rows overlaid with this transaction's own staged
/// writes. Nothing becomes visible to other transactions before [`commit`].
///
/// [`commit`]: Transaction::commit
pub struct Transaction<'a> {
    tables: &'a mut Tables,
    changes: Changes,
    fail_point: Option<FailPoint>,
}

impl<'a> Transaction<'a> {
    pub fn begin(tables: &'a mut Tables, fail_point: Option<FailPoint>) -> Self {
        Self {
            tables,
            changes: Changes::default(),
            fail_point,
        }
    }

    fn check(&self, op: StoreOp, table: &'static str) -> Result<(), StoreError> {
        match self.fail_point {
            Some(point) if point.matches(op, table) => {
                Err(StoreError::OperationFailed { op, table })
            }
            _ => Ok(()),
        }
    }

    fn lookup<T: Entity>(&self, id: RowId) -> Option<&T> {
        match T::staged(&self.changes).writes.get(&id) {
            Some(write) => write.as_ref(),
            None => T::table(self.tables).get(id),
        }
    }

    fn visible<T: Entity>(&self) -> impl Iterator<Item = &T> + '_ {
        let staged = T::staged(&self.changes);
        T::table(self.tables)
            .rows
            .iter()
            .filter(move |(id, _)| !staged.writes.contains_key(*id))
            .map(|(_, row)| row)
            .chain(staged.writes.values().flatten())
    }

    pub fn find<T: Entity>(&self, id: RowId) -> Result<Option<T>, StoreError> {
        self.check(StoreOp::Read, T::TABLE)?;
        Ok(self.lookup::<T>(id).cloned())
    }

    /// Rows matching `predicate`, ordered by id.
    pub fn find_where<T: Entity>(
        &self,
        predicate: impl Fn(&T) -> bool,
    ) -> Result<Vec<T>, StoreError> {
        self.check(StoreOp::Read, T::TABLE)?;
        let mut rows: Vec<T> = self
            .visible::<T>()
            .filter(|row| predicate(row))
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.id());
        Ok(rows)
    }

    pub fn count<T: Entity>(&self, predicate: impl Fn(&T) -> bool) -> Result<usize, StoreError> {
        self.check(StoreOp::Read, T::TABLE)?;
        Ok(self.visible::<T>().filter(|row| predicate(row)).count())
    }

    /// Stages a new row. `build` receives the id the store assigned to it.
    pub fn insert<T: Entity>(&mut self, build: impl FnOnce(RowId) -> T) -> Result<T, StoreError> {
        self.try_insert(|id| Ok(build(id)))
    }

    /// Stages a new row whose construction can fail. Nothing is staged and
    /// no id is consumed when `build` fails.
    pub fn try_insert<T, E>(&mut self, build: impl FnOnce(RowId) -> Result<T, E>) -> Result<T, E>
    where
        T: Entity,
        E: From<StoreError>,
    {
        self.check(StoreOp::Insert, T::TABLE)?;
        let id = T::table(self.tables).next_id + T::staged(&self.changes).allocated;
        let row = build(id)?;
        debug_assert_eq!(row.id(), id);

        let staged = T::staged_mut(&mut self.changes);
        staged.allocated += 1;
        staged.writes.insert(id, Some(row.clone()));
        Ok(row)
    }

    /// Stages a new version of an existing row.
    pub fn save<T: Entity>(&mut self, row: T) -> Result<T, StoreError> {
        self.check(StoreOp::Save, T::TABLE)?;
        let id = row.id();
        if self.lookup::<T>(id).is_none() {
            return Err(StoreError::MissingRow { table: T::TABLE, id });
        }
        T::staged_mut(&mut self.changes)
            .writes
            .insert(id, Some(row.clone()));
        Ok(row)
    }

    pub fn delete<T: Entity>(&mut self, id: RowId) -> Result<(), StoreError> {
        self.check(StoreOp::Delete, T::TABLE)?;
        if self.lookup::<T>(id).is_none() {
            return Err(StoreError::MissingRow { table: T::TABLE, id });
        }
        T::staged_mut(&mut self.changes).writes.insert(id, None);
        Ok(())
    }

    /// Publishes every staged write at once.
    pub fn commit(self) -> Result<(), StoreError> {
        self.check(StoreOp::Commit, "transaction")?;
        let writes = self.changes.write_count();
        self.changes.apply(self.tables);
        debug!(writes, "Transaction committed");
        Ok(())
    }

    /// Discards every staged write.
    pub fn rollback(self) {
        debug!(
            writes = self.changes.write_count(),
            "Transaction rolled back"
        );
    }
}

// =============================================================================
// 4. THE ACTOR SERVER
// =============================================================================

type Job = Box<dyn FnOnce(&mut Tables, Option<FailPoint>) + Send>;

pub enum StoreRequest {
    Transact { job: Job },
    Shutdown,
}

impl Debug for StoreRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreRequest::Transact { .. } => f.write_str("Transact"),
            StoreRequest::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Owns the tables and runs transactions in arrival order.
pub struct StoreActor {
    receiver: mpsc::Receiver<StoreRequest>,
    tables: Tables,
    fail_point: Option<FailPoint>,
}

impl StoreActor {
    pub fn new(buffer_size: usize) -> (Self, StoreClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            tables: Tables::default(),
            fail_point: None,
        };
        (actor, StoreClient::new(sender))
    }

    pub fn with_fail_point(mut self, fail_point: FailPoint) -> Self {
        self.fail_point = Some(fail_point);
        self
    }

    #[instrument(name = "store", skip(self))]
    pub async fn run(mut self) {
        info!("Store starting");
        let mut transactions: u64 = 0;

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::Transact { job } => {
                    transactions += 1;
                    job(&mut self.tables, self.fail_point);
                }
                StoreRequest::Shutdown => {
                    info!("Store shutting down");
                    break;
                }
            }
        }

        info!(transactions, "Store stopped");
    }
}

// =============================================================================
// 5. THE CLIENT
// =============================================================================

/// Cloneable handle to the store. Every component that touches storage is
/// handed one of these explicitly.
#[derive(Clone)]
pub struct StoreClient {
    sender: mpsc::Sender<StoreRequest>,
}

impl StoreClient {
    pub(crate) fn new(sender: mpsc::Sender<StoreRequest>) -> Self {
        Self { sender }
    }

    /// Runs `work` inside a transaction.
    ///
    /// The transaction commits when `work` returns `Ok` and rolls back when it
    /// returns `Err`. A failed commit is reported as the error.
    pub async fn transaction<R, E, F>(&self, work: F) -> Result<R, E>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<R, E> + Send + 'static,
        R: Send + 'static,
        E: From<StoreError> + Display + Send + 'static,
    {
        let (respond_to, response) = oneshot::channel();
        let job: Job = Box::new(move |tables, fail_point| {
            let mut tx = Transaction::begin(tables, fail_point);
            let outcome = match work(&mut tx) {
                Ok(value) => match tx.commit() {
                    Ok(()) => Ok(value),
                    Err(e) => {
                        error!(error = %e, "Commit failed");
                        Err(E::from(e))
                    }
                },
                Err(e) => {
                    debug!(error = %e, "Transaction aborted");
                    tx.rollback();
                    Err(e)
                }
            };
            let _ = respond_to.send(outcome);
        });

        self.sender
            .send(StoreRequest::Transact { job })
            .await
            .map_err(|_| E::from(StoreError::Closed))?;
        response.await.map_err(|_| E::from(StoreError::Dropped))?
    }

    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        debug!("Sending shutdown request");
        self.sender
            .send(StoreRequest::Shutdown)
            .await
            .map_err(|_| StoreError::Closed)
    }
}
