use crate::domain::cart::{Cart, SessionId};
use crate::domain::payment::PaymentInfo;
use crate::domain::ports::{OrderStore, ProcessStore};
use crate::domain::process::{OrderId, Process};
use crate::error::{PlaceOrderError, Result};
use crate::infrastructure::in_memory::{
    GatewaySnapshot, GatewaySnapshotStore, OrderStatus, StoredOrder,
};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Column Family for storing place-order processes, keyed by session id.
pub const CF_PROCESSES: &str = "processes";
/// Column Family for storing placed orders, keyed by order id.
pub const CF_ORDERS: &str = "orders";
/// Column Family for storing the simulated gateway's intents.
pub const CF_PAYMENTS: &str = "payments";

const GATEWAY_SNAPSHOT_KEY: &[u8] = b"simulated-gateway";

/// A persistent store implementation using RocksDB.
///
/// Serves as `ProcessStore`, `OrderStore` and `GatewaySnapshotStore`, each in
/// its own Column Family. Values are JSON. `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path, creating the
    /// "processes", "orders" and "payments" column families when missing.
    ///
    /// # Arguments
    ///
    /// * `path` - The directory holding the database files.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_processes = ColumnFamilyDescriptor::new(CF_PROCESSES, Options::default());
        let cf_orders = ColumnFamilyDescriptor::new(CF_ORDERS, Options::default());
        let cf_payments = ColumnFamilyDescriptor::new(CF_PAYMENTS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_processes, cf_orders, cf_payments])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            PlaceOrderError::InternalError(Box::new(std::io::Error::other(format!(
                "{} column family not found",
                name
            ))))
        })
    }

    /// Returns the stored order, cancelled ones included.
    pub async fn get_order(&self, order: &OrderId) -> Result<Option<StoredOrder>> {
        let cf = self.cf(CF_ORDERS)?;
        match self.db.get_cf(&cf, order.0.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ProcessStore for RocksDBStore {
    async fn load(&self, session: &SessionId) -> Result<Option<Process>> {
        let cf = self.cf(CF_PROCESSES)?;
        match self.db.get_cf(&cf, session.as_str().as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, session: &SessionId, process: &Process) -> Result<()> {
        let cf = self.cf(CF_PROCESSES)?;
        let value = serde_json::to_vec(process)?;
        self.db.put_cf(&cf, session.as_str().as_bytes(), value)?;
        Ok(())
    }

    async fn delete(&self, session: &SessionId) -> Result<()> {
        let cf = self.cf(CF_PROCESSES)?;
        self.db.delete_cf(&cf, session.as_str().as_bytes())?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for RocksDBStore {
    async fn persist_order(&self, cart: &Cart, payment: &PaymentInfo) -> Result<OrderId> {
        let cf = self.cf(CF_ORDERS)?;
        let order_id = OrderId(format!("order-{}", Uuid::new_v4().simple()));
        let order = StoredOrder {
            cart: cart.clone(),
            payment: payment.clone(),
            status: OrderStatus::Placed,
        };
        self.db.put_cf(&cf, order_id.0.as_bytes(), serde_json::to_vec(&order)?)?;
        Ok(order_id)
    }

    async fn cancel_order(&self, order: &OrderId) -> Result<()> {
        let mut stored = self.get_order(order).await?.ok_or_else(|| {
            PlaceOrderError::OrderStoreError(format!("order {} not found", order))
        })?;
        stored.status = OrderStatus::Cancelled;

        let cf = self.cf(CF_ORDERS)?;
        self.db.put_cf(&cf, order.0.as_bytes(), serde_json::to_vec(&stored)?)?;
        Ok(())
    }
}

impl GatewaySnapshotStore for RocksDBStore {
    fn load_gateway_snapshot(&self) -> Result<Option<GatewaySnapshot>> {
        let cf = self.cf(CF_PAYMENTS)?;
        match self.db.get_cf(&cf, GATEWAY_SNAPSHOT_KEY)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save_gateway_snapshot(&self, snapshot: &GatewaySnapshot) -> Result<()> {
        let cf = self.cf(CF_PAYMENTS)?;
        self.db.put_cf(&cf, GATEWAY_SNAPSHOT_KEY, serde_json::to_vec(snapshot)?)?;
        Ok(())
    }
}
