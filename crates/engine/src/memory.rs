//! In-memory store implementations.
//!
//! Intended for tests/dev. Not optimized for performance.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::anyhow;

use procur_approvals::ApprovalRequest;
use procur_assets::Asset;
use procur_core::{AggregateRoot, ExpectedVersion};
use procur_purchasing::{Purchase, PurchaseId};
use procur_receiving::Receipt;

use crate::journal::{JournalPoster, JournalRequest};
use crate::notify::{Notification, NotificationSender};
use crate::store::{
    ApprovalStore, AssetStore, PurchaseStore, ReceiptStore, SequenceStore, StoreError,
};

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_owned())
}

fn check_version(expected: ExpectedVersion, current: Option<u64>) -> Result<(), StoreError> {
    match expected {
        ExpectedVersion::Any => Ok(()),
        ExpectedVersion::Exact(version) if current == Some(version) => Ok(()),
        ExpectedVersion::Exact(version) => Err(StoreError::Concurrency(format!(
            "expected version {version}, found {current:?}"
        ))),
    }
}

/// In-memory purchase store.
#[derive(Debug, Default)]
pub struct InMemoryPurchaseStore {
    purchases: RwLock<HashMap<PurchaseId, Purchase>>,
}

impl InMemoryPurchaseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PurchaseStore for InMemoryPurchaseStore {
    fn get(&self, id: PurchaseId) -> Result<Option<Purchase>, StoreError> {
        let purchases = self.purchases.read().map_err(|_| poisoned())?;
        Ok(purchases.get(&id).cloned())
    }

    fn save(&self, purchase: &Purchase, expected: ExpectedVersion) -> Result<(), StoreError> {
        let mut purchases = self.purchases.write().map_err(|_| poisoned())?;
        let current = purchases.get(purchase.id()).map(Purchase::version);
        check_version(expected, current)?;
        purchases.insert(*purchase.id(), purchase.clone());
        Ok(())
    }

    fn delete(&self, id: PurchaseId) -> Result<(), StoreError> {
        let mut purchases = self.purchases.write().map_err(|_| poisoned())?;
        purchases
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("purchase {id}")))
    }
}

/// In-memory, append-only receipt store.
#[derive(Debug, Default)]
pub struct InMemoryReceiptStore {
    receipts: RwLock<Vec<Receipt>>,
}

impl InMemoryReceiptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReceiptStore for InMemoryReceiptStore {
    fn insert(&self, receipt: &Receipt) -> Result<(), StoreError> {
        let mut receipts = self.receipts.write().map_err(|_| poisoned())?;
        receipts.push(receipt.clone());
        Ok(())
    }

    fn list_for_purchase(&self, purchase_id: PurchaseId) -> Result<Vec<Receipt>, StoreError> {
        let receipts = self.receipts.read().map_err(|_| poisoned())?;
        Ok(receipts
            .iter()
            .filter(|r| r.purchase_id() == purchase_id)
            .cloned()
            .collect())
    }
}

/// In-memory, append-only asset store.
#[derive(Debug, Default)]
pub struct InMemoryAssetStore {
    assets: RwLock<Vec<Asset>>,
}

impl InMemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AssetStore for InMemoryAssetStore {
    fn insert(&self, asset: &Asset) -> Result<(), StoreError> {
        let mut assets = self.assets.write().map_err(|_| poisoned())?;
        assets.push(asset.clone());
        Ok(())
    }

    fn list_for_purchase(&self, purchase_id: PurchaseId) -> Result<Vec<Asset>, StoreError> {
        let assets = self.assets.read().map_err(|_| poisoned())?;
        Ok(assets
            .iter()
            .filter(|a| a.purchase_id() == purchase_id)
            .cloned()
            .collect())
    }
}

/// In-memory approval request store, keyed by purchase.
#[derive(Debug, Default)]
pub struct InMemoryApprovalStore {
    requests: RwLock<HashMap<procur_core::AggregateId, ApprovalRequest>>,
}

impl InMemoryApprovalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ApprovalStore for InMemoryApprovalStore {
    fn get_for_purchase(
        &self,
        purchase_id: PurchaseId,
    ) -> Result<Option<ApprovalRequest>, StoreError> {
        let requests = self.requests.read().map_err(|_| poisoned())?;
        Ok(requests.get(&purchase_id.as_aggregate_id()).cloned())
    }

    fn save(
        &self,
        request: &ApprovalRequest,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError> {
        let mut requests = self.requests.write().map_err(|_| poisoned())?;
        let current = requests
            .get(&request.purchase_id())
            .map(ApprovalRequest::version);
        check_version(expected, current)?;
        requests.insert(request.purchase_id(), request.clone());
        Ok(())
    }
}

/// In-memory document sequence counters.
#[derive(Debug, Default)]
pub struct InMemorySequenceStore {
    counters: RwLock<HashMap<(String, i32, u32), u32>>,
}

impl InMemorySequenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SequenceStore for InMemorySequenceStore {
    fn next(&self, prefix: &str, year: i32, month: u32) -> Result<u32, StoreError> {
        let mut counters = self.counters.write().map_err(|_| poisoned())?;
        let counter = counters
            .entry((prefix.to_owned(), year, month))
            .or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}

/// Collects journal entries instead of posting them anywhere.
#[derive(Debug, Default)]
pub struct InMemoryJournal {
    entries: RwLock<Vec<JournalRequest>>,
}

impl InMemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posted(&self) -> Vec<JournalRequest> {
        self.entries.read().map(|e| e.clone()).unwrap_or_default()
    }
}

impl JournalPoster for InMemoryJournal {
    fn post(&self, request: &JournalRequest) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.push(request.clone());
        Ok(())
    }
}

/// Records notifications; can simulate a broken delivery channel.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub fail_delivery: bool,
    sent: RwLock<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_delivery: true,
            sent: RwLock::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.read().map(|s| s.clone()).unwrap_or_default()
    }
}

impl NotificationSender for RecordingNotifier {
    fn send(&self, notification: &Notification) -> anyhow::Result<()> {
        if self.fail_delivery {
            return Err(anyhow!("notification channel unavailable"));
        }
        let mut sent = self
            .sent
            .write()
            .map_err(|_| anyhow!("lock poisoned"))?;
        sent.push(notification.clone());
        Ok(())
    }
}
