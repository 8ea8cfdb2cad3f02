//! In-memory node for exercising the workflow without a chain.
//!
//! It understands exactly what the factory workflow sends: creation transactions whose
//! last word is the `feeToSetter` constructor argument, `setFeeTo(address)` calls, and
//! `feeToSetter()` / `feeTo()` reads.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use alloy_core::primitives::{Address, B256, Bytes, keccak256};

use crate::{
    abi,
    error::{DeployError, Result},
    rpc::{EthRpc, TransactionReceipt, TransactionRequest},
};

#[derive(Debug, Clone)]
struct MockFactory {
    code: Bytes,
    fee_to_setter: Address,
    fee_to: Address,
}

#[derive(Debug, Default)]
struct MockState {
    chain_id: u64,
    accounts: Vec<Address>,
    nonces: HashMap<Address, u64>,
    factories: HashMap<Address, MockFactory>,
    receipts: HashMap<B256, TransactionReceipt>,
    sent: Vec<TransactionRequest>,
    block_number: u64,
    requests: usize,
    receipt_polls: u32,
    pending_polls: u32,
    reject_transactions: Option<String>,
    disconnect_on_send: bool,
    revert_creations: bool,
    reported_fee_to_setter: Option<Address>,
    unreachable: bool,
}

/// A fake JSON-RPC node that mines every transaction instantly.
#[derive(Debug, Default)]
pub struct MockNode {
    state: Mutex<MockState>,
}

impl MockNode {
    pub fn new(chain_id: u64, accounts: Vec<Address>) -> Self {
        Self {
            state: Mutex::new(MockState {
                chain_id,
                accounts,
                ..Default::default()
            }),
        }
    }

    /// Report receipts as pending for the next `polls` lookups.
    pub fn with_pending_polls(self, polls: u32) -> Self {
        self.lock().pending_polls = polls;
        self
    }

    /// Refuse every `eth_sendTransaction` with `message`.
    pub fn rejecting_transactions(self, message: &str) -> Self {
        self.lock().reject_transactions = Some(message.to_string());
        self
    }

    /// Drop the connection on every `eth_sendTransaction`, after reads have succeeded.
    pub fn disconnecting_on_send(self) -> Self {
        self.lock().disconnect_on_send = true;
        self
    }

    /// Mine creation transactions with a failed status.
    pub fn reverting_creations(self) -> Self {
        self.lock().revert_creations = true;
        self
    }

    /// Answer `feeToSetter()` with `address` regardless of what was constructed.
    pub fn reporting_fee_to_setter(self, address: Address) -> Self {
        self.lock().reported_fee_to_setter = Some(address);
        self
    }

    /// Fail every request as if the endpoint could not be reached.
    pub fn unreachable(self) -> Self {
        self.lock().unreachable = true;
        self
    }

    /// Drop all deployed contracts, like restarting a dev chain.
    pub fn reset_chain(&self) {
        let mut state = self.lock();
        state.factories.clear();
        state.nonces.clear();
    }

    /// Number of contract creation transactions received.
    pub fn creation_count(&self) -> usize {
        self.lock().sent.iter().filter(|tx| tx.to.is_none()).count()
    }

    pub fn sent_transactions(&self) -> Vec<TransactionRequest> {
        self.lock().sent.clone()
    }

    /// Total number of RPC requests served.
    pub fn request_count(&self) -> usize {
        self.lock().requests
    }

    pub fn receipt_polls(&self) -> u32 {
        self.lock().receipt_polls
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock node state poisoned")
    }

    /// Count a request and fail it if the node is unreachable.
    fn begin(&self, method: &str) -> Result<MutexGuard<'_, MockState>> {
        let mut state = self.lock();
        state.requests += 1;
        if state.unreachable {
            return Err(DeployError::Network(format!(
                "Failed to send {method} request: connection refused"
            )));
        }
        Ok(state)
    }
}

impl MockState {
    fn next_nonce(&mut self, from: Address) -> u64 {
        let nonce = self.nonces.entry(from).or_default();
        let current = *nonce;
        *nonce += 1;
        current
    }

    fn execute(&mut self, tx: &TransactionRequest) -> (bool, Option<Address>) {
        match tx.to {
            None => self.execute_create(tx),
            Some(to) => (self.execute_call(tx.from, to, &tx.data), None),
        }
    }

    fn execute_create(&mut self, tx: &TransactionRequest) -> (bool, Option<Address>) {
        if self.revert_creations || tx.data.len() < 32 {
            return (false, None);
        }

        let nonce = self.next_nonce(tx.from);
        let mut preimage = tx.from.to_vec();
        preimage.extend_from_slice(&nonce.to_be_bytes());
        let address = Address::from_slice(&keccak256(&preimage)[12..]);

        let split = tx.data.len() - 32;
        let Ok(fee_to_setter) = abi::decode_address(&tx.data[split..]) else {
            return (false, None);
        };

        self.factories.insert(
            address,
            MockFactory {
                code: Bytes::from(tx.data[..split].to_vec()),
                fee_to_setter,
                fee_to: Address::ZERO,
            },
        );

        (true, Some(address))
    }

    fn execute_call(&mut self, from: Address, to: Address, data: &[u8]) -> bool {
        self.next_nonce(from);

        let Some(factory) = self.factories.get_mut(&to) else {
            return false;
        };

        if data.len() != 36 || data[..4] != abi::selector(abi::SET_FEE_TO) {
            return false;
        }

        // UniswapV2Factory: require(msg.sender == feeToSetter, 'FORBIDDEN')
        if from != factory.fee_to_setter {
            return false;
        }

        match abi::decode_address(&data[4..]) {
            Ok(fee_to) => {
                factory.fee_to = fee_to;
                true
            }
            Err(_) => false,
        }
    }
}

impl EthRpc for MockNode {
    async fn chain_id(&self) -> Result<u64> {
        Ok(self.begin("eth_chainId")?.chain_id)
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(self.begin("eth_accounts")?.accounts.clone())
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256> {
        let mut state = self.begin("eth_sendTransaction")?;

        if state.disconnect_on_send {
            return Err(DeployError::Network(
                "Failed to send eth_sendTransaction request: connection reset".to_string(),
            ));
        }

        // Error responses from the node reject the transaction itself.
        if let Some(message) = &state.reject_transactions {
            return Err(DeployError::Deployment(format!(
                "eth_sendTransaction RPC error: {message}"
            )));
        }

        if !state.accounts.contains(&tx.from) {
            return Err(DeployError::Deployment(format!(
                "eth_sendTransaction RPC error: unknown account {}",
                tx.from
            )));
        }

        state.sent.push(tx.clone());
        let index = state.sent.len() as u64;

        let mut preimage = tx.from.to_vec();
        preimage.extend_from_slice(&index.to_be_bytes());
        preimage.extend_from_slice(&tx.data);
        let tx_hash = keccak256(&preimage);

        let (success, contract_address) = state.execute(&tx);
        state.block_number += 1;
        let receipt = TransactionReceipt {
            transaction_hash: tx_hash,
            contract_address,
            status: Some(u64::from(success)),
            block_number: Some(state.block_number),
        };
        state.receipts.insert(tx_hash, receipt);

        Ok(tx_hash)
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>> {
        let mut state = self.begin("eth_getTransactionReceipt")?;
        state.receipt_polls += 1;

        if state.pending_polls > 0 {
            state.pending_polls -= 1;
            return Ok(None);
        }

        Ok(state.receipts.get(&hash).cloned())
    }

    async fn code_at(&self, address: Address) -> Result<Bytes> {
        let state = self.begin("eth_getCode")?;
        Ok(state
            .factories
            .get(&address)
            .map(|f| f.code.clone())
            .unwrap_or_default())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let state = self.begin("eth_call")?;

        let Some(factory) = state.factories.get(&to) else {
            // Calls to an address without code return empty data.
            return Ok(Bytes::new());
        };

        let word = if data[..] == abi::selector(abi::FEE_TO_SETTER) {
            state
                .reported_fee_to_setter
                .unwrap_or(factory.fee_to_setter)
        } else if data[..] == abi::selector(abi::FEE_TO) {
            factory.fee_to
        } else {
            return Err(DeployError::Network(
                "eth_call RPC error: execution reverted".to_string(),
            ));
        };

        Ok(Bytes::from(abi::encode_address(word).to_vec()))
    }
}
