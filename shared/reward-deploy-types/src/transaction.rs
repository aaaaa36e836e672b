use alloy_primitives::{Address, Bytes, B256, U256};

/// Legacy (gas price) transaction, prior to signing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub nonce: u64,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    pub gas_limit: u64,
    pub gas_price: U256,
}

impl UnsignedTransaction {
    pub fn is_creation(&self) -> bool {
        self.to.is_none()
    }
}

/// Signed transaction ready for broadcast.
///
/// The hash is known before submission, so a run can always report which transaction it may
/// have broadcast even if the transport fails mid-flight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    pub transaction: UnsignedTransaction,
    /// RLP encoding of the signed transaction.
    pub raw: Bytes,
    pub hash: B256,
}

impl SignedTransaction {
    pub fn nonce(&self) -> u64 {
        self.transaction.nonce
    }
}

/// What the network reports after accepting a transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionOutcome {
    pub hash: B256,
    /// Included with a successful status.
    pub confirmed: bool,
    /// Address of the created contract, for creation transactions.
    pub contract_address: Option<Address>,
}
