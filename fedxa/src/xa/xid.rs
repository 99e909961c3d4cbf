use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

use crate::common::{MAX_BQUAL_SIZE, MAX_GTRID_SIZE, XID_FORMAT_ID};
use crate::errors::{FedError, FedResult};
use crate::xa::XaCode;

/// Global transaction identifier handed out by the transaction manager.
///
/// Equality and hashing cover the format id, the global transaction id and
/// the branch qualifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Xid {
    format_id: i32,
    global_transaction_id: Vec<u8>,
    branch_qualifier: Vec<u8>,
}

impl Xid {
    pub fn new(
        format_id: i32,
        global_transaction_id: &[u8],
        branch_qualifier: &[u8],
    ) -> FedResult<Self> {
        if global_transaction_id.len() > MAX_GTRID_SIZE {
            return Err(FedError::xa(
                &format!(
                    "Global transaction id exceeds {} bytes",
                    MAX_GTRID_SIZE
                ),
                XaCode::Invalid,
            ));
        }
        if branch_qualifier.len() > MAX_BQUAL_SIZE {
            return Err(FedError::xa(
                &format!("Branch qualifier exceeds {} bytes", MAX_BQUAL_SIZE),
                XaCode::Invalid,
            ));
        }

        Ok(Xid {
            format_id,
            global_transaction_id: global_transaction_id.to_vec(),
            branch_qualifier: branch_qualifier.to_vec(),
        })
    }

    /// Generates a fresh Xid with a random global transaction id, for callers
    /// driving the coordinator without a transaction manager.
    pub fn generate() -> Self {
        let uuid = Uuid::new_v4();
        Xid {
            format_id: XID_FORMAT_ID,
            global_transaction_id: uuid.as_bytes().to_vec(),
            branch_qualifier: vec![0u8; 4],
        }
    }

    pub fn format_id(&self) -> i32 {
        self.format_id
    }

    pub fn global_transaction_id(&self) -> &[u8] {
        &self.global_transaction_id
    }

    pub fn branch_qualifier(&self) -> &[u8] {
        &self.branch_qualifier
    }
}

fn write_hex(f: &mut Formatter<'_>, bytes: &[u8]) -> std::fmt::Result {
    for b in bytes {
        write!(f, "{:02x}", b)?;
    }
    Ok(())
}

impl Display for Xid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:", self.format_id)?;
        write_hex(f, &self.global_transaction_id)?;
        write!(f, ":")?;
        write_hex(f, &self.branch_qualifier)?;
        write!(f, "]")
    }
}
