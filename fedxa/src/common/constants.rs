use std::time::Duration;

// transaction constants
pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(10);
pub const MIN_PARTICIPANT_TIMEOUT: Duration = Duration::from_secs(10);

// federation constants
pub const DEFAULT_SCHEME: &str = "rmi";
pub const DEFAULT_HOST_ALIASES: [&str; 2] = ["localhost", "127.0.0.1"];

// xid constants
pub const XID_FORMAT_ID: i32 = 0x4658_4131;
pub const MAX_GTRID_SIZE: usize = 64;
pub const MAX_BQUAL_SIZE: usize = 64;
