use crate::domain::frame::Field;
use crate::domain::ports::TransactionLog;
use crate::error::Result;
use chrono::Utc;
use rand::Rng;
use tracing::warn;

const MAX_ATTEMPTS: usize = 10;

/// Issues 12-digit reference numbers that the transaction log has not seen.
pub struct ReferenceIssuer<'a> {
    log: &'a dyn TransactionLog,
}

impl<'a> ReferenceIssuer<'a> {
    pub fn new(log: &'a dyn TransactionLog) -> Self {
        Self { log }
    }

    pub async fn issue(&self) -> Result<String> {
        for _ in 0..MAX_ATTEMPTS {
            let candidate = random_reference(&mut rand::thread_rng());
            if !self.log.reference_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        warn!("no unused reference after {MAX_ATTEMPTS} attempts, using clock fallback");
        Ok(clock_reference())
    }
}

pub fn random_reference<R: Rng>(rng: &mut R) -> String {
    (0..Field::ReferenceNumber.width())
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

fn clock_reference() -> String {
    let millis = Utc::now().timestamp_millis().unsigned_abs();
    let width = Field::ReferenceNumber.width();
    format!("{:0width$}", millis % 10u64.pow(width as u32))
}
