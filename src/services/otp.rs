use rand::{distributions::Uniform, rngs::OsRng, Rng};

/// Generates fixed-length numeric one-time codes from the OS entropy
/// source. Codes are single-use; clearing a consumed code is the account
/// service's job.
#[derive(Debug, Clone, Copy)]
pub struct OtpGenerator {
    length: usize,
}

impl OtpGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    pub fn generate(&self) -> String {
        OsRng
            .sample_iter(Uniform::new(0u8, 10))
            .take(self.length)
            .map(|d| char::from(b'0' + d))
            .collect()
    }
}
