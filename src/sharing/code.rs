use rand::Rng;

const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Random source behind the access codes. Kept as a trait so the default
/// non-cryptographic generator can be swapped for a CSPRNG-backed one
/// without touching the grant lifecycle.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self, length: usize) -> String;
}

/// Base-36 codes from the thread-local RNG. Short codes are guessable with
/// enough attempts; do not rely on them as a security boundary.
#[derive(Debug, Default)]
pub struct ThreadRngCodes;

impl CodeGenerator for ThreadRngCodes {
    fn generate(&self, length: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..length)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }
}
