//! Randomness for challenges and user handles.

use rand::RngCore;

/// `len` bytes from the thread-local CSPRNG.
pub fn random_vec(len: usize) -> Vec<u8> {
    let mut data = vec![0; len];
    rand::thread_rng().fill_bytes(&mut data);
    data
}
