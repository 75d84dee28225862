use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, AeadCore, Nonce};
use hkdf::Hkdf;
use sha2::Sha256;

const HKDF_SALT: &[u8] = b"hackboard-v1";
const HKDF_INFO: &[u8] = b"session-cookie";

fn cipher(key: &str) -> Result<Aes256Gcm, String> {
    let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), key.as_bytes());
    let mut okm = [0u8; 32];
    hk.expand(HKDF_INFO, &mut okm)
        .map_err(|e| format!("Key derivation failed: {e}"))?;
    Aes256Gcm::new_from_slice(&okm).map_err(|e| format!("Invalid key: {e}"))
}

/// Encrypt with AES-256-GCM and hex-encode `nonce || ciphertext`, ready for a cookie value.
pub fn seal(plaintext: &str, key: &str) -> Result<String, String> {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher(key)?
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|e| format!("Encryption failed: {e}"))?;

    let mut sealed = nonce.to_vec();
    sealed.extend_from_slice(&ciphertext);
    Ok(hex::encode(sealed))
}

/// Reverse of [`seal`]. Fails if the value was altered or sealed under another key.
pub fn open(sealed: &str, key: &str) -> Result<String, String> {
    let data = hex::decode(sealed).map_err(|e| format!("Invalid encoding: {e}"))?;
    if data.len() < 12 {
        return Err("Ciphertext too short".to_string());
    }

    let (nonce, ciphertext) = data.split_at(12);
    let plaintext = cipher(key)?
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|e| format!("Decryption failed: {e}"))?;

    String::from_utf8(plaintext).map_err(|e| format!("Invalid UTF-8: {e}"))
}
