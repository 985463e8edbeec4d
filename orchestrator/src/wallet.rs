//! Account keypairs

use anyhow::{bail, Context, Result};
use solana_sdk::signature::Keypair;

/// Secret key followed by public key
const KEYPAIR_LEN: usize = 64;

/// Load a keypair file: a JSON byte array, raw 64 bytes, or a base58 secret
pub fn load_keypair(path: &str) -> Result<Keypair> {
    let expanded_path = shellexpand::tilde(path);
    let bytes = std::fs::read(expanded_path.as_ref())
        .context(format!("Failed to read keypair from {}", path))?;

    parse_keypair(&bytes)
}

/// Raw secret bytes are checked first: any byte value may open a raw key,
/// including `[` and whitespace.
pub fn parse_keypair(bytes: &[u8]) -> Result<Keypair> {
    if bytes.len() == KEYPAIR_LEN {
        return Keypair::try_from(bytes).context("Failed to create keypair from bytes");
    }

    let trimmed = bytes.trim_ascii();

    match trimmed.first() {
        None => bail!("Keypair file is empty"),
        Some(b'[') => {
            let json_data: Vec<u8> =
                serde_json::from_slice(trimmed).context("Failed to parse keypair JSON")?;
            Keypair::try_from(&json_data[..]).context("Failed to create keypair from bytes")
        }
        Some(_) => {
            let text = std::str::from_utf8(trimmed).context("Keypair file is not UTF-8")?;
            keypair_from_base58(text)
        }
    }
}

pub fn keypair_from_base58(secret: &str) -> Result<Keypair> {
    let bytes = bs58::decode(secret.trim())
        .into_vec()
        .context("Failed to decode base58 secret key")?;
    Keypair::try_from(&bytes[..]).context("Failed to create keypair from bytes")
}

/// Write `keypair` as a JSON byte array
pub fn write_keypair_json(keypair: &Keypair, path: &str) -> Result<()> {
    let expanded_path = shellexpand::tilde(path);
    let json = serde_json::to_string(&keypair.to_bytes().to_vec())
        .context("Failed to serialize keypair")?;

    std::fs::write(expanded_path.as_ref(), json)
        .context(format!("Failed to write keypair to {}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signer::{keypair::keypair_from_seed, Signer};

    #[test]
    fn test_json_keypair_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.json");
        let path = path.to_str().unwrap();
        let keypair = Keypair::new();

        write_keypair_json(&keypair, path).unwrap();
        let loaded = load_keypair(path).unwrap();

        assert_eq!(loaded.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_raw_and_base58_formats() {
        let keypair = Keypair::new();

        let raw = parse_keypair(&keypair.to_bytes()).unwrap();
        assert_eq!(raw.pubkey(), keypair.pubkey());

        let encoded = keypair.to_base58_string();
        let decoded = parse_keypair(format!("{encoded}\n").as_bytes()).unwrap();
        assert_eq!(decoded.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_raw_key_starting_with_bracket_or_space() {
        let bracket = keypair_from_seed(&[b'['; 32]).unwrap();
        assert_eq!(bracket.to_bytes()[0], b'[');
        let loaded = parse_keypair(&bracket.to_bytes()).unwrap();
        assert_eq!(loaded.pubkey(), bracket.pubkey());

        let mut seed = [7u8; 32];
        seed[0] = b' ';
        seed[31] = b'\n';
        let padded = keypair_from_seed(&seed).unwrap();
        let loaded = parse_keypair(&padded.to_bytes()).unwrap();
        assert_eq!(loaded.pubkey(), padded.pubkey());
    }

    #[test]
    fn test_raw_key_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.bin");
        let keypair = keypair_from_seed(&[b'['; 32]).unwrap();
        std::fs::write(&path, keypair.to_bytes()).unwrap();

        let loaded = load_keypair(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_empty_file_rejected() {
        assert!(parse_keypair(b"").is_err());
        assert!(parse_keypair(b"  \n").is_err());
    }
}
