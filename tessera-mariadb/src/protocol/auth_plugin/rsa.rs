use std::str::from_utf8;

use bytes::buf::Chain;
use bytes::Bytes;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Oaep, RsaPublicKey};

use crate::error::Result;

pub(crate) fn encrypt(
    plugin: &'static str,
    key: &[u8],
    password: &str,
    nonce: &Chain<Bytes, Bytes>,
) -> Result<Vec<u8>> {
    // xor the password with the given nonce
    let mut pass = to_asciz(password);

    let (a, b) = (nonce.first_ref(), nonce.last_ref());
    let mut nonce = Vec::with_capacity(a.len() + b.len());

    nonce.extend_from_slice(a);
    nonce.extend_from_slice(b);

    if !nonce.is_empty() {
        super::xor_eq(&mut pass, &nonce);
    }

    // client sends an RSA encrypted password
    let public = parse_rsa_pub_key(plugin, key)?;
    let padding = Oaep::new::<sha1::Sha1>();

    public
        .encrypt(&mut rand::thread_rng(), padding, &pass[..])
        .map_err(|err| super::err(plugin, &err))
}

// MySQL sends a PKCS#8 `PUBLIC KEY`; some servers send a PKCS#1 `RSA PUBLIC KEY`
fn parse_rsa_pub_key(plugin: &'static str, key: &[u8]) -> Result<RsaPublicKey> {
    let key = from_utf8(key).map_err(|err| super::err(plugin, &err))?;
    let key = key.trim_end_matches('\0');

    RsaPublicKey::from_public_key_pem(key)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(key))
        .map_err(|err| super::err(plugin, &err))
}

fn to_asciz(s: &str) -> Vec<u8> {
    let mut z = String::with_capacity(s.len() + 1);
    z.push_str(s);
    z.push('\0');

    z.into_bytes()
}

#[cfg(test)]
mod tests {
    use bytes::{Buf, Bytes};

    use super::encrypt;

    const PUBLIC_KEY: &[u8] = b"-----BEGIN PUBLIC KEY-----\nMIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEAwnXi3nr9TmN+NF49A3Y7\nUBnAVhApNJy2cmuf/y6vFM9eHFu5T80Ij1qYc6c79oAGA8nNNCFQL+0j5De88cln\nKrlzq/Ab3U+j5SqgNwk//F6Y3iyjV4L7feSDqjpcheFzkjEslbm/yoRwQ78AAU6s\nqA0hcFuh66mcvnotDrvZAGQ8U2EbbZa6oiR3wrgbzifSKq767g65zIrCpoyxzKMH\nAETSDIaMKpFio4dRATKT5ASQtPoIyxSBmjRtc22sqlhEeiejEMsJzd6Bliuait+A\nkTXL6G1Tbam26Dok/L88CnTAWAkLwTA3bjPcS8Zl9gTsJvoiMuwW1UPEVV/aJ11Z\n/wIDAQAB\n-----END PUBLIC KEY-----\n";

    #[test]
    fn it_encrypts_with_a_2048_bit_key() -> anyhow::Result<()> {
        let nonce = Bytes::from_static(b"abcdefgh").chain(Bytes::from_static(b"ijklmnopqrst"));

        let encrypted = encrypt("sha256_password", PUBLIC_KEY, "password", &nonce)?;

        assert_eq!(encrypted.len(), 256);

        Ok(())
    }

    #[test]
    fn it_rejects_garbage_keys() {
        let nonce = Bytes::new().chain(Bytes::new());

        let err = encrypt("sha256_password", b"not a key", "password", &nonce).unwrap_err();

        assert!(
            err.to_string()
                .contains("Authentication plugin 'sha256_password' reported error"),
            "{err}"
        );
    }
}
