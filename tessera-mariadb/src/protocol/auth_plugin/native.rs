use bytes::buf::Chain;
use bytes::Bytes;
use sha1::{Digest, Sha1};

use super::xor_eq;
use crate::error::Result;

/// The default 4.1+ password scramble.
///
/// <https://mariadb.com/kb/en/connection/#mysql_native_password-plugin>
#[derive(Debug)]
pub(crate) struct NativeAuthPlugin;

impl super::AuthPlugin for NativeAuthPlugin {
    fn name(&self) -> &'static str {
        "mysql_native_password"
    }

    fn invoke(&self, nonce: &Chain<Bytes, Bytes>, password: &str) -> Vec<u8> {
        if password.is_empty() {
            // empty password => no scramble
            return vec![];
        }

        // SHA1( password ) ^ SHA1( nonce + SHA1( SHA1( password ) ) )

        let mut hasher = Sha1::new();

        hasher.update(password);

        // SHA1( password )
        let mut pw_sha1 = hasher.finalize_reset();

        hasher.update(pw_sha1);

        // SHA1( SHA1( password ) )
        let pw_sha1_sha1 = hasher.finalize_reset();

        hasher.update(nonce.first_ref());
        hasher.update(nonce.last_ref());
        hasher.update(pw_sha1_sha1);

        // SHA1( nonce + SHA1( SHA1( password ) ) )
        let nonce_pw_sha1_sha1 = hasher.finalize();

        xor_eq(&mut pw_sha1, &nonce_pw_sha1_sha1);

        pw_sha1.to_vec()
    }

    fn handle(
        &self,
        data: Bytes,
        _nonce: &Chain<Bytes, Bytes>,
        _password: &str,
    ) -> Result<Option<Vec<u8>>> {
        Err(super::err_msg(
            self.name(),
            &format!("unexpected more-data packet of {} bytes", data.len()),
        ))
    }
}
