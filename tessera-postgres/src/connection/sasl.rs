use base64::prelude::{Engine as _, BASE64_STANDARD};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::{Digest, Sha256};
use stringprep::saslprep;
use tessera_core::Socket;

use crate::connection::stream::PgStream;
use crate::error::{Error, Result};
use crate::message::{
    Authentication, AuthenticationSasl, SaslInitialResponse, SaslResponse, SCRAM_SHA_256,
};
use crate::PgConnectOptions;

const GS2_HEADER: &str = "n,,";
const CHANNEL_ATTR: &str = "c";
const USERNAME_ATTR: &str = "n";
const CLIENT_PROOF_ATTR: &str = "p";
const NONCE_ATTR: &str = "r";

/// Runs a SCRAM-SHA-256 exchange (RFC 5802, RFC 7677) without channel binding.
pub(crate) fn authenticate<S: Socket>(
    stream: &mut PgStream<S>,
    options: &PgConnectOptions,
    data: AuthenticationSasl,
) -> Result<()> {
    let mut unknown = Vec::new();
    let mut has_sasl = false;

    for mechanism in data.mechanisms() {
        if mechanism == SCRAM_SHA_256 {
            has_sasl = true;
        } else {
            unknown.push(mechanism);
        }
    }

    if !has_sasl {
        return Err(err_protocol!(
            "unsupported SASL authentication mechanisms: {}",
            unknown.join(", ")
        ));
    }

    // channel-binding = "c=" base64
    let mut channel_binding = format!("{CHANNEL_ATTR}=");
    BASE64_STANDARD.encode_string(GS2_HEADER, &mut channel_binding);

    // "n=" saslname ;; Usernames are prepared using SASLprep.
    let username = format!("{USERNAME_ATTR}={}", options.username);
    let username = saslprep(&username).map_err(|err| {
        Error::ParseConnectOptions(format!("invalid username for SCRAM: {err}").into())
    })?;

    // nonce = "r=" c-nonce [s-nonce] ;; Second part provided by server.
    let nonce = gen_nonce();

    // client-first-message-bare = [reserved-mext ","] username "," nonce ["," extensions]
    let client_first_message_bare = format!("{username},{nonce}");

    let client_first_message = format!("{GS2_HEADER}{client_first_message_bare}");

    stream.send(SaslInitialResponse {
        response: &client_first_message,
    })?;

    let cont = match stream.recv_expect()? {
        Authentication::SaslContinue(data) => data,

        auth => {
            return Err(err_protocol!("expected SASLContinue but received {auth:?}"));
        }
    };

    // the server nonce must extend ours
    if !cont.nonce.starts_with(&nonce[2..]) {
        return Err(err_protocol!("SCRAM server nonce does not extend the client nonce"));
    }

    // SaltedPassword := Hi(Normalize(password), salt, i)
    let salted_password = hi(
        options.password.as_deref().unwrap_or_default(),
        &cont.salt,
        cont.iterations,
    )?;

    // ClientKey := HMAC(SaltedPassword, "Client Key")
    let mut mac = Hmac::<Sha256>::new_from_slice(&salted_password).map_err(Error::protocol)?;
    mac.update(b"Client Key");

    let client_key = mac.finalize().into_bytes();

    // StoredKey := H(ClientKey)
    let stored_key = Sha256::digest(client_key);

    // client-final-message-without-proof
    let client_final_message_wo_proof = format!("{channel_binding},r={}", cont.nonce);

    // AuthMessage := client-first-message-bare + "," + server-first-message + "," + client-final-message-without-proof
    let auth_message = format!(
        "{client_first_message_bare},{},{client_final_message_wo_proof}",
        cont.message
    );

    // ClientSignature := HMAC(StoredKey, AuthMessage)
    let mut mac = Hmac::<Sha256>::new_from_slice(&stored_key).map_err(Error::protocol)?;
    mac.update(auth_message.as_bytes());

    let client_signature = mac.finalize().into_bytes();

    // ClientProof := ClientKey XOR ClientSignature
    let client_proof: Vec<u8> = client_key
        .iter()
        .zip(client_signature.iter())
        .map(|(&a, &b)| a ^ b)
        .collect();

    // ServerKey := HMAC(SaltedPassword, "Server Key")
    let mut mac = Hmac::<Sha256>::new_from_slice(&salted_password).map_err(Error::protocol)?;
    mac.update(b"Server Key");

    let server_key = mac.finalize().into_bytes();

    // ServerSignature := HMAC(ServerKey, AuthMessage)
    let mut mac = Hmac::<Sha256>::new_from_slice(&server_key).map_err(Error::protocol)?;
    mac.update(auth_message.as_bytes());

    // client-final-message = client-final-message-without-proof "," proof
    let mut client_final_message = format!("{client_final_message_wo_proof},{CLIENT_PROOF_ATTR}=");
    BASE64_STANDARD.encode_string(client_proof, &mut client_final_message);

    stream.send(SaslResponse(&client_final_message))?;

    let data = match stream.recv_expect()? {
        Authentication::SaslFinal(data) => data,

        auth => {
            return Err(err_protocol!("expected SASLFinal but received {auth:?}"));
        }
    };

    // authentication is only considered valid if this verification passes
    mac.verify_slice(&data.verifier).map_err(Error::protocol)?;

    Ok(())
}

// nonce is a sequence of random printable bytes
fn gen_nonce() -> String {
    let mut rng = rand::thread_rng();
    let count = rng.gen_range(64..128);

    // printable = %x21-2B / %x2D-7E
    // ;; Printable ASCII except ",".
    let nonce: String = std::iter::repeat_with(|| loop {
        let c = rng.gen_range(0x21u8..0x7F);

        if c != b',' {
            break char::from(c);
        }
    })
    .take(count)
    .collect();

    format!("{NONCE_ATTR}={nonce}")
}

// Hi(str, salt, i):
fn hi(s: &str, salt: &[u8], iter_count: u32) -> Result<[u8; 32]> {
    let mut mac = Hmac::<Sha256>::new_from_slice(s.as_bytes()).map_err(Error::protocol)?;

    mac.update(salt);
    mac.update(&1u32.to_be_bytes());

    let mut u = mac.finalize_reset().into_bytes();
    let mut hi = u;

    for _ in 1..iter_count {
        mac.update(u.as_slice());
        u = mac.finalize_reset().into_bytes();

        for (h, b) in hi.iter_mut().zip(u.iter()) {
            *h ^= b;
        }
    }

    Ok(hi.into())
}
