use tessera_core::Socket;

use super::sasl;
use super::stream::PgStream;
use crate::error::Result;
use crate::message::{
    Authentication, BackendKeyData, BackendMessageFormat, Password, ReadyForQuery, Startup,
};
use crate::PgConnectOptions;

// https://www.postgresql.org/docs/current/protocol-flow.html#PROTOCOL-FLOW-START-UP
// https://www.postgresql.org/docs/current/runtime-config-client.html

impl<S: Socket> PgStream<S> {
    pub(crate) fn establish(options: &PgConnectOptions) -> Result<Self> {
        let socket = S::connect_tcp(&options.host, options.port, options.socket_timeout)?;

        let mut stream = Self::new(socket);

        let mut params = vec![
            // Sets the display format for date and time values,
            // as well as the rules for interpreting ambiguous date input values.
            ("DateStyle", "ISO, MDY"),
            // Sets the client-side encoding (character set).
            ("client_encoding", "UTF8"),
            // Sets the time zone for displaying and interpreting time stamps.
            ("TimeZone", "UTC"),
            // Floats are sent in their shortest exact text form.
            ("extra_float_digits", "3"),
        ];

        if let Some(application_name) = &options.application_name {
            params.push(("application_name", application_name.as_str()));
        }

        stream.write(Startup {
            username: Some(&options.username),
            database: options.database.as_deref(),
            params: &params,
        })?;

        stream.flush()?;

        // The server then uses this information and the contents of
        // its configuration files (such as pg_hba.conf) to determine whether the connection is
        // provisionally acceptable, and what additional
        // authentication is required (if any).

        loop {
            match stream.recv_expect()? {
                Authentication::Ok => {
                    // the authentication exchange is successfully completed
                    break;
                }

                Authentication::CleartextPassword => {
                    stream.send(Password::Cleartext(
                        options.password.as_deref().unwrap_or_default(),
                    ))?;
                }

                Authentication::Md5Password { salt } => {
                    stream.send(Password::Md5 {
                        username: &options.username,
                        password: options.password.as_deref().unwrap_or_default(),
                        salt,
                    })?;
                }

                Authentication::Sasl(body) => {
                    sasl::authenticate(&mut stream, options, body)?;
                }

                method => {
                    return Err(err_protocol!(
                        "unsupported authentication method: {method:?}"
                    ));
                }
            }
        }

        // After a successful authentication the server sends parameter status
        // messages, the cancellation key and finally `ReadyForQuery`.

        loop {
            let message = stream.recv()?;

            match message.format {
                BackendMessageFormat::BackendKeyData => {
                    let data: BackendKeyData = message.decode()?;
                    stream.process_id = Some(data.process_id);
                }

                BackendMessageFormat::ReadyForQuery => {
                    let ready: ReadyForQuery = message.decode()?;
                    stream.transaction_status = ready.transaction_status;
                    break;
                }

                format => {
                    return Err(err_protocol!(
                        "establish: unexpected message: {format:?}"
                    ));
                }
            }
        }

        Ok(stream)
    }
}
