use tessera_core::Socket;

use super::stream::MariaDbStream;
use crate::error::Result;
use crate::protocol::auth::{Auth, AuthResponse};
use crate::protocol::auth_plugin::{AuthPlugin, NativeAuthPlugin};
use crate::protocol::handshake::Handshake;
use crate::protocol::handshake_response::HandshakeResponse;
use crate::protocol::Capabilities;
use crate::MariaDbConnectOptions;

// utf8mb4_general_ci
const COLLATION_UTF8MB4: u8 = 45;

// https://mariadb.com/kb/en/connection/

// the connection phase (establish) performs these tasks:
//  - exchange the capabilities of client and server
//  - authenticate the client against the server

// the server may immediately send an ERR packet and finish the handshake
// or send a [Handshake]

impl<S: Socket> MariaDbStream<S> {
    pub(crate) fn establish(options: &MariaDbConnectOptions) -> Result<Self> {
        let socket = S::connect_tcp(&options.host, options.port, options.socket_timeout)?;

        let mut stream = Self::new(socket, Capabilities::client(options.database.is_some()));

        let handshake: Handshake = stream.recv()?;

        stream.capabilities &= handshake.server_capabilities;
        stream.connection_id = handshake.connection_id;

        log::debug!(
            "MariaDB server {} (connection id {})",
            handshake.server_version,
            handshake.connection_id
        );

        // servers that do not name a plugin speak mysql_native_password
        let mut plugin: Box<dyn AuthPlugin> = match handshake.auth_plugin_name.as_deref() {
            Some(name) => <dyn AuthPlugin>::parse(name)?,
            None => Box::new(NativeAuthPlugin),
        };

        let mut nonce = handshake.auth_plugin_data;
        let password = options.password.as_deref().unwrap_or_default();

        let auth_response = plugin.invoke(&nonce, password);

        stream.write_packet(HandshakeResponse {
            database: options.database.as_deref(),
            max_packet_size: 1024,
            collation: COLLATION_UTF8MB4,
            username: &options.username,
            auth_plugin_name: handshake.auth_plugin_name.as_deref(),
            auth_response: &auth_response,
        })?;

        loop {
            match stream.recv()? {
                Auth::Ok(_) => break,

                Auth::MoreData(data) => {
                    if let Some(response) = plugin.handle(data, &nonce, password)? {
                        stream.write_packet(AuthResponse(&response))?;
                    }
                }

                Auth::Switch(switch) => {
                    log::debug!("server switched authentication to {}", switch.plugin_name);

                    plugin = <dyn AuthPlugin>::parse(&switch.plugin_name)?;
                    nonce = switch.data;

                    let response = plugin.invoke(&nonce, password);
                    stream.write_packet(AuthResponse(&response))?;
                }
            }
        }

        Ok(stream)
    }
}
