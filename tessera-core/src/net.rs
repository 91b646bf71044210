use std::fmt::Debug;
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// A blocking byte stream that a network backend can open.
///
/// Implemented for [`TcpStream`]; tests use the in-memory
/// [`MockStream`](crate::mock::MockStream) instead.
pub trait Socket: Read + Write + Debug + Sized + 'static {
    fn connect_tcp(host: &str, port: u16, timeout: Option<Duration>) -> io::Result<Self>;

    /// Closes both halves of the stream. Errors are ignored by callers.
    fn shutdown(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Socket for TcpStream {
    fn connect_tcp(host: &str, port: u16, timeout: Option<Duration>) -> io::Result<Self> {
        let stream = match timeout {
            None => TcpStream::connect((host, port))?,

            Some(timeout) => {
                let mut last_err = None;
                let mut connected = None;

                for addr in (host, port).to_socket_addrs()? {
                    match TcpStream::connect_timeout(&addr, timeout) {
                        Ok(stream) => {
                            connected = Some(stream);
                            break;
                        }

                        Err(err) => last_err = Some(err),
                    }
                }

                match (connected, last_err) {
                    (Some(stream), _) => stream,
                    (None, Some(err)) => return Err(err),
                    (None, None) => {
                        return Err(io::Error::new(
                            io::ErrorKind::NotFound,
                            format!("could not resolve {host}:{port}"),
                        ))
                    }
                }
            }
        };

        stream.set_nodelay(true)?;
        stream.set_read_timeout(timeout)?;
        stream.set_write_timeout(timeout)?;

        Ok(stream)
    }

    fn shutdown(&mut self) -> io::Result<()> {
        TcpStream::shutdown(self, std::net::Shutdown::Both)
    }
}
