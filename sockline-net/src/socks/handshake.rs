use std::io::{Read, Write};

use tracing::{debug, trace};

use super::codec::{
    AUTH_RESPONSE_LEN, METHOD_SELECTION_LEN, REPLY_HEADER_LEN, command_reply_len,
    decode_auth_response, decode_command_reply, decode_method_selection, encode_auth_request,
    encode_command_request, encode_greeting,
};
use super::error::SocksError;
use super::types::{HandshakeState, SocksAddress, SocksCommand, SocksCredentials, SocksMethod};

/// One SOCKS5 negotiation over a borrowed, already connected stream.
///
/// Steps must be called in protocol order: [`Handshake::establish`], then
/// [`Handshake::authenticate`] when the proxy selected username/password, then
/// [`Handshake::command`]. Any protocol or transport failure moves the
/// handshake to [`HandshakeState::Failed`]; calling a step out of order returns
/// [`SocksError::InvalidState`] and leaves the state as it was.
pub struct Handshake<'a, S> {
    stream: &'a mut S,
    state: HandshakeState,
    method: Option<SocksMethod>,
}

impl<'a, S: Read + Write> Handshake<'a, S> {
    pub fn new(stream: &'a mut S) -> Self {
        Self {
            stream,
            state: HandshakeState::Start,
            method: None,
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Method selected by the proxy, once negotiated.
    pub fn method(&self) -> Option<SocksMethod> {
        self.method
    }

    pub fn establish(&mut self, methods: &[SocksMethod]) -> Result<SocksMethod, SocksError> {
        self.require_state("establish", self.state == HandshakeState::Start)?;
        let result = self.negotiate(methods);
        self.track(result)
    }

    pub fn authenticate(&mut self, credentials: &SocksCredentials) -> Result<(), SocksError> {
        self.require_state(
            "authenticate",
            self.state == HandshakeState::MethodNegotiated
                && self.method == Some(SocksMethod::UsernamePassword),
        )?;
        let result = self.subnegotiate(credentials);
        self.track(result)
    }

    pub fn command(
        &mut self,
        command: SocksCommand,
        destination: &SocksAddress,
    ) -> Result<SocksAddress, SocksError> {
        let ready = match self.state {
            HandshakeState::MethodNegotiated => self.method == Some(SocksMethod::None),
            HandshakeState::Authenticated => true,
            _ => false,
        };
        self.require_state("command", ready)?;
        let result = self.request(command, destination);
        self.track(result)
    }

    fn negotiate(&mut self, methods: &[SocksMethod]) -> Result<SocksMethod, SocksError> {
        let greeting = encode_greeting(methods)?;
        self.send(&greeting)?;

        let mut selection = [0u8; METHOD_SELECTION_LEN];
        self.receive(&mut selection)?;
        let (_, method) = decode_method_selection(&selection)?;
        if method == SocksMethod::NotAcceptable {
            return Err(SocksError::NoAcceptableAuthMethod);
        }
        if !methods.contains(&method) {
            return Err(SocksError::UnsupportedMethod(method.as_byte()));
        }

        debug!(?method, "socks method negotiated");
        self.method = Some(method);
        self.state = HandshakeState::MethodNegotiated;
        Ok(method)
    }

    fn subnegotiate(&mut self, credentials: &SocksCredentials) -> Result<(), SocksError> {
        let request = encode_auth_request(credentials)?;
        self.send(&request)?;
        self.state = HandshakeState::AuthPending;

        let mut response = [0u8; AUTH_RESPONSE_LEN];
        self.receive(&mut response)?;
        let status = decode_auth_response(&response)?;
        if status != 0x00 {
            debug!(status, "socks authentication rejected");
            return Err(SocksError::AuthenticationFailed);
        }

        debug!("socks authentication accepted");
        self.state = HandshakeState::Authenticated;
        Ok(())
    }

    fn request(
        &mut self,
        command: SocksCommand,
        destination: &SocksAddress,
    ) -> Result<SocksAddress, SocksError> {
        let request = encode_command_request(command, destination)?;
        self.send(&request)?;
        self.state = HandshakeState::CommandSent;
        debug!(?command, %destination, "socks command sent");

        let mut frame = vec![0u8; REPLY_HEADER_LEN];
        self.receive(&mut frame)?;
        let frame_len = match command_reply_len(&frame)? {
            Some(len) => len,
            None => {
                let mut len = [0u8; 1];
                self.receive(&mut len)?;
                frame.push(len[0]);
                command_reply_len(&frame)?.ok_or(SocksError::MalformedReply {
                    needed: REPLY_HEADER_LEN + 1,
                    available: frame.len(),
                })?
            }
        };
        let read = frame.len();
        frame.resize(frame_len, 0);
        self.receive(&mut frame[read..])?;

        let (reply, bound) = decode_command_reply(&frame)?;
        if !reply.is_success() {
            debug!(%reply, "socks command refused");
            return Err(SocksError::Command(reply));
        }

        debug!(%bound, "socks tunnel established");
        self.state = HandshakeState::Established;
        Ok(bound)
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), SocksError> {
        trace!(len = frame.len(), "socks write");
        self.stream.write_all(frame)?;
        self.stream.flush()?;
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<(), SocksError> {
        self.stream.read_exact(buf)?;
        trace!(len = buf.len(), "socks read");
        Ok(())
    }

    fn require_state(&self, operation: &'static str, ready: bool) -> Result<(), SocksError> {
        if ready {
            Ok(())
        } else {
            Err(SocksError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn track<T>(&mut self, result: Result<T, SocksError>) -> Result<T, SocksError> {
        if result.is_err() {
            self.state = HandshakeState::Failed;
        }
        result
    }
}
