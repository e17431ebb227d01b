//! SMTP sessions behind a small trait seam so send runs can be driven
//! without a live server.

use std::time::Duration;

use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{SmtpConnection, TlsParameters};
use lettre::transport::smtp::extension::ClientId;
use lettre::Message;

use crate::error::DeliveryError;
use crate::store::{Security, SmtpProfile};

/// One open, authenticated SMTP session
pub trait Session {
    fn send(&mut self, message: &Message) -> Result<(), DeliveryError>;

    /// Say goodbye to the server. Errors are not interesting at this point.
    fn close(&mut self) {}
}

/// Opens sessions from a profile. Shared with the send worker.
pub trait Connector: Send + Sync {
    fn connect(&self, profile: &SmtpProfile) -> Result<Box<dyn Session>, DeliveryError>;
}

/// Connect, authenticate, and hang up
pub fn test_connection(connector: &dyn Connector, profile: &SmtpProfile) -> Result<(), DeliveryError> {
    let mut session = connector.connect(profile)?;
    session.close();
    Ok(())
}

/// Real SMTP submission through lettre's low-level connection
#[derive(Debug, Clone)]
pub struct SmtpConnector {
    timeout: Duration,
    hello_name: Option<String>,
}

impl SmtpConnector {
    pub fn new(timeout: Duration, hello_name: Option<String>) -> Self {
        Self {
            timeout,
            hello_name,
        }
    }

    fn client_id(&self) -> ClientId {
        match &self.hello_name {
            Some(name) => ClientId::Domain(name.clone()),
            None => ClientId::default(),
        }
    }

    fn open(&self, profile: &SmtpProfile) -> Result<SmtpConnection, DeliveryError> {
        let hello = self.client_id();
        let server = (profile.host.as_str(), profile.port);

        let tls = match profile.security {
            Security::None => None,
            Security::StartTls | Security::Tls => Some(
                TlsParameters::new(profile.host.clone())
                    .map_err(|e| DeliveryError::ConnectionLost(e.to_string()))?,
            ),
        };

        let implicit = match profile.security {
            Security::Tls => tls.as_ref(),
            _ => None,
        };

        let mut conn = SmtpConnection::connect(server, Some(self.timeout), &hello, implicit, None)
            .map_err(|e| DeliveryError::ConnectionLost(e.to_string()))?;

        if profile.security == Security::StartTls {
            if !conn.can_starttls() {
                conn.abort();
                return Err(DeliveryError::ConnectionLost(
                    "server does not offer STARTTLS".to_string(),
                ));
            }
            if let Some(params) = tls.as_ref() {
                conn.starttls(params, &hello)
                    .map_err(|e| DeliveryError::ConnectionLost(e.to_string()))?;
            }
        }

        if !profile.username.is_empty() {
            let credentials = Credentials::new(profile.username.clone(), profile.credential.clone());
            conn.auth(&[Mechanism::Plain, Mechanism::Login], &credentials)
                .map_err(|e| {
                    if e.is_permanent() || e.is_transient() {
                        DeliveryError::AuthFailure(e.to_string())
                    } else {
                        DeliveryError::ConnectionLost(e.to_string())
                    }
                })?;
        }

        tracing::debug!(host = %profile.host, port = profile.port, "SMTP session open");
        Ok(conn)
    }
}

impl Connector for SmtpConnector {
    fn connect(&self, profile: &SmtpProfile) -> Result<Box<dyn Session>, DeliveryError> {
        let conn = self.open(profile)?;
        Ok(Box::new(SmtpSession {
            connector: self.clone(),
            profile: profile.clone(),
            conn: Some(conn),
        }))
    }
}

/// A server-rejected command aborts lettre's connection, so the session
/// reopens it lazily before the next message.
struct SmtpSession {
    connector: SmtpConnector,
    profile: SmtpProfile,
    conn: Option<SmtpConnection>,
}

impl Session for SmtpSession {
    fn send(&mut self, message: &Message) -> Result<(), DeliveryError> {
        let mut conn = match self.conn.take() {
            Some(c) if !c.has_broken() => c,
            _ => self.connector.open(&self.profile)?,
        };

        match conn.send(message.envelope(), &message.formatted()) {
            Ok(_) => {
                self.conn = Some(conn);
                Ok(())
            }
            Err(e) if e.is_permanent() || e.is_transient() => {
                Err(DeliveryError::RecipientRejected(e.to_string()))
            }
            Err(e) => Err(DeliveryError::ConnectionLost(e.to_string())),
        }
    }

    fn close(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            let _ = conn.quit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::{Arc, Mutex};
    use std::thread;

    /// How the scripted server misbehaves
    #[derive(Clone, Default)]
    struct Script {
        reject_auth: bool,
        reject_rcpt: Option<&'static str>,
        drop_on_mail: bool,
    }

    #[derive(Default)]
    struct Seen {
        connections: usize,
        delivered: Vec<String>,
    }

    /// Minimal line-based SMTP server on a random local port
    fn serve(script: Script) -> (u16, Arc<Mutex<Seen>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let seen = Arc::new(Mutex::new(Seen::default()));
        let shared = Arc::clone(&seen);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                shared.lock().unwrap().connections += 1;
                handle(stream, &script, &shared);
            }
        });

        (port, seen)
    }

    fn reply(stream: &mut TcpStream, text: &str) {
        let _ = stream.write_all(text.as_bytes());
    }

    fn handle(mut stream: TcpStream, script: &Script, seen: &Mutex<Seen>) {
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        reply(&mut stream, "220 localhost ESMTP test\r\n");

        let mut rcpt = String::new();
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).unwrap_or(0) == 0 {
                return;
            }
            let upper = line.to_ascii_uppercase();

            if upper.starts_with("EHLO") {
                reply(&mut stream, "250-localhost\r\n250 AUTH PLAIN LOGIN\r\n");
            } else if upper.starts_with("AUTH") {
                if script.reject_auth {
                    reply(&mut stream, "535 5.7.8 bad credentials\r\n");
                } else {
                    reply(&mut stream, "235 2.7.0 ok\r\n");
                }
            } else if upper.starts_with("MAIL FROM") {
                if script.drop_on_mail {
                    return;
                }
                reply(&mut stream, "250 ok\r\n");
            } else if upper.starts_with("RCPT TO") {
                let addr = line
                    .split(['<', '>'])
                    .nth(1)
                    .unwrap_or_default()
                    .to_string();
                if script.reject_rcpt == Some(addr.as_str()) {
                    reply(&mut stream, "550 5.1.1 no such user\r\n");
                } else {
                    rcpt = addr;
                    reply(&mut stream, "250 ok\r\n");
                }
            } else if upper.starts_with("DATA") {
                reply(&mut stream, "354 go ahead\r\n");
                loop {
                    line.clear();
                    if reader.read_line(&mut line).unwrap_or(0) == 0 {
                        return;
                    }
                    if line.trim_end() == "." {
                        break;
                    }
                }
                seen.lock().unwrap().delivered.push(rcpt.clone());
                reply(&mut stream, "250 queued\r\n");
            } else if upper.starts_with("QUIT") {
                reply(&mut stream, "221 bye\r\n");
                return;
            } else {
                reply(&mut stream, "250 ok\r\n");
            }
        }
    }

    fn profile(port: u16) -> SmtpProfile {
        SmtpProfile {
            host: "127.0.0.1".into(),
            port,
            username: "sender@example.com".into(),
            credential: "secret".into(),
            security: Security::None,
        }
    }

    fn connector() -> SmtpConnector {
        SmtpConnector::new(Duration::from_secs(5), Some("test.local".into()))
    }

    fn message(to: &str) -> Message {
        Message::builder()
            .from("sender@example.com".parse().unwrap())
            .to(to.parse().unwrap())
            .subject("Hello")
            .body(String::from("Body"))
            .unwrap()
    }

    #[test]
    fn test_plain_session_delivers_and_quits() {
        let (port, seen) = serve(Script::default());
        let mut session = connector().connect(&profile(port)).unwrap();
        session.send(&message("a@x.com")).unwrap();
        session.send(&message("b@x.com")).unwrap();
        session.close();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.delivered, vec!["a@x.com", "b@x.com"]);
        assert_eq!(seen.connections, 1);
    }

    #[test]
    fn test_rejected_auth_is_auth_failure() {
        let (port, _) = serve(Script {
            reject_auth: true,
            ..Script::default()
        });
        let err = connector().connect(&profile(port)).err().unwrap();
        assert!(matches!(err, DeliveryError::AuthFailure(_)), "{err:?}");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_rejected_recipient_then_reconnects() {
        let (port, seen) = serve(Script {
            reject_rcpt: Some("bad@x.com"),
            ..Script::default()
        });
        let mut session = connector().connect(&profile(port)).unwrap();

        let err = session.send(&message("bad@x.com")).unwrap_err();
        assert!(matches!(err, DeliveryError::RecipientRejected(_)), "{err:?}");
        assert!(!err.is_fatal());

        session.send(&message("good@x.com")).unwrap();
        session.close();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.delivered, vec!["good@x.com"]);
        assert_eq!(seen.connections, 2);
    }

    #[test]
    fn test_dropped_socket_is_connection_lost() {
        let (port, _) = serve(Script {
            drop_on_mail: true,
            ..Script::default()
        });
        let mut session = connector().connect(&profile(port)).unwrap();
        let err = session.send(&message("a@x.com")).unwrap_err();
        assert!(matches!(err, DeliveryError::ConnectionLost(_)), "{err:?}");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_connection_refused_is_connection_lost() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = test_connection(&connector(), &profile(port)).unwrap_err();
        assert!(matches!(err, DeliveryError::ConnectionLost(_)), "{err:?}");
    }
}
