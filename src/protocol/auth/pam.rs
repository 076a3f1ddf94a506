//! MariaDB PAM `dialog` plugin.
//!
//! The server may prompt several times (one-time passwords, second
//! factors). The first answer is the password; later prompts take
//! `extra_passwords` in order.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Error, Result};
use crate::protocol::connect::ConnectParams;
use crate::protocol::packet::PacketChannel;

use super::{is_final, AuthSession, AuthenticationPlugin};

#[derive(Debug, Clone, Copy)]
pub struct DialogPlugin;

impl AuthenticationPlugin for DialogPlugin {
    fn name(&self) -> &'static str {
        "dialog"
    }

    fn initialize(&self, auth_data: &str, _: &[u8], conf: &ConnectParams) -> Result<Box<dyn AuthSession>> {
        let mut answers = Vec::with_capacity(1 + conf.extra_passwords.len());
        answers.push(auth_data.to_string());
        answers.extend(conf.extra_passwords.iter().cloned());
        Ok(Box::new(DialogSession { answers }))
    }
}

struct DialogSession {
    answers: Vec<String>,
}

#[async_trait]
impl AuthSession for DialogSession {
    async fn process(&mut self, channel: &mut dyn PacketChannel) -> Result<Bytes> {
        let mut prompt = 0;
        loop {
            let answer = self.answers.get(prompt).ok_or_else(|| {
                Error::authentication(format!("No password available for PAM prompt {}", prompt + 1))
            })?;
            let mut packet = Vec::with_capacity(answer.len() + 1);
            packet.extend_from_slice(answer.as_bytes());
            packet.push(0);
            channel.write_packet(&packet).await?;

            let reply = channel.read_packet().await?;
            if reply.is_empty() || is_final(&reply) {
                return Ok(reply);
            }
            // [echo flag][prompt text]
            tracing::trace!(prompt = %String::from_utf8_lossy(&reply[1..]), "PAM prompt");
            prompt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::auth::negotiate;
    use crate::protocol::auth::testing::{ScriptedChannel, OK};

    #[tokio::test]
    async fn test_multi_prompt() {
        let mut channel = ScriptedChannel::new(&[b"\x04Verification code: ", OK]);
        let conf = ConnectParams::default()
            .with_credentials("app", "secret")
            .with_extra_passwords(vec!["123456".to_string()]);
        negotiate(&mut channel, "dialog", b"", &conf).await.unwrap();
        assert_eq!(channel.writes, vec![b"secret\0".to_vec(), b"123456\0".to_vec()]);
    }

    #[tokio::test]
    async fn test_runs_out_of_answers() {
        let mut channel = ScriptedChannel::new(&[b"\x02Password: ", b"\x04Token: "]);
        let conf = ConnectParams::default().with_credentials("app", "secret");
        let err = negotiate(&mut channel, "dialog", b"", &conf).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Authentication failed: No password available for PAM prompt 2"
        );
        assert_eq!(channel.writes.len(), 1);
    }
}
