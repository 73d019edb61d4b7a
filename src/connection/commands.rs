// src/connection/commands.rs

//! Defines the decoded command forms handed to the transport for encoding.

use bytes::Bytes;

/// A subscription-affecting command. These are fire-and-forget on the wire;
/// their acknowledgements arrive later as push frames.
#[derive(Debug, Clone, PartialEq)]
pub enum PubSubCommand {
    Subscribe(Vec<Bytes>),
    Unsubscribe(Vec<Bytes>),
    PSubscribe(Vec<Bytes>),
    PUnsubscribe(Vec<Bytes>),
}

impl PubSubCommand {
    /// The wire name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            PubSubCommand::Subscribe(_) => "subscribe",
            PubSubCommand::Unsubscribe(_) => "unsubscribe",
            PubSubCommand::PSubscribe(_) => "psubscribe",
            PubSubCommand::PUnsubscribe(_) => "punsubscribe",
        }
    }

    /// The channel or pattern names this command covers.
    pub fn names(&self) -> &[Bytes] {
        match self {
            PubSubCommand::Subscribe(names)
            | PubSubCommand::Unsubscribe(names)
            | PubSubCommand::PSubscribe(names)
            | PubSubCommand::PUnsubscribe(names) => names,
        }
    }

    /// The full argument vector in wire order, for transports that encode
    /// commands as flat argument arrays.
    pub fn to_resp_args(&self) -> Vec<Bytes> {
        let mut args = Vec::with_capacity(self.names().len() + 1);
        args.push(Bytes::from_static(self.name().as_bytes()));
        args.extend(self.names().iter().cloned());
        args
    }
}

/// A synchronous introspection query against the server's global subscriber
/// table. Unlike `PubSubCommand`, these go through the normal request/reply
/// path and block for exactly one reply.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryCommand {
    /// `PUBSUB CHANNELS [pattern]`
    Channels(Option<Bytes>),
    /// `PUBSUB NUMSUB [channel ...]`
    NumSub(Vec<Bytes>),
    /// `PUBSUB NUMPAT`
    NumPat,
}

impl QueryCommand {
    pub fn to_resp_args(&self) -> Vec<Bytes> {
        let mut args = vec![Bytes::from_static(b"pubsub")];
        match self {
            QueryCommand::Channels(pattern) => {
                args.push(Bytes::from_static(b"channels"));
                if let Some(p) = pattern {
                    args.push(p.clone());
                }
            }
            QueryCommand::NumSub(channels) => {
                args.push(Bytes::from_static(b"numsub"));
                args.extend(channels.iter().cloned());
            }
            QueryCommand::NumPat => args.push(Bytes::from_static(b"numpat")),
        }
        args
    }
}
