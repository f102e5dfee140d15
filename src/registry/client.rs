//! Attached subscribers and their queues
//!
//! A client is created by the transport layer (HTTP/RTSP handler) and
//! registered on a channel. The registry keeps the sending half of the
//! client's outgoing queue for fan-out; the transport worker drains the
//! receiving half from the returned [`ClientHandle`] and watches the
//! client's signal mailbox for its own teardown request.

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::media::MediaPacket;
use crate::signal::SignalQueue;

/// Delivery path of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMode {
    /// Structured demuxed packets (muxing consumers: WebRTC, MSE, HLS)
    Packets,
    /// Raw protocol bytes passed through untouched (RTSP proxying)
    Raw,
}

/// Registry-side record of one attached subscriber
#[derive(Debug)]
pub(super) struct Client {
    pub(super) outgoing: Outgoing,
    pub(super) signals: SignalQueue,
}

/// Sending half of a client's outgoing queue, tagged by delivery path
#[derive(Debug)]
pub(super) enum Outgoing {
    Packets(mpsc::Sender<MediaPacket>),
    Raw(mpsc::Sender<Bytes>),
}

impl Client {
    /// Build the registry-side record plus the transport-side receiver
    pub(super) fn new(
        mode: ClientMode,
        queue_capacity: usize,
        signal_capacity: usize,
    ) -> (Self, OutgoingReceiver) {
        let signals = SignalQueue::new(signal_capacity);

        let (outgoing, receiver) = match mode {
            ClientMode::Packets => {
                let (tx, rx) = mpsc::channel(queue_capacity);
                (Outgoing::Packets(tx), OutgoingReceiver::Packets(rx))
            }
            ClientMode::Raw => {
                let (tx, rx) = mpsc::channel(queue_capacity);
                (Outgoing::Raw(tx), OutgoingReceiver::Raw(rx))
            }
        };

        (Self { outgoing, signals }, receiver)
    }

    /// Delivery path of this client
    pub(super) fn mode(&self) -> ClientMode {
        match self.outgoing {
            Outgoing::Packets(_) => ClientMode::Packets,
            Outgoing::Raw(_) => ClientMode::Raw,
        }
    }
}

/// Receiving half of a client's outgoing queue
#[derive(Debug)]
pub enum OutgoingReceiver {
    /// Structured packet queue
    Packets(mpsc::Receiver<MediaPacket>),
    /// Raw byte queue
    Raw(mpsc::Receiver<Bytes>),
}

/// Transport-side endpoints of one attached subscriber
///
/// Returned by `client_add`; the id is what `client_delete` expects, the
/// signal mailbox is where the fan-out engine requests teardown when this
/// client cannot keep up.
#[derive(Debug)]
pub struct ClientHandle {
    /// Registry-assigned client id
    pub id: u64,
    /// Receiving half of the outgoing queue
    pub outgoing: OutgoingReceiver,
    /// This client's signal mailbox
    pub signals: SignalQueue,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_client_mode_matches_receiver() {
        let (client, receiver) = Client::new(ClientMode::Packets, 4, 2);
        assert_eq!(client.mode(), ClientMode::Packets);
        assert!(matches!(receiver, OutgoingReceiver::Packets(_)));

        let (client, receiver) = Client::new(ClientMode::Raw, 4, 2);
        assert_eq!(client.mode(), ClientMode::Raw);
        assert!(matches!(receiver, OutgoingReceiver::Raw(_)));
    }

    #[test]
    fn test_outgoing_queue_is_bounded() {
        let (client, _receiver) = Client::new(ClientMode::Packets, 2, 2);

        let Outgoing::Packets(tx) = &client.outgoing else {
            panic!("expected packet queue");
        };

        let packet = MediaPacket::audio(0, Duration::ZERO, Bytes::from_static(&[0x00]));
        assert!(tx.try_send(packet.clone()).is_ok());
        assert!(tx.try_send(packet.clone()).is_ok());
        assert!(tx.try_send(packet).is_err());
    }
}
