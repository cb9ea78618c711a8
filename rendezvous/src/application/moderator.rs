use std::collections::BTreeMap;

use actix::prelude::*;
use peer_signaling::{message::ServerMessage, Peer, PeerId};
use tracing::{debug, info};

/// Frame for one signed-in client.
#[derive(Debug, Message)]
#[rtype(result = "()")]
pub struct Deliver(pub ServerMessage);

/// Signs a client in. Answers with the id handed out.
#[derive(Message)]
#[rtype(result = "PeerId")]
pub struct Connect {
    pub name: String,
    pub addr: Recipient<Deliver>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub id: PeerId,
}

#[derive(Debug, Message)]
#[rtype(result = "()")]
pub struct Relay {
    pub from: PeerId,
    pub to: PeerId,
    pub payload: String,
}

#[derive(Message)]
#[rtype(result = "Vec<Peer>")]
pub struct ListPeers;

struct Member {
    name: String,
    addr: Recipient<Deliver>,
}

/// Keeps the roster of signed-in peers and routes messages between them.
#[derive(Default)]
pub struct Moderator {
    members: BTreeMap<PeerId, Member>,
    last_id: PeerId,
}

impl Moderator {
    fn broadcast(&self, skip: PeerId, msg: ServerMessage) {
        for (_, member) in self.members.iter().filter(|(id, _)| **id != skip) {
            member.addr.do_send(Deliver(msg.clone()));
        }
    }
}

impl Actor for Moderator {
    type Context = Context<Self>;
}

impl Handler<Connect> for Moderator {
    type Result = PeerId;

    fn handle(&mut self, msg: Connect, _ctx: &mut Self::Context) -> Self::Result {
        self.last_id += 1;
        let id = self.last_id;
        info!("{} signed in as {id}", msg.name);

        // the id goes out first, then everybody already here
        msg.addr.do_send(Deliver(ServerMessage::SignedIn { id }));
        for (peer_id, member) in &self.members {
            msg.addr.do_send(Deliver(ServerMessage::PeerConnected {
                id: *peer_id,
                name: member.name.clone(),
            }));
        }
        self.broadcast(
            id,
            ServerMessage::PeerConnected {
                id,
                name: msg.name.clone(),
            },
        );

        self.members.insert(
            id,
            Member {
                name: msg.name,
                addr: msg.addr,
            },
        );
        id
    }
}

impl Handler<Disconnect> for Moderator {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _ctx: &mut Self::Context) -> Self::Result {
        if let Some(member) = self.members.remove(&msg.id) {
            info!("{} ({}) left", member.name, msg.id);
            self.broadcast(msg.id, ServerMessage::PeerDisconnected { id: msg.id });
        }
    }
}

impl Handler<Relay> for Moderator {
    type Result = ();

    fn handle(&mut self, msg: Relay, _ctx: &mut Self::Context) -> Self::Result {
        match self.members.get(&msg.to) {
            Some(member) if self.members.contains_key(&msg.from) => {
                member.addr.do_send(Deliver(ServerMessage::Relay {
                    from: msg.from,
                    payload: msg.payload,
                }))
            }
            _ => debug!(?msg, "Dropping relay, peer not signed in"),
        }
    }
}

impl Handler<ListPeers> for Moderator {
    type Result = MessageResult<ListPeers>;

    fn handle(&mut self, _msg: ListPeers, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(
            self.members
                .iter()
                .map(|(id, member)| Peer::new(*id, &member.name))
                .collect(),
        )
    }
}
