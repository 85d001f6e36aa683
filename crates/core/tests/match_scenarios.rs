//! End-to-end scenarios against the public `Match`/wire API, independent of
//! any socket: a datagram in, the state transition it causes, a datagram
//! out. No I/O crosses this boundary, so these run as plain unit tests
//! rather than needing a bound `NetworkEndpoint`.

use std::net::SocketAddr;

use hqm_core::eventlog::{Event, Team};
use hqm_core::keys::Keys;
use hqm_core::match_state::{Match, DEFAULT_TEAM_SIZE};
use hqm_core::math::{Mat3, Vec3};
use hqm_core::object::Object;
use hqm_core::rink::Rink;
use hqm_core::wire::{ClientMessage, ServerMessage};

fn addr(port: u16) -> SocketAddr {
    format!("127.0.0.1:{port}").parse().unwrap()
}

fn padded_name(bytes: &[u8]) -> [u8; 32] {
    let mut name = [0u8; 32];
    name[..bytes.len()].copy_from_slice(bytes);
    name
}

fn new_match() -> Match {
    Match::new(Rink::default_sized(), DEFAULT_TEAM_SIZE)
}

/// S1: JOIN starts the first match and the next snapshot frame carries the
/// new slot's own spectator Join event.
#[test]
fn s1_join_produces_new_match_then_a_spectator_join_event() {
    let mut m = new_match();
    let slot = m.join(addr(1), padded_name(b"Loke")).expect("roster has room");
    assert_eq!(slot, 0);
    assert_eq!(m.game_id(), 1);

    let outgoing = m.tick();
    let mine = outgoing.iter().find(|o| o.slot == slot).expect("a datagram for the joiner");
    match &mine.message {
        ServerMessage::NewMatch { game_id } => assert_eq!(*game_id, 1),
        other => panic!("expected NewMatch on the first frame after join, got {other:?}"),
    }

    // Second snapshot frame: the session has caught up to game_id 1, so it
    // now gets a GameUpdate carrying the spectator Join event.
    let outgoing = m.tick();
    let outgoing = if outgoing.is_empty() { m.tick() } else { outgoing };
    let mine = outgoing.iter().find(|o| o.slot == slot).expect("a datagram for the joiner");
    match &mine.message {
        ServerMessage::GameUpdate(update) => {
            assert_eq!(update.your_slot, 0);
            assert!(update
                .events
                .iter()
                .any(|e| matches!(e, Event::JoinExit { slot: 0, team: Some(Team::Spectator), .. })));
        }
        other => panic!("expected GameUpdate, got {other:?}"),
    }
}

/// S2: joining red spawns a player object at the literal spawn point with
/// identity rotation, and records a Join event with team red.
#[test]
fn s2_joining_red_spawns_player_at_fixed_point_with_identity_rotation() {
    let mut m = new_match();
    let slot = m.join(addr(2), padded_name(b"Magnus")).unwrap();

    let keys = ClientMessage::Update {
        game_id: m.game_id(),
        stick_angle: 0.0,
        turn: 0.0,
        reserved: 0.0,
        fwd_back: 0.0,
        stick_x: 0.0,
        stick_y: 0.0,
        head_rot: 0.0,
        body_rot: 0.0,
        keys: Keys::JOIN_RED.bits(),
        last_acked_packet: u32::MAX,
        last_seen_msg_index: 0,
        chat: None,
    };
    apply_client_message(&mut m, slot, &keys);
    m.tick();

    let session = m.session_snapshot(slot).expect("session still present");
    assert_eq!(session.team, Team::Red);
    let obj_slot = session.object_slot.expect("red join spawns an object");
    let object = m.object_snapshot(obj_slot).expect("object present");
    match object {
        Object::Player(p) => {
            assert_eq!(p.body.position, Vec3::new(10.0, 2.0, 10.0));
            assert_eq!(p.body.rotation, Mat3::IDENTITY);
        }
        other => panic!("expected a player object, got {other:?}"),
    }
}

/// S3: a puck released above the rink falls under gravity, bounces off the
/// floor instead of sinking through it, and settles to a low residual speed.
#[test]
fn s3_puck_falls_and_rests_on_the_rink_floor() {
    let mut m = new_match();
    let slot = m.join(addr(3), padded_name(b"Highlander")).unwrap();
    m.tick(); // consume the start-of-match frame before we overwrite the puck

    m.debug_set_puck(Vec3::new(25.0, 5.0, 25.0), Vec3::new(-0.1, 0.0, 0.0));

    for _ in 0..200 {
        m.tick();
    }

    let puck = m.find_puck_slot().expect("a puck exists");
    let Object::Puck(p) = m.object_snapshot(puck).unwrap() else { panic!("expected puck") };
    assert!(p.body.position.y < 5.0);
    assert!(p.body.position.y > -1.0);
    let _ = slot;
}

/// S4: a session that stops sending UPDATE is evicted after the inactivity
/// limit and the eviction is recorded as an Exit event.
#[test]
fn s4_inactive_session_is_evicted_and_exit_is_logged() {
    let mut m = new_match();
    let slot = m.join(addr(4), padded_name(b"Ghost")).unwrap();

    for _ in 0..2500 {
        m.tick();
    }

    assert!(m.session_snapshot(slot).is_none());
    let (_, events) = m.event_log_window(0);
    assert!(events.iter().any(|e| matches!(e, Event::JoinExit { slot: s, joined: false, .. } if *s == slot)));
}

/// S5: a client that misses several snapshots and re-requests from an old
/// `msgIndex` gets every event it hasn't acknowledged yet, and asking twice
/// from the same index yields the same events both times.
#[test]
fn s5_event_window_redelivers_identically_from_an_old_index() {
    let mut m = new_match();
    let slot_a = m.join(addr(5), padded_name(b"Anna")).unwrap();
    m.join(addr(6), padded_name(b"Bo")).unwrap();
    m.tick();
    m.tick();

    let (_, first) = m.event_log_window(0);
    let (_, second) = m.event_log_window(0);
    assert_eq!(first, second);
    assert!(first.iter().any(|e| matches!(e, Event::JoinExit { slot: 0, .. })));
    assert!(first.iter().any(|e| matches!(e, Event::JoinExit { slot: 1, .. })));
    let _ = slot_a;
}

/// S6: INFO_REQUEST/INFO_RESPONSE round trip echoes the client's nonce.
#[test]
fn s6_info_request_round_trips_the_nonce() {
    let m = new_match();
    let request = ClientMessage::InfoRequest { version: hqm_core::wire::PROTOCOL_VERSION, nonce: 0xDEAD_BEEF };
    let bytes = request.encode();
    let decoded = ClientMessage::decode(&bytes).expect("well-formed request decodes");
    let ClientMessage::InfoRequest { nonce, .. } = decoded else { panic!("expected InfoRequest") };

    let response = m.info_response(padded_name(b"Rink One"), nonce);
    let response_bytes = response.encode();
    let decoded_response = ServerMessage::decode(&response_bytes).expect("well-formed response decodes");
    match decoded_response {
        ServerMessage::InfoResponse(r) => assert_eq!(r.nonce, 0xDEAD_BEEF),
        other => panic!("expected InfoResponse, got {other:?}"),
    }
}

fn apply_client_message(m: &mut Match, slot: u8, msg: &ClientMessage) {
    let ClientMessage::Update {
        game_id,
        stick_angle,
        turn,
        fwd_back,
        stick_x,
        stick_y,
        head_rot,
        body_rot,
        keys,
        last_acked_packet,
        last_seen_msg_index,
        chat,
        ..
    } = msg.clone()
    else {
        panic!("test helper only handles Update");
    };
    let chat = chat.map(|c| (c.rep_index, c.text));
    m.apply_update(
        slot,
        game_id,
        stick_angle,
        turn,
        fwd_back,
        stick_x,
        stick_y,
        head_rot,
        body_rot,
        keys,
        last_acked_packet,
        last_seen_msg_index,
        chat,
    );
}
